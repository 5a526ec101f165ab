//! the conan side: inspecting recipes, exporting them, and asking a conan
//! remote to index a published revision

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, info};

use crate::config::ConanRemote;
use crate::error::{Error, IoResultExt, Result};
use crate::exec::Tool;
use crate::reference::PackageCoordinate;
use crate::repo::Repo;

const METADATA_JSON: &str = "metadata.json";

/// conan executable bound to the repository's local conan home
#[derive(Clone, Debug)]
pub struct Conan {
    program: String,
    home: PathBuf,
    tool: Tool,
}

impl Conan {
    pub fn new(repo: &Repo) -> Self {
        let program = repo.config().conan.clone();
        let home = repo.conan_home().to_path_buf();
        let tool = Tool::new(&program).with_env("CONAN_USER_HOME", &home);
        Self {
            program,
            home,
            tool,
        }
    }

    /// `<home>/.conan/hooks`
    pub fn hooks_dir(&self) -> PathBuf {
        self.home.join(".conan").join("hooks")
    }

    /// write `<name>.py` into the hooks directory and enable it in conan.conf
    pub fn install_hook(&self, name: &str, source: &str) -> Result<PathBuf> {
        let dir = self.hooks_dir();
        fs::create_dir_all(&dir).with_path(&dir)?;
        let path = dir.join(format!("{}.py", name));
        fs::write(&path, source).with_path(&path)?;

        let key = format!("hooks.{}", name);
        self.tool
            .run(&self.home, ["config", "set", key.as_str()])?;
        debug!("enabled conan hook {}", path.display());
        Ok(path)
    }

    /// read a single recipe attribute (`name`, `version`, ...)
    pub fn inspect(&self, recipe: &Path, attribute: &str) -> Result<String> {
        let args: [&std::ffi::OsStr; 4] = [
            "inspect".as_ref(),
            "--raw".as_ref(),
            attribute.as_ref(),
            recipe.as_os_str(),
        ];
        let value = self.tool.output(cwd_of(recipe), args)?;
        Ok(value.trim().to_string())
    }

    /// `conan export <recipe> <reference>` into the local conan home
    pub fn export(&self, recipe: &Path, reference: &str) -> Result<()> {
        let args: [&std::ffi::OsStr; 3] =
            ["export".as_ref(), recipe.as_os_str(), reference.as_ref()];
        self.tool.run(cwd_of(recipe), args)
    }

    /// fetch the published recipe revision through `remote` so the server
    /// indexes it
    ///
    /// runs in a throwaway conan home so the local export cache is untouched.
    pub fn register(
        &self,
        coord: &PackageCoordinate,
        revision: &str,
        remote: &ConanRemote,
    ) -> Result<()> {
        let home = tempfile::tempdir().with_path(std::env::temp_dir())?;
        let tool = Tool::new(&self.program)
            .with_env("CONAN_USER_HOME", home.path())
            .with_env("CONAN_REVISIONS_ENABLED", "1")
            .with_env("CONAN_NON_INTERACTIVE", "1");

        let reference = format!("{}#{}", coord, revision);
        info!("registering {} with remote '{}'", reference, remote.name);

        tool.run(
            home.path(),
            ["remote", "add", "--force", remote.name.as_str(), remote.url.as_str()],
        )?;
        tool.run(
            home.path(),
            ["download", "--recipe", "-r", remote.name.as_str(), reference.as_str()],
        )
    }
}

/// conan 1 lays exports out as `<home>/.conan/data/<name>/<version>/<user>/<channel>`
pub fn export_dir(repo: &Repo, coord: &PackageCoordinate) -> PathBuf {
    repo.conan_data_path()
        .join(coord.name())
        .join(coord.version())
        .join(coord.user())
        .join(coord.channel())
}

#[derive(Deserialize)]
struct ExportMetadata {
    recipe: RecipeMetadata,
}

#[derive(Deserialize)]
struct RecipeMetadata {
    revision: String,
}

/// recipe revision recorded by `conan export` in metadata.json
pub fn exported_revision(export_dir: &Path) -> Result<String> {
    let path = export_dir.join(METADATA_JSON);
    if !path.is_file() {
        return Err(Error::MissingRevision(export_dir.to_path_buf()));
    }
    let content = fs::read(&path).with_path(&path)?;
    let metadata: ExportMetadata = serde_json::from_slice(&content)?;
    if metadata.recipe.revision.is_empty() {
        return Err(Error::MissingRevision(export_dir.to_path_buf()));
    }
    Ok(metadata.recipe.revision)
}

/// directory to run conan from: the recipe folder, or the file's parent
fn cwd_of(recipe: &Path) -> &Path {
    if recipe.is_dir() {
        recipe
    } else {
        recipe.parent().unwrap_or(Path::new("."))
    }
}
