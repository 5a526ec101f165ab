//! export a recipe into the repository-local conan cache

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::conan::{self, Conan};
use crate::error::{Error, IoResultExt, Result};
use crate::reference::{PackageCoordinate, Reference};
use crate::repo::Repo;

/// gitignore entry keeping the local conan cache out of the project history
const GITIGNORE_ENTRY: &str = "/.conan/";

/// post_export hook trimming conandata.yml to the exported version
pub const CLEAN_CONANDATA_HOOK: &str = "barbarian_clean_conandata_yml";
const CLEAN_CONANDATA_HOOK_SOURCE: &str = include_str!("hooks/barbarian_clean_conandata_yml.py");

/// outcome of an export
#[derive(Debug, Clone)]
pub struct ExportResult {
    pub coordinate: PackageCoordinate,
    pub export_dir: PathBuf,
}

/// resolve the coordinate for `recipe`, filling name and version from the
/// recipe itself when the reference leaves them out
pub fn resolve_coordinate(conan: &Conan, recipe: &Path, reference: &str) -> Result<PackageCoordinate> {
    let parsed = Reference::parse(reference)?;
    let name = match parsed.name {
        Some(name) => name,
        None => conan.inspect(recipe, "name")?,
    };
    let version = match parsed.version {
        Some(version) => version,
        None => conan.inspect(recipe, "version")?,
    };
    PackageCoordinate::new(name, version, parsed.user, parsed.channel)
}

/// `conan export` the recipe at `recipe` with a clean slate for its version
pub fn export(repo: &Repo, recipe: &Path, reference: &str) -> Result<ExportResult> {
    let recipe = recipe.canonicalize().with_path(recipe)?;
    let conan = Conan::new(repo);
    let coordinate = resolve_coordinate(&conan, &recipe, reference)?;
    let export_dir = conan::export_dir(repo, &coordinate);

    info!("exporting to {}", export_dir.display());

    // drop every earlier export of this name/version
    let version_dir = repo
        .conan_data_path()
        .join(coordinate.name())
        .join(coordinate.version());
    remove_dir_if_exists(&version_dir)?;

    ensure_gitignored(repo.root())?;

    conan.install_hook(CLEAN_CONANDATA_HOOK, CLEAN_CONANDATA_HOOK_SOURCE)?;
    conan.export(&recipe, reference)?;

    Ok(ExportResult {
        coordinate,
        export_dir,
    })
}

fn remove_dir_if_exists(dir: &Path) -> Result<()> {
    match fs::remove_dir_all(dir) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(Error::Io {
            path: dir.to_path_buf(),
            source: e,
        }),
    }
}

/// prepend `/.conan/` to the root .gitignore unless it is already there
pub fn ensure_gitignored(root: &Path) -> Result<bool> {
    let path = root.join(".gitignore");
    let current = match fs::read_to_string(&path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(e) => return Err(Error::Io { path, source: e }),
    };

    if current.lines().any(|l| l.trim() == GITIGNORE_ENTRY) {
        return Ok(false);
    }

    let updated = format!("{}\n{}", GITIGNORE_ENTRY, current);
    fs::write(&path, updated).with_path(&path)?;
    Ok(true)
}
