//! scaffold a new recipe and, optionally, its CI workflow

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::{Error, IoResultExt, Result};
use crate::reference::Reference;
use crate::template::{bindings, render};

const CONANFILE: &str = include_str!("templates/conanfile.py.in");
const CONANFILE_HEADER_ONLY: &str = include_str!("templates/conanfile_header_only.py.in");
const CONANDATA: &str = include_str!("templates/conandata.yml.in");
const CONFIG_YML: &str = include_str!("templates/config.yml.in");
const CONAN_WORKFLOW: &str = include_str!("templates/conan_workflow.yml.in");

/// remotes baked into generated CI when none is configured
pub const DEFAULT_CONAN_REMOTES: &str = "https://barbarian.bfgroup.xyz/@barbarian";

/// where the recipe files go
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum RecipeLayout {
    /// conanfile.py and conandata.yml at the top level
    #[default]
    Standalone,
    /// recipes/<name>/all/..., versions listed in recipes/<name>/config.yml
    Collection,
}

/// continuous integration service to generate configuration for
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum CiService {
    /// GitHub Actions
    Github,
}

/// options for [`new_recipe`]
#[derive(Clone, Debug, Default)]
pub struct NewOptions {
    pub layout: RecipeLayout,
    pub header_only: bool,
    pub ci: Option<CiService>,
    pub overwrite: bool,
    /// value for the CI `CONAN_REMOTES` variable
    pub conan_remotes: Option<String>,
}

/// write the scaffolding for `reference` under `root`, returning the paths written
pub fn new_recipe(root: &Path, reference: &str, options: &NewOptions) -> Result<Vec<PathBuf>> {
    let coordinate = Reference::parse(reference)?.into_coordinate(reference)?;
    let name = coordinate.name();
    let version = coordinate.version();
    let class_name = class_name(name);

    // collection recipes get their version from config.yml
    let version_line = match options.layout {
        RecipeLayout::Standalone => format!("    version = \"{}\"\n", version),
        RecipeLayout::Collection => String::new(),
    };

    let vars = bindings([
        ("name", name),
        ("version", version),
        ("class_name", class_name.as_str()),
        ("version_line", version_line.as_str()),
        (
            "conan_remotes",
            options.conan_remotes.as_deref().unwrap_or(DEFAULT_CONAN_REMOTES),
        ),
    ]);

    let conanfile = if options.header_only {
        CONANFILE_HEADER_ONLY
    } else {
        CONANFILE
    };

    let recipe_dir = match options.layout {
        RecipeLayout::Standalone => root.to_path_buf(),
        RecipeLayout::Collection => root.join("recipes").join(name).join("all"),
    };

    let mut outputs = vec![
        (recipe_dir.join("conanfile.py"), render(conanfile, &vars)?),
        (recipe_dir.join("conandata.yml"), render(CONANDATA, &vars)?),
    ];
    if options.layout == RecipeLayout::Collection {
        outputs.push((
            root.join("recipes").join(name).join("config.yml"),
            render(CONFIG_YML, &vars)?,
        ));
    }
    if let Some(CiService::Github) = options.ci {
        outputs.push((
            root.join(".github").join("workflows").join("conan.yml"),
            render(CONAN_WORKFLOW, &vars)?,
        ));
    }

    // check everything first so a refusal writes nothing
    if !options.overwrite {
        if let Some((existing, _)) = outputs.iter().find(|(path, _)| path.exists()) {
            return Err(Error::FileExists(existing.clone()));
        }
    }

    let mut written = Vec::with_capacity(outputs.len());
    for (path, content) in outputs {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_path(parent)?;
        }
        fs::write(&path, content).with_path(&path)?;
        info!("created {}", path.display());
        written.push(path);
    }

    Ok(written)
}

/// `zlib-ng` -> `ZlibNg`
fn class_name(name: &str) -> String {
    name.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_class_name() {
        assert_eq!(class_name("zlib"), "Zlib");
        assert_eq!(class_name("zlib-ng"), "ZlibNg");
        assert_eq!(class_name("boost_asio"), "BoostAsio");
    }

    #[test]
    fn test_standalone_recipe() {
        let dir = tempdir().unwrap();
        let written = new_recipe(dir.path(), "zlib/1.3@", &NewOptions::default()).unwrap();

        assert_eq!(
            written,
            vec![dir.path().join("conanfile.py"), dir.path().join("conandata.yml")]
        );
        let conanfile = fs::read_to_string(dir.path().join("conanfile.py")).unwrap();
        assert!(conanfile.contains("class ZlibConan(ConanFile):"));
        assert!(conanfile.contains("    version = \"1.3\"\n"));
        assert!(conanfile.contains("@property"));
        let conandata = fs::read_to_string(dir.path().join("conandata.yml")).unwrap();
        assert!(conandata.contains("\"1.3\":"));
    }

    #[test]
    fn test_collection_recipe_header_only_with_ci() {
        let dir = tempdir().unwrap();
        let options = NewOptions {
            layout: RecipeLayout::Collection,
            header_only: true,
            ci: Some(CiService::Github),
            ..NewOptions::default()
        };
        new_recipe(dir.path(), "boost-asio/1.81.0@", &options).unwrap();

        let conanfile =
            fs::read_to_string(dir.path().join("recipes/boost-asio/all/conanfile.py")).unwrap();
        assert!(conanfile.contains("class BoostAsioConan"));
        assert!(conanfile.contains("self.info.header_only()"));
        assert!(!conanfile.contains("version = "));

        let config = fs::read_to_string(dir.path().join("recipes/boost-asio/config.yml")).unwrap();
        assert!(config.contains("\"1.81.0\":\n    folder: all"));

        let workflow =
            fs::read_to_string(dir.path().join(".github/workflows/conan.yml")).unwrap();
        assert!(workflow.contains(DEFAULT_CONAN_REMOTES));
        assert!(workflow.contains("${{ matrix.config.os }}"));
    }

    #[test]
    fn test_refuses_to_overwrite() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("conandata.yml"), "mine").unwrap();

        let result = new_recipe(dir.path(), "zlib/1.3@", &NewOptions::default());
        assert!(matches!(result, Err(Error::FileExists(_))));
        // nothing written, including files that did not exist
        assert!(!dir.path().join("conanfile.py").exists());
        assert_eq!(fs::read_to_string(dir.path().join("conandata.yml")).unwrap(), "mine");

        let options = NewOptions {
            overwrite: true,
            ..NewOptions::default()
        };
        new_recipe(dir.path(), "zlib/1.3@", &options).unwrap();
        assert_ne!(fs::read_to_string(dir.path().join("conandata.yml")).unwrap(), "mine");
    }

    #[test]
    fn test_requires_name_and_version() {
        let dir = tempdir().unwrap();
        let result = new_recipe(dir.path(), "1.3@", &NewOptions::default());
        assert!(matches!(result, Err(Error::IncompleteReference(_))));
    }
}
