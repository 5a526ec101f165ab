use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, IoResultExt, Result};

/// name of the optional configuration file at the repository root
pub const CONFIG_FILE: &str = "barbarian.toml";

/// tool configuration, read from barbarian.toml when present
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// git remote the upload branch is fetched from and pushed to
    pub remote: String,
    /// dedicated upload branch
    pub branch: String,
    /// worktree directory, relative to the repository root
    pub upload_dir: String,
    /// git executable
    pub git: String,
    /// conan executable
    pub conan: String,
    /// conan remote that indexes uploaded revisions
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conan_remote: Option<ConanRemote>,
}

impl Config {
    /// load config from file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).with_path(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// load `barbarian.toml` from the repository root, or the defaults
    pub fn load_or_default(root: &Path) -> Result<Self> {
        let path = root.join(CONFIG_FILE);
        if path.is_file() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            remote: "origin".to_string(),
            branch: "barbarian".to_string(),
            upload_dir: ".barbarian_upload".to_string(),
            git: "git".to_string(),
            conan: "conan".to_string(),
            conan_remote: None,
        }
    }
}

/// a conan remote, written `<url>@<name>` on the command line
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConanRemote {
    pub name: String,
    pub url: String,
}

impl ConanRemote {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }

    /// parse `<url>@<name>`; the last '@' separates, so urls may carry userinfo
    pub fn parse(s: &str) -> Result<Self> {
        match s.rsplit_once('@') {
            Some((url, name)) if !url.is_empty() && !name.is_empty() => {
                Ok(Self::new(name, url))
            }
            _ => Err(Error::InvalidRemote(s.to_string())),
        }
    }
}

impl std::str::FromStr for ConanRemote {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
