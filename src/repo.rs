use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::Config;
use crate::error::{Error, IoResultExt, Result};
use crate::git::Git;

/// a git checkout that recipes are exported from and published to
#[derive(Clone, Debug)]
pub struct Repo {
    root: PathBuf,
    config: Config,
    git: Git,
}

impl Repo {
    /// find the repository containing `start` and load its configuration
    pub fn discover(start: &Path) -> Result<Self> {
        let root = find_root(start)?;
        let config = Config::load_or_default(&root)?;
        Ok(Self::with_config(root, config))
    }

    /// open a repository root with an explicit configuration
    pub fn with_config(root: PathBuf, config: Config) -> Self {
        debug!("repository root: {}", root.display());
        let git = Git::new(&config.git);
        Self { root, config, git }
    }

    /// repository root path
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// tool configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// mutable access to configuration
    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    pub fn git(&self) -> &Git {
        &self.git
    }

    /// fixed location of the upload worktree
    pub fn upload_path(&self) -> PathBuf {
        self.root.join(&self.config.upload_dir)
    }

    /// conan user home used for exports
    pub fn conan_home(&self) -> &Path {
        &self.root
    }

    /// `<root>/.conan/data`, where exports land
    pub fn conan_data_path(&self) -> PathBuf {
        self.root.join(".conan").join("data")
    }
}

/// walk up from `start` to the first directory holding `.git`
fn find_root(start: &Path) -> Result<PathBuf> {
    let start = start.canonicalize().with_path(start)?;
    let mut dir = start.as_path();

    loop {
        // `.git` is a file inside worktrees and submodules
        if dir.join(".git").exists() {
            return Ok(dir.to_path_buf());
        }
        match dir.parent() {
            Some(parent) => dir = parent,
            None => return Err(Error::NoRepo(start)),
        }
    }
}
