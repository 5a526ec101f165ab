//! upload worktree lifecycle
//!
//! the upload branch is checked out into a worktree at a fixed path inside the
//! repository. the worktree is removed again when the transaction closes or is
//! dropped, whatever happened in between.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::repo::Repo;

/// an open upload worktree
pub struct UploadTransaction<'a> {
    repo: &'a Repo,
    path: PathBuf,
    open: bool,
}

impl<'a> UploadTransaction<'a> {
    /// check out the upload branch into a worktree at `path`
    ///
    /// a leftover worktree from an interrupted run is reported, not reclaimed.
    pub fn open(repo: &'a Repo, path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if path.exists() {
            return Err(Error::WorktreeOccupied(path));
        }

        repo.git()
            .worktree_add(repo.root(), &path, &repo.config().branch)?;
        debug!("opened upload worktree {}", path.display());

        Ok(Self {
            repo,
            path,
            open: true,
        })
    }

    /// root of the worktree
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// stage everything and commit
    pub fn commit(&self, message: &str) -> Result<()> {
        let git = self.repo.git();
        git.add_all(&self.path)?;
        git.commit(&self.path, message)
    }

    /// remove the worktree, reporting failure
    pub fn close(mut self) -> Result<()> {
        self.open = false;
        self.remove()
    }

    fn remove(&self) -> Result<()> {
        debug!("removing upload worktree {}", self.path.display());
        self.repo.git().worktree_remove(self.repo.root(), &self.path)
    }
}

impl Drop for UploadTransaction<'_> {
    fn drop(&mut self) {
        if self.open {
            if let Err(e) = self.remove() {
                warn!("failed to remove {}: {}", self.path.display(), e);
            }
        }
    }
}
