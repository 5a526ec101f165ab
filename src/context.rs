use std::path::PathBuf;

use crate::error::Result;
use crate::layout::{self, RevisionPaths};
use crate::reference::PackageCoordinate;
use crate::repo::Repo;

/// everything one publish needs to know, resolved before anything is written
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PublishContext {
    pub coordinate: PackageCoordinate,
    /// revision assigned by conan at export time
    pub revision: String,
    /// `conan export` output for this coordinate
    pub export_dir: PathBuf,
    /// upload worktree, which is also the publish root
    pub worktree_dir: PathBuf,
    /// package, revision and files directories inside the worktree
    pub paths: RevisionPaths,
}

impl PublishContext {
    pub fn new(
        repo: &Repo,
        coordinate: PackageCoordinate,
        revision: impl Into<String>,
        export_dir: PathBuf,
    ) -> Result<Self> {
        let revision = revision.into();
        layout::validate_revision(&coordinate, &revision)?;
        let worktree_dir = repo.upload_path();
        let paths = RevisionPaths::new(&worktree_dir, &coordinate, &revision);

        Ok(Self {
            coordinate,
            revision,
            export_dir,
            worktree_dir,
            paths,
        })
    }

    /// commit message recorded on the upload branch
    pub fn commit_message(&self) -> String {
        format!(
            "Upload {}/{} revision {}.",
            self.coordinate.name(),
            self.coordinate.version(),
            self.revision
        )
    }
}
