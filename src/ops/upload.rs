//! publish an exported recipe revision to the upload branch

use chrono::Utc;
use tracing::info;

use crate::branch::{ensure_branch, push_branch, BranchOrigin};
use crate::conan::{self, Conan};
use crate::context::PublishContext;
use crate::error::{Error, Result};
use crate::layout::{self, LatestPointer};
use crate::reference::Reference;
use crate::repo::Repo;
use crate::snapshot;
use crate::transaction::UploadTransaction;

/// what a publish wrote
#[derive(Debug, Clone)]
pub struct PublishResult {
    /// artifact names under `files/`
    pub artifacts: Vec<String>,
    pub latest: LatestPointer,
    pub branch_origin: BranchOrigin,
}

/// resolve `reference` against the local conan cache and publish it
///
/// registers the revision with the configured conan remote afterwards, if any.
pub fn upload(repo: &Repo, reference: &str) -> Result<PublishResult> {
    let coordinate = Reference::parse(reference)?.into_coordinate(reference)?;
    let export_dir = conan::export_dir(repo, &coordinate);
    let revision = conan::exported_revision(&export_dir)?;
    let ctx = PublishContext::new(repo, coordinate, revision, export_dir)?;

    info!(
        "uploading revision {} to {}",
        ctx.revision,
        ctx.paths.package_dir.display()
    );
    let result = publish(repo, &ctx)?;

    if let Some(remote) = &repo.config().conan_remote {
        Conan::new(repo).register(&ctx.coordinate, &ctx.revision, remote)?;
    }

    Ok(result)
}

/// write the revision record on the upload branch, commit and push it
pub fn publish(repo: &Repo, ctx: &PublishContext) -> Result<PublishResult> {
    let remote = &repo.config().remote;
    if !repo.git().has_remote(repo.root(), remote)? {
        return Err(Error::RemoteNotFound(remote.clone()));
    }

    let branch_origin = ensure_branch(repo)?;

    let tx = UploadTransaction::open(repo, ctx.worktree_dir.clone())?;
    let (artifacts, latest) = populate(ctx)?;
    tx.commit(&ctx.commit_message())?;
    push_branch(repo)?;
    tx.close()?;

    info!(
        "published {} revision {} ({} files)",
        ctx.coordinate,
        ctx.revision,
        artifacts.len()
    );

    Ok(PublishResult {
        artifacts,
        latest,
        branch_origin,
    })
}

/// write the revision directory and then latest.json inside the open worktree
fn populate(ctx: &PublishContext) -> Result<(Vec<String>, LatestPointer)> {
    layout::prepare_revision(&ctx.paths)?;
    let artifacts = snapshot::build_files(&ctx.export_dir, &ctx.paths.files_dir)?;
    layout::write_manifests(&ctx.paths.revision_dir)?;
    let latest =
        layout::update_latest(&ctx.worktree_dir, &ctx.coordinate, &ctx.revision, Utc::now())?;
    Ok((artifacts, latest))
}
