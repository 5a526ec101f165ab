//! bootstrap of the dedicated upload branch
//!
//! the branch is an orphan: its history never shares a commit with the
//! project's own history, so the uploaded records can be served from it
//! without dragging the sources along.

use std::path::Path;

use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::exec::Probe;
use crate::repo::Repo;

/// message of the root commit of a freshly created branch
pub const ROOT_MESSAGE: &str = "Barbarian upload branch.";

/// how the branch came to exist locally
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BranchOrigin {
    /// it was already a local branch
    Local,
    /// fetched from the remote and tracked
    Remote,
    /// synthesized as a new orphan
    Created,
}

/// make sure the upload branch exists locally
pub fn ensure_branch(repo: &Repo) -> Result<BranchOrigin> {
    let git = repo.git();
    let root = repo.root();
    let branch = &repo.config().branch;
    let remote = &repo.config().remote;

    if git.has_local_branch(root, branch)? {
        debug!("branch '{}' exists locally", branch);
        return Ok(BranchOrigin::Local);
    }

    if fetch_from_remote(repo)? {
        info!("tracking '{}' from remote '{}'", branch, remote);
        return Ok(BranchOrigin::Remote);
    }

    info!("creating '{}' branch", branch);
    create_orphan(repo, branch, ROOT_MESSAGE)?;
    Ok(BranchOrigin::Created)
}

/// fetch the branch, then track the remote-tracking ref if there is one
///
/// both steps are best-effort. a remote that does not carry the branch is the
/// normal first-publish case. a remote that cannot be reached still leaves the
/// remote-tracking ref from an earlier clone or fetch to track.
fn fetch_from_remote(repo: &Repo) -> Result<bool> {
    let git = repo.git();
    let root = repo.root();
    let branch = &repo.config().branch;
    let remote = &repo.config().remote;

    if !git.has_remote(root, remote)? {
        return Ok(false);
    }

    match git.remote_has_branch(root, remote, branch) {
        Ok(Probe::Found(())) => {
            if let Err(e) = git.fetch_branch(root, remote, branch) {
                warn!("could not fetch '{}' from '{}': {}", branch, remote, e);
            }
        }
        Ok(Probe::NotFound) => {
            debug!("remote '{}' has no '{}' branch yet", remote, branch);
            return Ok(false);
        }
        Err(e) => warn!("could not query remote '{}': {}", remote, e),
    }

    let tracking = format!("refs/remotes/{}/{}", remote, branch);
    if !git.resolve(root, &tracking)?.is_found() {
        return Ok(false);
    }

    match git.track_branch(root, remote, branch) {
        Ok(()) => Ok(true),
        Err(e) => {
            warn!("could not track {}/{}: {}", remote, branch, e);
            Ok(false)
        }
    }
}

/// create `branch` as an empty orphan with a single empty commit
///
/// needs an existing commit for the temporary worktree to start from.
pub fn create_orphan(repo: &Repo, branch: &str, message: &str) -> Result<()> {
    let git = repo.git();
    let root = repo.root();

    if !git.resolve(root, "HEAD")?.is_found() {
        return Err(Error::NoHistory(branch.to_string()));
    }

    let suffix = uuid::Uuid::new_v4().simple().to_string();
    let tmp_branch = format!("{}-tmp-{}", branch, &suffix[..8]);
    let tmp_path = root.join(format!(".{}-{}.tmp", branch, &suffix[..8]));

    git.worktree_add_new_branch(root, &tmp_path, &tmp_branch)?;

    let result = populate_orphan(repo, &tmp_path, branch, &tmp_branch, message);

    if let Err(e) = git.worktree_remove(root, &tmp_path) {
        if result.is_ok() {
            return Err(e);
        }
        warn!("failed to remove {}: {}", tmp_path.display(), e);
    }

    result
}

fn populate_orphan(
    repo: &Repo,
    tmp_path: &Path,
    branch: &str,
    tmp_branch: &str,
    message: &str,
) -> Result<()> {
    let git = repo.git();
    git.checkout_orphan(tmp_path, branch)?;
    git.remove_all(tmp_path)?;
    git.commit_empty(tmp_path, message)?;
    git.delete_branch(tmp_path, tmp_branch)
}

/// ensure the branch exists, then push it to the remote
pub fn push_branch(repo: &Repo) -> Result<()> {
    let remote = &repo.config().remote;
    if !repo.git().has_remote(repo.root(), remote)? {
        return Err(Error::RemoteNotFound(remote.clone()));
    }

    ensure_branch(repo)?;
    info!("pushing '{}' to '{}'", repo.config().branch, remote);
    repo.git().push(repo.root(), remote, &repo.config().branch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{clone_of_bare, git, init_repo, init_with_commit};
    use tempfile::tempdir;

    fn open(path: &Path) -> Repo {
        Repo::discover(path).unwrap()
    }

    #[test]
    fn test_create_when_absent_everywhere() {
        let dir = tempdir().unwrap();
        let (_remote, work) = clone_of_bare(dir.path(), "work");
        let repo = open(&work);

        assert_eq!(ensure_branch(&repo).unwrap(), BranchOrigin::Created);

        // orphan: a single empty root commit, unrelated to main
        let log = git(&work, &["log", "--format=%s", "barbarian"]);
        assert_eq!(log, ROOT_MESSAGE);
        let tree = git(&work, &["ls-tree", "-r", "--name-only", "barbarian"]);
        assert!(tree.is_empty());
        let roots = repo.git().root_commits(&work, "barbarian").unwrap();
        let main_roots = repo.git().root_commits(&work, "main").unwrap();
        assert_ne!(roots, main_roots);

        // no temporary branch or worktree left behind
        let branches = git(&work, &["branch", "--list", "barbarian-tmp-*"]);
        assert!(branches.is_empty());
        let worktrees = git(&work, &["worktree", "list", "--porcelain"]);
        assert_eq!(worktrees.matches("worktree ").count(), 1);
    }

    #[test]
    fn test_existing_local_branch_is_kept() {
        let dir = tempdir().unwrap();
        let work = init_with_commit(dir.path());
        let repo = open(&work);

        ensure_branch(&repo).unwrap();
        let before = git(&work, &["rev-parse", "barbarian"]);

        assert_eq!(ensure_branch(&repo).unwrap(), BranchOrigin::Local);
        assert_eq!(git(&work, &["rev-parse", "barbarian"]), before);
    }

    #[test]
    fn test_branch_only_on_remote_is_tracked() {
        let dir = tempdir().unwrap();
        let (_remote, first) = clone_of_bare(dir.path(), "first");
        let repo = open(&first);
        ensure_branch(&repo).unwrap();
        push_branch(&repo).unwrap();
        let remote_root = repo.git().root_commits(&first, "barbarian").unwrap();

        let (_remote, second) = clone_of_bare(dir.path(), "second");
        let repo = open(&second);
        // a plain clone only has main
        assert!(!repo.git().has_local_branch(&second, "barbarian").unwrap());

        assert_eq!(ensure_branch(&repo).unwrap(), BranchOrigin::Remote);
        let local_root = repo.git().root_commits(&second, "barbarian").unwrap();
        assert_eq!(local_root, remote_root);

        let upstream = git(&second, &["rev-parse", "--abbrev-ref", "barbarian@{upstream}"]);
        assert_eq!(upstream, "origin/barbarian");
    }

    #[test]
    fn test_create_without_remote() {
        let dir = tempdir().unwrap();
        let work = init_with_commit(dir.path());
        let repo = open(&work);

        assert_eq!(ensure_branch(&repo).unwrap(), BranchOrigin::Created);
        assert!(repo.git().has_local_branch(&work, "barbarian").unwrap());
    }

    #[test]
    fn test_unreachable_remote_falls_back_to_create() {
        let dir = tempdir().unwrap();
        let work = init_with_commit(dir.path());
        git(&work, &["remote", "add", "origin", "/nonexistent/remote.git"]);
        let repo = open(&work);

        assert_eq!(ensure_branch(&repo).unwrap(), BranchOrigin::Created);
    }

    #[test]
    fn test_unreachable_remote_tracks_existing_remote_ref() {
        let dir = tempdir().unwrap();
        let (_remote, first) = clone_of_bare(dir.path(), "first");
        let repo = open(&first);
        ensure_branch(&repo).unwrap();
        push_branch(&repo).unwrap();
        let remote_root = repo.git().root_commits(&first, "barbarian").unwrap();

        // the clone carries origin/barbarian, then loses the remote
        let (_remote, second) = clone_of_bare(dir.path(), "second");
        git(&second, &["remote", "set-url", "origin", "/nonexistent/remote.git"]);
        let repo = open(&second);

        assert_eq!(ensure_branch(&repo).unwrap(), BranchOrigin::Remote);
        let local_root = repo.git().root_commits(&second, "barbarian").unwrap();
        assert_eq!(local_root, remote_root);
    }

    #[test]
    fn test_no_history_is_precondition_failure() {
        let dir = tempdir().unwrap();
        let work = init_repo(dir.path());
        let repo = open(&work);

        let result = ensure_branch(&repo);
        assert!(matches!(result, Err(Error::NoHistory(_))));
    }

    #[test]
    fn test_push_requires_remote() {
        let dir = tempdir().unwrap();
        let work = init_with_commit(dir.path());
        let repo = open(&work);

        let result = push_branch(&repo);
        assert!(matches!(result, Err(Error::RemoteNotFound(_))));
    }
}
