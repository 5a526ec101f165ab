//! the git primitives the publish pipeline is built from
//!
//! every call is a separate blocking `git` invocation run with an explicit
//! working directory. success is judged by exit status, except for the branch
//! listing and remote listing which compare output.

use std::ffi::OsString;
use std::path::Path;

use crate::error::Result;
use crate::exec::{Probe, Tool};

/// `git rev-parse --verify --quiet` exits 1 when the revision does not exist
const REV_MISSING: i32 = 1;
/// `git ls-remote --exit-code` exits 2 when no matching ref exists
const LS_REMOTE_NO_MATCH: i32 = 2;

/// handle on the git executable
#[derive(Clone, Debug)]
pub struct Git {
    tool: Tool,
}

impl Git {
    pub fn new(program: &str) -> Self {
        Self {
            tool: Tool::new(program),
        }
    }

    /// is `branch` a local branch
    pub fn has_local_branch(&self, dir: &Path, branch: &str) -> Result<bool> {
        let listing = self.tool.output(dir, ["branch", "--list", branch])?;
        let listed = listing.trim_matches(|c: char| matches!(c, '\n' | '\t' | ' ' | '*' | '+'));
        Ok(listed == branch)
    }

    /// names of configured remotes
    pub fn remotes(&self, dir: &Path) -> Result<Vec<String>> {
        let listing = self.tool.output(dir, ["remote"])?;
        Ok(listing
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect())
    }

    pub fn has_remote(&self, dir: &Path, remote: &str) -> Result<bool> {
        Ok(self.remotes(dir)?.iter().any(|r| r == remote))
    }

    /// does `remote` carry `branch`; an unreachable remote is an error
    pub fn remote_has_branch(&self, dir: &Path, remote: &str, branch: &str) -> Result<Probe> {
        let refname = format!("refs/heads/{}", branch);
        let probe = self.tool.probe(
            dir,
            ["ls-remote", "--exit-code", "--heads", remote, refname.as_str()],
            &[LS_REMOTE_NO_MATCH],
        )?;
        Ok(match probe {
            Probe::Found(_) => Probe::Found(()),
            Probe::NotFound => Probe::NotFound,
        })
    }

    /// fetch `branch` from `remote` into its remote-tracking ref
    pub fn fetch_branch(&self, dir: &Path, remote: &str, branch: &str) -> Result<()> {
        let refspec = format!("refs/heads/{0}:refs/remotes/{1}/{0}", branch, remote);
        self.tool
            .run(dir, ["fetch", "--quiet", remote, refspec.as_str()])
    }

    /// create local `branch` tracking `remote/branch`
    pub fn track_branch(&self, dir: &Path, remote: &str, branch: &str) -> Result<()> {
        let upstream = format!("{}/{}", remote, branch);
        self.tool
            .run(dir, ["branch", "--quiet", "--track", branch, upstream.as_str()])
    }

    /// commit id of `rev`, if it resolves
    pub fn resolve(&self, dir: &Path, rev: &str) -> Result<Probe<String>> {
        let spec = format!("{}^{{commit}}", rev);
        self.tool.probe(
            dir,
            ["rev-parse", "--verify", "--quiet", spec.as_str()],
            &[REV_MISSING],
        )
    }

    /// root commit(s) reachable from `rev`
    pub fn root_commits(&self, dir: &Path, rev: &str) -> Result<Vec<String>> {
        let listing = self.tool.output(dir, ["rev-list", "--max-parents=0", rev])?;
        Ok(listing.lines().map(str::to_string).collect())
    }

    /// add a worktree at `path` with `branch` checked out
    pub fn worktree_add(&self, dir: &Path, path: &Path, branch: &str) -> Result<()> {
        let args: [OsString; 5] = [
            "worktree".into(),
            "add".into(),
            "--quiet".into(),
            path.into(),
            branch.into(),
        ];
        self.tool.run(dir, args)
    }

    /// add a worktree at `path` on a new branch started from HEAD
    pub fn worktree_add_new_branch(&self, dir: &Path, path: &Path, new_branch: &str) -> Result<()> {
        let args: [OsString; 6] = [
            "worktree".into(),
            "add".into(),
            "--quiet".into(),
            "-b".into(),
            new_branch.into(),
            path.into(),
        ];
        self.tool.run(dir, args)
    }

    /// forcibly remove the worktree at `path`
    pub fn worktree_remove(&self, dir: &Path, path: &Path) -> Result<()> {
        let args: [OsString; 4] = [
            "worktree".into(),
            "remove".into(),
            "--force".into(),
            path.into(),
        ];
        self.tool.run(dir, args)
    }

    /// switch `dir` to a new unborn branch
    pub fn checkout_orphan(&self, dir: &Path, branch: &str) -> Result<()> {
        self.tool
            .run(dir, ["checkout", "--quiet", "--orphan", branch])
    }

    /// remove every tracked file from index and working tree
    pub fn remove_all(&self, dir: &Path) -> Result<()> {
        self.tool
            .run(dir, ["rm", "--quiet", "-r", "-f", "--ignore-unmatch", "."])
    }

    /// stage everything in the working tree
    pub fn add_all(&self, dir: &Path) -> Result<()> {
        self.tool.run(dir, ["add", "--all", "."])
    }

    pub fn commit(&self, dir: &Path, message: &str) -> Result<()> {
        self.tool.run(dir, ["commit", "--quiet", "-m", message])
    }

    pub fn commit_empty(&self, dir: &Path, message: &str) -> Result<()> {
        self.tool
            .run(dir, ["commit", "--quiet", "--allow-empty", "-m", message])
    }

    pub fn delete_branch(&self, dir: &Path, branch: &str) -> Result<()> {
        self.tool.run(dir, ["branch", "--quiet", "-D", branch])
    }

    /// push `branch` to `remote`; rejection surfaces as `CommandFailed`
    pub fn push(&self, dir: &Path, remote: &str, branch: &str) -> Result<()> {
        self.tool.run(dir, ["push", "--quiet", remote, branch])
    }
}
