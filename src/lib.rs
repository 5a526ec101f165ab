//! barbarian - conan recipes published on a git branch
//!
//! recipes exported with conan are published to a dedicated orphan branch of the
//! project's own git repository. the branch is a plain directory tree that any
//! static git host can serve as a recipe repository.
//!
//! # Layout
//!
//! ```text
//! <name>/<version>/latest.json            {"revision": ..., "time": ...}
//! <name>/<version>/<revision>/snapshot.json
//! <name>/<version>/<revision>/files.json
//! <name>/<version>/<revision>/files/...   conan_export.tgz, conanfile.py, ...
//! ```
//!
//! `snapshot.json` maps every artifact under `files/` to its md5 digest.
//! `files.json` lists the same names.
//!
//! # Publishing
//!
//! a publish makes sure the branch exists (local, fetched from the remote, or
//! created as an empty orphan), checks it out in a temporary worktree, writes the
//! revision directory and then `latest.json`, commits and pushes. the worktree is
//! removed on every path out.
//!
//! # Example usage
//!
//! ```no_run
//! use barbarian::{ops, Repo};
//! use std::path::Path;
//!
//! let repo = Repo::discover(Path::new(".")).unwrap();
//! ops::export(&repo, Path::new("recipes/zlib/all"), "zlib/1.3@").unwrap();
//! let result = ops::upload(&repo, "zlib/1.3@").unwrap();
//! println!("latest is {}", result.latest.revision);
//! ```

mod config;
mod error;
mod repo;

pub mod branch;
pub mod conan;
pub mod context;
pub mod digest;
pub mod exec;
pub mod git;
pub mod layout;
pub mod ops;
pub mod reference;
pub mod snapshot;
pub mod template;
pub mod transaction;

#[cfg(test)]
mod testutil;

pub use branch::{ensure_branch, push_branch, BranchOrigin};
pub use config::{ConanRemote, Config, CONFIG_FILE};
pub use context::PublishContext;
pub use digest::Md5Digest;
pub use error::{Error, IoResultExt, Result};
pub use exec::Probe;
pub use layout::{
    read_latest, read_manifests, verify_revision, FilesManifest, LatestPointer, Snapshot,
    VerifyReport,
};
pub use reference::{PackageCoordinate, Reference};
pub use repo::Repo;
pub use transaction::UploadTransaction;
