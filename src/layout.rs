//! on-disk layout of the upload branch
//!
//! ```text
//! <publish_root>/<name>/<version>/
//!   latest.json              {"revision": ..., "time": ...}
//!   <revision>/
//!     files/                 served artifacts
//!     snapshot.json          artifact -> md5 (v1 clients)
//!     files.json             {"files": {artifact: {}}} (v2 clients)
//! ```
//!
//! a revision directory is never patched in place: it is removed and written
//! again from scratch, then `latest.json` is pointed at it.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::digest::Md5Digest;
use crate::error::{Error, IoResultExt, Result};
use crate::reference::PackageCoordinate;

pub const FILES_DIR: &str = "files";
pub const SNAPSHOT_JSON: &str = "snapshot.json";
pub const FILES_JSON: &str = "files.json";
pub const LATEST_JSON: &str = "latest.json";

/// paths of one revision record
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RevisionPaths {
    /// `<publish_root>/<name>/<version>`
    pub package_dir: PathBuf,
    /// `<package_dir>/<revision>`
    pub revision_dir: PathBuf,
    /// `<revision_dir>/files`
    pub files_dir: PathBuf,
}

impl RevisionPaths {
    pub fn new(publish_root: &Path, coord: &PackageCoordinate, revision: &str) -> Self {
        let package_dir = package_dir(publish_root, coord);
        let revision_dir = package_dir.join(revision);
        let files_dir = revision_dir.join(FILES_DIR);
        Self {
            package_dir,
            revision_dir,
            files_dir,
        }
    }

    pub fn latest_path(&self) -> PathBuf {
        self.package_dir.join(LATEST_JSON)
    }
}

/// `<publish_root>/<name>/<version>`
pub fn package_dir(publish_root: &Path, coord: &PackageCoordinate) -> PathBuf {
    publish_root.join(coord.name()).join(coord.version())
}

/// legacy manifest: artifact name -> md5
pub type Snapshot = BTreeMap<String, Md5Digest>;

/// artifact listing without digests
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilesManifest {
    pub files: BTreeMap<String, FileEntry>,
}

/// per-file attributes in files.json, currently always empty
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {}

/// latest.json
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LatestPointer {
    pub revision: String,
    pub time: String,
}

impl LatestPointer {
    pub fn new(revision: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            revision: revision.into(),
            time: format_time(now),
        }
    }
}

/// UTC timestamp with microseconds and a literal `+0000` offset
pub fn format_time(now: DateTime<Utc>) -> String {
    format!("{}+0000", now.format("%Y-%m-%dT%H:%M:%S%.6f"))
}

/// a revision becomes a directory name, so it must be a single path segment
pub fn validate_revision(coord: &PackageCoordinate, revision: &str) -> Result<()> {
    let bad = revision.is_empty()
        || revision == "."
        || revision == ".."
        || revision.contains(['/', '\\', '\0']);
    if bad {
        return Err(Error::InvalidReference(format!("{}#{}", coord, revision)));
    }
    Ok(())
}

/// remove any previous copy of the revision and create it fresh
pub fn prepare_path(
    publish_root: &Path,
    coord: &PackageCoordinate,
    revision: &str,
) -> Result<RevisionPaths> {
    validate_revision(coord, revision)?;
    let paths = RevisionPaths::new(publish_root, coord, revision);
    prepare_revision(&paths)?;
    Ok(paths)
}

/// fresh-write the revision directory of already resolved `paths`
pub fn prepare_revision(paths: &RevisionPaths) -> Result<()> {
    match fs::remove_dir_all(&paths.revision_dir) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => {
            return Err(Error::Io {
                path: paths.revision_dir.clone(),
                source: e,
            })
        }
    }
    fs::create_dir_all(&paths.files_dir).with_path(&paths.files_dir)
}

/// digest every regular file in `<revision_dir>/files` and write both manifests
pub fn write_manifests(revision_dir: &Path) -> Result<Snapshot> {
    let files_dir = revision_dir.join(FILES_DIR);
    let mut snapshot = Snapshot::new();

    for entry in fs::read_dir(&files_dir).with_path(&files_dir)? {
        let entry = entry.with_path(&files_dir)?;
        let file_type = entry.file_type().with_path(entry.path())?;
        if !file_type.is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        snapshot.insert(name, Md5Digest::of_file(&entry.path())?);
    }

    let files = FilesManifest {
        files: snapshot
            .keys()
            .map(|name| (name.clone(), FileEntry::default()))
            .collect(),
    };

    write_json(&revision_dir.join(SNAPSHOT_JSON), &snapshot)?;
    write_json(&revision_dir.join(FILES_JSON), &files)?;

    Ok(snapshot)
}

/// point latest.json at `revision`; the previous content is not consulted
pub fn update_latest(
    publish_root: &Path,
    coord: &PackageCoordinate,
    revision: &str,
    now: DateTime<Utc>,
) -> Result<LatestPointer> {
    let dir = package_dir(publish_root, coord);
    fs::create_dir_all(&dir).with_path(&dir)?;
    let latest = LatestPointer::new(revision, now);
    write_json(&dir.join(LATEST_JSON), &latest)?;
    Ok(latest)
}

/// read latest.json for a package, if one was ever published
pub fn read_latest(publish_root: &Path, coord: &PackageCoordinate) -> Result<Option<LatestPointer>> {
    let path = package_dir(publish_root, coord).join(LATEST_JSON);
    if !path.is_file() {
        return Ok(None);
    }
    read_json(&path).map(Some)
}

/// read both manifests of a revision
pub fn read_manifests(revision_dir: &Path) -> Result<(Snapshot, FilesManifest)> {
    let snapshot = read_json(&revision_dir.join(SNAPSHOT_JSON))?;
    let files = read_json(&revision_dir.join(FILES_JSON))?;
    Ok((snapshot, files))
}

/// problems found by [`verify_revision`]
#[derive(Debug, Default, PartialEq, Eq)]
pub struct VerifyReport {
    /// on disk but not listed in snapshot.json
    pub unlisted: Vec<String>,
    /// listed in snapshot.json but not on disk
    pub missing: Vec<String>,
    /// snapshot.json and files.json list different names
    pub manifest_mismatch: Vec<String>,
    /// recorded digest differs from the file's
    pub digest_mismatch: Vec<String>,
}

impl VerifyReport {
    pub fn is_ok(&self) -> bool {
        self.unlisted.is_empty()
            && self.missing.is_empty()
            && self.manifest_mismatch.is_empty()
            && self.digest_mismatch.is_empty()
    }
}

/// check that the manifests of a revision describe exactly its files
pub fn verify_revision(revision_dir: &Path) -> Result<VerifyReport> {
    let (snapshot, files) = read_manifests(revision_dir)?;
    let files_dir = revision_dir.join(FILES_DIR);

    let mut on_disk = BTreeSet::new();
    for entry in fs::read_dir(&files_dir).with_path(&files_dir)? {
        let entry = entry.with_path(&files_dir)?;
        if entry.file_type().with_path(entry.path())?.is_file() {
            on_disk.insert(entry.file_name().to_string_lossy().into_owned());
        }
    }

    let listed: BTreeSet<String> = snapshot.keys().cloned().collect();
    let listed_v2: BTreeSet<String> = files.files.keys().cloned().collect();

    let mut report = VerifyReport {
        unlisted: on_disk.difference(&listed).cloned().collect(),
        missing: listed.difference(&on_disk).cloned().collect(),
        manifest_mismatch: listed.symmetric_difference(&listed_v2).cloned().collect(),
        digest_mismatch: vec![],
    };

    for (name, digest) in &snapshot {
        if on_disk.contains(name) && Md5Digest::of_file(&files_dir.join(name))? != *digest {
            report.digest_mismatch.push(name.clone());
        }
    }

    Ok(report)
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let content = serde_json::to_vec(value)?;
    fs::write(path, content).with_path(path)
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T> {
    let content = fs::read(path).with_path(path)?;
    Ok(serde_json::from_slice(&content)?)
}
