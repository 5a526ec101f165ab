//! build the artifact set of a revision from an exported recipe
//!
//! the export directory (as written by `conan export`) holds:
//!
//! - `export/`: recipe script, export manifest and an optional `conandata.yml`
//! - `export_source/`: optional bundled sources (older recipes have none)
//!
//! which become, in the destination `files/` directory:
//!
//! - `conan_export.tgz`: `conandata.yml`, or no entries at all
//! - `conan_sources.tgz`: every entry of `export_source/`, only if it exists
//! - a verbatim copy of every other regular file in `export/`

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use flate2::write::GzEncoder;
use flate2::{Compression, GzBuilder};
use tar::{Builder, EntryType, Header};
use tracing::debug;
use walkdir::WalkDir;

use crate::error::{Error, IoResultExt, Result};

pub const EXPORT_DIR: &str = "export";
pub const EXPORT_SOURCE_DIR: &str = "export_source";
pub const CONANDATA: &str = "conandata.yml";
pub const EXPORT_ARCHIVE: &str = "conan_export.tgz";
pub const SOURCES_ARCHIVE: &str = "conan_sources.tgz";

/// build `files_dir` from `export_dir`, returning the artifact names written
pub fn build_files(export_dir: &Path, files_dir: &Path) -> Result<Vec<String>> {
    let export = export_dir.join(EXPORT_DIR);
    if !export.is_dir() {
        return Err(Error::MissingExport(export));
    }

    fs::create_dir_all(files_dir).with_path(files_dir)?;
    let mtime = archive_mtime();
    let mut artifacts = Vec::new();

    // conandata.yml only travels inside the archive
    let conandata = export.join(CONANDATA);
    let members: Vec<(String, PathBuf)> = if conandata.is_file() {
        vec![(CONANDATA.to_string(), conandata)]
    } else {
        vec![]
    };
    write_archive(&files_dir.join(EXPORT_ARCHIVE), &members, mtime)?;
    artifacts.push(EXPORT_ARCHIVE.to_string());

    let export_source = export_dir.join(EXPORT_SOURCE_DIR);
    if export_source.is_dir() {
        let members = top_level_entries(&export_source)?;
        write_archive(&files_dir.join(SOURCES_ARCHIVE), &members, mtime)?;
        artifacts.push(SOURCES_ARCHIVE.to_string());
    } else {
        debug!("no {} in {}, skipping sources archive", EXPORT_SOURCE_DIR, export_dir.display());
    }

    for entry in WalkDir::new(&export)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|e| Error::Io {
            path: export.clone(),
            source: e.into(),
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if name == CONANDATA {
            continue;
        }
        let dest = files_dir.join(&name);
        fs::copy(entry.path(), &dest).with_path(&dest)?;
        artifacts.push(name);
    }

    artifacts.sort();
    Ok(artifacts)
}

/// archive mtime, taken from SOURCE_DATE_EPOCH so builds are reproducible
fn archive_mtime() -> u64 {
    std::env::var("SOURCE_DATE_EPOCH")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(0)
}

/// entries directly under `dir`, keyed by base name, sorted
fn top_level_entries(dir: &Path) -> Result<Vec<(String, PathBuf)>> {
    let mut members = Vec::new();
    for entry in fs::read_dir(dir).with_path(dir)? {
        let entry = entry.with_path(dir)?;
        members.push((entry.file_name().to_string_lossy().into_owned(), entry.path()));
    }
    members.sort();
    Ok(members)
}

/// write a gzip tar of `members` (archive name, source path) to `dest`
fn write_archive(dest: &Path, members: &[(String, PathBuf)], mtime: u64) -> Result<()> {
    let file = File::create(dest).with_path(dest)?;
    // gzip header mtime stays zero
    let encoder = GzBuilder::new().write(BufWriter::new(file), Compression::default());
    let mut archive = Builder::new(encoder);

    for (name, path) in members {
        append_path(&mut archive, path, name, mtime)?;
    }

    let encoder = archive.into_inner().with_path(dest)?;
    finish(encoder, dest)
}

fn finish<W: Write>(encoder: GzEncoder<BufWriter<W>>, dest: &Path) -> Result<()> {
    let mut inner = encoder.finish().with_path(dest)?;
    inner.flush().with_path(dest)?;
    Ok(())
}

/// append a file or directory tree with normalized headers
fn append_path<W: Write>(
    archive: &mut Builder<W>,
    path: &Path,
    archive_path: &str,
    mtime: u64,
) -> Result<()> {
    let meta = fs::symlink_metadata(path).with_path(path)?;

    if meta.is_dir() {
        let mut header = normalized_header(EntryType::Directory, 0o755, 0, mtime);
        archive
            .append_data(&mut header, archive_path, std::io::empty())
            .with_path(path)?;

        let mut children = Vec::new();
        for entry in fs::read_dir(path).with_path(path)? {
            let entry = entry.with_path(path)?;
            children.push((entry.file_name().to_string_lossy().into_owned(), entry.path()));
        }
        children.sort();

        for (name, child) in children {
            append_path(archive, &child, &format!("{}/{}", archive_path, name), mtime)?;
        }
    } else if meta.file_type().is_symlink() {
        let target = fs::read_link(path).with_path(path)?;
        let mut header = normalized_header(EntryType::Symlink, 0o777, 0, mtime);
        archive
            .append_link(&mut header, archive_path, &target)
            .with_path(path)?;
    } else {
        let mode = if is_executable(&meta) { 0o755 } else { 0o644 };
        let mut header = normalized_header(EntryType::Regular, mode, meta.len(), mtime);
        let file = File::open(path).with_path(path)?;
        archive
            .append_data(&mut header, archive_path, file)
            .with_path(path)?;
    }

    Ok(())
}

fn normalized_header(kind: EntryType, mode: u32, size: u64, mtime: u64) -> Header {
    let mut header = Header::new_gnu();
    header.set_entry_type(kind);
    header.set_mode(mode);
    header.set_size(size);
    header.set_mtime(mtime);
    header.set_uid(0);
    header.set_gid(0);
    header
}

#[cfg(unix)]
fn is_executable(meta: &fs::Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;
    meta.permissions().mode() & 0o111 != 0
}

#[cfg(not(unix))]
fn is_executable(_meta: &fs::Metadata) -> bool {
    false
}
