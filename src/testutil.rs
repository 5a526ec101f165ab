//! scratch git repositories for tests

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

/// run git in `dir`, panicking on failure, returning trimmed stdout
pub fn git(dir: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .expect("failed to spawn git");
    assert!(
        output.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

fn configure_identity(repo: &Path) {
    git(repo, &["config", "user.name", "Barbarian Test"]);
    git(repo, &["config", "user.email", "test@barbarian.invalid"]);
    git(repo, &["config", "commit.gpgsign", "false"]);
}

/// empty repository with no commits
pub fn init_repo(path: &Path) -> PathBuf {
    fs::create_dir_all(path).unwrap();
    git(path, &["init", "--quiet"]);
    configure_identity(path);
    path.to_path_buf()
}

/// repository with one commit holding a README
pub fn init_with_commit(path: &Path) -> PathBuf {
    let repo = init_repo(path);
    fs::write(repo.join("README.md"), "# recipes\n").unwrap();
    git(&repo, &["add", "README.md"]);
    git(&repo, &["commit", "--quiet", "-m", "initial"]);
    repo
}

/// bare remote under `base/remote.git` and a working clone at `base/<name>`
/// whose `origin` points at it
pub fn clone_of_bare(base: &Path, name: &str) -> (PathBuf, PathBuf) {
    let remote = base.join("remote.git");
    if !remote.exists() {
        fs::create_dir_all(&remote).unwrap();
        git(&remote, &["init", "--quiet", "--bare"]);

        let seed = init_with_commit(&base.join("seed"));
        git(&seed, &["remote", "add", "origin", remote.to_str().unwrap()]);
        git(&seed, &["push", "--quiet", "origin", "HEAD:refs/heads/main"]);
    }

    let work = base.join(name);
    git(
        base,
        &[
            "clone",
            "--quiet",
            "--branch",
            "main",
            remote.to_str().unwrap(),
            work.to_str().unwrap(),
        ],
    );
    configure_identity(&work);
    (remote, work)
}

/// export directory in the conan layout: export/ with a recipe and manifest
pub fn fake_export(path: &Path, with_conandata: bool) -> PathBuf {
    let export = path.join("export");
    fs::create_dir_all(&export).unwrap();
    fs::write(
        export.join("conanfile.py"),
        "from conans import ConanFile\n\nclass ZlibConan(ConanFile):\n    name = \"zlib\"\n",
    )
    .unwrap();
    fs::write(
        export.join("conanmanifest.txt"),
        "1620000000\nconanfile.py: 0123456789abcdef0123456789abcdef\n",
    )
    .unwrap();
    if with_conandata {
        fs::write(export.join("conandata.yml"), "sources: {}").unwrap();
    }
    path.to_path_buf()
}
