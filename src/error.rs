use std::path::PathBuf;

/// error type for barbarian operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("no git repository found at or above {0}")]
    NoRepo(PathBuf),

    #[error("git remote '{0}' is not configured")]
    RemoteNotFound(String),

    #[error("repository has no commits to root the '{0}' branch from")]
    NoHistory(String),

    #[error("executable not found: {0}")]
    ToolNotFound(String),

    #[error("command `{command}` failed ({status}): {stderr}")]
    CommandFailed {
        command: String,
        status: String,
        stderr: String,
    },

    #[error("upload worktree {0} already exists; clean it up manually (remove it and run `git worktree prune`)")]
    WorktreeOccupied(PathBuf),

    #[error("exported recipe not found: {0} is missing")]
    MissingExport(PathBuf),

    #[error("exported recipe revision not found in {0}")]
    MissingRevision(PathBuf),

    #[error("invalid reference: {0}")]
    InvalidReference(String),

    #[error("reference '{0}' must name both the package and the version")]
    IncompleteReference(String),

    #[error("invalid remote '{0}': expected <url>@<name>")]
    InvalidRemote(String),

    #[error("refusing to overwrite existing file {0} (use --overwrite)")]
    FileExists(PathBuf),

    #[error("invalid md5 digest: {0}")]
    InvalidDigest(String),

    #[error("template placeholder @{0}@ has no binding")]
    UnboundPlaceholder(String),

    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("config error: {0}")]
    Config(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// helper to wrap io errors with path context
pub trait IoResultExt<T> {
    fn with_path(self, path: impl Into<PathBuf>) -> Result<T>;
}

impl<T> IoResultExt<T> for std::io::Result<T> {
    fn with_path(self, path: impl Into<PathBuf>) -> Result<T> {
        self.map_err(|source| Error::Io {
            path: path.into(),
            source,
        })
    }
}
