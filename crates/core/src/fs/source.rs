use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

/// Kind of a directory entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Dir,
}

/// A single entry returned by a directory listing.
///
/// `path` is relative to the root of the view or source that produced it; it
/// is an immutable snapshot taken at listing time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirectoryEntry {
    pub name: String,
    pub path: String,
    pub kind: EntryKind,
}

/// Filesystem errors.
///
/// `Clone` is required so an in-flight operation's result can be shared
/// between concurrent callers of the caching view.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FsError {
    #[error("path not found: {0}")]
    NotFound(String),

    #[error("i/o error on {path}: {message}")]
    Io { path: String, message: String },
}

impl FsError {
    pub fn io(path: impl Into<String>, message: impl ToString) -> Self {
        FsError::Io {
            path: path.into(),
            message: message.to_string(),
        }
    }
}

/// The four primitive operations detection is built on.
///
/// Implementations may be local disk, an in-memory tree, or a remote store.
/// They are intentionally unaware of caching; [`super::DetectorFilesystem`]
/// layers memoization on top.
#[async_trait]
pub trait FileSource: Send + Sync {
    /// Whether the path exists at all. Must not fail for missing paths.
    async fn has_path(&self, path: &str) -> Result<bool, FsError>;

    /// Whether the path exists and is a regular file.
    async fn is_file(&self, path: &str) -> Result<bool, FsError>;

    /// File contents as text.
    async fn read_file(&self, path: &str) -> Result<String, FsError>;

    /// Directory listing, sorted by name for deterministic output.
    async fn read_dir(&self, path: &str) -> Result<Vec<DirectoryEntry>, FsError>;
}
