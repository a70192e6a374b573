use super::source::{DirectoryEntry, EntryKind, FileSource, FsError};
use crate::paths::{join_paths, normalize_path};
use async_trait::async_trait;
use std::io;
use std::path::PathBuf;

/// A [`FileSource`] backed by the local disk, rooted at a directory.
///
/// All paths are resolved relative to the root; listings are sorted by name
/// so repeated scans of the same tree produce identical output.
pub struct RealFileSource {
    root: PathBuf,
}

impl RealFileSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, path: &str) -> PathBuf {
        let normalized = normalize_path(path);
        if normalized.is_empty() {
            self.root.clone()
        } else {
            self.root.join(normalized)
        }
    }
}

fn map_err(path: &str, err: io::Error) -> FsError {
    if err.kind() == io::ErrorKind::NotFound {
        FsError::NotFound(path.to_string())
    } else {
        FsError::io(path, err)
    }
}

#[async_trait]
impl FileSource for RealFileSource {
    async fn has_path(&self, path: &str) -> Result<bool, FsError> {
        match tokio::fs::metadata(self.resolve(path)).await {
            Ok(_) => Ok(true),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(FsError::io(path, err)),
        }
    }

    async fn is_file(&self, path: &str) -> Result<bool, FsError> {
        match tokio::fs::metadata(self.resolve(path)).await {
            Ok(meta) => Ok(meta.is_file()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(FsError::io(path, err)),
        }
    }

    async fn read_file(&self, path: &str) -> Result<String, FsError> {
        tokio::fs::read_to_string(self.resolve(path))
            .await
            .map_err(|err| map_err(path, err))
    }

    async fn read_dir(&self, path: &str) -> Result<Vec<DirectoryEntry>, FsError> {
        let dir = normalize_path(path);
        let mut reader = tokio::fs::read_dir(self.resolve(path))
            .await
            .map_err(|err| map_err(path, err))?;

        let mut entries = Vec::new();
        while let Some(entry) = reader
            .next_entry()
            .await
            .map_err(|err| FsError::io(path, err))?
        {
            let name = entry.file_name().to_string_lossy().to_string();
            let file_type = entry
                .file_type()
                .await
                .map_err(|err| FsError::io(path, err))?;
            let kind = if file_type.is_dir() {
                EntryKind::Dir
            } else {
                EntryKind::File
            };
            entries.push(DirectoryEntry {
                path: join_paths(&dir, &name),
                name,
                kind,
            });
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }
}
