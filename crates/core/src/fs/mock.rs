use super::source::{DirectoryEntry, EntryKind, FileSource, FsError};
use crate::paths::{normalize_path, parent_dir};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;

/// In-memory [`FileSource`] for tests.
///
/// Parent directories are created implicitly when a file is added. Every
/// primitive operation is counted, which lets tests assert that the caching
/// view issued at most one underlying call per path.
pub struct MockFileSource {
    files: RwLock<HashMap<String, String>>,
    dirs: RwLock<HashSet<String>>,
    has_path_calls: AtomicUsize,
    is_file_calls: AtomicUsize,
    read_file_calls: AtomicUsize,
    read_dir_calls: AtomicUsize,
}

impl MockFileSource {
    pub fn new() -> Self {
        Self {
            files: RwLock::new(HashMap::new()),
            dirs: RwLock::new(HashSet::new()),
            has_path_calls: AtomicUsize::new(0),
            is_file_calls: AtomicUsize::new(0),
            read_file_calls: AtomicUsize::new(0),
            read_dir_calls: AtomicUsize::new(0),
        }
    }

    pub fn from_files(files: &[(&str, &str)]) -> Self {
        let source = Self::new();
        for (path, content) in files {
            source.add_file(path, content);
        }
        source
    }

    pub fn add_file(&self, path: &str, content: &str) {
        let path = normalize_path(path);
        let mut dir = parent_dir(&path);
        let mut dirs = self.dirs.write().unwrap();
        while !dir.is_empty() {
            dirs.insert(dir.clone());
            dir = parent_dir(&dir);
        }
        self.files.write().unwrap().insert(path, content.to_string());
    }

    pub fn add_dir(&self, path: &str) {
        let mut dir = normalize_path(path);
        let mut dirs = self.dirs.write().unwrap();
        while !dir.is_empty() {
            dirs.insert(dir.clone());
            dir = parent_dir(&dir);
        }
    }

    pub fn has_path_calls(&self) -> usize {
        self.has_path_calls.load(Ordering::SeqCst)
    }

    pub fn is_file_calls(&self) -> usize {
        self.is_file_calls.load(Ordering::SeqCst)
    }

    pub fn read_file_calls(&self) -> usize {
        self.read_file_calls.load(Ordering::SeqCst)
    }

    pub fn read_dir_calls(&self) -> usize {
        self.read_dir_calls.load(Ordering::SeqCst)
    }

    fn is_dir(&self, path: &str) -> bool {
        path.is_empty() || self.dirs.read().unwrap().contains(path)
    }
}

impl Default for MockFileSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FileSource for MockFileSource {
    async fn has_path(&self, path: &str) -> Result<bool, FsError> {
        self.has_path_calls.fetch_add(1, Ordering::SeqCst);
        let path = normalize_path(path);
        Ok(self.is_dir(&path) || self.files.read().unwrap().contains_key(&path))
    }

    async fn is_file(&self, path: &str) -> Result<bool, FsError> {
        self.is_file_calls.fetch_add(1, Ordering::SeqCst);
        let path = normalize_path(path);
        Ok(self.files.read().unwrap().contains_key(&path))
    }

    async fn read_file(&self, path: &str) -> Result<String, FsError> {
        self.read_file_calls.fetch_add(1, Ordering::SeqCst);
        let path = normalize_path(path);
        self.files
            .read()
            .unwrap()
            .get(&path)
            .cloned()
            .ok_or(FsError::NotFound(path))
    }

    async fn read_dir(&self, path: &str) -> Result<Vec<DirectoryEntry>, FsError> {
        self.read_dir_calls.fetch_add(1, Ordering::SeqCst);
        let dir = normalize_path(path);
        if !self.is_dir(&dir) {
            return Err(FsError::NotFound(dir));
        }

        let mut entries = Vec::new();
        for file in self.files.read().unwrap().keys() {
            if parent_dir(file) == dir {
                entries.push(DirectoryEntry {
                    name: crate::paths::last_segment(file),
                    path: file.clone(),
                    kind: EntryKind::File,
                });
            }
        }
        for nested in self.dirs.read().unwrap().iter() {
            if parent_dir(nested) == dir {
                entries.push(DirectoryEntry {
                    name: crate::paths::last_segment(nested),
                    path: nested.clone(),
                    kind: EntryKind::Dir,
                });
            }
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }
}
