use super::source::{DirectoryEntry, EntryKind, FileSource, FsError};
use crate::paths::{join_paths, normalize_path};
use futures_util::future::{BoxFuture, Shared};
use futures_util::FutureExt;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// A memoized operation. Storing the future itself, not just its result,
/// means a second caller arriving while the first request is still in flight
/// awaits the same underlying call instead of issuing another one.
type SharedOp<T> = Shared<BoxFuture<'static, Result<T, FsError>>>;

type OpCache<T> = Mutex<HashMap<String, SharedOp<T>>>;

fn ready_op<T>(value: T) -> SharedOp<T>
where
    T: Clone + Send + 'static,
{
    futures_util::future::ready(Ok(value)).boxed().shared()
}

/// Caching view over a [`FileSource`], scoped to a subtree.
///
/// Each primitive is memoized independently, keyed by the normalized
/// view-relative path. Cache entries are written once and never invalidated
/// within a pass; the first future created for a key wins and is shared with
/// every later caller. [`DetectorFilesystem::read_dir`] additionally
/// back-fills the existence caches from the listing, so probing a directory
/// for dozens of candidate filenames costs a single listing call.
pub struct DetectorFilesystem {
    source: Arc<dyn FileSource>,
    cwd: String,
    has_path_cache: OpCache<bool>,
    is_file_cache: OpCache<bool>,
    read_file_cache: OpCache<Arc<str>>,
    read_dir_cache: OpCache<Arc<[DirectoryEntry]>>,
}

impl DetectorFilesystem {
    pub fn new(source: Arc<dyn FileSource>) -> Self {
        Self::scoped(source, String::new())
    }

    fn scoped(source: Arc<dyn FileSource>, cwd: String) -> Self {
        Self {
            source,
            cwd,
            has_path_cache: Mutex::new(HashMap::new()),
            is_file_cache: Mutex::new(HashMap::new()),
            read_file_cache: Mutex::new(HashMap::new()),
            read_dir_cache: Mutex::new(HashMap::new()),
        }
    }

    /// A new view rooted at `path`, with its own empty caches.
    ///
    /// Cache entries are deliberately not shared with the parent view: the
    /// two views key paths differently and must not observe each other's
    /// staged writes.
    pub fn chdir(&self, path: &str) -> DetectorFilesystem {
        Self::scoped(self.source.clone(), join_paths(&self.cwd, path))
    }

    /// The directory this view is rooted at, relative to the source root.
    pub fn cwd(&self) -> &str {
        &self.cwd
    }

    fn source_path(&self, key: &str) -> String {
        join_paths(&self.cwd, key)
    }

    fn cached<T, F>(cache: &OpCache<T>, key: &str, create: F) -> SharedOp<T>
    where
        T: Clone + Send + 'static,
        F: FnOnce() -> BoxFuture<'static, Result<T, FsError>>,
    {
        let mut cache = cache.lock().unwrap();
        cache
            .entry(key.to_string())
            .or_insert_with(|| create().shared())
            .clone()
    }

    /// Whether the path exists. Never fails for missing paths.
    pub async fn has_path(&self, path: &str) -> Result<bool, FsError> {
        let key = normalize_path(path);
        let op = Self::cached(&self.has_path_cache, &key, || {
            let source = self.source.clone();
            let target = self.source_path(&key);
            async move {
                match source.has_path(&target).await {
                    Err(FsError::NotFound(_)) => Ok(false),
                    other => other,
                }
            }
            .boxed()
        });
        op.await
    }

    /// Whether the path exists and is a regular file.
    pub async fn is_file(&self, path: &str) -> Result<bool, FsError> {
        let key = normalize_path(path);
        let op = Self::cached(&self.is_file_cache, &key, || {
            let source = self.source.clone();
            let target = self.source_path(&key);
            async move {
                match source.is_file(&target).await {
                    Err(FsError::NotFound(_)) => Ok(false),
                    other => other,
                }
            }
            .boxed()
        });
        op.await
    }

    /// File contents as shared text.
    pub async fn read_file(&self, path: &str) -> Result<Arc<str>, FsError> {
        let key = normalize_path(path);
        let op = Self::cached(&self.read_file_cache, &key, || {
            let source = self.source.clone();
            let target = self.source_path(&key);
            async move {
                let content = source.read_file(&target).await?;
                Ok(Arc::from(content.as_str()))
            }
            .boxed()
        });
        op.await
    }

    /// Lists a directory, with entry paths relative to this view.
    ///
    /// When `candidates` is supplied, every candidate filename absent from
    /// the listing is recorded as not-present in the existence caches, and
    /// every entry actually listed is recorded as present. Later
    /// `has_path`/`is_file` probes for those names are then answered without
    /// touching the source.
    pub async fn read_dir(
        &self,
        path: &str,
        candidates: Option<&[&str]>,
    ) -> Result<Arc<[DirectoryEntry]>, FsError> {
        let key = normalize_path(path);
        let op = Self::cached(&self.read_dir_cache, &key, || {
            let source = self.source.clone();
            let target = self.source_path(&key);
            let view_dir = key.clone();
            async move {
                let raw = source.read_dir(&target).await?;
                let entries: Vec<DirectoryEntry> = raw
                    .into_iter()
                    .map(|entry| DirectoryEntry {
                        path: join_paths(&view_dir, &entry.name),
                        name: entry.name,
                        kind: entry.kind,
                    })
                    .collect();
                Ok(Arc::from(entries.into_boxed_slice()))
            }
            .boxed()
        });
        let entries = op.await?;
        self.backfill(&key, &entries, candidates);
        Ok(entries)
    }

    fn backfill(&self, dir: &str, entries: &[DirectoryEntry], candidates: Option<&[&str]>) {
        let mut has_path = self.has_path_cache.lock().unwrap();
        let mut is_file = self.is_file_cache.lock().unwrap();

        for entry in entries {
            has_path
                .entry(entry.path.clone())
                .or_insert_with(|| ready_op(true));
            is_file
                .entry(entry.path.clone())
                .or_insert_with(|| ready_op(entry.kind == EntryKind::File));
        }

        if let Some(candidates) = candidates {
            for name in candidates {
                if entries.iter().any(|entry| entry.name == *name) {
                    continue;
                }
                let path = join_paths(dir, name);
                has_path.entry(path.clone()).or_insert_with(|| ready_op(false));
                is_file.entry(path).or_insert_with(|| ready_op(false));
            }
        }
    }

    /// Stages a synthetic file directly in the caches.
    ///
    /// The underlying source is never touched; subsequent reads and existence
    /// probes for this path are served from the staged entry.
    pub fn write_file(&self, path: &str, content: &str) {
        let key = normalize_path(path);
        self.read_file_cache
            .lock()
            .unwrap()
            .insert(key.clone(), ready_op(Arc::from(content)));
        self.has_path_cache
            .lock()
            .unwrap()
            .insert(key.clone(), ready_op(true));
        self.is_file_cache
            .lock()
            .unwrap()
            .insert(key, ready_op(true));
    }
}
