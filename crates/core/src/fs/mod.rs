//! Filesystem abstraction with per-path memoization.
//!
//! Detection never touches the disk directly: it runs against a
//! [`DetectorFilesystem`], a caching view over an abstract [`FileSource`].
//! The view guarantees at most one underlying I/O call per path and lets a
//! single directory listing answer dozens of candidate-file probes.

mod cached;
mod mock;
mod real;
mod source;

pub use cached::DetectorFilesystem;
pub use mock::MockFileSource;
pub use real::RealFileSource;
pub use source::{DirectoryEntry, EntryKind, FileSource, FsError};
