pub mod config;
pub mod error;
pub mod fs;
pub mod paths;

pub use config::{ProjectConfig, ServiceConfig, ServiceType, CONFIG_FILE};
pub use error::{DetectionIssue, ErrorCode};
pub use fs::{
    DetectorFilesystem, DirectoryEntry, EntryKind, FileSource, FsError, MockFileSource,
    RealFileSource,
};
