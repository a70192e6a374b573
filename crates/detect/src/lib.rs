pub mod catalog;
pub mod entrypoints;
pub mod manifests;
pub mod rules;

pub use catalog::{FrameworkSpec, OutputKind};
pub use manifests::DetectedManifest;
pub use rules::{
    detect_all, detect_first, detect_first_with_version, remove_superseded, DetectError,
    DetectorMatch, DetectorSpec, MatchRule,
};
