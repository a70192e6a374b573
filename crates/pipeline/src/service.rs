//! The resolved service record handed to the build-execution stage.

use serde::Serialize;
use switchyard_core::config::ServiceType;

/// Route prefix reserved for internal dispatch. User-facing web prefixes may
/// not equal it or nest under it; synthesized rewrites target paths below it.
pub const RESERVED_PREFIX: &str = "/_services";

/// The internal dispatch path for a service's function.
pub fn function_path(name: &str) -> String {
    format!("{}/{}", RESERVED_PREFIX, name)
}

/// A fully resolved builder invocation.
///
/// `src` is always relative to the scan root, never to the service's own
/// workspace.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BuilderInvocation {
    pub src: String,
    #[serde(rename = "use")]
    pub use_: String,
    pub config: BuilderConfig,
}

/// Builder configuration carried through from the project config.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuilderConfig {
    pub zero_config: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_duration: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include_files: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclude_files: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub build_command: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub install_command: Option<String>,
}

/// One independently buildable and routable unit of a project.
///
/// Immutable once resolution completes; it is the output artifact.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    pub name: String,
    #[serde(rename = "type")]
    pub service_type: ServiceType,
    /// Directory relative to the scan root, `.` for the root itself.
    pub workspace: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entrypoint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub framework: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub runtime: Option<String>,
    /// Normalized route prefix; present exactly for web services.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route_prefix: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schedule: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consumer: Option<String>,
    pub builder: BuilderInvocation,
}

impl Service {
    pub fn is_web(&self) -> bool {
        self.service_type == ServiceType::Web
    }

    /// The internal dispatch path for this service's function.
    pub fn function_path(&self) -> String {
        function_path(&self.name)
    }
}
