use serde::Serialize;
use std::fmt;

/// Stable machine-readable codes surfaced to end users.
///
/// These strings are part of the external contract; renaming one is a
/// breaking change for anything parsing resolution output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    InvalidVercelJson,
    ServicesAndBuilds,
    ServicesAndFunctions,
    InvalidServiceName,
    MissingRoutePrefix,
    UnexpectedRoutePrefix,
    ReservedRoutePrefix,
    DuplicateRoutePrefix,
    MissingCronSchedule,
    MissingBuilder,
    UnknownFramework,
    NoManifestsFound,
    NoEntrypoint,
    ConflictingServices,
    MultipleFrameworks,
    ServiceNameConflict,
    NoServicesDetected,
    NoServicesConfigured,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::InvalidVercelJson => "INVALID_VERCEL_JSON",
            ErrorCode::ServicesAndBuilds => "SERVICES_AND_BUILDS",
            ErrorCode::ServicesAndFunctions => "SERVICES_AND_FUNCTIONS",
            ErrorCode::InvalidServiceName => "INVALID_SERVICE_NAME",
            ErrorCode::MissingRoutePrefix => "MISSING_ROUTE_PREFIX",
            ErrorCode::UnexpectedRoutePrefix => "UNEXPECTED_ROUTE_PREFIX",
            ErrorCode::ReservedRoutePrefix => "RESERVED_ROUTE_PREFIX",
            ErrorCode::DuplicateRoutePrefix => "DUPLICATE_ROUTE_PREFIX",
            ErrorCode::MissingCronSchedule => "MISSING_CRON_SCHEDULE",
            ErrorCode::MissingBuilder => "MISSING_BUILDER",
            ErrorCode::UnknownFramework => "UNKNOWN_FRAMEWORK",
            ErrorCode::NoManifestsFound => "NO_MANIFESTS_FOUND",
            ErrorCode::NoEntrypoint => "NO_ENTRYPOINT",
            ErrorCode::ConflictingServices => "CONFLICTING_SERVICES",
            ErrorCode::MultipleFrameworks => "MULTIPLE_FRAMEWORKS",
            ErrorCode::ServiceNameConflict => "SERVICE_NAME_CONFLICT",
            ErrorCode::NoServicesDetected => "NO_SERVICES_DETECTED",
            ErrorCode::NoServicesConfigured => "NO_SERVICES_CONFIGURED",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single detection error or warning.
///
/// The message names the offending path or service, so a user can fix the
/// project without reading engine internals. Whether an issue is fatal is
/// decided by which list it lands in, not by its shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DetectionIssue {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
}

impl DetectionIssue {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            service: None,
        }
    }

    pub fn for_service(code: ErrorCode, message: impl Into<String>, service: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            service: Some(service.into()),
        }
    }
}

impl fmt::Display for DetectionIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for DetectionIssue {}
