//! Service resolution pipeline.
//!
//! One resolution run is a pure function of the filesystem view and its
//! options: read the project config, take either the configured or the
//! auto-detect path, validate, normalize. Errors abort the whole batch but
//! are accumulated first, so a single pass reports every independent
//! violation rather than the first one hit.

mod auto;
mod configured;
mod normalize;

use crate::service::Service;
use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use switchyard_core::config::{ProjectConfig, CONFIG_FILE};
use switchyard_core::error::{DetectionIssue, ErrorCode};
use switchyard_core::fs::{DetectorFilesystem, FsError};
use switchyard_detect::catalog::FrameworkSpec;
use switchyard_detect::manifests::DEFAULT_MAX_DEPTH;
use tracing::{debug, info};

/// Inputs of a resolution run beyond the filesystem itself.
///
/// The environment is passed explicitly instead of read ambiently so that
/// resolution stays a pure function of its inputs.
#[derive(Debug, Clone)]
pub struct ResolverOptions {
    pub config_file: String,
    pub max_depth: usize,
    pub env: BTreeMap<String, String>,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self {
            config_file: CONFIG_FILE.to_string(),
            max_depth: DEFAULT_MAX_DEPTH,
            env: BTreeMap::new(),
        }
    }
}

/// Outcome of a resolution run.
///
/// `errors` non-empty means the batch failed and `services` is empty;
/// warnings are advisory and can accompany either outcome.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ResolutionResult {
    pub services: Vec<Service>,
    pub errors: Vec<DetectionIssue>,
    pub warnings: Vec<DetectionIssue>,
}

impl ResolutionResult {
    pub(crate) fn failed(issue: DetectionIssue) -> Self {
        Self {
            errors: vec![issue],
            ..Default::default()
        }
    }

    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

enum ConfigOutcome {
    Absent,
    Invalid(DetectionIssue),
    Found(ProjectConfig),
}

async fn read_project_config(
    fs: &DetectorFilesystem,
    config_file: &str,
) -> Result<ConfigOutcome> {
    let text = match fs.read_file(config_file).await {
        Ok(text) => text,
        Err(FsError::NotFound(_)) => return Ok(ConfigOutcome::Absent),
        Err(err) => {
            return Err(err).with_context(|| format!("failed to read {}", config_file))
        }
    };
    match ProjectConfig::from_json(&text) {
        Ok(config) => Ok(ConfigOutcome::Found(config)),
        Err(err) => Ok(ConfigOutcome::Invalid(DetectionIssue::new(
            ErrorCode::InvalidVercelJson,
            format!("Could not parse {}: {}", config_file, err),
        ))),
    }
}

fn check_legacy_conflicts(config: &ProjectConfig) -> Option<DetectionIssue> {
    if !config.has_services() {
        return None;
    }
    if config.builds.is_some() {
        return Some(DetectionIssue::new(
            ErrorCode::ServicesAndBuilds,
            "`experimentalServices` cannot be combined with the legacy `builds` property. Remove one of them.",
        ));
    }
    if config.functions.is_some() {
        return Some(DetectionIssue::new(
            ErrorCode::ServicesAndFunctions,
            "`experimentalServices` cannot be combined with the `functions` property. Remove one of them.",
        ));
    }
    None
}

/// Resolves the project's services.
///
/// Explicit configuration wins; otherwise services are auto-detected from
/// the tree. Runs to completion or error; abandoning the call leaves the
/// filesystem view safe to discard.
pub async fn resolve_services(
    fs: &DetectorFilesystem,
    catalog: &[FrameworkSpec],
    options: &ResolverOptions,
) -> Result<ResolutionResult> {
    let config = match read_project_config(fs, &options.config_file).await? {
        ConfigOutcome::Invalid(issue) => return Ok(ResolutionResult::failed(issue)),
        ConfigOutcome::Found(config) => Some(config),
        ConfigOutcome::Absent => None,
    };

    if let Some(config) = &config {
        if let Some(issue) = check_legacy_conflicts(config) {
            return Ok(ResolutionResult::failed(issue));
        }
        if let Some(services) = config
            .experimental_services
            .as_ref()
            .filter(|services| !services.is_empty())
        {
            info!(count = services.len(), "Resolving configured services");
            return configured::resolve_configured(fs, catalog, services).await;
        }
    }

    if options
        .env
        .get("SWITCHYARD_NO_AUTO_DETECT")
        .map(|value| value == "1")
        .unwrap_or(false)
    {
        debug!("Auto-detection disabled by environment");
        return Ok(ResolutionResult::failed(DetectionIssue::new(
            ErrorCode::NoServicesConfigured,
            "No services configured and auto-detection is disabled. Configure `experimentalServices` in vercel.json.",
        )));
    }

    info!("No explicit services configured, auto-detecting");
    auto::resolve_auto(fs, catalog, options).await
}
