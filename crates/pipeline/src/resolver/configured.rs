//! Resolution of explicitly configured services.
//!
//! Every service in the batch is validated even after one fails, so a single
//! run reports every independent violation. Any error empties the batch: no
//! partial success.

use super::normalize::{self, ServiceDraft};
use super::ResolutionResult;
use crate::service::RESERVED_PREFIX;
use anyhow::Result;
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::OnceLock;
use switchyard_core::config::{ServiceConfig, ServiceType};
use switchyard_core::error::{DetectionIssue, ErrorCode};
use switchyard_core::fs::DetectorFilesystem;
use switchyard_core::paths::normalize_route_prefix;
use switchyard_detect::catalog::{builder_for_runtime, find_framework, FrameworkSpec};
use switchyard_detect::entrypoints::runtime_for_entrypoint;
use switchyard_detect::manifests::manifests_for_runtime;
use tracing::debug;

/// Starts with a letter, ends alphanumeric, interior limited to
/// alphanumerics, hyphens and underscores.
fn service_name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[A-Za-z]([A-Za-z0-9_-]*[A-Za-z0-9])?$").expect("static pattern")
    })
}

pub(crate) fn is_valid_service_name(name: &str) -> bool {
    service_name_pattern().is_match(name)
}

pub(crate) fn is_reserved_prefix(normalized: &str) -> bool {
    normalized == RESERVED_PREFIX || normalized.starts_with(&format!("{}/", RESERVED_PREFIX))
}

struct BuilderChoice {
    use_: String,
    runtime: Option<String>,
    framework: Option<String>,
    /// Workspace-relative file the builder starts from when the service has
    /// no entrypoint (a framework's manifest).
    src_file: Option<String>,
    /// Whether the builder was picked by detection rather than named by the
    /// user.
    zero_config: bool,
}

fn pick_builder(
    catalog: &[FrameworkSpec],
    name: &str,
    config: &ServiceConfig,
) -> Result<BuilderChoice, DetectionIssue> {
    if let Some(slug) = &config.framework {
        let Some(framework) = find_framework(catalog, slug) else {
            return Err(DetectionIssue::for_service(
                ErrorCode::UnknownFramework,
                format!("Service `{}` references unknown framework `{}`", name, slug),
                name,
            ));
        };
        return Ok(BuilderChoice {
            use_: framework.default_builder.to_string(),
            runtime: config
                .runtime
                .clone()
                .or_else(|| framework.runtime.map(str::to_string)),
            framework: Some(slug.clone()),
            src_file: framework
                .runtime
                .and_then(|runtime| manifests_for_runtime(runtime).first().copied())
                .map(str::to_string),
            zero_config: true,
        });
    }

    if let Some(builder) = &config.builder {
        if config.entrypoint.is_none() {
            return Err(DetectionIssue::for_service(
                ErrorCode::MissingBuilder,
                format!(
                    "Service `{}` declares builder `{}` but no entrypoint to build",
                    name, builder
                ),
                name,
            ));
        }
        return Ok(BuilderChoice {
            use_: builder.clone(),
            runtime: config.runtime.clone(),
            framework: None,
            src_file: None,
            zero_config: false,
        });
    }

    if let Some(runtime) = &config.runtime {
        let Some(builder) = builder_for_runtime(runtime) else {
            return Err(DetectionIssue::for_service(
                ErrorCode::MissingBuilder,
                format!("Service `{}` declares unknown runtime `{}`", name, runtime),
                name,
            ));
        };
        if config.entrypoint.is_none() {
            return Err(DetectionIssue::for_service(
                ErrorCode::MissingBuilder,
                format!("Service `{}` declares a runtime but no entrypoint", name),
                name,
            ));
        }
        return Ok(BuilderChoice {
            use_: builder.to_string(),
            runtime: Some(runtime.clone()),
            framework: None,
            src_file: None,
            zero_config: true,
        });
    }

    if let Some(entrypoint) = &config.entrypoint {
        if let Some(runtime) = runtime_for_entrypoint(entrypoint) {
            // runtime_for_entrypoint only yields runtimes with builders
            let builder = builder_for_runtime(runtime).ok_or_else(|| {
                DetectionIssue::for_service(
                    ErrorCode::MissingBuilder,
                    format!("No builder available for runtime `{}`", runtime),
                    name,
                )
            })?;
            return Ok(BuilderChoice {
                use_: builder.to_string(),
                runtime: Some(runtime.to_string()),
                framework: None,
                src_file: None,
                zero_config: true,
            });
        }
        return Err(DetectionIssue::for_service(
            ErrorCode::MissingBuilder,
            format!(
                "Cannot infer a builder for service `{}` from entrypoint `{}`",
                name, entrypoint
            ),
            name,
        ));
    }

    Err(DetectionIssue::for_service(
        ErrorCode::MissingBuilder,
        format!(
            "Service `{}` needs a framework, a builder, or an entrypoint with a known runtime",
            name
        ),
        name,
    ))
}

fn validate_service(
    name: &str,
    config: &ServiceConfig,
    without_prefix: &mut Vec<String>,
) -> Vec<DetectionIssue> {
    let mut issues = Vec::new();

    if !is_valid_service_name(name) {
        issues.push(DetectionIssue::for_service(
            ErrorCode::InvalidServiceName,
            format!(
                "Invalid service name `{}`: must start with a letter, end alphanumeric, and contain only letters, digits, hyphens and underscores",
                name
            ),
            name,
        ));
    }

    match config.service_type {
        ServiceType::Web => {
            match &config.route_prefix {
                Some(prefix) => {
                    let normalized = normalize_route_prefix(prefix);
                    if is_reserved_prefix(&normalized) {
                        issues.push(DetectionIssue::for_service(
                            ErrorCode::ReservedRoutePrefix,
                            format!(
                                "Service `{}` uses route prefix `{}`, which is reserved for internal routing under `{}`",
                                name, normalized, RESERVED_PREFIX
                            ),
                            name,
                        ));
                    }
                }
                None => without_prefix.push(name.to_string()),
            }
        }
        ServiceType::Worker | ServiceType::Cron => {
            if config.route_prefix.is_some() {
                issues.push(DetectionIssue::for_service(
                    ErrorCode::UnexpectedRoutePrefix,
                    format!(
                        "Service `{}` is a {} service and must not declare `routePrefix`",
                        name,
                        match config.service_type {
                            ServiceType::Worker => "worker",
                            _ => "cron",
                        }
                    ),
                    name,
                ));
            }
        }
    }

    if config.service_type == ServiceType::Cron && config.schedule.is_none() {
        issues.push(DetectionIssue::for_service(
            ErrorCode::MissingCronSchedule,
            format!("Cron service `{}` must declare a `schedule`", name),
            name,
        ));
    }

    issues
}

pub(crate) fn check_duplicate_prefixes(
    services: &[crate::service::Service],
    errors: &mut Vec<DetectionIssue>,
) {
    let mut seen: BTreeMap<String, String> = BTreeMap::new();
    for service in services {
        let Some(prefix) = &service.route_prefix else {
            continue;
        };
        match seen.get(prefix) {
            Some(other) => errors.push(DetectionIssue::new(
                ErrorCode::DuplicateRoutePrefix,
                format!(
                    "Services `{}` and `{}` share route prefix `{}`",
                    other, service.name, prefix
                ),
            )),
            None => {
                seen.insert(prefix.clone(), service.name.clone());
            }
        }
    }
}

pub(crate) async fn resolve_configured(
    fs: &DetectorFilesystem,
    catalog: &[FrameworkSpec],
    configs: &BTreeMap<String, ServiceConfig>,
) -> Result<ResolutionResult> {
    let mut result = ResolutionResult::default();
    let mut drafts = Vec::new();
    let mut without_prefix = Vec::new();

    for (name, config) in configs {
        let mut issues = validate_service(name, config, &mut without_prefix);

        match pick_builder(catalog, name, config) {
            Ok(choice) if issues.is_empty() => {
                debug!(service = %name, builder = %choice.use_, "Validated service");
                drafts.push(ServiceDraft {
                    name: name.clone(),
                    service_type: config.service_type,
                    workspace: config.workspace.clone(),
                    entrypoint: config.entrypoint.clone(),
                    framework: choice.framework,
                    runtime: choice.runtime,
                    builder_use: choice.use_,
                    src_file: choice.src_file,
                    explicit_prefix: config.route_prefix.clone(),
                    schedule: config.schedule.clone(),
                    topic: config.topic.clone(),
                    consumer: config.consumer.clone(),
                    zero_config: choice.zero_config,
                    memory: config.memory,
                    max_duration: config.max_duration,
                    include_files: config.include_files.clone(),
                    exclude_files: config.exclude_files.clone(),
                    build_command: config.build_command.clone(),
                    install_command: config.install_command.clone(),
                });
            }
            Ok(_) => {}
            Err(issue) => issues.push(issue),
        }

        result.errors.extend(issues);
    }

    if without_prefix.len() > 1 {
        result.errors.push(DetectionIssue::new(
            ErrorCode::MissingRoutePrefix,
            format!(
                "Multiple web services omit `routePrefix`: {}. At most one web service may take the default prefix.",
                without_prefix.join(", ")
            ),
        ));
    }

    if !result.errors.is_empty() {
        return Ok(result);
    }

    let mut services = Vec::new();
    for draft in drafts {
        services.push(normalize::finalize(fs, draft).await?);
    }

    check_duplicate_prefixes(&services, &mut result.errors);
    if result.errors.is_empty() {
        result.services = services;
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_name_pattern() {
        assert!(is_valid_service_name("api"));
        assert!(is_valid_service_name("dashboard-api"));
        assert!(is_valid_service_name("a"));
        assert!(is_valid_service_name("worker_2"));

        assert!(!is_valid_service_name(""));
        assert!(!is_valid_service_name("2api"));
        assert!(!is_valid_service_name("-api"));
        assert!(!is_valid_service_name("api-"));
        assert!(!is_valid_service_name("my service"));
    }

    #[test]
    fn test_reserved_prefix_detection() {
        assert!(is_reserved_prefix("/_services"));
        assert!(is_reserved_prefix("/_services/api"));
        assert!(!is_reserved_prefix("/_services-ish"));
        assert!(!is_reserved_prefix("/api"));
    }
}
