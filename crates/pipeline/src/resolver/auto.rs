//! Zero-config service auto-detection.
//!
//! Manifest discovery proposes candidate directories; each is resolved
//! independently and in parallel, with a join in discovery order so output
//! stays deterministic. A directory that fails keeps its siblings alive:
//! the caller sees every conflict in one pass.

use super::normalize::{self, ServiceDraft};
use super::{ResolutionResult, ResolverOptions};
use anyhow::Result;
use futures_util::future::join_all;
use switchyard_core::config::ServiceType;
use switchyard_core::error::{DetectionIssue, ErrorCode};
use switchyard_core::fs::DetectorFilesystem;
use switchyard_core::paths::last_segment;
use switchyard_detect::catalog::{builder_for_runtime, matching_frameworks, FrameworkSpec};
use switchyard_detect::entrypoints::discover_all_entrypoints;
use switchyard_detect::manifests::{discover_manifests, group_by_directory, DetectedManifest};
use tracing::{debug, warn};

enum DirOutcome {
    Service(Box<AutoDraft>),
    Skip(DetectionIssue),
    Conflict(DetectionIssue),
}

struct AutoDraft {
    directory: String,
    name: String,
    framework: Option<String>,
    runtime: Option<String>,
    entrypoint: Option<String>,
    builder_use: String,
    src_file: Option<String>,
}

fn service_name_for(directory: &str) -> String {
    if directory == "." {
        "root".to_string()
    } else {
        last_segment(directory)
    }
}

async fn detect_directory(
    fs: &DetectorFilesystem,
    catalog: &[FrameworkSpec],
    directory: &str,
    manifests: &[DetectedManifest],
) -> Result<DirOutcome> {
    let scoped = fs.chdir(if directory == "." { "" } else { directory });

    let frameworks = matching_frameworks(&scoped, catalog).await?;
    if frameworks.len() > 1 {
        let names: Vec<&str> = frameworks.iter().map(|fw| fw.detector.name.as_str()).collect();
        return Ok(DirOutcome::Conflict(DetectionIssue::new(
            ErrorCode::MultipleFrameworks,
            format!(
                "Multiple frameworks detected in `{}`: {}. Configure services explicitly.",
                directory,
                names.join(", ")
            ),
        )));
    }

    let tentative = frameworks.first().copied();
    if let Some(framework) = tentative {
        let entrypoint_present = match framework.default_entrypoint {
            None => true,
            Some(entry) => scoped.is_file(entry).await?,
        };
        if entrypoint_present {
            debug!(directory, framework = framework.slug(), "Framework service detected");
            return Ok(DirOutcome::Service(Box::new(AutoDraft {
                directory: directory.to_string(),
                name: service_name_for(directory),
                framework: Some(framework.slug().to_string()),
                runtime: framework.runtime.map(str::to_string),
                entrypoint: framework.default_entrypoint.map(str::to_string),
                builder_use: framework.default_builder.to_string(),
                src_file: Some(manifests[0].file_name.clone()),
            })));
        }
    }

    let runtimes: Vec<String> = manifests.iter().map(|m| m.runtime.clone()).collect();
    let hits = discover_all_entrypoints(&scoped, "", &runtimes).await?;

    match hits.len() {
        0 => {
            warn!(directory, "No entrypoint found, skipping directory");
            Ok(DirOutcome::Skip(DetectionIssue::new(
                ErrorCode::NoEntrypoint,
                format!(
                    "No entrypoint found in `{}` for detected manifests; directory skipped",
                    directory
                ),
            )))
        }
        1 => {
            let hit = &hits[0];
            let Some(builder) = builder_for_runtime(&hit.runtime) else {
                return Ok(DirOutcome::Skip(DetectionIssue::new(
                    ErrorCode::NoEntrypoint,
                    format!(
                        "No builder available for runtime `{}` in `{}`",
                        hit.runtime, directory
                    ),
                )));
            };
            Ok(DirOutcome::Service(Box::new(AutoDraft {
                directory: directory.to_string(),
                name: service_name_for(directory),
                // A framework that matched but lacked its entrypoint still
                // tags the runtime service.
                framework: tentative.map(|fw| fw.slug().to_string()),
                runtime: Some(hit.runtime.clone()),
                entrypoint: Some(hit.entrypoint.clone()),
                builder_use: builder.to_string(),
                src_file: None,
            })))
        }
        _ => {
            let files: Vec<String> = hits
                .iter()
                .map(|hit| format!("`{}` ({})", hit.entrypoint, hit.runtime))
                .collect();
            Ok(DirOutcome::Conflict(DetectionIssue::new(
                ErrorCode::ConflictingServices,
                format!(
                    "Directory `{}` has multiple entrypoints: {}. Configure services explicitly to disambiguate.",
                    directory,
                    files.join(" and ")
                ),
            )))
        }
    }
}

pub(crate) async fn resolve_auto(
    fs: &DetectorFilesystem,
    catalog: &[FrameworkSpec],
    options: &ResolverOptions,
) -> Result<ResolutionResult> {
    let mut result = ResolutionResult::default();

    let manifests = discover_manifests(fs, options.max_depth).await?;
    if manifests.is_empty() {
        result.errors.push(DetectionIssue::new(
            ErrorCode::NoManifestsFound,
            "No runtime manifests found. Add a manifest (package.json, pyproject.toml, go.mod, ...) or configure services explicitly.",
        ));
        return Ok(result);
    }

    let groups = group_by_directory(manifests);

    // Sibling directories probe in parallel; the join keeps discovery order.
    let outcomes = join_all(
        groups
            .iter()
            .map(|(directory, members)| detect_directory(fs, catalog, directory, members)),
    )
    .await;

    let mut drafts: Vec<AutoDraft> = Vec::new();
    for outcome in outcomes {
        match outcome? {
            DirOutcome::Service(draft) => drafts.push(*draft),
            DirOutcome::Skip(warning) => result.warnings.push(warning),
            DirOutcome::Conflict(error) => result.errors.push(error),
        }
    }

    // Independently discovered directories must not collapse onto one name.
    for (index, draft) in drafts.iter().enumerate() {
        for other in &drafts[index + 1..] {
            if draft.name == other.name {
                result.errors.push(DetectionIssue::for_service(
                    ErrorCode::ServiceNameConflict,
                    format!(
                        "Directories `{}` and `{}` both produce a service named `{}`. Rename one directory or configure services explicitly.",
                        draft.directory, other.directory, draft.name
                    ),
                    draft.name.clone(),
                ));
            }
        }
    }

    if drafts.is_empty() && result.errors.is_empty() {
        result.errors.push(DetectionIssue::new(
            ErrorCode::NoServicesDetected,
            "No services could be detected from the project tree.",
        ));
    }

    if !result.errors.is_empty() {
        return Ok(result);
    }

    let mut services = Vec::new();
    for draft in drafts {
        let workspace = if draft.directory == "." {
            None
        } else {
            Some(draft.directory.clone())
        };
        services.push(
            normalize::finalize(
                fs,
                ServiceDraft {
                    name: draft.name,
                    service_type: ServiceType::Web,
                    workspace,
                    entrypoint: draft.entrypoint,
                    framework: draft.framework,
                    runtime: draft.runtime,
                    builder_use: draft.builder_use,
                    src_file: draft.src_file,
                    explicit_prefix: None,
                    schedule: None,
                    topic: None,
                    consumer: None,
                    zero_config: true,
                    memory: None,
                    max_duration: None,
                    include_files: None,
                    exclude_files: None,
                    build_command: None,
                    install_command: None,
                },
            )
            .await?,
        );
    }

    super::configured::check_duplicate_prefixes(&services, &mut result.errors);
    if result.errors.is_empty() {
        result.services = services;
    }
    Ok(result)
}
