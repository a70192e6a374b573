//! Final normalization of validated service drafts.
//!
//! Everything path-shaped is settled here: workspace inference, re-rooting
//! entrypoints, the default route prefix, and the scan-root-relative
//! `builder.src`. All joining is structural; a workspace name that happens
//! to be a string prefix of the entrypoint path is never stripped.

use crate::service::{BuilderConfig, BuilderInvocation, Service};
use anyhow::Result;
use switchyard_core::config::ServiceType;
use switchyard_core::fs::{DetectorFilesystem, FsError};
use switchyard_core::paths::{
    join_paths, normalize_path, normalize_route_prefix, parent_dir, strip_dir,
};
use switchyard_detect::manifests::manifests_for_runtime;
use tracing::debug;

/// A validated service awaiting normalization.
pub(crate) struct ServiceDraft {
    pub name: String,
    pub service_type: ServiceType,
    pub workspace: Option<String>,
    pub entrypoint: Option<String>,
    pub framework: Option<String>,
    pub runtime: Option<String>,
    pub builder_use: String,
    /// Workspace-relative file for `builder.src` when there is no entrypoint.
    pub src_file: Option<String>,
    pub explicit_prefix: Option<String>,
    pub schedule: Option<String>,
    pub topic: Option<String>,
    pub consumer: Option<String>,
    pub zero_config: bool,
    pub memory: Option<u32>,
    pub max_duration: Option<u32>,
    pub include_files: Option<Vec<String>>,
    pub exclude_files: Option<Vec<String>>,
    pub build_command: Option<String>,
    pub install_command: Option<String>,
}

/// Walks upward from the entrypoint's directory looking for the nearest
/// runtime-appropriate manifest. On a hit below the root, the manifest's
/// directory becomes the workspace and the entrypoint is re-expressed
/// relative to it by segment-wise stripping.
async fn infer_workspace(
    fs: &DetectorFilesystem,
    entrypoint: &str,
    runtime: &str,
) -> Result<Option<(String, String)>, FsError> {
    let manifests = manifests_for_runtime(runtime);
    let mut dir = parent_dir(entrypoint);
    loop {
        for manifest in &manifests {
            let candidate = join_paths(&dir, manifest);
            if fs.is_file(&candidate).await? {
                if dir.is_empty() {
                    return Ok(None);
                }
                let Some(relative) = strip_dir(entrypoint, &dir) else {
                    return Ok(None);
                };
                return Ok(Some((dir, relative)));
            }
        }
        if dir.is_empty() {
            return Ok(None);
        }
        dir = parent_dir(&dir);
    }
}

pub(crate) async fn finalize(fs: &DetectorFilesystem, draft: ServiceDraft) -> Result<Service> {
    let mut workspace = draft.workspace.as_deref().map(normalize_path);
    let mut entrypoint = draft.entrypoint.clone();

    if workspace.is_none() {
        if let (Some(entry), Some(runtime)) = (&draft.entrypoint, &draft.runtime) {
            if let Some((inferred, relative)) = infer_workspace(fs, entry, runtime).await? {
                debug!(
                    service = %draft.name,
                    workspace = %inferred,
                    "Inferred workspace from entrypoint"
                );
                workspace = Some(inferred);
                entrypoint = Some(relative);
            }
        }
    }
    let workspace = workspace.unwrap_or_default();

    let route_prefix = match draft.service_type {
        ServiceType::Web => Some(match &draft.explicit_prefix {
            Some(prefix) => normalize_route_prefix(prefix),
            None => normalize_route_prefix(&workspace),
        }),
        _ => None,
    };

    let src = match (&entrypoint, &draft.src_file) {
        (Some(entry), _) => join_paths(&workspace, entry),
        (None, Some(file)) => join_paths(&workspace, file),
        (None, None) if workspace.is_empty() => ".".to_string(),
        (None, None) => workspace.clone(),
    };

    let (topic, consumer) = match draft.service_type {
        ServiceType::Worker => (
            Some(draft.topic.unwrap_or_else(|| "default".to_string())),
            Some(draft.consumer.unwrap_or_else(|| "default".to_string())),
        ),
        _ => (None, None),
    };

    Ok(Service {
        name: draft.name,
        service_type: draft.service_type,
        workspace: if workspace.is_empty() {
            ".".to_string()
        } else {
            workspace
        },
        entrypoint,
        framework: draft.framework,
        runtime: draft.runtime,
        route_prefix,
        schedule: draft.schedule,
        topic,
        consumer,
        builder: BuilderInvocation {
            src,
            use_: draft.builder_use,
            config: BuilderConfig {
                zero_config: draft.zero_config,
                memory: draft.memory,
                max_duration: draft.max_duration,
                include_files: draft.include_files,
                exclude_files: draft.exclude_files,
                build_command: draft.build_command,
                install_command: draft.install_command,
            },
        },
    })
}
