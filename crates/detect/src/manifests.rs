//! Runtime manifest discovery.
//!
//! A bounded walk over the cached view records every known manifest file
//! together with its runtime tag and containing directory. The depth bound
//! and the directory deny-list are correctness guards, not optimizations:
//! without them a cyclic symlink or a dependency cache turns the walk into a
//! crawl of the world.

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use serde::Serialize;
use switchyard_core::fs::{DetectorFilesystem, EntryKind, FsError};
use tracing::debug;

/// Maximum directory depth visited by default.
pub const DEFAULT_MAX_DEPTH: usize = 3;

/// Known manifest filenames and the runtime each one indicates.
pub const RUNTIME_MANIFESTS: &[(&str, &str)] = &[
    ("package.json", "node"),
    ("pyproject.toml", "python"),
    ("requirements.txt", "python"),
    ("Pipfile", "python"),
    ("go.mod", "go"),
    ("Cargo.toml", "rust"),
    ("Gemfile", "ruby"),
];

/// Conventional non-source directories the walk never descends into.
const EXCLUDED_DIRS: &[&str] = &[
    "node_modules",
    "vendor",
    "target",
    "dist",
    "build",
    "out",
    "__pycache__",
    "venv",
    "coverage",
];

/// A manifest file found during discovery.
///
/// `directory` is the containing folder relative to the scan root, with `.`
/// standing for the root itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DetectedManifest {
    pub path: String,
    pub directory: String,
    pub runtime: String,
    pub file_name: String,
}

pub fn runtime_for_manifest(file_name: &str) -> Option<&'static str> {
    RUNTIME_MANIFESTS
        .iter()
        .find(|(name, _)| *name == file_name)
        .map(|(_, runtime)| *runtime)
}

pub fn manifest_names() -> Vec<&'static str> {
    RUNTIME_MANIFESTS.iter().map(|(name, _)| *name).collect()
}

/// Manifest filenames that can anchor a workspace for the given runtime.
pub fn manifests_for_runtime(runtime: &str) -> Vec<&'static str> {
    RUNTIME_MANIFESTS
        .iter()
        .filter(|(_, rt)| *rt == runtime)
        .map(|(name, _)| *name)
        .collect()
}

fn is_excluded_dir(name: &str) -> bool {
    name.starts_with('.') || EXCLUDED_DIRS.contains(&name)
}

/// Walks the tree from the root, at most `max_depth` directories deep, and
/// returns every known manifest in discovery order (a directory's own files
/// before its subdirectories'). Directories that cannot be listed are
/// skipped, never fatal.
pub async fn discover_manifests(
    fs: &DetectorFilesystem,
    max_depth: usize,
) -> Result<Vec<DetectedManifest>, FsError> {
    walk(fs, String::new(), 0, max_depth).await
}

fn walk(
    fs: &DetectorFilesystem,
    dir: String,
    depth: usize,
    max_depth: usize,
) -> BoxFuture<'_, Result<Vec<DetectedManifest>, FsError>> {
    async move {
        let entries = match fs.read_dir(&dir, Some(&manifest_names())).await {
            Ok(entries) => entries,
            Err(err) => {
                debug!(directory = %dir, error = %err, "Skipping unlistable directory");
                return Ok(Vec::new());
            }
        };

        let mut found = Vec::new();
        for entry in entries.iter() {
            if entry.kind != EntryKind::File {
                continue;
            }
            if let Some(runtime) = runtime_for_manifest(&entry.name) {
                found.push(DetectedManifest {
                    path: entry.path.clone(),
                    directory: if dir.is_empty() { ".".to_string() } else { dir.clone() },
                    runtime: runtime.to_string(),
                    file_name: entry.name.clone(),
                });
            }
        }

        if depth < max_depth {
            for entry in entries.iter() {
                if entry.kind == EntryKind::Dir && !is_excluded_dir(&entry.name) {
                    found.extend(walk(fs, entry.path.clone(), depth + 1, max_depth).await?);
                }
            }
        }

        Ok(found)
    }
    .boxed()
}

/// Groups manifests by containing directory, preserving discovery order of
/// both the groups and their members.
pub fn group_by_directory(
    manifests: Vec<DetectedManifest>,
) -> Vec<(String, Vec<DetectedManifest>)> {
    let mut groups: Vec<(String, Vec<DetectedManifest>)> = Vec::new();
    for manifest in manifests {
        match groups.iter_mut().find(|(dir, _)| *dir == manifest.directory) {
            Some((_, members)) => members.push(manifest),
            None => groups.push((manifest.directory.clone(), vec![manifest])),
        }
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use switchyard_core::fs::MockFileSource;

    fn view(files: &[(&str, &str)]) -> DetectorFilesystem {
        DetectorFilesystem::new(Arc::new(MockFileSource::from_files(files)))
    }

    #[tokio::test]
    async fn test_discovers_manifests_with_runtime_tags() {
        let fs = view(&[
            ("package.json", "{}"),
            ("backend/pyproject.toml", ""),
            ("tools/go.mod", "module tools"),
        ]);

        let manifests = discover_manifests(&fs, DEFAULT_MAX_DEPTH).await.unwrap();
        let tags: Vec<(&str, &str)> = manifests
            .iter()
            .map(|m| (m.directory.as_str(), m.runtime.as_str()))
            .collect();
        assert_eq!(tags, vec![(".", "node"), ("backend", "python"), ("tools", "go")]);
        assert_eq!(manifests[1].path, "backend/pyproject.toml");
        assert_eq!(manifests[1].file_name, "pyproject.toml");
    }

    #[tokio::test]
    async fn test_depth_bound_stops_descent() {
        let fs = view(&[
            ("package.json", "{}"),
            ("a/b/c/package.json", "{}"),
            ("a/b/c/d/package.json", "{}"),
        ]);

        let manifests = discover_manifests(&fs, 3).await.unwrap();
        let paths: Vec<&str> = manifests.iter().map(|m| m.path.as_str()).collect();
        assert_eq!(paths, vec!["package.json", "a/b/c/package.json"]);

        let shallow = discover_manifests(&fs, 1).await.unwrap();
        assert_eq!(shallow.len(), 1);
    }

    #[tokio::test]
    async fn test_deny_list_and_hidden_dirs_are_skipped() {
        let fs = view(&[
            ("package.json", "{}"),
            ("node_modules/dep/package.json", "{}"),
            (".git/package.json", "{}"),
            (".cache/requirements.txt", ""),
            ("vendor/Gemfile", ""),
        ]);

        let manifests = discover_manifests(&fs, DEFAULT_MAX_DEPTH).await.unwrap();
        assert_eq!(manifests.len(), 1);
        assert_eq!(manifests[0].path, "package.json");
    }

    #[tokio::test]
    async fn test_empty_tree_yields_nothing() {
        let source = Arc::new(MockFileSource::new());
        let fs = DetectorFilesystem::new(source);
        let manifests = discover_manifests(&fs, DEFAULT_MAX_DEPTH).await.unwrap();
        assert!(manifests.is_empty());
    }

    #[tokio::test]
    async fn test_group_by_directory_preserves_order() {
        let fs = view(&[
            ("package.json", "{}"),
            ("requirements.txt", ""),
            ("backend/go.mod", "module x"),
        ]);

        let manifests = discover_manifests(&fs, DEFAULT_MAX_DEPTH).await.unwrap();
        let groups = group_by_directory(manifests);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].0, ".");
        assert_eq!(groups[0].1.len(), 2);
        assert_eq!(groups[1].0, "backend");
    }

    #[test]
    fn test_manifests_for_runtime() {
        assert_eq!(manifests_for_runtime("go"), vec!["go.mod"]);
        assert_eq!(
            manifests_for_runtime("python"),
            vec!["pyproject.toml", "requirements.txt", "Pipfile"]
        );
    }
}
