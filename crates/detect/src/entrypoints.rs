//! Conventional entrypoint discovery.
//!
//! For a runtime, the candidate list is the cross product of conventional
//! base names and that runtime's file extensions, tried in order. The first
//! existing candidate wins. Discovery across several runtimes deliberately
//! keeps every hit: two entrypoints in one directory is an ambiguity the
//! resolution pipeline must see, not a tie to break silently.

use serde::Serialize;
use switchyard_core::fs::{DetectorFilesystem, FsError};
use switchyard_core::paths::join_paths;

const ENTRYPOINT_BASES: &[&str] = &["index", "app", "server", "main"];
const NESTED_DIR: &str = "src";

pub fn extensions_for_runtime(runtime: &str) -> &'static [&'static str] {
    match runtime {
        "node" => &["js", "mjs", "cjs", "ts"],
        "python" => &["py"],
        "go" => &["go"],
        "rust" => &["rs"],
        "ruby" => &["rb"],
        _ => &[],
    }
}

/// Runtime implied by an entrypoint's file extension.
pub fn runtime_for_extension(ext: &str) -> Option<&'static str> {
    match ext {
        "js" | "mjs" | "cjs" | "ts" => Some("node"),
        "py" => Some("python"),
        "go" => Some("go"),
        "rs" => Some("rust"),
        "rb" => Some("ruby"),
        _ => None,
    }
}

/// Runtime implied by an entrypoint path, from its extension.
pub fn runtime_for_entrypoint(entrypoint: &str) -> Option<&'static str> {
    let ext = entrypoint.rsplit_once('.').map(|(_, ext)| ext)?;
    runtime_for_extension(ext)
}

fn candidates_for(runtime: &str) -> Vec<String> {
    let extensions = extensions_for_runtime(runtime);
    let mut candidates = Vec::with_capacity(ENTRYPOINT_BASES.len() * extensions.len() * 2);
    for base in ENTRYPOINT_BASES {
        for ext in extensions {
            candidates.push(format!("{}.{}", base, ext));
        }
    }
    for base in ENTRYPOINT_BASES {
        for ext in extensions {
            candidates.push(format!("{}/{}.{}", NESTED_DIR, base, ext));
        }
    }
    candidates
}

/// An entrypoint found for a specific runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntrypointHit {
    pub runtime: String,
    pub entrypoint: String,
}

/// First conventional entrypoint for `runtime` inside `directory`, relative
/// to that directory. One listing with the candidate names primes the cache,
/// so the per-candidate probes cost no extra I/O.
pub async fn discover_entrypoint(
    fs: &DetectorFilesystem,
    runtime: &str,
    directory: &str,
) -> Result<Option<String>, FsError> {
    let candidates = candidates_for(runtime);
    let top_level: Vec<&str> = candidates
        .iter()
        .map(String::as_str)
        .filter(|name| !name.contains('/'))
        .collect();
    let _ = fs.read_dir(directory, Some(&top_level)).await;

    for candidate in &candidates {
        let path = join_paths(directory, candidate);
        if fs.is_file(&path).await? {
            return Ok(Some(candidate.clone()));
        }
    }
    Ok(None)
}

/// Entrypoints for every distinct runtime present in `directory`.
pub async fn discover_all_entrypoints(
    fs: &DetectorFilesystem,
    directory: &str,
    runtimes: &[String],
) -> Result<Vec<EntrypointHit>, FsError> {
    let mut distinct: Vec<&str> = Vec::new();
    for runtime in runtimes {
        if !distinct.contains(&runtime.as_str()) {
            distinct.push(runtime);
        }
    }

    let mut hits = Vec::new();
    for runtime in distinct {
        if let Some(entrypoint) = discover_entrypoint(fs, runtime, directory).await? {
            hits.push(EntrypointHit {
                runtime: runtime.to_string(),
                entrypoint,
            });
        }
    }
    Ok(hits)
}
