//! Path helpers for the relative, `/`-separated paths used throughout detection.
//!
//! Every path handed to the filesystem view is relative to the scan root. All
//! joining and stripping here works on path segments, never on raw string
//! prefixes, so a workspace named `api` can never swallow the leading `api/`
//! of an entrypoint like `api/handler.go`.

/// Normalizes a relative path: drops empty and `.` segments, trims slashes.
///
/// The root of a view normalizes to the empty string.
pub fn normalize_path(path: &str) -> String {
    path.split('/')
        .filter(|seg| !seg.is_empty() && *seg != ".")
        .collect::<Vec<_>>()
        .join("/")
}

/// Joins two relative paths structurally.
pub fn join_paths(base: &str, path: &str) -> String {
    let base = normalize_path(base);
    let path = normalize_path(path);
    if base.is_empty() {
        path
    } else if path.is_empty() {
        base
    } else {
        format!("{}/{}", base, path)
    }
}

/// The containing directory of a path, `""` for top-level entries.
pub fn parent_dir(path: &str) -> String {
    let normalized = normalize_path(path);
    match normalized.rsplit_once('/') {
        Some((dir, _)) => dir.to_string(),
        None => String::new(),
    }
}

/// The final segment of a path, `""` for the root.
pub fn last_segment(path: &str) -> String {
    let normalized = normalize_path(path);
    normalized
        .rsplit('/')
        .next()
        .unwrap_or_default()
        .to_string()
}

/// Strips a directory prefix segment-wise, returning the remainder.
///
/// `strip_dir("api/api/handler.go", "api")` is `Some("api/handler.go")`;
/// `strip_dir("apiserver/main.go", "api")` is `None` because `api` is not a
/// path segment of it.
pub fn strip_dir(path: &str, base: &str) -> Option<String> {
    let base = normalize_path(base);
    if base.is_empty() {
        return Some(normalize_path(path));
    }
    let path = normalize_path(path);
    let base_segments: Vec<&str> = base.split('/').collect();
    let path_segments: Vec<&str> = path.split('/').collect();
    if path_segments.len() <= base_segments.len() {
        return None;
    }
    if path_segments[..base_segments.len()] != base_segments[..] {
        return None;
    }
    Some(path_segments[base_segments.len()..].join("/"))
}

/// Normalizes a route prefix: leading slash ensured, trailing slash dropped.
///
/// `""`, `"/"` and `"."` all normalize to the root prefix `/`.
pub fn normalize_route_prefix(prefix: &str) -> String {
    let inner = normalize_path(prefix);
    if inner.is_empty() {
        "/".to_string()
    } else {
        format!("/{}", inner)
    }
}
