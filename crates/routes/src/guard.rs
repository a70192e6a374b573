//! Ownership guards: negative lookaheads that keep a broad route prefix
//! from intercepting traffic belonging to a more specific one.
//!
//! Pattern construction is kept as a small pure function so the anchoring
//! and escaping rules can be tested in isolation.

/// Normalized prefixes nested strictly under `own` (everything, for the
/// root prefix `/`).
fn nested_prefixes<'a>(own: &str, all: &'a [String]) -> Vec<&'a str> {
    all.iter()
        .map(String::as_str)
        .filter(|prefix| *prefix != "/" && *prefix != own)
        .filter(|prefix| own == "/" || prefix.starts_with(&format!("{}/", own)))
        .collect()
}

/// Negative lookahead excluding every other prefix that would otherwise be
/// swallowed by a pattern for `own`.
///
/// The `(?:/|$)` anchor after each alternative limits the exclusion to
/// exact-or-nested matches: a guard built for `/dashboard` does not exclude
/// `/dashboardX`.
pub fn ownership_guard(own: &str, all: &[String]) -> Option<String> {
    let nested = nested_prefixes(own, all);
    if nested.is_empty() {
        return None;
    }
    let alternatives: Vec<String> = nested.iter().map(|prefix| regex::escape(prefix)).collect();
    Some(format!("(?!(?:{})(?:/|$))", alternatives.join("|")))
}

/// Full match pattern for a web service's prefix, guarded.
pub fn prefix_pattern(own: &str, all: &[String]) -> String {
    let guard = ownership_guard(own, all).unwrap_or_default();
    if own == "/" {
        format!("^{}.*$", guard)
    } else {
        format!("^{}{}(?:/.*)?$", guard, regex::escape(own))
    }
}
