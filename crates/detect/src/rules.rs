//! Declarative match-rule engine.
//!
//! A detector is a named bundle of rules evaluated against a
//! [`DetectorFilesystem`]: all `every` rules must hold, and at least one
//! `some` rule must hold. Rules either probe for a file's existence or
//! search its text with a regular expression. Detectors know nothing about
//! each other; supersession is applied once over the finished match set.

use futures_util::future::join_all;
use regex::Regex;
use serde::{Deserialize, Serialize};
use switchyard_core::fs::{DetectorFilesystem, FsError};

/// The manifest a dependency rule implicitly targets.
pub const DEPENDENCY_MANIFEST: &str = "package.json";

/// One match rule.
///
/// Either `match_dependency` is set (the rule then targets the dependency
/// manifest with a synthesized pattern), or `path` / `match_content` describe
/// a generic probe. Combining `match_dependency` with either of the others is
/// a configuration error, not a non-match.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRule {
    pub path: Option<String>,
    pub match_content: Option<String>,
    pub match_dependency: Option<String>,
}

impl MatchRule {
    /// Rule that matches when `path` exists.
    pub fn file(path: &str) -> Self {
        Self {
            path: Some(path.to_string()),
            ..Default::default()
        }
    }

    /// Rule that matches when `path` is a file whose text matches `pattern`.
    pub fn file_content(path: &str, pattern: &str) -> Self {
        Self {
            path: Some(path.to_string()),
            match_content: Some(pattern.to_string()),
            ..Default::default()
        }
    }

    /// Rule that matches when the dependency manifest declares `name`.
    pub fn dependency(name: &str) -> Self {
        Self {
            match_dependency: Some(name.to_string()),
            ..Default::default()
        }
    }
}

/// A named detector: `every` rules are all required, `some` rules need one
/// hit. `supersedes` removes another detector's match from a result set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectorSpec {
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub every: Vec<MatchRule>,
    #[serde(default)]
    pub some: Vec<MatchRule>,
    pub supersedes: Option<String>,
}

impl DetectorSpec {
    pub fn new(name: &str, slug: &str) -> Self {
        Self {
            name: name.to_string(),
            slug: slug.to_string(),
            ..Default::default()
        }
    }

    pub fn every(mut self, rule: MatchRule) -> Self {
        self.every.push(rule);
        self
    }

    pub fn some(mut self, rule: MatchRule) -> Self {
        self.some.push(rule);
        self
    }

    pub fn supersedes(mut self, slug: &str) -> Self {
        self.supersedes = Some(slug.to_string());
        self
    }
}

/// A successful detector evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DetectorMatch {
    pub slug: String,
    pub version: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum DetectError {
    #[error("detector `{slug}`: {reason}")]
    InvalidRule { slug: String, reason: &'static str },

    #[error("detector `{slug}` has an invalid pattern: {source}")]
    BadPattern {
        slug: String,
        #[source]
        source: regex::Error,
    },

    #[error(transparent)]
    Fs(#[from] FsError),
}

struct RuleOutcome {
    version: Option<String>,
}

/// Pattern that locates a dependency inside a `dependencies` or
/// `devDependencies` object and captures its version string in group 3.
pub fn dependency_pattern(name: &str) -> String {
    format!(
        r#""(dev)?(d|D)ependencies":\s*{{[^}}]*"{}":\s*"(.*?)""#,
        regex::escape(name)
    )
}

fn validate_spec(spec: &DetectorSpec) -> Result<(), DetectError> {
    let invalid = |reason| DetectError::InvalidRule {
        slug: spec.slug.clone(),
        reason,
    };
    for rule in spec.every.iter().chain(spec.some.iter()) {
        if rule.match_dependency.is_some() {
            if rule.match_content.is_some() {
                return Err(invalid(
                    "matchDependency cannot be combined with matchContent",
                ));
            }
            if rule.path.is_some() {
                return Err(invalid(
                    "matchDependency cannot be combined with an explicit path",
                ));
            }
        } else if rule.path.is_none() && rule.match_content.is_none() {
            return Err(invalid("rule must specify a path or a dependency name"));
        }
    }
    Ok(())
}

async fn eval_rule(
    fs: &DetectorFilesystem,
    slug: &str,
    rule: &MatchRule,
) -> Result<Option<RuleOutcome>, DetectError> {
    let (path, pattern) = if let Some(name) = &rule.match_dependency {
        (DEPENDENCY_MANIFEST.to_string(), Some(dependency_pattern(name)))
    } else {
        (
            rule.path
                .clone()
                .unwrap_or_else(|| DEPENDENCY_MANIFEST.to_string()),
            rule.match_content.clone(),
        )
    };

    let Some(pattern) = pattern else {
        // Pure existence probe.
        return Ok(fs
            .has_path(&path)
            .await?
            .then(|| RuleOutcome { version: None }));
    };

    // Content rules only ever match files; a directory at the target path or
    // no path at all is a plain non-match.
    if !fs.is_file(&path).await? {
        return Ok(None);
    }
    let content = fs.read_file(&path).await?;
    let re = Regex::new(&pattern).map_err(|source| DetectError::BadPattern {
        slug: slug.to_string(),
        source,
    })?;
    Ok(re.captures(&content).map(|caps| RuleOutcome {
        version: caps.get(3).map(|m| m.as_str().to_string()),
    }))
}

/// Evaluates a single detector against a filesystem view.
///
/// `every` rules run concurrently and must all hold. `some` rules run
/// strictly in list order with a short circuit on the first hit; catalog
/// authors order cheap or specific rules first and rely on that. The first
/// rule outcome carrying a captured version becomes the match's version.
pub async fn matches_spec(
    fs: &DetectorFilesystem,
    spec: &DetectorSpec,
) -> Result<Option<DetectorMatch>, DetectError> {
    validate_spec(spec)?;
    if spec.every.is_empty() && spec.some.is_empty() {
        return Ok(None);
    }

    let mut version = None;

    let outcomes = join_all(
        spec.every
            .iter()
            .map(|rule| eval_rule(fs, &spec.slug, rule)),
    )
    .await;
    for outcome in outcomes {
        match outcome? {
            None => return Ok(None),
            Some(hit) => {
                if version.is_none() {
                    version = hit.version;
                }
            }
        }
    }

    if !spec.some.is_empty() {
        let mut matched = false;
        for rule in &spec.some {
            if let Some(hit) = eval_rule(fs, &spec.slug, rule).await? {
                if version.is_none() {
                    version = hit.version;
                }
                matched = true;
                break;
            }
        }
        if !matched {
            return Ok(None);
        }
    }

    Ok(Some(DetectorMatch {
        slug: spec.slug.clone(),
        version,
    }))
}

/// Drops every match whose slug some other match's spec supersedes,
/// following supersession chains transitively: with A superseding B and B
/// superseding C, a set containing all three collapses to just A.
pub fn remove_superseded(matches: Vec<DetectorMatch>, specs: &[DetectorSpec]) -> Vec<DetectorMatch> {
    use std::collections::{HashMap, HashSet};

    let chain: HashMap<&str, &str> = specs
        .iter()
        .filter_map(|spec| {
            spec.supersedes
                .as_deref()
                .map(|superseded| (spec.slug.as_str(), superseded))
        })
        .collect();

    let mut removed: HashSet<&str> = HashSet::new();
    for m in &matches {
        let mut next = chain.get(m.slug.as_str()).copied();
        let mut visited: HashSet<&str> = HashSet::new();
        while let Some(slug) = next {
            if !visited.insert(slug) {
                break;
            }
            removed.insert(slug);
            next = chain.get(slug).copied();
        }
    }

    let removed: HashSet<String> = removed.into_iter().map(String::from).collect();
    matches
        .into_iter()
        .filter(|m| !removed.contains(&m.slug))
        .collect()
}

/// Every matching detector, in catalog order, after supersession.
pub async fn detect_all(
    fs: &DetectorFilesystem,
    specs: &[DetectorSpec],
) -> Result<Vec<DetectorMatch>, DetectError> {
    let outcomes = join_all(specs.iter().map(|spec| matches_spec(fs, spec))).await;
    let mut matches = Vec::new();
    for outcome in outcomes {
        if let Some(m) = outcome? {
            matches.push(m);
        }
    }
    Ok(remove_superseded(matches, specs))
}

/// Slug of the first matching detector in catalog order.
pub async fn detect_first(
    fs: &DetectorFilesystem,
    specs: &[DetectorSpec],
) -> Result<Option<String>, DetectError> {
    Ok(detect_all(fs, specs).await?.into_iter().next().map(|m| m.slug))
}

/// First matching detector together with its captured version.
pub async fn detect_first_with_version(
    fs: &DetectorFilesystem,
    specs: &[DetectorSpec],
) -> Result<Option<DetectorMatch>, DetectError> {
    Ok(detect_all(fs, specs).await?.into_iter().next())
}
