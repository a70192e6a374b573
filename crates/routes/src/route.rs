//! Routing table entries handed to the request dispatcher.

use serde::Serialize;

/// Phases of request handling a marker route can open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RoutePhase {
    /// Serve from the static filesystem output before falling through.
    Filesystem,
    Miss,
    Rewrite,
}

/// A pattern-matching route. Order is semantically meaningful: the
/// dispatcher takes the first match within a phase.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct RouteMatch {
    pub src: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dest: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    /// Apply this route only if the destination actually exists.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub check: bool,
    #[serde(rename = "continue", skip_serializing_if = "std::ops::Not::not")]
    pub continue_: bool,
}

/// One entry of the routing table: a phase marker or a match rule.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Route {
    Handle { handle: RoutePhase },
    Match(RouteMatch),
}

impl Route {
    pub fn handle(phase: RoutePhase) -> Self {
        Route::Handle { handle: phase }
    }

    pub fn rewrite(src: impl Into<String>, dest: impl Into<String>) -> Self {
        Route::Match(RouteMatch {
            src: src.into(),
            dest: Some(dest.into()),
            ..Default::default()
        })
    }

    pub fn checked_rewrite(src: impl Into<String>, dest: impl Into<String>) -> Self {
        Route::Match(RouteMatch {
            src: src.into(),
            dest: Some(dest.into()),
            check: true,
            ..Default::default()
        })
    }

    pub fn src(&self) -> Option<&str> {
        match self {
            Route::Match(m) => Some(&m.src),
            Route::Handle { .. } => None,
        }
    }

    pub fn dest(&self) -> Option<&str> {
        match self {
            Route::Match(m) => m.dest.as_deref(),
            Route::Handle { .. } => None,
        }
    }
}

/// The synthesized routing table: rewrites first, then defaults.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct RouteTable {
    pub rewrites: Vec<Route>,
    pub defaults: Vec<Route>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handle_serializes_as_marker() {
        let json = serde_json::to_value(Route::handle(RoutePhase::Filesystem)).unwrap();
        assert_eq!(json, serde_json::json!({"handle": "filesystem"}));
    }

    #[test]
    fn test_match_omits_unset_fields() {
        let json = serde_json::to_value(Route::checked_rewrite("^/api$", "/_services/api")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"src": "^/api$", "dest": "/_services/api", "check": true})
        );
    }
}
