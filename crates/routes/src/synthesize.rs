//! Route synthesis: from a resolved service list to an ordered,
//! conflict-free routing table.

use crate::guard::prefix_pattern;
use crate::route::{Route, RoutePhase, RouteTable};
use std::cmp::Ordering;
use switchyard_detect::catalog::{route_owning_builders, static_builders};
use switchyard_pipeline::Service;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RouteClass {
    /// Static output: gets an SPA-style fallback to its index.html.
    Static,
    /// The builder ships its own complete route table; synthesizing more
    /// would double-route its traffic.
    RouteOwning,
    /// A function reached through an internal rewrite.
    Runtime,
}

fn classify(service: &Service) -> RouteClass {
    let builder = service.builder.use_.as_str();
    if route_owning_builders().contains(&builder) {
        RouteClass::RouteOwning
    } else if static_builders().contains(&builder) {
        RouteClass::Static
    } else {
        RouteClass::Runtime
    }
}

/// Builds the routing table for a resolved service set.
///
/// Web rewrites are ordered most-specific-prefix first, with the root
/// prefix always last as the catch-all; ties keep input order. Worker and
/// cron services get internal rewrites outside the prefix competition.
/// Output is deterministic for deterministic input.
pub fn synthesize(services: &[Service]) -> RouteTable {
    let mut table = RouteTable::default();

    let web: Vec<&Service> = services.iter().filter(|s| s.is_web()).collect();
    let prefixes: Vec<String> = web
        .iter()
        .filter_map(|s| s.route_prefix.clone())
        .collect();

    let mut ordered = web.clone();
    ordered.sort_by(|a, b| {
        let pa = a.route_prefix.as_deref().unwrap_or("/");
        let pb = b.route_prefix.as_deref().unwrap_or("/");
        match (pa == "/", pb == "/") {
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            _ => pb.len().cmp(&pa.len()),
        }
    });

    for service in ordered {
        let prefix = service.route_prefix.as_deref().unwrap_or("/");
        let class = classify(service);
        debug!(service = %service.name, prefix, ?class, "Synthesizing routes");

        match class {
            RouteClass::RouteOwning => continue,
            RouteClass::Static => {
                if prefix == "/" {
                    // Serve the static output directly, then fall back to
                    // the SPA shell for anything it does not cover.
                    table.defaults.push(Route::handle(RoutePhase::Filesystem));
                    table
                        .defaults
                        .push(Route::rewrite(prefix_pattern("/", &prefixes), "/index.html"));
                } else {
                    table.rewrites.push(Route::rewrite(
                        prefix_pattern(prefix, &prefixes),
                        format!("{}/index.html", prefix),
                    ));
                }
            }
            RouteClass::Runtime => {
                if prefix == "/" {
                    // The final catch-all default.
                    table.defaults.push(Route::checked_rewrite(
                        prefix_pattern("/", &prefixes),
                        service.function_path(),
                    ));
                } else {
                    table.rewrites.push(Route::checked_rewrite(
                        prefix_pattern(prefix, &prefixes),
                        service.function_path(),
                    ));
                }
            }
        }
    }

    for service in services.iter().filter(|s| !s.is_web()) {
        let path = service.function_path();
        table.rewrites.push(Route::checked_rewrite(
            format!("^{}(?:/.*)?$", regex::escape(&path)),
            path,
        ));
    }

    table
}
