//! Default detector catalog.
//!
//! The catalog is plain data handed to the generic rule engine: no trait
//! objects, no per-framework dispatch. Swapping in a different catalog does
//! not touch the engine, and the engine's tests run against synthetic specs.

use crate::rules::{detect_all, DetectError, DetectorSpec, MatchRule};
use serde::Serialize;
use switchyard_core::fs::DetectorFilesystem;

/// What a framework's build emits, which decides route synthesis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputKind {
    /// Static assets; gets an SPA-style fallback route.
    Static,
    /// The builder emits its own complete route table; no synthetic routes.
    RouteOwning,
    /// A serverless function reached through an internal rewrite.
    Function,
}

/// A framework catalog entry: detection rules plus build defaults.
#[derive(Debug, Clone)]
pub struct FrameworkSpec {
    pub detector: DetectorSpec,
    pub default_builder: &'static str,
    pub runtime: Option<&'static str>,
    /// Conventional entrypoint a zero-config build needs to exist. `None`
    /// means the builder works from the manifest alone.
    pub default_entrypoint: Option<&'static str>,
    pub output: OutputKind,
}

impl FrameworkSpec {
    pub fn slug(&self) -> &str {
        &self.detector.slug
    }
}

/// Internal builder identifiers.
pub mod builders {
    pub const NODE: &str = "builders/node";
    pub const PYTHON: &str = "builders/python";
    pub const GO: &str = "builders/go";
    pub const RUBY: &str = "builders/ruby";
    pub const RUST: &str = "builders/rust";
    pub const STATIC: &str = "builders/static-build";
    pub const NEXT: &str = "builders/next";
    pub const SVELTEKIT: &str = "builders/sveltekit";
}

/// Builders that emit their own complete route table.
pub fn route_owning_builders() -> &'static [&'static str] {
    &[builders::NEXT, builders::SVELTEKIT]
}

/// Builders that produce a static site.
pub fn static_builders() -> &'static [&'static str] {
    &[builders::STATIC]
}

pub fn builder_for_runtime(runtime: &str) -> Option<&'static str> {
    match runtime {
        "node" => Some(builders::NODE),
        "python" => Some(builders::PYTHON),
        "go" => Some(builders::GO),
        "ruby" => Some(builders::RUBY),
        "rust" => Some(builders::RUST),
        _ => None,
    }
}

/// The default framework catalog, in detection priority order.
pub fn frameworks() -> Vec<FrameworkSpec> {
    vec![
        FrameworkSpec {
            detector: DetectorSpec::new("Next.js", "nextjs").some(MatchRule::dependency("next")),
            default_builder: builders::NEXT,
            runtime: Some("node"),
            default_entrypoint: None,
            output: OutputKind::RouteOwning,
        },
        FrameworkSpec {
            detector: DetectorSpec::new("SvelteKit", "sveltekit")
                .some(MatchRule::dependency("@sveltejs/kit"))
                .supersedes("vite"),
            default_builder: builders::SVELTEKIT,
            runtime: Some("node"),
            default_entrypoint: None,
            output: OutputKind::RouteOwning,
        },
        FrameworkSpec {
            detector: DetectorSpec::new("Gatsby", "gatsby").some(MatchRule::dependency("gatsby")),
            default_builder: builders::STATIC,
            runtime: Some("node"),
            default_entrypoint: None,
            output: OutputKind::Static,
        },
        FrameworkSpec {
            detector: DetectorSpec::new("Create React App", "create-react-app")
                .some(MatchRule::dependency("react-scripts"))
                .some(MatchRule::dependency("react-dev-utils")),
            default_builder: builders::STATIC,
            runtime: Some("node"),
            default_entrypoint: None,
            output: OutputKind::Static,
        },
        FrameworkSpec {
            detector: DetectorSpec::new("Astro", "astro").some(MatchRule::dependency("astro")),
            default_builder: builders::STATIC,
            runtime: Some("node"),
            default_entrypoint: None,
            output: OutputKind::Static,
        },
        FrameworkSpec {
            detector: DetectorSpec::new("Vite", "vite").some(MatchRule::dependency("vite")),
            default_builder: builders::STATIC,
            runtime: Some("node"),
            default_entrypoint: None,
            output: OutputKind::Static,
        },
        FrameworkSpec {
            detector: DetectorSpec::new("Express", "express").some(MatchRule::dependency("express")),
            default_builder: builders::NODE,
            runtime: Some("node"),
            default_entrypoint: Some("index.js"),
            output: OutputKind::Function,
        },
        FrameworkSpec {
            detector: DetectorSpec::new("Fastify", "fastify").some(MatchRule::dependency("fastify")),
            default_builder: builders::NODE,
            runtime: Some("node"),
            default_entrypoint: Some("index.js"),
            output: OutputKind::Function,
        },
        FrameworkSpec {
            detector: DetectorSpec::new("FastAPI", "fastapi")
                .some(MatchRule::file_content("requirements.txt", r"(?m)^\s*fastapi"))
                .some(MatchRule::file_content("pyproject.toml", r#"fastapi"#)),
            default_builder: builders::PYTHON,
            runtime: Some("python"),
            default_entrypoint: Some("main.py"),
            output: OutputKind::Function,
        },
        FrameworkSpec {
            detector: DetectorSpec::new("Flask", "flask")
                .some(MatchRule::file_content("requirements.txt", r"(?m)^\s*(F|f)lask"))
                .some(MatchRule::file_content("pyproject.toml", r#"(F|f)lask"#)),
            default_builder: builders::PYTHON,
            runtime: Some("python"),
            default_entrypoint: Some("app.py"),
            output: OutputKind::Function,
        },
        FrameworkSpec {
            detector: DetectorSpec::new("Django", "django").every(MatchRule::file("manage.py")),
            default_builder: builders::PYTHON,
            runtime: Some("python"),
            default_entrypoint: Some("manage.py"),
            output: OutputKind::Function,
        },
        FrameworkSpec {
            detector: DetectorSpec::new("Hugo", "hugo")
                .some(MatchRule::file_content("config.toml", "baseURL"))
                .some(MatchRule::file_content("config.yaml", "baseURL"))
                .some(MatchRule::file_content("config.json", "baseURL")),
            default_builder: builders::STATIC,
            runtime: None,
            default_entrypoint: None,
            output: OutputKind::Static,
        },
        FrameworkSpec {
            detector: DetectorSpec::new("Jekyll", "jekyll").every(MatchRule::file("_config.yml")),
            default_builder: builders::STATIC,
            runtime: None,
            default_entrypoint: None,
            output: OutputKind::Static,
        },
    ]
}

/// Package-manager detectors. The lockfile-specific managers supersede the
/// generic npm match so one manager survives per project.
pub fn package_managers() -> Vec<DetectorSpec> {
    vec![
        DetectorSpec::new("Bun", "bun")
            .some(MatchRule::file("bun.lockb"))
            .some(MatchRule::file("bun.lock"))
            .supersedes("npm"),
        DetectorSpec::new("pnpm", "pnpm")
            .every(MatchRule::file("pnpm-lock.yaml"))
            .supersedes("npm"),
        DetectorSpec::new("Yarn", "yarn")
            .every(MatchRule::file("yarn.lock"))
            .supersedes("npm"),
        DetectorSpec::new("npm", "npm").every(MatchRule::file("package.json")),
    ]
}

/// Monorepo-manager detectors.
pub fn monorepo_managers() -> Vec<DetectorSpec> {
    vec![
        DetectorSpec::new("Turborepo", "turborepo")
            .some(MatchRule::file("turbo.json"))
            .some(MatchRule::dependency("turbo")),
        DetectorSpec::new("Nx", "nx")
            .some(MatchRule::file("nx.json"))
            .some(MatchRule::file_content(
                "workspace.json",
                r#""projects":\s*\{\s*""#,
            )),
        DetectorSpec::new("Lerna", "lerna").every(MatchRule::file("lerna.json")),
    ]
}

pub fn find_framework<'a>(catalog: &'a [FrameworkSpec], slug: &str) -> Option<&'a FrameworkSpec> {
    catalog.iter().find(|fw| fw.slug() == slug)
}

/// Every framework matching the view, catalog order, supersession applied.
pub async fn matching_frameworks<'a>(
    fs: &DetectorFilesystem,
    catalog: &'a [FrameworkSpec],
) -> Result<Vec<&'a FrameworkSpec>, DetectError> {
    let specs: Vec<DetectorSpec> = catalog.iter().map(|fw| fw.detector.clone()).collect();
    let matches = detect_all(fs, &specs).await?;
    Ok(matches
        .iter()
        .filter_map(|m| find_framework(catalog, &m.slug))
        .collect())
}
