//! End-to-end resolution tests over an in-memory project tree.

use std::sync::Arc;
use switchyard_core::config::ServiceType;
use switchyard_core::error::ErrorCode;
use switchyard_core::fs::{DetectorFilesystem, MockFileSource};
use switchyard_detect::catalog::{frameworks, FrameworkSpec};
use switchyard_pipeline::{resolve_services, ResolutionResult, ResolverOptions};

fn view(files: &[(&str, &str)]) -> DetectorFilesystem {
    DetectorFilesystem::new(Arc::new(MockFileSource::from_files(files)))
}

async fn resolve(files: &[(&str, &str)]) -> ResolutionResult {
    let fs = view(files);
    let catalog: Vec<FrameworkSpec> = frameworks();
    resolve_services(&fs, &catalog, &ResolverOptions::default())
        .await
        .unwrap()
}

#[tokio::test]
async fn no_manifests_is_an_error() {
    let result = resolve(&[("README.md", "# hi")]).await;
    assert!(result.services.is_empty());
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].code, ErrorCode::NoManifestsFound);
}

#[tokio::test]
async fn auto_detects_node_service_at_root() {
    let result = resolve(&[
        ("package.json", r#"{"name": "my-app"}"#),
        ("index.ts", "export default app;"),
    ])
    .await;

    assert!(result.errors.is_empty(), "{:?}", result.errors);
    assert_eq!(result.services.len(), 1);
    let service = &result.services[0];
    assert_eq!(service.name, "root");
    assert_eq!(service.service_type, ServiceType::Web);
    assert_eq!(service.workspace, ".");
    assert_eq!(service.entrypoint.as_deref(), Some("index.ts"));
    assert_eq!(service.runtime.as_deref(), Some("node"));
    assert_eq!(service.route_prefix.as_deref(), Some("/"));
    assert_eq!(service.builder.src, "index.ts");
    assert_eq!(service.builder.use_, "builders/node");
    assert!(service.builder.config.zero_config);
}

#[tokio::test]
async fn auto_detects_python_service_from_pyproject() {
    let result = resolve(&[
        ("pyproject.toml", "[project]\nname = \"my-app\""),
        ("main.py", "app = App()"),
    ])
    .await;

    assert!(result.errors.is_empty());
    let service = &result.services[0];
    assert_eq!(service.name, "root");
    assert_eq!(service.entrypoint.as_deref(), Some("main.py"));
    assert_eq!(service.runtime.as_deref(), Some("python"));
}

#[tokio::test]
async fn two_runtimes_in_one_directory_conflict() {
    let result = resolve(&[
        ("package.json", r#"{"name": "my-app"}"#),
        ("pyproject.toml", "[project]\nname = \"my-app\""),
        ("index.ts", ""),
        ("main.py", ""),
    ])
    .await;

    assert!(result.services.is_empty());
    assert_eq!(result.errors.len(), 1);
    let error = &result.errors[0];
    assert_eq!(error.code, ErrorCode::ConflictingServices);
    assert!(error.message.contains("index.ts"), "{}", error.message);
    assert!(error.message.contains("main.py"), "{}", error.message);
}

#[tokio::test]
async fn auto_detects_services_in_multiple_directories() {
    let result = resolve(&[
        ("package.json", r#"{"name": "root"}"#),
        ("index.ts", ""),
        ("backend/pyproject.toml", "[project]"),
        ("backend/app.py", ""),
    ])
    .await;

    assert!(result.errors.is_empty());
    assert_eq!(result.services.len(), 2);

    let root = result.services.iter().find(|s| s.name == "root").unwrap();
    assert_eq!(root.workspace, ".");
    assert_eq!(root.route_prefix.as_deref(), Some("/"));

    let backend = result.services.iter().find(|s| s.name == "backend").unwrap();
    assert_eq!(backend.workspace, "backend");
    assert_eq!(backend.entrypoint.as_deref(), Some("app.py"));
    assert_eq!(backend.runtime.as_deref(), Some("python"));
    assert_eq!(backend.route_prefix.as_deref(), Some("/backend"));
    assert_eq!(backend.builder.src, "backend/app.py");
}

#[tokio::test]
async fn directory_without_entrypoint_warns_and_escalates_when_alone() {
    let result = resolve(&[("package.json", r#"{"name": "my-app"}"#)]).await;

    assert!(result.services.is_empty());
    assert_eq!(result.warnings.len(), 1);
    assert_eq!(result.warnings[0].code, ErrorCode::NoEntrypoint);
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].code, ErrorCode::NoServicesDetected);
}

#[tokio::test]
async fn every_failing_directory_gets_its_own_warning() {
    let result = resolve(&[
        ("package.json", r#"{"name": "root"}"#),
        ("backend/pyproject.toml", "[project]"),
    ])
    .await;

    assert!(result.services.is_empty());
    assert_eq!(result.warnings.len(), 2);
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].code, ErrorCode::NoServicesDetected);
}

#[tokio::test]
async fn sibling_directories_survive_one_conflict() {
    let result = resolve(&[
        ("frontend/package.json", r#"{"name": "frontend"}"#),
        ("frontend/index.ts", ""),
        ("backend/package.json", r#"{"name": "backend"}"#),
        ("backend/pyproject.toml", "[project]"),
        ("backend/index.ts", ""),
        ("backend/main.py", ""),
    ])
    .await;

    // The conflict is fatal for the batch, and the sibling was still
    // processed: exactly one error, for the conflicted directory.
    assert!(result.services.is_empty());
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].code, ErrorCode::ConflictingServices);
    assert!(result.errors[0].message.contains("backend"));
}

#[tokio::test]
async fn name_conflicts_between_directories_are_fatal() {
    let result = resolve(&[
        ("backend/package.json", r#"{"name": "a"}"#),
        ("backend/index.ts", ""),
        ("services/backend/package.json", r#"{"name": "b"}"#),
        ("services/backend/index.ts", ""),
    ])
    .await;

    assert!(result.services.is_empty());
    assert_eq!(result.errors.len(), 1);
    let error = &result.errors[0];
    assert_eq!(error.code, ErrorCode::ServiceNameConflict);
    assert!(error.message.contains("`backend`"));
    assert!(error.message.contains("`services/backend`"));
}

#[tokio::test]
async fn framework_at_root_builds_framework_service() {
    let result = resolve(&[
        ("package.json", r#"{"dependencies": {"next": "13.0.0"}}"#),
    ])
    .await;

    assert!(result.errors.is_empty(), "{:?}", result.errors);
    let service = &result.services[0];
    assert_eq!(service.framework.as_deref(), Some("nextjs"));
    assert_eq!(service.builder.use_, "builders/next");
    assert_eq!(service.builder.src, "package.json");
    assert_eq!(service.route_prefix.as_deref(), Some("/"));
}

#[tokio::test]
async fn framework_without_entrypoint_falls_back_to_runtime_with_tag() {
    // Express matched, but its conventional index.js is absent; the server.ts
    // runtime entrypoint wins and keeps the framework tag.
    let result = resolve(&[
        ("package.json", r#"{"dependencies": {"express": "4.18.0"}}"#),
        ("server.ts", ""),
    ])
    .await;

    assert!(result.errors.is_empty(), "{:?}", result.errors);
    let service = &result.services[0];
    assert_eq!(service.framework.as_deref(), Some("express"));
    assert_eq!(service.entrypoint.as_deref(), Some("server.ts"));
    assert_eq!(service.builder.use_, "builders/node");
}

#[tokio::test]
async fn vercel_json_without_services_falls_back_to_auto_detection() {
    let result = resolve(&[
        ("vercel.json", r#"{"buildCommand": "npm run build"}"#),
        ("package.json", r#"{"name": "my-app"}"#),
        ("server.ts", ""),
    ])
    .await;

    assert!(result.errors.is_empty());
    assert_eq!(result.services[0].name, "root");
    assert_eq!(result.services[0].entrypoint.as_deref(), Some("server.ts"));
}

#[tokio::test]
async fn invalid_vercel_json_is_fatal_not_a_fallback() {
    let result = resolve(&[
        ("vercel.json", "not valid json"),
        ("package.json", r#"{"name": "app"}"#),
        ("index.ts", ""),
    ])
    .await;

    assert!(result.services.is_empty());
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].code, ErrorCode::InvalidVercelJson);
}

#[tokio::test]
async fn services_cannot_be_combined_with_legacy_builds() {
    let result = resolve(&[(
        "vercel.json",
        r#"{
            "builds": [{"src": "index.js"}],
            "experimentalServices": {"app": {"entrypoint": "index.ts"}}
        }"#,
    )])
    .await;

    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].code, ErrorCode::ServicesAndBuilds);
}

#[tokio::test]
async fn configured_single_web_service() {
    let result = resolve(&[(
        "vercel.json",
        r#"{"experimentalServices": {"api": {"entrypoint": "src/index.ts"}}}"#,
    )])
    .await;

    assert!(result.errors.is_empty(), "{:?}", result.errors);
    assert_eq!(result.services.len(), 1);
    let service = &result.services[0];
    assert_eq!(service.name, "api");
    assert_eq!(service.service_type, ServiceType::Web);
    assert_eq!(service.workspace, ".");
    assert_eq!(service.entrypoint.as_deref(), Some("src/index.ts"));
    assert_eq!(service.builder.use_, "builders/node");
}

#[tokio::test]
async fn configured_multiple_services() {
    let result = resolve(&[(
        "vercel.json",
        r#"{
            "experimentalServices": {
                "frontend": {"workspace": "apps/web", "framework": "nextjs"},
                "api": {
                    "workspace": "apps/api",
                    "entrypoint": "src/server.ts",
                    "routePrefix": "/api"
                },
                "worker": {
                    "type": "worker",
                    "entrypoint": "worker.py",
                    "topic": "tasks",
                    "consumer": "processor"
                }
            }
        }"#,
    )])
    .await;

    assert!(result.errors.is_empty(), "{:?}", result.errors);
    assert_eq!(result.services.len(), 3);

    let frontend = result.services.iter().find(|s| s.name == "frontend").unwrap();
    assert_eq!(frontend.framework.as_deref(), Some("nextjs"));
    assert_eq!(frontend.workspace, "apps/web");
    assert_eq!(frontend.builder.src, "apps/web/package.json");

    let api = result.services.iter().find(|s| s.name == "api").unwrap();
    assert_eq!(api.route_prefix.as_deref(), Some("/api"));
    assert_eq!(api.builder.src, "apps/api/src/server.ts");

    let worker = result.services.iter().find(|s| s.name == "worker").unwrap();
    assert_eq!(worker.service_type, ServiceType::Worker);
    assert_eq!(worker.topic.as_deref(), Some("tasks"));
    assert_eq!(worker.consumer.as_deref(), Some("processor"));
    assert_eq!(worker.route_prefix, None);
}

#[tokio::test]
async fn worker_topic_and_consumer_default() {
    let result = resolve(&[(
        "vercel.json",
        r#"{"experimentalServices": {"worker": {"type": "worker", "entrypoint": "worker.py"}}}"#,
    )])
    .await;

    let worker = &result.services[0];
    assert_eq!(worker.topic.as_deref(), Some("default"));
    assert_eq!(worker.consumer.as_deref(), Some("default"));
}

#[tokio::test]
async fn web_services_do_not_get_topic_defaults() {
    let result = resolve(&[(
        "vercel.json",
        r#"{"experimentalServices": {"web": {"entrypoint": "index.ts"}}}"#,
    )])
    .await;

    assert_eq!(result.services[0].topic, None);
    assert_eq!(result.services[0].consumer, None);
}

#[tokio::test]
async fn second_web_service_without_prefix_is_rejected() {
    let result = resolve(&[(
        "vercel.json",
        r#"{
            "experimentalServices": {
                "frontend": {"entrypoint": "web/index.ts"},
                "api": {"entrypoint": "api/index.ts"}
            }
        }"#,
    )])
    .await;

    assert!(result.services.is_empty());
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].code, ErrorCode::MissingRoutePrefix);
}

#[tokio::test]
async fn one_web_service_may_omit_the_prefix() {
    let result = resolve(&[(
        "vercel.json",
        r#"{
            "experimentalServices": {
                "frontend": {"entrypoint": "web/index.ts"},
                "api": {"entrypoint": "api/index.ts", "routePrefix": "/api"}
            }
        }"#,
    )])
    .await;

    assert!(result.errors.is_empty(), "{:?}", result.errors);
    assert_eq!(result.services.len(), 2);
}

#[tokio::test]
async fn cron_requires_schedule() {
    let result = resolve(&[(
        "vercel.json",
        r#"{"experimentalServices": {"cleanup": {"type": "cron", "entrypoint": "cron/cleanup.ts"}}}"#,
    )])
    .await;

    assert!(result.services.is_empty());
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].code, ErrorCode::MissingCronSchedule);
    assert_eq!(result.errors[0].service.as_deref(), Some("cleanup"));
}

#[tokio::test]
async fn cron_with_schedule_resolves() {
    let result = resolve(&[(
        "vercel.json",
        r#"{
            "experimentalServices": {
                "cleanup": {
                    "type": "cron",
                    "entrypoint": "cron/cleanup.ts",
                    "schedule": "0 0 * * *"
                }
            }
        }"#,
    )])
    .await;

    assert!(result.errors.is_empty());
    let cron = &result.services[0];
    assert_eq!(cron.service_type, ServiceType::Cron);
    assert_eq!(cron.schedule.as_deref(), Some("0 0 * * *"));
    assert_eq!(cron.route_prefix, None);
}

#[tokio::test]
async fn duplicate_normalized_prefixes_are_rejected() {
    // `/api` and `/api/` normalize to the same prefix.
    let result = resolve(&[(
        "vercel.json",
        r#"{
            "experimentalServices": {
                "one": {"entrypoint": "one/index.ts", "routePrefix": "/api"},
                "two": {"entrypoint": "two/index.ts", "routePrefix": "/api/"}
            }
        }"#,
    )])
    .await;

    assert!(result.services.is_empty());
    assert_eq!(result.errors.len(), 1);
    let error = &result.errors[0];
    assert_eq!(error.code, ErrorCode::DuplicateRoutePrefix);
    assert!(error.message.contains("`one`"));
    assert!(error.message.contains("`two`"));
}

#[tokio::test]
async fn reserved_prefix_is_rejected() {
    let result = resolve(&[(
        "vercel.json",
        r#"{
            "experimentalServices": {
                "sneaky": {"entrypoint": "index.ts", "routePrefix": "/_services/sneaky"}
            }
        }"#,
    )])
    .await;

    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].code, ErrorCode::ReservedRoutePrefix);
}

#[tokio::test]
async fn invalid_names_are_rejected() {
    let result = resolve(&[(
        "vercel.json",
        r#"{"experimentalServices": {"2bad": {"entrypoint": "index.ts"}}}"#,
    )])
    .await;

    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].code, ErrorCode::InvalidServiceName);
}

#[tokio::test]
async fn independent_violations_are_reported_together() {
    let result = resolve(&[(
        "vercel.json",
        r#"{
            "experimentalServices": {
                "cleanup": {"type": "cron", "entrypoint": "cleanup.ts"},
                "jobs": {"type": "worker", "entrypoint": "jobs.py", "routePrefix": "/jobs"},
                "web": {"entrypoint": "index.ts"}
            }
        }"#,
    )])
    .await;

    assert!(result.services.is_empty());
    let codes: Vec<ErrorCode> = result.errors.iter().map(|e| e.code).collect();
    assert!(codes.contains(&ErrorCode::MissingCronSchedule));
    assert!(codes.contains(&ErrorCode::UnexpectedRoutePrefix));
    assert_eq!(result.errors.len(), 2);
}

#[tokio::test]
async fn unknown_framework_is_rejected() {
    let result = resolve(&[(
        "vercel.json",
        r#"{"experimentalServices": {"app": {"framework": "definitely-not-real"}}}"#,
    )])
    .await;

    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].code, ErrorCode::UnknownFramework);
}

#[tokio::test]
async fn workspace_and_entrypoint_join_structurally() {
    let result = resolve(&[
        (
            "vercel.json",
            r#"{
                "experimentalServices": {
                    "api": {"workspace": "api", "entrypoint": "api/handler.go"}
                }
            }"#,
        ),
        ("api/go.mod", "module api"),
        ("api/api/handler.go", ""),
    ])
    .await;

    assert!(result.errors.is_empty(), "{:?}", result.errors);
    assert_eq!(result.services[0].builder.src, "api/api/handler.go");
}

#[tokio::test]
async fn workspace_is_inferred_from_nearest_manifest() {
    let result = resolve(&[
        (
            "vercel.json",
            r#"{"experimentalServices": {"api": {"entrypoint": "api/handler.go"}}}"#,
        ),
        ("api/go.mod", "module api"),
        ("api/handler.go", ""),
    ])
    .await;

    assert!(result.errors.is_empty(), "{:?}", result.errors);
    let service = &result.services[0];
    assert_eq!(service.workspace, "api");
    assert_eq!(service.entrypoint.as_deref(), Some("handler.go"));
    assert_eq!(service.builder.src, "api/handler.go");
}

#[tokio::test]
async fn knobs_are_passed_through_to_builder_config() {
    let result = resolve(&[(
        "vercel.json",
        r#"{
            "experimentalServices": {
                "api": {
                    "entrypoint": "index.ts",
                    "memory": 1024,
                    "maxDuration": 60,
                    "includeFiles": ["assets/**"],
                    "buildCommand": "npm run build"
                }
            }
        }"#,
    )])
    .await;

    assert!(result.errors.is_empty(), "{:?}", result.errors);
    let config = &result.services[0].builder.config;
    assert_eq!(config.memory, Some(1024));
    assert_eq!(config.max_duration, Some(60));
    assert_eq!(config.include_files.as_deref(), Some(&["assets/**".to_string()][..]));
    assert_eq!(config.build_command.as_deref(), Some("npm run build"));
}

#[tokio::test]
async fn auto_detection_can_be_disabled_via_env() {
    let fs = view(&[("package.json", "{}"), ("index.ts", "")]);
    let catalog = frameworks();
    let mut options = ResolverOptions::default();
    options
        .env
        .insert("SWITCHYARD_NO_AUTO_DETECT".to_string(), "1".to_string());

    let result = resolve_services(&fs, &catalog, &options).await.unwrap();
    assert!(result.services.is_empty());
    assert_eq!(result.errors[0].code, ErrorCode::NoServicesConfigured);
}

#[tokio::test]
async fn resolution_is_idempotent() {
    let files: &[(&str, &str)] = &[
        ("package.json", r#"{"name": "root"}"#),
        ("index.ts", ""),
        ("backend/pyproject.toml", "[project]"),
        ("backend/app.py", ""),
        ("services/queue/package.json", r#"{"name": "queue"}"#),
        ("services/queue/index.ts", ""),
    ];
    let catalog = frameworks();
    let options = ResolverOptions::default();

    let fs = view(files);
    let first = resolve_services(&fs, &catalog, &options).await.unwrap();
    let second = resolve_services(&fs, &catalog, &options).await.unwrap();
    assert_eq!(first, second);

    // A fresh view over the same tree also yields byte-identical output.
    let other = view(files);
    let third = resolve_services(&other, &catalog, &options).await.unwrap();
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&third).unwrap()
    );
}
