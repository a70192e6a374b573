use clap::Parser;
use serde_json::json;
use std::collections::BTreeMap;
use std::env;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use switchyard_cli::cli::{CliArgs, Commands, ScanArgs};
use switchyard_cli::{NAME, VERSION};
use switchyard_core::fs::{DetectorFilesystem, RealFileSource};
use switchyard_detect::catalog::{frameworks, monorepo_managers, package_managers};
use switchyard_detect::rules::{detect_all, detect_first_with_version, DetectorSpec};
use switchyard_pipeline::{resolve_services, ResolverOptions};
use tracing::{debug, error, info, Level};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() {
    let args = CliArgs::parse();
    init_logging_from_args(&args);

    debug!("{} v{} starting", NAME, VERSION);

    let exit_code = match &args.command {
        Commands::Detect(scan) => handle_detect(scan).await,
        Commands::Services(scan) => handle_services(scan).await,
        Commands::Routes(scan) => handle_routes(scan).await,
    };

    process::exit(exit_code);
}

fn init_logging_from_args(args: &CliArgs) {
    let level = if let Some(level_str) = &args.log_level {
        parse_level(level_str)
    } else if args.verbose {
        Level::DEBUG
    } else if args.quiet {
        Level::ERROR
    } else {
        let level_str = env::var("SWITCHYARD_LOG_LEVEL").unwrap_or_else(|_| "warn".to_string());
        parse_level(&level_str)
    };

    let mut filter = EnvFilter::from_default_env();
    if env::var("RUST_LOG").is_err() {
        filter = filter.add_directive(format!("switchyard={}", level).parse().unwrap());
    }

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .init();
}

fn parse_level(level_str: &str) -> Level {
    match level_str.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => {
            eprintln!(
                "Invalid log level '{}', defaulting to WARN. Valid levels: trace, debug, info, warn, error",
                level_str
            );
            Level::WARN
        }
    }
}

fn project_view(scan: &ScanArgs) -> Option<DetectorFilesystem> {
    let path = scan
        .path
        .clone()
        .unwrap_or_else(|| PathBuf::from("."));

    if !path.is_dir() {
        error!("Project path is not a directory: {}", path.display());
        return None;
    }

    Some(DetectorFilesystem::new(Arc::new(RealFileSource::new(path))))
}

fn resolver_options(scan: &ScanArgs) -> ResolverOptions {
    let mut options = ResolverOptions {
        config_file: scan.config.clone(),
        ..Default::default()
    };
    if let Some(max_depth) = scan.max_depth {
        options.max_depth = max_depth;
    }
    // Resolution reads the environment only through its options.
    options.env = env::vars().collect::<BTreeMap<String, String>>();
    options
}

async fn handle_detect(scan: &ScanArgs) -> i32 {
    let Some(fs) = project_view(scan) else {
        return 1;
    };

    let catalog = frameworks();
    let framework_specs: Vec<DetectorSpec> =
        catalog.iter().map(|fw| fw.detector.clone()).collect();

    let detected = match detect_all(&fs, &framework_specs).await {
        Ok(matches) => matches,
        Err(err) => {
            error!("Framework detection failed: {:#}", err);
            return 1;
        }
    };
    let package_manager = match detect_first_with_version(&fs, &package_managers()).await {
        Ok(hit) => hit,
        Err(err) => {
            error!("Package manager detection failed: {:#}", err);
            return 1;
        }
    };
    let monorepo_manager = match detect_first_with_version(&fs, &monorepo_managers()).await {
        Ok(hit) => hit,
        Err(err) => {
            error!("Monorepo manager detection failed: {:#}", err);
            return 1;
        }
    };

    info!(
        frameworks = detected.len(),
        "Detection complete"
    );
    let output = json!({
        "frameworks": detected,
        "packageManager": package_manager,
        "monorepoManager": monorepo_manager,
    });
    println!("{}", serde_json::to_string_pretty(&output).unwrap_or_default());
    0
}

async fn handle_services(scan: &ScanArgs) -> i32 {
    let Some(fs) = project_view(scan) else {
        return 1;
    };

    let catalog = frameworks();
    let result = match resolve_services(&fs, &catalog, &resolver_options(scan)).await {
        Ok(result) => result,
        Err(err) => {
            error!("Resolution failed: {:#}", err);
            return 1;
        }
    };

    let ok = result.is_ok();
    info!(
        services = result.services.len(),
        errors = result.errors.len(),
        "Resolution complete"
    );
    println!(
        "{}",
        serde_json::to_string_pretty(&result).unwrap_or_default()
    );
    if ok {
        0
    } else {
        1
    }
}

async fn handle_routes(scan: &ScanArgs) -> i32 {
    let Some(fs) = project_view(scan) else {
        return 1;
    };

    let catalog = frameworks();
    let result = match resolve_services(&fs, &catalog, &resolver_options(scan)).await {
        Ok(result) => result,
        Err(err) => {
            error!("Resolution failed: {:#}", err);
            return 1;
        }
    };

    let routes = switchyard_routes::synthesize(&result.services);
    let ok = result.is_ok();
    let output = json!({
        "services": result.services,
        "routes": routes,
        "errors": result.errors,
        "warnings": result.warnings,
    });
    println!("{}", serde_json::to_string_pretty(&output).unwrap_or_default());
    if ok {
        0
    } else {
        1
    }
}
