//! Command-line argument definitions.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "switchyard",
    version,
    about = "Zero-config service detection and routing for deployment builds"
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Commands,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Verbose output (debug level)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only log errors
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Report detected frameworks, package manager and monorepo manager
    Detect(ScanArgs),
    /// Resolve the project's services
    Services(ScanArgs),
    /// Resolve services and synthesize the routing table
    Routes(ScanArgs),
}

#[derive(Args, Debug)]
pub struct ScanArgs {
    /// Project directory (defaults to the current directory)
    pub path: Option<PathBuf>,

    /// Maximum directory depth scanned for manifests
    #[arg(long)]
    pub max_depth: Option<usize>,

    /// Name of the project configuration file
    #[arg(long, default_value = switchyard_core::config::CONFIG_FILE)]
    pub config: String,
}
