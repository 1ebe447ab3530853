//! Toolshed - inspect installer catalogs and compute install plans
//!
//! Main entry point: parses flags, sets up logging, loads the configured
//! catalog and dispatches to the catalog commands.

use anyhow::Result;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod catalog_cli;

use catalog_cli::{CatalogOptions, CatalogSubcommand};

/// Log levels
#[derive(Debug, Clone, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_filter_directive(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

#[derive(Parser, Debug)]
#[clap(
    name = "toolshed",
    about = "Versioned installer catalog with dependency-ordered install plans",
    version
)]
struct Cli {
    #[clap(subcommand)]
    command: CatalogSubcommand,

    /// Set log level
    #[clap(long, default_value = "warn", global = true)]
    log_level: LogLevel,

    /// Override configuration file path
    #[clap(long, global = true)]
    config: Option<PathBuf>,

    /// Additional built-in manifest directory (repeatable)
    #[clap(long = "builtins", global = true)]
    builtin_dirs: Vec<PathBuf>,

    /// Additional store manifest directory (repeatable)
    #[clap(long = "store", global = true)]
    store_dirs: Vec<PathBuf>,
}

/// Initialize tracing from the --log-level flag
///
/// RUST_LOG directives are added on top of the flag.
fn initialize_tracing(log_level: &LogLevel) {
    let mut filter = EnvFilter::new(log_level.to_filter_directive());

    if let Ok(env) = std::env::var("RUST_LOG") {
        for directive in env.split(',').filter(|d| !d.trim().is_empty()) {
            if let Ok(parsed) = directive.trim().parse() {
                filter = filter.add_directive(parsed);
            }
        }
    }

    // Logs go to stderr so stdout stays machine-readable with --json
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    initialize_tracing(&cli.log_level);

    let options = CatalogOptions {
        config_path: cli.config,
        builtin_dirs: cli.builtin_dirs,
        store_dirs: cli.store_dirs,
    };

    cli.command.execute(&options)
}
