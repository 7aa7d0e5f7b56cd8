//! DroidSdk - local Android SDK inspector
//! 
//! Loads the configuration, finds the SDK and reports what is installed.

use std::path::PathBuf;
use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use droidsdk::core::{AppConfig, LoggingConfig, APP_NAME, VERSION};
use droidsdk::report::InventoryReport;
use droidsdk::repository::{LocalSdk, ToolchainDetector};

/// Command line options
#[derive(Debug, Parser)]
#[command(name = "droidsdk")]
#[command(version, about = "Inspect a local Android SDK installation")]
struct Cli {
    /// Print the inventory report as JSON on stdout
    #[arg(long)]
    json: bool,

    /// SDK root, overriding the configured and detected locations
    sdk_root: Option<PathBuf>,
}

/// Main entry point
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match AppConfig::load().await {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}; using defaults", e.user_message());
            AppConfig::default()
        }
    };

    init_logging(&config.logging)?;
    info!("{} v{} starting...", APP_NAME, VERSION);

    let sdk_root = resolve_sdk_root(&cli, &config)?;
    let sdk = LocalSdk::new(&sdk_root)
        .with_context(|| format!("cannot open SDK at {}", sdk_root.display()))?;

    let report = InventoryReport::collect(&sdk, &config.report);
    report.log();

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }

    Ok(())
}

/// Initialize the tracing subscriber. `RUST_LOG` wins over the configured level.
fn init_logging(logging: &LoggingConfig) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&logging.level)
            .with_context(|| format!("invalid log level {:?}", logging.level))?,
    };

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_file(logging.with_file)
        .with_line_number(logging.with_line_number)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;
    Ok(())
}

/// SDK root from the command line, then the configuration, then detection
fn resolve_sdk_root(cli: &Cli, config: &AppConfig) -> Result<PathBuf> {
    if let Some(root) = &cli.sdk_root {
        return Ok(root.clone());
    }
    if let Some(root) = config.get_sdk_path() {
        info!("Using configured SDK at {:?}", root);
        return Ok(root);
    }
    warn!("No SDK configured, detecting...");
    let detected = ToolchainDetector::detect_sdk().context("Android SDK not found")?;
    Ok(detected.path)
}
