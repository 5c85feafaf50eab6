//! sed-upload - uploads SED summary files to the analysis API
//!
//! Uploads every summary found under the base directory, or a single one
//! selected with `--device-id` and `--date`.

mod config;
mod logging;
mod output;

use anyhow::{Context, Result};
use clap::Parser;
use sed_uploader::{RunMode, Runner};
use std::path::PathBuf;

use crate::config::{ArgOverrides, Config};
use crate::output::{OutputContext, OutputFormat};

#[derive(Parser, Debug)]
#[command(name = "sed-upload")]
#[command(author, version, about = "Upload SED summary files")]
struct Cli {
    /// Device ID of a single summary to upload (requires --date)
    #[arg(long)]
    device_id: Option<String>,

    /// Date of a single summary to upload, YYYY-MM-DD (requires --device-id)
    #[arg(long)]
    date: Option<String>,

    /// Upload endpoint URL
    #[arg(long, env = "SED_UPLOAD_URL")]
    upload_url: Option<String>,

    /// Root directory of the {device_id}/{date}/sed-summary tree
    #[arg(long, env = "SED_BASE_DIR")]
    base_dir: Option<PathBuf>,

    /// Skip TLS certificate and hostname verification
    #[arg(long)]
    insecure: bool,

    /// Per-request timeout in seconds
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Configuration file path
    #[arg(short, long, env = "SED_UPLOAD_CONFIG")]
    config: Option<PathBuf>,

    /// Report format
    #[arg(short, long, value_enum, default_value = "text")]
    output: OutputFormat,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let ctx = OutputContext::new(cli.output, cli.no_color, cli.verbose);

    // Reject bad targets before touching the filesystem or network
    let mode = match RunMode::from_args(cli.device_id.clone(), cli.date.clone()) {
        Ok(mode) => mode,
        Err(e) => {
            ctx.error(&format!("Error: {}", e));
            return Ok(());
        }
    };

    logging::init(cli.verbose)?;

    let config = if let Some(config_path) = &cli.config {
        Config::load_from(config_path)?
    } else {
        Config::load().unwrap_or_default()
    };

    let merged = config.merge_with_args(&ArgOverrides {
        upload_url: cli.upload_url.as_deref(),
        base_dir: cli.base_dir.as_deref(),
        insecure: cli.insecure,
        timeout_secs: cli.timeout,
    });

    let runner = Runner::from_config(&merged).context("Failed to create upload client")?;
    let result = runner.run(&mode).await;

    ctx.report(&result);

    Ok(())
}
