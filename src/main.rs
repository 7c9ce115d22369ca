//! CLI entry point for the sobaixa client.

use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::Parser;
use sobaixa_core::{
    ApiConfig, DispatchTracker, DownloadRequest, HttpDownloadLauncher, InfoClient, output,
};
use tracing::{debug, info};

mod cli;

use cli::Args;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Determine log level based on verbose/quiet flags
    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (warn)
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "warn",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt().with_env_filter(filter).init();

    debug!(?args, "CLI arguments parsed");

    // Validation failure, not a fetch failure: nothing empty reaches the
    // network layer.
    if args.url.trim().is_empty() {
        bail!("provide a video URL");
    }

    let config = match &args.api_base {
        Some(base) => ApiConfig::new(base)?,
        None => ApiConfig::from_env()?,
    };
    debug!(base = %config.base(), "service configuration resolved");

    let client = InfoClient::new(config.clone());
    let metadata = client.fetch_metadata(&args.url).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&metadata)?);
    } else {
        println!("{}", output::render_card(&metadata));
    }

    if let Some(format_id) = &args.format_id {
        let Some(format) = metadata.find_format(format_id) else {
            bail!("format {format_id} is not offered for this video; pick an id from the listing");
        };
        info!(format_id = %format.format_id, ext = %format.ext, "dispatching download");

        let launcher = Arc::new(HttpDownloadLauncher::new(config));
        let tracker = DispatchTracker::new(launcher);
        tracker
            .begin_dispatch(&DownloadRequest {
                url: args.url.trim().to_string(),
                format_id: format.format_id.clone(),
            })
            .await
            .context("download did not start")?;

        println!("Download requested for format {format_id}; the service streams the file from here.");
    }

    Ok(())
}
