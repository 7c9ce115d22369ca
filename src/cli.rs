//! CLI argument definitions using clap derive macros.

use clap::Parser;

/// Fetch video metadata and start per-format downloads via the Sobaixa API.
///
/// Submits one video URL, prints the retrieved metadata with its
/// downloadable formats, and optionally dispatches a download for a chosen
/// format id.
#[derive(Parser, Debug)]
#[command(name = "sobaixa")]
#[command(author, version, about)]
pub struct Args {
    /// Video URL to look up (watch URL, short link, or any direct link)
    pub url: String,

    /// Dispatch a download for this format id after the metadata fetch
    #[arg(short = 'f', long = "format")]
    pub format_id: Option<String>,

    /// Print the raw metadata JSON instead of the formatted card
    #[arg(long)]
    pub json: bool,

    /// Service base address (overrides SOBAIXA_API_BASE_URL)
    #[arg(long)]
    pub api_base: Option<String>,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,
}
