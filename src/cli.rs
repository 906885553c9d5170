//! Command-line interface definitions.
//!
//! Scrape criteria live in the YAML config file; the CLI only chooses the
//! config file, the output locations and which sources to force off.

use clap::Parser;

/// Command-line arguments for the internship scraper.
///
/// # Examples
///
/// ```sh
/// # Use ./config.yaml and write to ./output
/// internship_scraper
///
/// # Custom config, JSON snapshots, GitHub only
/// internship_scraper -c ~/scrape.yaml -j ./json --skip-linkedin
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Path to the YAML config file
    #[arg(short, long, env = "SCRAPER_CONFIG", default_value = "config.yaml")]
    pub config: String,

    /// Directory holding the merged `<source>-scrape.txt` files
    #[arg(short, long, default_value = "output")]
    pub output_dir: String,

    /// Optional directory for per-run JSON snapshots (with descriptions)
    #[arg(short, long)]
    pub json_output_dir: Option<String>,

    /// Skip the GitHub scrape even if enabled in the config
    #[arg(long)]
    pub skip_github: bool,

    /// Skip the LinkedIn scrape even if enabled in the config
    #[arg(long)]
    pub skip_linkedin: bool,
}
