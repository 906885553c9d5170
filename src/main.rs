//! # Internship Scraper
//!
//! Scrapes internship listings from a GitHub README table and from LinkedIn's
//! public job search, filters them against keyword criteria, and merges the
//! results into deduplicated `"<company> | <link>"` text files.
//!
//! ## Usage
//!
//! ```sh
//! internship_scraper -c config.yaml -o ./output
//! ```
//!
//! ## Architecture
//!
//! 1. **Configuration**: load `config.yaml` (see [`config`])
//! 2. **Scraping**: GitHub then LinkedIn, each skipped on invalid configuration
//! 3. **Output**: merge each source into `<output_dir>/<source>-scrape.txt`,
//!    optionally writing a JSON snapshot

use clap::Parser;
use std::error::Error;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{fmt as tfmt, EnvFilter};

mod cli;
mod config;
mod extract;
mod fetch;
mod filters;
mod models;
mod outputs;
mod rate_limit;
mod scrapers;
mod utils;

use cli::Cli;
use config::Settings;
use fetch::{HttpFetcher, RetryFetch};
use models::JobListing;
use outputs::{json, text};
use rate_limit::RateLimiter;
use scrapers::github::GithubScraper;
use scrapers::linkedin::{LinkedInScraper, Pacing};
use utils::ensure_writable_dir;

const GITHUB_OUTPUT: &str = "github-scrape.txt";
const LINKEDIN_OUTPUT: &str = "linkedIn-scrape.txt";

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("internship_scraper starting up");

    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    let settings = Settings::load(&args.config).await?;

    if let Err(e) = ensure_writable_dir(&args.output_dir).await {
        error!(
            path = %args.output_dir,
            error = %e,
            "Output directory is not writable (fix perms or choose a different path)"
        );
        return Err(e);
    }

    // One fetcher for both scrapers so they share the per-host rate limiter.
    let limiter = Arc::new(RateLimiter::new(
        settings.fetch.requests_per_second,
        settings.fetch.burst,
    ));
    let fetcher = RetryFetch::new(
        HttpFetcher::new(&settings.fetch.http(), limiter)?,
        settings.fetch.max_retries,
        settings.fetch.retry_base_delay(),
    );

    // ---- GitHub ----
    if settings.github.enabled && !args.skip_github {
        if let Some(jobs) = GithubScraper::new(&fetcher, &settings.github)
            .scrape_jobs()
            .await
        {
            write_outputs(&args, "github", GITHUB_OUTPUT, &jobs).await;
        }
    } else {
        info!("GitHub scrape disabled");
    }

    // ---- LinkedIn ----
    // The LinkedIn scrape takes a long time with many locations or search terms.
    if settings.linkedin.enabled && !args.skip_linkedin {
        if let Some(jobs) = LinkedInScraper::new(&fetcher, &settings.linkedin)
            .with_pacing(Pacing::for_rate(settings.fetch.requests_per_second))
            .scrape_jobs()
            .await
        {
            write_outputs(&args, "linkedin", LINKEDIN_OUTPUT, &jobs).await;
        }
    } else {
        info!("LinkedIn scrape disabled");
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Execution complete"
    );

    Ok(())
}

/// Merge a scrape into its text file and, if requested, write a JSON snapshot.
///
/// Failures are logged; one source's output error never stops the other.
#[instrument(level = "info", skip(args, listings), fields(count = listings.len()))]
async fn write_outputs(args: &Cli, source: &str, file_name: &str, listings: &[JobListing]) {
    let path = Path::new(&args.output_dir).join(file_name);
    if let Err(e) = text::merge_into_file(&path, listings).await {
        error!(path = %path.display(), error = %e, "Failed to merge listings");
    }

    if let Some(ref dir) = args.json_output_dir {
        if let Err(e) = json::write_snapshot(listings, source, dir).await {
            error!(error = %e, "Failed to write JSON snapshot");
        }
    }
}
