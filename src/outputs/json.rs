//! JSON snapshot of one scrape, including LinkedIn descriptions.
//!
//! # Output Structure
//!
//! ```text
//! json_output_dir/
//! └── 2025-05-06/
//!     ├── github.json
//!     └── linkedin.json
//! ```
//!
//! A later run on the same day overwrites that day's snapshot for the source.

use crate::models::JobListing;
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use std::error::Error;
use tokio::fs;
use tracing::{error, info, instrument};

#[derive(Debug, Serialize)]
pub struct Snapshot<'a> {
    pub source: &'a str,
    pub scraped_at: String,
    pub listings: &'a [JobListing],
}

/// Write `listings` to `{json_output_dir}/{date}/{source}.json`, returning the path.
#[instrument(level = "info", skip_all, fields(%json_output_dir, %source))]
pub async fn write_snapshot(
    listings: &[JobListing],
    source: &str,
    json_output_dir: &str,
) -> Result<String, Box<dyn Error>> {
    let now = Utc::now();
    let snapshot = Snapshot {
        source,
        scraped_at: now.to_rfc3339_opts(SecondsFormat::Secs, true),
        listings,
    };
    let json = serde_json::to_string_pretty(&snapshot)?;

    let full_json_dir = format!(
        "{}/{}",
        json_output_dir.trim_end_matches('/'),
        now.date_naive()
    );
    info!(%full_json_dir, "Ensuring JSON directory exists");
    if let Err(e) = fs::create_dir_all(&full_json_dir).await {
        error!(%full_json_dir, error = %e, "Failed to create JSON dir");
        return Err(e.into());
    }

    let output_json_filename = format!("{}/{}.json", full_json_dir, source);
    fs::write(&output_json_filename, json).await?;
    info!(path = %output_json_filename, count = listings.len(), "Wrote JSON snapshot");

    Ok(output_json_filename)
}
