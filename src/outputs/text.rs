//! Flat-file listing store.
//!
//! Each output file holds one `"<company> | <link>"` line per listing, sorted
//! lexicographically. New scrapes are merged in by exact line equality and the
//! file is rewritten in full, so its contents only ever grow.

use crate::models::JobListing;
use std::collections::BTreeSet;
use std::error::Error;
use std::io::ErrorKind;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

/// Merge `listings` into the file at `path`.
///
/// The file holds one `"<company> | <link>"` line per listing. Existing lines
/// are kept, new ones added, and the whole set is rewritten in sorted order.
/// A missing file (and its parent directory) is created.
///
/// # Arguments
///
/// * `path` - Output text file
/// * `listings` - Listings from the current scrape
///
/// # Returns
///
/// The number of lines that were not already in the file.
///
/// # Errors
///
/// Returns an error if the file cannot be read (other than not existing),
/// or if the directory or file cannot be written.
#[instrument(level = "info", skip_all, fields(path = %path.as_ref().display()))]
pub async fn merge_into_file(
    path: impl AsRef<Path>,
    listings: &[JobListing],
) -> Result<usize, Box<dyn Error>> {
    let path = path.as_ref();

    let existing = match fs::read_to_string(path).await {
        Ok(contents) => contents,
        Err(e) if e.kind() == ErrorKind::NotFound => String::new(),
        Err(e) => return Err(e.into()),
    };

    let mut lines: BTreeSet<String> = existing
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(str::to_string)
        .collect();

    let mut new_positions = 0usize;
    for listing in listings {
        if lines.insert(listing.to_line()) {
            new_positions += 1;
        }
    }

    let mut output = String::new();
    for line in &lines {
        output.push_str(line);
        output.push('\n');
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await?;
    }
    fs::write(path, output).await?;

    info!(
        new_positions,
        total = lines.len(),
        "Found {} new positions for {}",
        new_positions,
        path.display()
    );
    Ok(new_positions)
}
