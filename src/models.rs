//! Data models for scraped job listings.
//!
//! - [`JobListing`]: a single company/link pair produced by every scraper,
//!   optionally carrying the plain-text description of a LinkedIn posting.
//!
//! The text output format is one [`JobListing::to_line`] per listing.

use serde::Serialize;

/// A job listing as produced by a scraper.
///
/// Listings are immutable once built, except for [`JobListing::link`], which
/// the redirect-resolution pass of the LinkedIn scraper may rewrite in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobListing {
    /// The hiring company.
    pub company: String,
    /// Canonical apply URL.
    pub link: String,
    /// Plain-text description; only set for LinkedIn detail pages.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl JobListing {
    pub fn new(company: impl Into<String>, link: impl Into<String>) -> Self {
        Self {
            company: company.into(),
            link: link.into(),
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Render the listing as a `"<company> | <link>"` output line.
    ///
    /// Embedded line breaks are flattened so one listing always maps to one line.
    pub fn to_line(&self) -> String {
        format!(
            "{} | {}",
            flatten(&self.company),
            flatten(&self.link)
        )
    }
}

fn flatten(s: &str) -> String {
    s.split(['\r', '\n'])
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Stable sort by company name (ordinal compare).
pub fn sort_by_company(listings: &mut [JobListing]) {
    listings.sort_by(|a, b| a.company.cmp(&b.company));
}
