//! LinkedIn public job-search scraper.
//!
//! The scrape runs as a strictly sequential pipeline:
//!
//! 1. Validate search terms and locations
//! 2. Search each location with the first search term
//! 3. Collect the city codes (`f_PP`) offered on those result pages
//! 4. Search every (city code × search term) combination, one batch per city
//! 5. Extract job-card links, filtered by title and deduplicated by (company, title)
//! 6. Fetch job detail pages in batches of 10
//! 7. Parse and filter company, description and external apply link
//! 8. Optionally resolve each apply link to its redirect target
//! 9. Sort by company
//!
//! LinkedIn allows roughly four requests per second and answers with an empty
//! body once that is exceeded, so every stage is paced by [`Pacing`].

use crate::config::{DedupKey, LinkedInSettings, Timespan};
use crate::extract::{
    extract_city_codes, extract_external_apply_link, extract_job_card_links, extract_job_detail,
    truncate_ref_id, SeenJobs,
};
use crate::fetch::{fetch_all, fetch_in_batches, Fetch};
use crate::filters::FilterCriteria;
use crate::models::{sort_by_company, JobListing};
use crate::utils::truncate_for_log;
use itertools::Itertools;
use std::collections::HashSet;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, error, info, instrument, warn};
use urlencoding::encode;

const SEARCH_URL: &str = "https://www.linkedin.com/jobs/search";
const MAX_CITY_BATCH_DELAY: Duration = Duration::from_secs(300);

/// Request pacing for each pipeline stage.
#[derive(Debug, Clone)]
pub struct Pacing {
    /// Concurrent requests for the location and city searches.
    pub search_concurrency: usize,
    /// Rate used to space out city batches (`terms / rate` seconds apart).
    pub requests_per_second: f64,
    /// Pause after city-code discovery and after the city searches.
    pub stage_delay: Duration,
    pub detail_batch_size: usize,
    pub detail_batch_delay: Duration,
    /// Pause between redirect resolutions.
    pub redirect_delay: Duration,
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            search_concurrency: 2,
            requests_per_second: 4.0,
            stage_delay: Duration::from_secs(5),
            detail_batch_size: 10,
            detail_batch_delay: Duration::from_secs(5),
            redirect_delay: Duration::from_millis(250),
        }
    }
}

impl Pacing {
    /// Default pacing with city batches spaced for `requests_per_second`.
    pub fn for_rate(requests_per_second: f64) -> Self {
        Self {
            requests_per_second,
            ..Self::default()
        }
    }

    fn city_batch_delay(&self, terms: usize) -> Duration {
        if self.requests_per_second <= 0.0 {
            return Duration::ZERO;
        }
        Duration::try_from_secs_f64(terms as f64 / self.requests_per_second)
            .unwrap_or(MAX_CITY_BATCH_DELAY)
            .min(MAX_CITY_BATCH_DELAY)
    }
}

/// Search URL for the top-level, per-location query.
pub fn location_search_url(term: &str, location: &str) -> String {
    format!(
        "{SEARCH_URL}?keywords={}&location={}",
        encode(term),
        encode(location)
    )
}

/// Search URL narrowed to one LinkedIn city code.
pub fn city_search_url(term: &str, city_code: &str, timespan: Option<Timespan>) -> String {
    let mut url = format!("{SEARCH_URL}?keywords={}&f_PP={}", encode(term), encode(city_code));
    if let Some(span) = timespan {
        url.push_str("&f_TPR=");
        url.push_str(span.filter_token());
    }
    url
}

/// Outcome counts of detail-page parsing.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DetailStats {
    /// Dropped as duplicates.
    pub skipped: usize,
    /// Dropped for a missing element or failed criteria.
    pub failed: usize,
    /// Pages that came back empty (rate limited or failed).
    pub empty: usize,
}

/// Turn job detail pages into filtered, deduplicated listings.
pub fn parse_job_listings(
    pages: &[String],
    criteria: &FilterCriteria,
    dedup_key: DedupKey,
) -> (Vec<JobListing>, DetailStats) {
    let mut stats = DetailStats::default();
    let mut seen: HashSet<String> = HashSet::new();
    let mut listings = Vec::new();

    for html in pages {
        if html.trim().is_empty() {
            stats.empty += 1;
            continue;
        }
        let Some(detail) = extract_job_detail(html) else {
            debug!(page = %truncate_for_log(html, 200), "Job page missing company or description");
            stats.failed += 1;
            continue;
        };
        if !criteria.description_accepted(&detail.description) {
            stats.failed += 1;
            continue;
        }
        let Some(link) = extract_external_apply_link(html) else {
            stats.failed += 1;
            continue;
        };
        let link = truncate_ref_id(&link);

        let (recorded, tested) = match dedup_key {
            DedupKey::Link => (&link, &link),
            DedupKey::Company => (&detail.company, &detail.company),
            DedupKey::Legacy => (&detail.company, &link),
        };
        if seen.contains(tested) {
            stats.skipped += 1;
            continue;
        }
        seen.insert(recorded.clone());

        listings.push(JobListing::new(detail.company, link).with_description(detail.description));
    }

    (listings, stats)
}

/// Scraper for LinkedIn's public job search.
#[derive(Debug)]
pub struct LinkedInScraper<'a, F> {
    fetcher: &'a F,
    settings: LinkedInSettings,
    terms: Vec<String>,
    locations: Vec<String>,
    criteria: FilterCriteria,
    pacing: Pacing,
}

fn cleaned(items: &[String]) -> Vec<String> {
    items
        .iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

impl<'a, F> LinkedInScraper<'a, F>
where
    F: Fetch,
{
    pub fn new(fetcher: &'a F, settings: &LinkedInSettings) -> Self {
        Self {
            fetcher,
            terms: cleaned(&settings.queries),
            locations: cleaned(&settings.locations_to_query),
            criteria: settings.criteria(),
            settings: settings.clone(),
            pacing: Pacing::default(),
        }
    }

    pub fn with_pacing(mut self, pacing: Pacing) -> Self {
        self.pacing = pacing;
        self
    }

    /// Run the whole pipeline.
    ///
    /// Pages that fail to load are treated as empty, so a partially failed
    /// scrape still returns whatever it found.
    ///
    /// # Returns
    ///
    /// * `None` - the search terms or locations are all blank
    /// * `Some(listings)` - filtered listings sorted by company (possibly none)
    #[instrument(level = "info", skip_all)]
    pub async fn scrape_jobs(&self) -> Option<Vec<JobListing>> {
        info!("Starting LinkedIn scrape");

        if let Err(e) = self.settings.validate() {
            error!(error = %e, "Skipping LinkedIn scrape");
            return None;
        }
        if !self.criteria.has_desired_titles() {
            warn!("No desiredJobTitles configured; no job card can match");
        }

        info!(locations = %self.locations.join(", "), "Searching for jobs");
        let top_level_pages = self.top_level_search().await;
        let city_codes: Vec<String> = top_level_pages
            .iter()
            .flat_map(|html| extract_city_codes(html))
            .unique()
            .collect();
        sleep(self.pacing.stage_delay).await;

        info!(
            count = city_codes.len(),
            city_codes = %city_codes.join(", "),
            "Narrowing search to LinkedIn city codes"
        );
        let city_pages = self.city_level_search(&city_codes).await;
        sleep(self.pacing.stage_delay).await;

        let job_links = self.parse_job_links(&city_pages);
        info!(count = job_links.len(), "Found job links");

        let postings = fetch_in_batches(
            self.fetcher,
            &job_links,
            self.pacing.detail_batch_size,
            self.pacing.detail_batch_delay,
        )
        .await;

        info!("Parsing jobs from job-specific links");
        let (mut listings, stats) =
            parse_job_listings(&postings, &self.criteria, self.settings.dedup_key);
        info!(
            skipped = stats.skipped,
            failed = stats.failed,
            empty = stats.empty,
            "Skipped duplicate postings and postings that failed criteria"
        );

        if self.settings.resolve_redirects {
            self.resolve_links(&mut listings).await;
        }

        sort_by_company(&mut listings);
        info!(count = listings.len(), "Found related job postings on LinkedIn");
        Some(listings)
    }

    #[instrument(level = "info", skip_all)]
    async fn top_level_search(&self) -> Vec<String> {
        let term = &self.terms[0];
        let urls: Vec<String> = self
            .locations
            .iter()
            .map(|location| location_search_url(term, location))
            .collect();
        fetch_all(self.fetcher, &urls, self.pacing.search_concurrency).await
    }

    #[instrument(level = "info", skip_all, fields(cities = city_codes.len()))]
    async fn city_level_search(&self, city_codes: &[String]) -> Vec<String> {
        let delay = self.pacing.city_batch_delay(self.terms.len());
        let mut pages = Vec::with_capacity(city_codes.len() * self.terms.len());

        for (i, code) in city_codes.iter().enumerate() {
            let urls: Vec<String> = self
                .terms
                .iter()
                .map(|term| city_search_url(term, code, self.settings.timespan))
                .collect();
            pages.extend(fetch_all(self.fetcher, &urls, self.pacing.search_concurrency).await);
            info!(cities = i + 1, pages = pages.len(), "Gathered city search pages");

            if i + 1 < city_codes.len() {
                sleep(delay).await;
            }
        }

        pages
    }

    fn parse_job_links(&self, pages: &[String]) -> Vec<String> {
        let mut seen = SeenJobs::default();
        let links: Vec<String> = pages
            .iter()
            .flat_map(|html| extract_job_card_links(html, &self.criteria, &mut seen))
            .map(|card| {
                debug!(company = %card.company, title = %card.title, link = %card.link, "Matched job card");
                card.link
            })
            .collect();
        debug!(unique_cards = seen.len(), "Deduplicated job cards by company and title");
        links
    }

    /// Replace each link with its redirect target; failures keep the original.
    #[instrument(level = "info", skip_all, fields(count = listings.len()))]
    async fn resolve_links(&self, listings: &mut [JobListing]) {
        let total = listings.len();
        let mut resolved = 0usize;

        for (i, listing) in listings.iter_mut().enumerate() {
            let outcome = self.fetcher.resolve(&listing.link).await;
            match outcome {
                Ok(target) => {
                    if target != listing.link {
                        debug!(from = %listing.link, to = %target, "Resolved apply link");
                        listing.link = target;
                        resolved += 1;
                    }
                }
                Err(e) => {
                    debug!(url = %listing.link, kind = e.kind(), error = %e, "Keeping unresolved apply link");
                }
            }
            if i + 1 < total {
                sleep(self.pacing.redirect_delay).await;
            }
        }

        info!(resolved, total, "Resolved apply links");
    }
}
