//! GitHub README internship table scraper.
//!
//! Fetches one README page and turns every link in its internship table into a
//! listing named after the row's company. No pagination, pacing or filtering.

use crate::config::GithubSettings;
use crate::extract::extract_github_table;
use crate::fetch::Fetch;
use crate::models::{sort_by_company, JobListing};
use tracing::{error, info, instrument};

#[derive(Debug)]
pub struct GithubScraper<'a, F> {
    fetcher: &'a F,
    settings: &'a GithubSettings,
}

impl<'a, F> GithubScraper<'a, F>
where
    F: Fetch,
{
    pub fn new(fetcher: &'a F, settings: &'a GithubSettings) -> Self {
        Self { fetcher, settings }
    }

    /// Scrape the README table.
    ///
    /// # Returns
    ///
    /// * `None` - `repoURL` is empty or not a valid URL (nothing is fetched)
    /// * `Some(vec![])` - the page could not be fetched
    /// * `Some(listings)` - one listing per table link, sorted by company
    #[instrument(level = "info", skip_all, fields(repo_url = %self.settings.repo_url))]
    pub async fn scrape_jobs(&self) -> Option<Vec<JobListing>> {
        info!("Starting GitHub scrape");

        let url = match self.settings.validate() {
            Ok(url) => url,
            Err(e) => {
                error!(error = %e, "Skipping GitHub scrape");
                return None;
            }
        };

        let html = match self.fetcher.fetch(url.as_str()).await {
            Ok(html) => html,
            Err(e) => {
                error!(kind = e.kind(), error = %e, "GitHub fetch failed");
                return Some(Vec::new());
            }
        };

        let mut listings: Vec<JobListing> = extract_github_table(&html, &url)
            .into_iter()
            .map(|(company, link)| JobListing::new(company, link))
            .collect();
        sort_by_company(&mut listings);

        info!(count = listings.len(), "Found positions on GitHub");
        Some(listings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::testing::FixtureFetcher;

    const REPO: &str = "https://github.com/pittcsc/Summer2021-Internships";

    fn settings(repo_url: &str) -> GithubSettings {
        GithubSettings {
            enabled: true,
            repo_url: repo_url.to_string(),
        }
    }

    #[tokio::test]
    async fn test_acme_beta_scenario() {
        let readme = r#"<html><body><article class="markdown-body">
            <table>
              <thead><tr><th>Name</th><th>Location</th><th>Notes</th></tr></thead>
              <tbody>
                <tr><td>Beta</td><td><a href="https://b.co/1">Remote</a></td><td><a href="https://b.co/2">NYC</a></td></tr>
                <tr><td><a href="https://a.co/apply">Acme</a></td><td>Seattle</td><td></td></tr>
              </tbody>
            </table>
        </article></body></html>"#;
        let fetcher = FixtureFetcher::new().page(REPO, readme);
        let settings = settings(REPO);

        let listings = GithubScraper::new(&fetcher, &settings).scrape_jobs().await.unwrap();

        let pairs: Vec<_> = listings
            .iter()
            .map(|l| (l.company.as_str(), l.link.as_str()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("Acme", "https://a.co/apply"),
                ("Beta", "https://b.co/1"),
                ("Beta", "https://b.co/2"),
            ]
        );
        assert!(listings.iter().all(|l| l.description.is_none()));
    }

    #[tokio::test]
    async fn test_invalid_url_returns_none() {
        let fetcher = FixtureFetcher::new();
        let settings = settings("");
        assert!(GithubScraper::new(&fetcher, &settings).scrape_jobs().await.is_none());
        assert!(fetcher.requested_urls().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_failure_returns_empty() {
        let fetcher = FixtureFetcher::new();
        let settings = settings(REPO);
        let listings = GithubScraper::new(&fetcher, &settings).scrape_jobs().await;
        assert_eq!(listings, Some(Vec::new()));
        assert_eq!(fetcher.requested_urls(), vec![REPO.to_string()]);
    }
}
