//! YAML configuration for the scrapers.
//!
//! ```yaml
//! linkedIn:
//!   enabled: true
//!   queries: ["software intern"]
//!   locationsToQuery: ["Seattle"]
//!   desiredJobTitles: ["intern"]
//!   blacklistedJobTitles: ["senior"]
//!   timespan: week
//!   description:
//!     blacklistSubstrings: ["clearance"]
//!     requiredSubstrings: []
//! github:
//!   enabled: true
//!   repoURL: https://github.com/pittcsc/Summer2021-Internships
//! ```
//!
//! Every section and list is optional. A missing source section leaves that
//! source disabled.

use crate::fetch::HttpSettings;
use crate::filters::FilterCriteria;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tracing::info;
use url::Url;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Root of `config.yaml`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default, rename = "linkedIn")]
    pub linkedin: LinkedInSettings,
    #[serde(default)]
    pub github: GithubSettings,
    #[serde(default)]
    pub fetch: FetchSettings,
}

impl Settings {
    pub fn from_yaml(yaml: &str, path: &str) -> Result<Self, ConfigError> {
        let settings: Self = serde_yaml::from_str(yaml).map_err(|source| ConfigError::Parse {
            path: path.to_string(),
            source,
        })?;
        settings.fetch.validate()?;
        Ok(settings)
    }

    pub async fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let shown = path.display().to_string();
        let yaml = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Io {
                path: shown.clone(),
                source,
            })?;
        let settings = Self::from_yaml(&yaml, &shown)?;
        info!(
            path = %shown,
            linkedin = settings.linkedin.enabled,
            github = settings.github.enabled,
            "Loaded configuration"
        );
        Ok(settings)
    }
}

/// Recency filter for LinkedIn searches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Timespan {
    Day,
    Week,
    Month,
}

impl Timespan {
    /// Value of LinkedIn's `f_TPR` query parameter.
    pub fn filter_token(self) -> &'static str {
        match self {
            Timespan::Day => "r86400",
            Timespan::Week => "r604800",
            Timespan::Month => "r2592000",
        }
    }
}

/// Which key marks a parsed job posting as a duplicate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DedupKey {
    /// Record and test the apply link.
    #[default]
    Link,
    /// Record and test the company: at most one listing per company.
    Company,
    /// Record the company but test the link, as older releases did.
    /// Duplicates are effectively never detected.
    Legacy,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DescriptionSettings {
    #[serde(default)]
    pub blacklist_substrings: Vec<String>,
    #[serde(default)]
    pub required_substrings: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkedInSettings {
    #[serde(default)]
    pub enabled: bool,
    /// Search terms; the first one anchors the per-location search.
    #[serde(default)]
    pub queries: Vec<String>,
    #[serde(default)]
    pub locations_to_query: Vec<String>,
    #[serde(default)]
    pub desired_job_titles: Vec<String>,
    #[serde(default)]
    pub blacklisted_job_titles: Vec<String>,
    #[serde(default)]
    pub description: DescriptionSettings,
    #[serde(default)]
    pub timespan: Option<Timespan>,
    #[serde(default)]
    pub dedup_key: DedupKey,
    #[serde(default = "default_true")]
    pub resolve_redirects: bool,
}

fn default_true() -> bool {
    true
}

impl Default for LinkedInSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            queries: Vec::new(),
            locations_to_query: Vec::new(),
            desired_job_titles: Vec::new(),
            blacklisted_job_titles: Vec::new(),
            description: DescriptionSettings::default(),
            timespan: None,
            dedup_key: DedupKey::default(),
            resolve_redirects: true,
        }
    }
}

impl LinkedInSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.queries.iter().all(|q| q.trim().is_empty())
            || self.locations_to_query.iter().all(|l| l.trim().is_empty())
        {
            return Err(ConfigError::Invalid(
                "linkedIn.queries and linkedIn.locationsToQuery cannot be empty".to_string(),
            ));
        }
        Ok(())
    }

    pub fn criteria(&self) -> FilterCriteria {
        FilterCriteria::new(
            &self.desired_job_titles,
            &self.blacklisted_job_titles,
            &self.description.required_substrings,
            &self.description.blacklist_substrings,
        )
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GithubSettings {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default, rename = "repoURL")]
    pub repo_url: String,
}

impl GithubSettings {
    pub fn validate(&self) -> Result<Url, ConfigError> {
        let trimmed = self.repo_url.trim();
        if trimmed.is_empty() {
            return Err(ConfigError::Invalid("github.repoURL cannot be empty".to_string()));
        }
        Url::parse(trimmed)
            .map_err(|e| ConfigError::Invalid(format!("github.repoURL {trimmed:?}: {e}")))
    }
}

/// HTTP client, pacing and retry settings shared by both scrapers.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FetchSettings {
    pub user_agent: String,
    pub timeout_secs: u64,
    pub requests_per_second: f64,
    pub burst: u32,
    pub max_retries: usize,
    pub retry_base_delay_ms: u64,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            user_agent: "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string(),
            timeout_secs: 30,
            requests_per_second: 4.0,
            burst: 2,
            max_retries: 3,
            retry_base_delay_ms: 1000,
        }
    }
}

/// Slowest accepted positive request rate (one request every 100 s).
pub const MIN_REQUESTS_PER_SECOND: f64 = 0.01;

impl FetchSettings {
    /// Reject request rates the pacing code cannot turn into a delay.
    ///
    /// Zero or a negative rate disables rate limiting and is accepted.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let rps = self.requests_per_second;
        if !rps.is_finite() || (rps > 0.0 && rps < MIN_REQUESTS_PER_SECOND) {
            return Err(ConfigError::Invalid(format!(
                "fetch.requestsPerSecond must be finite and either <= 0 or >= {MIN_REQUESTS_PER_SECOND}, got {rps}"
            )));
        }
        Ok(())
    }

    pub fn http(&self) -> HttpSettings {
        HttpSettings {
            user_agent: self.user_agent.clone(),
            timeout: Duration::from_secs(self.timeout_secs.max(1)),
        }
    }

    pub fn retry_base_delay(&self) -> Duration {
        Duration::from_millis(self.retry_base_delay_ms)
    }
}
