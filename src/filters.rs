//! Keyword filters applied to job titles and descriptions.
//!
//! All matching is case-insensitive substring matching. The criteria are
//! lower-cased once when a [`FilterCriteria`] is built and never change
//! afterwards, so the predicates are pure.

/// Immutable keyword criteria for one scrape.
#[derive(Debug, Clone, Default)]
pub struct FilterCriteria {
    desired_titles: Vec<String>,
    blacklisted_titles: Vec<String>,
    required_substrings: Vec<String>,
    blacklisted_substrings: Vec<String>,
}

impl FilterCriteria {
    pub fn new(
        desired_titles: &[String],
        blacklisted_titles: &[String],
        required_substrings: &[String],
        blacklisted_substrings: &[String],
    ) -> Self {
        Self {
            desired_titles: lowered(desired_titles),
            blacklisted_titles: lowered(blacklisted_titles),
            required_substrings: lowered(required_substrings),
            blacklisted_substrings: lowered(blacklisted_substrings),
        }
    }

    pub fn has_desired_titles(&self) -> bool {
        !self.desired_titles.is_empty()
    }

    /// Accept a title only through an explicit desired keyword.
    ///
    /// A blacklisted keyword rejects the title even if a desired keyword
    /// also matches. With no desired keywords configured nothing matches.
    pub fn title_matches(&self, title: &str) -> bool {
        let title = title.to_lowercase();
        if self
            .blacklisted_titles
            .iter()
            .any(|word| title.contains(word.as_str()))
        {
            return false;
        }
        self.desired_titles
            .iter()
            .any(|word| title.contains(word.as_str()))
    }

    /// Reject on any blacklisted substring or any missing required substring.
    pub fn description_accepted(&self, description: &str) -> bool {
        let description = description.to_lowercase();
        if self
            .blacklisted_substrings
            .iter()
            .any(|word| description.contains(word.as_str()))
        {
            return false;
        }
        self.required_substrings
            .iter()
            .all(|word| description.contains(word.as_str()))
    }
}

fn lowered(words: &[String]) -> Vec<String> {
    words
        .iter()
        .map(|w| w.trim().to_lowercase())
        .filter(|w| !w.is_empty())
        .collect()
}
