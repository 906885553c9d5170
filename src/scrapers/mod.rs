//! Job listing scrapers.
//!
//! | Source | Module | Method | Notes |
//! |--------|--------|--------|-------|
//! | GitHub README | [`github`] | HTML table walk | One page, no pacing |
//! | LinkedIn | [`linkedin`] | Multi-stage HTML scraping | Paced to ~4 requests/second |
//!
//! Each scraper exposes `scrape_jobs()`, returning the listings sorted by
//! company, or `None` when its configuration is invalid. Network and parse
//! failures are logged inside the scraper and never escape it.

pub mod github;
pub mod linkedin;
