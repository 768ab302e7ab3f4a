//! vivino-crawler - Wine catalog crawler for Vivino search results
//!
//! Negotiates the ship-to region of a browsing session, walks every search
//! result page with linear backoff on rate limiting, and filters the
//! collected wines by price and rating bounds.

pub mod commands;
pub mod config;
pub mod crawler;
pub mod filters;
pub mod format;
pub mod vivino;

pub use config::Config;
pub use crawler::Crawler;
pub use filters::FilterCriteria;
pub use vivino::models::{CrawlResult, CrawlStatus, Record, RegionSelector};
