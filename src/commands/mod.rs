//! CLI command implementations.

pub mod crawl;

pub use crawl::CrawlCommand;
