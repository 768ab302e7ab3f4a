//! Vivino-specific modules for page driving, region negotiation, parsing, and data models.

pub mod driver;
pub mod models;
pub mod parser;
pub mod region;
pub mod selectors;

pub use driver::{HttpDriver, PageDriver};
pub use models::{CrawlResult, CrawlStatus, PageResponse, Record, RegionSelector};
pub use parser::{ExtractError, Extractor, Parser};
pub use region::{ensure_region, RegionError};
