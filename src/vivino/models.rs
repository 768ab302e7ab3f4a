//! Data models for wine records, ship-to regions, and crawl results.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One wine card extracted from a search results page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Wine name as shown on the card
    pub name: String,
    /// Absolute URL of the wine page
    pub link: String,
    /// Bottle thumbnail URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    /// Country label
    pub country: String,
    /// Wine region label
    pub region: String,
    /// Community average rating
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub average_rating: Option<f64>,
    /// Number of community ratings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating_count: Option<u64>,
    /// Price in the ship-to region's currency
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
}

/// Desired ship-to destination for the session.
///
/// Prices and availability on the site depend on the ship-to region, so the
/// session must match this selector before extracted records are trusted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionSelector {
    pub country_code: String,
    pub state_code: String,
}

impl RegionSelector {
    /// Creates a selector, defaulting the state to "CA" for the US.
    pub fn new(country_code: impl Into<String>, state_code: impl Into<String>) -> Self {
        let country_code = country_code.into().trim().to_string();
        let mut state_code = state_code.into().trim().to_string();

        if country_code.eq_ignore_ascii_case("us") && state_code.is_empty() {
            state_code = "CA".to_string();
        }

        Self { country_code, state_code }
    }

    /// Case-insensitive comparison against an active country/state pair.
    pub fn matches(&self, country_code: &str, state_code: &str) -> bool {
        self.country_code.eq_ignore_ascii_case(country_code)
            && self.state_code.eq_ignore_ascii_case(state_code)
    }
}

impl Default for RegionSelector {
    fn default() -> Self {
        Self::new("US", "")
    }
}

impl fmt::Display for RegionSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.state_code.is_empty() {
            write!(f, "{}", self.country_code.to_uppercase())
        } else {
            write!(f, "{}/{}", self.country_code.to_uppercase(), self.state_code.to_uppercase())
        }
    }
}

/// Terminal status of a crawl.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CrawlStatus {
    /// All pages were collected until an empty page
    FullData,
    /// A page returned a non-success, non-429 status
    ResponseError,
    /// The ship-to change request was rejected
    ShipToError,
    /// The ship-to change was acknowledged but not visible after reload
    ShipToConfirmError,
    /// An unrecoverable fault aborted the crawl
    Exception,
}

impl fmt::Display for CrawlStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CrawlStatus::FullData => "FULL_DATA",
            CrawlStatus::ResponseError => "RESPONSE_ERROR",
            CrawlStatus::ShipToError => "SHIP_TO_ERROR",
            CrawlStatus::ShipToConfirmError => "SHIP_TO_CONFIRM_ERROR",
            CrawlStatus::Exception => "EXCEPTION",
        };
        write!(f, "{}", name)
    }
}

/// Accumulated output of one crawl invocation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CrawlResult {
    /// Records in page discovery order
    pub records: Vec<Record>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<CrawlStatus>,
    /// HTTP status of the page that ended the crawl with an error
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_status: Option<u16>,
    /// Offset index of the page that ended the crawl with an error
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failed_page_index: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl CrawlResult {
    /// Creates an empty, unfinished result.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a finished result with no records.
    pub fn with_status(status: CrawlStatus) -> Self {
        Self { status: Some(status), ..Self::default() }
    }

    /// Marks the crawl as aborted by a fault.
    pub fn fail(&mut self, error: &anyhow::Error) {
        self.status = Some(CrawlStatus::Exception);
        self.error_message = Some(format!("{:#}", error));
    }

    /// Creates a result for a run that failed before crawling.
    pub fn from_error(error: &anyhow::Error) -> Self {
        let mut result = Self::new();
        result.fail(error);
        result
    }

    /// Returns number of records.
    pub fn count(&self) -> usize {
        self.records.len()
    }

    /// Returns true once a terminal status was recorded.
    pub fn is_finished(&self) -> bool {
        self.status.is_some()
    }
}

/// Response of a single page navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageResponse {
    /// HTTP status code
    pub status: u16,
    /// Rendered document
    pub content: String,
}

impl PageResponse {
    pub fn new(status: u16, content: impl Into<String>) -> Self {
        Self { status, content: content.into() }
    }

    /// Returns true for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Returns true for HTTP 429.
    pub fn is_rate_limited(&self) -> bool {
        self.status == 429
    }
}

/// Body of the ship-to change request.
#[derive(Debug, Clone, Serialize)]
pub struct ShipToRequest<'a> {
    pub country_code: &'a str,
    pub state_code: &'a str,
}

/// Ship-to API response envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct ShipToResponse {
    pub ship_to: ShipTo,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ShipTo {
    #[serde(default)]
    pub country_code: String,
    #[serde(default)]
    pub state_code: String,
}
