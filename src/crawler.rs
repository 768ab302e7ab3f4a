//! Paginated fetch-extract loop over search results.

use crate::config::Config;
use crate::vivino::driver::PageDriver;
use crate::vivino::models::{CrawlResult, CrawlStatus, PageResponse};
use crate::vivino::parser::Extractor;
use anyhow::{Context, Result};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Default wait added per consecutive rate-limited response.
pub const DEFAULT_BACKOFF_STEP: Duration = Duration::from_secs(15);

/// Linearly growing wait for consecutive rate-limited responses.
///
/// There is no retry ceiling. A crawl that stays rate limited keeps waiting
/// in growing increments.
#[derive(Debug, Clone)]
pub struct Backoff {
    step: Duration,
    attempts: u32,
}

impl Backoff {
    /// Creates a backoff adding `step` per consecutive attempt.
    pub fn new(step: Duration) -> Self {
        Self { step, attempts: 0 }
    }

    /// Registers one more rate-limited response and returns the wait for it.
    pub fn next_delay(&mut self) -> Duration {
        self.attempts = self.attempts.saturating_add(1);
        self.step.saturating_mul(self.attempts)
    }

    /// Forgets earlier rate-limited responses.
    pub fn reset(&mut self) {
        self.attempts = 0;
    }

    /// Returns the number of consecutive rate-limited responses.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new(DEFAULT_BACKOFF_STEP)
    }
}

enum State {
    Requesting,
    Backoff,
    Collecting(PageResponse),
    Done,
}

/// Drives search result pages until the listing is exhausted or fails.
pub struct Crawler {
    backoff_step: Duration,
}

impl Crawler {
    /// Creates a crawler with the given backoff step.
    pub fn new(backoff_step: Duration) -> Self {
        Self { backoff_step }
    }

    /// Creates a crawler from configuration.
    pub fn from_config(config: &Config) -> Self {
        Self::new(Duration::from_secs(config.backoff_secs))
    }

    /// Crawls every result page for `query`.
    ///
    /// Never fails: faults end the crawl with [`CrawlStatus::Exception`] and
    /// keep whatever records were collected before them.
    pub async fn crawl(
        &self,
        driver: &mut impl PageDriver,
        query: &str,
        extractor: &impl Extractor,
    ) -> CrawlResult {
        let mut result = CrawlResult::new();

        if let Err(e) = self.run(driver, query, extractor, &mut result).await {
            warn!("Crawl aborted: {:#}", e);
            result.fail(&e);
        }

        result
    }

    async fn run(
        &self,
        driver: &mut impl PageDriver,
        query: &str,
        extractor: &impl Extractor,
        result: &mut CrawlResult,
    ) -> Result<()> {
        // Offset into the result list, starting at 1
        let mut index: u32 = 1;
        let mut backoff = Backoff::new(self.backoff_step);
        let mut state = State::Requesting;

        loop {
            state = match state {
                State::Requesting => {
                    debug!("Fetching page {}", index);
                    let page = driver
                        .search(query, index)
                        .await
                        .with_context(|| format!("Failed to load page {}", index))?;

                    if page.is_success() {
                        State::Collecting(page)
                    } else if page.is_rate_limited() {
                        State::Backoff
                    } else {
                        warn!("Page {} failed with status {}", index, page.status);
                        result.http_status = Some(page.status);
                        result.failed_page_index = Some(index);
                        result.status = Some(CrawlStatus::ResponseError);
                        State::Done
                    }
                }

                State::Backoff => {
                    let delay = backoff.next_delay();
                    warn!(
                        "Rate limited on page {} ({} in a row), waiting {} seconds",
                        index,
                        backoff.attempts(),
                        delay.as_secs()
                    );
                    tokio::time::sleep(delay).await;
                    State::Requesting
                }

                State::Collecting(page) => {
                    backoff.reset();

                    let records = extractor
                        .extract(&page.content)
                        .with_context(|| format!("Failed to extract page {}", index))?;

                    if records.is_empty() {
                        debug!("No results on page {}, stopping", index);
                        result.status = Some(CrawlStatus::FullData);
                        State::Done
                    } else {
                        info!("Collected {} results from page {}", records.len(), index);
                        result.records.extend(records);
                        index += 1;
                        State::Requesting
                    }
                }

                State::Done => break,
            };
        }

        Ok(())
    }
}

impl Default for Crawler {
    fn default() -> Self {
        Self::new(DEFAULT_BACKOFF_STEP)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vivino::models::{Record, RegionSelector};
    use crate::vivino::parser::ExtractError;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use tokio::time::Instant;

    /// Driver replaying scripted search responses and recording offsets.
    struct ScriptedDriver {
        responses: VecDeque<Result<PageResponse>>,
        requested: Vec<u32>,
    }

    impl ScriptedDriver {
        fn new(responses: Vec<Result<PageResponse>>) -> Self {
            Self { responses: responses.into(), requested: Vec::new() }
        }
    }

    #[async_trait]
    impl PageDriver for ScriptedDriver {
        async fn navigate(&mut self, _url: &str) -> Result<PageResponse> {
            anyhow::bail!("unexpected navigation")
        }

        async fn search(&mut self, _query: &str, index: u32) -> Result<PageResponse> {
            self.requested.push(index);
            self.responses.pop_front().unwrap_or_else(|| Ok(page("")))
        }

        async fn reload(&mut self) -> Result<()> {
            Ok(())
        }

        async fn is_active_region(&mut self, _selector: &RegionSelector) -> Result<bool> {
            Ok(true)
        }

        async fn request_region_change(&mut self, _selector: &RegionSelector) -> Result<bool> {
            Ok(true)
        }

        fn base_url(&self) -> &str {
            "https://www.vivino.com"
        }
    }

    /// Treats page content as a comma-separated list of wine names; "!" is malformed.
    struct NameListExtractor;

    impl Extractor for NameListExtractor {
        fn extract(&self, page: &str) -> Result<Vec<Record>, ExtractError> {
            if page == "!" {
                return Err(ExtractError::MissingField { card: 0, field: "name" });
            }

            Ok(page
                .split(',')
                .filter(|name| !name.is_empty())
                .map(|name| Record {
                    name: name.to_string(),
                    link: format!("https://www.vivino.com/w/{}", name),
                    thumbnail: None,
                    country: "Italy".to_string(),
                    region: "Toscana".to_string(),
                    average_rating: None,
                    rating_count: None,
                    price: None,
                })
                .collect())
        }
    }

    fn page(content: &str) -> PageResponse {
        PageResponse::new(200, content)
    }

    fn status(code: u16) -> PageResponse {
        PageResponse::new(code, "")
    }

    fn names(result: &CrawlResult) -> Vec<&str> {
        result.records.iter().map(|r| r.name.as_str()).collect()
    }

    #[test]
    fn test_backoff_grows_linearly() {
        let mut backoff = Backoff::default();
        assert_eq!(backoff.next_delay(), Duration::from_secs(15));
        assert_eq!(backoff.next_delay(), Duration::from_secs(30));
        assert_eq!(backoff.next_delay(), Duration::from_secs(45));
        assert_eq!(backoff.attempts(), 3);

        backoff.reset();
        assert_eq!(backoff.attempts(), 0);
        assert_eq!(backoff.next_delay(), Duration::from_secs(15));
    }

    #[tokio::test]
    async fn test_full_data_keeps_page_order() {
        let mut driver = ScriptedDriver::new(vec![Ok(page("A,B")), Ok(page("C")), Ok(page(""))]);

        let result = Crawler::default().crawl(&mut driver, "chianti", &NameListExtractor).await;

        assert_eq!(result.status, Some(CrawlStatus::FullData));
        assert_eq!(names(&result), vec!["A", "B", "C"]);
        assert_eq!(driver.requested, vec![1, 2, 3]);
        assert!(result.http_status.is_none());
    }

    #[tokio::test]
    async fn test_duplicates_across_pages_are_kept() {
        let mut driver = ScriptedDriver::new(vec![Ok(page("A")), Ok(page("A")), Ok(page(""))]);

        let result = Crawler::default().crawl(&mut driver, "q", &NameListExtractor).await;

        assert_eq!(names(&result), vec!["A", "A"]);
    }

    #[tokio::test]
    async fn test_empty_first_page() {
        let mut driver = ScriptedDriver::new(vec![Ok(page(""))]);

        let result = Crawler::default().crawl(&mut driver, "nothing", &NameListExtractor).await;

        assert_eq!(result.status, Some(CrawlStatus::FullData));
        assert!(result.records.is_empty());
        assert_eq!(driver.requested, vec![1]);
    }

    #[tokio::test]
    async fn test_response_error_stops_and_keeps_records() {
        let mut driver =
            ScriptedDriver::new(vec![Ok(page("A,B")), Ok(page("C")), Ok(status(500))]);

        let result = Crawler::default().crawl(&mut driver, "q", &NameListExtractor).await;

        assert_eq!(result.status, Some(CrawlStatus::ResponseError));
        assert_eq!(result.http_status, Some(500));
        assert_eq!(result.failed_page_index, Some(3));
        assert_eq!(names(&result), vec!["A", "B", "C"]);
        assert_eq!(driver.requested, vec![1, 2, 3]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limit_retries_same_index() {
        let mut driver = ScriptedDriver::new(vec![Ok(status(429)), Ok(page("A")), Ok(page(""))]);

        let start = Instant::now();
        let result = Crawler::default().crawl(&mut driver, "q", &NameListExtractor).await;
        let waited = start.elapsed();

        assert_eq!(result.status, Some(CrawlStatus::FullData));
        assert_eq!(driver.requested, vec![1, 1, 2]);
        assert!(waited >= Duration::from_secs(15));
        assert!(waited < Duration::from_secs(16));
    }

    #[tokio::test(start_paused = true)]
    async fn test_consecutive_rate_limits_back_off_linearly() {
        let mut driver = ScriptedDriver::new(vec![
            Ok(status(429)),
            Ok(status(429)),
            Ok(status(429)),
            Ok(page("A")),
            Ok(page("")),
        ]);

        let start = Instant::now();
        let result = Crawler::default().crawl(&mut driver, "q", &NameListExtractor).await;
        let waited = start.elapsed();

        // 15 + 30 + 45
        assert!(waited >= Duration::from_secs(90));
        assert!(waited < Duration::from_secs(91));
        assert_eq!(driver.requested, vec![1, 1, 1, 1, 2]);
        assert_eq!(names(&result), vec!["A"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_resets_backoff() {
        let mut driver = ScriptedDriver::new(vec![
            Ok(status(429)),
            Ok(page("A")),
            Ok(status(429)),
            Ok(page("")),
        ]);

        let start = Instant::now();
        Crawler::default().crawl(&mut driver, "q", &NameListExtractor).await;
        let waited = start.elapsed();

        assert!(waited >= Duration::from_secs(30));
        assert!(waited < Duration::from_secs(31));
        assert_eq!(driver.requested, vec![1, 1, 2, 2]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_custom_backoff_step() {
        let mut driver = ScriptedDriver::new(vec![Ok(status(429)), Ok(page(""))]);

        let start = Instant::now();
        Crawler::new(Duration::from_secs(2)).crawl(&mut driver, "q", &NameListExtractor).await;

        assert!(start.elapsed() < Duration::from_secs(3));
    }

    #[tokio::test]
    async fn test_driver_fault_is_exception() {
        let mut driver = ScriptedDriver::new(vec![
            Ok(page("A")),
            Err(anyhow::anyhow!("browser disconnected")),
            Ok(page("B")),
        ]);

        let result = Crawler::default().crawl(&mut driver, "q", &NameListExtractor).await;

        assert_eq!(result.status, Some(CrawlStatus::Exception));
        assert_eq!(names(&result), vec!["A"]);
        let message = result.error_message.unwrap();
        assert!(message.contains("page 2"));
        assert!(message.contains("browser disconnected"));
        assert_eq!(driver.requested, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_extraction_fault_is_exception() {
        let mut driver = ScriptedDriver::new(vec![Ok(page("A")), Ok(page("!"))]);

        let result = Crawler::default().crawl(&mut driver, "q", &NameListExtractor).await;

        assert_eq!(result.status, Some(CrawlStatus::Exception));
        assert_eq!(names(&result), vec!["A"]);
        assert!(result.error_message.unwrap().contains("missing its name"));
    }

    #[test]
    fn test_from_config() {
        let config = Config { backoff_secs: 5, ..Config::default() };
        let crawler = Crawler::from_config(&config);
        assert_eq!(crawler.backoff_step, Duration::from_secs(5));
    }
}
