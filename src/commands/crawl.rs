//! Crawl command implementation.

use crate::config::Config;
use crate::crawler::Crawler;
use crate::filters::FilterChainBuilder;
use crate::format::json_document;
use crate::vivino::region::{ensure_region, RegionError};
use crate::vivino::{CrawlResult, HttpDriver, PageDriver, Parser};
use anyhow::{Context, Result};
use tracing::{debug, info, warn};

/// Negotiates the ship-to region, crawls every result page and filters the records.
pub struct CrawlCommand {
    config: Config,
}

impl CrawlCommand {
    /// Creates a new crawl command.
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Executes the crawl against the live site.
    ///
    /// Failures are reported through the result's status, never as an error.
    pub async fn execute(&self, query: &str) -> CrawlResult {
        match HttpDriver::new(&self.config).await {
            Ok(mut driver) => self.execute_with_driver(&mut driver, query).await,
            Err(e) => CrawlResult::from_error(&e.context("Failed to create HTTP client")),
        }
    }

    /// Executes the crawl with a provided driver (for testing).
    pub async fn execute_with_driver(
        &self,
        driver: &mut impl PageDriver,
        query: &str,
    ) -> CrawlResult {
        info!("Searching for: {}", query);

        if let Err(e) = driver.reload().await.context("Failed to load home page") {
            warn!("{:#}", e);
            return CrawlResult::from_error(&e);
        }

        let selector = self.config.selector();
        if let Err(e) = ensure_region(driver, &selector).await {
            warn!("{}", e);
            let mut result = CrawlResult::with_status(e.status());
            if let RegionError::Driver(inner) = &e {
                result.error_message = Some(format!("{:#}", inner));
            }
            return result;
        }

        let parser = Parser::new(driver.base_url());
        let crawler = Crawler::from_config(&self.config);
        let mut result = crawler.crawl(driver, query, &parser).await;

        let filters = FilterChainBuilder::from_criteria(&self.config.criteria()).build();
        if !filters.is_empty() {
            debug!("Active filters: {}", filters.descriptions().join(", "));
        }

        let collected = result.count();
        result.records = filters.apply(&result.records);

        info!(
            "Finished with {}: kept {} of {} wines",
            result.status.map_or("no status".to_string(), |s| s.to_string()),
            result.count(),
            collected
        );

        result
    }

    /// Writes the result document to the configured output path.
    pub fn write_output(&self, result: &CrawlResult) -> Result<()> {
        let path = &self.config.output;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        let document = json_document(result)?;
        std::fs::write(path, document)
            .with_context(|| format!("Failed to write results to: {}", path.display()))?;

        info!("Results written to {}", path.display());
        Ok(())
    }
}
