//! Page driver for the Vivino site using wreq for TLS fingerprint emulation.

use crate::config::Config;
use crate::vivino::models::{PageResponse, RegionSelector, ShipToRequest, ShipToResponse};
use crate::vivino::parser::{parse_active_region, parse_csrf_token};
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, info, warn};
use wreq::Client;
use wreq_util::Emulation;

/// Session handle the crawler drives - enables mocking for tests.
#[async_trait]
pub trait PageDriver: Send {
    /// Loads a page. Non-success statuses are returned, not raised.
    async fn navigate(&mut self, url: &str) -> Result<PageResponse>;

    /// Loads the search results page for `query` at result offset `index`.
    async fn search(&mut self, query: &str, index: u32) -> Result<PageResponse> {
        let url = search_url(self.base_url(), query, index);
        self.navigate(&url).await
    }

    /// Reloads the home page, refreshing the session context.
    async fn reload(&mut self) -> Result<()>;

    /// Returns true if the session's active ship-to region matches `selector`.
    async fn is_active_region(&mut self, selector: &RegionSelector) -> Result<bool>;

    /// Asks the site to switch the ship-to region. Returns true only if the
    /// site acknowledged both codes.
    async fn request_region_change(&mut self, selector: &RegionSelector) -> Result<bool>;

    /// Returns the site base URL.
    fn base_url(&self) -> &str;
}

/// Builds the search results URL for a query and result offset.
pub fn search_url(base_url: &str, query: &str, index: u32) -> String {
    format!(
        "{}/search/wines?q={}&start={}",
        base_url.trim_end_matches('/'),
        urlencoding::encode(query),
        index
    )
}

/// HTTP session driver with browser impersonation and a cookie-backed session.
///
/// Only documents and the ship-to API are fetched; no images, fonts or
/// stylesheets are ever requested.
pub struct HttpDriver {
    client: Client,
    base_url: String,
    user_agent: String,
    document: Option<String>,
}

impl HttpDriver {
    /// Creates a new driver with the given configuration.
    pub async fn new(config: &Config) -> Result<Self> {
        let mut builder = Client::builder()
            .cookie_store(true)
            .gzip(true)
            .brotli(true)
            .connect_timeout(Duration::from_secs(10));

        // Zero disables the per-navigation timeout
        if config.navigation_timeout_secs > 0 {
            builder = builder.timeout(Duration::from_secs(config.navigation_timeout_secs));
        }

        if let Some(proxy_url) = &config.proxy {
            debug!("Configuring proxy: {}", proxy_url);
            let proxy = wreq::Proxy::all(proxy_url).context("Failed to configure proxy")?;
            builder = builder.proxy(proxy);
        }

        let client = builder.build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            user_agent: config.user_agent.clone(),
            document: None,
        })
    }

    /// Returns the last successfully loaded document.
    fn current_document(&self) -> Result<&str> {
        self.document.as_deref().context("No page has been loaded in this session yet")
    }
}

#[async_trait]
impl PageDriver for HttpDriver {
    async fn navigate(&mut self, url: &str) -> Result<PageResponse> {
        debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .emulation(Emulation::Chrome131)
            .header("User-Agent", self.user_agent.as_str())
            .header("Accept", "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8")
            .header("Accept-Language", "en-US,en;q=0.9")
            .header("Sec-Fetch-Dest", "document")
            .header("Sec-Fetch-Mode", "navigate")
            .header("Upgrade-Insecure-Requests", "1")
            .send()
            .await
            .context("Failed to send request")?;

        let status = response.status().as_u16();
        debug!("Response status: {}", status);

        let content = response.text().await.context("Failed to read response body")?;
        let page = PageResponse::new(status, content);

        if page.is_success() {
            self.document = Some(page.content.clone());
        }

        Ok(page)
    }

    async fn reload(&mut self) -> Result<()> {
        let url = format!("{}/", self.base_url);
        let page = self.navigate(&url).await?;

        if !page.is_success() {
            anyhow::bail!("Home page request failed with status: {}", page.status);
        }

        Ok(())
    }

    async fn is_active_region(&mut self, selector: &RegionSelector) -> Result<bool> {
        let (country, state) = parse_active_region(self.current_document()?)
            .context("Active ship-to region not found in page")?;

        debug!("Active ship-to region: {}/{}", country, state);
        Ok(selector.matches(&country, &state))
    }

    async fn request_region_change(&mut self, selector: &RegionSelector) -> Result<bool> {
        let token = parse_csrf_token(self.current_document()?)
            .context("CSRF token not found in page")?;

        let body = serde_json::to_string(&ShipToRequest {
            country_code: &selector.country_code,
            state_code: &selector.state_code,
        })?;

        let url = format!("{}/api/ship_to/", self.base_url);
        info!("Requesting ship-to change: {}", selector);

        let response = self
            .client
            .put(&url)
            .emulation(Emulation::Chrome131)
            .header("User-Agent", self.user_agent.as_str())
            .header("Content-Type", "application/json")
            .header("x-csrf-token", token.as_str())
            .body(body)
            .send()
            .await
            .context("Failed to send ship-to request")?;

        let status = response.status().as_u16();
        if status != 200 {
            warn!("Ship-to change rejected with status: {}", status);
            return Ok(false);
        }

        let text = response.text().await.context("Failed to read ship-to response")?;
        let acknowledged: ShipToResponse =
            serde_json::from_str(&text).context("Malformed ship-to response")?;

        let ship_to = acknowledged.ship_to;
        debug!("Ship-to acknowledged as {}/{}", ship_to.country_code, ship_to.state_code);

        Ok(selector.matches(&ship_to.country_code, &ship_to.state_code))
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }
}
