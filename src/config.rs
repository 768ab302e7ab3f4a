//! Configuration management with TOML, environment variables, and CLI overrides.

use crate::filters::FilterCriteria;
use crate::vivino::RegionSelector;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Application configuration with layered loading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Site base URL
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// User-Agent sent with every request; the site serves empty results to
    /// clients it identifies as headless
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Ship-to country code
    #[serde(default = "default_country")]
    pub country: String,

    /// Ship-to state code (defaults to CA for the US)
    #[serde(default)]
    pub state: String,

    /// Proxy URL (e.g., socks5://host:port)
    #[serde(default)]
    pub proxy: Option<String>,

    /// Per-navigation timeout in seconds, 0 for none
    #[serde(default)]
    pub navigation_timeout_secs: u64,

    /// Wait added per consecutive rate-limited response, in seconds
    #[serde(default = "default_backoff_secs")]
    pub backoff_secs: u64,

    /// Path of the JSON result document
    #[serde(default = "default_output")]
    pub output: PathBuf,

    /// Format of the summary printed to stdout
    #[serde(default)]
    pub format: OutputFormat,

    /// Filter: minimum price
    #[serde(default)]
    pub min_price: Option<f64>,

    /// Filter: maximum price
    #[serde(default)]
    pub max_price: Option<f64>,

    /// Filter: keep unpriced wines when a minimum price is set
    #[serde(default)]
    pub no_price_included: bool,

    /// Filter: minimum number of ratings
    #[serde(default)]
    pub min_ratings: Option<u64>,

    /// Filter: maximum number of ratings
    #[serde(default)]
    pub max_ratings: Option<u64>,

    /// Filter: minimum average rating
    #[serde(default)]
    pub min_average: Option<f64>,

    /// Filter: maximum average rating
    #[serde(default)]
    pub max_average: Option<f64>,
}

fn default_base_url() -> String {
    "https://www.vivino.com".to_string()
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) \
     Chrome/131.0.0.0 Safari/537.36"
        .to_string()
}

fn default_country() -> String {
    "US".to_string()
}

fn default_backoff_secs() -> u64 {
    15
}

fn default_output() -> PathBuf {
    PathBuf::from("vivino-out.json")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            user_agent: default_user_agent(),
            country: default_country(),
            state: String::new(),
            proxy: None,
            navigation_timeout_secs: 0,
            backoff_secs: default_backoff_secs(),
            output: default_output(),
            format: OutputFormat::Table,
            min_price: None,
            max_price: None,
            no_price_included: false,
            min_ratings: None,
            max_ratings: None,
            min_average: None,
            max_average: None,
        }
    }
}

impl Config {
    /// Creates a new default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading config from: {}", path.display());

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Loads configuration with fallback to default locations.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        // 1. Explicit path takes precedence
        if let Some(path) = explicit_path {
            return Self::from_file(path);
        }

        // 2. Try current directory
        let local_config = Path::new("config.toml");
        if local_config.exists() {
            debug!("Found config.toml in current directory");
            return Self::from_file(local_config);
        }

        // 3. Try XDG config directory
        if let Some(config_dir) = dirs::config_dir() {
            let xdg_config = config_dir.join("vivino-crawler").join("config.toml");
            if xdg_config.exists() {
                debug!("Found config in XDG config directory");
                return Self::from_file(xdg_config);
            }
        }

        // 4. Return default config
        debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Applies environment variable overrides.
    pub fn with_env(mut self) -> Self {
        if let Ok(country) = std::env::var("VIVINO_COUNTRY") {
            self.country = country;
        }

        if let Ok(state) = std::env::var("VIVINO_STATE") {
            self.state = state;
        }

        if let Ok(proxy) = std::env::var("VIVINO_PROXY") {
            self.proxy = Some(proxy);
        }

        if let Ok(output) = std::env::var("VIVINO_OUTPUT") {
            self.output = PathBuf::from(output);
        }

        if let Ok(backoff) = std::env::var("VIVINO_BACKOFF") {
            if let Ok(b) = backoff.parse() {
                self.backoff_secs = b;
            }
        }

        self
    }

    /// Returns the ship-to region to negotiate.
    pub fn selector(&self) -> RegionSelector {
        RegionSelector::new(&self.country, &self.state)
    }

    /// Returns the filter bounds to apply after the crawl.
    pub fn criteria(&self) -> FilterCriteria {
        FilterCriteria {
            min_price: self.min_price,
            max_price: self.max_price,
            min_rating_count: self.min_ratings,
            max_rating_count: self.max_ratings,
            min_average_rating: self.min_average,
            max_average_rating: self.max_average,
            include_records_missing_price: self.no_price_included,
        }
    }
}

/// Output format for the stdout summary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Csv,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            "csv" => Ok(OutputFormat::Csv),
            _ => Err(format!("Unknown format: {}. Use: table, json, csv", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Table => write!(f, "table"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Csv => write!(f, "csv"),
        }
    }
}
