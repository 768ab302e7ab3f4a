//! vivino-crawler - Wine catalog crawler for Vivino search results
//!
//! Crawls every result page for a query in a chosen ship-to region and
//! writes the filtered wines as a JSON document.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::{warn, Level};
use tracing_subscriber::EnvFilter;
use vivino_crawler::commands::CrawlCommand;
use vivino_crawler::config::{Config, OutputFormat};
use vivino_crawler::format::Formatter;
use vivino_crawler::CrawlResult;

#[derive(Parser)]
#[command(
    name = "vivino-crawler",
    version,
    about = "Wine catalog crawler for Vivino search results",
    long_about = "Crawls every Vivino search result page for a query in a chosen ship-to region, \
                  filters the wines by price and ratings, and writes them as JSON."
)]
struct Cli {
    /// Search query
    #[arg(short, long)]
    name: String,

    /// Ship-to country code
    #[arg(long, env = "VIVINO_COUNTRY")]
    country: Option<String>,

    /// Ship-to state code (defaults to CA for the US)
    #[arg(long, env = "VIVINO_STATE")]
    state: Option<String>,

    /// Minimum price filter
    #[arg(long)]
    min_price: Option<f64>,

    /// Maximum price filter
    #[arg(long)]
    max_price: Option<f64>,

    /// Keep wines without a price when a minimum price is set
    #[arg(long)]
    no_price_included: bool,

    /// Minimum number of ratings
    #[arg(long)]
    min_ratings: Option<u64>,

    /// Maximum number of ratings
    #[arg(long)]
    max_ratings: Option<u64>,

    /// Minimum average rating
    #[arg(long)]
    min_average: Option<f64>,

    /// Maximum average rating
    #[arg(long)]
    max_average: Option<f64>,

    /// Path to config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Path of the JSON result document [default: vivino-out.json]
    #[arg(short, long, env = "VIVINO_OUTPUT")]
    output: Option<PathBuf>,

    /// Summary format printed to stdout
    #[arg(short, long, default_value = "table")]
    format: OutputFormat,

    /// Proxy URL (e.g., socks5://host:port)
    #[arg(long, env = "VIVINO_PROXY")]
    proxy: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new(Level::DEBUG.to_string())
    } else {
        EnvFilter::from_default_env().add_directive(Level::WARN.into())
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    // Load config with layered overrides, keeping the load error for the document
    let (config, load_error) = match Config::load(cli.config.as_deref()) {
        Ok(config) => (config, None),
        Err(e) => {
            warn!("{:#}", e);
            (Config::default(), Some(e))
        }
    };
    let mut config = config.with_env();

    // Apply CLI overrides
    config.format = cli.format;

    if let Some(country) = cli.country {
        config.country = country;
    }
    if let Some(state) = cli.state {
        config.state = state;
    }
    if let Some(output) = cli.output {
        config.output = output;
    }
    if let Some(proxy) = cli.proxy {
        config.proxy = Some(proxy);
    }

    config.min_price = cli.min_price.or(config.min_price);
    config.max_price = cli.max_price.or(config.max_price);
    config.no_price_included |= cli.no_price_included;
    config.min_ratings = cli.min_ratings.or(config.min_ratings);
    config.max_ratings = cli.max_ratings.or(config.max_ratings);
    config.min_average = cli.min_average.or(config.min_average);
    config.max_average = cli.max_average.or(config.max_average);

    let format = config.format;
    let cmd = CrawlCommand::new(config);
    let result = match load_error {
        Some(e) => CrawlResult::from_error(&e),
        None => cmd.execute(&cli.name).await,
    };

    cmd.write_output(&result)?;
    println!("{}", Formatter::new(format).format_result(&result)?);

    Ok(())
}
