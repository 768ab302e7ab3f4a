//! Output formatting for crawl results (table, JSON, CSV).

use crate::config::OutputFormat;
use crate::vivino::{CrawlResult, Record};
use anyhow::{Context, Result};

/// Formats crawl results for output.
pub struct Formatter {
    format: OutputFormat,
}

impl Formatter {
    /// Creates a new formatter.
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Formats a whole crawl result.
    pub fn format_result(&self, result: &CrawlResult) -> Result<String> {
        Ok(match self.format {
            OutputFormat::Json => json_document(result)?,
            OutputFormat::Table => self.table_result(result),
            OutputFormat::Csv => self.csv_records(&result.records),
        })
    }

    // Table formatting

    fn table_result(&self, result: &CrawlResult) -> String {
        let mut lines = Vec::new();

        if result.records.is_empty() {
            lines.push("No wines found.".to_string());
        } else {
            lines.push(self.table_records(&result.records));
        }

        lines.push(String::new());
        lines.push(status_line(result));

        lines.join("\n")
    }

    fn table_records(&self, records: &[Record]) -> String {
        let price_width = 10;
        let rating_width = 6;
        let count_width = 8;
        let name_width = 50;

        let mut lines = Vec::new();

        // Header
        lines.push(format!(
            "{:<price_width$}  {:<rating_width$}  {:<count_width$}  {:<name_width$}  {}",
            "Price", "Rating", "Ratings", "Name", "Origin"
        ));
        lines.push(format!(
            "{:-<price_width$}  {:-<rating_width$}  {:-<count_width$}  {:-<name_width$}  {:-<20}",
            "", "", "", "", ""
        ));

        // Rows
        for record in records {
            let price_str = record.price.map_or("N/A".to_string(), |p| format!("{:.2}", p));
            let rating_str =
                record.average_rating.map_or("N/A".to_string(), |r| format!("{:.1}", r));
            let count_str = record.rating_count.map_or("N/A".to_string(), |c| c.to_string());

            lines.push(format!(
                "{:>price_width$}  {:>rating_width$}  {:>count_width$}  {:<name_width$}  {}, {}",
                price_str,
                rating_str,
                count_str,
                truncate(&record.name, name_width),
                record.region,
                record.country
            ));
        }

        lines.push(String::new());
        lines.push(format!("Total: {} wines", records.len()));

        lines.join("\n")
    }

    // CSV formatting

    fn csv_header(&self) -> String {
        "name,country,region,price,average_rating,rating_count,link,thumbnail".to_string()
    }

    fn csv_records(&self, records: &[Record]) -> String {
        let mut lines = Vec::new();
        lines.push(self.csv_header());

        for record in records {
            lines.push(format!(
                "{},{},{},{},{},{},{},{}",
                Self::csv_escape(&record.name),
                Self::csv_escape(&record.country),
                Self::csv_escape(&record.region),
                record.price.map(|p| p.to_string()).unwrap_or_default(),
                record.average_rating.map(|r| r.to_string()).unwrap_or_default(),
                record.rating_count.map(|c| c.to_string()).unwrap_or_default(),
                record.link,
                record.thumbnail.as_deref().unwrap_or_default()
            ));
        }

        lines.join("\n")
    }

    fn csv_escape(s: &str) -> String {
        if s.contains(',') || s.contains('"') || s.contains('\n') {
            format!("\"{}\"", s.replace('"', "\"\""))
        } else {
            s.to_string()
        }
    }
}

/// Pretty-printed JSON document of a crawl result.
pub fn json_document(result: &CrawlResult) -> Result<String> {
    serde_json::to_string_pretty(result).context("Failed to serialize crawl result")
}

/// One-line summary of how the crawl ended.
pub fn status_line(result: &CrawlResult) -> String {
    let mut line = match result.status {
        Some(status) if result.is_finished() => format!("Status: {}", status),
        _ => "Status: UNFINISHED".to_string(),
    };

    if let (Some(http_status), Some(index)) = (result.http_status, result.failed_page_index) {
        line.push_str(&format!(" (HTTP {} on page {})", http_status, index));
    }
    if let Some(message) = &result.error_message {
        line.push_str(&format!(" - {}", message));
    }

    line
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() > width {
        let cut: String = text.chars().take(width - 3).collect();
        format!("{}...", cut)
    } else {
        text.to_string()
    }
}
