//! HTML parser for Vivino search results and session state.

use crate::vivino::models::Record;
use crate::vivino::selectors::{search, session};
use regex_lite::Regex;
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;
use thiserror::Error;
use tracing::{debug, trace};

/// Quoted URL inside a `background-image` declaration.
static QUOTED_URL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"["']([^"']+)["']"#).unwrap());

/// Unquoted `url(...)` form.
static BARE_URL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"url\(\s*([^)\s]+)\s*\)").unwrap());

static COUNTRY_ASSIGNMENT: LazyLock<Regex> =
    LazyLock::new(|| global_assignment(session::COUNTRY_GLOBAL));

static STATE_ASSIGNMENT: LazyLock<Regex> =
    LazyLock::new(|| global_assignment(session::STATE_GLOBAL));

fn global_assignment(name: &str) -> Regex {
    Regex::new(&format!(r#"{}\s*=\s*["']([^"']*)["']"#, name)).unwrap()
}

/// Errors raised while extracting records from a page.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("wine card #{card} is missing its {field}")]
    MissingField { card: usize, field: &'static str },
}

/// Turns a rendered listing page into records.
pub trait Extractor: Send + Sync {
    /// Extracts every wine card present on the page, in document order.
    fn extract(&self, page: &str) -> Result<Vec<Record>, ExtractError>;
}

/// Parser for Vivino HTML pages.
pub struct Parser {
    base_url: String,
}

impl Parser {
    /// Creates a parser resolving relative links against `base_url`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self { base_url: base_url.into().trim_end_matches('/').to_string() }
    }

    /// Parses search results HTML into records.
    pub fn parse_search(&self, html: &str) -> Result<Vec<Record>, ExtractError> {
        let document = Html::parse_document(html);

        let records = document
            .select(&search::CARD)
            .enumerate()
            .map(|(index, card)| self.parse_card(index, card))
            .collect::<Result<Vec<_>, _>>()?;

        debug!("Parsed {} wine cards", records.len());
        Ok(records)
    }

    /// Parses a single wine card.
    fn parse_card(&self, index: usize, card: ElementRef) -> Result<Record, ExtractError> {
        let missing = |field: &'static str| ExtractError::MissingField { card: index, field };

        let name = text_of(card, &search::NAME).ok_or_else(|| missing("name"))?;

        let link = card
            .select(&search::LINK)
            .next()
            .and_then(|e| e.value().attr("href"))
            .map(|href| self.absolute_url(href))
            .ok_or_else(|| missing("link"))?;

        let thumbnail = card
            .select(&search::THUMBNAIL)
            .next()
            .and_then(|e| e.value().attr("style"))
            .and_then(|style| self.parse_thumbnail(style));

        let country = text_of(card, &search::COUNTRY).ok_or_else(|| missing("country"))?;
        let region = text_of(card, &search::REGION).ok_or_else(|| missing("region"))?;

        let average_rating =
            text_of(card, &search::AVERAGE_RATING).and_then(|text| parse_number(&text));

        let rating_count =
            text_of(card, &search::RATING_COUNT).and_then(|text| parse_rating_count(&text));

        let price = text_of(card, &search::PRICE).and_then(|text| parse_number(&text));

        trace!("Parsed wine: {} ({}, {})", name, country, region);

        Ok(Record { name, link, thumbnail, country, region, average_rating, rating_count, price })
    }

    /// Pulls the image URL out of a `background-image` style declaration.
    fn parse_thumbnail(&self, style: &str) -> Option<String> {
        let captures = QUOTED_URL.captures(style).or_else(|| BARE_URL.captures(style))?;
        let url = captures.get(1)?.as_str().trim();

        if url.is_empty() {
            return None;
        }

        Some(self.absolute_url(url))
    }

    /// Makes a link absolute, adding the scheme to scheme-relative URLs.
    fn absolute_url(&self, href: &str) -> String {
        let href = href.trim();
        if href.starts_with("http://") || href.starts_with("https://") {
            href.to_string()
        } else if let Some(rest) = href.strip_prefix("//") {
            format!("https://{}", rest)
        } else if href.starts_with('/') {
            format!("{}{}", self.base_url, href)
        } else {
            format!("{}/{}", self.base_url, href)
        }
    }
}

impl Extractor for Parser {
    fn extract(&self, page: &str) -> Result<Vec<Record>, ExtractError> {
        self.parse_search(page)
    }
}

/// Returns the trimmed text of the first match, if any.
fn text_of(element: ElementRef, selector: &Selector) -> Option<String> {
    element.select(selector).next().map(|e| e.text().collect::<String>().trim().to_string())
}

/// Parses a locale-formatted number such as "$1,234.50", "4,2" or "12,50 €".
///
/// Everything but digits, commas and periods is dropped. When both separators
/// appear the last one is the decimal point. A separator that occurs once is
/// a decimal point unless exactly three digits follow it, in which case it
/// groups thousands like a repeated separator does.
pub fn parse_number(text: &str) -> Option<f64> {
    let cleaned: String =
        text.chars().filter(|c| c.is_ascii_digit() || *c == ',' || *c == '.').collect();

    if !cleaned.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }

    let last_comma = cleaned.rfind(',');
    let last_period = cleaned.rfind('.');

    // A lone separator with exactly three digits after it groups thousands
    let lone_decimal = |at: usize, separator: char| {
        cleaned.matches(separator).count() == 1 && (at == 0 || cleaned.len() - at - 1 != 3)
    };

    let decimal_at = match (last_comma, last_period) {
        (Some(comma), Some(period)) => Some(comma.max(period)),
        (Some(comma), None) if lone_decimal(comma, ',') => Some(comma),
        (None, Some(period)) if lone_decimal(period, '.') => Some(period),
        _ => None,
    };

    let normalized: String = cleaned
        .char_indices()
        .filter_map(|(i, c)| {
            if c.is_ascii_digit() {
                Some(c)
            } else if Some(i) == decimal_at {
                Some('.')
            } else {
                None
            }
        })
        .collect();

    normalized.parse().ok()
}

/// Parses a rating count such as "120 ratings" or "1,234 ratings".
pub fn parse_rating_count(text: &str) -> Option<u64> {
    let singular = search::RATING_COUNT_LABEL.trim_end_matches('s');
    let stripped = text.replacen(search::RATING_COUNT_LABEL, "", 1);
    let stripped = stripped.trim().trim_end_matches(singular);

    let digits: String =
        stripped.chars().filter(|c| !c.is_whitespace() && *c != ',' && *c != '.').collect();

    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }

    digits.parse().ok()
}

/// Reads the active ship-to country and state from the page's inline scripts.
///
/// Returns `None` when the page carries no country; a missing state reads as
/// an empty string.
pub fn parse_active_region(html: &str) -> Option<(String, String)> {
    let document = Html::parse_document(html);
    let mut country = None;
    let mut state = None;

    for script in document.select(&session::SCRIPT) {
        let source = script.text().collect::<String>();

        if country.is_none() {
            country = capture(&COUNTRY_ASSIGNMENT, &source);
        }
        if state.is_none() {
            state = capture(&STATE_ASSIGNMENT, &source);
        }
        if country.is_some() && state.is_some() {
            break;
        }
    }

    country.map(|country| (country, state.unwrap_or_default()))
}

/// Reads the CSRF token from the page's meta tags.
pub fn parse_csrf_token(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    document
        .select(&session::CSRF_TOKEN)
        .next()
        .and_then(|e| e.value().attr("content"))
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
}

fn capture(regex: &Regex, haystack: &str) -> Option<String> {
    regex.captures(haystack).and_then(|c| c.get(1)).map(|m| m.as_str().to_string())
}
