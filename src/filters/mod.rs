//! Record filtering system with composable filters.

pub mod price;
pub mod rating;

use crate::vivino::Record;
use serde::{Deserialize, Serialize};

pub use price::PriceFilter;
pub use rating::{AverageRatingFilter, RatingCountFilter};

/// Trait for filtering records.
pub trait Filter: Send + Sync {
    /// Returns true if the record passes the filter.
    fn matches(&self, record: &Record) -> bool;

    /// Returns a description of this filter.
    fn description(&self) -> String;
}

/// Numeric bounds applied to crawled records. Unset bounds do not constrain.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterCriteria {
    #[serde(default)]
    pub min_price: Option<f64>,
    #[serde(default)]
    pub max_price: Option<f64>,
    #[serde(default)]
    pub min_rating_count: Option<u64>,
    #[serde(default)]
    pub max_rating_count: Option<u64>,
    #[serde(default)]
    pub min_average_rating: Option<f64>,
    #[serde(default)]
    pub max_average_rating: Option<f64>,
    /// Keep unpriced records when a minimum price is set
    #[serde(default)]
    pub include_records_missing_price: bool,
}

impl FilterCriteria {
    /// Returns true if no bound is set.
    pub fn is_unbounded(&self) -> bool {
        self.min_price.is_none()
            && self.max_price.is_none()
            && self.min_rating_count.is_none()
            && self.max_rating_count.is_none()
            && self.min_average_rating.is_none()
            && self.max_average_rating.is_none()
    }
}

/// Returns the records satisfying `criteria`, in their original order.
pub fn filter(records: &[Record], criteria: &FilterCriteria) -> Vec<Record> {
    FilterChainBuilder::from_criteria(criteria).build().apply(records)
}

/// A chain of filters that must all pass.
pub struct FilterChain {
    filters: Vec<Box<dyn Filter>>,
}

impl FilterChain {
    /// Creates an empty filter chain.
    pub fn new() -> Self {
        Self { filters: Vec::new() }
    }

    /// Adds a filter to the chain.
    pub fn add(&mut self, filter: impl Filter + 'static) -> &mut Self {
        self.filters.push(Box::new(filter));
        self
    }

    /// Checks if a record passes all filters.
    pub fn matches(&self, record: &Record) -> bool {
        self.filters.iter().all(|f| f.matches(record))
    }

    /// Returns the matching records without touching the input.
    pub fn apply(&self, records: &[Record]) -> Vec<Record> {
        records.iter().filter(|r| self.matches(r)).cloned().collect()
    }

    /// Returns true if no filters are configured.
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Returns the number of filters.
    pub fn len(&self) -> usize {
        self.filters.len()
    }

    /// Returns descriptions of all filters.
    pub fn descriptions(&self) -> Vec<String> {
        self.filters.iter().map(|f| f.description()).collect()
    }
}

impl Default for FilterChain {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for constructing a FilterChain from criteria.
pub struct FilterChainBuilder {
    chain: FilterChain,
}

impl FilterChainBuilder {
    /// Creates a new builder.
    pub fn new() -> Self {
        Self { chain: FilterChain::new() }
    }

    /// Creates a builder with every bound of `criteria` applied.
    pub fn from_criteria(criteria: &FilterCriteria) -> Self {
        Self::new()
            .price_range(
                criteria.min_price,
                criteria.max_price,
                criteria.include_records_missing_price,
            )
            .rating_count(criteria.min_rating_count, criteria.max_rating_count)
            .average_rating(criteria.min_average_rating, criteria.max_average_rating)
    }

    /// Adds a price range filter.
    pub fn price_range(
        mut self,
        min: Option<f64>,
        max: Option<f64>,
        include_missing_price: bool,
    ) -> Self {
        if min.is_some() || max.is_some() {
            self.chain.add(PriceFilter::new(min, max).include_missing_price(include_missing_price));
        }
        self
    }

    /// Adds a rating count range filter.
    pub fn rating_count(mut self, min: Option<u64>, max: Option<u64>) -> Self {
        if min.is_some() || max.is_some() {
            self.chain.add(RatingCountFilter::new(min, max));
        }
        self
    }

    /// Adds an average rating range filter.
    pub fn average_rating(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        if min.is_some() || max.is_some() {
            self.chain.add(AverageRatingFilter::new(min, max));
        }
        self
    }

    /// Builds the filter chain.
    pub fn build(self) -> FilterChain {
        self.chain
    }
}

impl Default for FilterChainBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// True when `value` lies within the optional inclusive bounds.
pub(crate) fn within<T: PartialOrd>(value: T, min: Option<T>, max: Option<T>) -> bool {
    min.is_none_or(|min| value >= min) && max.is_none_or(|max| value <= max)
}
