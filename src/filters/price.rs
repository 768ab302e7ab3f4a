//! Price range filter.

use super::{within, Filter};
use crate::vivino::Record;

/// Filters records by price range.
///
/// Unpriced records pass unless a minimum is set, in which case they pass
/// only when `include_missing_price` is enabled.
pub struct PriceFilter {
    min: Option<f64>,
    max: Option<f64>,
    include_missing_price: bool,
}

impl PriceFilter {
    /// Creates a new price filter with optional min/max bounds.
    pub fn new(min: Option<f64>, max: Option<f64>) -> Self {
        Self { min, max, include_missing_price: false }
    }

    /// Creates a filter with only minimum price.
    pub fn min(price: f64) -> Self {
        Self::new(Some(price), None)
    }

    /// Creates a filter with only maximum price.
    pub fn max(price: f64) -> Self {
        Self::new(None, Some(price))
    }

    /// Creates a filter with both min and max.
    pub fn range(min: f64, max: f64) -> Self {
        Self::new(Some(min), Some(max))
    }

    /// Keeps unpriced records even when a minimum price is set.
    pub fn include_missing_price(mut self, include: bool) -> Self {
        self.include_missing_price = include;
        self
    }
}

impl Filter for PriceFilter {
    fn matches(&self, record: &Record) -> bool {
        match record.price {
            Some(price) => within(price, self.min, self.max),
            None => self.min.is_none() || self.include_missing_price,
        }
    }

    fn description(&self) -> String {
        let range = match (self.min, self.max) {
            (Some(min), Some(max)) => format!("Price: {:.2} - {:.2}", min, max),
            (Some(min), None) => format!("Price: >= {:.2}", min),
            (None, Some(max)) => format!("Price: <= {:.2}", max),
            (None, None) => "Price: any".to_string(),
        };

        if self.min.is_some() && self.include_missing_price {
            format!("{} (or unpriced)", range)
        } else {
            range
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_record(price: Option<f64>) -> Record {
        Record {
            name: "Test".to_string(),
            link: "https://www.vivino.com/wines/1".to_string(),
            thumbnail: None,
            country: "Chile".to_string(),
            region: "Maipo Valley".to_string(),
            average_rating: None,
            rating_count: None,
            price,
        }
    }

    #[test]
    fn test_price_range() {
        let filter = PriceFilter::range(10.0, 50.0);

        assert!(!filter.matches(&make_record(Some(5.0))));
        assert!(filter.matches(&make_record(Some(10.0))));
        assert!(filter.matches(&make_record(Some(30.0))));
        assert!(filter.matches(&make_record(Some(50.0))));
        assert!(!filter.matches(&make_record(Some(55.0))));
    }

    #[test]
    fn test_no_price_fails_minimum() {
        let filter = PriceFilter::range(10.0, 50.0);
        assert!(!filter.matches(&make_record(None)));

        let filter = PriceFilter::min(10.0);
        assert!(!filter.matches(&make_record(None)));
    }

    #[test]
    fn test_no_price_included_on_request() {
        let filter = PriceFilter::min(10.0).include_missing_price(true);
        assert!(filter.matches(&make_record(None)));
        assert!(!filter.matches(&make_record(Some(5.0))));
    }

    #[test]
    fn test_no_price_passes_maximum() {
        let filter = PriceFilter::max(50.0);
        assert!(filter.matches(&make_record(None)));
    }

    #[test]
    fn test_max_only() {
        let filter = PriceFilter::max(50.0);
        assert!(filter.matches(&make_record(Some(10.0))));
        assert!(filter.matches(&make_record(Some(50.0))));
        assert!(!filter.matches(&make_record(Some(100.0))));
    }

    #[test]
    fn test_new_no_bounds() {
        let filter = PriceFilter::new(None, None);
        assert!(filter.matches(&make_record(Some(0.01))));
        assert!(filter.matches(&make_record(Some(1000000.0))));
        assert!(filter.matches(&make_record(None)));
    }

    #[test]
    fn test_descriptions() {
        assert_eq!(PriceFilter::range(10.0, 50.0).description(), "Price: 10.00 - 50.00");
        assert_eq!(PriceFilter::min(20.0).description(), "Price: >= 20.00");
        assert_eq!(PriceFilter::max(50.0).description(), "Price: <= 50.00");
        assert_eq!(PriceFilter::new(None, None).description(), "Price: any");
        assert_eq!(
            PriceFilter::min(20.0).include_missing_price(true).description(),
            "Price: >= 20.00 (or unpriced)"
        );
    }

    #[test]
    fn test_boundary_values() {
        let filter = PriceFilter::range(10.0, 50.0);

        assert!(filter.matches(&make_record(Some(10.0))));
        assert!(filter.matches(&make_record(Some(50.0))));
        assert!(!filter.matches(&make_record(Some(9.99))));
        assert!(!filter.matches(&make_record(Some(50.01))));
    }
}
