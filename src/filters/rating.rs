//! Rating count and average rating filters.

use super::{within, Filter};
use crate::vivino::Record;

/// Filters records by number of ratings. Records without a count pass.
pub struct RatingCountFilter {
    min: Option<u64>,
    max: Option<u64>,
}

impl RatingCountFilter {
    pub fn new(min: Option<u64>, max: Option<u64>) -> Self {
        Self { min, max }
    }
}

impl Filter for RatingCountFilter {
    fn matches(&self, record: &Record) -> bool {
        record.rating_count.is_none_or(|count| within(count, self.min, self.max))
    }

    fn description(&self) -> String {
        match (self.min, self.max) {
            (Some(min), Some(max)) => format!("Ratings: {} - {}", min, max),
            (Some(min), None) => format!("Ratings: >= {}", min),
            (None, Some(max)) => format!("Ratings: <= {}", max),
            (None, None) => "Ratings: any".to_string(),
        }
    }
}

/// Filters records by average rating. Unrated records pass.
pub struct AverageRatingFilter {
    min: Option<f64>,
    max: Option<f64>,
}

impl AverageRatingFilter {
    pub fn new(min: Option<f64>, max: Option<f64>) -> Self {
        Self { min, max }
    }
}

impl Filter for AverageRatingFilter {
    fn matches(&self, record: &Record) -> bool {
        record.average_rating.is_none_or(|average| within(average, self.min, self.max))
    }

    fn description(&self) -> String {
        match (self.min, self.max) {
            (Some(min), Some(max)) => format!("Average: {:.1} - {:.1}", min, max),
            (Some(min), None) => format!("Average: >= {:.1}", min),
            (None, Some(max)) => format!("Average: <= {:.1}", max),
            (None, None) => "Average: any".to_string(),
        }
    }
}
