//! Maximum average review count filter.

use super::Filter;
use crate::seller::NicheMetrics;

/// Keeps niches whose incumbents have at most `max` reviews on average.
pub struct ReviewsFilter {
    max: f64,
}

impl ReviewsFilter {
    pub fn new(max: f64) -> Self {
        Self { max }
    }
}

impl Filter for ReviewsFilter {
    fn matches(&self, niche: &NicheMetrics) -> bool {
        niche.avg_reviews <= self.max
    }

    fn description(&self) -> String {
        format!("Reviews: <= {}", self.max)
    }
}
