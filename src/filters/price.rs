//! Minimum average price filter.

use super::Filter;
use crate::seller::NicheMetrics;

/// Filters niches by 360-day average price.
pub struct PriceFilter {
    min: f64,
}

impl PriceFilter {
    /// Creates a new price filter with a minimum average price.
    pub fn new(min: f64) -> Self {
        Self { min }
    }
}

impl Filter for PriceFilter {
    fn matches(&self, niche: &NicheMetrics) -> bool {
        niche.avg_price >= self.min
    }

    fn description(&self) -> String {
        format!("Price: >= {:.2}", self.min)
    }
}
