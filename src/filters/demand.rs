//! Demand filters: search volume, search growth and units sold.

use super::Filter;
use crate::seller::NicheMetrics;

/// Requires at least `min` searches over 360 days.
pub struct SearchVolumeFilter {
    min: f64,
}

impl SearchVolumeFilter {
    pub fn new(min: f64) -> Self {
        Self { min }
    }
}

impl Filter for SearchVolumeFilter {
    fn matches(&self, niche: &NicheMetrics) -> bool {
        niche.search_volume >= self.min
    }

    fn description(&self) -> String {
        format!("Search volume: >= {}", self.min)
    }
}

/// Requires 180-day search growth strictly above `min`.
///
/// Strict so that flat niches never pass a zero threshold.
pub struct GrowthFilter {
    min: f64,
}

impl GrowthFilter {
    pub fn new(min: f64) -> Self {
        Self { min }
    }
}

impl Filter for GrowthFilter {
    fn matches(&self, niche: &NicheMetrics) -> bool {
        niche.growth_ratio > self.min
    }

    fn description(&self) -> String {
        format!("Growth: > {:.2}%", self.min * 100.0)
    }
}

/// Requires at least `min` units sold (360-day max average).
pub struct UnitsSoldFilter {
    min: f64,
}

impl UnitsSoldFilter {
    pub fn new(min: f64) -> Self {
        Self { min }
    }
}

impl Filter for UnitsSoldFilter {
    fn matches(&self, niche: &NicheMetrics) -> bool {
        niche.units_sold >= self.min
    }

    fn description(&self) -> String {
        format!("Units sold: >= {}", self.min)
    }
}
