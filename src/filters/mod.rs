//! Niche filtering: the five thresholds as a composable filter chain.

pub mod demand;
pub mod price;
pub mod reviews;

use crate::seller::NicheMetrics;
use serde::{Deserialize, Serialize};

pub use demand::{GrowthFilter, SearchVolumeFilter, UnitsSoldFilter};
pub use price::PriceFilter;
pub use reviews::ReviewsFilter;

/// Trait for filtering niches.
pub trait Filter: Send + Sync {
    /// Returns true if the niche passes the filter.
    fn matches(&self, niche: &NicheMetrics) -> bool;

    /// Returns a description of this filter.
    fn description(&self) -> String;
}

/// User-defined thresholds a niche must meet.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterThresholds {
    pub min_search_volume: f64,
    pub min_growth_ratio: f64,
    pub min_units_sold: f64,
    pub min_price: f64,
    pub max_reviews: f64,
}

impl Default for FilterThresholds {
    fn default() -> Self {
        Self {
            min_search_volume: 360_000.0,
            min_growth_ratio: 0.0,
            min_units_sold: 1000.0,
            min_price: 20.0,
            max_reviews: 1000.0,
        }
    }
}

impl FilterThresholds {
    /// Coerces every field to a finite, non-negative number.
    pub fn sanitized(self) -> Self {
        Self {
            min_search_volume: coerce_threshold(self.min_search_volume),
            min_growth_ratio: coerce_threshold(self.min_growth_ratio),
            min_units_sold: coerce_threshold(self.min_units_sold),
            min_price: coerce_threshold(self.min_price),
            max_reviews: coerce_threshold(self.max_reviews),
        }
    }
}

fn coerce_threshold(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

/// Parses user input for a threshold; anything invalid becomes 0.
///
/// Never fails, so it can back a clap `value_parser`.
pub fn parse_threshold(raw: &str) -> Result<f64, std::convert::Infallible> {
    Ok(coerce_threshold(raw.trim().parse::<f64>().unwrap_or(0.0)))
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

    /// Builds the full five-threshold chain.
    pub fn from_thresholds(thresholds: &FilterThresholds) -> Self {
        let t = thresholds.sanitized();
        FilterChainBuilder::new()
            .min_search_volume(t.min_search_volume)
            .min_growth_ratio(t.min_growth_ratio)
            .min_units_sold(t.min_units_sold)
            .min_price(t.min_price)
            .max_reviews(t.max_reviews)
            .build()
    }

    /// Adds a filter to the chain.
    pub fn add(&mut self, filter: impl Filter + 'static) -> &mut Self {
        self.filters.push(Box::new(filter));
        self
    }

    /// Checks if a niche passes all filters.
    pub fn matches(&self, niche: &NicheMetrics) -> bool {
        self.filters.iter().all(|f| f.matches(niche))
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

/// Builder for constructing a FilterChain.
pub struct FilterChainBuilder {
    chain: FilterChain,
}

impl FilterChainBuilder {
    /// Creates a new builder.
    pub fn new() -> Self {
        Self { chain: FilterChain::new() }
    }

    pub fn min_search_volume(mut self, min: f64) -> Self {
        self.chain.add(SearchVolumeFilter::new(min));
        self
    }

    pub fn min_growth_ratio(mut self, min: f64) -> Self {
        self.chain.add(GrowthFilter::new(min));
        self
    }

    pub fn min_units_sold(mut self, min: f64) -> Self {
        self.chain.add(UnitsSoldFilter::new(min));
        self
    }

    pub fn min_price(mut self, min: f64) -> Self {
        self.chain.add(PriceFilter::new(min));
        self
    }

    pub fn max_reviews(mut self, max: f64) -> Self {
        self.chain.add(ReviewsFilter::new(max));
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

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn make_niche(volume: f64, growth: f64, units: f64, price: f64, reviews: f64) -> NicheMetrics {
        NicheMetrics {
            search_volume: volume,
            growth_ratio: growth,
            units_sold: units,
            avg_price: price,
            avg_reviews: reviews,
            new_launches: 0.0,
            successful_launches: 0.0,
        }
    }

    fn default_chain() -> FilterChain {
        FilterChain::from_thresholds(&FilterThresholds::default())
    }

    #[test]
    fn test_default_thresholds() {
        let t = FilterThresholds::default();
        assert_eq!(t.min_search_volume, 360000.0);
        assert_eq!(t.min_growth_ratio, 0.0);
        assert_eq!(t.min_units_sold, 1000.0);
        assert_eq!(t.min_price, 20.0);
        assert_eq!(t.max_reviews, 1000.0);
    }

    #[test]
    fn test_sanitized_coerces_invalid() {
        let t = FilterThresholds {
            min_search_volume: -5.0,
            min_growth_ratio: f64::NAN,
            min_units_sold: f64::INFINITY,
            min_price: 12.5,
            max_reviews: -0.0,
        }
        .sanitized();

        assert_eq!(t.min_search_volume, 0.0);
        assert_eq!(t.min_growth_ratio, 0.0);
        assert_eq!(t.min_units_sold, 0.0);
        assert_eq!(t.min_price, 12.5);
        assert_eq!(t.max_reviews, 0.0);
    }

    #[test]
    fn test_parse_threshold() {
        assert_eq!(parse_threshold("1000").unwrap(), 1000.0);
        assert_eq!(parse_threshold(" 0.25 ").unwrap(), 0.25);
        assert_eq!(parse_threshold("abc").unwrap(), 0.0);
        assert_eq!(parse_threshold("").unwrap(), 0.0);
        assert_eq!(parse_threshold("-3").unwrap(), 0.0);
    }

    #[test]
    fn test_thresholds_from_partial_toml() {
        let t: FilterThresholds = toml::from_str("min_price = 35.0").unwrap();
        assert_eq!(t.min_price, 35.0);
        assert_eq!(t.min_search_volume, 360000.0);
    }

    #[test]
    fn test_chain_has_five_filters() {
        let chain = default_chain();
        assert_eq!(chain.len(), 5);
        assert!(!chain.is_empty());

        let descriptions = chain.descriptions();
        assert!(descriptions[0].contains("Search volume"));
        assert!(descriptions[1].contains("Growth"));
        assert!(descriptions[2].contains("Units"));
        assert!(descriptions[3].contains("Price"));
        assert!(descriptions[4].contains("Reviews"));
    }

    #[test]
    fn test_empty_chain_matches_all() {
        let chain = FilterChain::default();
        assert!(chain.is_empty());
        assert!(chain.matches(&make_niche(0.0, 0.0, 0.0, 0.0, 99999.0)));
    }

    #[test]
    fn test_bento_box_scenario() {
        let chain = default_chain();

        // Bento Box Set passes everything
        assert!(chain.matches(&make_niche(500000.0, 0.1, 2000.0, 25.0, 50.0)));

        // Mini Bento fails volume and growth strictness
        assert!(!chain.matches(&make_niche(100.0, 0.0, 1.0, 5.0, 10000.0)));
    }

    #[test]
    fn test_boundaries() {
        let chain = default_chain();

        // Inclusive bounds hold exactly at the threshold
        assert!(chain.matches(&make_niche(360000.0, 0.01, 1000.0, 20.0, 1000.0)));

        // Growth equal to the minimum fails
        assert!(!chain.matches(&make_niche(360000.0, 0.0, 1000.0, 20.0, 1000.0)));

        // Just outside each inclusive bound
        assert!(!chain.matches(&make_niche(359999.0, 0.01, 1000.0, 20.0, 1000.0)));
        assert!(!chain.matches(&make_niche(360000.0, 0.01, 999.0, 20.0, 1000.0)));
        assert!(!chain.matches(&make_niche(360000.0, 0.01, 1000.0, 19.99, 1000.0)));
        assert!(!chain.matches(&make_niche(360000.0, 0.01, 1000.0, 20.0, 1000.5)));
    }

    fn expected(t: &FilterThresholds, n: &NicheMetrics) -> bool {
        n.search_volume >= t.min_search_volume
            && n.growth_ratio > t.min_growth_ratio
            && n.units_sold >= t.min_units_sold
            && n.avg_price >= t.min_price
            && n.avg_reviews <= t.max_reviews
    }

    // Each metric is the threshold plus a small offset, so values straddle every boundary.
    fn straddle(threshold: f64) -> impl Strategy<Value = f64> {
        prop_oneof![
            Just(threshold),
            Just(threshold - 1.0),
            Just(threshold + 1.0),
            0.0..2_000_000.0f64
        ]
        .prop_map(|v: f64| v.max(0.0))
    }

    proptest! {
        #[test]
        fn prop_chain_matches_iff_all_five_hold(
            volume_t in 0.0..1_000_000.0f64,
            growth_t in 0.0..5.0f64,
            units_t in 0.0..10_000.0f64,
            price_t in 0.0..500.0f64,
            reviews_t in 0.0..20_000.0f64,
            seed in any::<u64>(),
        ) {
            let thresholds = FilterThresholds {
                min_search_volume: volume_t,
                min_growth_ratio: growth_t,
                min_units_sold: units_t,
                min_price: price_t,
                max_reviews: reviews_t,
            };
            let chain = FilterChain::from_thresholds(&thresholds);

            // Derive metrics around each threshold from the seed
            let pick = |t: f64, shift: u64| match (seed >> shift) % 3 {
                0 => t,
                1 => (t - 1.0).max(0.0),
                _ => t + 1.0,
            };
            let niche = make_niche(
                pick(volume_t, 0),
                pick(growth_t, 2),
                pick(units_t, 4),
                pick(price_t, 6),
                pick(reviews_t, 8),
            );

            prop_assert_eq!(chain.matches(&niche), expected(&thresholds, &niche));
        }

        #[test]
        fn prop_chain_agrees_on_random_metrics(
            volume in straddle(360_000.0),
            growth in straddle(0.0),
            units in straddle(1000.0),
            price in straddle(20.0),
            reviews in straddle(1000.0),
        ) {
            let thresholds = FilterThresholds::default();
            let niche = make_niche(volume, growth, units, price, reviews);
            prop_assert_eq!(default_chain().matches(&niche), expected(&thresholds, &niche));
        }
    }
}
