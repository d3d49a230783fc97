//! Data models for niche candidates, launch details and matched results.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Credentials captured from an authenticated seller portal session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthContext {
    /// Value of the `anti-csrftoken-a2z` header
    pub csrf_token: String,
    /// Full cookie string of the portal session
    pub cookie: String,
    /// Country code selecting the portal host
    pub country_code: String,
}

impl AuthContext {
    pub fn new(
        csrf_token: impl Into<String>,
        cookie: impl Into<String>,
        country_code: impl Into<String>,
    ) -> Self {
        Self {
            csrf_token: csrf_token.into(),
            cookie: cookie.into(),
            country_code: country_code.into(),
        }
    }

    /// Returns the `(name, value)` pairs sent to a relay.
    ///
    /// Values are trimmed; empty fields are omitted.
    pub fn relay_headers(&self) -> Vec<(&'static str, String)> {
        [
            ("x-amz-csrf", &self.csrf_token),
            ("x-amz-cookie", &self.cookie),
            ("x-amz-country", &self.country_code),
        ]
        .into_iter()
        .filter_map(|(name, value)| {
            let value = value.trim();
            (!value.is_empty()).then(|| (name, value.to_string()))
        })
        .collect()
    }

    /// True when both the session cookie and the CSRF token are present.
    pub fn is_complete(&self) -> bool {
        !self.cookie.trim().is_empty() && !self.csrf_token.trim().is_empty()
    }
}

/// Normalizes a cookie pasted from browser dev tools into a single header line.
pub fn normalize_cookie(raw: &str) -> String {
    let single_line: String = raw.chars().filter(|c| *c != '\r' && *c != '\n').collect();
    let mut out = String::with_capacity(single_line.len());
    let mut chars = single_line.chars().peekable();

    while let Some(c) = chars.next() {
        out.push(c);
        if c == ';' {
            while chars.peek().is_some_and(|n| n.is_whitespace()) {
                chars.next();
            }
        }
    }

    out.trim().to_string()
}

/// A niche returned by the keyword search, before enrichment.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NicheCandidate {
    #[serde(default, deserialize_with = "lenient_string")]
    pub niche_id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub niche_title: String,
    #[serde(default)]
    pub niche_summary: Option<NicheSummary>,
}

impl NicheCandidate {
    /// Returns the summary, treating a missing one as all zeros.
    pub fn summary(&self) -> NicheSummary {
        self.niche_summary.clone().unwrap_or_default()
    }
}

/// Demand figures attached to each search result.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NicheSummary {
    #[serde(default, rename = "searchVolumeT360", deserialize_with = "lenient_number")]
    pub search_volume: f64,
    #[serde(default, rename = "searchVolumeGrowthT180", deserialize_with = "lenient_number")]
    pub growth_ratio: f64,
    #[serde(default, rename = "maximumAverageUnitsSoldT360", deserialize_with = "lenient_number")]
    pub units_sold: f64,
    #[serde(default, rename = "avgPriceT360", deserialize_with = "lenient_number")]
    pub avg_price: f64,
}

/// A `{ currentValue }` metric wrapper.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricValue {
    #[serde(default, deserialize_with = "lenient_number")]
    pub current_value: f64,
}

/// Raw `launchPotential` object of the detail query.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LaunchPotential {
    #[serde(default)]
    pub avg_review_count: Option<MetricValue>,
    #[serde(default, rename = "newProductsLaunchedT360")]
    pub new_products_launched: Option<MetricValue>,
    #[serde(default, rename = "successfulLaunchesT360")]
    pub successful_launches: Option<MetricValue>,
}

/// Launch-potential figures over the trailing 360 days.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct NicheDetail {
    pub avg_review_count: f64,
    pub new_products_launched: f64,
    pub successful_launches: f64,
}

impl From<LaunchPotential> for NicheDetail {
    fn from(raw: LaunchPotential) -> Self {
        let value = |m: Option<MetricValue>| m.map(|m| m.current_value).unwrap_or(0.0);
        Self {
            avg_review_count: value(raw.avg_review_count),
            new_products_launched: value(raw.new_products_launched),
            successful_launches: value(raw.successful_launches),
        }
    }
}

/// Every number the threshold filters look at, for one enriched candidate.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct NicheMetrics {
    pub search_volume: f64,
    pub growth_ratio: f64,
    pub units_sold: f64,
    pub avg_price: f64,
    pub avg_reviews: f64,
    pub new_launches: f64,
    pub successful_launches: f64,
}

impl NicheMetrics {
    pub fn new(summary: &NicheSummary, detail: &NicheDetail) -> Self {
        Self {
            search_volume: summary.search_volume,
            growth_ratio: summary.growth_ratio,
            units_sold: summary.units_sold,
            avg_price: summary.avg_price,
            avg_reviews: detail.avg_review_count,
            new_launches: detail.new_products_launched,
            successful_launches: detail.successful_launches,
        }
    }
}

/// A niche that passed every threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NicheResult {
    pub niche_id: String,
    pub niche_title: String,
    pub total_search_volumes: f64,
    /// Growth ratio × 100
    pub growth_percentage: f64,
    pub total_units_sold: f64,
    pub avg_price: f64,
    pub avg_reviews_number: f64,
    pub new_products_launched: f64,
    pub successful_products_launched: f64,
}

impl NicheResult {
    pub fn new(candidate: &NicheCandidate, metrics: &NicheMetrics) -> Self {
        Self {
            niche_id: candidate.niche_id.clone(),
            niche_title: candidate.niche_title.clone(),
            total_search_volumes: metrics.search_volume,
            growth_percentage: metrics.growth_ratio * 100.0,
            total_units_sold: metrics.units_sold,
            avg_price: metrics.avg_price,
            avg_reviews_number: metrics.avg_reviews,
            new_products_launched: metrics.new_launches,
            successful_products_launched: metrics.successful_launches,
        }
    }

    /// Link to the niche's launch-potential page on the given portal.
    pub fn portal_link(&self, portal_url: &str) -> String {
        format!(
            "{}/opportunity-explorer/explore/niche/{}/launch-potential",
            portal_url.trim_end_matches('/'),
            self.niche_id
        )
    }
}

/// Coerces a JSON value to a number: numeric strings parse, booleans are 1/0,
/// anything else (null, objects, garbage, non-finite) is 0.
pub fn coerce_number(value: &Value) -> f64 {
    let n = match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                0.0
            } else {
                s.parse::<f64>().unwrap_or(0.0)
            }
        }
        Value::Bool(b) => f64::from(u8::from(*b)),
        _ => 0.0,
    };

    if n.is_finite() {
        n
    } else {
        0.0
    }
}

fn lenient_number<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(coerce_number(&value))
}

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Null => String::new(),
        Value::String(s) => s,
        other => other.to_string(),
    })
}
