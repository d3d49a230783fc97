//! Per-keyword orchestration: list niches, enrich each one, keep those that pass.

use crate::error::QueryResult;
use crate::filters::FilterChain;
use crate::pacing::{Pacing, Sleeper};
use crate::search::events::{ProgressEvent, SearchObserver};
use crate::search::SearchCriteria;
use crate::seller::transport::Transport;
use crate::seller::{NicheMetrics, NicheResult, SellerCentralClient};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// What happened to one keyword.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeywordReport {
    pub keyword: String,
    /// Candidates returned by the keyword search
    pub candidates: usize,
    /// Candidates with launch data that were evaluated
    pub checked: usize,
    /// Candidates skipped for missing launch data
    pub skipped: usize,
    /// Candidates that passed every threshold
    pub matched: usize,
    /// Message of the error that aborted the keyword, if any
    pub error: Option<String>,
}

impl KeywordReport {
    fn new(keyword: &str) -> Self {
        Self { keyword: keyword.to_string(), ..Self::default() }
    }

    pub fn failed(&self) -> bool {
        self.error.is_some()
    }
}

/// Runs the niche search for one keyword at a time.
pub struct NicheFinder<T> {
    client: SellerCentralClient<T>,
    sleeper: Arc<dyn Sleeper>,
    pacing: Pacing,
}

impl<T: Transport> NicheFinder<T> {
    pub fn new(client: SellerCentralClient<T>, sleeper: Arc<dyn Sleeper>, pacing: Pacing) -> Self {
        Self { client, sleeper, pacing }
    }

    pub fn client(&self) -> &SellerCentralClient<T> {
        &self.client
    }

    /// Searches one keyword and reports every finding through `observer`.
    ///
    /// Never fails: errors end the keyword early and are reported as a log line.
    pub async fn search<O: SearchObserver>(
        &self,
        criteria: &SearchCriteria,
        observer: &mut O,
    ) -> KeywordReport {
        let keyword = criteria.keyword.as_str();
        observer.log(&format!(
            "Processing keyword: \"{}\" for {} marketplace",
            keyword,
            criteria.country_code()
        ));

        let mut report = KeywordReport::new(keyword);
        match self.analyze(criteria, observer, &mut report).await {
            Ok(false) => return report,
            Ok(true) => {}
            Err(e) => {
                warn!("Keyword {} failed: {}", keyword, e);
                observer.log(&format!("Error processing keyword \"{}\": {}", keyword, e));
                report.error = Some(e.to_string());
            }
        }

        self.sleeper.sleep(self.pacing.keyword_delay()).await;
        report
    }

    /// Returns `Ok(false)` when the keyword had no niches at all.
    async fn analyze<O: SearchObserver>(
        &self,
        criteria: &SearchCriteria,
        observer: &mut O,
        report: &mut KeywordReport,
    ) -> QueryResult<bool> {
        let keyword = criteria.keyword.as_str();
        let candidates = self
            .client
            .list_niches(keyword, &criteria.marketplace_id, &criteria.auth, observer)
            .await?;

        if candidates.is_empty() {
            observer.log(&format!("No niches found for \"{}\"", keyword));
            return Ok(false);
        }

        report.candidates = candidates.len();
        observer.log(&format!(
            "Found {} potential niches for \"{}\". Analyzing details...",
            candidates.len(),
            keyword
        ));
        observer.on_event(ProgressEvent::CandidatesFound { count: candidates.len() });

        let chain = FilterChain::from_thresholds(&criteria.thresholds);

        for candidate in &candidates {
            self.sleeper.sleep(self.pacing.candidate_delay()).await;

            let detail = self
                .client
                .niche_detail(
                    &candidate.niche_id,
                    &criteria.marketplace_id,
                    &criteria.auth,
                    observer,
                )
                .await?;

            let Some(detail) = detail else {
                debug!("No launch potential for {}", candidate.niche_id);
                observer.log(&format!(
                    "Skipping niche \"{}\" due to missing launch data.",
                    candidate.niche_title
                ));
                report.skipped += 1;
                continue;
            };

            let metrics = NicheMetrics::new(&candidate.summary(), &detail);
            observer.log(&format!(
                "  - Checking: \"{}\" (Reviews: {}, Price: {:.2})",
                candidate.niche_title, metrics.avg_reviews, metrics.avg_price
            ));
            observer.on_event(ProgressEvent::CandidateChecked);
            report.checked += 1;

            if chain.matches(&metrics) {
                info!("Niche {} passed all filters", candidate.niche_id);
                observer.log(&format!(
                    "✅ Found a promising niche: \"{}\"",
                    candidate.niche_title
                ));
                observer.on_result(NicheResult::new(candidate, &metrics));
                report.matched += 1;
            }
        }

        Ok(true)
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use serde_json::{json, Value};

    pub fn niche(id: &str, title: &str, volume: f64, growth: f64, units: f64, price: f64) -> Value {
        json!({
            "nicheId": id,
            "nicheTitle": title,
            "nicheSummary": {
                "searchVolumeT360": volume,
                "searchVolumeGrowthT180": growth,
                "maximumAverageUnitsSoldT360": units,
                "avgPriceT360": price
            }
        })
    }

    pub fn niches_body(items: Vec<Value>) -> String {
        json!({ "data": { "niches": items } }).to_string()
    }

    pub fn detail_body(reviews: f64, launched: f64, successful: f64) -> String {
        json!({
            "data": {
                "niche": {
                    "launchPotential": {
                        "avgReviewCount": { "currentValue": reviews },
                        "newProductsLaunchedT360": { "currentValue": launched },
                        "successfulLaunchesT360": { "currentValue": successful }
                    }
                }
            }
        })
        .to_string()
    }

    pub fn missing_detail_body() -> String {
        json!({ "data": { "niche": { "launchPotential": null } } }).to_string()
    }

    /// The two-niche "bento box" keyword: one passes every threshold, one fails several.
    pub fn bento_bodies() -> Vec<String> {
        vec![
            niches_body(vec![
                niche("N1", "Bento Box Set", 500000.0, 0.1, 2000.0, 25.0),
                niche("N2", "Mini Bento", 100.0, 0.0, 1.0, 5.0),
            ]),
            detail_body(50.0, 10.0, 4.0),
            detail_body(10000.0, 1.0, 0.0),
        ]
    }
}
