//! Keyword-to-niche search pipeline: per-keyword orchestration, batch runs,
//! progress estimation and the observer interface they report through.

pub mod batch;
pub mod events;
pub mod finder;
pub mod progress;

pub use batch::{parse_keywords, BatchDriver, CancelHandle, RunOutcome};
pub use events::{LogEntry, LogSink, ProgressEvent, RunLog, SearchObserver};
pub use finder::{KeywordReport, NicheFinder};
pub use progress::{format_duration, ProgressEstimator, ProgressSnapshot};

use crate::filters::FilterThresholds;
use crate::seller::AuthContext;

/// Everything needed to analyze one keyword.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchCriteria {
    pub keyword: String,
    pub marketplace_id: String,
    pub auth: AuthContext,
    pub thresholds: FilterThresholds,
}

impl SearchCriteria {
    /// Criteria without a keyword, used as the template of a batch run.
    pub fn template(
        marketplace_id: impl Into<String>,
        auth: AuthContext,
        thresholds: FilterThresholds,
    ) -> Self {
        Self { keyword: String::new(), marketplace_id: marketplace_id.into(), auth, thresholds }
    }

    /// Same criteria for a different keyword.
    pub fn with_keyword(&self, keyword: impl Into<String>) -> Self {
        Self { keyword: keyword.into(), ..self.clone() }
    }

    pub fn country_code(&self) -> &str {
        &self.auth.country_code
    }
}
