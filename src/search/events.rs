//! Observer interface of the pipeline: log lines, typed progress events, results.

use crate::search::progress::ProgressEstimator;
use crate::seller::NicheResult;
use chrono::{DateTime, Local};

/// Receives human-readable log lines.
pub trait LogSink {
    fn log(&mut self, line: &str);
}

impl LogSink for Vec<String> {
    fn log(&mut self, line: &str) {
        self.push(line.to_string());
    }
}

/// Typed progress signals emitted next to the log lines that announce them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressEvent {
    /// A keyword search returned `count` candidates to analyze.
    CandidatesFound { count: usize },
    /// One candidate had its detail fetched and was evaluated.
    CandidateChecked,
    /// The keyword list was exhausted.
    RunFinished,
    /// The run stopped at a keyword boundary after cancellation.
    RunCancelled,
}

/// Everything the pipeline reports to its caller.
pub trait SearchObserver: LogSink + Send {
    /// Called with typed progress events.
    fn on_event(&mut self, _event: ProgressEvent) {}

    /// Called once per niche that passed every threshold.
    fn on_result(&mut self, result: NicheResult);

    /// Called when a run starts, before its first log line.
    fn reset(&mut self) {}
}

/// A timestamped log line.
#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    pub at: DateTime<Local>,
    pub message: String,
}

impl LogEntry {
    /// Formats as `[HH:MM:SS] message`.
    pub fn display(&self) -> String {
        format!("[{}] {}", self.at.format("%H:%M:%S"), self.message)
    }
}

/// In-memory observer: keeps the log, the ordered results and the progress estimate.
#[derive(Debug, Default)]
pub struct RunLog {
    entries: Vec<LogEntry>,
    results: Vec<NicheResult>,
    progress: ProgressEstimator,
}

impl RunLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    /// Log messages without timestamps.
    pub fn messages(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.message.as_str()).collect()
    }

    pub fn results(&self) -> &[NicheResult] {
        &self.results
    }

    pub fn into_results(self) -> Vec<NicheResult> {
        self.results
    }

    pub fn progress(&self) -> &ProgressEstimator {
        &self.progress
    }

    /// The most recent entry, if any.
    pub fn last(&self) -> Option<&LogEntry> {
        self.entries.last()
    }
}

impl LogSink for RunLog {
    fn log(&mut self, line: &str) {
        self.entries.push(LogEntry { at: Local::now(), message: line.to_string() });
    }
}

impl SearchObserver for RunLog {
    fn on_event(&mut self, event: ProgressEvent) {
        self.progress.observe(event);
    }

    fn on_result(&mut self, result: NicheResult) {
        self.results.push(result);
    }

    fn reset(&mut self) {
        self.entries.clear();
        self.results.clear();
        self.progress = ProgressEstimator::new();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_result(id: &str) -> NicheResult {
        NicheResult {
            niche_id: id.to_string(),
            niche_title: format!("Niche {}", id),
            total_search_volumes: 0.0,
            growth_percentage: 0.0,
            total_units_sold: 0.0,
            avg_price: 0.0,
            avg_reviews_number: 0.0,
            new_products_launched: 0.0,
            successful_products_launched: 0.0,
        }
    }

    #[test]
    fn test_vec_log_sink() {
        let mut lines: Vec<String> = Vec::new();
        lines.log("hello");
        assert_eq!(lines, vec!["hello".to_string()]);
    }

    #[test]
    fn test_run_log_records_in_order() {
        let mut log = RunLog::new();
        log.log("first");
        log.on_result(make_result("A"));
        log.log("second");
        log.on_result(make_result("B"));

        assert_eq!(log.messages(), vec!["first", "second"]);
        assert_eq!(log.results()[0].niche_id, "A");
        assert_eq!(log.results()[1].niche_id, "B");
        assert_eq!(log.last().unwrap().message, "second");
    }

    #[test]
    fn test_run_log_feeds_progress() {
        let mut log = RunLog::new();
        log.on_event(ProgressEvent::CandidatesFound { count: 4 });
        log.on_event(ProgressEvent::CandidateChecked);

        assert_eq!(log.progress().total(), 4);
        assert_eq!(log.progress().done(), 1);
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut log = RunLog::new();
        log.log("old");
        log.on_result(make_result("A"));
        log.on_event(ProgressEvent::CandidatesFound { count: 2 });

        log.reset();

        assert!(log.entries().is_empty());
        assert!(log.results().is_empty());
        assert_eq!(log.progress().total(), 0);
    }

    #[test]
    fn test_entry_display_has_timestamp() {
        let mut log = RunLog::new();
        log.log("Search process finished.");
        let shown = log.entries()[0].display();

        assert!(shown.starts_with('['));
        assert_eq!(&shown[9..11], "] ");
        assert!(shown.ends_with("Search process finished."));
    }
}
