//! Progress counting and ETA estimation for a batch run.

use crate::search::events::ProgressEvent;
use regex_lite::Regex;
use std::fmt;
use std::sync::OnceLock;
use std::time::{Duration, Instant};

/// Running count of candidates analyzed against candidates discovered.
///
/// The estimate assumes a constant average time per candidate, measured from
/// the first checked candidate. It is only recomputed when a candidate is
/// checked, so the projected end time stays fixed between checks.
#[derive(Debug, Clone, Default)]
pub struct ProgressEstimator {
    total: usize,
    done: usize,
    first_check_at: Option<Instant>,
    end_by: Option<Instant>,
}

/// Point-in-time view of a run's progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressSnapshot {
    pub done: usize,
    pub total: usize,
    /// Time left until the projected end, if an estimate exists.
    pub remaining: Option<Duration>,
}

impl ProgressEstimator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn done(&self) -> usize {
        self.done
    }

    /// Projected instant at which every discovered candidate will be checked.
    pub fn end_by(&self) -> Option<Instant> {
        self.end_by
    }

    /// Applies an event observed now.
    pub fn observe(&mut self, event: ProgressEvent) {
        self.observe_at(event, Instant::now());
    }

    /// Applies an event observed at `now`.
    pub fn observe_at(&mut self, event: ProgressEvent, now: Instant) {
        match event {
            ProgressEvent::CandidatesFound { count } => {
                self.total += count;
            }
            ProgressEvent::CandidateChecked => {
                let first = *self.first_check_at.get_or_insert(now);
                self.done += 1;

                let elapsed = now.saturating_duration_since(first).max(Duration::from_millis(1));
                let avg = elapsed / self.done as u32;
                let remaining = self.total.saturating_sub(self.done);
                self.end_by = if remaining > 0 { Some(now + avg * remaining as u32) } else { None };
            }
            ProgressEvent::RunFinished | ProgressEvent::RunCancelled => {
                *self = Self::default();
            }
        }
    }

    /// Feeds a log line through [`event_from_log_line`]; unrelated lines are ignored.
    pub fn observe_line_at(&mut self, line: &str, now: Instant) {
        if let Some(event) = event_from_log_line(line) {
            self.observe_at(event, now);
        }
    }

    pub fn snapshot(&self, now: Instant) -> ProgressSnapshot {
        ProgressSnapshot {
            done: self.done,
            total: self.total,
            remaining: self.end_by.map(|end| end.saturating_duration_since(now)),
        }
    }
}

impl fmt::Display for ProgressSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{} checked", self.done, self.total)?;
        if let Some(remaining) = self.remaining {
            write!(f, ", ETA {}", format_duration(remaining))?;
        }
        Ok(())
    }
}

struct LinePatterns {
    found: Regex,
    checking: Regex,
    finished: Regex,
    cancelled: Regex,
}

fn patterns() -> Option<&'static LinePatterns> {
    static PATTERNS: OnceLock<Option<LinePatterns>> = OnceLock::new();
    PATTERNS
        .get_or_init(|| {
            Some(LinePatterns {
                found: Regex::new(r#"(?i)Found\s+(\d+)\s+potential niches for\s+""#).ok()?,
                checking: Regex::new(r"(?i)^\s*-\s*Checking:").ok()?,
                finished: Regex::new(r"(?i)Search process finished").ok()?,
                cancelled: Regex::new(r"(?i)Search process was cancelled").ok()?,
            })
        })
        .as_ref()
}

/// Recognizes the log lines that carry progress information.
///
/// Lets consumers that only see the text log derive the same events as the
/// typed stream.
pub fn event_from_log_line(line: &str) -> Option<ProgressEvent> {
    let p = patterns()?;
    if let Some(caps) = p.found.captures(line) {
        let count = caps.get(1)?.as_str().parse::<usize>().ok()?;
        return (count > 0).then_some(ProgressEvent::CandidatesFound { count });
    }
    if p.checking.is_match(line) {
        return Some(ProgressEvent::CandidateChecked);
    }
    if p.finished.is_match(line) {
        return Some(ProgressEvent::RunFinished);
    }
    if p.cancelled.is_match(line) {
        return Some(ProgressEvent::RunCancelled);
    }
    None
}

/// Formats a duration as `HH:MM:SS`, or `Nd HH:MM:SS` beyond a day.
///
/// Anything under one second renders as `00:00`.
pub fn format_duration(duration: Duration) -> String {
    let total = duration.as_secs();
    if total == 0 {
        return "00:00".to_string();
    }
    let days = total / 86_400;
    let hours = (total % 86_400) / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;
    if days > 0 {
        format!("{}d {:02}:{:02}:{:02}", days, hours, minutes, seconds)
    } else {
        format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
    }
}
