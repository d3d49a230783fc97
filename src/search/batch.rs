//! Batch runs over a keyword list, with validation and cooperative cancellation.

use crate::search::events::{ProgressEvent, SearchObserver};
use crate::search::finder::{KeywordReport, NicheFinder};
use crate::search::SearchCriteria;
use crate::seller::transport::Transport;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// How a batch run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Required input was missing; nothing was sent.
    Invalid,
    /// Another run was already in progress on this driver.
    AlreadyRunning,
    /// Cancelled at a keyword boundary.
    Cancelled { reports: Vec<KeywordReport> },
    /// Every keyword was processed.
    Completed { reports: Vec<KeywordReport> },
}

impl RunOutcome {
    pub fn reports(&self) -> &[KeywordReport] {
        match self {
            RunOutcome::Cancelled { reports } | RunOutcome::Completed { reports } => reports,
            RunOutcome::Invalid | RunOutcome::AlreadyRunning => &[],
        }
    }
}

/// Splits keyword text on newlines, trimming and dropping blank lines.
pub fn parse_keywords(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Stops the current run of a [`BatchDriver`] before its next keyword.
///
/// Cancelling while no run is in progress does nothing. Every run starts
/// with a fresh token, so a cancel never leaks into a later run.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle {
    state: Arc<Mutex<RunState>>,
}

#[derive(Debug, Default)]
struct RunState {
    running: bool,
    token: CancellationToken,
}

impl CancelHandle {
    pub fn cancel(&self) {
        let state = self.lock();
        if state.running {
            state.token.cancel();
        }
    }

    /// Whether a run is in progress.
    pub fn is_running(&self) -> bool {
        self.lock().running
    }

    fn lock(&self) -> MutexGuard<'_, RunState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Marks a run as started and arms a new token, or `None` if one is already running.
    fn begin(&self) -> Option<RunGuard> {
        let mut state = self.lock();
        if state.running {
            return None;
        }
        state.running = true;
        state.token = CancellationToken::new();
        Some(RunGuard { handle: self.clone(), token: state.token.clone() })
    }
}

/// Clears the running flag when the run ends, including when its future is dropped.
struct RunGuard {
    handle: CancelHandle,
    token: CancellationToken,
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        self.handle.lock().running = false;
    }
}

/// Drives a [`NicheFinder`] over a list of keywords, one at a time.
pub struct BatchDriver<T> {
    finder: NicheFinder<T>,
    control: CancelHandle,
}

impl<T: Transport> BatchDriver<T> {
    pub fn new(finder: NicheFinder<T>) -> Self {
        Self { finder, control: CancelHandle::default() }
    }

    pub fn finder(&self) -> &NicheFinder<T> {
        &self.finder
    }

    /// Handle that stops the current run before its next keyword.
    pub fn cancel_handle(&self) -> CancelHandle {
        self.control.clone()
    }

    pub fn cancel(&self) {
        self.control.cancel();
    }

    /// Runs every keyword in `keywords_text` with the settings of `template`.
    pub async fn run<O: SearchObserver>(
        &self,
        keywords_text: &str,
        template: &SearchCriteria,
        observer: &mut O,
    ) -> RunOutcome {
        if keywords_text.trim().is_empty() || !template.auth.is_complete() {
            observer.log("Please fill in all required fields: CSRF Token, Cookie, and Keywords.");
            return RunOutcome::Invalid;
        }

        let Some(guard) = self.control.begin() else {
            debug!("Run requested while another is in progress");
            return RunOutcome::AlreadyRunning;
        };

        self.run_keywords(keywords_text, template, &guard.token, observer).await
    }

    async fn run_keywords<O: SearchObserver>(
        &self,
        keywords_text: &str,
        template: &SearchCriteria,
        cancel: &CancellationToken,
        observer: &mut O,
    ) -> RunOutcome {
        observer.reset();
        observer.log(&format!(
            "Starting search process for {} marketplace...",
            template.country_code()
        ));

        let keywords = parse_keywords(keywords_text);
        observer.log(&format!("Found {} keywords to process.", keywords.len()));

        let mut reports = Vec::with_capacity(keywords.len());
        for keyword in &keywords {
            if cancel.is_cancelled() {
                info!("Run cancelled after {} keywords", reports.len());
                observer.log("Search process was cancelled.");
                observer.on_event(ProgressEvent::RunCancelled);
                return RunOutcome::Cancelled { reports };
            }
            reports.push(self.finder.search(&template.with_keyword(keyword), observer).await);
        }

        info!("Run finished: {} keywords", reports.len());
        observer.log("Search process finished.");
        observer.on_event(ProgressEvent::RunFinished);
        RunOutcome::Completed { reports }
    }
}
