//! Search command implementation.

use crate::config::{Config, OutputFormat};
use crate::format::Formatter;
use crate::pacing::{Sleeper, TokioSleeper};
use crate::search::{
    BatchDriver, LogSink, NicheFinder, ProgressEstimator, ProgressEvent, RunLog, RunOutcome,
    SearchObserver,
};
use crate::seller::transport::Transport;
use crate::seller::{NicheResult, SellerCentralClient};
use anyhow::{bail, Context, Result};
use chrono::Utc;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

const STATUS_REFRESH: Duration = Duration::from_secs(1);

/// Runs a keyword batch and formats the matched niches.
pub struct SearchCommand {
    config: Config,
    output: Option<PathBuf>,
}

impl SearchCommand {
    /// Creates a new search command.
    pub fn new(config: Config) -> Self {
        Self { config, output: None }
    }

    /// Also export the results to `path`; a directory gets the default file name.
    pub fn with_output(mut self, path: impl Into<PathBuf>) -> Self {
        self.output = Some(path.into());
        self
    }

    /// Executes the search and returns formatted output.
    pub async fn execute(&self, keywords: &[String]) -> Result<String> {
        let sleeper: Arc<dyn Sleeper> = Arc::new(TokioSleeper);
        let client = SellerCentralClient::from_config(&self.config, sleeper.clone())
            .context("Failed to create HTTP client")?;

        let driver = self.driver(client, sleeper);
        let cancel = driver.cancel_handle();
        let watcher = tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                eprintln!("Cancelling after the current keyword...");
                cancel.cancel();
            }
        });

        let result = self.execute_with_driver(&driver, keywords).await;
        watcher.abort();
        result
    }

    fn driver<T: Transport>(
        &self,
        client: SellerCentralClient<T>,
        sleeper: Arc<dyn Sleeper>,
    ) -> BatchDriver<T> {
        BatchDriver::new(NicheFinder::new(client, sleeper, self.config.pacing()))
    }

    /// Executes the search with a provided client (for testing).
    pub async fn execute_with_client<T: Transport>(
        &self,
        client: SellerCentralClient<T>,
        sleeper: Arc<dyn Sleeper>,
        keywords: &[String],
    ) -> Result<String> {
        let driver = self.driver(client, sleeper);
        self.execute_with_driver(&driver, keywords).await
    }

    async fn execute_with_driver<T: Transport>(
        &self,
        driver: &BatchDriver<T>,
        keywords: &[String],
    ) -> Result<String> {
        let template = self.config.search_template();
        debug!("Thresholds: {:?}", template.thresholds);

        let mut observer = ConsoleObserver::new();
        let progress = observer.progress();
        let keywords_text = keywords.join("\n");

        // The ETA keeps counting down between checks, so refresh it on a timer
        let outcome = {
            let run = driver.run(&keywords_text, &template, &mut observer);
            tokio::pin!(run);
            let mut ticker = tokio::time::interval(STATUS_REFRESH);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    outcome = &mut run => break outcome,
                    _ = ticker.tick() => {
                        if let Some(line) = status_line(&progress, Instant::now()) {
                            eprintln!("    {}", line);
                        }
                    }
                }
            }
        };

        let reports = match &outcome {
            RunOutcome::Invalid => bail!("Missing CSRF token, cookie or keywords"),
            RunOutcome::AlreadyRunning => bail!("A search is already running"),
            RunOutcome::Cancelled { reports } | RunOutcome::Completed { reports } => reports,
        };
        let failed = reports.iter().filter(|r| r.failed()).count();
        info!("{} keywords processed, {} failed", reports.len(), failed);

        let results = observer.into_results();
        let portal = self.config.marketplace.portal_url();

        if let Some(output) = &self.output {
            if results.is_empty() {
                eprintln!("No results to export.");
            } else {
                let path = self.export(&results, output, &portal)?;
                eprintln!("Exported {} rows to \"{}\".", results.len(), path.display());
            }
        }

        Ok(Formatter::new(self.config.format).with_portal(portal).format_results(&results))
    }

    /// Writes results to `output`, picking the format from its extension.
    fn export(&self, results: &[NicheResult], output: &Path, portal: &str) -> Result<PathBuf> {
        let format = output
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| ext.parse::<OutputFormat>().ok())
            .unwrap_or(self.config.format);

        let path = if output.is_dir() {
            output.join(export_file_name(self.config.marketplace.code(), format))
        } else {
            output.to_path_buf()
        };

        let contents = Formatter::new(format).with_portal(portal).format_results(results);
        std::fs::write(&path, contents)
            .with_context(|| format!("Failed to write results: {}", path.display()))?;
        Ok(path)
    }
}

/// Default export name, stamped with the current UTC time.
pub fn export_file_name(country_code: &str, format: OutputFormat) -> String {
    let stamp = Utc::now().format("%Y-%m-%dT%H-%M-%S-%3fZ");
    format!("niches_results_{}_{}.{}", country_code, stamp, format.extension())
}

/// Progress line for the status ticker, while an end estimate exists.
fn status_line(progress: &Mutex<ProgressEstimator>, now: Instant) -> Option<String> {
    let progress = progress.lock().unwrap_or_else(PoisonError::into_inner);
    progress.end_by()?;
    Some(progress.snapshot(now).to_string())
}

/// Prints the run log to stderr as it happens and collects the results.
struct ConsoleObserver {
    log: RunLog,
    progress: Arc<Mutex<ProgressEstimator>>,
}

impl ConsoleObserver {
    fn new() -> Self {
        Self { log: RunLog::new(), progress: Arc::default() }
    }

    /// Estimator shared with the status ticker.
    fn progress(&self) -> Arc<Mutex<ProgressEstimator>> {
        self.progress.clone()
    }

    fn into_results(self) -> Vec<NicheResult> {
        self.log.into_results()
    }

    fn update_progress(&self, apply: impl FnOnce(&mut ProgressEstimator)) {
        apply(&mut self.progress.lock().unwrap_or_else(PoisonError::into_inner));
    }
}

impl LogSink for ConsoleObserver {
    fn log(&mut self, line: &str) {
        self.log.log(line);
        if let Some(entry) = self.log.last() {
            eprintln!("{}", entry.display());
        }
    }
}

impl SearchObserver for ConsoleObserver {
    fn on_event(&mut self, event: ProgressEvent) {
        self.log.on_event(event);
        self.update_progress(|progress| progress.observe(event));
    }

    fn on_result(&mut self, result: NicheResult) {
        self.log.on_result(result);
    }

    fn reset(&mut self) {
        self.log.reset();
        self.update_progress(|progress| *progress = ProgressEstimator::new());
    }
}
