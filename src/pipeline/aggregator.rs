//! Single-consumer outcome aggregation, checkpointing and the run summary.

use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use super::task::{DownloadOutcome, OutcomeStatus};
use crate::output::catalog::atomic_write;
use crate::output::{asset_filename, CardCatalog, CardRecord, OutputLayout, OutputResult};

/// Final tallies of one pipeline run.
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    /// Outcomes processed (enqueued tasks plus resume skips).
    pub expected: u64,
    /// Assets fetched and persisted this run.
    pub downloaded: u64,
    /// Items the resume index found already done.
    pub skipped: u64,
    /// Non-retryable failures.
    pub failed_permanent: u64,
    /// Retry budget exhaustions.
    pub failed_transient: u64,
    /// Records in the catalog after the final checkpoint.
    pub total_cards: usize,
    /// Unique display names in the catalog.
    pub unique_names: usize,
    /// Record count per set name, sorted by set name.
    pub set_counts: Vec<(String, usize)>,
}

impl Summary {
    /// Completed items (downloaded or already present) over expected, as a
    /// percentage. Zero when nothing was expected.
    pub fn success_rate(&self) -> f64 {
        if self.expected == 0 {
            return 0.0;
        }
        (self.downloaded + self.skipped) as f64 / self.expected as f64 * 100.0
    }

    /// Total failures.
    pub fn failed(&self) -> u64 {
        self.failed_permanent + self.failed_transient
    }

    /// Render the textual summary artifact.
    pub fn render(&self) -> String {
        let mut text = String::new();
        text.push_str("Download Summary\n");
        text.push_str("================\n");
        text.push_str(&format!("Expected cards:      {}\n", self.expected));
        text.push_str(&format!("Downloaded:          {}\n", self.downloaded));
        text.push_str(&format!("Already present:     {}\n", self.skipped));
        text.push_str(&format!("Failed:              {}\n", self.failed()));
        text.push_str(&format!("Unique Pokemon:      {}\n", self.unique_names));
        text.push_str(&format!("Total cards on disk: {}\n", self.total_cards));
        text.push_str(&format!("Success rate:        {:.1}%\n", self.success_rate()));
        text.push_str("\nCards per set:\n");
        for (set_name, count) in &self.set_counts {
            text.push_str(&format!("  {set_name}: {count}\n"));
        }
        text
    }
}

/// Sole consumer of the outcome channel and sole owner of the card catalog.
///
/// Loads any prior checkpoint at construction, folds outcomes into the
/// catalog and counters, checkpoints every `checkpoint_every` outcomes and
/// once more at completion.
pub struct ProgressAggregator {
    catalog: CardCatalog,
    layout: OutputLayout,
    checkpoint_every: u64,
    bar: Option<ProgressBar>,
    processed: u64,
    downloaded: u64,
    skipped: u64,
    failed_permanent: u64,
    failed_transient: u64,
}

impl ProgressAggregator {
    /// Create an aggregator over `layout`, resuming from the existing
    /// metadata checkpoint when one is present.
    pub fn new(layout: OutputLayout, checkpoint_every: u64) -> OutputResult<Self> {
        let catalog = CardCatalog::load(&layout.metadata_path())?.unwrap_or_default();
        Ok(Self {
            catalog,
            layout,
            checkpoint_every: checkpoint_every.max(1),
            bar: None,
            processed: 0,
            downloaded: 0,
            skipped: 0,
            failed_permanent: 0,
            failed_transient: 0,
        })
    }

    /// Attach a progress bar sized for `total` expected outcomes.
    pub fn with_progress(mut self, total: u64) -> Self {
        let bar = ProgressBar::new(total);
        bar.set_style(
            ProgressStyle::with_template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
            )
            .expect("static progress bar template")
            .progress_chars("=>-"),
        );
        self.bar = Some(bar);
        self
    }

    /// Consume outcomes until the channel closes, then write the final
    /// checkpoint and summary artifact.
    pub async fn run(mut self, mut outcomes: mpsc::Receiver<DownloadOutcome>) -> Summary {
        while let Some(outcome) = outcomes.recv().await {
            self.record(outcome);
            if self.processed % self.checkpoint_every == 0 {
                self.checkpoint();
            }
        }

        if let Some(bar) = &self.bar {
            bar.finish_and_clear();
        }

        let summary = self.summary();
        self.checkpoint();
        let summary_text = format!(
            "Generated at {}\n\n{}",
            chrono::Utc::now().to_rfc3339(),
            summary.render()
        );
        if let Err(e) = atomic_write(&self.layout.summary_path(), summary_text.as_bytes()) {
            error!(error = %e, "failed to write summary artifact");
        }

        info!(
            downloaded = summary.downloaded,
            skipped = summary.skipped,
            failed = summary.failed(),
            total_cards = summary.total_cards,
            "run complete"
        );
        summary
    }

    fn record(&mut self, outcome: DownloadOutcome) {
        self.processed += 1;
        let item = &outcome.task.item;
        let filename = asset_filename(item);

        match outcome.status {
            OutcomeStatus::Success => {
                self.downloaded += 1;
                debug!(%filename, bytes = outcome.bytes_written, "download recorded");
                self.catalog.push(CardRecord::from_item(item, filename));
            }
            OutcomeStatus::SkippedAlreadyPresent => {
                self.skipped += 1;
                // The prior checkpoint normally carries the record already;
                // reconstruct it if the image survived without its metadata.
                if !self.catalog.contains_filename(&filename) {
                    self.catalog.push(CardRecord::from_item(item, filename));
                }
            }
            OutcomeStatus::FailedPermanent => {
                self.failed_permanent += 1;
                warn!(
                    title = %item.title,
                    detail = outcome.error_detail.as_deref().unwrap_or(""),
                    "permanent failure"
                );
            }
            OutcomeStatus::FailedTransientExhausted => {
                self.failed_transient += 1;
                warn!(
                    title = %item.title,
                    detail = outcome.error_detail.as_deref().unwrap_or(""),
                    "gave up after retries"
                );
            }
        }

        if let Some(bar) = &self.bar {
            bar.inc(1);
            bar.set_message(item.display_name.clone());
        }
    }

    /// Checkpoint the catalog and class list, retrying each write once. A
    /// checkpoint failure never aborts the run; the next interval tries again.
    fn checkpoint(&self) {
        if let Err(e) = self.save_metadata() {
            warn!(error = %e, "metadata checkpoint failed");
        }
        if let Err(e) = self.save_classes() {
            warn!(error = %e, "class list checkpoint failed");
        }
    }

    fn save_metadata(&self) -> OutputResult<()> {
        let path = self.layout.metadata_path();
        self.catalog.save(&path).or_else(|_| self.catalog.save(&path))
    }

    fn save_classes(&self) -> OutputResult<()> {
        let path = self.layout.classes_path();
        self.catalog
            .save_classes(&path)
            .or_else(|_| self.catalog.save_classes(&path))
    }

    fn summary(&self) -> Summary {
        Summary {
            expected: self.processed,
            downloaded: self.downloaded,
            skipped: self.skipped,
            failed_permanent: self.failed_permanent,
            failed_transient: self.failed_transient,
            total_cards: self.catalog.len(),
            unique_names: self.catalog.class_names().count(),
            set_counts: self.catalog.counts_by_set(),
        }
    }
}
