//! Concurrent fetch-and-persist pipeline.
//!
//! Enumeration feeds a bounded task queue; a fixed pool of [`FetchWorker`]s
//! drains it with rate limiting and retry; a single [`ProgressAggregator`]
//! folds every outcome into the durable catalog. Items the resume index
//! recognizes never reach the queue at all and are reported to the
//! aggregator directly as skips.

pub mod aggregator;
pub mod config;
pub mod rate_limit;
pub mod task;
pub mod worker;

pub use aggregator::{ProgressAggregator, Summary};
pub use config::{PipelineConfig, RetryPolicy};
pub use rate_limit::RateLimiter;
pub use task::{DownloadOutcome, DownloadTask, OutcomeStatus};
pub use worker::FetchWorker;

use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info, warn};

use crate::catalog::{CatalogError, CatalogSource, SetDescriptor};
use crate::http::AssetFetcher;
use crate::output::{OutputError, OutputLayout};
use crate::resume::ResumeIndex;
use crate::shutdown::SharedShutdown;

/// Errors that abort a pipeline run.
///
/// Per-item failures are not errors at this level; they surface as counters
/// in the [`Summary`].
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Fatal catalog failure (the set listing itself was unavailable).
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// Output directories or artifacts could not be set up.
    #[error(transparent)]
    Output(#[from] OutputError),

    /// The catalog source returned an empty set listing.
    #[error("catalog source returned no sets")]
    NoSets,

    /// A spawned pipeline task panicked.
    #[error("pipeline task failed: {0}")]
    Task(String),
}

/// Orchestrates one download run end to end.
pub struct Pipeline {
    source: Arc<dyn CatalogSource>,
    fetcher: Arc<dyn AssetFetcher>,
    resume: Arc<dyn ResumeIndex>,
    layout: OutputLayout,
    config: PipelineConfig,
    shutdown: Option<SharedShutdown>,
    expected_total: Option<u64>,
}

impl Pipeline {
    /// Assemble a pipeline over its capabilities.
    pub fn new(
        source: Arc<dyn CatalogSource>,
        fetcher: Arc<dyn AssetFetcher>,
        resume: Arc<dyn ResumeIndex>,
        layout: OutputLayout,
        config: PipelineConfig,
    ) -> Self {
        Self {
            source,
            fetcher,
            resume,
            layout,
            config,
            shutdown: None,
            expected_total: None,
        }
    }

    /// Attach a shutdown coordinator. Shutdown stops enumeration and new
    /// fetches; in-flight work finishes and the final checkpoint still runs.
    pub fn with_shutdown(mut self, shutdown: SharedShutdown) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    /// Provide the expected item total (from a scan pass) so the aggregator
    /// can render a bounded progress bar.
    pub fn with_expected_total(mut self, total: u64) -> Self {
        self.expected_total = Some(total);
        self
    }

    /// Run the pipeline to completion.
    ///
    /// # Errors
    /// Fails only on fatal conditions: unreachable set listing, empty
    /// listing, or unusable output directories.
    pub async fn run(self) -> Result<Summary, PipelineError> {
        self.layout.ensure_directories()?;

        let sets = self.source.list_sets().await?;
        if sets.is_empty() {
            return Err(PipelineError::NoSets);
        }
        info!(
            sets = sets.len(),
            workers = self.config.workers,
            "starting download pipeline"
        );

        let (task_tx, task_rx) = mpsc::channel::<DownloadTask>(config::QUEUE_DEPTH);
        let (outcome_tx, outcome_rx) = mpsc::channel::<DownloadOutcome>(config::QUEUE_DEPTH);

        let mut aggregator =
            ProgressAggregator::new(self.layout.clone(), self.config.checkpoint_every)?;
        if let Some(total) = self.expected_total {
            aggregator = aggregator.with_progress(total);
        }
        let aggregator_handle = tokio::spawn(aggregator.run(outcome_rx));

        let limiter = Arc::new(RateLimiter::new(self.config.request_spacing));
        let shared_rx: worker::SharedTaskQueue = Arc::new(Mutex::new(task_rx));
        let worker_count = self.config.workers.max(1);
        let mut worker_handles = Vec::with_capacity(worker_count);
        for id in 0..worker_count {
            let w = FetchWorker::new(
                id,
                self.fetcher.clone(),
                limiter.clone(),
                self.config.retry,
                self.shutdown.clone(),
            );
            worker_handles.push(tokio::spawn(w.run(shared_rx.clone(), outcome_tx.clone())));
        }

        self.enumerate(&sets, &task_tx, &outcome_tx).await;

        // Closing the task channel lets the workers drain and exit; closing
        // the outcome channel after they join lets the aggregator finish.
        drop(task_tx);
        for result in futures::future::join_all(worker_handles).await {
            if let Err(e) = result {
                warn!(error = %e, "fetch worker panicked");
            }
        }
        drop(outcome_tx);

        aggregator_handle
            .await
            .map_err(|e| PipelineError::Task(e.to_string()))
    }

    /// Walk every set, consult the resume index, and either enqueue a task
    /// or report a skip. Unavailable sets are logged and skipped.
    async fn enumerate(
        &self,
        sets: &[SetDescriptor],
        tasks: &mpsc::Sender<DownloadTask>,
        outcomes: &mpsc::Sender<DownloadOutcome>,
    ) {
        for set in sets {
            if self.shutdown_requested() {
                info!("shutdown requested, stopping enumeration");
                break;
            }

            let items = match self.source.list_items(set).await {
                Ok(items) => items,
                Err(e) => {
                    warn!(set = %set.code, error = %e, "skipping unavailable set");
                    continue;
                }
            };
            debug!(set = %set.code, items = items.len(), "enumerated set");

            for item in items {
                if self.shutdown_requested() {
                    return;
                }

                let already_done = self.resume.already_done(&item);
                let target = self.layout.target_path(&item);
                let task = DownloadTask::new(item, target);
                let aborted = if already_done {
                    self.send_or_shutdown(outcomes.send(DownloadOutcome::skipped(task)))
                        .await
                } else {
                    self.send_or_shutdown(tasks.send(task)).await
                };
                if aborted {
                    return;
                }
            }
        }
    }

    /// Await a channel send, abandoning it if shutdown arrives first.
    ///
    /// Workers exit on shutdown without draining the queue, so a send
    /// blocked on the full task channel would otherwise never complete.
    /// Returns true when enumeration should stop: shutdown won the race or
    /// the receiver is gone.
    async fn send_or_shutdown<T>(
        &self,
        send: impl std::future::Future<Output = Result<(), mpsc::error::SendError<T>>>,
    ) -> bool {
        match &self.shutdown {
            Some(shutdown) => {
                tokio::select! {
                    result = send => result.is_err(),
                    _ = shutdown.wait_for_shutdown() => true,
                }
            }
            None => send.await.is_err(),
        }
    }

    fn shutdown_requested(&self) -> bool {
        self.shutdown
            .as_ref()
            .map(|s| s.is_shutdown_requested())
            .unwrap_or(false)
    }
}
