//! Fetch workers: retry, backoff and atomic asset persistence.

use std::path::Path;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::config::RetryPolicy;
use super::rate_limit::RateLimiter;
use super::task::{DownloadOutcome, DownloadTask};
use crate::http::{AssetFetcher, FetchError};
use crate::output::catalog::atomic_write;
use crate::output::OutputError;
use crate::shutdown::SharedShutdown;

/// Shared receiving end of the task queue. Workers claim tasks through the
/// mutex, so each task is processed at most once.
pub type SharedTaskQueue = Arc<Mutex<mpsc::Receiver<DownloadTask>>>;

/// One fetch worker. A fixed pool of these drains the task queue; each
/// worker sends its outcomes over its own channel handle, preserving
/// per-worker FIFO delivery to the aggregator.
pub struct FetchWorker {
    id: usize,
    fetcher: Arc<dyn AssetFetcher>,
    limiter: Arc<RateLimiter>,
    retry: RetryPolicy,
    shutdown: Option<SharedShutdown>,
}

impl FetchWorker {
    /// Create a worker.
    pub fn new(
        id: usize,
        fetcher: Arc<dyn AssetFetcher>,
        limiter: Arc<RateLimiter>,
        retry: RetryPolicy,
        shutdown: Option<SharedShutdown>,
    ) -> Self {
        Self {
            id,
            fetcher,
            limiter,
            retry,
            shutdown,
        }
    }

    /// Drain the task queue until it closes or shutdown is requested.
    pub async fn run(self, tasks: SharedTaskQueue, outcomes: mpsc::Sender<DownloadOutcome>) {
        loop {
            if self.shutdown_requested() {
                debug!(worker = self.id, "shutdown requested, worker exiting");
                break;
            }

            let task = {
                let mut rx = tasks.lock().await;
                rx.recv().await
            };
            let Some(task) = task else {
                break;
            };

            let outcome = self.process(task).await;
            if outcomes.send(outcome).await.is_err() {
                // Aggregator is gone; nothing left to report to.
                break;
            }
        }
    }

    /// Execute one task to a terminal outcome.
    ///
    /// Transient failures retry with exponential backoff up to the policy's
    /// attempt budget; permanent failures end the task immediately.
    pub async fn process(&self, mut task: DownloadTask) -> DownloadOutcome {
        loop {
            task.attempt += 1;

            self.limiter.acquire().await;

            let url = task.item.source_asset_url.clone();
            match self.fetcher.fetch(&url).await {
                Ok(bytes) => {
                    return match persist_asset(&task.target_path, &bytes) {
                        Ok(written) => {
                            debug!(
                                worker = self.id,
                                path = %task.target_path.display(),
                                bytes = written,
                                "asset persisted"
                            );
                            DownloadOutcome::success(task, written)
                        }
                        Err(e) => {
                            warn!(
                                worker = self.id,
                                path = %task.target_path.display(),
                                error = %e,
                                "failed to persist asset"
                            );
                            DownloadOutcome::failed_permanent(task, e.to_string())
                        }
                    };
                }
                Err(FetchError::Permanent(detail)) => {
                    warn!(worker = self.id, %url, %detail, "permanent fetch failure");
                    return DownloadOutcome::failed_permanent(task, detail);
                }
                Err(FetchError::Transient(detail)) => {
                    if task.attempt >= self.retry.max_attempts {
                        warn!(
                            worker = self.id,
                            %url,
                            attempts = task.attempt,
                            %detail,
                            "retry budget exhausted"
                        );
                        return DownloadOutcome::failed_transient_exhausted(task, detail);
                    }

                    let backoff = self.retry.backoff(task.attempt);
                    warn!(
                        worker = self.id,
                        %url,
                        attempt = task.attempt,
                        max_attempts = self.retry.max_attempts,
                        backoff_ms = backoff.as_millis() as u64,
                        %detail,
                        "transient fetch failure, retrying after backoff"
                    );

                    if !self.sleep_or_shutdown(backoff).await {
                        return DownloadOutcome::failed_transient_exhausted(
                            task,
                            "shutdown requested during backoff",
                        );
                    }
                }
            }
        }
    }

    /// Sleep for `delay`, returning false if shutdown arrives first.
    async fn sleep_or_shutdown(&self, delay: std::time::Duration) -> bool {
        match &self.shutdown {
            Some(shutdown) => {
                tokio::select! {
                    _ = tokio::time::sleep(delay) => true,
                    _ = shutdown.wait_for_shutdown() => false,
                }
            }
            None => {
                tokio::time::sleep(delay).await;
                true
            }
        }
    }

    fn shutdown_requested(&self) -> bool {
        self.shutdown
            .as_ref()
            .map(|s| s.is_shutdown_requested())
            .unwrap_or(false)
    }
}

/// Write asset bytes via temp-then-rename, retrying the write once.
///
/// A half-written file never appears at the final path; the retry covers
/// one-off filesystem hiccups before the item is marked failed.
fn persist_asset(path: &Path, bytes: &[u8]) -> Result<u64, OutputError> {
    match atomic_write(path, bytes) {
        Ok(()) => Ok(bytes.len() as u64),
        Err(first) => {
            warn!(path = %path.display(), error = %first, "asset write failed, retrying once");
            atomic_write(path, bytes)?;
            Ok(bytes.len() as u64)
        }
    }
}
