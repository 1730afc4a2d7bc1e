//! Work and outcome value types exchanged between pipeline stages.

use std::path::PathBuf;

use crate::catalog::ItemDescriptor;

/// One unit of download work. Owned exclusively by the worker processing it
/// and consumed when its outcome is emitted.
#[derive(Debug, Clone)]
pub struct DownloadTask {
    /// The catalog entry to download.
    pub item: ItemDescriptor,
    /// Where the asset lands on success.
    pub target_path: PathBuf,
    /// Fetch attempts made so far.
    pub attempt: u32,
}

impl DownloadTask {
    /// Create a task with no attempts made yet.
    pub fn new(item: ItemDescriptor, target_path: PathBuf) -> Self {
        Self {
            item,
            target_path,
            attempt: 0,
        }
    }
}

/// Terminal status of one task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeStatus {
    /// Asset fetched and persisted.
    Success,
    /// The resume index found the item already done; no request was made.
    SkippedAlreadyPresent,
    /// Non-retryable failure (4xx other than 429, unusable body).
    FailedPermanent,
    /// Retryable failures exhausted the attempt budget.
    FailedTransientExhausted,
}

/// Immutable result message passed from a worker to the aggregator.
#[derive(Debug, Clone)]
pub struct DownloadOutcome {
    /// The finished task.
    pub task: DownloadTask,
    /// How it ended.
    pub status: OutcomeStatus,
    /// Bytes persisted on success, 0 otherwise.
    pub bytes_written: u64,
    /// Failure detail, when there is one.
    pub error_detail: Option<String>,
}

impl DownloadOutcome {
    /// Successful download of `bytes_written` bytes.
    pub fn success(task: DownloadTask, bytes_written: u64) -> Self {
        Self {
            task,
            status: OutcomeStatus::Success,
            bytes_written,
            error_detail: None,
        }
    }

    /// Item was already present; no request issued.
    pub fn skipped(task: DownloadTask) -> Self {
        Self {
            task,
            status: OutcomeStatus::SkippedAlreadyPresent,
            bytes_written: 0,
            error_detail: None,
        }
    }

    /// Non-retryable failure.
    pub fn failed_permanent(task: DownloadTask, detail: impl Into<String>) -> Self {
        Self {
            task,
            status: OutcomeStatus::FailedPermanent,
            bytes_written: 0,
            error_detail: Some(detail.into()),
        }
    }

    /// Retry budget exhausted on transient failures.
    pub fn failed_transient_exhausted(task: DownloadTask, detail: impl Into<String>) -> Self {
        Self {
            task,
            status: OutcomeStatus::FailedTransientExhausted,
            bytes_written: 0,
            error_detail: Some(detail.into()),
        }
    }
}
