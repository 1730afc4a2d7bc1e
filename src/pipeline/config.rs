//! Pipeline configuration and retry policy.

use std::time::Duration;

/// Default worker count.
pub const DEFAULT_WORKERS: usize = 5;

/// Default minimum spacing between request starts.
pub const DEFAULT_REQUEST_SPACING: Duration = Duration::from_millis(100);

/// Default maximum fetch attempts per task (initial attempt included).
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default outcome count between catalog checkpoints.
pub const DEFAULT_CHECKPOINT_EVERY: u64 = 50;

/// Depth of the task queue. Bounded so enumeration cannot race far ahead of
/// the workers.
pub const QUEUE_DEPTH: usize = 32;

/// Explicit retry policy consumed by the fetch workers and the page client.
///
/// Backoff after the n-th failed attempt is
/// `base_delay * multiplier^(n-1)`, capped at `cap`, so delays are
/// non-decreasing across attempts for the same task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum fetch attempts per task, including the first.
    pub max_attempts: u32,
    /// Delay after the first failed attempt.
    pub base_delay: Duration,
    /// Exponential growth factor between attempts.
    pub multiplier: u32,
    /// Upper bound on any single backoff delay.
    pub cap: Duration,
}

impl RetryPolicy {
    /// Backoff delay after `failed_attempts` attempts have failed
    /// (1-indexed: pass 1 after the first failure).
    pub fn backoff(&self, failed_attempts: u32) -> Duration {
        let exponent = failed_attempts.saturating_sub(1);
        let factor = self
            .multiplier
            .checked_pow(exponent)
            .unwrap_or(u32::MAX);
        self.base_delay
            .saturating_mul(factor)
            .min(self.cap)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: Duration::from_secs(1),
            multiplier: 2,
            cap: Duration::from_secs(30),
        }
    }
}

/// Tunables for a pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Number of concurrent fetch workers.
    pub workers: usize,
    /// Minimum spacing between request starts across all workers.
    pub request_spacing: Duration,
    /// Retry policy for asset fetches.
    pub retry: RetryPolicy,
    /// Checkpoint the catalog every this many outcomes.
    pub checkpoint_every: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            request_spacing: DEFAULT_REQUEST_SPACING,
            retry: RetryPolicy::default(),
            checkpoint_every: DEFAULT_CHECKPOINT_EVERY,
        }
    }
}
