//! Request spacing shared by all fetch workers.

use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Enforces a minimum spacing between request starts across all workers.
///
/// The limiter bounds request *rate*, not concurrency: a worker waits only
/// until its start slot comes up, then proceeds while others overlap their
/// downloads. The slot clock is the only state mutated by multiple workers
/// and sits behind a mutex; the sleep happens after the lock is released.
#[derive(Debug)]
pub struct RateLimiter {
    spacing: Duration,
    next_slot: Mutex<Instant>,
}

impl RateLimiter {
    /// Create a limiter with the given minimum inter-request spacing.
    /// `Duration::ZERO` disables throttling entirely.
    pub fn new(spacing: Duration) -> Self {
        Self {
            spacing,
            next_slot: Mutex::new(Instant::now()),
        }
    }

    /// Block until the caller may issue its next request.
    pub async fn acquire(&self) {
        if self.spacing.is_zero() {
            return;
        }

        let wait = {
            let mut slot = self.next_slot.lock().await;
            let now = Instant::now();
            let start_at = (*slot).max(now);
            *slot = start_at + self.spacing;
            start_at.saturating_duration_since(now)
        };

        if !wait.is_zero() {
            tokio::time::sleep(wait).await;
        }
    }
}
