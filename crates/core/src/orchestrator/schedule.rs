//! Loop mode: repeat a run forever on a fixed interval.

use std::panic::AssertUnwindSafe;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use futures::FutureExt;
use tracing::{error, info};

use super::runner::TrackerRewriter;
use super::types::RunSummary;

/// Waits between runs. Injected so loop mode can be tested without real delays.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Sleeps on the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Repeats [`TrackerRewriter::run_once`] with a fixed pause between runs.
///
/// There is no iteration limit, backoff or jitter. A failed or panicking run is
/// logged and the loop carries on; the process is stopped externally.
pub struct LoopDriver<S: Sleeper = TokioSleeper> {
    rewriter: TrackerRewriter,
    interval: Duration,
    sleeper: S,
}

impl LoopDriver<TokioSleeper> {
    pub fn new(rewriter: TrackerRewriter, interval: Duration) -> Self {
        Self::with_sleeper(rewriter, interval, TokioSleeper)
    }
}

impl<S: Sleeper> LoopDriver<S> {
    pub fn with_sleeper(rewriter: TrackerRewriter, interval: Duration, sleeper: S) -> Self {
        Self {
            rewriter,
            interval,
            sleeper,
        }
    }

    /// Run once, logging instead of propagating any failure.
    pub async fn tick(&self) -> Option<RunSummary> {
        match AssertUnwindSafe(self.rewriter.run_once())
            .catch_unwind()
            .await
        {
            Ok(Ok(summary)) => Some(summary),
            Ok(Err(e)) => {
                error!("Run failed: {}", e);
                None
            }
            Err(panic) => {
                let message = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                error!("Run panicked: {}", message);
                None
            }
        }
    }

    /// Run forever.
    pub async fn run_forever(&self) {
        info!("Loop mode enabled, running every {}s", self.interval.as_secs());
        loop {
            self.tick().await;

            let next = chrono::Duration::from_std(self.interval)
                .ok()
                .and_then(|d| Utc::now().checked_add_signed(d));
            if let Some(next) = next {
                info!("Next run at {}", next.format("%Y-%m-%d %H:%M:%S UTC"));
            }
            self.sleeper.sleep(self.interval).await;
        }
    }
}
