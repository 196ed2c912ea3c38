//! Single-pass and watch-mode scheduling
//!
//! Watch mode runs one pass immediately and then one per interval until
//! cancelled. Cancellation is only observed between passes; a pass that has
//! started always runs to completion. A failed pass is logged and the next
//! one still runs on schedule.

use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use super::runner::PassRunner;
use crate::sync::PassSummary;

/// Counts over the lifetime of a watch loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WatchStats {
    pub passes: usize,
    pub failed_passes: usize,
    /// Passes that completed but had per-note failures
    pub dirty_passes: usize,
}

pub struct Scheduler {
    runner: Arc<dyn PassRunner>,
    interval: Duration,
}

impl Scheduler {
    pub fn new(runner: Arc<dyn PassRunner>, interval: Duration) -> Self {
        Self { runner, interval }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Run exactly one pass.
    pub async fn run_once(&self) -> Result<PassSummary> {
        self.runner.run_pass().await
    }

    /// Run passes until `cancel` fires.
    pub async fn watch(&self, cancel: CancellationToken) -> WatchStats {
        tracing::info!(
            "Watch mode started. interval={}m",
            self.interval.as_secs() / 60
        );

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut stats = WatchStats::default();

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tracing::info!("Watch mode stopping");
                    break;
                }
                _ = ticker.tick() => {
                    stats.passes += 1;
                    match self.runner.run_pass().await {
                        Ok(summary) if summary.is_clean() => {}
                        Ok(summary) => {
                            stats.dirty_passes += 1;
                            tracing::warn!(failed = summary.failed, "Pass finished with failures");
                        }
                        Err(e) => {
                            stats.failed_passes += 1;
                            tracing::error!("Sync error: {:#}", e);
                        }
                    }
                }
            }
        }

        stats
    }
}
