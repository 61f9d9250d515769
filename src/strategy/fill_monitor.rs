//! Fill detection by position polling.
//!
//! A resting order counts as filled the first time a position read differs
//! from the baseline captured before submission. Reads that fail are treated
//! as "no change yet", and a read that is still pending when the wait window
//! closes is abandoned.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, timeout, Instant};
use tracing::{debug, info, warn};

use crate::config::ExecutionConfig;
use crate::error::ExecutionError;
use crate::exchange::{PositionSnapshot, TradingSurface};

/// Polling cadence and the two wait thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorSettings {
    pub check_interval: Duration,
    /// Absolute ceiling for one resting order
    pub max_wait: Duration,
    /// Stale-order threshold. Ignored unless shorter than `max_wait`.
    pub retry_timeout: Duration,
}

impl MonitorSettings {
    pub fn resubmit_enabled(&self) -> bool {
        self.retry_timeout < self.max_wait
    }
}

impl From<&ExecutionConfig> for MonitorSettings {
    fn from(config: &ExecutionConfig) -> Self {
        Self {
            check_interval: config.check_interval(),
            max_wait: config.max_wait(),
            retry_timeout: config.retry_timeout(),
        }
    }
}

/// How a watch ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchOutcome {
    /// Position moved away from the baseline
    Filled(PositionSnapshot),
    /// No change within `max_wait`
    TimedOut,
    /// No change within `retry_timeout`; cancel and re-quote
    NeedsResubmit,
    /// Shutdown requested and the final read showed no change
    Interrupted,
}

pub struct FillMonitor {
    settings: MonitorSettings,
    shutdown: Arc<AtomicBool>,
}

impl FillMonitor {
    pub fn new(settings: MonitorSettings, shutdown: Arc<AtomicBool>) -> Self {
        Self { settings, shutdown }
    }

    pub fn settings(&self) -> &MonitorSettings {
        &self.settings
    }

    /// Poll `surface` until the position leaves `baseline` or a threshold
    /// passes.
    pub async fn watch(
        &self,
        surface: &dyn TradingSurface,
        symbol: &str,
        baseline: &PositionSnapshot,
    ) -> WatchOutcome {
        let started = Instant::now();
        let mut polls: u32 = 0;
        let mut read_errors: u32 = 0;

        info!(
            %symbol,
            %baseline,
            check_interval_ms = self.settings.check_interval.as_millis() as u64,
            retry_timeout_ms = self.settings.retry_timeout.as_millis() as u64,
            max_wait_ms = self.settings.max_wait.as_millis() as u64,
            "Monitoring order fill"
        );

        loop {
            let elapsed = started.elapsed();

            if self.settings.resubmit_enabled() && elapsed >= self.settings.retry_timeout {
                info!(%symbol, polls, elapsed_ms = elapsed.as_millis() as u64, "Order stale, needs resubmit");
                return WatchOutcome::NeedsResubmit;
            }

            if elapsed >= self.settings.max_wait {
                warn!(%symbol, polls, read_errors, elapsed_ms = elapsed.as_millis() as u64, "Order not filled before max wait");
                return WatchOutcome::TimedOut;
            }

            if self.shutdown.load(Ordering::SeqCst) {
                return self.final_check(surface, symbol, baseline).await;
            }

            // A read stuck in backoff must not carry the watch past its deadline
            let deadline = if self.settings.resubmit_enabled() {
                self.settings.retry_timeout
            } else {
                self.settings.max_wait
            };
            let remaining = deadline.saturating_sub(elapsed);

            polls += 1;
            let read = match timeout(remaining, surface.read_position(symbol)).await {
                Ok(read) => read,
                Err(_) => {
                    read_errors += 1;
                    debug!(
                        %symbol,
                        remaining_ms = remaining.as_millis() as u64,
                        "Position read outlived the wait window"
                    );
                    continue;
                }
            };
            match read {
                Ok(current) if current.differs_from(baseline) => {
                    info!(
                        %symbol,
                        from = %baseline,
                        to = %current,
                        basis = ?current.evidence_basis(baseline),
                        polls,
                        "Order filled"
                    );
                    return WatchOutcome::Filled(current);
                }
                Ok(_) => {}
                Err(e) => {
                    read_errors += 1;
                    let err = ExecutionError::ReadTransient(e.to_string());
                    debug!(%symbol, error = %err, "Ignoring failed position read");
                }
            }

            sleep(self.settings.check_interval).await;
        }
    }

    /// One authoritative read after a shutdown request. A run must not hedge
    /// on a guess, so a failed read counts as unfilled.
    async fn final_check(
        &self,
        surface: &dyn TradingSurface,
        symbol: &str,
        baseline: &PositionSnapshot,
    ) -> WatchOutcome {
        match surface.read_position(symbol).await {
            Ok(current) if current.differs_from(baseline) => {
                info!(%symbol, to = %current, "Order filled (confirmed after interrupt)");
                WatchOutcome::Filled(current)
            }
            Ok(_) => {
                warn!(%symbol, "Interrupted before fill");
                WatchOutcome::Interrupted
            }
            Err(e) => {
                warn!(%symbol, error = %e, "Final position read failed, treating as unfilled");
                WatchOutcome::Interrupted
            }
        }
    }
}
