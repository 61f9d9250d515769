//! Primary-leg retry loop.
//!
//! Each attempt re-quotes, captures a baseline position, submits a limit
//! order and watches it. A stale order is cancelled and replaced after a
//! fixed pause; a fill ends the loop at once; a timeout or a failed
//! submission ends it without spending further attempts.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::config::TradeSpec;
use crate::error::ExecutionError;
use crate::exchange::{Cents, Direction, PositionSnapshot, TradingSurface};
use crate::strategy::fill_monitor::{FillMonitor, WatchOutcome};
use crate::strategy::pricing::PriceCalculator;
use crate::strategy::state::{ExecutionState, StateMachine};

/// Result of a single attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionResult {
    Filled(PositionSnapshot),
    /// Rested for the full wait ceiling
    NotFilled,
    NeedsResubmit,
    Failed(ExecutionError),
}

/// What the primary leg achieved across all attempts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrimaryOutcome {
    pub filled: bool,
    /// Attempts started, including the first submission
    pub attempts: u32,
    /// Price of the last computed order
    pub order_price: Option<Cents>,
    /// Position observed when the fill was detected
    pub position: Option<PositionSnapshot>,
    pub error: Option<ExecutionError>,
}

pub struct RetryController {
    calculator: PriceCalculator,
    monitor: FillMonitor,
    retry_pause: Duration,
    shutdown: Arc<AtomicBool>,
}

impl RetryController {
    pub fn new(
        calculator: PriceCalculator,
        monitor: FillMonitor,
        retry_pause: Duration,
        shutdown: Arc<AtomicBool>,
    ) -> Self {
        Self {
            calculator,
            monitor,
            retry_pause,
            shutdown,
        }
    }

    /// Run up to `max_retries` attempts (the first submission included) until
    /// the order fills.
    pub async fn run_with_retry(
        &self,
        surface: &dyn TradingSurface,
        spec: &TradeSpec,
        direction: Direction,
        max_retries: u32,
        machine: &mut StateMachine,
    ) -> PrimaryOutcome {
        let symbol = spec.symbol.as_str();
        let mut outcome = PrimaryOutcome {
            filled: false,
            attempts: 0,
            order_price: None,
            position: None,
            error: None,
        };

        while outcome.attempts < max_retries {
            if outcome.attempts > 0 {
                info!(%symbol, attempt = outcome.attempts + 1, max_retries, "Resubmitting order");
                cancel_open_orders(surface, symbol).await;
                sleep(self.retry_pause).await;
            }

            if self.shutdown.load(Ordering::SeqCst) {
                warn!(%symbol, attempts = outcome.attempts, "Shutdown requested, not submitting");
                settle(machine, &ExecutionError::Interrupted);
                outcome.error = Some(ExecutionError::Interrupted);
                return outcome;
            }

            outcome.attempts += 1;
            let result = match self
                .attempt(surface, spec, direction, machine, &mut outcome.order_price)
                .await
            {
                Ok(result) => result,
                Err(e) => {
                    settle(machine, &e);
                    ExecutionResult::Failed(e)
                }
            };

            match result {
                ExecutionResult::Filled(position) => {
                    if let Some(price) = outcome.order_price {
                        log_open_order_status(surface, symbol, price).await;
                    }
                    outcome.filled = true;
                    outcome.position = Some(position);
                    return outcome;
                }
                ExecutionResult::NeedsResubmit => continue,
                ExecutionResult::NotFilled => {
                    if let Some(price) = outcome.order_price {
                        log_open_order_status(surface, symbol, price).await;
                    }
                    cancel_open_orders(surface, symbol).await;
                    outcome.error = Some(ExecutionError::TimedOut {
                        waited_ms: self.monitor.settings().max_wait.as_millis() as u64,
                    });
                    return outcome;
                }
                ExecutionResult::Failed(e) => {
                    if e == ExecutionError::Interrupted {
                        cancel_open_orders(surface, symbol).await;
                    }
                    error!(%symbol, attempt = outcome.attempts, error = %e, "Attempt failed");
                    outcome.error = Some(e);
                    return outcome;
                }
            }
        }

        warn!(%symbol, attempts = outcome.attempts, "Retry budget exhausted");
        cancel_open_orders(surface, symbol).await;
        let err = ExecutionError::RetryExhausted {
            attempts: outcome.attempts,
        };
        settle(machine, &err);
        outcome.error = Some(err);
        outcome
    }

    /// Quote, baseline, submit, monitor.
    async fn attempt(
        &self,
        surface: &dyn TradingSurface,
        spec: &TradeSpec,
        direction: Direction,
        machine: &mut StateMachine,
        order_price: &mut Option<Cents>,
    ) -> Result<ExecutionResult, ExecutionError> {
        let symbol = spec.symbol.as_str();

        let (_, price) = self
            .calculator
            .quote_order_price(symbol, spec.price_offset, direction)
            .await?;
        *order_price = Some(price);
        machine.transition(ExecutionState::PriceComputed)?;
        self.ensure_running(symbol)?;

        // Baseline must be read before the order can possibly fill
        let baseline = surface
            .read_position(symbol)
            .await
            .map_err(|e| ExecutionError::ReadTransient(e.to_string()))?;
        debug!(%symbol, %baseline, "Captured baseline position");
        self.ensure_running(symbol)?;

        surface
            .submit_limit_order(symbol, direction, price, &spec.size)
            .await
            .map_err(|e| ExecutionError::SubmissionFailed {
                venue: surface.name(),
                reason: e.to_string(),
            })?;
        machine.transition(ExecutionState::Submitted)?;
        info!(
            venue = %surface.name(),
            %symbol,
            %direction,
            price = %price,
            size = %spec.size,
            "Limit order submitted"
        );

        machine.transition(ExecutionState::Monitoring)?;
        match self.monitor.watch(surface, symbol, &baseline).await {
            WatchOutcome::Filled(position) => {
                machine.transition(ExecutionState::Filled)?;
                Ok(ExecutionResult::Filled(position))
            }
            WatchOutcome::NeedsResubmit => {
                machine.transition(ExecutionState::NeedsResubmit)?;
                Ok(ExecutionResult::NeedsResubmit)
            }
            WatchOutcome::TimedOut => {
                machine.transition(ExecutionState::TimedOut)?;
                Ok(ExecutionResult::NotFilled)
            }
            WatchOutcome::Interrupted => Err(ExecutionError::Interrupted),
        }
    }

    /// Quote and baseline reads can block through long backoffs, so the
    /// flag is checked again right before anything reaches the venue.
    fn ensure_running(&self, symbol: &str) -> Result<(), ExecutionError> {
        if self.shutdown.load(Ordering::SeqCst) {
            warn!(%symbol, "Shutdown requested mid-attempt, not submitting");
            return Err(ExecutionError::Interrupted);
        }
        Ok(())
    }
}

/// Move the machine to the terminal state matching `err`.
fn settle(machine: &mut StateMachine, err: &ExecutionError) {
    let terminal = match err {
        ExecutionError::Interrupted => ExecutionState::Aborted,
        _ => ExecutionState::Failed,
    };
    if let Err(e) = machine.transition(terminal) {
        error!(error = %e, cause = %err, "Could not record failure state");
    }
}

/// Best-effort cancel. Having nothing to cancel is success.
pub(crate) async fn cancel_open_orders(surface: &dyn TradingSurface, symbol: &str) {
    match surface.cancel_all_orders(symbol).await {
        Ok(()) => debug!(venue = %surface.name(), %symbol, "Open orders cancelled"),
        Err(e) => warn!(venue = %surface.name(), %symbol, error = %e, "Cancel all orders failed"),
    }
}

async fn log_open_order_status(surface: &dyn TradingSurface, symbol: &str, price: Cents) {
    if let Some(status) = surface.open_orders_status(symbol, price).await {
        info!(
            venue = %surface.name(),
            %symbol,
            %price,
            filled = %status.filled,
            total = %status.total,
            ratio = %status.fill_ratio(),
            complete = status.is_filled(),
            "Open order status"
        );
    }
}
