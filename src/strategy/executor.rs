//! Hedged trade execution.
//!
//! Drives one trade end to end: a passive limit order on the primary venue
//! (with re-quoting) and, only once that fills, a market hedge in the
//! opposite direction on the secondary venue.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::config::{ExecutionConfig, TradeSpec};
use crate::error::ExecutionError;
use crate::exchange::{Cents, Direction, PriceOracle, VenueRegistry};
use crate::strategy::fill_monitor::{FillMonitor, MonitorSettings};
use crate::strategy::hedge::HedgeExecutor;
use crate::strategy::pricing::PriceCalculator;
use crate::strategy::retry::RetryController;
use crate::strategy::state::{ExecutionState, StateMachine};

/// Which side the primary venue takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Method {
    /// Buy on the primary venue, sell on the secondary
    LongPrimary,
    /// Sell on the primary venue, buy on the secondary
    ShortPrimary,
}

impl Method {
    pub fn primary_direction(self) -> Direction {
        match self {
            Method::LongPrimary => Direction::Long,
            Method::ShortPrimary => Direction::Short,
        }
    }

    pub fn hedge_direction(self) -> Direction {
        self.primary_direction().opposite()
    }

    pub fn max_retries(self, config: &ExecutionConfig) -> u32 {
        match self {
            Method::LongPrimary => config.long_primary_max_retries,
            Method::ShortPrimary => config.short_primary_max_retries,
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::LongPrimary => write!(f, "long-primary"),
            Method::ShortPrimary => write!(f, "short-primary"),
        }
    }
}

/// Overall classification of a finished trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TradeStatus {
    /// Both legs submitted, primary fill observed
    Complete,
    /// Primary filled, hedge failed or unknown
    HedgeUnconfirmed,
    /// Primary never filled; no hedge attempted
    NotFilled,
    /// Interrupted before a fill was observed
    Aborted,
}

/// Result of [`OrderExecutor::run_method`].
#[derive(Debug, Clone)]
pub struct TradeOutcome {
    pub symbol: String,
    pub method: Method,
    pub filled: bool,
    /// `None` when no hedge was attempted
    pub hedged: Option<bool>,
    pub attempts: u32,
    pub order_price: Option<Cents>,
    pub final_state: ExecutionState,
    pub error: Option<ExecutionError>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl TradeOutcome {
    pub fn status(&self) -> TradeStatus {
        match (self.filled, self.hedged) {
            (true, Some(true)) => TradeStatus::Complete,
            (true, _) => TradeStatus::HedgeUnconfirmed,
            (false, _) if self.final_state == ExecutionState::Aborted => TradeStatus::Aborted,
            (false, _) => TradeStatus::NotFilled,
        }
    }

    pub fn duration_ms(&self) -> i64 {
        (self.finished_at - self.started_at).num_milliseconds()
    }
}

/// Runs hedged trades against the venues in a registry.
pub struct OrderExecutor {
    config: ExecutionConfig,
    registry: VenueRegistry,
    retry: RetryController,
    hedger: HedgeExecutor,
}

impl OrderExecutor {
    pub fn new(
        config: ExecutionConfig,
        oracle: Arc<dyn PriceOracle>,
        registry: VenueRegistry,
        shutdown: Arc<AtomicBool>,
    ) -> Self {
        let monitor = FillMonitor::new(MonitorSettings::from(&config), shutdown.clone());
        let retry = RetryController::new(
            PriceCalculator::new(oracle),
            monitor,
            config.retry_pause(),
            shutdown,
        );

        Self {
            config,
            registry,
            retry,
            hedger: HedgeExecutor::new(),
        }
    }

    /// Execute `spec` with the primary leg in the direction `method` gives.
    ///
    /// Never fails: every error is folded into the returned outcome.
    pub async fn run_method(&self, method: Method, spec: &TradeSpec) -> TradeOutcome {
        let started_at = Utc::now();
        let mut machine = StateMachine::new();
        let mut outcome = TradeOutcome {
            symbol: spec.symbol.clone(),
            method,
            filled: false,
            hedged: None,
            attempts: 0,
            order_price: None,
            final_state: ExecutionState::Idle,
            error: None,
            started_at,
            finished_at: started_at,
        };

        info!(
            symbol = %spec.symbol,
            %method,
            size = %spec.size,
            offset = %spec.price_offset,
            primary = %spec.primary_venue,
            secondary = %spec.secondary_venue,
            "Starting hedged trade"
        );

        // Both venues must resolve before anything is placed
        let venues = self.registry.surface(&spec.primary_venue).and_then(|primary| {
            self.registry
                .surface(&spec.secondary_venue)
                .map(|secondary| (primary, secondary))
        });
        let (primary, secondary) = match venues {
            Ok(pair) => pair,
            Err(e) => {
                error!(symbol = %spec.symbol, error = %e, "Cannot resolve venues");
                if let Err(te) = machine.transition(ExecutionState::Failed) {
                    error!(error = %te, "Could not record failure state");
                }
                return self.finish(outcome, &machine, Some(e));
            }
        };

        let primary_result = self
            .retry
            .run_with_retry(
                primary.as_ref(),
                spec,
                method.primary_direction(),
                method.max_retries(&self.config),
                &mut machine,
            )
            .await;

        outcome.filled = primary_result.filled;
        outcome.attempts = primary_result.attempts;
        outcome.order_price = primary_result.order_price;

        if !primary_result.filled {
            warn!(
                symbol = %spec.symbol,
                attempts = primary_result.attempts,
                error = ?primary_result.error,
                "Primary order not filled, skipping hedge"
            );
            return self.finish(outcome, &machine, primary_result.error);
        }

        let (hedged, error) = match machine.transition(ExecutionState::HedgePending) {
            Ok(()) => {
                let result = self
                    .hedger
                    .execute_hedge(secondary.as_ref(), spec, method.hedge_direction())
                    .await;
                let next = if result.is_ok() {
                    ExecutionState::Done
                } else {
                    ExecutionState::HedgeFailed
                };
                if let Err(te) = machine.transition(next) {
                    error!(error = %te, "Could not record hedge state");
                }
                (result.is_ok(), result.err())
            }
            Err(e) => (false, Some(e)),
        };
        outcome.hedged = Some(hedged);

        self.finish(outcome, &machine, error)
    }

    fn finish(
        &self,
        mut outcome: TradeOutcome,
        machine: &StateMachine,
        error: Option<ExecutionError>,
    ) -> TradeOutcome {
        outcome.final_state = machine.state();
        outcome.error = error;
        outcome.finished_at = Utc::now();

        info!(
            symbol = %outcome.symbol,
            method = %outcome.method,
            status = ?outcome.status(),
            filled = outcome.filled,
            hedged = ?outcome.hedged,
            attempts = outcome.attempts,
            final_state = %outcome.final_state,
            duration_ms = outcome.duration_ms(),
            "Trade finished"
        );
        outcome
    }
}
