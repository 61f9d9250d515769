//! Hedged order execution.
//!
//! Contains the core logic for:
//! - Limit price calculation from oracle quotes
//! - Fill detection by position polling
//! - Re-quoting stale orders within a retry budget
//! - The single-shot hedge on the secondary venue

mod executor;
mod fill_monitor;
mod hedge;
mod pricing;
mod retry;
mod state;

pub use executor::{Method, OrderExecutor, TradeOutcome, TradeStatus};
pub use fill_monitor::{FillMonitor, MonitorSettings, WatchOutcome};
pub use hedge::HedgeExecutor;
pub use pricing::PriceCalculator;
pub use retry::{ExecutionResult, PrimaryOutcome, RetryController};
pub use state::{ExecutionState, StateMachine, Transition};
