//! Error taxonomy for the order-execution engine.
//!
//! Infrastructure code (configuration, HTTP, cache files) reports failures as
//! `anyhow::Error`. The engine itself reports through [`ExecutionError`] so
//! that callers can tell a recoverable quote gap from a terminal submission
//! failure or a partially hedged trade.

use thiserror::Error;

use crate::exchange::QuoteSide;

/// Failures the execution engine can report.
///
/// None of these ever terminate the process: the executor folds them into a
/// [`TradeOutcome`](crate::strategy::TradeOutcome).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExecutionError {
    /// The oracle had no data for the side the order direction needs.
    #[error("quote for {symbol} is missing the {side} side")]
    MissingQuoteSide { symbol: String, side: QuoteSide },

    /// Offset pushed the order price out of range (non-positive or overflow).
    #[error("cannot price {symbol}: {reason}")]
    InvalidPrice { symbol: String, reason: String },

    /// The primary venue rejected or failed to acknowledge the limit order.
    #[error("order submission on {venue} failed: {reason}")]
    SubmissionFailed { venue: String, reason: String },

    /// A position read failed while polling. Swallowed by the fill monitor.
    #[error("position read failed: {0}")]
    ReadTransient(String),

    /// Every allowed attempt went stale without a fill.
    #[error("order not filled after {attempts} attempts")]
    RetryExhausted { attempts: u32 },

    /// The order rested for the full wait ceiling without a fill.
    #[error("order not filled within {waited_ms} ms")]
    TimedOut { waited_ms: u64 },

    /// Primary leg filled, secondary leg outcome unknown or failed.
    #[error("hedge on {venue} unconfirmed: {reason}")]
    HedgeUnconfirmed { venue: String, reason: String },

    #[error("invalid state transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    #[error("unknown venue: {0}")]
    UnknownVenue(String),

    /// The run was interrupted externally and no fill was observed.
    #[error("execution interrupted")]
    Interrupted,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = ExecutionError::MissingQuoteSide {
            symbol: "BTC".to_string(),
            side: QuoteSide::Bid,
        };
        assert_eq!(err.to_string(), "quote for BTC is missing the bid side");

        let err = ExecutionError::RetryExhausted { attempts: 3 };
        assert_eq!(err.to_string(), "order not filled after 3 attempts");
    }
}
