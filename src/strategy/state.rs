//! Execution state machine for one hedged trade.
//!
//! ```text
//! Idle -> PriceComputed -> Submitted -> Monitoring -> Filled -> HedgePending -> Done
//!                ^                          |    \                  \
//!                |                          |     TimedOut           HedgeFailed
//!                +------- NeedsResubmit <---+
//! ```
//! Any pre-fill state can move to `Failed` or `Aborted`. Only `Filled` leads
//! to a hedge.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use crate::error::ExecutionError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExecutionState {
    Idle,
    PriceComputed,
    Submitted,
    Monitoring,
    Filled,
    TimedOut,
    NeedsResubmit,
    HedgePending,
    Done,
    HedgeFailed,
    Failed,
    Aborted,
}

impl ExecutionState {
    pub fn can_transition_to(self, next: ExecutionState) -> bool {
        use ExecutionState::*;

        matches!(
            (self, next),
            (Idle, PriceComputed | Failed | Aborted)
                | (PriceComputed, Submitted | Failed | Aborted)
                | (Submitted, Monitoring | Aborted)
                | (Monitoring, Filled | TimedOut | NeedsResubmit | Aborted)
                | (NeedsResubmit, PriceComputed | Failed | Aborted)
                | (Filled, HedgePending)
                | (HedgePending, Done | HedgeFailed)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            ExecutionState::TimedOut
                | ExecutionState::Done
                | ExecutionState::HedgeFailed
                | ExecutionState::Failed
                | ExecutionState::Aborted
        )
    }
}

impl fmt::Display for ExecutionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A recorded state change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transition {
    pub from: ExecutionState,
    pub to: ExecutionState,
    pub at: DateTime<Utc>,
}

/// Tracks the current state and rejects illegal moves.
#[derive(Debug, Clone)]
pub struct StateMachine {
    state: ExecutionState,
    history: Vec<Transition>,
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl StateMachine {
    pub fn new() -> Self {
        Self {
            state: ExecutionState::Idle,
            history: Vec::new(),
        }
    }

    pub fn state(&self) -> ExecutionState {
        self.state
    }

    pub fn history(&self) -> &[Transition] {
        &self.history
    }

    pub fn transition(&mut self, next: ExecutionState) -> Result<(), ExecutionError> {
        if !self.state.can_transition_to(next) {
            return Err(ExecutionError::InvalidTransition {
                from: self.state.to_string(),
                to: next.to_string(),
            });
        }

        debug!(from = %self.state, to = %next, "State transition");
        self.history.push(Transition {
            from: self.state,
            to: next,
            at: Utc::now(),
        });
        self.state = next;
        Ok(())
    }

    /// Count of times the machine entered `state`.
    pub fn entries(&self, state: ExecutionState) -> usize {
        self.history.iter().filter(|t| t.to == state).count()
    }
}
