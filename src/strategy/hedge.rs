//! Secondary-leg hedge.
//!
//! The hedge is a single market order with no retry and no fill check: an
//! acknowledged submission is taken as success. This is weaker than the
//! primary leg, which only counts a fill once the position moves, so a
//! failure here leaves the trade "primary filled, hedge unconfirmed".

use tracing::{error, info, warn};

use crate::config::TradeSpec;
use crate::error::ExecutionError;
use crate::exchange::{Direction, TradingSurface};

#[derive(Debug, Default, Clone, Copy)]
pub struct HedgeExecutor;

impl HedgeExecutor {
    pub fn new() -> Self {
        Self
    }

    /// Submit the offsetting market order on `secondary`.
    pub async fn execute_hedge(
        &self,
        secondary: &dyn TradingSurface,
        spec: &TradeSpec,
        direction: Direction,
    ) -> Result<(), ExecutionError> {
        let venue = secondary.name();
        info!(
            %venue,
            symbol = %spec.symbol,
            %direction,
            size = %spec.size,
            "Submitting hedge"
        );

        match secondary
            .submit_market_order(&spec.symbol, direction, &spec.size)
            .await
        {
            Ok(()) => {
                warn!(%venue, symbol = %spec.symbol, "Hedge acknowledged, fill not verified");
                Ok(())
            }
            Err(e) => {
                error!(%venue, symbol = %spec.symbol, error = %e, "Hedge submission failed");
                Err(ExecutionError::HedgeUnconfirmed {
                    venue,
                    reason: e.to_string(),
                })
            }
        }
    }
}
