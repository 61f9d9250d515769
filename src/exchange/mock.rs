//! Scripted venue and oracle doubles for exercising the execution engine.
//!
//! Unlike [`PaperVenue`](super::PaperVenue), nothing here simulates a
//! market: every answer comes from a script, and every call is recorded so
//! tests can assert on ordering (baseline read before submit, cancel before
//! resubmit, hedge after fill).

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use super::traits::{Direction, PriceOracle, ProductType, TradingSurface};
use super::types::{Cents, OpenOrderStatus, PositionSnapshot, Quote};

/// A call observed by [`ScriptedSurface`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceCall {
    Limit {
        symbol: String,
        direction: Direction,
        price: Cents,
        size: String,
    },
    Market {
        symbol: String,
        direction: Direction,
        size: String,
    },
    CancelAll {
        symbol: String,
    },
    ReadPosition {
        symbol: String,
    },
}

/// Position change scheduled relative to limit submissions.
#[derive(Debug, Clone)]
struct FillPlan {
    /// 1-based limit submission from which the fill may appear
    submission: usize,
    /// Monitor reads after that submission that still show the old position
    after_reads: usize,
    filled: PositionSnapshot,
}

#[derive(Debug, Default)]
struct ScriptState {
    position: PositionSnapshot,
    scripted_reads: VecDeque<std::result::Result<PositionSnapshot, String>>,
    fill_plan: Option<FillPlan>,
    limit_results: VecDeque<bool>,
    market_results: VecDeque<bool>,
    cancel_fails: bool,
    open_order_status: Option<OpenOrderStatus>,
    limit_submissions: usize,
    reads_since_submit: usize,
    calls: Vec<SurfaceCall>,
}

/// Trading surface whose responses are scripted up front.
#[derive(Debug)]
pub struct ScriptedSurface {
    name: String,
    state: Mutex<ScriptState>,
}

impl ScriptedSurface {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            state: Mutex::new(ScriptState::default()),
        }
    }

    fn with_state(self, f: impl FnOnce(&mut ScriptState)) -> Self {
        if let Ok(mut state) = self.state.lock() {
            f(&mut state);
        }
        self
    }

    /// Position shown until a script says otherwise.
    pub fn with_position(self, position: PositionSnapshot) -> Self {
        self.with_state(|s| s.position = position)
    }

    /// Reads returned verbatim, in order, before falling back to the sticky
    /// position. `Err` entries simulate transient read failures.
    pub fn with_reads(
        self,
        reads: impl IntoIterator<Item = std::result::Result<PositionSnapshot, String>>,
    ) -> Self {
        self.with_state(|s| s.scripted_reads.extend(reads))
    }

    /// Show `filled` once the `submission`-th limit order has been placed and
    /// `after_reads` monitor reads have passed.
    pub fn fill_on_submission(
        self,
        submission: usize,
        after_reads: usize,
        filled: PositionSnapshot,
    ) -> Self {
        self.with_state(|s| {
            s.fill_plan = Some(FillPlan {
                submission,
                after_reads,
                filled,
            })
        })
    }

    /// Outcomes of successive limit submissions (default: accepted).
    pub fn with_limit_results(self, results: impl IntoIterator<Item = bool>) -> Self {
        self.with_state(|s| s.limit_results.extend(results))
    }

    /// Outcomes of successive market submissions (default: accepted).
    pub fn with_market_results(self, results: impl IntoIterator<Item = bool>) -> Self {
        self.with_state(|s| s.market_results.extend(results))
    }

    /// Make every cancel-all fail.
    pub fn with_failing_cancel(self) -> Self {
        self.with_state(|s| s.cancel_fails = true)
    }

    pub fn with_open_order_status(self, status: OpenOrderStatus) -> Self {
        self.with_state(|s| s.open_order_status = Some(status))
    }

    pub fn calls(&self) -> Vec<SurfaceCall> {
        self.state
            .lock()
            .map(|s| s.calls.clone())
            .unwrap_or_default()
    }

    pub fn limit_orders(&self) -> Vec<SurfaceCall> {
        self.calls()
            .into_iter()
            .filter(|c| matches!(c, SurfaceCall::Limit { .. }))
            .collect()
    }

    pub fn market_orders(&self) -> Vec<SurfaceCall> {
        self.calls()
            .into_iter()
            .filter(|c| matches!(c, SurfaceCall::Market { .. }))
            .collect()
    }

    pub fn cancel_count(&self) -> usize {
        self.count(|c| matches!(c, SurfaceCall::CancelAll { .. }))
    }

    pub fn read_count(&self) -> usize {
        self.count(|c| matches!(c, SurfaceCall::ReadPosition { .. }))
    }

    fn count(&self, pred: impl Fn(&SurfaceCall) -> bool) -> usize {
        self.calls().iter().filter(|c| pred(c)).count()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, ScriptState>> {
        self.state
            .lock()
            .map_err(|_| anyhow!("scripted surface state poisoned"))
    }
}

#[async_trait]
impl TradingSurface for ScriptedSurface {
    fn name(&self) -> String {
        self.name.clone()
    }

    async fn submit_limit_order(
        &self,
        symbol: &str,
        direction: Direction,
        price: Cents,
        size: &str,
    ) -> Result<()> {
        let mut state = self.lock()?;
        state.calls.push(SurfaceCall::Limit {
            symbol: symbol.to_string(),
            direction,
            price,
            size: size.to_string(),
        });

        if !state.limit_results.pop_front().unwrap_or(true) {
            return Err(anyhow!("submit button not found"));
        }
        state.limit_submissions += 1;
        state.reads_since_submit = 0;
        Ok(())
    }

    async fn submit_market_order(
        &self,
        symbol: &str,
        direction: Direction,
        size: &str,
    ) -> Result<()> {
        let mut state = self.lock()?;
        state.calls.push(SurfaceCall::Market {
            symbol: symbol.to_string(),
            direction,
            size: size.to_string(),
        });

        if state.market_results.pop_front().unwrap_or(true) {
            Ok(())
        } else {
            Err(anyhow!("confirm button not found"))
        }
    }

    async fn cancel_all_orders(&self, symbol: &str) -> Result<()> {
        let mut state = self.lock()?;
        state.calls.push(SurfaceCall::CancelAll {
            symbol: symbol.to_string(),
        });

        if state.cancel_fails {
            Err(anyhow!("open orders tab not found"))
        } else {
            Ok(())
        }
    }

    async fn read_position(&self, symbol: &str) -> Result<PositionSnapshot> {
        let mut state = self.lock()?;
        state.calls.push(SurfaceCall::ReadPosition {
            symbol: symbol.to_string(),
        });

        if let Some(read) = state.scripted_reads.pop_front() {
            return read.map_err(|e| anyhow!(e));
        }

        if state.limit_submissions > 0 {
            state.reads_since_submit += 1;
        }
        let fill_due = state.fill_plan.as_ref().is_some_and(|plan| {
            state.limit_submissions >= plan.submission
                && state.reads_since_submit > plan.after_reads
        });
        if fill_due {
            if let Some(plan) = state.fill_plan.take() {
                state.position = plan.filled;
            }
        }

        Ok(state.position.clone())
    }

    async fn open_orders_status(&self, _symbol: &str, _price: Cents) -> Option<OpenOrderStatus> {
        self.state.lock().ok().and_then(|s| s.open_order_status)
    }
}

/// Price oracle returning scripted quotes.
#[derive(Debug, Default)]
pub struct ScriptedOracle {
    quotes: Mutex<VecDeque<Option<Quote>>>,
    fallback: Option<Quote>,
    calls: AtomicUsize,
}

impl ScriptedOracle {
    /// Always returns `quote`.
    pub fn fixed(quote: Quote) -> Self {
        Self {
            fallback: Some(quote),
            ..Self::default()
        }
    }

    /// Always returns `None`.
    pub fn unavailable() -> Self {
        Self::default()
    }

    /// Answers returned in order before the fixed quote.
    pub fn with_sequence(self, quotes: impl IntoIterator<Item = Option<Quote>>) -> Self {
        if let Ok(mut queue) = self.quotes.lock() {
            queue.extend(quotes);
        }
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PriceOracle for ScriptedOracle {
    async fn get_quote(&self, _symbol: &str, _product: ProductType) -> Option<Quote> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.quotes
            .lock()
            .ok()
            .and_then(|mut q| q.pop_front())
            .unwrap_or(self.fallback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fill_plan_changes_position_after_reads() {
        let filled = PositionSnapshot::raw("0.0001 BTC");
        let surface = ScriptedSurface::new("primary").fill_on_submission(1, 1, filled.clone());

        // Baseline before any submission
        assert_eq!(surface.read_position("BTC").await.unwrap(), PositionSnapshot::empty());

        surface
            .submit_limit_order("BTC", Direction::Long, Cents(100), "0.0001")
            .await
            .unwrap();

        assert_eq!(surface.read_position("BTC").await.unwrap(), PositionSnapshot::empty());
        assert_eq!(surface.read_position("BTC").await.unwrap(), filled);
        assert_eq!(surface.read_count(), 3);
    }

    #[tokio::test]
    async fn test_scripted_reads_and_results() {
        let surface = ScriptedSurface::new("primary")
            .with_reads(vec![Err("timeout".to_string())])
            .with_limit_results(vec![false]);

        assert!(surface.read_position("BTC").await.is_err());
        assert!(surface
            .submit_limit_order("BTC", Direction::Short, Cents(1), "1")
            .await
            .is_err());
        assert!(surface.cancel_all_orders("BTC").await.is_ok());
        assert_eq!(surface.cancel_count(), 1);
    }

    #[tokio::test]
    async fn test_scripted_oracle_sequence_then_fixed() {
        let oracle = ScriptedOracle::fixed(Quote::two_sided(1, 2)).with_sequence(vec![None]);

        assert_eq!(oracle.get_quote("BTC", ProductType::Perp).await, None);
        assert_eq!(
            oracle.get_quote("BTC", ProductType::Perp).await,
            Some(Quote::two_sided(1, 2))
        );
        assert_eq!(oracle.call_count(), 2);
    }
}
