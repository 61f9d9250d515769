//! Paper trading venue for dry runs.
//!
//! Rests limit orders in memory and fills them once the oracle quote trades
//! through the limit price. Market orders fill immediately. Positions are
//! reported as typed snapshots so fill detection compares quantities.

use anyhow::{Context, Result};
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

use super::traits::{Direction, PriceOracle, ProductType, TradingSurface};
use super::types::{Cents, OpenOrderStatus, PositionSnapshot, Quote};

/// A resting paper limit order.
#[derive(Debug, Clone)]
pub struct PaperOrder {
    pub order_id: u64,
    pub symbol: String,
    pub direction: Direction,
    pub price: Cents,
    pub size: Decimal,
}

impl PaperOrder {
    /// Whether `quote` trades through this order's limit.
    fn crosses(&self, quote: &Quote) -> bool {
        match self.direction {
            Direction::Long => quote.ask.is_some_and(|ask| ask <= self.price),
            Direction::Short => quote.bid.is_some_and(|bid| bid >= self.price),
        }
    }

    fn signed_size(&self) -> Decimal {
        signed(self.direction, self.size)
    }
}

fn signed(direction: Direction, size: Decimal) -> Decimal {
    match direction {
        Direction::Long => size,
        Direction::Short => -size,
    }
}

fn parse_size(size: &str) -> Result<Decimal> {
    let size: Decimal = size
        .trim()
        .parse()
        .with_context(|| format!("invalid order size '{}'", size))?;
    anyhow::ensure!(size > Decimal::ZERO, "order size must be positive");
    Ok(size)
}

/// Paper venue state.
#[derive(Debug, Default, Clone)]
pub struct PaperState {
    pub positions: HashMap<String, Decimal>,
    pub open_orders: Vec<PaperOrder>,
    pub order_count: u64,
    pub fill_count: u64,
}

/// Simulated venue driven by a price oracle.
pub struct PaperVenue {
    name: String,
    state: Arc<RwLock<PaperState>>,
    order_id_counter: AtomicU64,
    oracle: Arc<dyn PriceOracle>,
    product: ProductType,
}

impl PaperVenue {
    pub fn new(name: &str, oracle: Arc<dyn PriceOracle>) -> Self {
        Self {
            name: name.to_string(),
            state: Arc::new(RwLock::new(PaperState::default())),
            order_id_counter: AtomicU64::new(1),
            oracle,
            product: ProductType::Perp,
        }
    }

    /// Seed a starting position.
    pub async fn set_position(&self, symbol: &str, quantity: Decimal) {
        self.state
            .write()
            .await
            .positions
            .insert(symbol.to_uppercase(), quantity);
    }

    pub async fn get_state(&self) -> PaperState {
        self.state.read().await.clone()
    }

    fn next_order_id(&self) -> u64 {
        self.order_id_counter.fetch_add(1, Ordering::SeqCst)
    }

    /// Fill every resting order for `symbol` that the current quote crosses.
    async fn match_orders(&self, symbol: &str) {
        let Some(quote) = self.oracle.get_quote(symbol, self.product).await else {
            return;
        };

        let mut state = self.state.write().await;
        let (crossed, resting): (Vec<_>, Vec<_>) = std::mem::take(&mut state.open_orders)
            .into_iter()
            .partition(|o| o.symbol == symbol && o.crosses(&quote));
        state.open_orders = resting;

        for order in crossed {
            *state.positions.entry(order.symbol.clone()).or_default() += order.signed_size();
            state.fill_count += 1;
            info!(
                venue = %self.name,
                order_id = order.order_id,
                symbol = %order.symbol,
                direction = %order.direction,
                price = %order.price,
                size = %order.size,
                "Paper limit order filled"
            );
        }
    }
}

#[async_trait]
impl TradingSurface for PaperVenue {
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
        let size = parse_size(size)?;
        anyhow::ensure!(price.value() > 0, "limit price must be positive");

        let order = PaperOrder {
            order_id: self.next_order_id(),
            symbol: symbol.to_uppercase(),
            direction,
            price,
            size,
        };
        debug!(venue = %self.name, ?order, "Paper limit order resting");

        let mut state = self.state.write().await;
        state.open_orders.push(order);
        state.order_count += 1;
        Ok(())
    }

    async fn submit_market_order(
        &self,
        symbol: &str,
        direction: Direction,
        size: &str,
    ) -> Result<()> {
        let size = parse_size(size)?;
        let symbol = symbol.to_uppercase();

        let mut state = self.state.write().await;
        *state.positions.entry(symbol.clone()).or_default() += signed(direction, size);
        state.order_count += 1;
        state.fill_count += 1;

        info!(venue = %self.name, %symbol, %direction, %size, "Paper market order filled");
        Ok(())
    }

    async fn cancel_all_orders(&self, symbol: &str) -> Result<()> {
        let symbol = symbol.to_uppercase();
        let mut state = self.state.write().await;
        let before = state.open_orders.len();
        state.open_orders.retain(|o| o.symbol != symbol);

        debug!(
            venue = %self.name,
            %symbol,
            cancelled = before - state.open_orders.len(),
            "Paper orders cancelled"
        );
        Ok(())
    }

    async fn read_position(&self, symbol: &str) -> Result<PositionSnapshot> {
        let symbol = symbol.to_uppercase();
        self.match_orders(&symbol).await;

        let state = self.state.read().await;
        let quantity = state
            .positions
            .get(&symbol)
            .copied()
            .unwrap_or_default();

        Ok(PositionSnapshot::quantity(
            quantity,
            format!("{} {}", quantity.normalize(), symbol),
        ))
    }

    async fn open_orders_status(&self, symbol: &str, price: Cents) -> Option<OpenOrderStatus> {
        let symbol = symbol.to_uppercase();
        self.state
            .read()
            .await
            .open_orders
            .iter()
            .find(|o| o.symbol == symbol && o.price == price)
            .map(|o| OpenOrderStatus {
                filled: Decimal::ZERO,
                total: o.size,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exchange::mock::ScriptedOracle;
    use rust_decimal_macros::dec;

    fn venue_with_quotes(quotes: Vec<Option<Quote>>, fallback: Quote) -> PaperVenue {
        let oracle = ScriptedOracle::fixed(fallback).with_sequence(quotes);
        PaperVenue::new("paper", Arc::new(oracle))
    }

    #[tokio::test]
    async fn test_limit_order_rests_until_crossed() {
        // Resting bid at 90597.00; ask first 90604.00, then trades down to 90597.00
        let venue = venue_with_quotes(
            vec![Some(Quote::two_sided(9_060_200, 9_060_400))],
            Quote::two_sided(9_059_500, 9_059_700),
        );

        venue
            .submit_limit_order("BTC", Direction::Long, Cents(9_059_700), "0.0001")
            .await
            .unwrap();

        let first = venue.read_position("BTC").await.unwrap();
        assert_eq!(first.qty(), Some(Decimal::ZERO));
        assert_eq!(
            venue.open_orders_status("BTC", Cents(9_059_700)).await,
            Some(OpenOrderStatus { filled: Decimal::ZERO, total: dec!(0.0001) })
        );

        let second = venue.read_position("BTC").await.unwrap();
        assert_eq!(second.qty(), Some(dec!(0.0001)));
        assert!(second.differs_from(&first));
        assert_eq!(second.raw_text(), Some("0.0001 BTC"));
        assert!(venue.get_state().await.open_orders.is_empty());
    }

    #[tokio::test]
    async fn test_short_limit_fills_when_bid_reaches_price() {
        let venue = venue_with_quotes(vec![], Quote::two_sided(9_061_000, 9_061_200));

        venue
            .submit_limit_order("BTC", Direction::Short, Cents(9_060_900), "0.5")
            .await
            .unwrap();

        let snapshot = venue.read_position("btc").await.unwrap();
        assert_eq!(snapshot.qty(), Some(dec!(-0.5)));
    }

    #[tokio::test]
    async fn test_cancel_all_is_idempotent() {
        let venue = venue_with_quotes(vec![], Quote::two_sided(100, 200));

        assert!(venue.cancel_all_orders("BTC").await.is_ok());

        venue
            .submit_limit_order("BTC", Direction::Long, Cents(50), "1")
            .await
            .unwrap();
        assert!(venue.cancel_all_orders("BTC").await.is_ok());
        assert!(venue.cancel_all_orders("BTC").await.is_ok());
        assert!(venue.get_state().await.open_orders.is_empty());
    }

    #[tokio::test]
    async fn test_market_order_fills_immediately() {
        let venue = venue_with_quotes(vec![], Quote::two_sided(100, 200));
        venue.set_position("ETH", dec!(1)).await;

        venue
            .submit_market_order("ETH", Direction::Short, "0.25")
            .await
            .unwrap();

        let snapshot = venue.read_position("ETH").await.unwrap();
        assert_eq!(snapshot.qty(), Some(dec!(0.75)));
    }

    #[tokio::test]
    async fn test_invalid_size_rejected() {
        let venue = venue_with_quotes(vec![], Quote::two_sided(100, 200));

        assert!(venue
            .submit_limit_order("BTC", Direction::Long, Cents(100), "abc")
            .await
            .is_err());
        assert!(venue
            .submit_market_order("BTC", Direction::Long, "0")
            .await
            .is_err());
    }
}
