//! Venue-agnostic capabilities consumed by the execution engine.
//!
//! Every venue implements [`TradingSurface`] once; which implementation a
//! trade uses is decided by configuration (see
//! [`VenueRegistry`](super::VenueRegistry)), never by branching on a venue
//! name inside the engine.

use anyhow::Result;
use async_trait::async_trait;
use std::fmt;

#[cfg(test)]
use mockall::automock;

use super::types::{Cents, OpenOrderStatus, PositionSnapshot, Quote, QuoteSide};

/// Order direction on a single venue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Long,
    Short,
}

impl Direction {
    /// The offsetting direction used by the hedge leg.
    pub fn opposite(self) -> Self {
        match self {
            Direction::Long => Direction::Short,
            Direction::Short => Direction::Long,
        }
    }

    /// Reference side for a passive limit price: longs bid, shorts offer.
    pub fn reference_side(self) -> QuoteSide {
        match self {
            Direction::Long => QuoteSide::Bid,
            Direction::Short => QuoteSide::Ask,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Long => write!(f, "long"),
            Direction::Short => write!(f, "short"),
        }
    }
}

/// Product family queried from the price oracle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProductType {
    Spot,
    Perp,
}

impl ProductType {
    /// Wire name used in oracle queries.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductType::Spot => "spot",
            ProductType::Perp => "perp",
        }
    }

    /// Suffix of the oracle's market key, e.g. `BTC-PERP`.
    pub fn market_suffix(&self) -> &'static str {
        match self {
            ProductType::Spot => "SPOT",
            ProductType::Perp => "PERP",
        }
    }
}

impl fmt::Display for ProductType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Order entry and position readout on one venue.
///
/// A handle is used by a single executor at a time; implementations need no
/// internal ordering beyond what one in-flight attempt requires.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait TradingSurface: Send + Sync {
    /// Venue identifier for logs and errors.
    fn name(&self) -> String;

    /// Place a limit order. `Ok` means the venue acknowledged the submission.
    async fn submit_limit_order(
        &self,
        symbol: &str,
        direction: Direction,
        price: Cents,
        size: &str,
    ) -> Result<()>;

    /// Place a market order (side, size, confirm) in one shot.
    async fn submit_market_order(&self, symbol: &str, direction: Direction, size: &str)
        -> Result<()>;

    /// Cancel every open order for `symbol`. Must succeed when none are open.
    async fn cancel_all_orders(&self, symbol: &str) -> Result<()>;

    /// Sample the displayed position for `symbol`.
    async fn read_position(&self, symbol: &str) -> Result<PositionSnapshot>;

    /// Filled/total of the open order resting at `price`, when the venue can
    /// report it.
    async fn open_orders_status(&self, _symbol: &str, _price: Cents) -> Option<OpenOrderStatus> {
        None
    }
}

/// Source of top-of-book quotes.
///
/// Implementations own their caching and rate-limit retry; `None` means the
/// quote could not be obtained, and callers treat it as both sides missing.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait PriceOracle: Send + Sync {
    async fn get_quote(&self, symbol: &str, product: ProductType) -> Option<Quote>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_helpers() {
        assert_eq!(Direction::Long.opposite(), Direction::Short);
        assert_eq!(Direction::Short.opposite(), Direction::Long);
        assert_eq!(Direction::Long.reference_side(), QuoteSide::Bid);
        assert_eq!(Direction::Short.reference_side(), QuoteSide::Ask);
        assert_eq!(Direction::Short.to_string(), "short");
    }

    #[test]
    fn test_product_type_names() {
        assert_eq!(ProductType::Perp.as_str(), "perp");
        assert_eq!(ProductType::Spot.market_suffix(), "SPOT");
    }
}
