//! Venue-neutral market and position types.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::utils::decimal::{from_cents, round_half_up, safe_div, to_cents};

/// Integer price in cents (fixed point, 2-decimal scale).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Cents(pub i64);

impl Cents {
    /// Convert a currency amount to cents, rounding half up.
    pub fn from_decimal(value: Decimal) -> Option<Self> {
        to_cents(value).map(Cents)
    }

    /// Display value in currency units (`cents / 100`).
    pub fn to_decimal(self) -> Decimal {
        from_cents(self.0)
    }

    pub fn value(self) -> i64 {
        self.0
    }
}

impl fmt::Display for Cents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_decimal())
    }
}

/// Which side of the book a price refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QuoteSide {
    Bid,
    Ask,
}

impl fmt::Display for QuoteSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuoteSide::Bid => write!(f, "bid"),
            QuoteSide::Ask => write!(f, "ask"),
        }
    }
}

/// Top of book from the price oracle. Either side may be absent when the
/// oracle only has partial data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Quote {
    pub bid: Option<Cents>,
    pub ask: Option<Cents>,
}

impl Quote {
    pub fn new(bid: Option<Cents>, ask: Option<Cents>) -> Self {
        Self { bid, ask }
    }

    /// Quote with both sides present.
    pub fn two_sided(bid: i64, ask: i64) -> Self {
        Self::new(Some(Cents(bid)), Some(Cents(ask)))
    }

    pub fn side(&self, side: QuoteSide) -> Option<Cents> {
        match side {
            QuoteSide::Bid => self.bid,
            QuoteSide::Ask => self.ask,
        }
    }

    /// Mid price, `round((bid + ask) / 2)` half up. Needs both sides.
    pub fn mid(&self) -> Option<Cents> {
        let (bid, ask) = (self.bid?, self.ask?);
        let sum = Decimal::from(bid.0) + Decimal::from(ask.0);
        round_half_up(sum / Decimal::TWO, 0).to_i64().map(Cents)
    }

    /// True when both sides are present and bid > ask.
    pub fn is_crossed(&self) -> bool {
        matches!((self.bid, self.ask), (Some(bid), Some(ask)) if bid > ask)
    }

    pub fn is_empty(&self) -> bool {
        self.bid.is_none() && self.ask.is_none()
    }
}

/// How two position snapshots were compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillEvidence {
    /// Both snapshots carried a normalized quantity.
    Quantity,
    /// Structured data unavailable; compared the displayed text.
    Raw,
}

/// A sampled position on a venue.
///
/// Surfaces that can parse the displayed position attach a normalized
/// quantity. Comparison prefers the quantity and falls back to equality of
/// the raw displayed text when either side lacks one. An absent position
/// (nothing displayed) is a valid snapshot and compares equal only to
/// another absent position.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PositionSnapshot {
    raw: Option<String>,
    quantity: Option<Decimal>,
}

impl PositionSnapshot {
    /// No position displayed.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Opaque displayed text only.
    pub fn raw(text: impl Into<String>) -> Self {
        let text = text.into().trim().to_string();
        Self {
            raw: (!text.is_empty()).then_some(text),
            quantity: None,
        }
    }

    /// Typed quantity with its displayed rendering.
    pub fn quantity(quantity: Decimal, text: impl Into<String>) -> Self {
        Self::raw(text).with_quantity(quantity)
    }

    pub fn with_quantity(mut self, quantity: Decimal) -> Self {
        self.quantity = Some(quantity);
        self
    }

    pub fn raw_text(&self) -> Option<&str> {
        self.raw.as_deref()
    }

    pub fn qty(&self) -> Option<Decimal> {
        self.quantity
    }

    /// The comparison basis available between `self` and `other`.
    pub fn evidence_basis(&self, other: &Self) -> FillEvidence {
        if self.quantity.is_some() && other.quantity.is_some() {
            FillEvidence::Quantity
        } else {
            FillEvidence::Raw
        }
    }

    /// Whether this snapshot shows any change relative to `baseline`.
    pub fn differs_from(&self, baseline: &Self) -> bool {
        match self.evidence_basis(baseline) {
            FillEvidence::Quantity => self.quantity != baseline.quantity,
            FillEvidence::Raw => self.raw != baseline.raw,
        }
    }
}

impl fmt::Display for PositionSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.raw, self.quantity) {
            (Some(raw), _) => write!(f, "{}", raw),
            (None, Some(qty)) => write!(f, "{}", qty),
            (None, None) => write!(f, "<none>"),
        }
    }
}

/// Filled versus total size of a resting order, used for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenOrderStatus {
    pub filled: Decimal,
    pub total: Decimal,
}

impl OpenOrderStatus {
    pub fn fill_ratio(&self) -> Decimal {
        safe_div(self.filled, self.total)
    }

    pub fn is_filled(&self) -> bool {
        self.total > Decimal::ZERO && self.filled >= self.total
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_cents_display() {
        assert_eq!(Cents(9_059_700).to_string(), "90597.00");
        assert_eq!(Cents::from_decimal(dec!(90597)), Some(Cents(9_059_700)));
    }

    #[test]
    fn test_quote_mid() {
        assert_eq!(Quote::two_sided(9_060_200, 9_060_400).mid(), Some(Cents(9_060_300)));
        // Odd spread rounds half up
        assert_eq!(Quote::two_sided(100, 101).mid(), Some(Cents(101)));
        assert_eq!(Quote::new(Some(Cents(100)), None).mid(), None);
    }

    #[test]
    fn test_quote_crossed() {
        assert!(!Quote::two_sided(100, 101).is_crossed());
        assert!(Quote::two_sided(102, 101).is_crossed());
        assert!(!Quote::new(None, Some(Cents(1))).is_crossed());
        assert!(Quote::default().is_empty());
    }

    #[test]
    fn test_snapshot_raw_fallback() {
        let baseline = PositionSnapshot::raw("0.0010 BTC");
        let same = PositionSnapshot::raw("  0.0010 BTC ");
        let changed = PositionSnapshot::raw("0.0011 BTC");

        assert_eq!(same.evidence_basis(&baseline), FillEvidence::Raw);
        assert!(!same.differs_from(&baseline));
        assert!(changed.differs_from(&baseline));
    }

    #[test]
    fn test_snapshot_quantity_comparison_ignores_rendering() {
        let baseline = PositionSnapshot::quantity(dec!(0.001), "0.001 BTC");
        let rerendered = PositionSnapshot::quantity(dec!(0.00100), "0.00100 BTC");
        let filled = PositionSnapshot::quantity(dec!(0.0011), "0.0011 BTC");

        assert_eq!(rerendered.evidence_basis(&baseline), FillEvidence::Quantity);
        assert!(!rerendered.differs_from(&baseline));
        assert!(filled.differs_from(&baseline));
    }

    #[test]
    fn test_snapshot_absent_position() {
        let none = PositionSnapshot::empty();
        assert!(!PositionSnapshot::raw("   ").differs_from(&none));
        assert!(PositionSnapshot::raw("0.0001 BTC").differs_from(&none));
        assert_eq!(none.to_string(), "<none>");
    }

    #[test]
    fn test_open_order_status() {
        let partial = OpenOrderStatus { filled: dec!(0.00005), total: dec!(0.0001) };
        assert_eq!(partial.fill_ratio(), dec!(0.5));
        assert!(!partial.is_filled());

        let full = OpenOrderStatus { filled: dec!(0.0001), total: dec!(0.0001) };
        assert!(full.is_filled());
    }
}
