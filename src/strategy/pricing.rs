//! Limit price calculation.
//!
//! Orders always rest passively away from the touch: a buy sits `|offset|`
//! below the best bid, a sell `|offset|` above the best ask. The offset is
//! scaled to cents (round half up) before any arithmetic, so every price the
//! engine submits is an exact integer number of cents.

use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{debug, info};

use crate::error::ExecutionError;
use crate::exchange::{Cents, Direction, PriceOracle, ProductType, Quote};
use crate::utils::decimal::to_cents;

/// Turns oracle quotes into limit prices.
#[derive(Clone)]
pub struct PriceCalculator {
    oracle: Arc<dyn PriceOracle>,
    product: ProductType,
}

impl PriceCalculator {
    pub fn new(oracle: Arc<dyn PriceOracle>) -> Self {
        Self {
            oracle,
            product: ProductType::Perp,
        }
    }

    pub fn with_product(mut self, product: ProductType) -> Self {
        self.product = product;
        self
    }

    /// Compute the limit price for `direction` from `quote`.
    ///
    /// Long: `bid - |offset|`. Short: `ask + |offset|`. The sign of the
    /// configured offset is ignored.
    pub fn compute_order_price(
        symbol: &str,
        quote: &Quote,
        offset: Decimal,
        direction: Direction,
    ) -> Result<Cents, ExecutionError> {
        let side = direction.reference_side();
        let reference = quote
            .side(side)
            .ok_or_else(|| ExecutionError::MissingQuoteSide {
                symbol: symbol.to_string(),
                side,
            })?;

        let invalid = |reason: String| ExecutionError::InvalidPrice {
            symbol: symbol.to_string(),
            reason,
        };

        let offset_cents = to_cents(offset.abs())
            .ok_or_else(|| invalid(format!("offset {} out of range", offset)))?;

        let price = match direction {
            Direction::Long => reference.value().checked_sub(offset_cents),
            Direction::Short => reference.value().checked_add(offset_cents),
        }
        .ok_or_else(|| invalid("price overflow".to_string()))?;

        if price <= 0 {
            return Err(invalid(format!(
                "{} {} minus offset {} is not positive",
                side, reference, offset
            )));
        }

        Ok(Cents(price))
    }

    /// Fetch a fresh quote and price an order from it.
    ///
    /// An unavailable quote is treated as missing the required side. May
    /// block for several seconds while the oracle backs off a rate limit.
    pub async fn quote_order_price(
        &self,
        symbol: &str,
        offset: Decimal,
        direction: Direction,
    ) -> Result<(Quote, Cents), ExecutionError> {
        let quote = self
            .oracle
            .get_quote(symbol, self.product)
            .await
            .unwrap_or_default();
        debug!(%symbol, bid = ?quote.bid, ask = ?quote.ask, "Fetched quote");

        let price = Self::compute_order_price(symbol, &quote, offset, direction)?;

        let reference = quote.side(direction.reference_side());
        info!(
            %symbol,
            %direction,
            reference = ?reference.map(|c| c.to_decimal()),
            order_price = %price,
            %offset,
            "Order price computed"
        );

        Ok((quote, price))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exchange::mock::ScriptedOracle;
    use crate::exchange::QuoteSide;
    use rust_decimal_macros::dec;

    const QUOTE: Quote = Quote {
        bid: Some(Cents(9_060_200)),
        ask: Some(Cents(9_060_400)),
    };

    #[test]
    fn test_long_price_below_bid() {
        let price =
            PriceCalculator::compute_order_price("BTC", &QUOTE, dec!(5.00), Direction::Long)
                .unwrap();
        assert_eq!(price, Cents(9_059_700));
    }

    #[test]
    fn test_offset_sign_is_ignored() {
        let positive =
            PriceCalculator::compute_order_price("BTC", &QUOTE, dec!(5), Direction::Long).unwrap();
        let negative =
            PriceCalculator::compute_order_price("BTC", &QUOTE, dec!(-5), Direction::Long).unwrap();
        assert_eq!(positive, negative);

        let short =
            PriceCalculator::compute_order_price("BTC", &QUOTE, dec!(-5), Direction::Short).unwrap();
        assert_eq!(short, Cents(9_060_900));
    }

    #[test]
    fn test_price_never_crosses_the_touch() {
        for offset in [dec!(0), dec!(0.01), dec!(1.5), dec!(-12.34), dec!(100)] {
            let long =
                PriceCalculator::compute_order_price("BTC", &QUOTE, offset, Direction::Long)
                    .unwrap();
            let short =
                PriceCalculator::compute_order_price("BTC", &QUOTE, offset, Direction::Short)
                    .unwrap();

            assert!(long <= QUOTE.bid.unwrap());
            assert!(short >= QUOTE.ask.unwrap());
            assert_eq!(long == QUOTE.bid.unwrap(), offset.is_zero());
            assert_eq!(short == QUOTE.ask.unwrap(), offset.is_zero());
        }
    }

    #[test]
    fn test_offset_rounds_half_up_to_cents() {
        let price =
            PriceCalculator::compute_order_price("BTC", &QUOTE, dec!(0.005), Direction::Long)
                .unwrap();
        assert_eq!(price, Cents(9_060_199));

        let price =
            PriceCalculator::compute_order_price("BTC", &QUOTE, dec!(0.004), Direction::Short)
                .unwrap();
        assert_eq!(price, Cents(9_060_400));
    }

    #[test]
    fn test_missing_side() {
        let quote = Quote::new(None, Some(Cents(100)));
        let err = PriceCalculator::compute_order_price("ETH", &quote, dec!(1), Direction::Long)
            .unwrap_err();
        assert_eq!(
            err,
            ExecutionError::MissingQuoteSide {
                symbol: "ETH".to_string(),
                side: QuoteSide::Bid,
            }
        );

        // Ask side present, so short still prices
        assert!(
            PriceCalculator::compute_order_price("ETH", &quote, dec!(1), Direction::Short).is_ok()
        );
    }

    #[test]
    fn test_non_positive_price_rejected() {
        let quote = Quote::two_sided(300, 400);
        let err = PriceCalculator::compute_order_price("DOGE", &quote, dec!(5), Direction::Long)
            .unwrap_err();
        assert!(matches!(err, ExecutionError::InvalidPrice { .. }));
    }

    #[tokio::test]
    async fn test_unavailable_quote_is_missing_side() {
        let calculator = PriceCalculator::new(Arc::new(ScriptedOracle::unavailable()));

        let err = calculator
            .quote_order_price("BTC", dec!(-5), Direction::Short)
            .await
            .unwrap_err();
        assert_eq!(
            err,
            ExecutionError::MissingQuoteSide {
                symbol: "BTC".to_string(),
                side: QuoteSide::Ask,
            }
        );
    }

    #[tokio::test]
    async fn test_quote_order_price_uses_fresh_quote() {
        let oracle = Arc::new(ScriptedOracle::fixed(QUOTE));
        let calculator = PriceCalculator::new(oracle.clone());

        let (quote, price) = calculator
            .quote_order_price("BTC", dec!(-5.00), Direction::Long)
            .await
            .unwrap();
        assert_eq!(quote, QUOTE);
        assert_eq!(price, Cents(9_059_700));
        assert_eq!(oracle.call_count(), 1);
    }
}
