//! Type definitions for Nado gateway responses.

use serde::{Deserialize, Deserializer};
use std::collections::HashMap;

use crate::exchange::types::{Cents, Quote};
use crate::utils::decimal::from_x18;

/// Envelope shared by gateway query responses.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayResponse<T> {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub data: Option<T>,
}

impl<T> GatewayResponse<T> {
    /// True unless the gateway explicitly reported a non-success status.
    pub fn is_success(&self) -> bool {
        self.status.as_deref().map_or(true, |s| s == "success")
    }
}

/// Payload of `type=symbols`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SymbolsData {
    /// Keyed by market name, e.g. `BTC-PERP`.
    #[serde(default)]
    pub symbols: HashMap<String, SymbolInfo>,
}

/// A single market in the symbols listing.
#[derive(Debug, Clone, Deserialize)]
pub struct SymbolInfo {
    pub product_id: u32,
    #[serde(default)]
    pub symbol: Option<String>,
}

/// Payload of `type=market_price`.
///
/// Some deployments return the price fields at the top level instead of under
/// `data`; both shapes deserialize into this struct.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MarketPriceData {
    #[serde(default)]
    pub product_id: Option<u32>,
    #[serde(default, deserialize_with = "deserialize_x18_option")]
    pub bid_x18: Option<String>,
    #[serde(default, deserialize_with = "deserialize_x18_option")]
    pub ask_x18: Option<String>,
}

impl MarketPriceData {
    /// Convert the raw x18 fields to a cents quote. Unparseable or empty
    /// fields become absent sides.
    pub fn to_quote(&self) -> Quote {
        let side = |raw: &Option<String>| {
            raw.as_deref()
                .and_then(from_x18)
                .and_then(Cents::from_decimal)
        };
        Quote::new(side(&self.bid_x18), side(&self.ask_x18))
    }

    pub fn has_prices(&self) -> bool {
        self.bid_x18.is_some() || self.ask_x18.is_some()
    }
}

/// `market_price` response in either nested or flat shape.
#[derive(Debug, Clone, Deserialize)]
pub struct MarketPriceResponse {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub data: Option<MarketPriceData>,
    #[serde(flatten)]
    pub inline: MarketPriceData,
}

impl MarketPriceResponse {
    pub fn is_success(&self) -> bool {
        self.status.as_deref().map_or(true, |s| s == "success")
    }

    /// The price payload, preferring the nested `data` section.
    pub fn prices(&self) -> &MarketPriceData {
        self.data.as_ref().unwrap_or(&self.inline)
    }
}

// x18 values arrive as strings. Bare JSON integers are accepted while they
// fit in 64 bits; anything larger only survives as a string, so such a side
// reads as absent instead of failing the whole response.
fn deserialize_x18_option<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt: Option<serde_json::Value> = Option::deserialize(deserializer)?;
    Ok(match opt {
        Some(serde_json::Value::String(s)) if !s.trim().is_empty() => Some(s),
        Some(serde_json::Value::Number(n)) => n
            .as_u64()
            .map(|v| v.to_string())
            .or_else(|| n.as_i64().map(|v| v.to_string())),
        _ => None,
    })
}
