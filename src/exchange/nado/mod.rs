//! Nado gateway integration.
//!
//! Read-only price oracle for the primary venue:
//! - Symbol to product id resolution (cached through [`ProductIdCache`])
//! - Top-of-book quotes from the `market_price` query
//!
//! # Price Encoding
//!
//! The gateway reports prices as 18-decimal fixed-point integers
//! (`bid_x18`, `ask_x18`). They are converted exactly and then rounded half
//! up to cents before reaching the engine.

mod cache;
mod client;
mod types;

pub use cache::{cache_key, JsonFileCache, MemoryCache, ProductIdCache};
pub use client::NadoGatewayClient;
pub use types::*;
