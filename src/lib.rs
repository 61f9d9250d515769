//! # Cross-Venue Hedger
//!
//! Opens a position with a passive limit order on a primary venue and, once
//! the fill is observed, hedges it with an opposite market order on a
//! secondary venue.
//!
//! ## Architecture
//!
//! - `config`: Configuration management, validation and trade specs
//! - `error`: Execution error taxonomy
//! - `exchange`: Venue traits, gateway price oracle, paper and scripted venues
//! - `strategy`: Pricing, fill monitoring, retry and hedge execution
//! - `utils`: Shared utilities and decimal arithmetic

pub mod config;
pub mod error;
pub mod exchange;
pub mod strategy;
pub mod utils;

pub use config::Config;
pub use error::ExecutionError;
