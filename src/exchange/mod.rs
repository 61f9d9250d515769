//! Venue integrations for the hedge engine.
//!
//! ## Traits
//! - [`TradingSurface`]: order entry and position readout, one implementation
//!   per venue
//! - [`PriceOracle`]: top-of-book quotes
//!
//! ## Nado
//! Gateway price oracle with product id caching and rate-limit backoff.
//!
//! ## Paper
//! Simulated venue for dry runs, selected through [`VenueRegistry`].

#[cfg(test)]
pub(crate) mod mock;
pub mod nado;
mod paper;
mod registry;
mod traits;
mod types;

pub use nado::NadoGatewayClient;
pub use paper::{PaperOrder, PaperState, PaperVenue};
pub use registry::VenueRegistry;
pub use traits::*;
pub use types::*;
