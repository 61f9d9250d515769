//! Configuration-selected trading surfaces.

use anyhow::Result;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

use super::paper::PaperVenue;
use super::traits::{PriceOracle, TradingSurface};
use crate::config::{VenueConfig, VenueKind};
use crate::error::ExecutionError;

/// Trading surfaces keyed by the venue ids that trade specs refer to.
#[derive(Default)]
pub struct VenueRegistry {
    venues: HashMap<String, Arc<dyn TradingSurface>>,
}

impl VenueRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build one surface per configured venue.
    pub fn from_config(venues: &[VenueConfig], oracle: Arc<dyn PriceOracle>) -> Result<Self> {
        let mut registry = Self::new();

        for venue in venues {
            anyhow::ensure!(
                !registry.venues.contains_key(&venue.id),
                "duplicate venue id '{}'",
                venue.id
            );

            let surface: Arc<dyn TradingSurface> = match venue.kind {
                VenueKind::Paper => Arc::new(PaperVenue::new(&venue.id, oracle.clone())),
            };
            info!(venue = %venue.id, kind = ?venue.kind, "Registered venue");
            registry.register(&venue.id, surface);
        }

        Ok(registry)
    }

    pub fn register(&mut self, id: &str, surface: Arc<dyn TradingSurface>) {
        self.venues.insert(id.to_string(), surface);
    }

    pub fn surface(&self, id: &str) -> Result<Arc<dyn TradingSurface>, ExecutionError> {
        self.venues
            .get(id)
            .cloned()
            .ok_or_else(|| ExecutionError::UnknownVenue(id.to_string()))
    }

    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.venues.keys().cloned().collect();
        ids.sort();
        ids
    }
}
