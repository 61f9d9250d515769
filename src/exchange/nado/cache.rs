//! Product id cache for the gateway oracle.
//!
//! Product ids never change for a listed market, so they are resolved once
//! and kept for the life of the process. Storage is injected: the oracle
//! calls [`ProductIdCache::load`] once at construction and
//! [`ProductIdCache::save`] whenever it learns a new id.

use anyhow::{anyhow, Context, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, warn};

use crate::exchange::ProductType;

/// Backing store for resolved product ids.
pub trait ProductIdCache: Send + Sync {
    fn load(&self) -> Result<HashMap<String, u32>>;
    fn save(&self, entries: &HashMap<String, u32>) -> Result<()>;
}

/// Cache key for a market, e.g. `BTC_perp`.
pub fn cache_key(symbol: &str, product: ProductType) -> String {
    format!("{}_{}", symbol.to_uppercase(), product.as_str())
}

/// JSON file store.
#[derive(Debug, Clone)]
pub struct JsonFileCache {
    path: PathBuf,
}

impl JsonFileCache {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ProductIdCache for JsonFileCache {
    fn load(&self) -> Result<HashMap<String, u32>> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "No product id cache file yet");
            return Ok(HashMap::new());
        }

        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read cache file: {}", self.path.display()))?;

        // A corrupt cache is only a missed optimization
        match serde_json::from_str(&content) {
            Ok(entries) => Ok(entries),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Ignoring unreadable product id cache");
                Ok(HashMap::new())
            }
        }
    }

    fn save(&self, entries: &HashMap<String, u32>) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let content = serde_json::to_string_pretty(entries).context("Failed to encode cache")?;
        std::fs::write(&self.path, content)
            .with_context(|| format!("Failed to write cache file: {}", self.path.display()))
    }
}

/// In-process store, used when no cache path is configured and in tests.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, u32>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entries(entries: HashMap<String, u32>) -> Self {
        Self {
            entries: Mutex::new(entries),
        }
    }
}

impl ProductIdCache for MemoryCache {
    fn load(&self) -> Result<HashMap<String, u32>> {
        self.entries
            .lock()
            .map(|entries| entries.clone())
            .map_err(|_| anyhow!("product id cache lock poisoned"))
    }

    fn save(&self, entries: &HashMap<String, u32>) -> Result<()> {
        let mut guard = self
            .entries
            .lock()
            .map_err(|_| anyhow!("product id cache lock poisoned"))?;
        *guard = entries.clone();
        Ok(())
    }
}
