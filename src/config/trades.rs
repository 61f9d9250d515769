//! Trade specifications and the CSV file they are loaded from.
//!
//! Expected format (header-addressed, column order is free):
//! ```csv
//! primary_venue,secondary_venue,symbol,size,price_offset
//! nado,variational,btc,0.0001,-5
//! ```
//! `nado_env_id` and `variational_env_id` are accepted as aliases for the
//! venue columns.

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// One hedged trade to execute. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeSpec {
    /// Uppercase base symbol, e.g. `BTC`
    pub symbol: String,
    /// Order size in venue-native units, passed through as text
    pub size: String,
    /// Distance from the touch in quote currency
    pub price_offset: Decimal,
    pub primary_venue: String,
    pub secondary_venue: String,
}

impl TradeSpec {
    pub fn new(
        symbol: &str,
        size: &str,
        price_offset: Decimal,
        primary_venue: &str,
        secondary_venue: &str,
    ) -> Self {
        Self {
            symbol: symbol.trim().to_uppercase(),
            size: size.trim().to_string(),
            price_offset,
            primary_venue: primary_venue.trim().to_string(),
            secondary_venue: secondary_venue.trim().to_string(),
        }
    }
}

/// Supplies trade specifications in execution order.
pub trait ConfigSource: Send + Sync {
    fn load(&self) -> Result<Vec<TradeSpec>>;
}

const DEFAULT_SIZE: &str = "0.0001";
const DEFAULT_PRICE_OFFSET: Decimal = dec!(-5);

const PRIMARY_COLUMNS: [&str; 2] = ["primary_venue", "nado_env_id"];
const SECONDARY_COLUMNS: [&str; 2] = ["secondary_venue", "variational_env_id"];

/// Where the CSV text comes from.
#[derive(Debug, Clone)]
enum CsvInput {
    File(PathBuf),
    Inline(String),
}

/// CSV-backed [`ConfigSource`].
#[derive(Debug, Clone)]
pub struct CsvTradeSource {
    input: CsvInput,
}

impl CsvTradeSource {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Self {
        Self {
            input: CsvInput::File(path.as_ref().to_path_buf()),
        }
    }

    pub fn from_content(content: &str) -> Self {
        Self {
            input: CsvInput::Inline(content.to_string()),
        }
    }

    fn parse(content: &str) -> Result<Vec<TradeSpec>> {
        let mut lines = content
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty());

        let Some((_, header)) = lines.next() else {
            return Ok(Vec::new());
        };
        let columns: HashMap<String, usize> = header
            .trim_start_matches('\u{feff}')
            .split(',')
            .enumerate()
            .map(|(i, name)| (name.trim().to_lowercase(), i))
            .collect();

        anyhow::ensure!(
            columns.contains_key("symbol"),
            "CSV header is missing the 'symbol' column"
        );

        let mut specs = Vec::new();
        for (line_num, line) in lines {
            let fields: Vec<&str> = line.split(',').map(str::trim).collect();
            let field = |names: &[&str]| {
                names
                    .iter()
                    .filter_map(|name| columns.get(*name))
                    .filter_map(|&i| fields.get(i).copied())
                    .find(|value| !value.is_empty())
            };

            let (Some(primary), Some(secondary), Some(symbol)) = (
                field(&PRIMARY_COLUMNS),
                field(&SECONDARY_COLUMNS),
                field(&["symbol"]),
            ) else {
                debug!(line = line_num + 1, "Skipping incomplete trade row");
                continue;
            };

            let size = field(&["size"]).unwrap_or(DEFAULT_SIZE);
            let price_offset = match field(&["price_offset"]) {
                Some(raw) => raw.parse::<Decimal>().with_context(|| {
                    format!("Invalid price_offset on line {}: {}", line_num + 1, raw)
                })?,
                None => DEFAULT_PRICE_OFFSET,
            };

            specs.push(TradeSpec::new(symbol, size, price_offset, primary, secondary));
        }

        Ok(specs)
    }
}

impl ConfigSource for CsvTradeSource {
    fn load(&self) -> Result<Vec<TradeSpec>> {
        match &self.input {
            CsvInput::File(path) => {
                let content = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read trades file: {}", path.display()))?;
                Self::parse(&content)
                    .with_context(|| format!("Failed to parse trades file: {}", path.display()))
            }
            CsvInput::Inline(content) => Self::parse(content),
        }
    }
}
