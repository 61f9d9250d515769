//! Nado gateway REST client.
//!
//! Provides the price oracle used to quote primary-leg limit orders:
//! - Product id lookup per symbol and product type
//! - Best bid/ask from `market_price`, with exponential backoff on HTTP 429

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};

use super::cache::{cache_key, ProductIdCache};
use super::types::*;
use crate::config::OracleConfig;
use crate::exchange::traits::{PriceOracle, ProductType};
use crate::exchange::types::Quote;

/// Gateway client with a process-scoped product id cache.
pub struct NadoGatewayClient {
    http: Client,
    base_url: String,
    max_attempts: u32,
    backoff_base: Duration,
    cache: Box<dyn ProductIdCache>,
    product_ids: RwLock<HashMap<String, u32>>,
}

impl NadoGatewayClient {
    /// Create a client and load previously resolved product ids from `cache`.
    pub fn new(config: &OracleConfig, cache: Box<dyn ProductIdCache>) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .context("Failed to create HTTP client")?;

        let product_ids = cache.load().unwrap_or_else(|e| {
            warn!(error = %e, "Failed to load product id cache, starting empty");
            HashMap::new()
        });
        debug!("Loaded {} cached product ids", product_ids.len());

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            max_attempts: config.max_attempts.max(1),
            backoff_base: Duration::from_millis(config.backoff_base_ms),
            cache,
            product_ids: RwLock::new(product_ids),
        })
    }

    fn query_url(&self) -> String {
        format!("{}/query", self.base_url)
    }

    /// Resolve the product id for `symbol`, consulting the cache first.
    ///
    /// Returns `Ok(None)` when the gateway does not list the market.
    #[instrument(skip(self), name = "nado_product_id")]
    pub async fn product_id(&self, symbol: &str, product: ProductType) -> Result<Option<u32>> {
        let key = cache_key(symbol, product);
        if let Some(&id) = self.product_ids.read().await.get(&key) {
            return Ok(Some(id));
        }

        let Some(id) = self.fetch_product_id(symbol, product).await? else {
            info!(%symbol, %product, "Market not listed on gateway");
            return Ok(None);
        };

        let mut ids = self.product_ids.write().await;
        ids.insert(key, id);
        if let Err(e) = self.cache.save(&ids) {
            warn!(error = %e, "Failed to persist product id cache");
        }

        Ok(Some(id))
    }

    async fn fetch_product_id(&self, symbol: &str, product: ProductType) -> Result<Option<u32>> {
        let response = self
            .http
            .get(self.query_url())
            .query(&[("type", "symbols"), ("product_type", product.as_str())])
            .send()
            .await
            .context("Failed to send symbols request")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Nado gateway error {}: {}", status, body);
        }

        let resp: GatewayResponse<SymbolsData> = response
            .json()
            .await
            .context("Failed to parse symbols response")?;

        if !resp.is_success() {
            anyhow::bail!(
                "Nado symbols query failed: {}",
                resp.error.unwrap_or_default()
            );
        }

        let market = format!("{}-{}", symbol.to_uppercase(), product.market_suffix());
        let id = resp
            .data
            .and_then(|d| d.symbols.get(&market).map(|info| info.product_id));

        debug!(%market, product_id = ?id, "Resolved product id");
        Ok(id)
    }

    /// Fetch `market_price` for a product, backing off exponentially on rate
    /// limiting, transport failures and server errors.
    #[instrument(skip(self), name = "nado_market_price")]
    pub async fn get_market_price(&self, product_id: u32) -> Result<MarketPriceData> {
        let product_id_str = product_id.to_string();
        let mut last_failure = String::new();

        for attempt in 0..self.max_attempts {
            let result = self
                .http
                .get(self.query_url())
                .query(&[("type", "market_price"), ("product_id", product_id_str.as_str())])
                .send()
                .await;

            last_failure = match result {
                Ok(response) if response.status() == StatusCode::TOO_MANY_REQUESTS => {
                    "429 Too Many Requests".to_string()
                }
                Ok(response) if response.status().is_server_error() => {
                    format!("server error {}", response.status())
                }
                Ok(response) if !response.status().is_success() => {
                    let status = response.status();
                    let body = response.text().await.unwrap_or_default();
                    anyhow::bail!("Nado gateway error {}: {}", status, body);
                }
                Ok(response) => {
                    let resp: MarketPriceResponse = response
                        .json()
                        .await
                        .context("Failed to parse market_price response")?;

                    if !resp.is_success() {
                        anyhow::bail!(
                            "Nado market_price query failed: {}",
                            resp.error.clone().unwrap_or_default()
                        );
                    }
                    return Ok(resp.prices().clone());
                }
                Err(e) => format!("request failed: {}", e),
            };

            if attempt + 1 < self.max_attempts {
                let wait = self
                    .backoff_base
                    .saturating_mul(2u32.saturating_pow(attempt));
                warn!(
                    product_id,
                    attempt = attempt + 1,
                    max_attempts = self.max_attempts,
                    wait_ms = wait.as_millis() as u64,
                    reason = %last_failure,
                    "market_price request failed, backing off"
                );
                tokio::time::sleep(wait).await;
            }
        }

        anyhow::bail!(
            "market_price failed after {} attempts: {}",
            self.max_attempts,
            last_failure
        )
    }

    /// Quote for `symbol`, or `Ok(None)` when the market is unknown or the
    /// gateway returned no prices.
    pub async fn fetch_quote(&self, symbol: &str, product: ProductType) -> Result<Option<Quote>> {
        let Some(product_id) = self.product_id(symbol, product).await? else {
            return Ok(None);
        };

        let prices = self.get_market_price(product_id).await?;
        if !prices.has_prices() {
            return Ok(None);
        }

        let quote = prices.to_quote();
        if quote.is_empty() {
            return Ok(None);
        }
        Ok(Some(quote))
    }
}

#[async_trait]
impl PriceOracle for NadoGatewayClient {
    async fn get_quote(&self, symbol: &str, product: ProductType) -> Option<Quote> {
        match self.fetch_quote(symbol, product).await {
            Ok(Some(quote)) => {
                if quote.is_crossed() {
                    warn!(%symbol, bid = ?quote.bid, ask = ?quote.ask, "Oracle returned a crossed quote");
                }
                debug!(%symbol, %product, bid = ?quote.bid, ask = ?quote.ask, "Fetched quote");
                Some(quote)
            }
            Ok(None) => {
                warn!(%symbol, %product, "No price data available");
                None
            }
            Err(e) => {
                warn!(%symbol, %product, error = %e, "Failed to fetch quote");
                None
            }
        }
    }
}
