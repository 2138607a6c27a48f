//! Price Oracle
//!
//! USD prices for the handful of symbols the collectors value. The CoinGecko
//! backend caches the last answer per symbol and falls back to injected
//! defaults, so callers always get a price map back.

use async_trait::async_trait;
use moka::future::Cache;
use reqwest::Client;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

/// Symbol -> USD price
pub type PriceMap = BTreeMap<String, Decimal>;

/// Current USD prices for a small set of symbols.
///
/// Implementations never fail: an unavailable source answers with the
/// last-known or default price for every symbol it has one for.
#[async_trait]
pub trait PriceSource: Send + Sync {
    async fn get_prices(&self, symbols: &[&str]) -> PriceMap;
}

/// Static fallback prices, injected at construction
#[derive(Debug, Clone)]
pub struct PriceDefaults(PriceMap);

impl PriceDefaults {
    pub fn new(prices: PriceMap) -> Self {
        Self(prices)
    }

    pub fn get(&self, symbol: &str) -> Option<Decimal> {
        self.0.get(&symbol.to_uppercase()).copied()
    }
}

impl Default for PriceDefaults {
    fn default() -> Self {
        let mut prices = PriceMap::new();
        prices.insert("SOL".to_string(), dec!(50));
        prices.insert("USDC".to_string(), dec!(1));
        prices.insert("USDT".to_string(), dec!(1));
        prices.insert("RAY".to_string(), dec!(0.5));
        prices.insert("ORCA".to_string(), dec!(0.8));
        Self(prices)
    }
}

/// CoinGecko id for the symbols the pipeline prices
pub fn coingecko_id(symbol: &str) -> Option<&'static str> {
    match symbol.to_uppercase().as_str() {
        "SOL" => Some("solana"),
        "USDC" => Some("usd-coin"),
        "USDT" => Some("tether"),
        "RAY" => Some("raydium"),
        "ORCA" => Some("orca"),
        _ => None,
    }
}

/// Price oracle backed by CoinGecko's `/simple/price`
#[derive(Clone)]
pub struct CoinGeckoPriceOracle {
    client: Client,
    api_key: Option<String>,
    base_url: String,
    defaults: PriceDefaults,
    last_known: Arc<Cache<String, Decimal>>,
}

impl CoinGeckoPriceOracle {
    pub fn new(
        base_url: String,
        api_key: Option<String>,
        timeout_secs: u64,
        defaults: PriceDefaults,
    ) -> Result<Self, reqwest::Error> {
        let last_known = Cache::builder()
            .max_capacity(100)
            .time_to_live(Duration::from_secs(3600)) // 1 hour TTL
            .build();

        Ok(Self {
            client: Client::builder()
                .timeout(Duration::from_secs(timeout_secs))
                .build()?,
            api_key,
            base_url,
            defaults,
            last_known: Arc::new(last_known),
        })
    }

    async fn fetch_simple_prices(
        &self,
        ids: &[&'static str],
    ) -> Result<HashMap<String, HashMap<String, Decimal>>, Box<dyn std::error::Error + Send + Sync>>
    {
        let url = format!("{}/simple/price", self.base_url);

        let mut request = self
            .client
            .get(&url)
            .header("accept", "application/json")
            .query(&[("ids", ids.join(",").as_str()), ("vs_currencies", "usd")]);
        if let Some(key) = &self.api_key {
            request = request.header("x-cg-pro-api-key", key);
        }

        let response = request.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(format!("CoinGecko API error {}: {}", status, error_text).into());
        }

        Ok(response.json().await?)
    }

    async fn fallback_price(&self, symbol: &str) -> Option<Decimal> {
        match self.last_known.get(symbol).await {
            Some(price) => Some(price),
            None => self.defaults.get(symbol),
        }
    }
}

#[async_trait]
impl PriceSource for CoinGeckoPriceOracle {
    async fn get_prices(&self, symbols: &[&str]) -> PriceMap {
        let mut ids: Vec<&'static str> = symbols.iter().filter_map(|s| coingecko_id(s)).collect();
        ids.sort_unstable();
        ids.dedup();

        let fetched = if ids.is_empty() {
            HashMap::new()
        } else {
            match self.fetch_simple_prices(&ids).await {
                Ok(data) => data,
                Err(e) => {
                    tracing::warn!(error = %e, "Price source unavailable, using fallback prices");
                    HashMap::new()
                }
            }
        };

        let mut prices = PriceMap::new();
        for symbol in symbols {
            let symbol = symbol.to_uppercase();
            let live = coingecko_id(&symbol)
                .and_then(|id| fetched.get(id))
                .and_then(|quote| quote.get("usd"))
                .copied()
                .filter(|price| *price > Decimal::ZERO);

            let price = match live {
                Some(price) => {
                    self.last_known.insert(symbol.clone(), price).await;
                    Some(price)
                }
                None => self.fallback_price(&symbol).await,
            };

            match price {
                Some(price) => {
                    prices.insert(symbol, price);
                }
                None => tracing::debug!(symbol = %symbol, "No price known for symbol"),
            }
        }

        prices
    }
}

/// Fixed prices, for offline runs and tests
#[derive(Debug, Clone, Default)]
pub struct StaticPriceSource {
    prices: PriceDefaults,
}

impl StaticPriceSource {
    pub fn new(prices: PriceDefaults) -> Self {
        Self { prices }
    }
}

#[async_trait]
impl PriceSource for StaticPriceSource {
    async fn get_prices(&self, symbols: &[&str]) -> PriceMap {
        symbols
            .iter()
            .filter_map(|s| {
                let symbol = s.to_uppercase();
                self.prices.get(&symbol).map(|price| (symbol, price))
            })
            .collect()
    }
}
