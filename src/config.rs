//! Environment-provided configuration.
//!
//! Only `DATABASE_URL` is required for the pipeline operations; every other
//! setting has a public default. Empty values count as unset.

use std::env;

use crate::services::whale_detector::{WhaleDetectorConfig, DEFAULT_WHALE_WALLETS};

/// Store endpoint + credential (required)
pub const ENV_DATABASE_URL: &str = "DATABASE_URL";

/// Chain RPC endpoint
pub const ENV_SOLANA_RPC_URL: &str = "SOLANA_RPC_URL";

/// Per-call chain timeout
pub const ENV_RPC_TIMEOUT: &str = "RPC_TIMEOUT_SECS";

/// Price source endpoint
pub const ENV_PRICE_API_URL: &str = "PRICE_API_URL";

/// Optional price source key
pub const ENV_PRICE_API_KEY: &str = "PRICE_API_KEY";

/// Price call timeout
pub const ENV_PRICE_TIMEOUT: &str = "PRICE_TIMEOUT_SECS";

/// Comma-separated watch list for the whale detector
pub const ENV_WHALE_WALLETS: &str = "WHALE_WALLETS";

/// Whale threshold in SOL, must be positive
pub const ENV_WHALE_THRESHOLD: &str = "WHALE_THRESHOLD_SOL";

/// Periodic refresh interval, 0 disables the job
pub const ENV_REFRESH_INTERVAL: &str = "REFRESH_INTERVAL_SECS";

/// Seed for the volume / delegator jitter
pub const ENV_RANDOM_SEED: &str = "PIPELINE_RANDOM_SEED";

pub const ENV_BIND_ADDR: &str = "BIND_ADDR";

pub const DEFAULT_SOLANA_RPC_URL: &str = "https://api.mainnet-beta.solana.com";
pub const DEFAULT_PRICE_API_URL: &str = "https://api.coingecko.com/api/v3";
pub const DEFAULT_RPC_TIMEOUT_SECS: u64 = 8;
pub const DEFAULT_PRICE_TIMEOUT_SECS: u64 = 5;
pub const DEFAULT_WHALE_THRESHOLD_SOL: u64 = 100;
pub const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 300;
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: Option<String>,
    pub solana_rpc_url: String,
    pub rpc_timeout_secs: u64,
    pub price_api_url: String,
    pub price_api_key: Option<String>,
    pub price_timeout_secs: u64,
    pub whale_wallets: Vec<String>,
    pub whale_threshold_sol: u64,
    pub refresh_interval_secs: u64,
    pub random_seed: Option<u64>,
    pub bind_addr: String,
}

impl AppConfig {
    /// Read configuration from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Read configuration through an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let parse_u64 = |key: &str, default: u64| {
            get(key).and_then(|v| v.parse().ok()).unwrap_or(default)
        };

        let whale_wallets = get(ENV_WHALE_WALLETS)
            .map(|raw| {
                raw.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect::<Vec<_>>()
            })
            .filter(|wallets| !wallets.is_empty())
            .unwrap_or_else(|| DEFAULT_WHALE_WALLETS.iter().map(|s| s.to_string()).collect());

        Self {
            database_url: get(ENV_DATABASE_URL),
            solana_rpc_url: get(ENV_SOLANA_RPC_URL)
                .unwrap_or_else(|| DEFAULT_SOLANA_RPC_URL.to_string()),
            rpc_timeout_secs: parse_u64(ENV_RPC_TIMEOUT, DEFAULT_RPC_TIMEOUT_SECS),
            price_api_url: get(ENV_PRICE_API_URL)
                .unwrap_or_else(|| DEFAULT_PRICE_API_URL.to_string()),
            price_api_key: get(ENV_PRICE_API_KEY),
            price_timeout_secs: parse_u64(ENV_PRICE_TIMEOUT, DEFAULT_PRICE_TIMEOUT_SECS),
            whale_wallets,
            whale_threshold_sol: get(ENV_WHALE_THRESHOLD)
                .and_then(|v| v.parse().ok())
                .filter(|sol: &u64| *sol > 0)
                .unwrap_or(DEFAULT_WHALE_THRESHOLD_SOL),
            refresh_interval_secs: parse_u64(ENV_REFRESH_INTERVAL, DEFAULT_REFRESH_INTERVAL_SECS),
            random_seed: get(ENV_RANDOM_SEED).and_then(|v| v.parse().ok()),
            bind_addr: get(ENV_BIND_ADDR).unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
        }
    }

    pub fn whale_detector(&self) -> WhaleDetectorConfig {
        WhaleDetectorConfig {
            wallets: self.whale_wallets.clone(),
            ..WhaleDetectorConfig::default()
        }
        .with_threshold_sol(self.whale_threshold_sol)
    }
}
