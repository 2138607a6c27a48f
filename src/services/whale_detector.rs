//! Whale Detector
//!
//! Scans a fixed watch list of wallets for large SOL movements, classifies
//! each hit and appends it to `whale_events` (duplicates by signature are
//! ignored). Best effort: one wallet or transaction failing never aborts the
//! others.

use chrono::Utc;
use futures_util::stream::{self, StreamExt};
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::error::PipelineError;
use crate::models::transfer::{TransferEvent, WhaleScanResponse};
use crate::services::event_store::{persist_transfers, EventStore};
use crate::services::price_oracle::PriceSource;
use crate::services::solana_rpc::{ChainReader, ChainReaderError};
use crate::services::transfer_classifier::{
    evaluate_transaction, ClassificationContext, ProgramCatalog, LAMPORTS_PER_SOL, SOL_SYMBOL,
};

/// Top SOL holders watched by default
pub const DEFAULT_WHALE_WALLETS: [&str; 5] = [
    "9WzDXwBbmkg8ZTbNMqUxvQRAyrZzDsGYdLVL9zYtAWWM",
    "HN7cABqLq46Es1jh92dQQisAq662SmxELLLsHHe4YWrH",
    "5Q544fKrFoe6tsEbD7S8EmxGTJYAKtTVhAW5Q5pge4j1",
    "ASTyfSima4LLAdDgoFGkgqoKowG1LZFDr9fAQrg7iaJZ",
    "GJa1VeEkLbsKFfTJQbSMSQbdvEjg6mLp4eSmjkereim",
];

#[derive(Debug, Clone)]
pub struct WhaleDetectorConfig {
    pub wallets: Vec<String>,
    pub threshold_lamports: u64,
    /// Signatures requested per wallet
    pub signatures_per_wallet: usize,
    /// Of those, how many are fetched in full
    pub transactions_per_wallet: usize,
    pub max_concurrent_scans: usize,
    /// Pause before each transaction fetch within one wallet scan
    pub call_delay: Duration,
    /// Rows returned by the operation
    pub readback_limit: u64,
    pub catalog: ProgramCatalog,
}

impl WhaleDetectorConfig {
    /// Zero is raised to 1 SOL
    pub fn with_threshold_sol(mut self, threshold_sol: u64) -> Self {
        self.threshold_lamports = threshold_sol.max(1).saturating_mul(LAMPORTS_PER_SOL);
        self
    }

    pub fn threshold_sol(&self) -> Decimal {
        Decimal::from(self.threshold_lamports) / Decimal::from(LAMPORTS_PER_SOL)
    }
}

impl Default for WhaleDetectorConfig {
    fn default() -> Self {
        Self {
            wallets: DEFAULT_WHALE_WALLETS.iter().map(|s| s.to_string()).collect(),
            threshold_lamports: 100 * LAMPORTS_PER_SOL,
            signatures_per_wallet: 5,
            transactions_per_wallet: 3,
            max_concurrent_scans: 5,
            call_delay: Duration::from_millis(100),
            readback_limit: 20,
            catalog: ProgramCatalog::default(),
        }
    }
}

pub struct WhaleDetectorService {
    chain: Arc<dyn ChainReader>,
    prices: Arc<dyn PriceSource>,
    store: Arc<dyn EventStore>,
    config: WhaleDetectorConfig,
}

impl WhaleDetectorService {
    pub fn new(
        chain: Arc<dyn ChainReader>,
        prices: Arc<dyn PriceSource>,
        store: Arc<dyn EventStore>,
        config: WhaleDetectorConfig,
    ) -> Self {
        Self {
            chain,
            prices,
            store,
            config,
        }
    }

    pub fn config(&self) -> &WhaleDetectorConfig {
        &self.config
    }

    /// Run one scan: detect, persist, read back the latest events.
    ///
    /// Fails only when the current slot cannot be read.
    pub async fn scan(&self) -> Result<WhaleScanResponse, PipelineError> {
        let prices = self.prices.get_prices(&[SOL_SYMBOL]).await;
        let sol_price = prices.get(SOL_SYMBOL).copied().unwrap_or_else(|| {
            warn!("No SOL price available, USD values will be zero");
            Decimal::ZERO
        });

        let current_slot = self.chain.current_slot().await?;

        info!(
            wallets = self.config.wallets.len(),
            current_slot = current_slot,
            sol_price = %sol_price,
            "Starting whale scan"
        );

        let detected = self.detect(sol_price, current_slot).await;
        let report = persist_transfers(self.store.as_ref(), &detected).await;

        info!(
            detected = detected.len(),
            inserted = report.written,
            duplicates = report.duplicates,
            failed = report.failed,
            "Whale scan persisted"
        );

        let whale_events = match self.store.latest_transfers(self.config.readback_limit).await {
            Ok(events) => events,
            Err(e) => {
                warn!(error = %e, "Failed to read back whale events, returning this scan only");
                let mut events = detected.clone();
                events.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
                events.truncate(self.config.readback_limit as usize);
                events
            }
        };

        Ok(WhaleScanResponse {
            count: whale_events.len(),
            whale_events,
            threshold: self.config.threshold_sol(),
            current_slot,
            sol_price,
            wallets_monitored: self.config.wallets.len(),
            new_transactions_found: detected.len(),
        })
    }

    /// Scan every watched wallet with bounded fan-out
    pub async fn detect(&self, sol_price: Decimal, current_slot: u64) -> Vec<TransferEvent> {
        let ctx = ClassificationContext {
            threshold_lamports: self.config.threshold_lamports,
            sol_price,
            current_slot,
            now: Utc::now().timestamp(),
            catalog: &self.config.catalog,
        };

        let ctx = &ctx;
        let scans: Vec<_> = self
            .config
            .wallets
            .iter()
            .map(|wallet| async move { (wallet.as_str(), self.scan_wallet(wallet, ctx).await) })
            .collect();

        let outcomes: Vec<(&str, Result<Vec<TransferEvent>, ChainReaderError>)> =
            stream::iter(scans)
                .buffer_unordered(self.config.max_concurrent_scans.max(1))
                .collect()
                .await;

        let mut events = Vec::new();
        for (wallet, outcome) in outcomes {
            match outcome {
                Ok(found) => {
                    debug!(wallet = %wallet, found = found.len(), "Wallet scanned");
                    events.extend(found);
                }
                Err(e) => {
                    warn!(wallet = %wallet, error = %e, "Failed to fetch signatures, skipping wallet");
                }
            }
        }

        events
    }

    async fn scan_wallet(
        &self,
        wallet: &str,
        ctx: &ClassificationContext<'_>,
    ) -> Result<Vec<TransferEvent>, ChainReaderError> {
        let signatures = self
            .chain
            .recent_signatures(wallet, self.config.signatures_per_wallet)
            .await?;

        let mut events = Vec::new();
        for sig_info in signatures.iter().take(self.config.transactions_per_wallet) {
            if sig_info.err.as_ref().is_some_and(|err| !err.is_null()) {
                continue;
            }

            tokio::time::sleep(self.config.call_delay).await;

            let tx = match self.chain.transaction(&sig_info.signature).await {
                Ok(Some(tx)) => tx,
                Ok(None) => continue,
                Err(e) => {
                    warn!(
                        signature = %sig_info.signature,
                        error = %e,
                        "Failed to fetch transaction, skipping"
                    );
                    continue;
                }
            };

            if let Some(event) = evaluate_transaction(wallet, sig_info, &tx, ctx) {
                debug!(
                    signature = %event.signature,
                    amount = %event.amount,
                    kind = %event.transaction_type,
                    suspicious = event.is_suspicious,
                    "Whale transaction detected"
                );
                events.push(event);
            }
        }

        Ok(events)
    }
}
