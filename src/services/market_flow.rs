//! Market Flow (swap detector)
//!
//! Samples recent transactions of the known DEX programs and reconstructs
//! one input and one output leg from their token balance changes. When a
//! sampling window holds no usable swap, a fixed set of estimated swaps is
//! synthesized from current prices and tagged `synthetic`.

use chrono::Utc;
use futures_util::stream::{self, StreamExt};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::error::PipelineError;
use crate::models::chain::TokenBalance;
use crate::models::swap::{MarketFlowResponse, MarketFlowStatistics, SwapEvent, SwapSource};
use crate::services::event_store::{persist_swaps, EventStore};
use crate::services::jitter::Jitter;
use crate::services::price_oracle::{PriceDefaults, PriceMap, PriceSource};
use crate::services::solana_rpc::{ChainReader, ChainReaderError};

pub const ORCA_PROGRAM: &str = "9W959DqEETiGZocYWCQPaJ6sBmUzgfxXfqGeTEdp3aQP";
pub const RAYDIUM_PROGRAM: &str = "675kPX9MHTjS2zt1qfr1NYHuzeLXfQM9H24wFSUt1Mp8";
pub const JUPITER_PROGRAM: &str = "JUP6LkbZbjS1jKKwapdHNy74zcZ3tLUZoi5QNyVTaV4";

pub const SOL_MINT: &str = "So11111111111111111111111111111111111111112";
pub const USDC_MINT: &str = "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v";
pub const USDT_MINT: &str = "Es9vMFrzaCERmJfrF4H2FYD4KCoNkY11McCe8BenwNYB";
pub const RAY_MINT: &str = "4k3Dyjzvzp8eMZWUXbBCjEvwSkkk59S5iCNLY3QrkX6R";
pub const ORCA_MINT: &str = "orcaEKTdK7LKz57vaAYr9QeNsVEPfiu6QeMU1kektZE";

/// Used when prices are missing or the expected output is zero
pub const DEFAULT_PRICE_IMPACT: Decimal = dec!(0.1);
pub const MAX_PRICE_IMPACT: Decimal = dec!(100);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DexProgram {
    pub name: String,
    pub program_id: String,
}

impl DexProgram {
    pub fn new(name: &str, program_id: &str) -> Self {
        Self {
            name: name.to_string(),
            program_id: program_id.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KnownMint {
    pub symbol: String,
    pub mint: String,
}

impl KnownMint {
    pub fn new(symbol: &str, mint: &str) -> Self {
        Self {
            symbol: symbol.to_string(),
            mint: mint.to_string(),
        }
    }
}

/// Shape of one synthesized swap. The output amount is derived from the
/// prices current at synthesis time.
#[derive(Debug, Clone, PartialEq)]
pub struct FallbackSwap {
    pub token_in: String,
    pub token_out: String,
    pub amount_in: Decimal,
    pub price_impact: Decimal,
    pub volume_24h: Decimal,
    pub dex_name: String,
    /// Seconds subtracted from "now"
    pub age_secs: i64,
}

#[derive(Debug, Clone)]
pub struct MarketFlowConfig {
    pub dex_programs: Vec<DexProgram>,
    pub mints: Vec<KnownMint>,
    /// Symbol for an input leg on an unknown mint
    pub unknown_input_symbol: String,
    /// Symbol for an output leg on an unknown mint
    pub unknown_output_symbol: String,
    pub price_defaults: PriceDefaults,
    pub fallback_swaps: Vec<FallbackSwap>,
    pub signatures_per_program: usize,
    pub max_concurrent_scans: usize,
    pub call_delay: Duration,
    /// Volume multiplier range, `[low, high)`
    pub volume_multiplier: (u64, u64),
    pub readback_limit: u64,
}

impl Default for MarketFlowConfig {
    fn default() -> Self {
        Self {
            dex_programs: vec![
                DexProgram::new("Orca", ORCA_PROGRAM),
                DexProgram::new("Raydium", RAYDIUM_PROGRAM),
                DexProgram::new("Jupiter", JUPITER_PROGRAM),
            ],
            mints: vec![
                KnownMint::new("SOL", SOL_MINT),
                KnownMint::new("USDC", USDC_MINT),
                KnownMint::new("USDT", USDT_MINT),
                KnownMint::new("RAY", RAY_MINT),
                KnownMint::new("ORCA", ORCA_MINT),
            ],
            unknown_input_symbol: "SOL".to_string(),
            unknown_output_symbol: "USDC".to_string(),
            price_defaults: PriceDefaults::default(),
            fallback_swaps: vec![
                FallbackSwap {
                    token_in: "SOL".to_string(),
                    token_out: "USDC".to_string(),
                    amount_in: dec!(150.5),
                    price_impact: dec!(0.25),
                    volume_24h: dec!(1500000),
                    dex_name: "Orca".to_string(),
                    age_secs: 0,
                },
                FallbackSwap {
                    token_in: "USDC".to_string(),
                    token_out: "SOL".to_string(),
                    amount_in: dec!(10000),
                    price_impact: dec!(0.15),
                    volume_24h: dec!(2300000),
                    dex_name: "Raydium".to_string(),
                    age_secs: 120,
                },
                FallbackSwap {
                    token_in: "SOL".to_string(),
                    token_out: "RAY".to_string(),
                    amount_in: dec!(75),
                    price_impact: dec!(0.50),
                    volume_24h: dec!(450000),
                    dex_name: "Raydium".to_string(),
                    age_secs: 300,
                },
            ],
            signatures_per_program: 3,
            max_concurrent_scans: 3,
            call_delay: Duration::from_millis(200),
            volume_multiplier: (100, 1000),
            readback_limit: 50,
        }
    }
}

impl MarketFlowConfig {
    pub fn symbol_for_mint(&self, mint: &str) -> Option<&str> {
        self.mints
            .iter()
            .find(|known| known.mint == mint)
            .map(|known| known.symbol.as_str())
    }

    /// Live price when positive, configured default otherwise
    pub fn price_of(&self, prices: &PriceMap, symbol: &str) -> Option<Decimal> {
        prices
            .get(symbol)
            .copied()
            .filter(|p| *p > Decimal::ZERO)
            .or_else(|| self.price_defaults.get(symbol))
            .filter(|p| *p > Decimal::ZERO)
    }
}

/// Input and output leg of one swap
#[derive(Debug, Clone, PartialEq)]
pub struct SwapLegs {
    pub token_in: String,
    pub amount_in: Decimal,
    pub token_out: String,
    pub amount_out: Decimal,
}

/// Rebuild the legs of a swap from paired pre/post token balances.
///
/// Entries are paired by position. A negative change marks the input leg, a
/// positive one the output leg; when several entries qualify the last wins.
/// Returns `None` unless both legs carry a positive amount.
pub fn reconstruct_legs(
    pre: &[TokenBalance],
    post: &[TokenBalance],
    config: &MarketFlowConfig,
) -> Option<SwapLegs> {
    if pre.len() < 2 || post.len() < 2 {
        return None;
    }

    let mut input: Option<(String, Decimal)> = None;
    let mut output: Option<(String, Decimal)> = None;

    for (before, after) in pre.iter().zip(post.iter()) {
        if before.mint.is_empty() || after.mint.is_empty() {
            continue;
        }

        let change = after.ui_amount() - before.ui_amount();
        if change < Decimal::ZERO {
            let symbol = config
                .symbol_for_mint(&before.mint)
                .unwrap_or(config.unknown_input_symbol.as_str());
            input = Some((symbol.to_string(), change.abs()));
        } else if change > Decimal::ZERO {
            let symbol = config
                .symbol_for_mint(&after.mint)
                .unwrap_or(config.unknown_output_symbol.as_str());
            output = Some((symbol.to_string(), change));
        }
    }

    match (input, output) {
        (Some((token_in, amount_in)), Some((token_out, amount_out))) => Some(SwapLegs {
            token_in,
            amount_in,
            token_out,
            amount_out,
        }),
        _ => None,
    }
}

/// `|expected - actual| / expected * 100` with
/// `expected = amount_in * price_in / price_out`, clamped to `[0, 100]`.
pub fn price_impact(
    amount_in: Decimal,
    amount_out: Decimal,
    price_in: Option<Decimal>,
    price_out: Option<Decimal>,
) -> Decimal {
    let (Some(price_in), Some(price_out)) = (price_in, price_out) else {
        return DEFAULT_PRICE_IMPACT;
    };

    let expected = match (amount_in * price_in).checked_div(price_out) {
        Some(expected) if expected > Decimal::ZERO => expected,
        _ => return DEFAULT_PRICE_IMPACT,
    };

    ((expected - amount_out).abs() * dec!(100) / expected)
        .clamp(Decimal::ZERO, MAX_PRICE_IMPACT)
}

/// Totals over the rows returned to the caller
pub fn flow_statistics(flows: &[SwapEvent], prices: PriceMap) -> MarketFlowStatistics {
    let total_volume_24h: Decimal = flows.iter().map(|f| f.volume_24h).sum();
    let avg_price_impact = if flows.is_empty() {
        Decimal::ZERO
    } else {
        let total: Decimal = flows.iter().map(|f| f.price_impact).sum();
        (total / Decimal::from(flows.len())).round_dp(2)
    };

    MarketFlowStatistics {
        total_volume_24h,
        avg_price_impact,
        prices,
    }
}

pub struct MarketFlowService {
    chain: Arc<dyn ChainReader>,
    prices: Arc<dyn PriceSource>,
    store: Arc<dyn EventStore>,
    jitter: Arc<Jitter>,
    config: MarketFlowConfig,
}

impl MarketFlowService {
    pub fn new(
        chain: Arc<dyn ChainReader>,
        prices: Arc<dyn PriceSource>,
        store: Arc<dyn EventStore>,
        jitter: Arc<Jitter>,
        config: MarketFlowConfig,
    ) -> Self {
        Self {
            chain,
            prices,
            store,
            jitter,
            config,
        }
    }

    /// Detect swaps (or synthesize them), persist, read back the latest rows.
    ///
    /// Upstream failures never fail this operation.
    pub async fn collect(&self) -> Result<MarketFlowResponse, PipelineError> {
        let symbols: Vec<&str> = self.config.mints.iter().map(|m| m.symbol.as_str()).collect();
        let mut prices = self.prices.get_prices(&symbols).await;
        for symbol in &symbols {
            if let Some(price) = self.config.price_of(&prices, symbol) {
                prices.insert(symbol.to_string(), price);
            }
        }

        let now = Utc::now().timestamp();
        let mut swaps = self.detect(&prices, now).await;
        let synthesized = swaps.is_empty();
        if synthesized {
            info!("No swaps detected in the sampled window, synthesizing estimated swaps");
            swaps = self.synthesize_fallback(&prices, now);
        }

        let report = persist_swaps(self.store.as_ref(), &swaps).await;
        info!(
            swaps = swaps.len(),
            written = report.written,
            failed = report.failed,
            synthesized = synthesized,
            "Market flow persisted"
        );

        let market_flows = match self.store.latest_swaps(self.config.readback_limit).await {
            Ok(flows) => flows,
            Err(e) => {
                warn!(error = %e, "Failed to read back market flow, returning this cycle only");
                let mut flows = swaps.clone();
                flows.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
                flows.truncate(self.config.readback_limit as usize);
                flows
            }
        };

        Ok(MarketFlowResponse {
            count: market_flows.len(),
            statistics: flow_statistics(&market_flows, prices),
            market_flows,
            new_swaps_found: swaps.len(),
            synthesized,
        })
    }

    /// Scan every DEX program with bounded fan-out
    pub async fn detect(&self, prices: &PriceMap, now: i64) -> Vec<SwapEvent> {
        let scans: Vec<_> = self
            .config
            .dex_programs
            .iter()
            .map(|dex| async move { (dex.name.as_str(), self.scan_program(dex, prices, now).await) })
            .collect();

        let outcomes: Vec<(&str, Result<Vec<SwapEvent>, ChainReaderError>)> =
            stream::iter(scans)
                .buffer_unordered(self.config.max_concurrent_scans.max(1))
                .collect()
                .await;

        let mut swaps = Vec::new();
        for (dex_name, outcome) in outcomes {
            match outcome {
                Ok(found) => {
                    debug!(dex = %dex_name, found = found.len(), "DEX program scanned");
                    swaps.extend(found);
                }
                Err(e) => {
                    warn!(dex = %dex_name, error = %e, "Failed to fetch DEX signatures, skipping program");
                }
            }
        }

        swaps
    }

    async fn scan_program(
        &self,
        dex: &DexProgram,
        prices: &PriceMap,
        now: i64,
    ) -> Result<Vec<SwapEvent>, ChainReaderError> {
        let signatures = self
            .chain
            .recent_signatures(&dex.program_id, self.config.signatures_per_program)
            .await?;

        let mut swaps = Vec::new();
        for sig_info in &signatures {
            if sig_info.err.as_ref().is_some_and(|err| !err.is_null()) {
                continue;
            }

            tokio::time::sleep(self.config.call_delay).await;

            let tx = match self.chain.transaction(&sig_info.signature).await {
                Ok(Some(tx)) if !tx.failed() => tx,
                Ok(_) => continue,
                Err(e) => {
                    warn!(
                        dex = %dex.name,
                        signature = %sig_info.signature,
                        error = %e,
                        "Failed to fetch transaction, skipping"
                    );
                    continue;
                }
            };

            let Some(meta) = tx.meta.as_ref() else {
                continue;
            };
            let Some(legs) =
                reconstruct_legs(&meta.pre_token_balances, &meta.post_token_balances, &self.config)
            else {
                continue;
            };

            let timestamp = sig_info.block_time.or(tx.block_time).unwrap_or(now);
            swaps.push(self.build_swap(legs, &dex.name, prices, timestamp));
        }

        Ok(swaps)
    }

    fn build_swap(&self, legs: SwapLegs, dex_name: &str, prices: &PriceMap, timestamp: i64) -> SwapEvent {
        let price_in = self.config.price_of(prices, &legs.token_in);
        let price_out = self.config.price_of(prices, &legs.token_out);
        let impact = price_impact(legs.amount_in, legs.amount_out, price_in, price_out);

        let (low, high) = self.config.volume_multiplier;
        let multiplier = self.jitter.range_decimal(low, high);
        let volume = legs.amount_in * price_in.unwrap_or(Decimal::ZERO) * multiplier;

        SwapEvent {
            token_in: legs.token_in,
            token_out: legs.token_out,
            amount_in: legs.amount_in.round_dp(4),
            amount_out: legs.amount_out.round_dp(4),
            price_impact: impact.round_dp(2),
            volume_24h: volume.round_dp(2),
            dex_name: dex_name.to_string(),
            source: SwapSource::Detected,
            timestamp,
        }
    }

    /// Estimated swaps from the configured templates at current prices.
    /// Templates whose prices are unknown are dropped.
    pub fn synthesize_fallback(&self, prices: &PriceMap, now: i64) -> Vec<SwapEvent> {
        self.config
            .fallback_swaps
            .iter()
            .filter_map(|template| {
                let price_in = self.config.price_of(prices, &template.token_in)?;
                let price_out = self.config.price_of(prices, &template.token_out)?;
                let amount_out = (template.amount_in * price_in).checked_div(price_out)?;
                if amount_out <= Decimal::ZERO || template.amount_in <= Decimal::ZERO {
                    return None;
                }

                Some(SwapEvent {
                    token_in: template.token_in.clone(),
                    token_out: template.token_out.clone(),
                    amount_in: template.amount_in.round_dp(4),
                    amount_out: amount_out.round_dp(4),
                    price_impact: template.price_impact,
                    volume_24h: template.volume_24h,
                    dex_name: template.dex_name.clone(),
                    source: SwapSource::Synthetic,
                    timestamp: now - template.age_secs,
                })
            })
            .collect()
    }
}
