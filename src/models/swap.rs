use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::entities::market_flow;

/// Where a swap row came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SwapSource {
    /// Reconstructed from an on-chain transaction
    Detected,
    /// Generated from fallback templates on a quiet sampling window
    Synthetic,
}

impl SwapSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            SwapSource::Detected => "detected",
            SwapSource::Synthetic => "synthetic",
        }
    }

    pub fn parse(value: &str) -> Self {
        match value {
            "synthetic" => SwapSource::Synthetic,
            _ => SwapSource::Detected,
        }
    }
}

/// A detected or synthesized DEX swap. Append-only, no identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwapEvent {
    pub token_in: String,
    pub token_out: String,
    pub amount_in: Decimal,
    pub amount_out: Decimal,
    /// Percent, non-negative, 2 dp
    pub price_impact: Decimal,
    /// USD estimate of 24h turnover
    pub volume_24h: Decimal,
    pub dex_name: String,
    pub source: SwapSource,
    pub timestamp: i64,
}

impl SwapEvent {
    pub fn is_synthetic(&self) -> bool {
        self.source == SwapSource::Synthetic
    }
}

impl From<market_flow::Model> for SwapEvent {
    fn from(model: market_flow::Model) -> Self {
        Self {
            token_in: model.token_in,
            token_out: model.token_out,
            amount_in: model.amount_in,
            amount_out: model.amount_out,
            price_impact: model.price_impact,
            volume_24h: model.volume_24h,
            dex_name: model.dex_name,
            source: SwapSource::parse(&model.source),
            timestamp: model.timestamp,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketFlowStatistics {
    pub total_volume_24h: Decimal,
    pub avg_price_impact: Decimal,
    pub prices: BTreeMap<String, Decimal>,
}

/// Payload of the market-flow operation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketFlowResponse {
    pub market_flows: Vec<SwapEvent>,
    pub count: usize,
    pub statistics: MarketFlowStatistics,
    pub new_swaps_found: usize,
    pub synthesized: bool,
}
