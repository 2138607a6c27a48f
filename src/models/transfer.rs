use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::entities::whale_events;

/// Intent of a large-value transaction, derived from its instruction list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferKind {
    Transfer,
    Swap,
    Stake,
}

impl TransferKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransferKind::Transfer => "transfer",
            TransferKind::Swap => "swap",
            TransferKind::Stake => "stake",
        }
    }

    /// Unknown stored values read back as plain transfers
    pub fn parse(value: &str) -> Self {
        match value {
            "swap" => TransferKind::Swap,
            "stake" => TransferKind::Stake,
            _ => TransferKind::Transfer,
        }
    }
}

impl std::fmt::Display for TransferKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A detected large-value transfer. Identity is the transaction signature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferEvent {
    pub signature: String,
    pub wallet_address: String,
    pub transaction_type: TransferKind,
    /// Token-native units (SOL), 4 dp
    pub amount: Decimal,
    pub token_symbol: String,
    pub token_mint: String,
    /// 2 dp
    pub usd_value: Decimal,
    /// Chain time, seconds since epoch
    pub timestamp: i64,
    pub block_number: u64,
    pub is_suspicious: bool,
}

impl From<whale_events::Model> for TransferEvent {
    fn from(model: whale_events::Model) -> Self {
        Self {
            signature: model.signature,
            wallet_address: model.wallet_address,
            transaction_type: TransferKind::parse(&model.transaction_type),
            amount: model.amount,
            token_symbol: model.token_symbol,
            token_mint: model.token_mint,
            usd_value: model.usd_value,
            timestamp: model.timestamp,
            block_number: model.block_number.max(0) as u64,
            is_suspicious: model.is_suspicious,
        }
    }
}

/// Payload of the whale-transactions operation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhaleScanResponse {
    pub whale_events: Vec<TransferEvent>,
    pub count: usize,
    /// Threshold in SOL
    pub threshold: Decimal,
    pub current_slot: u64,
    pub sol_price: Decimal,
    pub wallets_monitored: usize,
    pub new_transactions_found: usize,
}
