//! Chain RPC payload shapes (jsonParsed encoding).
//!
//! Only the fields the collectors read are modelled; everything else in the
//! RPC responses is ignored by serde.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EpochInfo {
    pub epoch: u64,
}

/// Entry of `getSignaturesForAddress`
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignatureInfo {
    pub signature: String,
    #[serde(default)]
    pub slot: Option<u64>,
    #[serde(default)]
    pub block_time: Option<i64>,
    #[serde(default)]
    pub err: Option<serde_json::Value>,
}

/// Result of `getTransaction`
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionDetail {
    #[serde(default)]
    pub slot: Option<u64>,
    #[serde(default)]
    pub block_time: Option<i64>,
    #[serde(default)]
    pub meta: Option<TransactionMeta>,
    #[serde(default)]
    pub transaction: Option<TransactionBody>,
}

impl TransactionDetail {
    /// True when the runtime reported an execution error (or meta is missing)
    pub fn failed(&self) -> bool {
        match &self.meta {
            Some(meta) => meta.err.as_ref().is_some_and(|err| !err.is_null()),
            None => true,
        }
    }

    pub fn instructions(&self) -> &[Instruction] {
        self.transaction
            .as_ref()
            .map(|tx| tx.message.instructions.as_slice())
            .unwrap_or(&[])
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionMeta {
    #[serde(default)]
    pub err: Option<serde_json::Value>,
    #[serde(default)]
    pub pre_balances: Vec<u64>,
    #[serde(default)]
    pub post_balances: Vec<u64>,
    #[serde(default)]
    pub pre_token_balances: Vec<TokenBalance>,
    #[serde(default)]
    pub post_token_balances: Vec<TokenBalance>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TransactionBody {
    #[serde(default)]
    pub message: TransactionMessage,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionMessage {
    #[serde(default)]
    pub instructions: Vec<Instruction>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Instruction {
    #[serde(default)]
    pub program_id: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenBalance {
    #[serde(default)]
    pub account_index: u32,
    #[serde(default)]
    pub mint: String,
    #[serde(default)]
    pub ui_token_amount: Option<UiTokenAmount>,
}

impl TokenBalance {
    /// UI amount as a decimal; missing or unparsable amounts read as zero
    pub fn ui_amount(&self) -> Decimal {
        self.ui_token_amount
            .as_ref()
            .and_then(UiTokenAmount::to_decimal)
            .unwrap_or(Decimal::ZERO)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UiTokenAmount {
    #[serde(default)]
    pub ui_amount: Option<f64>,
    #[serde(default)]
    pub ui_amount_string: Option<String>,
    #[serde(default)]
    pub decimals: u8,
}

impl UiTokenAmount {
    fn to_decimal(&self) -> Option<Decimal> {
        if let Some(raw) = self.ui_amount_string.as_deref() {
            if let Ok(value) = Decimal::from_str(raw) {
                return Some(value);
            }
        }
        self.ui_amount.and_then(|v| Decimal::try_from(v).ok())
    }
}

/// Result of `getVoteAccounts`
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct VoteAccounts {
    #[serde(default)]
    pub current: Vec<VoteAccount>,
    #[serde(default)]
    pub delinquent: Vec<VoteAccount>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteAccount {
    pub vote_pubkey: String,
    #[serde(default)]
    pub node_pubkey: String,
    /// Lamports
    #[serde(default)]
    pub activated_stake: u64,
    /// Percent, 0-100
    #[serde(default)]
    pub commission: u8,
    #[serde(default)]
    pub epoch_vote_account: bool,
    #[serde(default)]
    pub last_vote: u64,
}
