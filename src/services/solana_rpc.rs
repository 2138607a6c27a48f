//! Chain Reader
//!
//! Read-only JSON-RPC calls against Solana chain state. Each call is a single
//! request/response round trip; there are no retries here, the collectors
//! decide whether a failed unit is skipped or fatal.

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

use crate::models::chain::{EpochInfo, SignatureInfo, TransactionDetail, VoteAccounts};

/// Error types for chain reads
#[derive(Debug)]
pub enum ChainReaderError {
    /// Transport failure, timeout or non-success HTTP status
    SourceUnavailable(String),
    /// The node answered with a JSON-RPC error object
    Rpc { code: i64, message: String },
    /// The response body did not have the expected shape
    Decode(String),
}

impl std::fmt::Display for ChainReaderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChainReaderError::SourceUnavailable(msg) => write!(f, "Source unavailable: {}", msg),
            ChainReaderError::Rpc { code, message } => {
                write!(f, "RPC error {}: {}", code, message)
            }
            ChainReaderError::Decode(msg) => write!(f, "Decode error: {}", msg),
        }
    }
}

impl std::error::Error for ChainReaderError {}

#[async_trait]
pub trait ChainReader: Send + Sync {
    async fn current_slot(&self) -> Result<u64, ChainReaderError>;

    async fn current_epoch(&self) -> Result<u64, ChainReaderError>;

    /// Most recent signatures touching `address`, newest first
    async fn recent_signatures(
        &self,
        address: &str,
        limit: usize,
    ) -> Result<Vec<SignatureInfo>, ChainReaderError>;

    /// Full transaction detail; `None` when the node does not know the signature
    async fn transaction(
        &self,
        signature: &str,
    ) -> Result<Option<TransactionDetail>, ChainReaderError>;

    async fn vote_accounts(&self) -> Result<VoteAccounts, ChainReaderError>;
}

#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

/// JSON-RPC client for a Solana HTTP endpoint
#[derive(Clone)]
pub struct SolanaRpcClient {
    client: Client,
    rpc_url: String,
}

impl SolanaRpcClient {
    pub fn new(rpc_url: String, timeout_secs: u64) -> Result<Self, ChainReaderError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| ChainReaderError::SourceUnavailable(format!("HTTP client: {}", e)))?;

        Ok(Self { client, rpc_url })
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Value,
    ) -> Result<Option<T>, ChainReaderError> {
        let payload = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });

        let response = self
            .client
            .post(&self.rpc_url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| ChainReaderError::SourceUnavailable(format!("{}: {}", method, e)))?;

        if !response.status().is_success() {
            return Err(ChainReaderError::SourceUnavailable(format!(
                "{} returned HTTP {}",
                method,
                response.status()
            )));
        }

        let body: RpcResponse<T> = response
            .json()
            .await
            .map_err(|e| ChainReaderError::Decode(format!("{}: {}", method, e)))?;

        if let Some(error) = body.error {
            return Err(ChainReaderError::Rpc {
                code: error.code,
                message: error.message,
            });
        }

        Ok(body.result)
    }

    async fn call_required<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Value,
    ) -> Result<T, ChainReaderError> {
        self.call(method, params)
            .await?
            .ok_or_else(|| ChainReaderError::Decode(format!("{}: missing result", method)))
    }
}

#[async_trait]
impl ChainReader for SolanaRpcClient {
    async fn current_slot(&self) -> Result<u64, ChainReaderError> {
        self.call_required("getSlot", json!([])).await
    }

    async fn current_epoch(&self) -> Result<u64, ChainReaderError> {
        let info: EpochInfo = self.call_required("getEpochInfo", json!([])).await?;
        Ok(info.epoch)
    }

    async fn recent_signatures(
        &self,
        address: &str,
        limit: usize,
    ) -> Result<Vec<SignatureInfo>, ChainReaderError> {
        let signatures: Option<Vec<SignatureInfo>> = self
            .call("getSignaturesForAddress", json!([address, { "limit": limit }]))
            .await?;
        Ok(signatures.unwrap_or_default())
    }

    async fn transaction(
        &self,
        signature: &str,
    ) -> Result<Option<TransactionDetail>, ChainReaderError> {
        self.call(
            "getTransaction",
            json!([
                signature,
                { "encoding": "jsonParsed", "maxSupportedTransactionVersion": 0 }
            ]),
        )
        .await
    }

    async fn vote_accounts(&self) -> Result<VoteAccounts, ChainReaderError> {
        self.call_required("getVoteAccounts", json!([])).await
    }
}
