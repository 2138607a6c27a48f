#![allow(dead_code)]

use async_trait::async_trait;
use chainpulse_backend::models::chain::{
    Instruction, SignatureInfo, TokenBalance, TransactionBody, TransactionDetail,
    TransactionMessage, TransactionMeta, UiTokenAmount, VoteAccount, VoteAccounts,
};
use chainpulse_backend::models::feed::FeedEvent;
use chainpulse_backend::models::stake::StakeSnapshot;
use chainpulse_backend::models::swap::SwapEvent;
use chainpulse_backend::models::transfer::TransferEvent;
use chainpulse_backend::services::event_store::{EventStore, MemoryEventStore, StoreError};
use chainpulse_backend::services::feed_aggregator::FeedConfig;
use chainpulse_backend::services::jitter::Jitter;
use chainpulse_backend::services::market_flow::MarketFlowConfig;
use chainpulse_backend::services::price_oracle::StaticPriceSource;
use chainpulse_backend::services::refresh::{PipelineConfig, RefreshOrchestrator};
use chainpulse_backend::services::solana_rpc::{ChainReader, ChainReaderError};
use chainpulse_backend::services::staking::StakingConfig;
use chainpulse_backend::services::whale_detector::WhaleDetectorConfig;
use rust_decimal::Decimal;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub const LAMPORTS: u64 = 1_000_000_000;
pub const NOW_ISH: i64 = 1_760_000_000;

/// Chain reader answering from fixed tables.
///
/// Unknown addresses have no signatures and unknown signatures no
/// transaction. `None` slot/epoch/vote accounts simulate an outage.
#[derive(Debug, Clone, Default)]
pub struct ScriptedChain {
    pub slot: Option<u64>,
    pub epoch: Option<u64>,
    pub signatures: HashMap<String, Vec<SignatureInfo>>,
    pub failing_addresses: HashSet<String>,
    pub transactions: HashMap<String, TransactionDetail>,
    pub failing_transactions: HashSet<String>,
    pub vote_accounts: Option<VoteAccounts>,
}

impl ScriptedChain {
    pub fn healthy() -> Self {
        Self {
            slot: Some(300_000_000),
            epoch: Some(700),
            vote_accounts: Some(VoteAccounts::default()),
            ..Default::default()
        }
    }

    pub fn with_transaction(mut self, address: &str, signature: &str, tx: TransactionDetail) -> Self {
        self.signatures
            .entry(address.to_string())
            .or_default()
            .push(signature_info(signature, tx.block_time));
        self.transactions.insert(signature.to_string(), tx);
        self
    }

    pub fn with_validators(mut self, accounts: Vec<VoteAccount>) -> Self {
        self.vote_accounts = Some(VoteAccounts {
            current: accounts,
            delinquent: vec![],
        });
        self
    }

    pub fn outage() -> Self {
        Self::default()
    }
}

fn unavailable(what: &str) -> ChainReaderError {
    ChainReaderError::SourceUnavailable(format!("{what} returned 503"))
}

#[async_trait]
impl ChainReader for ScriptedChain {
    async fn current_slot(&self) -> Result<u64, ChainReaderError> {
        self.slot.ok_or_else(|| unavailable("getSlot"))
    }

    async fn current_epoch(&self) -> Result<u64, ChainReaderError> {
        self.epoch.ok_or_else(|| unavailable("getEpochInfo"))
    }

    async fn recent_signatures(
        &self,
        address: &str,
        limit: usize,
    ) -> Result<Vec<SignatureInfo>, ChainReaderError> {
        if self.failing_addresses.contains(address) || self.slot.is_none() {
            return Err(unavailable("getSignaturesForAddress"));
        }
        Ok(self
            .signatures
            .get(address)
            .map(|sigs| sigs.iter().take(limit).cloned().collect())
            .unwrap_or_default())
    }

    async fn transaction(
        &self,
        signature: &str,
    ) -> Result<Option<TransactionDetail>, ChainReaderError> {
        if self.failing_transactions.contains(signature) {
            return Err(unavailable("getTransaction"));
        }
        Ok(self.transactions.get(signature).cloned())
    }

    async fn vote_accounts(&self) -> Result<VoteAccounts, ChainReaderError> {
        self.vote_accounts.clone().ok_or_else(|| unavailable("getVoteAccounts"))
    }
}

pub fn signature_info(signature: &str, block_time: Option<i64>) -> SignatureInfo {
    SignatureInfo {
        signature: signature.to_string(),
        slot: Some(299_999_000),
        block_time,
        err: None,
    }
}

/// SOL transfer moving `sol` from account 0 to account 1
pub fn sol_transfer(sol: u64, block_time: i64, programs: &[&str]) -> TransactionDetail {
    let lamports = sol * LAMPORTS;
    TransactionDetail {
        slot: Some(299_999_000),
        block_time: Some(block_time),
        meta: Some(TransactionMeta {
            err: None,
            pre_balances: vec![lamports + 5_000_000_000, 1_000_000],
            post_balances: vec![5_000_000_000, lamports + 1_000_000],
            ..Default::default()
        }),
        transaction: Some(TransactionBody {
            message: TransactionMessage {
                instructions: programs
                    .iter()
                    .map(|p| Instruction {
                        program_id: p.to_string(),
                    })
                    .collect(),
            },
        }),
    }
}

pub fn token_balance(index: u32, mint: &str, amount: &str) -> TokenBalance {
    TokenBalance {
        account_index: index,
        mint: mint.to_string(),
        ui_token_amount: Some(UiTokenAmount {
            ui_amount: None,
            ui_amount_string: Some(amount.to_string()),
            decimals: 6,
        }),
    }
}

/// Swap selling `amount_in` of `mint_in` for `amount_out` of `mint_out`
pub fn token_swap(
    mint_in: &str,
    amount_in: &str,
    mint_out: &str,
    amount_out: &str,
    block_time: i64,
) -> TransactionDetail {
    let after_in = (Decimal::from(1_000_000) - amount_in.parse::<Decimal>().unwrap()).to_string();

    TransactionDetail {
        slot: Some(299_999_500),
        block_time: Some(block_time),
        meta: Some(TransactionMeta {
            err: None,
            pre_token_balances: vec![
                token_balance(1, mint_in, "1000000"),
                token_balance(2, mint_out, "0"),
            ],
            post_token_balances: vec![
                token_balance(1, mint_in, &after_in),
                token_balance(2, mint_out, amount_out),
            ],
            ..Default::default()
        }),
        transaction: None,
    }
}

pub fn validator(pubkey: &str, stake_sol: u64, commission: u8) -> VoteAccount {
    VoteAccount {
        vote_pubkey: pubkey.to_string(),
        node_pubkey: format!("node-{pubkey}"),
        activated_stake: stake_sol * LAMPORTS,
        commission,
        epoch_vote_account: true,
        last_vote: 0,
    }
}

/// Component tunables with no inter-call delay and a fixed watch list
pub fn fast_config(wallets: &[&str]) -> PipelineConfig {
    PipelineConfig {
        whales: WhaleDetectorConfig {
            wallets: wallets.iter().map(|w| w.to_string()).collect(),
            call_delay: Duration::ZERO,
            ..WhaleDetectorConfig::default()
        },
        market: MarketFlowConfig {
            call_delay: Duration::ZERO,
            ..MarketFlowConfig::default()
        },
        staking: StakingConfig::default(),
        feed: FeedConfig::default(),
    }
}

pub fn build_pipeline<S: EventStore + 'static>(
    chain: ScriptedChain,
    store: Arc<S>,
    config: PipelineConfig,
) -> RefreshOrchestrator {
    RefreshOrchestrator::build(
        Arc::new(chain),
        Arc::new(StaticPriceSource::default()),
        store,
        Arc::new(Jitter::seeded(7)),
        config,
    )
}

/// Memory store that rejects some writes and some reads.
///
/// Every `reject_every`-th insert (counted across collections) fails; 0
/// never rejects. Reads of the collections named in `failing_reads` fail.
#[derive(Default)]
pub struct FlakyStore {
    pub inner: MemoryEventStore,
    pub reject_every: usize,
    pub failing_reads: HashSet<&'static str>,
    inserts: AtomicUsize,
}

impl FlakyStore {
    pub fn rejecting_every(n: usize) -> Self {
        Self {
            reject_every: n,
            ..Default::default()
        }
    }

    pub fn failing_reads_of(collections: &[&'static str]) -> Self {
        Self {
            failing_reads: collections.iter().copied().collect(),
            ..Default::default()
        }
    }

    fn admit_insert(&self) -> Result<(), StoreError> {
        let n = self.inserts.fetch_add(1, Ordering::SeqCst) + 1;
        if self.reject_every > 0 && n % self.reject_every == 0 {
            return Err(StoreError::Database(format!("insert #{n} rejected")));
        }
        Ok(())
    }

    fn admit_read(&self, collection: &str) -> Result<(), StoreError> {
        if self.failing_reads.contains(collection) {
            return Err(StoreError::Database(format!("{collection} unreadable")));
        }
        Ok(())
    }
}

#[async_trait]
impl EventStore for FlakyStore {
    async fn insert_transfer(&self, event: &TransferEvent) -> Result<bool, StoreError> {
        self.admit_insert()?;
        self.inner.insert_transfer(event).await
    }

    async fn insert_swap(&self, event: &SwapEvent) -> Result<(), StoreError> {
        self.admit_insert()?;
        self.inner.insert_swap(event).await
    }

    async fn insert_stake(&self, snapshot: &StakeSnapshot) -> Result<(), StoreError> {
        self.admit_insert()?;
        self.inner.insert_stake(snapshot).await
    }

    async fn insert_feed_event(&self, event: &FeedEvent) -> Result<(), StoreError> {
        self.admit_insert()?;
        self.inner.insert_feed_event(event).await
    }

    async fn latest_transfers(&self, limit: u64) -> Result<Vec<TransferEvent>, StoreError> {
        self.admit_read("whale_events")?;
        self.inner.latest_transfers(limit).await
    }

    async fn latest_swaps(&self, limit: u64) -> Result<Vec<SwapEvent>, StoreError> {
        self.admit_read("market_flow")?;
        self.inner.latest_swaps(limit).await
    }

    async fn latest_stakes(&self, limit: u64) -> Result<Vec<StakeSnapshot>, StoreError> {
        self.admit_read("staking_data")?;
        self.inner.latest_stakes(limit).await
    }

    async fn top_stakes_by_total(&self, limit: u64) -> Result<Vec<StakeSnapshot>, StoreError> {
        self.admit_read("staking_data")?;
        self.inner.top_stakes_by_total(limit).await
    }

    async fn latest_feed(&self, limit: u64) -> Result<Vec<FeedEvent>, StoreError> {
        self.admit_read("real_time_feed")?;
        self.inner.latest_feed(limit).await
    }
}
