//! Event store
//!
//! Four append-only collections (transfers, swaps, stake snapshots, feed
//! events) each readable newest-first with a limit. `SeaOrmEventStore` is the
//! production backend; `MemoryEventStore` keeps everything in process.

use async_trait::async_trait;
use futures_util::future::join_all;
use parking_lot::RwLock;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use std::collections::HashSet;
use std::future::Future;

use crate::entities::{market_flow, prelude::*, real_time_feed, staking_data, whale_events};
use crate::models::feed::FeedEvent;
use crate::models::stake::StakeSnapshot;
use crate::models::swap::SwapEvent;
use crate::models::transfer::TransferEvent;

/// Error types for store access
#[derive(Debug)]
pub enum StoreError {
    Database(String),
    Serialization(String),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Database(msg) => write!(f, "Database error: {}", msg),
            StoreError::Serialization(msg) => write!(f, "Serialization error: {}", msg),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<DbErr> for StoreError {
    fn from(e: DbErr) -> Self {
        StoreError::Database(e.to_string())
    }
}

#[async_trait]
pub trait EventStore: Send + Sync {
    /// Insert-if-absent keyed by signature. `Ok(false)` means it was already stored.
    async fn insert_transfer(&self, event: &TransferEvent) -> Result<bool, StoreError>;

    async fn insert_swap(&self, event: &SwapEvent) -> Result<(), StoreError>;

    async fn insert_stake(&self, snapshot: &StakeSnapshot) -> Result<(), StoreError>;

    async fn insert_feed_event(&self, event: &FeedEvent) -> Result<(), StoreError>;

    async fn latest_transfers(&self, limit: u64) -> Result<Vec<TransferEvent>, StoreError>;

    async fn latest_swaps(&self, limit: u64) -> Result<Vec<SwapEvent>, StoreError>;

    async fn latest_stakes(&self, limit: u64) -> Result<Vec<StakeSnapshot>, StoreError>;

    /// Largest validators of the newest stored epoch first, one row per
    /// validator (its most recent snapshot)
    async fn top_stakes_by_total(&self, limit: u64) -> Result<Vec<StakeSnapshot>, StoreError>;

    async fn latest_feed(&self, limit: u64) -> Result<Vec<FeedEvent>, StoreError>;
}

/// Outcome of one concurrent write batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteReport {
    pub attempted: usize,
    /// Rows actually added (duplicates excluded)
    pub written: usize,
    pub duplicates: usize,
    pub failed: usize,
}

/// Issue one write per item concurrently. Failures are logged and counted,
/// never propagated.
pub async fn persist_each<'a, T, F, Fut>(collection: &str, items: &'a [T], write: F) -> WriteReport
where
    F: Fn(&'a T) -> Fut,
    Fut: Future<Output = Result<bool, StoreError>>,
{
    let results = join_all(items.iter().map(write)).await;

    let mut report = WriteReport {
        attempted: items.len(),
        ..WriteReport::default()
    };
    for result in results {
        match result {
            Ok(true) => report.written += 1,
            Ok(false) => report.duplicates += 1,
            Err(e) => {
                report.failed += 1;
                tracing::warn!(collection = collection, error = %e, "Failed to persist record");
            }
        }
    }

    if report.failed > 0 {
        tracing::warn!(
            collection = collection,
            failed = report.failed,
            attempted = report.attempted,
            "Partial write failure"
        );
    }

    report
}

/// Reduce newest-first snapshots to the latest one per validator within the
/// newest epoch, ordered by total stake.
pub fn current_stakes(newest_first: Vec<StakeSnapshot>, limit: u64) -> Vec<StakeSnapshot> {
    let Some(epoch) = newest_first.iter().map(|s| s.epoch).max() else {
        return Vec::new();
    };

    let mut seen = HashSet::new();
    let mut current: Vec<StakeSnapshot> = newest_first
        .into_iter()
        .filter(|s| s.epoch == epoch)
        .filter(|s| seen.insert(s.validator_address.clone()))
        .collect();

    current.sort_by(|a, b| b.total_stake.cmp(&a.total_stake));
    current.truncate(limit as usize);
    current
}

pub async fn persist_transfers(store: &dyn EventStore, events: &[TransferEvent]) -> WriteReport {
    persist_each("whale_events", events, |event| store.insert_transfer(event)).await
}

pub async fn persist_swaps(store: &dyn EventStore, events: &[SwapEvent]) -> WriteReport {
    persist_each("market_flow", events, |event| async move {
        store.insert_swap(event).await.map(|_| true)
    })
    .await
}

pub async fn persist_stakes(store: &dyn EventStore, snapshots: &[StakeSnapshot]) -> WriteReport {
    persist_each("staking_data", snapshots, |snapshot| async move {
        store.insert_stake(snapshot).await.map(|_| true)
    })
    .await
}

pub async fn persist_feed_events(store: &dyn EventStore, events: &[FeedEvent]) -> WriteReport {
    persist_each("real_time_feed", events, |event| async move {
        store.insert_feed_event(event).await.map(|_| true)
    })
    .await
}

/// PostgreSQL-backed store
#[derive(Clone)]
pub struct SeaOrmEventStore {
    db: DatabaseConnection,
}

impl SeaOrmEventStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl EventStore for SeaOrmEventStore {
    async fn insert_transfer(&self, event: &TransferEvent) -> Result<bool, StoreError> {
        let model = whale_events::ActiveModel {
            signature: Set(event.signature.clone()),
            wallet_address: Set(event.wallet_address.clone()),
            transaction_type: Set(event.transaction_type.as_str().to_string()),
            amount: Set(event.amount),
            token_symbol: Set(event.token_symbol.clone()),
            token_mint: Set(event.token_mint.clone()),
            usd_value: Set(event.usd_value),
            timestamp: Set(event.timestamp),
            block_number: Set(event.block_number as i64),
            is_suspicious: Set(event.is_suspicious),
            ..Default::default()
        };

        let rows = WhaleEvents::insert(model)
            .on_conflict(
                OnConflict::column(whale_events::Column::Signature)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await?;

        Ok(rows > 0)
    }

    async fn insert_swap(&self, event: &SwapEvent) -> Result<(), StoreError> {
        let model = market_flow::ActiveModel {
            token_in: Set(event.token_in.clone()),
            token_out: Set(event.token_out.clone()),
            amount_in: Set(event.amount_in),
            amount_out: Set(event.amount_out),
            price_impact: Set(event.price_impact),
            volume_24h: Set(event.volume_24h),
            dex_name: Set(event.dex_name.clone()),
            source: Set(event.source.as_str().to_string()),
            timestamp: Set(event.timestamp),
            ..Default::default()
        };

        MarketFlow::insert(model).exec_without_returning(&self.db).await?;
        Ok(())
    }

    async fn insert_stake(&self, snapshot: &StakeSnapshot) -> Result<(), StoreError> {
        let model = staking_data::ActiveModel {
            validator_address: Set(snapshot.validator_address.clone()),
            total_stake: Set(snapshot.total_stake),
            active_stake: Set(snapshot.active_stake),
            delegators_count: Set(snapshot.delegators_count as i64),
            commission: Set(snapshot.commission),
            apy: Set(snapshot.apy),
            epoch: Set(snapshot.epoch as i64),
            timestamp: Set(snapshot.timestamp),
            ..Default::default()
        };

        StakingData::insert(model).exec_without_returning(&self.db).await?;
        Ok(())
    }

    async fn insert_feed_event(&self, event: &FeedEvent) -> Result<(), StoreError> {
        let model = real_time_feed::ActiveModel {
            event_type: Set(event.event_type.as_str().to_string()),
            title: Set(event.title.clone()),
            description: Set(event.description.clone()),
            data: Set(event.data.clone()),
            priority: Set(event.priority.as_str().to_string()),
            timestamp: Set(event.timestamp),
            ..Default::default()
        };

        RealTimeFeed::insert(model).exec_without_returning(&self.db).await?;
        Ok(())
    }

    async fn latest_transfers(&self, limit: u64) -> Result<Vec<TransferEvent>, StoreError> {
        let rows = WhaleEvents::find()
            .order_by_desc(whale_events::Column::Timestamp)
            .limit(limit)
            .all(&self.db)
            .await?;
        Ok(rows.into_iter().map(TransferEvent::from).collect())
    }

    async fn latest_swaps(&self, limit: u64) -> Result<Vec<SwapEvent>, StoreError> {
        let rows = MarketFlow::find()
            .order_by_desc(market_flow::Column::Timestamp)
            .limit(limit)
            .all(&self.db)
            .await?;
        Ok(rows.into_iter().map(SwapEvent::from).collect())
    }

    async fn latest_stakes(&self, limit: u64) -> Result<Vec<StakeSnapshot>, StoreError> {
        let rows = StakingData::find()
            .order_by_desc(staking_data::Column::Timestamp)
            .limit(limit)
            .all(&self.db)
            .await?;
        Ok(rows.into_iter().map(StakeSnapshot::from).collect())
    }

    async fn top_stakes_by_total(&self, limit: u64) -> Result<Vec<StakeSnapshot>, StoreError> {
        let Some(newest) = StakingData::find()
            .order_by_desc(staking_data::Column::Epoch)
            .one(&self.db)
            .await?
        else {
            return Ok(Vec::new());
        };

        let rows = StakingData::find()
            .filter(staking_data::Column::Epoch.eq(newest.epoch))
            .order_by_desc(staking_data::Column::Timestamp)
            .order_by_desc(staking_data::Column::Id)
            .all(&self.db)
            .await?;

        Ok(current_stakes(
            rows.into_iter().map(StakeSnapshot::from).collect(),
            limit,
        ))
    }

    async fn latest_feed(&self, limit: u64) -> Result<Vec<FeedEvent>, StoreError> {
        let rows = RealTimeFeed::find()
            .order_by_desc(real_time_feed::Column::Timestamp)
            .order_by_desc(real_time_feed::Column::Id)
            .limit(limit)
            .all(&self.db)
            .await?;

        Ok(rows
            .into_iter()
            .filter_map(|row| {
                let id = row.id;
                match FeedEvent::try_from(row) {
                    Ok(event) => Some(event),
                    Err(e) => {
                        tracing::warn!(id = id, error = %e, "Skipping malformed feed row");
                        None
                    }
                }
            })
            .collect())
    }
}

/// In-process store with the same semantics as the database backend
#[derive(Default)]
pub struct MemoryEventStore {
    transfers: RwLock<Vec<TransferEvent>>,
    swaps: RwLock<Vec<SwapEvent>>,
    stakes: RwLock<Vec<StakeSnapshot>>,
    feed: RwLock<Vec<FeedEvent>>,
}

impl MemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn transfer_count(&self) -> usize {
        self.transfers.read().len()
    }

    pub fn swap_count(&self) -> usize {
        self.swaps.read().len()
    }

    pub fn stake_count(&self) -> usize {
        self.stakes.read().len()
    }

    pub fn feed_count(&self) -> usize {
        self.feed.read().len()
    }
}

/// Newest first; among equal keys the later insert wins
fn newest_first<T: Clone, K: Ord>(rows: &[T], key: impl Fn(&T) -> K, limit: u64) -> Vec<T> {
    let mut out: Vec<T> = rows.iter().rev().cloned().collect();
    out.sort_by(|a, b| key(b).cmp(&key(a)));
    out.truncate(limit as usize);
    out
}

#[async_trait]
impl EventStore for MemoryEventStore {
    async fn insert_transfer(&self, event: &TransferEvent) -> Result<bool, StoreError> {
        let mut transfers = self.transfers.write();
        if transfers.iter().any(|t| t.signature == event.signature) {
            return Ok(false);
        }
        transfers.push(event.clone());
        Ok(true)
    }

    async fn insert_swap(&self, event: &SwapEvent) -> Result<(), StoreError> {
        self.swaps.write().push(event.clone());
        Ok(())
    }

    async fn insert_stake(&self, snapshot: &StakeSnapshot) -> Result<(), StoreError> {
        self.stakes.write().push(snapshot.clone());
        Ok(())
    }

    async fn insert_feed_event(&self, event: &FeedEvent) -> Result<(), StoreError> {
        self.feed.write().push(event.clone());
        Ok(())
    }

    async fn latest_transfers(&self, limit: u64) -> Result<Vec<TransferEvent>, StoreError> {
        Ok(newest_first(&self.transfers.read(), |t| t.timestamp, limit))
    }

    async fn latest_swaps(&self, limit: u64) -> Result<Vec<SwapEvent>, StoreError> {
        Ok(newest_first(&self.swaps.read(), |s| s.timestamp, limit))
    }

    async fn latest_stakes(&self, limit: u64) -> Result<Vec<StakeSnapshot>, StoreError> {
        Ok(newest_first(&self.stakes.read(), |s| s.timestamp, limit))
    }

    async fn top_stakes_by_total(&self, limit: u64) -> Result<Vec<StakeSnapshot>, StoreError> {
        let stakes = self.stakes.read();
        let ordered = newest_first(&stakes, |s| s.timestamp, stakes.len() as u64);
        Ok(current_stakes(ordered, limit))
    }

    async fn latest_feed(&self, limit: u64) -> Result<Vec<FeedEvent>, StoreError> {
        Ok(newest_first(&self.feed.read(), |e| e.timestamp, limit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::transfer::TransferKind;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn transfer(signature: &str, timestamp: i64) -> TransferEvent {
        TransferEvent {
            signature: signature.to_string(),
            wallet_address: "wallet".to_string(),
            transaction_type: TransferKind::Transfer,
            amount: dec!(150),
            token_symbol: "SOL".to_string(),
            token_mint: "So11111111111111111111111111111111111111112".to_string(),
            usd_value: dec!(7500),
            timestamp,
            block_number: 1,
            is_suspicious: false,
        }
    }

    #[tokio::test]
    async fn test_transfer_insert_is_idempotent() {
        let store = MemoryEventStore::new();
        assert!(store.insert_transfer(&transfer("sig-1", 10)).await.unwrap());
        assert!(!store.insert_transfer(&transfer("sig-1", 10)).await.unwrap());
        assert_eq!(store.transfer_count(), 1);
    }

    #[tokio::test]
    async fn test_latest_is_newest_first_and_limited() {
        let store = MemoryEventStore::new();
        for (sig, ts) in [("a", 5), ("b", 30), ("c", 20)] {
            store.insert_transfer(&transfer(sig, ts)).await.unwrap();
        }

        let latest = store.latest_transfers(2).await.unwrap();
        let sigs: Vec<&str> = latest.iter().map(|t| t.signature.as_str()).collect();
        assert_eq!(sigs, vec!["b", "c"]);
    }

    fn stake(validator: &str, total: Decimal, epoch: u64, timestamp: i64) -> StakeSnapshot {
        StakeSnapshot {
            validator_address: validator.to_string(),
            total_stake: total,
            active_stake: total,
            delegators_count: 100,
            commission: dec!(5),
            apy: dec!(6.65),
            epoch,
            timestamp,
        }
    }

    #[tokio::test]
    async fn test_later_snapshots_supersede_earlier_ones() {
        let store = MemoryEventStore::new();
        let rows = [
            stake("big", dec!(900), 10, 100),
            stake("mid", dec!(500), 10, 100),
            stake("big", dec!(950), 11, 200),
            stake("mid", dec!(400), 11, 200),
            stake("big", dec!(300), 11, 300),
        ];
        for row in &rows {
            store.insert_stake(row).await.unwrap();
        }

        let top = store.top_stakes_by_total(20).await.unwrap();
        let summary: Vec<(&str, Decimal)> = top
            .iter()
            .map(|s| (s.validator_address.as_str(), s.total_stake))
            .collect();
        assert_eq!(summary, vec![("mid", dec!(400)), ("big", dec!(300))]);
        assert!(top.iter().all(|s| s.epoch == 11));
    }

    #[test]
    fn test_current_stakes_on_empty_input() {
        assert!(current_stakes(Vec::new(), 20).is_empty());
    }

    #[tokio::test]
    async fn test_persist_counts_duplicates() {
        let store = MemoryEventStore::new();
        let events = vec![transfer("x", 1), transfer("y", 2)];

        let first = persist_transfers(&store, &events).await;
        assert_eq!(first.written, 2);

        let second = persist_transfers(&store, &events).await;
        assert_eq!(second.written, 0);
        assert_eq!(second.duplicates, 2);
        assert_eq!(second.failed, 0);
    }
}
