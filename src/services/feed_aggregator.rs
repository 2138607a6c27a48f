//! Real-time feed
//!
//! Turns the latest records of each source into feed events, persists them
//! and returns the newest window of the feed.

use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

use crate::error::PipelineError;
use crate::models::feed::{FeedEvent, FeedEventKind, FeedPriority, FeedResponse, FeedSourceCounts};
use crate::models::stake::StakeSnapshot;
use crate::models::swap::SwapEvent;
use crate::models::transfer::TransferEvent;
use crate::services::event_store::{persist_feed_events, EventStore, StoreError};

#[derive(Debug, Clone)]
pub struct FeedConfig {
    /// Records read per source kind
    pub per_source_limit: u64,
    /// Feed events returned to the caller
    pub window: u64,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            per_source_limit: 5,
            window: 30,
        }
    }
}

/// Render with thousands separators and at most two decimals, e.g. `1,234,567.5`
pub fn format_thousands(value: Decimal) -> String {
    let rendered = value.round_dp(2).normalize().to_string();
    let (sign, unsigned) = match rendered.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", rendered.as_str()),
    };
    let (int_part, frac_part) = match unsigned.split_once('.') {
        Some((int_part, frac)) => (int_part, Some(frac)),
        None => (unsigned, None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, digit) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    match frac_part {
        Some(frac) => format!("{sign}{grouped}.{frac}"),
        None => format!("{sign}{grouped}"),
    }
}

fn short_address(address: &str) -> &str {
    address.get(..8).unwrap_or(address)
}

fn payload<T: Serialize>(record: &T) -> Option<String> {
    match serde_json::to_string(record) {
        Ok(data) => Some(data),
        Err(e) => {
            warn!(error = %e, "Failed to serialize feed payload, dropping record");
            None
        }
    }
}

pub fn transfer_priority(event: &TransferEvent) -> FeedPriority {
    if event.is_suspicious {
        FeedPriority::High
    } else {
        FeedPriority::Normal
    }
}

pub fn transfer_feed_event(event: &TransferEvent) -> Option<FeedEvent> {
    let amount = event.amount.normalize();
    Some(FeedEvent {
        event_type: FeedEventKind::TransferAlert,
        title: format!(
            "Whale {}: {} {}",
            event.transaction_type, amount, event.token_symbol
        ),
        description: format!(
            "Wallet {}... {} {} {} (≈${})",
            short_address(&event.wallet_address),
            event.transaction_type,
            amount,
            event.token_symbol,
            format_thousands(event.usd_value)
        ),
        data: payload(event)?,
        priority: transfer_priority(event),
        timestamp: event.timestamp,
    })
}

pub fn swap_feed_event(swap: &SwapEvent) -> Option<FeedEvent> {
    let mut description = format!(
        "{} {} swapped to {} {} on {}",
        swap.amount_in.normalize(),
        swap.token_in,
        swap.amount_out.normalize(),
        swap.token_out,
        swap.dex_name
    );
    if swap.is_synthetic() {
        description.push_str(" (estimated)");
    }

    Some(FeedEvent {
        event_type: FeedEventKind::MarketSwap,
        title: format!("Swap: {} → {}", swap.token_in, swap.token_out),
        description,
        data: payload(swap)?,
        priority: FeedPriority::Normal,
        timestamp: swap.timestamp,
    })
}

pub fn stake_feed_event(snapshot: &StakeSnapshot) -> Option<FeedEvent> {
    Some(FeedEvent {
        event_type: FeedEventKind::StakingUpdate,
        title: format!(
            "Validator Update: {}...",
            short_address(&snapshot.validator_address)
        ),
        description: format!(
            "Total stake: {} SOL with {} delegators (APY: {}%)",
            format_thousands(snapshot.total_stake),
            snapshot.delegators_count,
            snapshot.apy.normalize()
        ),
        data: payload(snapshot)?,
        priority: FeedPriority::Low,
        timestamp: snapshot.timestamp,
    })
}

/// One feed event per source record, newest first
pub fn merge_feed(
    transfers: &[TransferEvent],
    swaps: &[SwapEvent],
    stakes: &[StakeSnapshot],
) -> Vec<FeedEvent> {
    let mut events: Vec<FeedEvent> = transfers
        .iter()
        .filter_map(transfer_feed_event)
        .chain(swaps.iter().filter_map(swap_feed_event))
        .chain(stakes.iter().filter_map(stake_feed_event))
        .collect();

    events.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    events
}

fn or_empty<T>(source: &str, result: Result<Vec<T>, StoreError>) -> Vec<T> {
    result.unwrap_or_else(|e| {
        warn!(source = source, error = %e, "Failed to read feed source, treating as empty");
        Vec::new()
    })
}

pub struct FeedAggregatorService {
    store: Arc<dyn EventStore>,
    config: FeedConfig,
}

impl FeedAggregatorService {
    pub fn new(store: Arc<dyn EventStore>, config: FeedConfig) -> Self {
        Self { store, config }
    }

    /// Merge the latest records of every source into the feed.
    ///
    /// Missing or unreadable sources degrade the result, they never fail it.
    pub async fn aggregate(&self) -> Result<FeedResponse, PipelineError> {
        let limit = self.config.per_source_limit;
        let (transfers, swaps, stakes) = tokio::join!(
            self.store.latest_transfers(limit),
            self.store.latest_swaps(limit),
            self.store.latest_stakes(limit),
        );
        let transfers = or_empty("whale_events", transfers);
        let swaps = or_empty("market_flow", swaps);
        let stakes = or_empty("staking_data", stakes);

        let sources = FeedSourceCounts {
            transfers: transfers.len(),
            swaps: swaps.len(),
            stakes: stakes.len(),
        };

        let merged = merge_feed(&transfers, &swaps, &stakes);
        let report = persist_feed_events(self.store.as_ref(), &merged).await;
        info!(
            transfers = sources.transfers,
            swaps = sources.swaps,
            stakes = sources.stakes,
            written = report.written,
            failed = report.failed,
            "Feed events persisted"
        );

        let feed_events = match self.store.latest_feed(self.config.window).await {
            Ok(events) => events,
            Err(e) => {
                warn!(error = %e, "Failed to read back feed, returning this cycle only");
                let mut events = merged;
                events.truncate(self.config.window as usize);
                events
            }
        };

        Ok(FeedResponse {
            count: feed_events.len(),
            feed_events,
            sources,
        })
    }
}
