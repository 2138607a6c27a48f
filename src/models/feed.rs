use serde::{Deserialize, Serialize};

use crate::entities::real_time_feed;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedEventKind {
    TransferAlert,
    MarketSwap,
    StakingUpdate,
}

impl FeedEventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeedEventKind::TransferAlert => "transfer_alert",
            FeedEventKind::MarketSwap => "market_swap",
            FeedEventKind::StakingUpdate => "staking_update",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "transfer_alert" => Some(FeedEventKind::TransferAlert),
            "market_swap" => Some(FeedEventKind::MarketSwap),
            "staking_update" => Some(FeedEventKind::StakingUpdate),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedPriority {
    High,
    Normal,
    Low,
}

impl FeedPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeedPriority::High => "high",
            FeedPriority::Normal => "normal",
            FeedPriority::Low => "low",
        }
    }

    pub fn parse(value: &str) -> Self {
        match value {
            "high" => FeedPriority::High,
            "low" => FeedPriority::Low,
            _ => FeedPriority::Normal,
        }
    }
}

/// Source-agnostic timeline record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedEvent {
    pub event_type: FeedEventKind,
    pub title: String,
    pub description: String,
    /// JSON of the originating record
    pub data: String,
    pub priority: FeedPriority,
    pub timestamp: i64,
}

impl TryFrom<real_time_feed::Model> for FeedEvent {
    type Error = String;

    fn try_from(model: real_time_feed::Model) -> Result<Self, Self::Error> {
        let event_type = FeedEventKind::parse(&model.event_type)
            .ok_or_else(|| format!("unknown feed event type '{}'", model.event_type))?;

        Ok(Self {
            event_type,
            title: model.title,
            description: model.description,
            data: model.data,
            priority: FeedPriority::parse(&model.priority),
            timestamp: model.timestamp,
        })
    }
}

/// Number of source records each kind contributed to one aggregation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedSourceCounts {
    pub transfers: usize,
    pub swaps: usize,
    pub stakes: usize,
}

/// Payload of the aggregate-feed operation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedResponse {
    pub feed_events: Vec<FeedEvent>,
    pub count: usize,
    pub sources: FeedSourceCounts,
}
