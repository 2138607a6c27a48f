use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The four stages of one refresh cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefreshStage {
    CollectTransfers,
    CollectSwaps,
    CollectStakes,
    AggregateFeed,
}

impl RefreshStage {
    pub const COLLECTORS: [RefreshStage; 3] = [
        RefreshStage::CollectTransfers,
        RefreshStage::CollectSwaps,
        RefreshStage::CollectStakes,
    ];

    /// Name reported in the cycle summary
    pub fn function_name(&self) -> &'static str {
        match self {
            RefreshStage::CollectTransfers => "whale-transactions",
            RefreshStage::CollectSwaps => "market-flow",
            RefreshStage::CollectStakes => "staking-data",
            RefreshStage::AggregateFeed => "real-time-feed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StageStatus {
    Success,
    Failed,
}

/// Outcome of one stage. `code` is set on success, `error` on failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageOutcome {
    pub function: String,
    pub status: StageStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StageOutcome {
    pub fn success(stage: RefreshStage) -> Self {
        Self {
            function: stage.function_name().to_string(),
            status: StageStatus::Success,
            code: Some(200),
            error: None,
        }
    }

    pub fn failed(stage: RefreshStage, error: impl Into<String>) -> Self {
        Self {
            function: stage.function_name().to_string(),
            status: StageStatus::Failed,
            code: None,
            error: Some(error.into()),
        }
    }

    pub fn succeeded(&self) -> bool {
        self.status == StageStatus::Success
    }
}

/// Terminal state of a refresh cycle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshSummary {
    pub success: bool,
    pub timestamp: DateTime<Utc>,
    pub refreshed: Vec<StageOutcome>,
    pub feed_status: StageStatus,
}
