use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::entities::staking_data;

/// Point-in-time validator state. Keyed by (validator_address, epoch);
/// later snapshots for an epoch are appended next to earlier ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StakeSnapshot {
    pub validator_address: String,
    /// SOL, 2 dp
    pub total_stake: Decimal,
    pub active_stake: Decimal,
    /// Estimated, see `staking::estimate_delegators`
    pub delegators_count: u64,
    pub commission: Decimal,
    pub apy: Decimal,
    pub epoch: u64,
    pub timestamp: i64,
}

impl From<staking_data::Model> for StakeSnapshot {
    fn from(model: staking_data::Model) -> Self {
        Self {
            validator_address: model.validator_address,
            total_stake: model.total_stake,
            active_stake: model.active_stake,
            delegators_count: model.delegators_count.max(0) as u64,
            commission: model.commission,
            apy: model.apy,
            epoch: model.epoch.max(0) as u64,
            timestamp: model.timestamp,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StakingStatistics {
    pub total_stake: Decimal,
    pub total_delegators: u64,
    pub avg_apy: Decimal,
    pub current_epoch: u64,
}

/// Payload of the staking-data operation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StakingResponse {
    pub staking_data: Vec<StakeSnapshot>,
    pub count: usize,
    pub statistics: StakingStatistics,
    pub validators_fetched: usize,
    pub total_validators_on_network: usize,
}
