//! Validator stake snapshots

use chrono::Utc;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;
use tracing::{info, warn};

use crate::error::PipelineError;
use crate::models::chain::VoteAccount;
use crate::models::stake::{StakeSnapshot, StakingResponse, StakingStatistics};
use crate::services::event_store::{persist_stakes, EventStore};
use crate::services::jitter::Jitter;
use crate::services::solana_rpc::ChainReader;
use crate::services::transfer_classifier::lamports_to_sol;

/// Network-wide staking yield before commission, percent
pub const BASE_NETWORK_APY: Decimal = dec!(7.0);

#[derive(Debug, Clone)]
pub struct StakingConfig {
    /// Validators snapshotted per cycle, largest first
    pub top_validators: usize,
    pub base_apy: Decimal,
    pub min_delegators: u64,
    /// One estimated delegator per this many SOL
    pub sol_per_delegator: u64,
    /// Upper bound (exclusive) of the random delegator offset
    pub delegator_offset: u64,
    pub readback_limit: u64,
}

impl Default for StakingConfig {
    fn default() -> Self {
        Self {
            top_validators: 20,
            base_apy: BASE_NETWORK_APY,
            min_delegators: 100,
            sol_per_delegator: 5000,
            delegator_offset: 200,
            readback_limit: 20,
        }
    }
}

pub fn compute_apy(base_apy: Decimal, commission: Decimal) -> Decimal {
    base_apy * (Decimal::ONE - commission / dec!(100))
}

/// `max(min_delegators, floor(stake / sol_per_delegator) + offset)`
pub fn estimate_delegators(stake_sol: Decimal, offset: u64, config: &StakingConfig) -> u64 {
    let per = Decimal::from(config.sol_per_delegator.max(1));
    let base = (stake_sol / per).floor().try_into().unwrap_or(0u64);
    config.min_delegators.max(base.saturating_add(offset))
}

/// Normalize one vote account. `None` when the record is unusable.
pub fn build_snapshot(
    account: &VoteAccount,
    epoch: u64,
    delegator_offset: u64,
    timestamp: i64,
    config: &StakingConfig,
) -> Option<StakeSnapshot> {
    if account.vote_pubkey.is_empty() || account.commission > 100 {
        return None;
    }

    let stake = lamports_to_sol(account.activated_stake);
    let commission = Decimal::from(account.commission);

    Some(StakeSnapshot {
        validator_address: account.vote_pubkey.clone(),
        total_stake: stake.round_dp(2),
        active_stake: stake.round_dp(2),
        delegators_count: estimate_delegators(stake, delegator_offset, config),
        commission: commission.round_dp(2),
        apy: compute_apy(config.base_apy, commission).round_dp(2),
        epoch,
        timestamp,
    })
}

pub fn staking_statistics(snapshots: &[StakeSnapshot], current_epoch: u64) -> StakingStatistics {
    let total_stake = snapshots.iter().map(|s| s.total_stake).sum();
    let total_delegators = snapshots.iter().map(|s| s.delegators_count).sum();
    let avg_apy = if snapshots.is_empty() {
        Decimal::ZERO
    } else {
        let sum: Decimal = snapshots.iter().map(|s| s.apy).sum();
        (sum / Decimal::from(snapshots.len())).round_dp(2)
    };

    StakingStatistics {
        total_stake,
        total_delegators,
        avg_apy,
        current_epoch,
    }
}

pub struct StakingService {
    chain: Arc<dyn ChainReader>,
    store: Arc<dyn EventStore>,
    jitter: Arc<Jitter>,
    config: StakingConfig,
}

impl StakingService {
    pub fn new(
        chain: Arc<dyn ChainReader>,
        store: Arc<dyn EventStore>,
        jitter: Arc<Jitter>,
        config: StakingConfig,
    ) -> Self {
        Self {
            chain,
            store,
            jitter,
            config,
        }
    }

    /// Snapshot the largest validators, persist, read back the top by stake.
    ///
    /// Fails when the epoch or the vote accounts cannot be read.
    pub async fn collect(&self) -> Result<StakingResponse, PipelineError> {
        let epoch = self.chain.current_epoch().await?;
        let accounts = self.chain.vote_accounts().await?;
        let total_validators_on_network = accounts.current.len();

        let mut validators = accounts.current;
        validators.sort_by(|a, b| b.activated_stake.cmp(&a.activated_stake));
        validators.truncate(self.config.top_validators);

        let now = Utc::now().timestamp();
        let snapshots: Vec<StakeSnapshot> = validators
            .iter()
            .filter_map(|account| {
                let offset = self.jitter.range_u64(0, self.config.delegator_offset);
                let snapshot = build_snapshot(account, epoch, offset, now, &self.config);
                if snapshot.is_none() {
                    warn!(
                        validator = %account.vote_pubkey,
                        commission = account.commission,
                        "Skipping malformed vote account"
                    );
                }
                snapshot
            })
            .collect();

        let report = persist_stakes(self.store.as_ref(), &snapshots).await;
        info!(
            epoch = epoch,
            validators = snapshots.len(),
            network = total_validators_on_network,
            written = report.written,
            failed = report.failed,
            "Staking snapshots persisted"
        );

        let staking_data = match self.store.top_stakes_by_total(self.config.readback_limit).await {
            Ok(rows) => rows,
            Err(e) => {
                warn!(error = %e, "Failed to read back staking data, returning this cycle only");
                snapshots.clone()
            }
        };

        Ok(StakingResponse {
            count: staking_data.len(),
            statistics: staking_statistics(&staking_data, epoch),
            staking_data,
            validators_fetched: snapshots.len(),
            total_validators_on_network,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vote_account(pubkey: &str, lamports: u64, commission: u8) -> VoteAccount {
        VoteAccount {
            vote_pubkey: pubkey.to_string(),
            node_pubkey: String::new(),
            activated_stake: lamports,
            commission,
            epoch_vote_account: true,
            last_vote: 0,
        }
    }

    #[test]
    fn test_apy_formula() {
        assert_eq!(compute_apy(BASE_NETWORK_APY, dec!(10)), dec!(6.3));
        assert_eq!(compute_apy(BASE_NETWORK_APY, dec!(0)), dec!(7));
        assert_eq!(compute_apy(BASE_NETWORK_APY, dec!(100)), Decimal::ZERO);
    }

    #[test]
    fn test_delegator_estimate() {
        let config = StakingConfig::default();
        // Small validators are floored at the minimum
        assert_eq!(estimate_delegators(dec!(1000), 50, &config), 100);
        // 2_000_000 / 5000 = 400, plus offset
        assert_eq!(estimate_delegators(dec!(2000000), 37, &config), 437);
        assert_eq!(estimate_delegators(dec!(2004999), 0, &config), 400);
    }

    #[test]
    fn test_build_snapshot() {
        let config = StakingConfig::default();
        let account = vote_account("Vote111", 1_234_567_890_000_000, 10);

        let snapshot = build_snapshot(&account, 612, 0, 1_700_000_000, &config).unwrap();
        assert_eq!(snapshot.total_stake, dec!(1234567.89));
        assert_eq!(snapshot.active_stake, snapshot.total_stake);
        assert_eq!(snapshot.apy, dec!(6.3));
        assert_eq!(snapshot.commission, dec!(10));
        assert_eq!(snapshot.delegators_count, 246);
        assert_eq!(snapshot.epoch, 612);
    }

    #[test]
    fn test_malformed_vote_accounts_are_rejected() {
        let config = StakingConfig::default();
        assert!(build_snapshot(&vote_account("", 10, 5), 1, 0, 0, &config).is_none());
        assert!(build_snapshot(&vote_account("Vote111", 10, 150), 1, 0, 0, &config).is_none());
    }

    #[test]
    fn test_staking_statistics() {
        let config = StakingConfig::default();
        let snapshots: Vec<_> = [(1_000_000_000_000_000u64, 10u8), (500_000_000_000_000, 0)]
            .iter()
            .enumerate()
            .map(|(i, (lamports, commission))| {
                build_snapshot(&vote_account(&format!("V{i}"), *lamports, *commission), 9, 0, 0, &config)
                    .unwrap()
            })
            .collect();

        let stats = staking_statistics(&snapshots, 9);
        assert_eq!(stats.total_stake, dec!(1500000));
        assert_eq!(stats.total_delegators, 300);
        assert_eq!(stats.avg_apy, dec!(6.65));
        assert_eq!(stats.current_epoch, 9);
    }
}
