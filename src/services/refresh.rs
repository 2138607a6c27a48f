//! Refresh Orchestrator
//!
//! One cycle runs the three collectors concurrently, then aggregates the
//! feed from whatever the store holds. Stage failures are recorded in the
//! summary and never stop later stages.

use chrono::Utc;
use futures_util::future::join_all;
use tracing::{error, info};

use std::sync::Arc;

use crate::error::PipelineError;
use crate::models::refresh::{RefreshStage, RefreshSummary, StageOutcome, StageStatus};
use crate::services::event_store::EventStore;
use crate::services::feed_aggregator::{FeedAggregatorService, FeedConfig};
use crate::services::jitter::Jitter;
use crate::services::market_flow::{MarketFlowConfig, MarketFlowService};
use crate::services::price_oracle::PriceSource;
use crate::services::solana_rpc::ChainReader;
use crate::services::staking::{StakingConfig, StakingService};
use crate::services::whale_detector::{WhaleDetectorConfig, WhaleDetectorService};

/// Tunables of every component
#[derive(Debug, Clone, Default)]
pub struct PipelineConfig {
    pub whales: WhaleDetectorConfig,
    pub market: MarketFlowConfig,
    pub staking: StakingConfig,
    pub feed: FeedConfig,
}

pub struct RefreshOrchestrator {
    whales: WhaleDetectorService,
    market: MarketFlowService,
    staking: StakingService,
    feed: FeedAggregatorService,
}

impl RefreshOrchestrator {
    pub fn new(
        whales: WhaleDetectorService,
        market: MarketFlowService,
        staking: StakingService,
        feed: FeedAggregatorService,
    ) -> Self {
        Self {
            whales,
            market,
            staking,
            feed,
        }
    }

    /// Wire every component onto the same chain, price source and store
    pub fn build(
        chain: Arc<dyn ChainReader>,
        prices: Arc<dyn PriceSource>,
        store: Arc<dyn EventStore>,
        jitter: Arc<Jitter>,
        config: PipelineConfig,
    ) -> Self {
        Self::new(
            WhaleDetectorService::new(chain.clone(), prices.clone(), store.clone(), config.whales),
            MarketFlowService::new(chain.clone(), prices, store.clone(), jitter.clone(), config.market),
            StakingService::new(chain, store.clone(), jitter, config.staking),
            FeedAggregatorService::new(store, config.feed),
        )
    }

    pub fn whales(&self) -> &WhaleDetectorService {
        &self.whales
    }

    pub fn market(&self) -> &MarketFlowService {
        &self.market
    }

    pub fn staking(&self) -> &StakingService {
        &self.staking
    }

    pub fn feed(&self) -> &FeedAggregatorService {
        &self.feed
    }

    /// Run a single stage, folding its result into an outcome
    pub async fn run_stage(&self, stage: RefreshStage) -> StageOutcome {
        let result: Result<(), PipelineError> = match stage {
            RefreshStage::CollectTransfers => self.whales.scan().await.map(|_| ()),
            RefreshStage::CollectSwaps => self.market.collect().await.map(|_| ()),
            RefreshStage::CollectStakes => self.staking.collect().await.map(|_| ()),
            RefreshStage::AggregateFeed => self.feed.aggregate().await.map(|_| ()),
        };

        match result {
            Ok(()) => StageOutcome::success(stage),
            Err(e) => {
                error!(stage = stage.function_name(), error = %e, "Refresh stage failed");
                StageOutcome::failed(stage, e.to_string())
            }
        }
    }

    /// Collectors first (concurrently), aggregation last
    pub async fn run_cycle(&self) -> RefreshSummary {
        info!("Starting data refresh cycle");

        let refreshed: Vec<StageOutcome> = join_all(
            RefreshStage::COLLECTORS
                .iter()
                .map(|stage| self.run_stage(*stage)),
        )
        .await;

        let feed = self.run_stage(RefreshStage::AggregateFeed).await;
        let feed_status = if feed.succeeded() {
            StageStatus::Success
        } else {
            StageStatus::Failed
        };

        let failed = refreshed.iter().filter(|o| !o.succeeded()).count();
        info!(
            failed_collectors = failed,
            feed_status = ?feed_status,
            "Refresh cycle finished"
        );

        RefreshSummary {
            success: true,
            timestamp: Utc::now(),
            refreshed,
            feed_status,
        }
    }
}
