// src/lib.rs

use std::sync::Arc;

use error::PipelineError;
use services::refresh::RefreshOrchestrator;

#[derive(Clone)]
pub struct AppState {
    /// `None` when the store is not configured; every operation then fails
    pub pipeline: Option<Arc<RefreshOrchestrator>>,
}

impl AppState {
    pub fn new(pipeline: Arc<RefreshOrchestrator>) -> Self {
        Self {
            pipeline: Some(pipeline),
        }
    }

    pub fn unconfigured() -> Self {
        Self { pipeline: None }
    }

    pub fn pipeline(&self) -> Result<&Arc<RefreshOrchestrator>, PipelineError> {
        self.pipeline
            .as_ref()
            .ok_or_else(|| PipelineError::Configuration("Store configuration missing".to_string()))
    }
}

pub mod entities {
    pub mod prelude;
    pub mod whale_events;
    pub mod market_flow;
    pub mod staking_data;
    pub mod real_time_feed;
}

pub mod services {
    pub mod solana_rpc;
    pub mod price_oracle;
    pub mod event_store;
    pub mod jitter;
    pub mod transfer_classifier;
    pub mod whale_detector;
    pub mod market_flow;
    pub mod staking;
    pub mod feed_aggregator;
    pub mod refresh;
}

pub mod models;
pub mod handlers;
pub mod jobs;
pub mod config;
pub mod error;
