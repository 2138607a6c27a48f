//! Refresh Cycle Job
//!
//! Runs one full refresh cycle (collectors, then feed aggregation) on a
//! fixed interval. Supports graceful shutdown via SIGTERM/SIGINT signals.

use std::sync::Arc;
use tokio::time::{interval, Duration as TokioDuration};
use tracing::{info, warn};

use crate::models::refresh::StageStatus;
use crate::services::refresh::RefreshOrchestrator;

/// Start the periodic refresh job
///
/// An interval of 0 disables the job. The first cycle runs immediately.
///
/// # Arguments
///
/// * `pipeline` - Orchestrator shared with the HTTP handlers
/// * `interval_secs` - Seconds between cycles (`REFRESH_INTERVAL_SECS`)
pub async fn start_refresh_cycle_job(pipeline: Arc<RefreshOrchestrator>, interval_secs: u64) {
    if interval_secs == 0 {
        warn!("REFRESH_INTERVAL_SECS is 0 - periodic refresh job disabled");
        return;
    }

    tokio::spawn(async move {
        info!(interval_secs = interval_secs, "Refresh cycle job started");

        let mut interval = interval(TokioDuration::from_secs(interval_secs));

        loop {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    info!("Shutdown signal received, stopping refresh cycle job gracefully");
                    break;
                }
                _ = interval.tick() => {
                    let summary = pipeline.run_cycle().await;
                    let failed: Vec<&str> = summary
                        .refreshed
                        .iter()
                        .filter(|outcome| !outcome.succeeded())
                        .map(|outcome| outcome.function.as_str())
                        .collect();

                    if failed.is_empty() && summary.feed_status == StageStatus::Success {
                        info!("Refresh cycle completed");
                    } else {
                        // Next tick retries every stage
                        warn!(
                            failed_collectors = ?failed,
                            feed_status = ?summary.feed_status,
                            "Refresh cycle completed with failures"
                        );
                    }
                }
            }
        }

        info!("Refresh cycle job stopped");
    });
}
