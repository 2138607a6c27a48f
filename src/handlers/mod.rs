use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::AppState;

pub mod functions;

/// Route table: one POST trigger (plus OPTIONS pre-flight) per operation
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(functions::health))
        .route(
            "/functions/v1/fetch-whale-transactions",
            post(functions::fetch_whale_transactions).options(functions::preflight),
        )
        .route(
            "/functions/v1/fetch-market-flow",
            post(functions::fetch_market_flow).options(functions::preflight),
        )
        .route(
            "/functions/v1/fetch-staking-data",
            post(functions::fetch_staking_data).options(functions::preflight),
        )
        .route(
            "/functions/v1/aggregate-real-time-feed",
            post(functions::aggregate_real_time_feed).options(functions::preflight),
        )
        .route(
            "/functions/v1/cron-refresh-data",
            post(functions::cron_refresh_data).options(functions::preflight),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
