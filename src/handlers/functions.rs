use axum::{
    extract::State,
    http::{header, HeaderName, StatusCode},
    Json,
};
use serde::Serialize;

use crate::{
    error::PipelineError,
    models::{
        envelope::{DataEnvelope, ErrorEnvelope},
        feed::FeedResponse,
        refresh::RefreshSummary,
        stake::StakingResponse,
        swap::MarketFlowResponse,
        transfer::WhaleScanResponse,
    },
    AppState,
};

pub const WHALE_FETCH_FAILED: &str = "WHALE_FETCH_FAILED";
pub const MARKET_FLOW_FAILED: &str = "MARKET_FLOW_FAILED";
pub const STAKING_FETCH_FAILED: &str = "STAKING_FETCH_FAILED";
pub const FEED_AGGREGATION_FAILED: &str = "FEED_AGGREGATION_FAILED";
pub const CRON_REFRESH_FAILED: &str = "CRON_REFRESH_FAILED";

/// Permissive cross-origin headers sent with every function response
pub type CorsHeaders = [(HeaderName, &'static str); 5];

pub const CORS_HEADERS: CorsHeaders = [
    (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
    (
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        "authorization, x-client-info, apikey, content-type",
    ),
    (header::ACCESS_CONTROL_ALLOW_METHODS, "POST, GET, OPTIONS"),
    (header::ACCESS_CONTROL_MAX_AGE, "86400"),
    (header::ACCESS_CONTROL_ALLOW_CREDENTIALS, "false"),
];

pub type ApiResponse<T> = (CorsHeaders, Json<DataEnvelope<T>>);
pub type ApiError = (StatusCode, CorsHeaders, Json<ErrorEnvelope>);

fn ok<T: Serialize>(payload: T) -> ApiResponse<T> {
    (CORS_HEADERS, Json(DataEnvelope::new(payload)))
}

fn failed(code: &'static str) -> impl Fn(PipelineError) -> ApiError {
    move |e| {
        tracing::error!(code = code, error = %e, "Operation failed");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            CORS_HEADERS,
            Json(ErrorEnvelope::new(code, e.to_string())),
        )
    }
}

/// Handler for GET /
pub async fn health() -> &'static str {
    "Hello from ChainPulse Backend!"
}

/// Handler for OPTIONS on every function route
pub async fn preflight() -> (StatusCode, CorsHeaders) {
    (StatusCode::OK, CORS_HEADERS)
}

/// Handler for POST /functions/v1/fetch-whale-transactions
pub async fn fetch_whale_transactions(
    State(state): State<AppState>,
) -> Result<ApiResponse<WhaleScanResponse>, ApiError> {
    let pipeline = state.pipeline().map_err(failed(WHALE_FETCH_FAILED))?;
    let payload = pipeline
        .whales()
        .scan()
        .await
        .map_err(failed(WHALE_FETCH_FAILED))?;

    tracing::info!(
        count = payload.count,
        new = payload.new_transactions_found,
        "Served whale transactions"
    );
    Ok(ok(payload))
}

/// Handler for POST /functions/v1/fetch-market-flow
pub async fn fetch_market_flow(
    State(state): State<AppState>,
) -> Result<ApiResponse<MarketFlowResponse>, ApiError> {
    let pipeline = state.pipeline().map_err(failed(MARKET_FLOW_FAILED))?;
    let payload = pipeline
        .market()
        .collect()
        .await
        .map_err(failed(MARKET_FLOW_FAILED))?;

    tracing::info!(
        count = payload.count,
        synthesized = payload.synthesized,
        "Served market flow"
    );
    Ok(ok(payload))
}

/// Handler for POST /functions/v1/fetch-staking-data
pub async fn fetch_staking_data(
    State(state): State<AppState>,
) -> Result<ApiResponse<StakingResponse>, ApiError> {
    let pipeline = state.pipeline().map_err(failed(STAKING_FETCH_FAILED))?;
    let payload = pipeline
        .staking()
        .collect()
        .await
        .map_err(failed(STAKING_FETCH_FAILED))?;

    tracing::info!(count = payload.count, "Served staking data");
    Ok(ok(payload))
}

/// Handler for POST /functions/v1/aggregate-real-time-feed
pub async fn aggregate_real_time_feed(
    State(state): State<AppState>,
) -> Result<ApiResponse<FeedResponse>, ApiError> {
    let pipeline = state.pipeline().map_err(failed(FEED_AGGREGATION_FAILED))?;
    let payload = pipeline
        .feed()
        .aggregate()
        .await
        .map_err(failed(FEED_AGGREGATION_FAILED))?;

    tracing::info!(count = payload.count, "Served real-time feed");
    Ok(ok(payload))
}

/// Handler for POST /functions/v1/cron-refresh-data
///
/// Answers the bare cycle summary, not a data envelope.
pub async fn cron_refresh_data(
    State(state): State<AppState>,
) -> Result<(CorsHeaders, Json<RefreshSummary>), ApiError> {
    let pipeline = state.pipeline().map_err(failed(CRON_REFRESH_FAILED))?;
    let summary = pipeline.run_cycle().await;
    Ok((CORS_HEADERS, Json(summary)))
}
