use sea_orm::Database;
use sea_orm_migration::MigratorTrait;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use chainpulse_backend::{
    config::AppConfig,
    handlers::build_router,
    jobs::refresh_cycle_sync::start_refresh_cycle_job,
    services::{
        event_store::SeaOrmEventStore,
        jitter::Jitter,
        price_oracle::{CoinGeckoPriceOracle, PriceDefaults},
        refresh::{PipelineConfig, RefreshOrchestrator},
        solana_rpc::SolanaRpcClient,
    },
    AppState,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,chainpulse_backend=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment variables
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env();

    let state = match config.database_url.as_deref() {
        Some(database_url) => {
            tracing::info!("Connecting to database...");
            let db = Database::connect(database_url).await?;

            tracing::info!("Running migrations...");
            migration::Migrator::up(&db, None).await?;

            let chain = SolanaRpcClient::new(config.solana_rpc_url.clone(), config.rpc_timeout_secs)?;
            let prices = CoinGeckoPriceOracle::new(
                config.price_api_url.clone(),
                config.price_api_key.clone(),
                config.price_timeout_secs,
                PriceDefaults::default(),
            )?;

            let pipeline = Arc::new(RefreshOrchestrator::build(
                Arc::new(chain),
                Arc::new(prices),
                Arc::new(SeaOrmEventStore::new(db)),
                Arc::new(Jitter::from_seed(config.random_seed)),
                PipelineConfig {
                    whales: config.whale_detector(),
                    ..PipelineConfig::default()
                },
            ));

            tracing::info!(
                rpc_url = %config.solana_rpc_url,
                wallets = config.whale_wallets.len(),
                threshold_sol = config.whale_threshold_sol,
                "Pipeline ready"
            );

            start_refresh_cycle_job(pipeline.clone(), config.refresh_interval_secs).await;
            AppState::new(pipeline)
        }
        None => {
            tracing::warn!(
                "DATABASE_URL not set - pipeline operations will answer with configuration errors"
            );
            AppState::unconfigured()
        }
    };

    let app = build_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
