pub use sea_orm_migration::prelude::*;

mod m20261019_000001_create_whale_events;
mod m20261019_000002_create_market_flow;
mod m20261019_000003_create_staking_data;
mod m20261019_000004_create_real_time_feed;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20261019_000001_create_whale_events::Migration),
            Box::new(m20261019_000002_create_market_flow::Migration),
            Box::new(m20261019_000003_create_staking_data::Migration),
            Box::new(m20261019_000004_create_real_time_feed::Migration),
        ]
    }
}
