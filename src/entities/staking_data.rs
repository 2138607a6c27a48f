//! `SeaORM` Entity for staking_data table

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "staking_data")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub validator_address: String,
    pub total_stake: Decimal,
    pub active_stake: Decimal,
    pub delegators_count: i64,
    pub commission: Decimal,
    pub apy: Decimal,
    pub epoch: i64,
    pub timestamp: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
