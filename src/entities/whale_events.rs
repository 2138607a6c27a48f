//! `SeaORM` Entity for whale_events table

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "whale_events")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub signature: String,
    pub wallet_address: String,
    pub transaction_type: String,
    pub amount: Decimal,
    pub token_symbol: String,
    pub token_mint: String,
    pub usd_value: Decimal,
    pub timestamp: i64,
    pub block_number: i64,
    pub is_suspicious: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
