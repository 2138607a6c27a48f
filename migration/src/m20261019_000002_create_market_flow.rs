use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(MarketFlow::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(MarketFlow::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(MarketFlow::TokenIn).string_len(16).not_null())
                    .col(ColumnDef::new(MarketFlow::TokenOut).string_len(16).not_null())
                    .col(ColumnDef::new(MarketFlow::AmountIn).decimal().not_null())
                    .col(ColumnDef::new(MarketFlow::AmountOut).decimal().not_null())
                    .col(ColumnDef::new(MarketFlow::PriceImpact).decimal().not_null())
                    .col(ColumnDef::new(MarketFlow::Volume24h).decimal().not_null())
                    .col(ColumnDef::new(MarketFlow::DexName).string_len(32).not_null())
                    // "detected" rows come from chain data, "synthetic" rows from fallback templates
                    .col(
                        ColumnDef::new(MarketFlow::Source)
                            .string_len(16)
                            .not_null()
                            .default("detected"),
                    )
                    .col(ColumnDef::new(MarketFlow::Timestamp).big_integer().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_market_flow_timestamp")
                    .table(MarketFlow::Table)
                    .col(MarketFlow::Timestamp)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(MarketFlow::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum MarketFlow {
    Table,
    Id,
    TokenIn,
    TokenOut,
    AmountIn,
    AmountOut,
    PriceImpact,
    #[sea_orm(iden = "volume_24h")]
    Volume24h,
    DexName,
    Source,
    Timestamp,
}
