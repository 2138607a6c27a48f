use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(WhaleEvents::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(WhaleEvents::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    // Re-inserting a known signature is a no-op
                    .col(
                        ColumnDef::new(WhaleEvents::Signature)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(WhaleEvents::WalletAddress).string().not_null())
                    .col(
                        ColumnDef::new(WhaleEvents::TransactionType)
                            .string_len(16)
                            .not_null(),
                    )
                    .col(ColumnDef::new(WhaleEvents::Amount).decimal().not_null())
                    .col(ColumnDef::new(WhaleEvents::TokenSymbol).string_len(16).not_null())
                    .col(ColumnDef::new(WhaleEvents::TokenMint).string().not_null())
                    .col(ColumnDef::new(WhaleEvents::UsdValue).decimal().not_null())
                    .col(ColumnDef::new(WhaleEvents::Timestamp).big_integer().not_null())
                    .col(ColumnDef::new(WhaleEvents::BlockNumber).big_integer().not_null())
                    .col(
                        ColumnDef::new(WhaleEvents::IsSuspicious)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_whale_events_timestamp")
                    .table(WhaleEvents::Table)
                    .col(WhaleEvents::Timestamp)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(WhaleEvents::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum WhaleEvents {
    Table,
    Id,
    Signature,
    WalletAddress,
    TransactionType,
    Amount,
    TokenSymbol,
    TokenMint,
    UsdValue,
    Timestamp,
    BlockNumber,
    IsSuspicious,
}
