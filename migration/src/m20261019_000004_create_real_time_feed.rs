use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(RealTimeFeed::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(RealTimeFeed::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(RealTimeFeed::EventType).string_len(32).not_null())
                    .col(ColumnDef::new(RealTimeFeed::Title).string().not_null())
                    .col(ColumnDef::new(RealTimeFeed::Description).text().not_null())
                    .col(ColumnDef::new(RealTimeFeed::Data).text().not_null())
                    .col(ColumnDef::new(RealTimeFeed::Priority).string_len(16).not_null())
                    .col(ColumnDef::new(RealTimeFeed::Timestamp).big_integer().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_real_time_feed_timestamp")
                    .table(RealTimeFeed::Table)
                    .col(RealTimeFeed::Timestamp)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(RealTimeFeed::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum RealTimeFeed {
    Table,
    Id,
    EventType,
    Title,
    Description,
    Data,
    Priority,
    Timestamp,
}
