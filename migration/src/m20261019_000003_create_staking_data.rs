use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(StakingData::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(StakingData::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(StakingData::ValidatorAddress).string().not_null())
                    .col(ColumnDef::new(StakingData::TotalStake).decimal().not_null())
                    .col(ColumnDef::new(StakingData::ActiveStake).decimal().not_null())
                    .col(
                        ColumnDef::new(StakingData::DelegatorsCount)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(StakingData::Commission).decimal().not_null())
                    .col(ColumnDef::new(StakingData::Apy).decimal().not_null())
                    .col(ColumnDef::new(StakingData::Epoch).big_integer().not_null())
                    .col(ColumnDef::new(StakingData::Timestamp).big_integer().not_null())
                    .to_owned(),
            )
            .await?;

        // Snapshots accumulate per (validator, epoch); not unique on purpose
        manager
            .create_index(
                Index::create()
                    .name("idx_staking_data_validator_epoch")
                    .table(StakingData::Table)
                    .col(StakingData::ValidatorAddress)
                    .col(StakingData::Epoch)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_staking_data_timestamp")
                    .table(StakingData::Table)
                    .col(StakingData::Timestamp)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(StakingData::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum StakingData {
    Table,
    Id,
    ValidatorAddress,
    TotalStake,
    ActiveStake,
    DelegatorsCount,
    Commission,
    Apy,
    Epoch,
    Timestamp,
}
