//! Migration to create the availability_slots table.
//!
//! Each row is one open time window published by a provider. Slots are
//! replaced wholesale per provider and flip to booked exactly once.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(AvailabilitySlots::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AvailabilitySlots::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(AvailabilitySlots::ProviderId)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AvailabilitySlots::StartTime)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AvailabilitySlots::EndTime)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AvailabilitySlots::Booked)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(AvailabilitySlots::IsPaid)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(AvailabilitySlots::PricePerSession)
                            .decimal_len(10, 2)
                            .null(),
                    )
                    .col(ColumnDef::new(AvailabilitySlots::Description).text().null())
                    .col(
                        ColumnDef::new(AvailabilitySlots::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(AvailabilitySlots::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_availability_slots_provider_start")
                    .table(AvailabilitySlots::Table)
                    .col(AvailabilitySlots::ProviderId)
                    .col(AvailabilitySlots::StartTime)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(AvailabilitySlots::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum AvailabilitySlots {
    Table,
    Id,
    ProviderId,
    StartTime,
    EndTime,
    Booked,
    IsPaid,
    PricePerSession,
    Description,
    CreatedAt,
    UpdatedAt,
}
