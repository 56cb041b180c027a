//! Migration to create the scheduled_sessions table.
//!
//! Central table for all created sessions, one-on-one and group. Meeting
//! fields are populated from the vendor response at creation time.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ScheduledSessions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ScheduledSessions::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ScheduledSessions::ProviderId)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ScheduledSessions::SessionType)
                            .text()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ScheduledSessions::Title)
                            .string_len(255)
                            .null(),
                    )
                    .col(ColumnDef::new(ScheduledSessions::Description).text().null())
                    .col(
                        ColumnDef::new(ScheduledSessions::StartTime)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ScheduledSessions::EndTime)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ScheduledSessions::Status)
                            .text()
                            .not_null()
                            .default("SCHEDULED"),
                    )
                    .col(
                        ColumnDef::new(ScheduledSessions::IsPaid)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(ScheduledSessions::Price)
                            .decimal_len(10, 2)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(ScheduledSessions::MaxAttendees)
                            .integer()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(ScheduledSessions::MeetingId)
                            .string_len(255)
                            .null(),
                    )
                    .col(ColumnDef::new(ScheduledSessions::JoinUrl).text().null())
                    .col(ColumnDef::new(ScheduledSessions::HostUrl).text().null())
                    .col(
                        ColumnDef::new(ScheduledSessions::AccessCode)
                            .string_len(50)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(ScheduledSessions::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(ScheduledSessions::UpdatedAt)
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
                    .name("idx_scheduled_sessions_provider_start")
                    .table(ScheduledSessions::Table)
                    .col(ScheduledSessions::ProviderId)
                    .col(ScheduledSessions::StartTime)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_scheduled_sessions_type_status")
                    .table(ScheduledSessions::Table)
                    .col(ScheduledSessions::SessionType)
                    .col(ScheduledSessions::Status)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ScheduledSessions::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum ScheduledSessions {
    Table,
    Id,
    ProviderId,
    SessionType,
    Title,
    Description,
    StartTime,
    EndTime,
    Status,
    IsPaid,
    Price,
    MaxAttendees,
    MeetingId,
    JoinUrl,
    HostUrl,
    AccessCode,
    CreatedAt,
    UpdatedAt,
}
