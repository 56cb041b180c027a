//! Migration to create the session_attendees table.
//!
//! One row per enrolled student. The unique index on (session_id,
//! student_id) is the storage-level guard against double enrollment; the
//! application-level pre-check exists only to produce a friendlier error.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(SessionAttendees::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SessionAttendees::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(SessionAttendees::SessionId)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SessionAttendees::StudentId)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SessionAttendees::BookingTime)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SessionAttendees::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_session_attendees_session")
                            .from(SessionAttendees::Table, SessionAttendees::SessionId)
                            .to(ScheduledSessions::Table, ScheduledSessions::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_session_attendees_session_student")
                    .table(SessionAttendees::Table)
                    .col(SessionAttendees::SessionId)
                    .col(SessionAttendees::StudentId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_session_attendees_student")
                    .table(SessionAttendees::Table)
                    .col(SessionAttendees::StudentId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(SessionAttendees::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum SessionAttendees {
    Table,
    Id,
    SessionId,
    StudentId,
    BookingTime,
    CreatedAt,
}

#[derive(DeriveIden)]
enum ScheduledSessions {
    Table,
    Id,
}
