//! Session attendee entity model
//!
//! One row per enrolled student. (session_id, student_id) is unique at the
//! storage layer; rows are never mutated after insert and are removed only
//! by the cascade when their session is deleted.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;
use uuid::Uuid;

use super::scheduled_session::Entity as ScheduledSession;

/// Attendee record linking a student to a scheduled session
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "session_attendees")]
pub struct Model {
    /// Unique identifier for the enrollment (primary key)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Owning session
    pub session_id: Uuid,

    /// Canonical identifier of the enrolled student
    pub student_id: Uuid,

    /// When the booking/enrollment happened, UTC
    pub booking_time: DateTimeWithTimeZone,

    /// Timestamp when the record was created
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "ScheduledSession",
        from = "Column::SessionId",
        to = "super::scheduled_session::Column::Id"
    )]
    ScheduledSession,
}

impl Related<ScheduledSession> for Entity {
    fn to() -> RelationDef {
        Relation::ScheduledSession.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
