//! Scheduled session entity model
//!
//! Central table for all created sessions, one-on-one and group. One-on-one
//! rows are derived from a booked availability slot; group rows are created
//! directly by a provider. Meeting fields come from the vendor response.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Session kind discriminator
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum SessionType {
    #[sea_orm(string_value = "ONE_ON_ONE")]
    #[serde(rename = "ONE_ON_ONE")]
    OneOnOne,
    #[sea_orm(string_value = "GROUP")]
    #[serde(rename = "GROUP")]
    Group,
}

/// Session lifecycle status
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum SessionStatus {
    #[sea_orm(string_value = "SCHEDULED")]
    #[serde(rename = "SCHEDULED")]
    Scheduled,
    #[sea_orm(string_value = "COMPLETED")]
    #[serde(rename = "COMPLETED")]
    Completed,
    #[sea_orm(string_value = "CANCELED")]
    #[serde(rename = "CANCELED")]
    Canceled,
}

/// Scheduled session entity
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "scheduled_sessions")]
pub struct Model {
    /// Unique identifier for the session (primary key)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Canonical identifier of the hosting provider
    pub provider_id: Uuid,

    /// ONE_ON_ONE or GROUP
    pub session_type: SessionType,

    /// Display title (optional)
    pub title: Option<String>,

    /// Longer description (optional)
    pub description: Option<String>,

    /// Session start, UTC
    pub start_time: DateTimeWithTimeZone,

    /// Session end, UTC
    pub end_time: DateTimeWithTimeZone,

    /// SCHEDULED | COMPLETED | CANCELED
    pub status: SessionStatus,

    /// Whether attending requires payment
    pub is_paid: bool,

    /// Price for the session (required when is_paid)
    #[sea_orm(column_type = "Decimal(Some((10, 2)))", nullable)]
    pub price: Option<Decimal>,

    /// Seat cap; 1 for one-on-one, required for group
    pub max_attendees: Option<i32>,

    /// Vendor meeting identifier
    pub meeting_id: Option<String>,

    /// URL participants use to join
    pub join_url: Option<String>,

    /// URL the host uses to start the meeting (never shown to students)
    pub host_url: Option<String>,

    /// Meeting password
    pub access_code: Option<String>,

    /// Timestamp when the session was created
    pub created_at: DateTimeWithTimeZone,

    /// Timestamp when the session was last updated
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::session_attendee::Entity")]
    SessionAttendee,
}

impl Related<super::session_attendee::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SessionAttendee.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
