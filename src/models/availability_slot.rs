//! Availability slot entity model
//!
//! One row per open time window published by a provider. Slots are created
//! in bulk by the replace-all operation and mutate exactly once, when the
//! booking transition flips `booked` to true.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;
use rust_decimal::Decimal;
use uuid::Uuid;

/// Availability slot entity representing a bookable provider time window
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "availability_slots")]
pub struct Model {
    /// Unique identifier for the slot (primary key)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Canonical identifier of the provider owning this slot
    pub provider_id: Uuid,

    /// Window start, UTC
    pub start_time: DateTimeWithTimeZone,

    /// Window end, UTC
    pub end_time: DateTimeWithTimeZone,

    /// One-way booking flag; flips false -> true exactly once
    pub booked: bool,

    /// Whether booking this slot requires payment
    pub is_paid: bool,

    /// Price per session (required when is_paid)
    #[sea_orm(column_type = "Decimal(Some((10, 2)))", nullable)]
    pub price_per_session: Option<Decimal>,

    /// Free-form description shown to students
    pub description: Option<String>,

    /// Timestamp when the slot was created
    pub created_at: DateTimeWithTimeZone,

    /// Timestamp when the slot was last updated
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
