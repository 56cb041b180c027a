//! Availability repository for database operations
//!
//! Owns the availability_slots table: wholesale replacement per provider,
//! open-slot listing, and the one-way booked transition implemented as a
//! conditional update so concurrent bookers cannot both win.

use anyhow::{Result, anyhow};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
    prelude::DateTimeWithTimeZone,
    sea_query::Expr,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::models::availability_slot::{self, Entity as AvailabilitySlot};

/// Validated input for one new slot; timestamps are already UTC.
#[derive(Debug, Clone)]
pub struct NewSlot {
    pub start_time: DateTimeWithTimeZone,
    pub end_time: DateTimeWithTimeZone,
    pub is_paid: bool,
    pub price_per_session: Option<Decimal>,
    pub description: Option<String>,
}

/// Result of the conditional booked transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkBookedOutcome {
    /// This caller won the transition
    Booked,
    /// The slot exists but was already booked
    AlreadyBooked,
    /// No slot with that id
    NotFound,
}

/// Repository for availability slot database operations
#[derive(Debug, Clone)]
pub struct AvailabilityRepository {
    /// Database connection pool
    pub db: Arc<DatabaseConnection>,
}

impl AvailabilityRepository {
    /// Creates a new AvailabilityRepository instance
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Replaces all slots for a provider with the given set, atomically.
    ///
    /// Inputs must already be validated; the delete and all inserts run in
    /// one transaction so a mid-batch failure leaves prior slots untouched.
    pub async fn replace_slots(&self, provider_id: Uuid, slots: Vec<NewSlot>) -> Result<usize> {
        let txn = self.db.begin().await?;

        AvailabilitySlot::delete_many()
            .filter(availability_slot::Column::ProviderId.eq(provider_id))
            .exec(&txn)
            .await?;

        let count = slots.len();
        let now: DateTimeWithTimeZone = Utc::now().into();
        for slot in slots {
            let active = availability_slot::ActiveModel {
                id: Set(Uuid::new_v4()),
                provider_id: Set(provider_id),
                start_time: Set(slot.start_time),
                end_time: Set(slot.end_time),
                booked: Set(false),
                is_paid: Set(slot.is_paid),
                price_per_session: Set(slot.price_per_session),
                description: Set(slot.description),
                created_at: Set(now),
                updated_at: Set(now),
            };
            active.insert(&txn).await?;
        }

        txn.commit().await?;
        Ok(count)
    }

    /// Lists non-booked slots for a provider ordered by start time ascending
    pub async fn list_open(&self, provider_id: Uuid) -> Result<Vec<availability_slot::Model>> {
        Ok(AvailabilitySlot::find()
            .filter(availability_slot::Column::ProviderId.eq(provider_id))
            .filter(availability_slot::Column::Booked.eq(false))
            .order_by_asc(availability_slot::Column::StartTime)
            .all(&*self.db)
            .await?)
    }

    /// Retrieves a slot by its ID
    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<availability_slot::Model>> {
        Ok(AvailabilitySlot::find_by_id(id).one(&*self.db).await?)
    }

    /// Flips a slot to booked with compare-and-set semantics.
    ///
    /// The update carries `booked = false` in its predicate; zero affected
    /// rows means a concurrent caller won or the slot never existed, and a
    /// follow-up read disambiguates the two.
    pub async fn mark_booked(&self, id: Uuid) -> Result<MarkBookedOutcome> {
        let result = AvailabilitySlot::update_many()
            .col_expr(availability_slot::Column::Booked, Expr::value(true))
            .col_expr(
                availability_slot::Column::UpdatedAt,
                Expr::value(DateTimeWithTimeZone::from(Utc::now())),
            )
            .filter(availability_slot::Column::Id.eq(id))
            .filter(availability_slot::Column::Booked.eq(false))
            .exec(&*self.db)
            .await?;

        if result.rows_affected > 0 {
            return Ok(MarkBookedOutcome::Booked);
        }

        match self.get_by_id(id).await? {
            Some(_) => Ok(MarkBookedOutcome::AlreadyBooked),
            None => Ok(MarkBookedOutcome::NotFound),
        }
    }

    /// Compensating release: reopens a slot after a failed booking workflow.
    pub async fn release(&self, id: Uuid) -> Result<()> {
        let result = AvailabilitySlot::update_many()
            .col_expr(availability_slot::Column::Booked, Expr::value(false))
            .col_expr(
                availability_slot::Column::UpdatedAt,
                Expr::value(DateTimeWithTimeZone::from(Utc::now())),
            )
            .filter(availability_slot::Column::Id.eq(id))
            .filter(availability_slot::Column::Booked.eq(true))
            .exec(&*self.db)
            .await?;

        if result.rows_affected == 0 {
            return Err(anyhow!("slot '{}' was not in booked state", id));
        }

        Ok(())
    }
}
