//! Session repository for database operations
//!
//! Owns the scheduled_sessions table: creation of group and one-on-one
//! sessions (always with their vendor meeting fields), discovery of open
//! group sessions, and the provider/student listing queries.

use anyhow::{Result, anyhow};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    prelude::DateTimeWithTimeZone,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::meetings::MeetingRecord;
use crate::models::availability_slot;
use crate::models::scheduled_session::{
    self, Entity as ScheduledSession, SessionStatus, SessionType,
};

/// Validated input for a new group session; timestamps are already UTC.
#[derive(Debug, Clone)]
pub struct NewGroupSession {
    pub provider_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub start_time: DateTimeWithTimeZone,
    pub end_time: DateTimeWithTimeZone,
    pub is_paid: bool,
    pub price: Option<rust_decimal::Decimal>,
    pub max_attendees: i32,
}

/// Repository for scheduled session database operations
#[derive(Debug, Clone)]
pub struct SessionRepository {
    /// Database connection pool
    pub db: Arc<DatabaseConnection>,
}

impl SessionRepository {
    /// Creates a new SessionRepository instance
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Persists a group session with status SCHEDULED and zero attendees
    pub async fn create_group(
        &self,
        input: NewGroupSession,
        meeting: &MeetingRecord,
    ) -> Result<scheduled_session::Model> {
        let id = Uuid::new_v4();
        let now: DateTimeWithTimeZone = Utc::now().into();

        let active = scheduled_session::ActiveModel {
            id: Set(id),
            provider_id: Set(input.provider_id),
            session_type: Set(SessionType::Group),
            title: Set(Some(input.title)),
            description: Set(input.description),
            start_time: Set(input.start_time),
            end_time: Set(input.end_time),
            status: Set(SessionStatus::Scheduled),
            is_paid: Set(input.is_paid),
            price: Set(input.price),
            max_attendees: Set(Some(input.max_attendees)),
            meeting_id: Set(Some(meeting.external_id.clone())),
            join_url: Set(Some(meeting.join_url.clone())),
            host_url: Set(Some(meeting.host_url.clone())),
            access_code: Set(meeting.access_code.clone()),
            created_at: Set(now),
            updated_at: Set(now),
        };

        active.insert(&*self.db).await?;

        // Query the record back directly since we already know the ID
        let fetched = ScheduledSession::find_by_id(id).one(&*self.db).await?;
        fetched.ok_or_else(|| anyhow!("session not persisted"))
    }

    /// Derives a one-on-one session from a booked slot, copying its time
    /// window, price and pay flag; max_attendees is pinned to 1.
    pub async fn create_one_on_one(
        &self,
        slot: &availability_slot::Model,
        meeting: &MeetingRecord,
    ) -> Result<scheduled_session::Model> {
        let id = Uuid::new_v4();
        let now: DateTimeWithTimeZone = Utc::now().into();
        let title = slot
            .description
            .clone()
            .unwrap_or_else(|| "One-on-One Session".to_string());

        let active = scheduled_session::ActiveModel {
            id: Set(id),
            provider_id: Set(slot.provider_id),
            session_type: Set(SessionType::OneOnOne),
            title: Set(Some(title)),
            description: Set(slot.description.clone()),
            start_time: Set(slot.start_time),
            end_time: Set(slot.end_time),
            status: Set(SessionStatus::Scheduled),
            is_paid: Set(slot.is_paid),
            price: Set(slot.price_per_session),
            max_attendees: Set(Some(1)),
            meeting_id: Set(Some(meeting.external_id.clone())),
            join_url: Set(Some(meeting.join_url.clone())),
            host_url: Set(Some(meeting.host_url.clone())),
            access_code: Set(meeting.access_code.clone()),
            created_at: Set(now),
            updated_at: Set(now),
        };

        active.insert(&*self.db).await?;

        let fetched = ScheduledSession::find_by_id(id).one(&*self.db).await?;
        fetched.ok_or_else(|| anyhow!("session not persisted"))
    }

    /// Retrieves a session by its ID
    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<scheduled_session::Model>> {
        Ok(ScheduledSession::find_by_id(id).one(&*self.db).await?)
    }

    /// Lists SCHEDULED group sessions ordered by start time ascending.
    ///
    /// Fullness is decided by the caller against live attendee counts; full
    /// sessions stay in storage, they are only dropped from discovery.
    pub async fn list_scheduled_group(&self) -> Result<Vec<scheduled_session::Model>> {
        Ok(ScheduledSession::find()
            .filter(scheduled_session::Column::SessionType.eq(SessionType::Group))
            .filter(scheduled_session::Column::Status.eq(SessionStatus::Scheduled))
            .order_by_asc(scheduled_session::Column::StartTime)
            .all(&*self.db)
            .await?)
    }

    /// Lists a provider's sessions, most recent start first
    pub async fn list_by_provider(
        &self,
        provider_id: Uuid,
    ) -> Result<Vec<scheduled_session::Model>> {
        Ok(ScheduledSession::find()
            .filter(scheduled_session::Column::ProviderId.eq(provider_id))
            .order_by_desc(scheduled_session::Column::StartTime)
            .all(&*self.db)
            .await?)
    }

    /// Lists sessions the given students' enrollments point at, most recent
    /// start first
    pub async fn list_by_ids(&self, ids: Vec<Uuid>) -> Result<Vec<scheduled_session::Model>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        Ok(ScheduledSession::find()
            .filter(scheduled_session::Column::Id.is_in(ids))
            .order_by_desc(scheduled_session::Column::StartTime)
            .all(&*self.db)
            .await?)
    }
}
