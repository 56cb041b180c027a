//! Enrollment repository for database operations
//!
//! Owns the session_attendees table. The enroll operation re-checks
//! capacity and uniqueness inside one transaction so two students racing
//! for the last seat cannot both succeed; the unique index on
//! (session_id, student_id) backs the application-level duplicate check.

use anyhow::Result;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseBackend, DatabaseConnection,
    DatabaseTransaction, EntityTrait, IsolationLevel, PaginatorTrait, QueryFilter, Set,
    TransactionTrait,
    prelude::DateTimeWithTimeZone,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::error::is_unique_violation;
use crate::models::session_attendee::{self, Entity as SessionAttendee};

/// Result of an enrollment attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnrollOutcome {
    /// Inserted; carries the new record and the updated attendee count
    Enrolled {
        record: session_attendee::Model,
        attendee_count: u64,
    },
    /// (session_id, student_id) already present
    AlreadyEnrolled,
    /// Capacity reached before this caller could insert
    SessionFull,
}

/// Repository for attendee/enrollment database operations
#[derive(Debug, Clone)]
pub struct EnrollmentRepository {
    /// Database connection pool
    pub db: Arc<DatabaseConnection>,
}

impl EnrollmentRepository {
    /// Creates a new EnrollmentRepository instance
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Counts attendees for a session
    pub async fn count_attendees(&self, session_id: Uuid) -> Result<u64> {
        Ok(SessionAttendee::find()
            .filter(session_attendee::Column::SessionId.eq(session_id))
            .count(&*self.db)
            .await?)
    }

    /// Whether the student already holds a seat in the session
    pub async fn is_enrolled(&self, session_id: Uuid, student_id: Uuid) -> Result<bool> {
        Ok(SessionAttendee::find()
            .filter(session_attendee::Column::SessionId.eq(session_id))
            .filter(session_attendee::Column::StudentId.eq(student_id))
            .one(&*self.db)
            .await?
            .is_some())
    }

    /// Lists attendee records for a session
    pub async fn list_attendees(&self, session_id: Uuid) -> Result<Vec<session_attendee::Model>> {
        Ok(SessionAttendee::find()
            .filter(session_attendee::Column::SessionId.eq(session_id))
            .all(&*self.db)
            .await?)
    }

    /// Lists enrollments held by a student
    pub async fn list_by_student(&self, student_id: Uuid) -> Result<Vec<session_attendee::Model>> {
        Ok(SessionAttendee::find()
            .filter(session_attendee::Column::StudentId.eq(student_id))
            .all(&*self.db)
            .await?)
    }

    /// Enrolls a student, enforcing capacity and uniqueness atomically.
    ///
    /// `max_attendees = None` means unbounded. The count, duplicate check,
    /// and insert share one transaction (serializable on Postgres; SQLite
    /// writers are serialized by the engine); a unique-index violation from
    /// a concurrent duplicate submit is mapped to `AlreadyEnrolled`.
    pub async fn enroll(
        &self,
        session_id: Uuid,
        student_id: Uuid,
        max_attendees: Option<i32>,
    ) -> Result<EnrollOutcome> {
        let txn = self.begin_guarded().await?;

        let current = SessionAttendee::find()
            .filter(session_attendee::Column::SessionId.eq(session_id))
            .count(&txn)
            .await?;

        if let Some(max) = max_attendees {
            if current >= max.max(0) as u64 {
                txn.rollback().await?;
                return Ok(EnrollOutcome::SessionFull);
            }
        }

        let duplicate = SessionAttendee::find()
            .filter(session_attendee::Column::SessionId.eq(session_id))
            .filter(session_attendee::Column::StudentId.eq(student_id))
            .one(&txn)
            .await?
            .is_some();
        if duplicate {
            txn.rollback().await?;
            return Ok(EnrollOutcome::AlreadyEnrolled);
        }

        let now: DateTimeWithTimeZone = Utc::now().into();
        let active = session_attendee::ActiveModel {
            id: Set(Uuid::new_v4()),
            session_id: Set(session_id),
            student_id: Set(student_id),
            booking_time: Set(now),
            created_at: Set(now),
        };

        let record = match active.insert(&txn).await {
            Ok(record) => record,
            Err(err) if is_unique_violation(&err) => {
                txn.rollback().await?;
                return Ok(EnrollOutcome::AlreadyEnrolled);
            }
            Err(err) => {
                txn.rollback().await?;
                return Err(err.into());
            }
        };

        let attendee_count = SessionAttendee::find()
            .filter(session_attendee::Column::SessionId.eq(session_id))
            .count(&txn)
            .await?;

        txn.commit().await?;
        Ok(EnrollOutcome::Enrolled {
            record,
            attendee_count,
        })
    }

    async fn begin_guarded(&self) -> Result<DatabaseTransaction> {
        let txn = match self.db.get_database_backend() {
            DatabaseBackend::Postgres => {
                self.db
                    .begin_with_config(Some(IsolationLevel::Serializable), None)
                    .await?
            }
            _ => self.db.begin().await?,
        };
        Ok(txn)
    }
}
