//! Test utilities for database and service testing.
//!
//! Provides an in-memory SQLite database with migrations applied, a
//! scripted meeting-provider double, and helpers to assemble the booking
//! service and the HTTP app the way production wiring does.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use anyhow::Result;
use async_trait::async_trait;
use axum::Router;
use migration::{Migrator, MigratorTrait};
use sea_orm::{Database, DatabaseConnection};

use scheduling::config::AppConfig;
use scheduling::meetings::{
    MeetingProvider, MeetingProviderError, MeetingRecord, MeetingRequest,
};
use scheduling::scheduling::BookingService;
use scheduling::server::{self, AppState};

/// Sets up an in-memory SQLite database with all migrations applied.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = Database::connect("sqlite::memory:").await?;
    Migrator::up(&db, None).await?;
    Ok(db)
}

/// Meeting-provider double: hands out deterministic records and can be
/// flipped into failure mode to exercise compensation paths.
pub struct StubMeetings {
    calls: AtomicUsize,
    fail: AtomicBool,
}

impl StubMeetings {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            fail: AtomicBool::new(false),
        })
    }

    #[allow(dead_code)]
    pub fn failing() -> Arc<Self> {
        let stub = Self::new();
        stub.fail.store(true, Ordering::SeqCst);
        stub
    }

    #[allow(dead_code)]
    pub fn set_failing(&self, failing: bool) {
        self.fail.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl MeetingProvider for StubMeetings {
    async fn provision(
        &self,
        request: MeetingRequest,
    ) -> Result<MeetingRecord, MeetingProviderError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;

        if self.fail.load(Ordering::SeqCst) {
            return Err(MeetingProviderError::Vendor {
                status: 503,
                body: Some("vendor unavailable".to_string()),
            });
        }

        Ok(MeetingRecord {
            external_id: format!("meeting-{call}"),
            join_url: format!("https://meetings.example/j/{call}"),
            host_url: format!("https://meetings.example/s/{call}?zak=host"),
            access_code: Some(format!("code-{call}")),
        })
    }
}

/// Builds a booking service over the given database and meeting double.
#[allow(dead_code)]
pub fn build_service(db: &DatabaseConnection, meetings: Arc<dyn MeetingProvider>) -> BookingService {
    BookingService::new(Arc::new(db.clone()), meetings, &AppConfig::default())
}

/// Builds the full HTTP app over the given database and meeting double.
#[allow(dead_code)]
pub fn build_app(db: DatabaseConnection, meetings: Arc<dyn MeetingProvider>) -> (AppState, Router) {
    let state = server::build_state(AppConfig::default(), db, meetings);
    let app = server::create_app(state.clone());
    (state, app)
}

/// A slot submission one hour wide, `days_ahead` days in the future.
#[allow(dead_code)]
pub fn future_slot(days_ahead: i64) -> scheduling::scheduling::SlotSubmission {
    let start = chrono::Utc::now() + chrono::Duration::days(days_ahead);
    let end = start + chrono::Duration::hours(1);
    scheduling::scheduling::SlotSubmission {
        start_time: start.to_rfc3339(),
        end_time: end.to_rfc3339(),
        is_paid: false,
        price: None,
        description: Some("Conversational French".to_string()),
    }
}

/// A group session submission one hour wide, `days_ahead` days out.
#[allow(dead_code)]
pub fn future_group_session(
    days_ahead: i64,
    max_attendees: Option<i32>,
    is_paid: bool,
) -> scheduling::scheduling::GroupSessionSubmission {
    let start = chrono::Utc::now() + chrono::Duration::days(days_ahead);
    let end = start + chrono::Duration::hours(1);
    scheduling::scheduling::GroupSessionSubmission {
        title: "Algebra Workshop".to_string(),
        description: Some("Quadratic equations".to_string()),
        start_time: start.to_rfc3339(),
        end_time: end.to_rfc3339(),
        is_paid,
        price: if is_paid {
            Some(rust_decimal::Decimal::new(2500, 2))
        } else {
            None
        },
        max_attendees,
    }
}
