//! Booking orchestrator
//!
//! Coordinates the availability store, meeting provisioner, session store
//! and enrollment ledger to implement the two booking workflows: one-on-one
//! slot booking and group-session enrollment. Every operation normalizes
//! caller identifiers, validates input up front, and only then touches
//! storage or the vendor.
//!
//! The one-on-one flow marks the slot booked before provisioning the
//! meeting; if any later step fails, a compensating release reopens the
//! slot so a vendor outage cannot strand availability.

use chrono::FixedOffset;
use metrics::counter;
use rand::Rng;
use rand::distributions::Alphanumeric;
use rust_decimal::Decimal;
use sea_orm::DatabaseConnection;
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::error::{ApiError, conflict, not_found, validation_error};
use crate::identity::canonical_id;
use crate::meetings::{MeetingProvider, MeetingRequest};
use crate::models::scheduled_session::{self, SessionStatus, SessionType};
use crate::models::availability_slot;
use crate::repositories::{
    AvailabilityRepository, EnrollOutcome, EnrollmentRepository, MarkBookedOutcome, NewGroupSession,
    NewSlot, SessionRepository,
};
use crate::timeparse::{duration_minutes, parse_timestamp, validate_lead_time, validate_window};

const GROUP_SESSION_DEFAULT_CAPACITY: i32 = 10;

/// One slot as submitted by a provider; timestamps are raw strings until
/// validation converts them to UTC.
#[derive(Debug, Clone)]
pub struct SlotSubmission {
    pub start_time: String,
    pub end_time: String,
    pub is_paid: bool,
    pub price: Option<Decimal>,
    pub description: Option<String>,
}

/// A group session as submitted by a provider.
#[derive(Debug, Clone)]
pub struct GroupSessionSubmission {
    pub title: String,
    pub description: Option<String>,
    pub start_time: String,
    pub end_time: String,
    pub is_paid: bool,
    pub price: Option<Decimal>,
    pub max_attendees: Option<i32>,
}

/// Caller-facing view of an availability slot.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SlotView {
    pub id: Uuid,
    pub provider_id: Uuid,
    pub start_time: chrono::DateTime<chrono::FixedOffset>,
    pub end_time: chrono::DateTime<chrono::FixedOffset>,
    pub booked: bool,
    pub is_paid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_per_session: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl From<availability_slot::Model> for SlotView {
    fn from(model: availability_slot::Model) -> Self {
        Self {
            id: model.id,
            provider_id: model.provider_id,
            start_time: model.start_time,
            end_time: model.end_time,
            booked: model.booked,
            is_paid: model.is_paid,
            price_per_session: model.price_per_session,
            description: model.description,
        }
    }
}

/// Caller-facing view of a session. Host-only meeting fields are present
/// only in provider views; the student constructor drops them so they can
/// never leak through serialization.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SessionView {
    pub session_id: Uuid,
    pub provider_id: Uuid,
    pub session_type: SessionType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub start_time: chrono::DateTime<chrono::FixedOffset>,
    pub end_time: chrono::DateTime<chrono::FixedOffset>,
    pub status: SessionStatus,
    pub is_paid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_attendees: Option<i32>,
    pub attendees_count: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meeting_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub join_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_code: Option<String>,
}

impl SessionView {
    /// Provider view: includes the host start URL and access code.
    pub fn for_provider(model: &scheduled_session::Model, attendees_count: u64) -> Self {
        Self::build(model, attendees_count, true)
    }

    /// Student view: join URL only, host credentials redacted.
    pub fn for_student(model: &scheduled_session::Model, attendees_count: u64) -> Self {
        Self::build(model, attendees_count, false)
    }

    fn build(model: &scheduled_session::Model, attendees_count: u64, host_fields: bool) -> Self {
        Self {
            session_id: model.id,
            provider_id: model.provider_id,
            session_type: model.session_type,
            title: model.title.clone(),
            description: model.description.clone(),
            start_time: model.start_time,
            end_time: model.end_time,
            status: model.status,
            is_paid: model.is_paid,
            price: model.price,
            max_attendees: model.max_attendees,
            attendees_count,
            meeting_id: model.meeting_id.clone(),
            join_url: model.join_url.clone(),
            host_url: if host_fields {
                model.host_url.clone()
            } else {
                None
            },
            access_code: if host_fields {
                model.access_code.clone()
            } else {
                None
            },
        }
    }
}

/// Outcome of a group enrollment attempt.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(untagged)]
pub enum EnrollmentResult {
    /// Seat taken; updated view with the new attendee count
    Enrolled(SessionView),
    /// Paid session: enrollment deferred until payment confirms
    PaymentRequired { checkout_session_id: String },
}

/// Coordinates stores and the meeting vendor for the booking workflows.
pub struct BookingService {
    availability: AvailabilityRepository,
    sessions: SessionRepository,
    enrollments: EnrollmentRepository,
    meetings: Arc<dyn MeetingProvider>,
    default_offset: FixedOffset,
    lead_minutes: i64,
}

impl BookingService {
    /// Wires the service from explicit collaborators.
    pub fn new(
        db: Arc<DatabaseConnection>,
        meetings: Arc<dyn MeetingProvider>,
        config: &AppConfig,
    ) -> Self {
        Self {
            availability: AvailabilityRepository::new(db.clone()),
            sessions: SessionRepository::new(db.clone()),
            enrollments: EnrollmentRepository::new(db),
            meetings,
            default_offset: config.default_offset(),
            lead_minutes: config.booking_lead_minutes,
        }
    }

    /// Replaces a provider's availability wholesale.
    ///
    /// Every slot is validated before anything is written; one bad slot
    /// rejects the entire batch and leaves prior availability untouched.
    pub async fn replace_availability(
        &self,
        provider_id: &str,
        slots: Vec<SlotSubmission>,
    ) -> Result<usize, ApiError> {
        let provider = canonical_id(provider_id);

        let now = chrono::Utc::now();
        let mut validated = Vec::with_capacity(slots.len());
        for (index, slot) in slots.into_iter().enumerate() {
            let start = parse_timestamp("startTime", &slot.start_time, self.default_offset)
                .map_err(|e| slot_error(index, e.to_string()))?;
            let end = parse_timestamp("endTime", &slot.end_time, self.default_offset)
                .map_err(|e| slot_error(index, e.to_string()))?;
            validate_window(start, end).map_err(|e| slot_error(index, e.to_string()))?;
            validate_lead_time(start, self.lead_minutes, now)
                .map_err(|e| slot_error(index, e.to_string()))?;
            validate_price(slot.is_paid, slot.price.as_ref())
                .map_err(|e| slot_error(index, e))?;

            validated.push(NewSlot {
                start_time: start.into(),
                end_time: end.into(),
                is_paid: slot.is_paid,
                price_per_session: slot.price,
                description: slot.description,
            });
        }

        let count = self.availability.replace_slots(provider, validated).await?;
        info!(provider_id = %provider, slots = count, "Availability replaced");
        Ok(count)
    }

    /// Lists a provider's open (non-booked) slots, earliest first.
    pub async fn list_open_slots(&self, provider_id: &str) -> Result<Vec<SlotView>, ApiError> {
        let provider = canonical_id(provider_id);
        let slots = self.availability.list_open(provider).await?;
        Ok(slots.into_iter().map(SlotView::from).collect())
    }

    /// Books a one-on-one slot for a student.
    ///
    /// Sequence: conditional booked transition, meeting provisioning,
    /// session + attendee persistence. The transition is the only gate —
    /// losing it yields Conflict with no side effects. Failures after it
    /// trigger a compensating release before the error is surfaced.
    pub async fn book_slot(
        &self,
        student_id: &str,
        slot_id: Uuid,
    ) -> Result<SessionView, ApiError> {
        let student = canonical_id(student_id);

        let slot = self
            .availability
            .get_by_id(slot_id)
            .await?
            .ok_or_else(|| not_found("Availability slot not found"))?;

        // Fast check; the transition below re-verifies atomically
        if slot.booked {
            counter!("booking_conflicts_total").increment(1);
            return Err(conflict("This time slot is already booked"));
        }

        match self.availability.mark_booked(slot_id).await? {
            MarkBookedOutcome::Booked => {}
            MarkBookedOutcome::AlreadyBooked => {
                counter!("booking_conflicts_total").increment(1);
                return Err(conflict("This time slot is already booked"));
            }
            MarkBookedOutcome::NotFound => {
                return Err(not_found("Availability slot not found"));
            }
        }

        let request = MeetingRequest {
            topic: slot
                .description
                .clone()
                .unwrap_or_else(|| "One-on-One Session".to_string()),
            category: "Individual Tutoring".to_string(),
            start_time: slot.start_time.with_timezone(&chrono::Utc),
            duration_minutes: duration_minutes(
                slot.start_time.with_timezone(&chrono::Utc),
                slot.end_time.with_timezone(&chrono::Utc),
            ),
        };

        let meeting = match self.meetings.provision(request).await {
            Ok(meeting) => meeting,
            Err(err) => {
                counter!("meeting_provision_failures_total").increment(1);
                self.release_slot_after_failure(slot_id, &err.to_string())
                    .await;
                return Err(err.into());
            }
        };

        let session = match self.sessions.create_one_on_one(&slot, &meeting).await {
            Ok(session) => session,
            Err(err) => {
                self.release_slot_after_failure(slot_id, &err.to_string())
                    .await;
                return Err(err.into());
            }
        };

        // Fresh session with capacity 1; this insert cannot lose a race
        if let Err(err) = self
            .enrollments
            .enroll(session.id, student, Some(1))
            .await
        {
            self.release_slot_after_failure(slot_id, &err.to_string())
                .await;
            return Err(err.into());
        }

        counter!("one_on_one_bookings_total").increment(1);
        info!(
            slot_id = %slot_id,
            session_id = %session.id,
            student_id = %student,
            "One-on-one session booked"
        );

        Ok(SessionView::for_student(&session, 1))
    }

    /// Creates a group session with its vendor meeting.
    ///
    /// Provisioning happens before any write, so a vendor failure aborts
    /// cleanly with no state to unwind.
    pub async fn create_group_session(
        &self,
        provider_id: &str,
        submission: GroupSessionSubmission,
    ) -> Result<SessionView, ApiError> {
        let provider = canonical_id(provider_id);

        let title = submission.title.trim().to_string();
        if title.is_empty() {
            return Err(validation_error(
                "Title is required",
                json!({ "field": "title" }),
            ));
        }
        if title.len() > 255 {
            return Err(validation_error(
                "Title exceeds maximum length of 255 characters",
                json!({ "field": "title", "max_length": 255 }),
            ));
        }

        let start = parse_timestamp("startTime", &submission.start_time, self.default_offset)?;
        let end = parse_timestamp("endTime", &submission.end_time, self.default_offset)?;
        validate_window(start, end)?;
        validate_price(submission.is_paid, submission.price.as_ref())
            .map_err(|message| validation_error(&message, json!({ "field": "price" })))?;

        let max_attendees = submission
            .max_attendees
            .unwrap_or(GROUP_SESSION_DEFAULT_CAPACITY);
        if max_attendees < 1 {
            return Err(validation_error(
                "maxAttendees must be at least 1",
                json!({ "field": "maxAttendees" }),
            ));
        }

        let meeting = self
            .meetings
            .provision(MeetingRequest {
                topic: title.clone(),
                category: "Group Session".to_string(),
                start_time: start,
                duration_minutes: duration_minutes(start, end),
            })
            .await
            .map_err(|err| {
                counter!("meeting_provision_failures_total").increment(1);
                ApiError::from(err)
            })?;

        let session = self
            .sessions
            .create_group(
                NewGroupSession {
                    provider_id: provider,
                    title,
                    description: submission.description,
                    start_time: start.into(),
                    end_time: end.into(),
                    is_paid: submission.is_paid,
                    price: submission.price,
                    max_attendees,
                },
                &meeting,
            )
            .await?;

        counter!("group_sessions_created_total").increment(1);
        info!(session_id = %session.id, provider_id = %provider, "Group session created");

        Ok(SessionView::for_provider(&session, 0))
    }

    /// Lists open (SCHEDULED, not full) group sessions for discovery,
    /// earliest first, as student views.
    pub async fn list_open_group_sessions(&self) -> Result<Vec<SessionView>, ApiError> {
        let sessions = self.sessions.list_scheduled_group().await?;

        let mut views = Vec::with_capacity(sessions.len());
        for session in &sessions {
            let count = self.enrollments.count_attendees(session.id).await?;
            let open = match session.max_attendees {
                Some(max) => count < max.max(0) as u64,
                None => true,
            };
            if open {
                views.push(SessionView::for_student(session, count));
            }
        }
        Ok(views)
    }

    /// Enrolls a student in a group session, or hands back a payment intent
    /// for paid sessions without touching the ledger.
    pub async fn enroll(
        &self,
        student_id: &str,
        session_id: Uuid,
    ) -> Result<EnrollmentResult, ApiError> {
        let student = canonical_id(student_id);

        let session = self
            .sessions
            .get_by_id(session_id)
            .await?
            .ok_or_else(|| not_found("Session not found"))?;

        if session.session_type != SessionType::Group {
            return Err(validation_error(
                "This operation is only for group sessions",
                json!({ "field": "sessionId", "session_type": session.session_type }),
            ));
        }

        // Fast checks for friendly errors; the ledger re-checks both
        // atomically with the insert
        let current = self.enrollments.count_attendees(session_id).await?;
        if let Some(max) = session.max_attendees {
            if current >= max.max(0) as u64 {
                counter!("enrollment_conflicts_total").increment(1);
                return Err(conflict("Session is full"));
            }
        }
        if self.enrollments.is_enrolled(session_id, student).await? {
            counter!("enrollment_conflicts_total").increment(1);
            return Err(conflict("Student is already enrolled in this session"));
        }

        if session.is_paid {
            // Enrollment is deferred until payment confirms; no attendee
            // record yet
            let token = checkout_session_token();
            info!(session_id = %session_id, "Paid enrollment deferred to checkout");
            return Ok(EnrollmentResult::PaymentRequired {
                checkout_session_id: token,
            });
        }

        match self
            .enrollments
            .enroll(session_id, student, session.max_attendees)
            .await?
        {
            EnrollOutcome::Enrolled { attendee_count, .. } => {
                counter!("group_enrollments_total").increment(1);
                info!(
                    session_id = %session_id,
                    student_id = %student,
                    attendee_count,
                    "Student enrolled in group session"
                );
                Ok(EnrollmentResult::Enrolled(SessionView::for_student(
                    &session,
                    attendee_count,
                )))
            }
            EnrollOutcome::SessionFull => {
                counter!("enrollment_conflicts_total").increment(1);
                Err(conflict("Session is full"))
            }
            EnrollOutcome::AlreadyEnrolled => {
                counter!("enrollment_conflicts_total").increment(1);
                Err(conflict("Student is already enrolled in this session"))
            }
        }
    }

    /// Lists a provider's own sessions with full meeting fields.
    pub async fn provider_sessions(&self, provider_id: &str) -> Result<Vec<SessionView>, ApiError> {
        let provider = canonical_id(provider_id);
        let sessions = self.sessions.list_by_provider(provider).await?;

        let mut views = Vec::with_capacity(sessions.len());
        for session in &sessions {
            let count = self.enrollments.count_attendees(session.id).await?;
            views.push(SessionView::for_provider(session, count));
        }
        Ok(views)
    }

    /// Lists the sessions a student is enrolled in, host fields redacted.
    pub async fn student_sessions(&self, student_id: &str) -> Result<Vec<SessionView>, ApiError> {
        let student = canonical_id(student_id);
        let enrollments = self.enrollments.list_by_student(student).await?;
        let ids = enrollments.iter().map(|e| e.session_id).collect();
        let sessions = self.sessions.list_by_ids(ids).await?;

        let mut views = Vec::with_capacity(sessions.len());
        for session in &sessions {
            let count = self.enrollments.count_attendees(session.id).await?;
            views.push(SessionView::for_student(session, count));
        }
        Ok(views)
    }

    /// Best-effort compensating release after a failed booking step. A
    /// failed release leaves the slot stranded booked; both errors land in
    /// the log for operator follow-up.
    async fn release_slot_after_failure(&self, slot_id: Uuid, cause: &str) {
        if let Err(release_err) = self.availability.release(slot_id).await {
            error!(
                slot_id = %slot_id,
                cause,
                release_error = %release_err,
                "Failed to release slot after booking failure; slot remains booked"
            );
        } else {
            warn!(slot_id = %slot_id, cause, "Booking failed, slot released");
        }
    }
}

fn validate_price(is_paid: bool, price: Option<&Decimal>) -> Result<(), String> {
    if let Some(price) = price {
        if price.is_sign_negative() {
            return Err("price must be non-negative".to_string());
        }
    }
    if is_paid && price.is_none() {
        return Err("price is required for paid offerings".to_string());
    }
    Ok(())
}

fn slot_error(index: usize, message: String) -> ApiError {
    validation_error(
        &format!("Invalid availability slot at index {index}: {message}"),
        json!({ "index": index, "error": message }),
    )
}

/// Opaque payment-intent token handed to the payment collaborator.
fn checkout_session_token() -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(9)
        .map(|c| (c as char).to_ascii_lowercase())
        .collect();
    format!("checkout_{}_{}", chrono::Utc::now().timestamp_millis(), suffix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn sample_session(is_paid: bool) -> scheduled_session::Model {
        scheduled_session::Model {
            id: Uuid::new_v4(),
            provider_id: Uuid::new_v4(),
            session_type: SessionType::Group,
            title: Some("Algebra Workshop".to_string()),
            description: None,
            start_time: Utc.with_ymd_and_hms(2099, 1, 1, 10, 0, 0).unwrap().into(),
            end_time: Utc.with_ymd_and_hms(2099, 1, 1, 11, 0, 0).unwrap().into(),
            status: SessionStatus::Scheduled,
            is_paid,
            price: None,
            max_attendees: Some(5),
            meeting_id: Some("83921004756".to_string()),
            join_url: Some("https://zoom.us/j/83921004756".to_string()),
            host_url: Some("https://zoom.us/s/83921004756?zak=host-key".to_string()),
            access_code: Some("k3QpTx9a".to_string()),
            created_at: Utc::now().into(),
            updated_at: Utc::now().into(),
        }
    }

    #[test]
    fn student_view_redacts_host_fields() {
        let session = sample_session(false);
        let view = SessionView::for_student(&session, 2);

        assert_eq!(view.host_url, None);
        assert_eq!(view.access_code, None);
        assert_eq!(view.join_url, session.join_url);

        let serialized = serde_json::to_value(&view).unwrap();
        assert!(serialized.get("host_url").is_none());
        assert!(serialized.get("access_code").is_none());
        assert!(serialized.get("join_url").is_some());
    }

    #[test]
    fn provider_view_keeps_host_fields() {
        let session = sample_session(false);
        let view = SessionView::for_provider(&session, 0);

        assert_eq!(view.host_url, session.host_url);
        assert_eq!(view.access_code, session.access_code);
        assert_eq!(view.attendees_count, 0);
    }

    #[test]
    fn checkout_tokens_are_opaque_and_unique() {
        let first = checkout_session_token();
        let second = checkout_session_token();

        assert!(first.starts_with("checkout_"));
        assert_ne!(first, second);
    }

    #[test]
    fn price_validation_rules() {
        assert!(validate_price(false, None).is_ok());
        assert!(validate_price(true, Some(&Decimal::new(2500, 2))).is_ok());
        assert!(validate_price(true, None).is_err());
        assert!(validate_price(false, Some(&Decimal::new(-100, 2))).is_err());
    }
}
