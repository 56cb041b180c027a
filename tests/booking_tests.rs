//! One-on-one booking workflow: the happy path, the booked-flag race, and
//! compensation when provisioning or persistence fails mid-flight.

mod test_utils;

use std::sync::Arc;

use scheduling::models::scheduled_session::SessionType;
use scheduling::repositories::{AvailabilityRepository, EnrollmentRepository, SessionRepository};
use test_utils::{StubMeetings, build_service, future_slot, setup_test_db};
use uuid::Uuid;

async fn seeded_slot_id(
    service: &scheduling::scheduling::BookingService,
) -> Uuid {
    service
        .replace_availability("teacher-1", vec![future_slot(30)])
        .await
        .unwrap();
    service.list_open_slots("teacher-1").await.unwrap()[0].id
}

#[tokio::test]
async fn booking_marks_slot_creates_session_and_attendee() {
    let db = setup_test_db().await.unwrap();
    let service = build_service(&db, StubMeetings::new());
    let slot_id = seeded_slot_id(&service).await;

    let view = service.book_slot("student-1", slot_id).await.unwrap();

    assert_eq!(view.session_type, SessionType::OneOnOne);
    assert_eq!(view.max_attendees, Some(1));
    assert_eq!(view.attendees_count, 1);
    // Student response carries the join URL but never host credentials
    assert!(view.join_url.is_some());
    assert!(view.host_url.is_none());
    assert!(view.access_code.is_none());

    // Slot is gone from discovery and flagged booked
    assert!(service.list_open_slots("teacher-1").await.unwrap().is_empty());
    let arc_db = Arc::new(db.clone());
    let slot = AvailabilityRepository::new(arc_db.clone())
        .get_by_id(slot_id)
        .await
        .unwrap()
        .unwrap();
    assert!(slot.booked);

    // Session window matches the slot, and exactly one attendee exists
    let session = SessionRepository::new(arc_db.clone())
        .get_by_id(view.session_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(session.start_time, slot.start_time);
    assert_eq!(session.end_time, slot.end_time);
    assert_eq!(
        EnrollmentRepository::new(arc_db)
            .count_attendees(session.id)
            .await
            .unwrap(),
        1
    );
}

#[tokio::test]
async fn booking_a_missing_slot_is_not_found() {
    let db = setup_test_db().await.unwrap();
    let service = build_service(&db, StubMeetings::new());

    let err = service
        .book_slot("student-1", Uuid::new_v4())
        .await
        .unwrap_err();
    assert_eq!(err.code.as_ref(), "NOT_FOUND");
}

#[tokio::test]
async fn booking_an_already_booked_slot_is_conflict() {
    let db = setup_test_db().await.unwrap();
    let service = build_service(&db, StubMeetings::new());
    let slot_id = seeded_slot_id(&service).await;

    service.book_slot("student-1", slot_id).await.unwrap();
    let err = service.book_slot("student-2", slot_id).await.unwrap_err();
    assert_eq!(err.code.as_ref(), "CONFLICT");
    assert!(err.message.contains("already booked"));
}

#[tokio::test]
async fn concurrent_bookings_yield_exactly_one_winner() {
    let db = setup_test_db().await.unwrap();
    let service = Arc::new(build_service(&db, StubMeetings::new()));
    let slot_id = seeded_slot_id(&service).await;

    let first = {
        let service = service.clone();
        tokio::spawn(async move { service.book_slot("student-1", slot_id).await })
    };
    let second = {
        let service = service.clone();
        tokio::spawn(async move { service.book_slot("student-2", slot_id).await })
    };

    let results = [first.await.unwrap(), second.await.unwrap()];
    let wins = results.iter().filter(|r| r.is_ok()).count();
    let conflicts = results
        .iter()
        .filter(|r| {
            r.as_ref()
                .err()
                .map(|e| e.code.as_ref() == "CONFLICT")
                .unwrap_or(false)
        })
        .count();

    assert_eq!(wins, 1, "exactly one booking must win the race");
    assert_eq!(conflicts, 1, "the loser must see a conflict");

    // One session, one attendee record
    let arc_db = Arc::new(db);
    let winner_view = results
        .iter()
        .find_map(|r| r.as_ref().ok())
        .expect("one winner");
    assert_eq!(
        EnrollmentRepository::new(arc_db)
            .count_attendees(winner_view.session_id)
            .await
            .unwrap(),
        1
    );
}

#[tokio::test]
async fn provisioning_failure_releases_the_slot() {
    let db = setup_test_db().await.unwrap();
    let meetings = StubMeetings::new();
    let service = build_service(&db, meetings.clone());
    let slot_id = seeded_slot_id(&service).await;

    meetings.set_failing(true);
    let err = service.book_slot("student-1", slot_id).await.unwrap_err();
    assert_eq!(err.code.as_ref(), "PROVIDER_ERROR");

    // Compensating release reopened the slot; a retry succeeds
    let open = service.list_open_slots("teacher-1").await.unwrap();
    assert_eq!(open.len(), 1);
    assert_eq!(open[0].id, slot_id);

    meetings.set_failing(false);
    let view = service.book_slot("student-1", slot_id).await.unwrap();
    assert_eq!(view.attendees_count, 1);
}

#[tokio::test]
async fn provider_error_does_not_leak_vendor_body_beyond_snippet() {
    let db = setup_test_db().await.unwrap();
    let meetings = StubMeetings::failing();
    let service = build_service(&db, meetings);
    let slot_id = seeded_slot_id(&service).await;

    let err = service.book_slot("student-1", slot_id).await.unwrap_err();
    let details = err.details.expect("vendor details present");
    assert_eq!(details["vendor"], "zoom");
    assert_eq!(details["status"], 503);
}
