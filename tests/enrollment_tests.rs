//! Group session creation, discovery, and the enrollment ledger: capacity,
//! uniqueness, the last-seat race, and the paid-enrollment deferral.

mod test_utils;

use std::sync::Arc;

use scheduling::scheduling::EnrollmentResult;
use test_utils::{StubMeetings, build_service, future_group_session, setup_test_db};
use uuid::Uuid;

#[tokio::test]
async fn group_session_creation_returns_provider_view() {
    let db = setup_test_db().await.unwrap();
    let service = build_service(&db, StubMeetings::new());

    let view = service
        .create_group_session("teacher-1", future_group_session(30, Some(2), false))
        .await
        .unwrap();

    assert_eq!(view.attendees_count, 0);
    assert_eq!(view.max_attendees, Some(2));
    // Provider view keeps host credentials
    assert!(view.host_url.is_some());
    assert!(view.access_code.is_some());
}

#[tokio::test]
async fn provisioning_failure_creates_no_session() {
    let db = setup_test_db().await.unwrap();
    let service = build_service(&db, StubMeetings::failing());

    let err = service
        .create_group_session("teacher-1", future_group_session(30, Some(2), false))
        .await
        .unwrap_err();
    assert_eq!(err.code.as_ref(), "PROVIDER_ERROR");

    let open = service.list_open_group_sessions().await.unwrap();
    assert!(open.is_empty());
}

#[tokio::test]
async fn capacity_default_and_bounds() {
    let db = setup_test_db().await.unwrap();
    let service = build_service(&db, StubMeetings::new());

    let view = service
        .create_group_session("teacher-1", future_group_session(30, None, false))
        .await
        .unwrap();
    assert_eq!(view.max_attendees, Some(10));

    let err = service
        .create_group_session("teacher-1", future_group_session(30, Some(0), false))
        .await
        .unwrap_err();
    assert_eq!(err.code.as_ref(), "VALIDATION_FAILED");
}

#[tokio::test]
async fn free_enrollment_inserts_and_counts() {
    let db = setup_test_db().await.unwrap();
    let service = build_service(&db, StubMeetings::new());
    let session = service
        .create_group_session("teacher-1", future_group_session(30, Some(3), false))
        .await
        .unwrap();

    let result = service
        .enroll("student-1", session.session_id)
        .await
        .unwrap();

    match result {
        EnrollmentResult::Enrolled(view) => {
            assert_eq!(view.attendees_count, 1);
            assert!(view.host_url.is_none(), "student view must redact host URL");
        }
        EnrollmentResult::PaymentRequired { .. } => panic!("free session must enroll directly"),
    }
}

#[tokio::test]
async fn double_enrollment_is_conflict() {
    let db = setup_test_db().await.unwrap();
    let service = build_service(&db, StubMeetings::new());
    let session = service
        .create_group_session("teacher-1", future_group_session(30, Some(3), false))
        .await
        .unwrap();

    service.enroll("student-1", session.session_id).await.unwrap();
    let err = service
        .enroll("student-1", session.session_id)
        .await
        .unwrap_err();
    assert_eq!(err.code.as_ref(), "CONFLICT");
    assert!(err.message.contains("already enrolled"));
}

#[tokio::test]
async fn last_seat_race_admits_exactly_one() {
    let db = setup_test_db().await.unwrap();
    let service = Arc::new(build_service(&db, StubMeetings::new()));
    let session = service
        .create_group_session("teacher-1", future_group_session(30, Some(1), false))
        .await
        .unwrap();
    let session_id = session.session_id;

    let first = {
        let service = service.clone();
        tokio::spawn(async move { service.enroll("student-1", session_id).await })
    };
    let second = {
        let service = service.clone();
        tokio::spawn(async move { service.enroll("student-2", session_id).await })
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

    assert_eq!(wins, 1, "exactly one student gets the last seat");
    assert_eq!(conflicts, 1);

    // Final attendee count is the capacity, not beyond it
    let arc_db = Arc::new(db);
    let count = scheduling::repositories::EnrollmentRepository::new(arc_db)
        .count_attendees(session_id)
        .await
        .unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn full_sessions_drop_out_of_discovery_and_reject_enrollment() {
    let db = setup_test_db().await.unwrap();
    let service = build_service(&db, StubMeetings::new());
    let session = service
        .create_group_session("teacher-1", future_group_session(30, Some(2), false))
        .await
        .unwrap();

    let open = service.list_open_group_sessions().await.unwrap();
    assert_eq!(open.len(), 1);
    assert_eq!(open[0].attendees_count, 0);

    service.enroll("student-1", session.session_id).await.unwrap();
    service.enroll("student-2", session.session_id).await.unwrap();

    // Full: excluded from discovery but still stored
    let open = service.list_open_group_sessions().await.unwrap();
    assert!(open.is_empty());

    let err = service
        .enroll("student-3", session.session_id)
        .await
        .unwrap_err();
    assert_eq!(err.code.as_ref(), "CONFLICT");
    assert!(err.message.contains("full"));
}

#[tokio::test]
async fn paid_enrollment_defers_to_checkout_without_writing() {
    let db = setup_test_db().await.unwrap();
    let service = build_service(&db, StubMeetings::new());
    let session = service
        .create_group_session("teacher-1", future_group_session(30, Some(5), true))
        .await
        .unwrap();

    let result = service
        .enroll("student-1", session.session_id)
        .await
        .unwrap();

    match result {
        EnrollmentResult::PaymentRequired {
            checkout_session_id,
        } => {
            assert!(checkout_session_id.starts_with("checkout_"));
        }
        EnrollmentResult::Enrolled(_) => panic!("paid session must defer enrollment"),
    }

    // No attendee record until payment confirms
    let arc_db = Arc::new(db);
    let count = scheduling::repositories::EnrollmentRepository::new(arc_db)
        .count_attendees(session.session_id)
        .await
        .unwrap();
    assert_eq!(count, 0);
}

#[tokio::test]
async fn enrolling_in_a_one_on_one_session_is_rejected() {
    let db = setup_test_db().await.unwrap();
    let service = build_service(&db, StubMeetings::new());

    service
        .replace_availability("teacher-1", vec![test_utils::future_slot(30)])
        .await
        .unwrap();
    let slot_id = service.list_open_slots("teacher-1").await.unwrap()[0].id;
    let booked = service.book_slot("student-1", slot_id).await.unwrap();

    let err = service
        .enroll("student-2", booked.session_id)
        .await
        .unwrap_err();
    assert_eq!(err.code.as_ref(), "VALIDATION_FAILED");
    assert!(err.message.contains("group"));
}

#[tokio::test]
async fn enrolling_in_a_missing_session_is_not_found() {
    let db = setup_test_db().await.unwrap();
    let service = build_service(&db, StubMeetings::new());

    let err = service.enroll("student-1", Uuid::new_v4()).await.unwrap_err();
    assert_eq!(err.code.as_ref(), "NOT_FOUND");
}

#[tokio::test]
async fn my_sessions_views_are_role_appropriate() {
    let db = setup_test_db().await.unwrap();
    let service = build_service(&db, StubMeetings::new());
    let session = service
        .create_group_session("teacher-1", future_group_session(30, Some(5), false))
        .await
        .unwrap();
    service.enroll("student-1", session.session_id).await.unwrap();

    let teacher_sessions = service.provider_sessions("teacher-1").await.unwrap();
    assert_eq!(teacher_sessions.len(), 1);
    assert!(teacher_sessions[0].host_url.is_some());
    assert_eq!(teacher_sessions[0].attendees_count, 1);

    let student_sessions = service.student_sessions("student-1").await.unwrap();
    assert_eq!(student_sessions.len(), 1);
    assert!(student_sessions[0].host_url.is_none());
    assert!(student_sessions[0].join_url.is_some());

    // A student with no enrollments sees nothing
    let other = service.student_sessions("student-2").await.unwrap();
    assert!(other.is_empty());
}
