//! # Scheduling API Handlers
//!
//! Handlers for group session creation and discovery, one-on-one booking,
//! group enrollment, and the caller's own session listing.

use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::{Caller, Role};
use crate::error::ApiError;
use crate::scheduling::{EnrollmentResult, GroupSessionSubmission, SessionView};
use crate::server::AppState;

/// Request payload for creating a group session
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateGroupSessionDto {
    /// Display title (required, max 255 characters)
    #[schema(example = "Algebra Workshop")]
    pub title: String,
    /// Longer description (optional)
    pub description: Option<String>,
    /// Session start; ISO-8601
    #[schema(example = "2099-01-01T10:00:00Z")]
    pub start_time: String,
    /// Session end
    #[schema(example = "2099-01-01T11:00:00Z")]
    pub end_time: String,
    /// Whether attending requires payment
    #[serde(default)]
    pub is_paid: bool,
    /// Price for the session; required when isPaid
    pub price: Option<Decimal>,
    /// Seat cap (default 10, minimum 1)
    pub max_attendees: Option<i32>,
}

/// Request payload for booking a one-on-one slot
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookSessionDto {
    /// The availability slot to book
    pub slot_id: Uuid,
}

/// Request payload for enrolling in a group session
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EnrollGroupSessionDto {
    /// The group session to enroll in
    pub session_id: Uuid,
}

/// Create a group session with its video meeting
#[utoipa::path(
    post,
    path = "/api/v1/scheduling/group-sessions",
    request_body = CreateGroupSessionDto,
    responses(
        (status = 201, description = "Session created; provider view with host fields", body = SessionView),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 401, description = "Missing identity headers", body = ApiError),
        (status = 403, description = "Caller is not a teacher", body = ApiError),
        (status = 502, description = "Meeting vendor rejected the request", body = ApiError)
    ),
    tag = "scheduling"
)]
pub async fn create_group_session(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Json(request): Json<CreateGroupSessionDto>,
) -> Result<(StatusCode, Json<SessionView>), ApiError> {
    caller.require_role(Role::Teacher, "create group sessions")?;
    caller.require_permission("create_session")?;

    let view = state
        .booking
        .create_group_session(
            &caller.user_id,
            GroupSessionSubmission {
                title: request.title,
                description: request.description,
                start_time: request.start_time,
                end_time: request.end_time,
                is_paid: request.is_paid,
                price: request.price,
                max_attendees: request.max_attendees,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(view)))
}

/// List open group sessions for discovery (full sessions are excluded)
#[utoipa::path(
    get,
    path = "/api/v1/scheduling/group-sessions",
    responses(
        (status = 200, description = "Open group sessions, earliest first, join-only fields", body = [SessionView]),
        (status = 401, description = "Missing identity headers", body = ApiError),
        (status = 403, description = "Insufficient permissions", body = ApiError)
    ),
    tag = "scheduling"
)]
pub async fn list_open_group_sessions(
    State(state): State<AppState>,
    Caller(caller): Caller,
) -> Result<Json<Vec<SessionView>>, ApiError> {
    caller.require_permission("view_sessions")?;

    let sessions = state.booking.list_open_group_sessions().await?;
    Ok(Json(sessions))
}

/// Book a one-on-one availability slot
#[utoipa::path(
    post,
    path = "/api/v1/scheduling/bookings",
    request_body = BookSessionDto,
    responses(
        (status = 201, description = "Slot booked; session view with join-only fields", body = SessionView),
        (status = 401, description = "Missing identity headers", body = ApiError),
        (status = 403, description = "Caller is not a student", body = ApiError),
        (status = 404, description = "Slot not found", body = ApiError),
        (status = 409, description = "Slot already booked", body = ApiError),
        (status = 502, description = "Meeting vendor rejected the request", body = ApiError)
    ),
    tag = "scheduling"
)]
pub async fn book_session(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Json(request): Json<BookSessionDto>,
) -> Result<(StatusCode, Json<SessionView>), ApiError> {
    caller.require_role(Role::Student, "book sessions")?;
    caller.require_permission("book_session")?;

    let view = state
        .booking
        .book_slot(&caller.user_id, request.slot_id)
        .await?;

    Ok((StatusCode::CREATED, Json(view)))
}

/// Enroll in a group session (or receive a payment intent for paid ones)
#[utoipa::path(
    post,
    path = "/api/v1/scheduling/enrollments",
    request_body = EnrollGroupSessionDto,
    responses(
        (status = 200, description = "Enrolled (session view with count) or payment intent token", body = EnrollmentResult),
        (status = 400, description = "Not a group session", body = ApiError),
        (status = 401, description = "Missing identity headers", body = ApiError),
        (status = 403, description = "Caller is not a student", body = ApiError),
        (status = 404, description = "Session not found", body = ApiError),
        (status = 409, description = "Session full or already enrolled", body = ApiError)
    ),
    tag = "scheduling"
)]
pub async fn enroll_group_session(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Json(request): Json<EnrollGroupSessionDto>,
) -> Result<Json<EnrollmentResult>, ApiError> {
    caller.require_role(Role::Student, "enroll in group sessions")?;
    caller.require_permission("enroll_session")?;

    let result = state
        .booking
        .enroll(&caller.user_id, request.session_id)
        .await?;

    Ok(Json(result))
}

/// List the caller's sessions with role-appropriate field redaction
#[utoipa::path(
    get,
    path = "/api/v1/scheduling/me/sessions",
    responses(
        (status = 200, description = "Caller's sessions, most recent start first", body = [SessionView]),
        (status = 401, description = "Missing identity headers", body = ApiError),
        (status = 403, description = "Insufficient permissions", body = ApiError)
    ),
    tag = "scheduling"
)]
pub async fn my_sessions(
    State(state): State<AppState>,
    Caller(caller): Caller,
) -> Result<Json<Vec<SessionView>>, ApiError> {
    caller.require_permission("view_my_sessions")?;

    let sessions = match caller.role {
        Role::Teacher => state.booking.provider_sessions(&caller.user_id).await?,
        Role::Student => state.booking.student_sessions(&caller.user_id).await?,
    };

    Ok(Json(sessions))
}
