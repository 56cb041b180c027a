//! # Availability API Handlers
//!
//! Handlers for publishing and browsing provider availability.

use axum::{
    extract::{Path, State},
    response::Json,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::{Caller, Role};
use crate::error::ApiError;
use crate::scheduling::{SlotSubmission, SlotView};
use crate::server::AppState;

/// One availability slot as submitted by a provider
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilitySlotDto {
    /// Window start; ISO-8601, offset-less values are read in the
    /// deployment's default zone
    #[schema(example = "2099-01-01T10:00:00Z")]
    pub start_time: String,
    /// Window end
    #[schema(example = "2099-01-01T11:00:00Z")]
    pub end_time: String,
    /// Whether booking this slot requires payment
    #[serde(default)]
    pub is_paid: bool,
    /// Price per session; required when isPaid
    pub price: Option<Decimal>,
    /// Free-form description shown to students
    pub description: Option<String>,
}

/// Request payload replacing a provider's availability wholesale
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ReplaceAvailabilityRequestDto {
    pub availabilities: Vec<AvailabilitySlotDto>,
}

/// Acknowledgement for mutations that return no resource
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SuccessResponseDto {
    #[schema(example = "Availability updated.")]
    pub message: String,
}

/// Replace the caller's availability with the submitted slot set
#[utoipa::path(
    put,
    path = "/api/v1/availability",
    request_body = ReplaceAvailabilityRequestDto,
    responses(
        (status = 200, description = "Availability replaced", body = SuccessResponseDto),
        (status = 400, description = "Validation failed; no slot was written", body = ApiError),
        (status = 401, description = "Missing identity headers", body = ApiError),
        (status = 403, description = "Caller is not a teacher", body = ApiError)
    ),
    tag = "availability"
)]
pub async fn replace_availability(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Json(request): Json<ReplaceAvailabilityRequestDto>,
) -> Result<Json<SuccessResponseDto>, ApiError> {
    caller.require_role(Role::Teacher, "publish availability")?;
    caller.require_permission("manage_availability")?;

    let slots = request
        .availabilities
        .into_iter()
        .map(|dto| SlotSubmission {
            start_time: dto.start_time,
            end_time: dto.end_time,
            is_paid: dto.is_paid,
            price: dto.price,
            description: dto.description,
        })
        .collect();

    state
        .booking
        .replace_availability(&caller.user_id, slots)
        .await?;

    Ok(Json(SuccessResponseDto {
        message: "Availability updated.".to_string(),
    }))
}

/// List a provider's open slots, earliest first
#[utoipa::path(
    get,
    path = "/api/v1/availability/{provider_id}/slots",
    params(
        ("provider_id" = String, Path, description = "Provider identifier (any format; normalized internally)")
    ),
    responses(
        (status = 200, description = "Open slots ordered by start time", body = [SlotView]),
        (status = 401, description = "Missing identity headers", body = ApiError),
        (status = 403, description = "Insufficient permissions", body = ApiError)
    ),
    tag = "availability"
)]
pub async fn list_open_slots(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(provider_id): Path<String>,
) -> Result<Json<Vec<SlotView>>, ApiError> {
    caller.require_permission("view_sessions")?;

    let slots = state.booking.list_open_slots(&provider_id).await?;
    Ok(Json(slots))
}
