//! Meeting provisioning seam
//!
//! Defines the interface the booking workflows require from the video
//! conference vendor, plus the structured error they must handle. The
//! production implementation lives in [`zoom`]; tests substitute their own.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

pub mod zoom;

pub use zoom::ZoomMeetingClient;

/// Parameters for one meeting provisioning call.
#[derive(Debug, Clone)]
pub struct MeetingRequest {
    /// Session title, becomes part of the vendor-side topic
    pub topic: String,
    /// Category label appended to the topic ("Individual Tutoring", "Group Session")
    pub category: String,
    /// Meeting start, UTC
    pub start_time: DateTime<Utc>,
    /// Whole-minute duration
    pub duration_minutes: i64,
}

/// Vendor meeting resource as the rest of the system sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeetingRecord {
    /// Vendor-side meeting identifier
    pub external_id: String,
    /// URL participants use to join
    pub join_url: String,
    /// URL the host uses to start the meeting
    pub host_url: String,
    /// Meeting password, when the vendor issued one
    pub access_code: Option<String>,
}

/// Failure modes of a provisioning call. Provisioning never partially
/// succeeds; callers decide whether to retry or abort their workflow.
#[derive(Debug, Clone, Error)]
pub enum MeetingProviderError {
    #[error("meeting vendor credentials are not configured")]
    MissingCredentials,
    #[error("meeting vendor rejected the request with status {status}")]
    Vendor { status: u16, body: Option<String> },
    #[error("meeting vendor unreachable: {0}")]
    Transport(String),
    #[error("meeting vendor returned an unexpected payload: {0}")]
    MalformedResponse(String),
}

/// Interface to the external video-conference vendor.
#[async_trait]
pub trait MeetingProvider: Send + Sync {
    /// Requests creation of a meeting resource for the given window.
    async fn provision(&self, request: MeetingRequest) -> Result<MeetingRecord, MeetingProviderError>;
}
