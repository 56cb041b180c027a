//! # Data Models
//!
//! This module contains all the data models used throughout the Scheduling API.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub mod availability_slot;
pub mod scheduled_session;
pub mod session_attendee;

pub use availability_slot::Entity as AvailabilitySlot;
pub use scheduled_session::Entity as ScheduledSession;
pub use scheduled_session::{SessionStatus, SessionType};
pub use session_attendee::Entity as SessionAttendee;

/// Basic service information response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ServiceInfo {
    /// The name of the service
    pub service: String,
    /// The version of the service
    pub version: String,
}

impl Default for ServiceInfo {
    fn default() -> Self {
        Self {
            service: "tutora-scheduling".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
