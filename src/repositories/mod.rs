//! # Repositories
//!
//! Database access layer for the Scheduling API. Each store from the domain
//! model gets one repository struct wrapping SeaORM operations; the booking
//! orchestrator composes them.

pub mod availability;
pub mod enrollment;
pub mod session;

pub use availability::{AvailabilityRepository, MarkBookedOutcome, NewSlot};
pub use enrollment::{EnrollOutcome, EnrollmentRepository};
pub use session::{NewGroupSession, SessionRepository};
