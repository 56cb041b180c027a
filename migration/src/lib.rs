//! Database migrations for the Tutora Scheduling API.
//!
//! This module contains all database migrations using SeaORM Migration.

pub use sea_orm_migration::prelude::*;

mod m2025_06_01_100000_create_availability_slots;
mod m2025_06_01_100100_create_scheduled_sessions;
mod m2025_06_01_100200_create_session_attendees;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m2025_06_01_100000_create_availability_slots::Migration),
            Box::new(m2025_06_01_100100_create_scheduled_sessions::Migration),
            Box::new(m2025_06_01_100200_create_session_attendees::Migration),
        ]
    }
}
