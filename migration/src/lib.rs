//! Database migrations for the fixturecast service.
//!
//! This module contains all database migrations using SeaORM Migration.

pub use sea_orm_migration::prelude::*;

mod m2026_07_01_000001_create_tenants;
mod m2026_07_01_101000_create_channels;
mod m2026_07_01_101100_create_events;
mod m2026_07_01_101200_create_data_sources;
mod m2026_07_02_090000_create_ingest_runs;
mod m2026_07_03_000100_add_event_identity_guard;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m2026_07_01_000001_create_tenants::Migration),
            Box::new(m2026_07_01_101000_create_channels::Migration),
            Box::new(m2026_07_01_101100_create_events::Migration),
            Box::new(m2026_07_01_101200_create_data_sources::Migration),
            Box::new(m2026_07_02_090000_create_ingest_runs::Migration),
            Box::new(m2026_07_03_000100_add_event_identity_guard::Migration),
        ]
    }
}
