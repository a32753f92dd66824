//! # Repository Layer
//!
//! This module contains repository implementations that encapsulate SeaORM
//! operations for database entities, providing tenant-scoped data access for
//! the ingestion pipeline and the HTTP handlers.

pub mod channel;
pub mod data_source;
pub mod event;
pub mod ingest_run;
pub mod tenant;

pub use channel::ChannelRepository;
pub use data_source::DataSourceRepository;
pub use event::{CursorData, EventRepository};
pub use ingest_run::IngestRunRepository;
pub use tenant::TenantRepository;
