//! # Data Models
//!
//! This module contains all the data models used throughout the
//! fixturecast service.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub mod channel;
pub mod data_source;
pub mod event;
pub mod ingest_run;
pub mod tenant;

pub use channel::Entity as Channel;
pub use data_source::Entity as DataSource;
pub use event::Entity as Event;
pub use ingest_run::Entity as IngestRun;
pub use tenant::Entity as Tenant;

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
            service: "fixturecast".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
