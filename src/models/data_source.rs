//! Data source entity model
//!
//! This module contains the SeaORM entity model for the data_sources
//! table: tenant-registered web pages the scrape adapter pulls candidate
//! events from, with bookkeeping counters.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;
use uuid::Uuid;

/// Data source entity representing a registered scrape target
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "data_sources")]
pub struct Model {
    /// Unique identifier for the data source (primary key)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Tenant identifier for multi-tenancy
    pub tenant_id: Uuid,

    /// Human-readable source name (e.g. "BBC Sport")
    pub name: String,

    /// Page URL fetched by the scrape adapter
    pub url: String,

    /// Optional admin note about the source
    pub description: Option<String>,

    /// Whether the scrape adapter includes this source
    pub is_active: bool,

    /// Number of times this source has been scraped
    pub scrape_count: i32,

    /// When this source was last fetched
    pub last_scraped_at: Option<DateTimeWithTimeZone>,

    /// Timestamp when the source was created
    pub created_at: DateTimeWithTimeZone,

    /// Timestamp when the source was last updated
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::tenant::Entity",
        from = "Column::TenantId",
        to = "super::tenant::Column::Id"
    )]
    Tenant,
}

impl Related<super::tenant::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Tenant.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
