//! Event entity model
//!
//! This module contains the SeaORM entity model for the events table,
//! which stores canonical, channel-resolved broadcast events produced by
//! the ingestion pipeline. Rows are never mutated by the pipeline once
//! inserted; hide/feature toggles belong to admin flows.

use super::channel::Entity as Channel;
use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;
use uuid::Uuid;

/// Event entity representing a scheduled broadcast
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "events")]
pub struct Model {
    /// Unique identifier for the event (primary key)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Tenant identifier for multi-tenancy
    pub tenant_id: Uuid,

    /// Resolved channel carrying the broadcast; always belongs to the
    /// same tenant
    pub channel_id: Uuid,

    /// Event title (e.g. "Premier League: Arsenal vs Chelsea")
    pub title: String,

    /// Canonical sport classification (see [`crate::sports`])
    pub sport_type: String,

    /// League or competition name, when the source reported one
    pub league: Option<String>,

    /// Home team, when the event is a fixture between two teams
    pub home_team: Option<String>,

    /// Away team, when the event is a fixture between two teams
    pub away_team: Option<String>,

    /// Broadcast start instant (UTC)
    pub start_time: DateTimeWithTimeZone,

    /// Broadcast end instant, when the source reported one
    pub end_time: Option<DateTimeWithTimeZone>,

    /// Free-text description from the source
    pub description: Option<String>,

    /// Admin-managed highlight flag
    pub is_featured: bool,

    /// Admin-managed visibility flag
    pub is_hidden: bool,

    /// Slug of the source adapter that produced this event
    pub source_slug: String,

    /// Hex digest of the identity key; backs the store-level uniqueness
    /// guard against racing ingest runs
    pub dedupe_key: Option<String>,

    /// Timestamp when the event was created
    pub created_at: DateTimeWithTimeZone,

    /// Timestamp when the event was last updated
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "Channel",
        from = "Column::ChannelId",
        to = "super::channel::Column::Id"
    )]
    Channel,
    #[sea_orm(
        belongs_to = "super::tenant::Entity",
        from = "Column::TenantId",
        to = "super::tenant::Column::Id"
    )]
    Tenant,
}

impl Related<Channel> for Entity {
    fn to() -> RelationDef {
        Relation::Channel.def()
    }
}

impl Related<super::tenant::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Tenant.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
