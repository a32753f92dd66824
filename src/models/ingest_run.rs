//! Ingest run entity model
//!
//! This module contains the SeaORM entity model for the ingest_runs
//! table: one row per orchestrator run recording the outcome report.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;
use serde_json::Value as JsonValue;
use uuid::Uuid;

/// Ingest run entity capturing one pipeline execution
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "ingest_runs")]
pub struct Model {
    /// Unique identifier for the run (primary key)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Tenant identifier for multi-tenancy
    pub tenant_id: Uuid,

    /// Terminal status: "completed" or "failed"
    pub status: String,

    /// Start of the ingestion window
    pub window_start: DateTimeWithTimeZone,

    /// End of the ingestion window
    pub window_end: DateTimeWithTimeZone,

    /// Events actually written by this run
    pub inserted_count: i32,

    /// Candidates dropped by normalization, dedup, or the store guard
    pub skipped_count: i32,

    /// Per-source status and counts (json)
    #[sea_orm(column_type = "JsonBinary")]
    pub source_counts: JsonValue,

    /// Inserted events per sport (json)
    #[sea_orm(column_type = "JsonBinary")]
    pub sport_breakdown: JsonValue,

    /// Absorbed per-source and per-candidate issues (json)
    #[sea_orm(column_type = "JsonBinary")]
    pub issues: JsonValue,

    /// When the run started
    pub started_at: DateTimeWithTimeZone,

    /// When the run finished; null only if the process died mid-run
    pub finished_at: Option<DateTimeWithTimeZone>,
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
