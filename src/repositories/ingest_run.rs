//! # Ingest Run Repository
//!
//! Persists one row per ingestion run, with the per-source reports, sport
//! breakdown, and issues embedded as JSON so the run history carries its
//! own diagnostics.

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use crate::ingest::report::IngestReport;
use crate::models::ingest_run::{
    ActiveModel as IngestRunActiveModel, Column, Entity as IngestRun, Model as IngestRunModel,
};

/// Repository for IngestRun database operations
pub struct IngestRunRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> IngestRunRepository<'a> {
    /// Create a new IngestRunRepository with the given database connection
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    /// Write the run record for a finished (or failed) run.
    pub async fn record(
        &self,
        report: &IngestReport,
        status: &str,
        started_at: DateTime<Utc>,
        finished_at: Option<DateTime<Utc>>,
    ) -> Result<IngestRunModel, DbErr> {
        let source_counts = serde_json::to_value(&report.sources)
            .map_err(|err| DbErr::Custom(format!("serialize source reports: {err}")))?;
        let sport_breakdown = serde_json::to_value(&report.sport_breakdown)
            .map_err(|err| DbErr::Custom(format!("serialize sport breakdown: {err}")))?;
        let issues = serde_json::to_value(&report.issues)
            .map_err(|err| DbErr::Custom(format!("serialize run issues: {err}")))?;

        IngestRunActiveModel {
            id: Set(report.run_id),
            tenant_id: Set(report.tenant_id),
            status: Set(status.to_string()),
            window_start: Set(report.window_start.into()),
            window_end: Set(report.window_end.into()),
            inserted_count: Set(report.inserted_count as i32),
            skipped_count: Set(report.skipped_count as i32),
            source_counts: Set(source_counts),
            sport_breakdown: Set(sport_breakdown),
            issues: Set(issues),
            started_at: Set(started_at.into()),
            finished_at: Set(finished_at.map(Into::into)),
        }
        .insert(self.db)
        .await
    }

    /// Most recent runs for the tenant, newest first.
    pub async fn recent(
        &self,
        tenant_id: Uuid,
        limit: u64,
    ) -> Result<Vec<IngestRunModel>, DbErr> {
        IngestRun::find()
            .filter(Column::TenantId.eq(tenant_id))
            .order_by_desc(Column::StartedAt)
            .order_by_desc(Column::Id)
            .limit(limit)
            .all(self.db)
            .await
    }
}
