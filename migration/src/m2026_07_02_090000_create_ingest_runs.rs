//! Migration to create the ingest_runs table.
//!
//! One row per orchestrator run recording the outcome report: counts,
//! per-source status, sport breakdown, and absorbed issues.

use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::Statement;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(IngestRuns::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(IngestRuns::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(IngestRuns::TenantId).uuid().not_null())
                    .col(ColumnDef::new(IngestRuns::Status).text().not_null())
                    .col(
                        ColumnDef::new(IngestRuns::WindowStart)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(IngestRuns::WindowEnd)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(IngestRuns::InsertedCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(IngestRuns::SkippedCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(IngestRuns::SourceCounts)
                            .json_binary()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(IngestRuns::SportBreakdown)
                            .json_binary()
                            .not_null(),
                    )
                    .col(ColumnDef::new(IngestRuns::Issues).json_binary().not_null())
                    .col(
                        ColumnDef::new(IngestRuns::StartedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(IngestRuns::FinishedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_ingest_runs_tenant_id")
                            .from(IngestRuns::Table, IngestRuns::TenantId)
                            .to(Tenants::Table, Tenants::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Run history is listed newest-first per tenant
        manager
            .get_connection()
            .execute(Statement::from_string(
                manager.get_database_backend(),
                "CREATE INDEX IF NOT EXISTS idx_ingest_runs_tenant_started ON ingest_runs (tenant_id, started_at DESC)"
                    .to_string(),
            ))
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_ingest_runs_tenant_started")
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(Table::drop().table(IngestRuns::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum IngestRuns {
    Table,
    Id,
    TenantId,
    Status,
    WindowStart,
    WindowEnd,
    InsertedCount,
    SkippedCount,
    SourceCounts,
    SportBreakdown,
    Issues,
    StartedAt,
    FinishedAt,
}

#[derive(DeriveIden)]
enum Tenants {
    Table,
    Id,
}
