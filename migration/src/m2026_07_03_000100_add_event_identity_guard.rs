//! Adds a partial unique index enforcing at-most-once insertion per event
//! identity key. Concurrent ingest runs racing on the same window both pass
//! the in-memory dedup against a stale read; this index makes the losing
//! insert a no-op instead of a duplicate row.

use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::{DatabaseBackend, Statement};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let backend = manager.get_database_backend();
        match backend {
            DatabaseBackend::Postgres => {
                manager
                    .get_connection()
                    .execute(Statement::from_string(
                        backend,
                        "DO $$\nBEGIN\n    IF NOT EXISTS (\n        SELECT 1 FROM pg_indexes\n        WHERE schemaname = current_schema()\n          AND indexname = 'idx_events_tenant_dedupe_key'\n    ) THEN\n        CREATE UNIQUE INDEX idx_events_tenant_dedupe_key\n            ON events (tenant_id, dedupe_key)\n            WHERE dedupe_key IS NOT NULL;\n    END IF;\nEND\n$$;"
                            .to_string(),
                    ))
                    .await
                    .map(|_| ())
            }
            _ => manager
                .get_connection()
                .execute(Statement::from_string(
                    backend,
                    "CREATE UNIQUE INDEX IF NOT EXISTS idx_events_tenant_dedupe_key \
                     ON events (tenant_id, dedupe_key) \
                     WHERE dedupe_key IS NOT NULL"
                        .to_string(),
                ))
                .await
                .map(|_| ()),
        }
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute(Statement::from_string(
                manager.get_database_backend(),
                "DROP INDEX IF EXISTS idx_events_tenant_dedupe_key",
            ))
            .await
            .map(|_| ())
    }
}
