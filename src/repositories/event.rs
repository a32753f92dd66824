//! # Event Repository
//!
//! This module contains the repository implementation for Event entities:
//! window queries for the deduplicator, conflict-ignoring bulk insert for
//! the orchestrator, and filtered cursor pagination for the listing API.

use chrono::{DateTime, Utc};
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ColumnTrait, Condition, DatabaseConnection, DbErr, EntityTrait, FromQueryResult, QueryFilter,
    QueryOrder, QuerySelect,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::event::{ActiveModel as EventActiveModel, Column, Entity as Event, Model as EventModel};

/// Cursor data structure for pagination
#[derive(Debug, Clone, Serialize, Deserialize, FromQueryResult)]
pub struct CursorData {
    pub start_time: DateTime<Utc>,
    pub id: Uuid,
}

/// Repository for Event database operations
pub struct EventRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> EventRepository<'a> {
    /// Create a new EventRepository with the given database connection
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    /// Every stored event whose start time falls in `[start, end)`.
    ///
    /// Hidden events are included on purpose: an event a curator hid must
    /// keep suppressing re-ingested duplicates of itself.
    pub async fn list_window(
        &self,
        tenant_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<EventModel>, DbErr> {
        Event::find()
            .filter(Column::TenantId.eq(tenant_id))
            .filter(Column::StartTime.gte(start))
            .filter(Column::StartTime.lt(end))
            .order_by_asc(Column::StartTime)
            .order_by_asc(Column::Id)
            .all(self.db)
            .await
    }

    /// Bulk-insert events, silently dropping rows that collide with an
    /// existing `(tenant_id, dedupe_key)` pair. Returns the number of rows
    /// actually written, which is authoritative for the run report.
    pub async fn insert_many(&self, models: Vec<EventActiveModel>) -> Result<u64, DbErr> {
        if models.is_empty() {
            return Ok(0);
        }

        Event::insert_many(models)
            .on_conflict(OnConflict::new().do_nothing().to_owned())
            .exec_without_returning(self.db)
            .await
    }

    /// List events for a tenant with filters and cursor pagination.
    ///
    /// Results are ordered `start_time ASC, id ASC` (guide order), and the
    /// cursor continues strictly after its `(start_time, id)` position.
    #[allow(clippy::too_many_arguments)]
    pub async fn list_events(
        &self,
        tenant_id: Uuid,
        sport_type: Option<String>,
        channel_id: Option<Uuid>,
        starts_after: Option<DateTime<Utc>>,
        starts_before: Option<DateTime<Utc>>,
        include_hidden: bool,
        cursor_data: Option<CursorData>,
        limit: i64,
    ) -> Result<Vec<EventModel>, DbErr> {
        let mut query = Event::find().filter(Column::TenantId.eq(tenant_id));

        if let Some(sport) = sport_type {
            query = query.filter(Column::SportType.eq(sport));
        }

        if let Some(channel) = channel_id {
            query = query.filter(Column::ChannelId.eq(channel));
        }

        if let Some(after) = starts_after {
            query = query.filter(Column::StartTime.gte(after));
        }

        if let Some(before) = starts_before {
            query = query.filter(Column::StartTime.lte(before));
        }

        if !include_hidden {
            query = query.filter(Column::IsHidden.eq(false));
        }

        if let Some(cursor) = cursor_data {
            query = query.filter(
                Condition::any()
                    .add(Column::StartTime.gt(cursor.start_time))
                    .add(
                        Condition::all()
                            .add(Column::StartTime.eq(cursor.start_time))
                            .add(Column::Id.gt(cursor.id)),
                    ),
            );
        }

        query
            .order_by_asc(Column::StartTime)
            .order_by_asc(Column::Id)
            .limit(limit as u64)
            .all(self.db)
            .await
    }
}
