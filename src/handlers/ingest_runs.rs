//! # Ingest Run Handlers
//!
//! This module contains handlers for triggering ingestion runs and reading
//! the run history with its embedded diagnostics.

use axum::extract::{Path, Query, State};
use axum::response::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{ApiError, validation_error};
use crate::handlers::ensure_tenant_exists;
use crate::ingest::{IngestOptions, IngestReport};
use crate::models::ingest_run;
use crate::repositories::IngestRunRepository;
use crate::server::AppState;

/// Upper bound accepted for `window_days` overrides.
pub const MAX_WINDOW_DAYS: u32 = 90;

const DEFAULT_RUNS_LIMIT: u32 = 20;
const MAX_RUNS_LIMIT: u32 = 100;

/// Request body for triggering an ingest run
#[derive(Debug, Default, Clone, Deserialize, ToSchema)]
pub struct TriggerIngestRequest {
    /// How many days ahead to ingest (defaults to the configured window)
    #[schema(example = 28)]
    pub window_days: Option<u32>,
    /// Restrict the run to this subset of registered source slugs
    #[schema(example = json!(["sports_db", "web_scrape"]))]
    pub sources: Option<Vec<String>>,
}

/// Query parameters for listing ingest runs
#[derive(Debug, Deserialize)]
pub struct ListIngestRunsQuery {
    /// Maximum number of runs to return (default: 20, max: 100)
    pub limit: Option<u32>,
}

/// One recorded ingest run
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct IngestRunInfo {
    /// Unique identifier for the run
    #[schema(example = "550e8400-e29b-41d4-a716-446655440000")]
    pub id: String,
    /// Terminal status of the run
    #[schema(example = "completed")]
    pub status: String,
    /// Start of the ingestion window
    #[schema(example = "2025-03-01T00:00:00Z")]
    pub window_start: String,
    /// End of the ingestion window
    #[schema(example = "2025-03-29T00:00:00Z")]
    pub window_end: String,
    /// Events written by this run
    #[schema(example = 42)]
    pub inserted_count: i32,
    /// Events considered but not written
    #[schema(example = 7)]
    pub skipped_count: i32,
    /// Per-source status and counts
    pub source_counts: Value,
    /// Inserted events per canonical sport
    pub sport_breakdown: Value,
    /// Issues the run recorded
    pub issues: Value,
    /// When the run started
    #[schema(example = "2025-03-01T06:00:00Z")]
    pub started_at: String,
    /// When the run finished
    #[schema(example = "2025-03-01T06:00:12Z")]
    pub finished_at: Option<String>,
}

/// Response payload for the run history endpoint
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct IngestRunsResponse {
    /// Recent runs, newest first
    pub runs: Vec<IngestRunInfo>,
}

impl From<ingest_run::Model> for IngestRunInfo {
    fn from(model: ingest_run::Model) -> Self {
        Self {
            id: model.id.to_string(),
            status: model.status,
            window_start: model.window_start.to_rfc3339(),
            window_end: model.window_end.to_rfc3339(),
            inserted_count: model.inserted_count,
            skipped_count: model.skipped_count,
            source_counts: model.source_counts,
            sport_breakdown: model.sport_breakdown,
            issues: model.issues,
            started_at: model.started_at.to_rfc3339(),
            finished_at: model.finished_at.map(|dt| dt.to_rfc3339()),
        }
    }
}

/// Trigger one ingestion run for a tenant and return its report
#[utoipa::path(
    post,
    path = "/tenants/{tenant_id}/ingest-runs",
    params(
        ("tenant_id" = Uuid, Path, description = "Tenant to ingest for")
    ),
    request_body = TriggerIngestRequest,
    responses(
        (status = 200, description = "Run completed", body = IngestReport),
        (status = 400, description = "Invalid window or source selection", body = ApiError),
        (status = 404, description = "Tenant not found", body = ApiError),
        (status = 409, description = "Tenant has no active channels", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "ingest-runs"
)]
pub async fn trigger_ingest_run(
    State(state): State<AppState>,
    Path(tenant_id): Path<Uuid>,
    Json(request): Json<TriggerIngestRequest>,
) -> Result<Json<IngestReport>, ApiError> {
    validate_trigger_request(&state, &request)?;

    let report = state
        .ingestor
        .run(
            tenant_id,
            IngestOptions {
                window_days: request.window_days,
                sources: request.sources,
            },
        )
        .await?;

    Ok(Json(report))
}

/// List recent ingest runs for a tenant
#[utoipa::path(
    get,
    path = "/tenants/{tenant_id}/ingest-runs",
    params(
        ("tenant_id" = Uuid, Path, description = "Tenant whose run history to read"),
        ("limit" = Option<u32>, Query, description = "Maximum number of runs to return (default 20, max 100)")
    ),
    responses(
        (status = 200, description = "Recent runs, newest first", body = IngestRunsResponse),
        (status = 400, description = "Invalid limit", body = ApiError),
        (status = 404, description = "Tenant not found", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "ingest-runs"
)]
pub async fn list_ingest_runs(
    State(state): State<AppState>,
    Path(tenant_id): Path<Uuid>,
    Query(params): Query<ListIngestRunsQuery>,
) -> Result<Json<IngestRunsResponse>, ApiError> {
    ensure_tenant_exists(&state.db, tenant_id).await?;

    let limit = match params.limit {
        Some(0) => {
            return Err(validation_error(
                "Invalid limit",
                serde_json::json!({ "limit": "Minimum allowed limit is 1" }),
            ));
        }
        Some(value) if value > MAX_RUNS_LIMIT => {
            return Err(validation_error(
                "Invalid limit",
                serde_json::json!({ "limit": format!("Maximum allowed limit is {}", MAX_RUNS_LIMIT) }),
            ));
        }
        Some(value) => value,
        None => DEFAULT_RUNS_LIMIT,
    };

    let runs = IngestRunRepository::new(&state.db)
        .recent(tenant_id, u64::from(limit))
        .await?
        .into_iter()
        .map(IngestRunInfo::from)
        .collect();

    Ok(Json(IngestRunsResponse { runs }))
}

/// Validate the trigger body against configuration and the registry.
pub(crate) fn validate_trigger_request(
    state: &AppState,
    request: &TriggerIngestRequest,
) -> Result<(), ApiError> {
    if let Some(window_days) = request.window_days {
        if window_days == 0 || window_days > MAX_WINDOW_DAYS {
            return Err(validation_error(
                "Invalid window_days",
                serde_json::json!({
                    "window_days": format!("Must be between 1 and {}", MAX_WINDOW_DAYS)
                }),
            ));
        }
    }

    if let Some(sources) = &request.sources {
        if sources.is_empty() {
            return Err(validation_error(
                "Invalid sources",
                serde_json::json!({ "sources": "Must name at least one registered source" }),
            ));
        }

        let registered: Vec<String> = state
            .registry
            .list_metadata()
            .into_iter()
            .map(|metadata| metadata.slug)
            .collect();
        let unknown: Vec<String> = sources
            .iter()
            .filter(|slug| !registered.contains(slug))
            .cloned()
            .collect();
        if !unknown.is_empty() {
            return Err(validation_error(
                "Unknown sources",
                serde_json::json!({
                    "sources": format!(
                        "Unknown source(s): {}; registered: {}",
                        unknown.join(", "),
                        registered.join(", ")
                    )
                }),
            ));
        }
    }

    Ok(())
}
