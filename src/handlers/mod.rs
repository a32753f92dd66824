//! # API Handlers
//!
//! This module contains all the HTTP endpoint handlers for the fixturecast
//! API: service info, health, and the tenant-scoped ingestion surface.

pub mod channels;
pub mod data_sources;
pub mod events;
pub mod ingest_runs;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Json;
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::db;
use crate::error::{ApiError, not_found};
use crate::models::ServiceInfo;
use crate::repositories::TenantRepository;
use crate::server::AppState;

/// Root handler that returns basic service information
#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Service information", body = ServiceInfo)
    ),
    tag = "root"
)]
pub async fn root() -> Json<ServiceInfo> {
    Json(ServiceInfo::default())
}

/// Liveness and database health response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthStatus {
    /// Overall service status
    #[schema(example = "ok")]
    pub status: String,
    /// Database connectivity status
    #[schema(example = "ok")]
    pub database: String,
}

/// Health check handler that verifies database connectivity
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service healthy", body = HealthStatus),
        (status = 503, description = "Database unreachable", body = ApiError)
    ),
    tag = "root"
)]
pub async fn health(State(state): State<AppState>) -> Result<Json<HealthStatus>, ApiError> {
    db::health_check(&state.db).await.map_err(|err| {
        tracing::error!(error = ?err, "Health check failed");
        ApiError::new(
            StatusCode::SERVICE_UNAVAILABLE,
            "SERVICE_UNAVAILABLE",
            "Database unreachable",
        )
    })?;

    Ok(Json(HealthStatus {
        status: "ok".to_string(),
        database: "ok".to_string(),
    }))
}

/// Reject requests addressed to a tenant that does not exist.
pub(crate) async fn ensure_tenant_exists(
    db: &DatabaseConnection,
    tenant_id: Uuid,
) -> Result<(), ApiError> {
    if TenantRepository::new(db).exists(tenant_id).await? {
        Ok(())
    } else {
        Err(not_found(&format!("Tenant not found: {}", tenant_id)))
    }
}
