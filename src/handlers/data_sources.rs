//! # Data Source Handlers
//!
//! This module contains CRUD handlers for the scrape source catalog. The
//! listing endpoint lazily seeds the default catalog for tenants that have
//! never registered a source.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use serde::{Deserialize, Serialize};
use url::Url;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{ApiError, not_found, validation_error};
use crate::handlers::ensure_tenant_exists;
use crate::models::data_source;
use crate::repositories::data_source::{DataSourceChanges, NewDataSource};
use crate::repositories::DataSourceRepository;
use crate::seeds;
use crate::server::AppState;

/// Query parameters for listing data sources
#[derive(Debug, Deserialize)]
pub struct ListDataSourcesQuery {
    /// Only return sources the scrape adapter currently uses (default: false)
    pub active_only: Option<bool>,
}

/// Request body for registering a scrape source
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateDataSourceRequest {
    /// Human-readable source name
    #[schema(example = "BBC Sport")]
    pub name: String,
    /// Page URL the scrape adapter should fetch
    #[schema(example = "https://www.bbc.co.uk/sport/football/fixtures")]
    pub url: String,
    /// Optional admin note about the source
    pub description: Option<String>,
    /// Whether the source participates in scraping (default: true)
    pub is_active: Option<bool>,
}

/// Request body for updating a scrape source
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UpdateDataSourceRequest {
    /// New source name
    pub name: Option<String>,
    /// New page URL
    pub url: Option<String>,
    /// New admin note
    pub description: Option<String>,
    /// Enable or disable the source
    pub is_active: Option<bool>,
}

/// One registered scrape source
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DataSourceInfo {
    /// Unique identifier for the source
    #[schema(example = "550e8400-e29b-41d4-a716-446655440000")]
    pub id: String,
    /// Human-readable source name
    #[schema(example = "BBC Sport")]
    pub name: String,
    /// Page URL the scrape adapter fetches
    #[schema(example = "https://www.bbc.co.uk/sport/football/fixtures")]
    pub url: String,
    /// Admin note about the source
    pub description: Option<String>,
    /// Whether the source participates in scraping
    pub is_active: bool,
    /// Number of times this source has been scraped
    #[schema(example = 12)]
    pub scrape_count: i32,
    /// When this source was last fetched
    #[schema(example = "2025-03-01T06:00:00Z")]
    pub last_scraped_at: Option<String>,
    /// Timestamp when the source was created
    #[schema(example = "2025-01-01T00:00:00Z")]
    pub created_at: String,
}

/// Response payload for the data source listing endpoint
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DataSourcesResponse {
    /// Registered sources in creation order
    pub sources: Vec<DataSourceInfo>,
}

impl From<data_source::Model> for DataSourceInfo {
    fn from(model: data_source::Model) -> Self {
        Self {
            id: model.id.to_string(),
            name: model.name,
            url: model.url,
            description: model.description,
            is_active: model.is_active,
            scrape_count: model.scrape_count,
            last_scraped_at: model.last_scraped_at.map(|dt| dt.to_rfc3339()),
            created_at: model.created_at.to_rfc3339(),
        }
    }
}

/// List scrape sources for a tenant, seeding the defaults on first touch
#[utoipa::path(
    get,
    path = "/tenants/{tenant_id}/data-sources",
    params(
        ("tenant_id" = Uuid, Path, description = "Tenant whose sources to list"),
        ("active_only" = Option<bool>, Query, description = "Only return active sources")
    ),
    responses(
        (status = 200, description = "Registered sources", body = DataSourcesResponse),
        (status = 404, description = "Tenant not found", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "data-sources"
)]
pub async fn list_data_sources(
    State(state): State<AppState>,
    Path(tenant_id): Path<Uuid>,
    Query(params): Query<ListDataSourcesQuery>,
) -> Result<Json<DataSourcesResponse>, ApiError> {
    ensure_tenant_exists(&state.db, tenant_id).await?;

    seeds::ensure_default_sources(&state.db, tenant_id).await?;

    let repo = DataSourceRepository::new(&state.db);
    let sources = if params.active_only.unwrap_or(false) {
        repo.list_active(tenant_id).await?
    } else {
        repo.list(tenant_id).await?
    };

    Ok(Json(DataSourcesResponse {
        sources: sources.into_iter().map(DataSourceInfo::from).collect(),
    }))
}

/// Register a new scrape source
#[utoipa::path(
    post,
    path = "/tenants/{tenant_id}/data-sources",
    params(
        ("tenant_id" = Uuid, Path, description = "Tenant to register the source for")
    ),
    request_body = CreateDataSourceRequest,
    responses(
        (status = 201, description = "Source registered", body = DataSourceInfo),
        (status = 400, description = "Invalid name or URL", body = ApiError),
        (status = 404, description = "Tenant not found", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "data-sources"
)]
pub async fn create_data_source(
    State(state): State<AppState>,
    Path(tenant_id): Path<Uuid>,
    Json(request): Json<CreateDataSourceRequest>,
) -> Result<(StatusCode, Json<DataSourceInfo>), ApiError> {
    ensure_tenant_exists(&state.db, tenant_id).await?;

    let name = request.name.trim().to_string();
    if name.is_empty() {
        return Err(validation_error(
            "Invalid name",
            serde_json::json!({ "name": "Must not be empty" }),
        ));
    }
    validate_source_url(&request.url)?;

    let created = DataSourceRepository::new(&state.db)
        .create(
            tenant_id,
            NewDataSource {
                name,
                url: request.url,
                description: request.description,
                is_active: request.is_active.unwrap_or(true),
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(DataSourceInfo::from(created))))
}

/// Update an existing scrape source
#[utoipa::path(
    patch,
    path = "/tenants/{tenant_id}/data-sources/{source_id}",
    params(
        ("tenant_id" = Uuid, Path, description = "Tenant owning the source"),
        ("source_id" = Uuid, Path, description = "Source to update")
    ),
    request_body = UpdateDataSourceRequest,
    responses(
        (status = 200, description = "Source updated", body = DataSourceInfo),
        (status = 400, description = "Invalid name or URL", body = ApiError),
        (status = 404, description = "Tenant or source not found", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "data-sources"
)]
pub async fn update_data_source(
    State(state): State<AppState>,
    Path((tenant_id, source_id)): Path<(Uuid, Uuid)>,
    Json(request): Json<UpdateDataSourceRequest>,
) -> Result<Json<DataSourceInfo>, ApiError> {
    ensure_tenant_exists(&state.db, tenant_id).await?;

    let name = match request.name {
        Some(raw) => {
            let trimmed = raw.trim().to_string();
            if trimmed.is_empty() {
                return Err(validation_error(
                    "Invalid name",
                    serde_json::json!({ "name": "Must not be empty" }),
                ));
            }
            Some(trimmed)
        }
        None => None,
    };
    if let Some(url) = &request.url {
        validate_source_url(url)?;
    }

    let updated = DataSourceRepository::new(&state.db)
        .update(
            tenant_id,
            source_id,
            DataSourceChanges {
                name,
                url: request.url,
                description: request.description,
                is_active: request.is_active,
            },
        )
        .await?
        .ok_or_else(|| not_found(&format!("Data source not found: {}", source_id)))?;

    Ok(Json(DataSourceInfo::from(updated)))
}

/// Delete a scrape source
#[utoipa::path(
    delete,
    path = "/tenants/{tenant_id}/data-sources/{source_id}",
    params(
        ("tenant_id" = Uuid, Path, description = "Tenant owning the source"),
        ("source_id" = Uuid, Path, description = "Source to delete")
    ),
    responses(
        (status = 204, description = "Source deleted"),
        (status = 404, description = "Tenant or source not found", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "data-sources"
)]
pub async fn delete_data_source(
    State(state): State<AppState>,
    Path((tenant_id, source_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, ApiError> {
    ensure_tenant_exists(&state.db, tenant_id).await?;

    let deleted = DataSourceRepository::new(&state.db)
        .delete(tenant_id, source_id)
        .await?;
    if !deleted {
        return Err(not_found(&format!("Data source not found: {}", source_id)));
    }

    Ok(StatusCode::NO_CONTENT)
}

/// A scrape target must be an absolute http(s) URL.
fn validate_source_url(raw: &str) -> Result<(), ApiError> {
    let parsed = Url::parse(raw).map_err(|_| {
        validation_error(
            "Invalid url",
            serde_json::json!({ "url": "Must be an absolute URL" }),
        )
    })?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(validation_error(
            "Invalid url",
            serde_json::json!({ "url": "Must use http or https" }),
        ));
    }

    Ok(())
}
