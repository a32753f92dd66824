//! # Channel Handlers
//!
//! This module contains the listing endpoint for a tenant's broadcast
//! channels. Channels themselves are provisioned out of band; the
//! ingestion service only reads them.

use axum::extract::{Path, Query, State};
use axum::response::Json;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::ApiError;
use crate::handlers::ensure_tenant_exists;
use crate::models::channel;
use crate::repositories::ChannelRepository;
use crate::server::AppState;

/// Query parameters for listing channels
#[derive(Debug, Deserialize)]
pub struct ListChannelsQuery {
    /// Include channels that are currently inactive (default: false)
    pub include_inactive: Option<bool>,
}

/// One broadcast channel
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ChannelInfo {
    /// Unique identifier for the channel
    #[schema(example = "550e8400-e29b-41d4-a716-446655440000")]
    pub id: String,
    /// Channel display name
    #[schema(example = "Sky Sports Main Event")]
    pub name: String,
    /// Whether the channel participates in ingestion
    pub is_active: bool,
    /// Timestamp when the channel was created
    #[schema(example = "2025-01-01T00:00:00Z")]
    pub created_at: String,
}

/// Response payload for the channels listing endpoint
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ChannelsResponse {
    /// Channels in creation order
    pub channels: Vec<ChannelInfo>,
}

impl From<channel::Model> for ChannelInfo {
    fn from(model: channel::Model) -> Self {
        Self {
            id: model.id.to_string(),
            name: model.name,
            is_active: model.is_active,
            created_at: model.created_at.to_rfc3339(),
        }
    }
}

/// List channels for a tenant
#[utoipa::path(
    get,
    path = "/tenants/{tenant_id}/channels",
    params(
        ("tenant_id" = Uuid, Path, description = "Tenant whose channels to list"),
        ("include_inactive" = Option<bool>, Query, description = "Include inactive channels")
    ),
    responses(
        (status = 200, description = "Channels in creation order", body = ChannelsResponse),
        (status = 404, description = "Tenant not found", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "channels"
)]
pub async fn list_channels(
    State(state): State<AppState>,
    Path(tenant_id): Path<Uuid>,
    Query(params): Query<ListChannelsQuery>,
) -> Result<Json<ChannelsResponse>, ApiError> {
    ensure_tenant_exists(&state.db, tenant_id).await?;

    let repo = ChannelRepository::new(&state.db);
    let channels = if params.include_inactive.unwrap_or(false) {
        repo.list_all(tenant_id).await?
    } else {
        repo.list_active(tenant_id).await?
    };

    Ok(Json(ChannelsResponse {
        channels: channels.into_iter().map(ChannelInfo::from).collect(),
    }))
}
