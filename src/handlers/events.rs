//! # Event Handlers
//!
//! This module contains the listing endpoint for ingested events, with
//! window, sport, and channel filters plus cursor pagination in guide
//! order (start time ascending).

use axum::extract::{Path, Query, State};
use axum::response::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::cursor::{decode_cursor, encode_cursor};
use crate::error::{ApiError, validation_error};
use crate::handlers::ensure_tenant_exists;
use crate::models::event;
use crate::repositories::EventRepository;
use crate::server::AppState;
use crate::sports;

const DEFAULT_EVENTS_LIMIT: u32 = 50;
const MAX_EVENTS_LIMIT: u32 = 200;

/// Query parameters for listing events
#[derive(Debug, Deserialize)]
pub struct ListEventsQuery {
    /// Filter by canonical sport type (e.g. football, tennis)
    pub sport: Option<String>,
    /// Filter by channel ID (UUID)
    pub channel_id: Option<String>,
    /// Only events starting at or after this timestamp (RFC3339)
    pub starts_after: Option<String>,
    /// Only events starting at or before this timestamp (RFC3339)
    pub starts_before: Option<String>,
    /// Include events a curator has hidden (default: false)
    pub include_hidden: Option<bool>,
    /// Maximum number of events to return (default: 50, max: 200)
    pub limit: Option<u32>,
    /// Opaque cursor for pagination
    pub cursor: Option<String>,
}

/// One ingested event
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct EventInfo {
    /// Unique identifier for the event
    #[schema(example = "550e8400-e29b-41d4-a716-446655440000")]
    pub id: String,
    /// Channel the event airs on
    #[schema(example = "550e8400-e29b-41d4-a716-446655440001")]
    pub channel_id: String,
    /// Event title
    #[schema(example = "Arsenal vs Chelsea")]
    pub title: String,
    /// Canonical sport type
    #[schema(example = "football")]
    pub sport_type: String,
    /// Competition name, when known
    #[schema(example = "Premier League")]
    pub league: Option<String>,
    /// Home team, when known
    #[schema(example = "Arsenal")]
    pub home_team: Option<String>,
    /// Away team, when known
    #[schema(example = "Chelsea")]
    pub away_team: Option<String>,
    /// Scheduled start time
    #[schema(example = "2025-03-01T15:00:00Z")]
    pub start_time: String,
    /// Scheduled end time, when known
    #[schema(example = "2025-03-01T17:00:00Z")]
    pub end_time: Option<String>,
    /// Free-text description from the source
    pub description: Option<String>,
    /// Whether a curator featured this event
    pub is_featured: bool,
    /// Whether a curator hid this event
    pub is_hidden: bool,
    /// Slug of the source that ingested the event
    #[schema(example = "sports_db")]
    pub source_slug: String,
}

/// Response payload for the events listing endpoint
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct EventsResponse {
    /// Events matching the query, in guide order
    pub events: Vec<EventInfo>,
    /// Opaque cursor for fetching the next page (null if no more pages)
    pub next_cursor: Option<String>,
}

impl From<event::Model> for EventInfo {
    fn from(model: event::Model) -> Self {
        Self {
            id: model.id.to_string(),
            channel_id: model.channel_id.to_string(),
            title: model.title,
            sport_type: model.sport_type,
            league: model.league,
            home_team: model.home_team,
            away_team: model.away_team,
            start_time: model.start_time.to_rfc3339(),
            end_time: model.end_time.map(|dt| dt.to_rfc3339()),
            description: model.description,
            is_featured: model.is_featured,
            is_hidden: model.is_hidden,
            source_slug: model.source_slug,
        }
    }
}

/// List events for a tenant with filters and cursor pagination
#[utoipa::path(
    get,
    path = "/tenants/{tenant_id}/events",
    params(
        ("tenant_id" = Uuid, Path, description = "Tenant whose events to list"),
        ("sport" = Option<String>, Query, description = "Filter by canonical sport type"),
        ("channel_id" = Option<String>, Query, description = "Filter by channel ID (UUID)"),
        ("starts_after" = Option<String>, Query, description = "Only events starting at or after this RFC3339 timestamp"),
        ("starts_before" = Option<String>, Query, description = "Only events starting at or before this RFC3339 timestamp"),
        ("include_hidden" = Option<bool>, Query, description = "Include curator-hidden events"),
        ("limit" = Option<u32>, Query, description = "Maximum number of events to return (default 50, max 200)"),
        ("cursor" = Option<String>, Query, description = "Pagination cursor from a previous page")
    ),
    responses(
        (status = 200, description = "Events in guide order", body = EventsResponse),
        (status = 400, description = "Invalid query parameters", body = ApiError),
        (status = 404, description = "Tenant not found", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "events"
)]
pub async fn list_events(
    State(state): State<AppState>,
    Path(tenant_id): Path<Uuid>,
    Query(params): Query<ListEventsQuery>,
) -> Result<Json<EventsResponse>, ApiError> {
    ensure_tenant_exists(&state.db, tenant_id).await?;

    let limit = match params.limit {
        Some(0) => {
            return Err(validation_error(
                "Invalid limit",
                serde_json::json!({ "limit": "Minimum allowed limit is 1" }),
            ));
        }
        Some(value) if value > MAX_EVENTS_LIMIT => {
            return Err(validation_error(
                "Invalid limit",
                serde_json::json!({ "limit": format!("Maximum allowed limit is {}", MAX_EVENTS_LIMIT) }),
            ));
        }
        Some(value) => value,
        None => DEFAULT_EVENTS_LIMIT,
    };

    let sport_filter = if let Some(sport) = &params.sport {
        match sports::parse_sport_type(sport) {
            Some(sport_type) => Some(sport_type.as_str().to_string()),
            None => {
                return Err(validation_error(
                    "Invalid sport",
                    serde_json::json!({
                        "sport": format!(
                            "Must be one of: {}",
                            sports::ALL_SPORT_TYPES
                                .iter()
                                .map(|s| s.as_str())
                                .collect::<Vec<_>>()
                                .join(", ")
                        )
                    }),
                ));
            }
        }
    } else {
        None
    };

    let channel_filter = if let Some(channel_str) = &params.channel_id {
        Some(Uuid::parse_str(channel_str).map_err(|_| {
            validation_error(
                "Invalid channel_id",
                serde_json::json!({ "channel_id": "Must be a valid UUID" }),
            )
        })?)
    } else {
        None
    };

    let starts_after = parse_timestamp_param(&params.starts_after, "starts_after")?;
    let starts_before = parse_timestamp_param(&params.starts_before, "starts_before")?;

    let cursor_data = if let Some(cursor_str) = &params.cursor {
        Some(decode_cursor(cursor_str)?)
    } else {
        None
    };

    let events = EventRepository::new(&state.db)
        .list_events(
            tenant_id,
            sport_filter,
            channel_filter,
            starts_after,
            starts_before,
            params.include_hidden.unwrap_or(false),
            cursor_data,
            i64::from(limit),
        )
        .await?;

    let next_cursor = if events.len() == limit as usize {
        events
            .last()
            .map(|last| encode_cursor(&last.start_time.with_timezone(&Utc), &last.id))
    } else {
        None
    };

    Ok(Json(EventsResponse {
        events: events.into_iter().map(EventInfo::from).collect(),
        next_cursor,
    }))
}

pub(crate) fn parse_timestamp_param(
    value: &Option<String>,
    field: &str,
) -> Result<Option<DateTime<Utc>>, ApiError> {
    match value {
        Some(raw) => DateTime::parse_from_rfc3339(raw)
            .map(|dt| Some(dt.with_timezone(&Utc)))
            .map_err(|_| {
                validation_error(
                    &format!("Invalid {}", field),
                    serde_json::json!({
                        field: "Must be a valid ISO 8601 timestamp (RFC 3339)"
                    }),
                )
            }),
        None => Ok(None),
    }
}
