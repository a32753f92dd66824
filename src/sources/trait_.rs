//! # Source Adapter Trait
//!
//! This module defines the core `SourceAdapter` trait that all upstream
//! fetchers implement, together with the shared types that flow between the
//! orchestrator and the adapters: the ingestion window, the per-run fetch
//! context, the raw (pre-normalization) event shape, and the adapter error
//! taxonomy.

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::models::channel::Model as Channel;

/// Half-open time range `[start, end)` covered by one ingestion run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl IngestWindow {
    /// Build a window starting now and extending `days` into the future.
    pub fn from_now(days: u32) -> Self {
        let start = Utc::now();
        Self {
            start,
            end: start + Duration::days(i64::from(days)),
        }
    }

    /// The calendar dates covered by the window, in order. Used by adapters
    /// whose upstream API is keyed by day rather than by range.
    pub fn days(&self) -> Vec<NaiveDate> {
        let mut days = Vec::new();
        let mut day = self.start.date_naive();
        while day < self.end.date_naive() {
            days.push(day);
            day += Duration::days(1);
        }
        days.push(self.end.date_naive());
        days
    }

    /// Whether `when` falls inside the window.
    pub fn contains(&self, when: DateTime<Utc>) -> bool {
        when >= self.start && when < self.end
    }
}

/// Everything an adapter gets to see for one fetch call.
///
/// The channel list is the tenant's active channels at the start of the run;
/// adapters that build prompts or match channel names read it, the rest
/// ignore it. The database handle is only populated for adapters that read
/// tenant-scoped configuration (the web scraper's source catalog).
#[derive(Clone)]
pub struct FetchContext {
    pub tenant_id: Uuid,
    pub window: IngestWindow,
    pub channels: Vec<Channel>,
    pub db: Option<DatabaseConnection>,
}

impl FetchContext {
    pub fn new(tenant_id: Uuid, window: IngestWindow, channels: Vec<Channel>) -> Self {
        Self {
            tenant_id,
            window,
            channels,
            db: None,
        }
    }

    pub fn with_db(mut self, db: DatabaseConnection) -> Self {
        self.db = Some(db);
        self
    }
}

/// An event as an adapter saw it upstream, before normalization.
///
/// `sport_type` and `start_time` are raw strings here on purpose: parsing
/// and classification happen in one place (the normalizer) so every source
/// is held to the same rules.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawEvent {
    pub title: String,
    #[serde(default)]
    pub sport_type: String,
    #[serde(default)]
    pub league: Option<String>,
    #[serde(default)]
    pub home_team: Option<String>,
    #[serde(default)]
    pub away_team: Option<String>,
    pub start_time: String,
    #[serde(default)]
    pub end_time: Option<String>,
    pub channel_name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// What one adapter produced for one run.
#[derive(Debug, Clone, Default)]
pub struct FetchOutcome {
    /// Events that passed the adapter's own shape checks.
    pub events: Vec<RawEvent>,
    /// Candidates the adapter saw upstream but dropped before returning
    /// (missing title, unparseable payload rows, over-cap scrape hits).
    pub skipped_at_source: u32,
    /// Upstream calls that failed without failing the whole fetch
    /// (a single bad day in a day-by-day sweep, one unreachable page).
    pub failed_calls: u32,
    /// Distinct upstream endpoints or pages consulted.
    pub sources_consulted: u32,
}

impl FetchOutcome {
    pub fn from_events(events: Vec<RawEvent>) -> Self {
        Self {
            events,
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

fn display_retry(secs: &Option<u64>) -> String {
    match secs {
        Some(s) => format!("{}s", s),
        None => "unspecified".to_string(),
    }
}

/// Errors an adapter can surface to the orchestrator.
///
/// The variants deliberately mirror how the run report classifies source
/// trouble: `Unavailable` and `RateLimited` mean "try again later",
/// `Malformed` means the upstream answered but we could not use the answer,
/// `Auth` and `Config` mean operator action is needed.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("source unavailable: {message}")]
    Unavailable { message: String },

    #[error("source returned malformed data: {message}")]
    Malformed { message: String },

    #[error("rate limited by upstream (retry after: {})", display_retry(.retry_after_secs))]
    RateLimited { retry_after_secs: Option<u64> },

    #[error("authentication rejected by upstream: {message}")]
    Auth { message: String },

    #[error("adapter misconfigured: {message}")]
    Config { message: String },
}

impl SourceError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed {
            message: message.into(),
        }
    }

    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth {
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Classify a non-success HTTP response. The body snippet is truncated
    /// before it reaches logs or reports.
    pub fn from_http_status(
        status: reqwest::StatusCode,
        body: &str,
        retry_after: Option<u64>,
    ) -> Self {
        match status.as_u16() {
            401 | 403 => Self::Auth {
                message: format!("upstream returned {}: {}", status, snippet(body)),
            },
            429 => Self::RateLimited {
                retry_after_secs: retry_after,
            },
            _ => Self::Unavailable {
                message: format!("upstream returned {}: {}", status, snippet(body)),
            },
        }
    }
}

impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() || err.is_connect() {
            Self::Unavailable {
                message: err.to_string(),
            }
        } else if err.is_decode() {
            Self::Malformed {
                message: err.to_string(),
            }
        } else {
            Self::Unavailable {
                message: err.to_string(),
            }
        }
    }
}

/// Truncate an upstream body for inclusion in an error message.
pub(crate) fn snippet(body: &str) -> String {
    const MAX: usize = 200;
    let trimmed = body.trim();
    if trimmed.len() <= MAX {
        trimmed.to_string()
    } else {
        let mut cut = MAX;
        while !trimmed.is_char_boundary(cut) {
            cut -= 1;
        }
        format!("{}...", &trimmed[..cut])
    }
}

/// Parse a `Retry-After` header value in delta-seconds form.
pub(crate) fn parse_retry_after(headers: &reqwest::header::HeaderMap) -> Option<u64> {
    headers
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
}

/// One upstream source of broadcast events.
///
/// Implementations must be self-contained per call: the orchestrator runs
/// adapters concurrently and enforces its own timeout around `fetch`, so an
/// adapter should never retry indefinitely or hold state between runs.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Stable identifier used in reports, metrics, and registry lookups.
    fn slug(&self) -> &'static str;

    /// Fetch raw events for the tenant and window in `ctx`.
    async fn fetch(&self, ctx: &FetchContext) -> Result<FetchOutcome, SourceError>;
}
