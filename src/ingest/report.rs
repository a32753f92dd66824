//! # Ingest Run Report
//!
//! The structured result of one ingestion run: what each source produced,
//! what was inserted and skipped, and a taxonomy of the problems seen along
//! the way. The report is returned to API callers verbatim and persisted
//! with the run record, so everything here serializes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::sources::{FetchOutcome, SourceError};

/// How one source's fetch concluded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SourceStatus {
    /// The source returned at least one raw event.
    Used,
    /// The source answered but had nothing for the window.
    Empty,
    /// The fetch errored or timed out.
    Failed,
}

/// Per-source slice of the run report.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SourceReport {
    pub slug: String,
    pub status: SourceStatus,
    /// Raw events the source returned.
    pub fetched: u32,
    /// Candidates the source itself dropped before returning.
    pub skipped_at_source: u32,
    /// Upstream calls that failed without failing the fetch.
    pub failed_calls: u32,
    /// Distinct upstream endpoints or pages consulted.
    pub sources_consulted: u32,
    /// Events bound to the first active channel instead of a resolved one.
    pub channel_fallbacks: u32,
}

impl SourceReport {
    pub fn from_outcome(slug: &str, outcome: &FetchOutcome) -> Self {
        let status = if outcome.events.is_empty() {
            SourceStatus::Empty
        } else {
            SourceStatus::Used
        };
        Self {
            slug: slug.to_string(),
            status,
            fetched: outcome.events.len() as u32,
            skipped_at_source: outcome.skipped_at_source,
            failed_calls: outcome.failed_calls,
            sources_consulted: outcome.sources_consulted,
            channel_fallbacks: 0,
        }
    }

    pub fn failed(slug: &str) -> Self {
        Self {
            slug: slug.to_string(),
            status: SourceStatus::Failed,
            fetched: 0,
            skipped_at_source: 0,
            failed_calls: 0,
            sources_consulted: 0,
            channel_fallbacks: 0,
        }
    }
}

/// Problem classification for report entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    SourceUnavailable,
    SourceMalformed,
    SourceTimeout,
    UnresolvedChannel,
    UnparseableTime,
    PersistenceFailure,
}

impl From<&SourceError> for IssueKind {
    fn from(err: &SourceError) -> Self {
        match err {
            SourceError::Malformed { .. } => IssueKind::SourceMalformed,
            _ => IssueKind::SourceUnavailable,
        }
    }
}

/// One recorded problem, attributed to a source when there is one.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Issue {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    pub kind: IssueKind,
    pub detail: String,
}

impl Issue {
    pub fn source_issue(slug: &str, kind: IssueKind, detail: impl Into<String>) -> Self {
        Self {
            source: Some(slug.to_string()),
            kind,
            detail: detail.into(),
        }
    }

    pub fn run_issue(kind: IssueKind, detail: impl Into<String>) -> Self {
        Self {
            source: None,
            kind,
            detail: detail.into(),
        }
    }
}

/// Full result of one ingestion run.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct IngestReport {
    pub run_id: Uuid,
    pub tenant_id: Uuid,
    pub window_start: DateTime<Utc>,
    pub window_end: DateTime<Utc>,
    /// Events actually written, from the insert's affected-row count.
    pub inserted_count: u32,
    /// Normalization rejects plus dedup drops plus conflict-raced rows.
    pub skipped_count: u32,
    pub sources: Vec<SourceReport>,
    /// Inserted events per canonical sport.
    pub sport_breakdown: BTreeMap<String, u32>,
    pub issues: Vec<Issue>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::RawEvent;

    #[test]
    fn test_source_report_status_from_outcome() {
        let empty = FetchOutcome::default();
        let report = SourceReport::from_outcome("sports_db", &empty);
        assert_eq!(report.status, SourceStatus::Empty);
        assert_eq!(report.fetched, 0);

        let outcome = FetchOutcome {
            events: vec![RawEvent {
                title: "Arsenal vs Chelsea".to_string(),
                start_time: "2025-03-01T15:00:00Z".to_string(),
                channel_name: "Sky Sports".to_string(),
                ..Default::default()
            }],
            skipped_at_source: 2,
            failed_calls: 1,
            sources_consulted: 29,
        };
        let report = SourceReport::from_outcome("sports_db", &outcome);
        assert_eq!(report.status, SourceStatus::Used);
        assert_eq!(report.fetched, 1);
        assert_eq!(report.skipped_at_source, 2);
        assert_eq!(report.failed_calls, 1);
        assert_eq!(report.sources_consulted, 29);
    }

    #[test]
    fn test_issue_kind_from_source_error() {
        assert_eq!(
            IssueKind::from(&SourceError::malformed("bad json")),
            IssueKind::SourceMalformed
        );
        assert_eq!(
            IssueKind::from(&SourceError::unavailable("timeout")),
            IssueKind::SourceUnavailable
        );
        assert_eq!(
            IssueKind::from(&SourceError::auth("bad key")),
            IssueKind::SourceUnavailable
        );
        assert_eq!(
            IssueKind::from(&SourceError::RateLimited {
                retry_after_secs: Some(30)
            }),
            IssueKind::SourceUnavailable
        );
    }

    #[test]
    fn test_issue_kind_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&IssueKind::UnresolvedChannel).unwrap(),
            "\"unresolved_channel\""
        );
        assert_eq!(
            serde_json::to_string(&SourceStatus::Failed).unwrap(),
            "\"failed\""
        );
    }

    #[test]
    fn test_report_round_trips_through_json() {
        let mut breakdown = BTreeMap::new();
        breakdown.insert("football".to_string(), 12u32);
        breakdown.insert("rugby".to_string(), 2u32);

        let report = IngestReport {
            run_id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            window_start: Utc::now(),
            window_end: Utc::now(),
            inserted_count: 14,
            skipped_count: 3,
            sources: vec![SourceReport::failed("llm_search")],
            sport_breakdown: breakdown,
            issues: vec![Issue::source_issue(
                "llm_search",
                IssueKind::SourceTimeout,
                "timed out after 45s",
            )],
        };

        let json = serde_json::to_string(&report).unwrap();
        let parsed: IngestReport = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.inserted_count, 14);
        assert_eq!(parsed.sources[0].slug, "llm_search");
        assert_eq!(parsed.issues[0].kind, IssueKind::SourceTimeout);
        assert_eq!(parsed.sport_breakdown.get("football"), Some(&12));
    }
}
