//! # Event Normalizer
//!
//! Turns raw, source-shaped events into canonical candidates: timestamps
//! parsed to UTC, sport labels classified into the closed set, and channel
//! names resolved to channel ids. Every source is held to the same rules
//! here, so an event that survives normalization is safe to persist
//! regardless of which adapter produced it.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use crate::ingest::resolve;
use crate::models::channel::Model as Channel;
use crate::sources::{FallbackPolicy, RawEvent};
use crate::sports::{self, SportType};

/// A normalized event ready for deduplication and insert. Has no id; ids
/// are assigned at insert time.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateEvent {
    pub source_slug: String,
    pub title: String,
    pub sport_type: SportType,
    pub league: Option<String>,
    pub home_team: Option<String>,
    pub away_team: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub channel_id: Uuid,
    pub description: Option<String>,
}

/// Why a raw event was rejected during normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    UnparseableTime,
    UnresolvedChannel,
}

/// Per-source tallies from one normalization pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct NormalizeStats {
    pub accepted: u32,
    pub unparseable_time: u32,
    pub unresolved_channel: u32,
    pub channel_fallbacks: u32,
}

/// Parse an upstream timestamp.
///
/// Sources disagree about formats: RFC 3339 with offset, naive ISO with or
/// without seconds, a space instead of the `T`, or a bare date. Naive
/// values are taken as UTC; a bare date means midnight.
pub fn parse_event_time(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(instant) = DateTime::parse_from_rfc3339(value) {
        return Some(instant.with_timezone(&Utc));
    }

    for format in [
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
    ] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Some(naive.and_utc());
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
    }

    None
}

fn trimmed(value: &str) -> String {
    value.trim().to_string()
}

fn trimmed_opt(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
}

/// Normalize one raw event against the tenant's channels.
///
/// The boolean in the success case reports whether the channel was bound by
/// the source's FirstActive fallback rather than an actual match.
pub fn normalize(
    raw: &RawEvent,
    channels: &[Channel],
    policy: FallbackPolicy,
) -> Result<(CandidateEvent, bool), RejectReason> {
    let start_time = parse_event_time(&raw.start_time).ok_or(RejectReason::UnparseableTime)?;

    // A bad end time never sinks the event.
    let end_time = raw
        .end_time
        .as_deref()
        .and_then(parse_event_time)
        .filter(|end| *end > start_time);

    let (channel, used_fallback) = match resolve::resolve(&raw.channel_name, channels) {
        Some(channel) => (channel, false),
        None => match policy {
            FallbackPolicy::Drop => return Err(RejectReason::UnresolvedChannel),
            FallbackPolicy::FirstActive => {
                let first = channels.first().ok_or(RejectReason::UnresolvedChannel)?;
                (first, true)
            }
        },
    };

    Ok((
        CandidateEvent {
            source_slug: String::new(),
            title: trimmed(&raw.title),
            sport_type: sports::classify_sport_label(&raw.sport_type),
            league: trimmed_opt(&raw.league),
            home_team: trimmed_opt(&raw.home_team),
            away_team: trimmed_opt(&raw.away_team),
            start_time,
            end_time,
            channel_id: channel.id,
            description: trimmed_opt(&raw.description),
        },
        used_fallback,
    ))
}

/// Normalize everything one source fetched, tallying rejects and fallbacks.
pub fn normalize_batch(
    source_slug: &str,
    raw_events: Vec<RawEvent>,
    channels: &[Channel],
    policy: FallbackPolicy,
) -> (Vec<CandidateEvent>, NormalizeStats) {
    let mut candidates = Vec::with_capacity(raw_events.len());
    let mut stats = NormalizeStats::default();

    for raw in &raw_events {
        match normalize(raw, channels, policy) {
            Ok((mut candidate, used_fallback)) => {
                candidate.source_slug = source_slug.to_string();
                stats.accepted += 1;
                if used_fallback {
                    stats.channel_fallbacks += 1;
                }
                candidates.push(candidate);
            }
            Err(RejectReason::UnparseableTime) => {
                debug!(source = source_slug, title = %raw.title, start_time = %raw.start_time,
                    "rejecting event with unparseable start time");
                stats.unparseable_time += 1;
            }
            Err(RejectReason::UnresolvedChannel) => {
                debug!(source = source_slug, title = %raw.title, channel = %raw.channel_name,
                    "rejecting event with unresolved channel");
                stats.unresolved_channel += 1;
            }
        }
    }

    (candidates, stats)
}
