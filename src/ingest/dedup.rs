//! # Deduplicator
//!
//! Identity-key based duplicate filtering. The key is textual and total:
//! lowercased trimmed title, RFC 3339 start instant, and the two team
//! names with absent teams as empty strings. The same recipe feeds the
//! store-level digest column, so in-memory filtering and the database
//! uniqueness guard always agree about what "the same event" means.

use std::collections::HashSet;

use chrono::{DateTime, SecondsFormat, Utc};
use sha2::{Digest, Sha256};

use crate::ingest::normalize::CandidateEvent;
use crate::models::event::Model as Event;

/// Compose the identity key. Casing differences between sources in team
/// names are an accepted limitation; only the title is case-folded.
pub fn identity_key(
    title: &str,
    start_time: DateTime<Utc>,
    home_team: Option<&str>,
    away_team: Option<&str>,
) -> String {
    format!(
        "{}|{}|{}|{}",
        title.trim().to_lowercase(),
        start_time.to_rfc3339_opts(SecondsFormat::Secs, true),
        home_team.unwrap_or(""),
        away_team.unwrap_or(""),
    )
}

/// Hex SHA-256 of the identity key, stored alongside each event to back
/// the partial unique index.
pub fn dedupe_digest(key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(key.as_bytes());
    hex::encode(hasher.finalize())
}

pub fn candidate_key(candidate: &CandidateEvent) -> String {
    identity_key(
        &candidate.title,
        candidate.start_time,
        candidate.home_team.as_deref(),
        candidate.away_team.as_deref(),
    )
}

pub fn event_key(event: &Event) -> String {
    identity_key(
        &event.title,
        event.start_time.with_timezone(&Utc),
        event.home_team.as_deref(),
        event.away_team.as_deref(),
    )
}

#[derive(Debug)]
pub struct DedupOutcome {
    pub survivors: Vec<CandidateEvent>,
    pub duplicates: u32,
}

/// Filter candidates against events already stored in the window and
/// against each other.
///
/// Pure and order-stable: the first candidate with a given key survives,
/// so adapter precedence is whatever order the caller assembled. Every
/// dropped candidate counts as one duplicate.
pub fn filter_candidates(candidates: Vec<CandidateEvent>, existing: &[Event]) -> DedupOutcome {
    let mut seen: HashSet<String> = existing.iter().map(event_key).collect();
    let mut survivors = Vec::with_capacity(candidates.len());
    let mut duplicates = 0;

    for candidate in candidates {
        if seen.insert(candidate_key(&candidate)) {
            survivors.push(candidate);
        } else {
            duplicates += 1;
        }
    }

    DedupOutcome {
        survivors,
        duplicates,
    }
}
