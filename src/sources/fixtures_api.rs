//! # API-Football Fixtures Source
//!
//! Single range query against the API-Football v3 `fixtures` endpoint for
//! the configured league. The upstream has no broadcast data, so every
//! fixture is attributed to the configured default channel. API-Football
//! reports key and quota problems inside a 200 response body, so the
//! `errors` object is checked before any fixture is read.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Datelike;
use tracing::debug;

use crate::config::IngestConfig;
use crate::sources::registry::Registry;
use crate::sources::trait_::parse_retry_after;
use crate::sources::{
    FallbackPolicy, FetchContext, FetchOutcome, IngestWindow, RawEvent, SourceAdapter,
    SourceError, SourceMetadata,
};

pub const FIXTURES_API_SOURCE_SLUG: &str = "fixtures_api";

#[derive(Debug, serde::Deserialize)]
struct FixtureRow {
    fixture: FixtureInfo,
    league: LeagueInfo,
    teams: Teams,
}

#[derive(Debug, serde::Deserialize)]
struct FixtureInfo {
    date: String,
}

#[derive(Debug, serde::Deserialize)]
struct LeagueInfo {
    name: String,
    #[serde(default)]
    round: Option<String>,
}

#[derive(Debug, serde::Deserialize)]
struct Teams {
    home: TeamRef,
    away: TeamRef,
}

#[derive(Debug, serde::Deserialize)]
struct TeamRef {
    name: String,
}

pub struct FixturesApiSource {
    api_key: String,
    api_base: String,
    league_id: u32,
    season: Option<i32>,
    channel_name: String,
    client: reqwest::Client,
}

impl FixturesApiSource {
    pub fn new(api_key: String, api_base: String, ingest: &IngestConfig) -> Self {
        Self {
            api_key,
            api_base,
            league_id: ingest.football_league_id,
            season: ingest.football_season,
            channel_name: ingest.fixtures_channel_name.clone(),
            client: reqwest::Client::new(),
        }
    }

    /// API-Football seasons are labelled by starting year; without explicit
    /// configuration, the window's starting year is close enough for a
    /// forward-looking window.
    fn season_for(&self, window: &IngestWindow) -> i32 {
        self.season.unwrap_or_else(|| window.start.year())
    }

    fn convert_fixture(&self, value: serde_json::Value) -> Option<RawEvent> {
        let row: FixtureRow = serde_json::from_value(value).ok()?;

        let title = format!("{} vs {}", row.teams.home.name, row.teams.away.name);
        let description = match row.league.round.as_deref() {
            Some(round) => format!("{} - Round {}", row.league.name, round),
            None => row.league.name.clone(),
        };

        Some(RawEvent {
            title,
            sport_type: "Football".to_string(),
            league: Some(row.league.name),
            home_team: Some(row.teams.home.name),
            away_team: Some(row.teams.away.name),
            start_time: row.fixture.date,
            end_time: None,
            channel_name: self.channel_name.clone(),
            description: Some(description),
        })
    }
}

/// Map a non-empty API-Football `errors` object to a source error.
fn classify_api_errors(errors: &serde_json::Value) -> Option<SourceError> {
    let map = errors.as_object()?;
    if map.is_empty() {
        return None;
    }

    let joined = map
        .values()
        .filter_map(|v| v.as_str())
        .collect::<Vec<_>>()
        .join("; ");

    if map.contains_key("token") {
        Some(SourceError::auth(format!(
            "API-Football rejected the key: {}",
            joined
        )))
    } else if map.contains_key("rateLimit") || map.contains_key("requests") {
        Some(SourceError::RateLimited {
            retry_after_secs: None,
        })
    } else {
        Some(SourceError::malformed(format!(
            "API-Football reported errors: {}",
            joined
        )))
    }
}

#[async_trait]
impl SourceAdapter for FixturesApiSource {
    fn slug(&self) -> &'static str {
        FIXTURES_API_SOURCE_SLUG
    }

    async fn fetch(&self, ctx: &FetchContext) -> Result<FetchOutcome, SourceError> {
        let url = format!(
            "{}/fixtures?league={}&season={}&from={}&to={}",
            self.api_base,
            self.league_id,
            self.season_for(&ctx.window),
            ctx.window.start.format("%Y-%m-%d"),
            ctx.window.end.format("%Y-%m-%d"),
        );

        let response = self
            .client
            .get(&url)
            .header("x-apisports-key", &self.api_key)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = parse_retry_after(response.headers());
            let body = response.text().await.unwrap_or_default();
            return Err(SourceError::from_http_status(status, &body, retry_after));
        }

        // `errors` is an empty array on success and an object on failure.
        #[derive(Debug, serde::Deserialize)]
        struct FixturesPayload {
            #[serde(default)]
            errors: serde_json::Value,
            #[serde(default)]
            response: Vec<serde_json::Value>,
        }

        let payload: FixturesPayload = response
            .json()
            .await
            .map_err(|e| SourceError::malformed(format!("fixtures payload: {}", e)))?;

        if let Some(err) = classify_api_errors(&payload.errors) {
            return Err(err);
        }

        let mut outcome = FetchOutcome {
            sources_consulted: 1,
            ..Default::default()
        };

        for value in payload.response {
            match self.convert_fixture(value) {
                Some(event) => outcome.events.push(event),
                None => {
                    debug!("fixtures_api row missing fixture, league, or team fields");
                    outcome.skipped_at_source += 1;
                }
            }
        }

        Ok(outcome)
    }
}

/// Register the API-Football source with the given registry
pub fn register_fixtures_api_source(registry: &mut Registry, source: Arc<FixturesApiSource>) {
    let metadata = SourceMetadata::new(
        FIXTURES_API_SOURCE_SLUG,
        "API-Football Fixtures",
        FallbackPolicy::Drop,
        true,
    );
    registry.register(source, metadata);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_source() -> FixturesApiSource {
        FixturesApiSource::new(
            "fk-test".to_string(),
            "https://v3.football.api-sports.io".to_string(),
            &IngestConfig::default(),
        )
    }

    #[test]
    fn test_convert_fixture_builds_event_with_default_channel() {
        let source = test_source();
        let value = serde_json::json!({
            "fixture": { "id": 1035043, "date": "2025-03-01T15:00:00+00:00" },
            "league": { "id": 39, "name": "Premier League", "round": "Regular Season - 27" },
            "teams": {
                "home": { "id": 42, "name": "Arsenal" },
                "away": { "id": 49, "name": "Chelsea" }
            }
        });

        let event = source.convert_fixture(value).unwrap();
        assert_eq!(event.title, "Arsenal vs Chelsea");
        assert_eq!(event.sport_type, "Football");
        assert_eq!(event.channel_name, "Sky Sports");
        assert_eq!(event.start_time, "2025-03-01T15:00:00+00:00");
        assert_eq!(
            event.description.as_deref(),
            Some("Premier League - Round Regular Season - 27")
        );
    }

    #[test]
    fn test_convert_fixture_rejects_incomplete_rows() {
        let source = test_source();
        let value = serde_json::json!({
            "fixture": { "date": "2025-03-01T15:00:00+00:00" },
            "league": { "name": "Premier League" }
        });
        assert!(source.convert_fixture(value).is_none());
    }

    #[test]
    fn test_classify_api_errors() {
        assert!(classify_api_errors(&serde_json::json!([])).is_none());
        assert!(classify_api_errors(&serde_json::json!({})).is_none());

        let auth = classify_api_errors(&serde_json::json!({
            "token": "Error/Missing application key."
        }));
        assert!(matches!(auth, Some(SourceError::Auth { .. })));

        let limited = classify_api_errors(&serde_json::json!({
            "requests": "You have reached the request limit for the day."
        }));
        assert!(matches!(limited, Some(SourceError::RateLimited { .. })));

        let other = classify_api_errors(&serde_json::json!({
            "season": "The Season field must contain a year."
        }));
        assert!(matches!(other, Some(SourceError::Malformed { .. })));
    }

    #[test]
    fn test_season_falls_back_to_window_year() {
        let mut ingest = IngestConfig::default();
        ingest.football_season = None;
        let source = FixturesApiSource::new(
            "fk".to_string(),
            "https://v3.football.api-sports.io".to_string(),
            &ingest,
        );

        let window = IngestWindow::from_now(28);
        assert_eq!(source.season_for(&window), window.start.year());

        ingest.football_season = Some(2024);
        let pinned = FixturesApiSource::new(
            "fk".to_string(),
            "https://v3.football.api-sports.io".to_string(),
            &ingest,
        );
        assert_eq!(pinned.season_for(&window), 2024);
    }
}
