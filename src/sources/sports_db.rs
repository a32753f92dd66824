//! # TheSportsDB Source
//!
//! Day-by-day sweep of TheSportsDB `eventsday.php` endpoint across the
//! ingestion window. Rows are kept only when the upstream marks them as
//! broadcast in the configured country with a named channel; rows without a
//! usable event date count as skipped. A failed day is recorded and the
//! sweep continues, but when every day fails the fetch surfaces the last
//! error so the run report shows the source as failed rather than empty.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use tracing::debug;

use crate::config::IngestConfig;
use crate::sources::registry::Registry;
use crate::sources::trait_::parse_retry_after;
use crate::sources::{
    FallbackPolicy, FetchContext, FetchOutcome, RawEvent, SourceAdapter, SourceError,
    SourceMetadata,
};

pub const SPORTS_DB_SOURCE_SLUG: &str = "sports_db";

const DEFAULT_KICKOFF_TIME: &str = "15:00:00";

#[derive(Debug, serde::Deserialize)]
struct SportsDbRow {
    #[serde(rename = "strEvent", default)]
    event: Option<String>,
    #[serde(rename = "strSport", default)]
    sport: Option<String>,
    #[serde(rename = "strLeague", default)]
    league: Option<String>,
    #[serde(rename = "strHomeTeam", default)]
    home_team: Option<String>,
    #[serde(rename = "strAwayTeam", default)]
    away_team: Option<String>,
    #[serde(rename = "dateEvent", default)]
    date_event: Option<String>,
    #[serde(rename = "strTime", default)]
    time: Option<String>,
    #[serde(rename = "strChannel", default)]
    channel: Option<String>,
    #[serde(rename = "strCountry", default)]
    country: Option<String>,
}

pub struct SportsDbSource {
    api_key: String,
    api_base: String,
    broadcast_country: String,
    backoff_every_days: u32,
    backoff_delay_ms: u64,
    client: reqwest::Client,
}

impl SportsDbSource {
    pub fn new(api_key: String, api_base: String, ingest: &IngestConfig) -> Self {
        Self {
            api_key,
            api_base,
            broadcast_country: ingest.broadcast_country.clone(),
            backoff_every_days: ingest.backoff_every_days,
            backoff_delay_ms: ingest.backoff_delay_ms,
            client: reqwest::Client::new(),
        }
    }

    async fn fetch_day(&self, day: NaiveDate) -> Result<Vec<SportsDbRow>, SourceError> {
        let url = format!(
            "{}/api/v1/json/{}/eventsday.php?d={}&s=Soccer",
            self.api_base,
            self.api_key,
            day.format("%Y-%m-%d"),
        );

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            let retry_after = parse_retry_after(response.headers());
            let body = response.text().await.unwrap_or_default();
            return Err(SourceError::from_http_status(status, &body, retry_after));
        }

        // The endpoint returns {"events": null} for days with no listings.
        #[derive(Debug, serde::Deserialize)]
        struct EventsDay {
            #[serde(default)]
            events: Option<Vec<SportsDbRow>>,
        }

        let payload: EventsDay = response
            .json()
            .await
            .map_err(|e| SourceError::malformed(format!("eventsday payload: {}", e)))?;

        Ok(payload.events.unwrap_or_default())
    }

    fn collect_rows(&self, rows: Vec<SportsDbRow>, outcome: &mut FetchOutcome) {
        for row in rows {
            // Rows outside the broadcast country, or without a channel, are
            // not listings for this pipeline at all.
            if row.country.as_deref() != Some(self.broadcast_country.as_str()) {
                continue;
            }
            let Some(channel) = row.channel.filter(|c| !c.trim().is_empty()) else {
                continue;
            };
            let Some(date_event) = row.date_event.filter(|d| !d.trim().is_empty()) else {
                outcome.skipped_at_source += 1;
                continue;
            };

            let home = row.home_team.filter(|s| !s.trim().is_empty());
            let away = row.away_team.filter(|s| !s.trim().is_empty());
            let title = match row.event.filter(|s| !s.trim().is_empty()) {
                Some(title) => title,
                None => format!(
                    "{} vs {}",
                    home.as_deref().unwrap_or("TBD"),
                    away.as_deref().unwrap_or("TBD")
                ),
            };

            let kickoff = row
                .time
                .as_deref()
                .filter(|t| !t.trim().is_empty())
                .unwrap_or(DEFAULT_KICKOFF_TIME);
            let start_time = format!("{}T{}", date_event, kickoff);

            let league = row.league.filter(|s| !s.trim().is_empty());

            outcome.events.push(RawEvent {
                title,
                sport_type: row.sport.unwrap_or_default(),
                league: Some(
                    league
                        .clone()
                        .unwrap_or_else(|| "Unknown League".to_string()),
                ),
                home_team: home,
                away_team: away,
                start_time,
                end_time: None,
                channel_name: channel,
                description: league,
            });
        }
    }
}

#[async_trait]
impl SourceAdapter for SportsDbSource {
    fn slug(&self) -> &'static str {
        SPORTS_DB_SOURCE_SLUG
    }

    async fn fetch(&self, ctx: &FetchContext) -> Result<FetchOutcome, SourceError> {
        let mut outcome = FetchOutcome::default();
        let mut last_error: Option<SourceError> = None;

        for (i, day) in ctx.window.days().into_iter().enumerate() {
            // The free tier throttles aggressively; pause every few days of
            // the sweep.
            if i > 0 && i % self.backoff_every_days as usize == 0 {
                tokio::time::sleep(Duration::from_millis(self.backoff_delay_ms)).await;
            }

            outcome.sources_consulted += 1;
            match self.fetch_day(day).await {
                Ok(rows) => self.collect_rows(rows, &mut outcome),
                Err(
                    err @ (SourceError::Auth { .. }
                    | SourceError::RateLimited { .. }
                    | SourceError::Config { .. }),
                ) => return Err(err),
                Err(err) => {
                    debug!(day = %day, "sports_db day fetch failed: {}", err);
                    outcome.failed_calls += 1;
                    last_error = Some(err);
                }
            }
        }

        if outcome.sources_consulted > 0 && outcome.failed_calls == outcome.sources_consulted {
            if let Some(err) = last_error {
                return Err(err);
            }
        }

        Ok(outcome)
    }
}

/// Register the TheSportsDB source with the given registry
pub fn register_sports_db_source(registry: &mut Registry, source: Arc<SportsDbSource>) {
    let metadata = SourceMetadata::new(
        SPORTS_DB_SOURCE_SLUG,
        "TheSportsDB",
        FallbackPolicy::Drop,
        true,
    );
    registry.register(source, metadata);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_source() -> SportsDbSource {
        SportsDbSource::new(
            "3".to_string(),
            "https://www.thesportsdb.com".to_string(),
            &IngestConfig::default(),
        )
    }

    fn uk_row() -> SportsDbRow {
        SportsDbRow {
            event: Some("Arsenal vs Chelsea".to_string()),
            sport: Some("Soccer".to_string()),
            league: Some("Premier League".to_string()),
            home_team: Some("Arsenal".to_string()),
            away_team: Some("Chelsea".to_string()),
            date_event: Some("2025-03-01".to_string()),
            time: Some("17:30:00".to_string()),
            channel: Some("Sky Sports Main Event".to_string()),
            country: Some("United Kingdom".to_string()),
        }
    }

    #[test]
    fn test_collect_rows_keeps_uk_broadcast_rows() {
        let source = test_source();
        let mut outcome = FetchOutcome::default();
        source.collect_rows(vec![uk_row()], &mut outcome);

        assert_eq!(outcome.events.len(), 1);
        let event = &outcome.events[0];
        assert_eq!(event.title, "Arsenal vs Chelsea");
        assert_eq!(event.start_time, "2025-03-01T17:30:00");
        assert_eq!(event.channel_name, "Sky Sports Main Event");
        assert_eq!(event.league.as_deref(), Some("Premier League"));
        assert_eq!(event.description.as_deref(), Some("Premier League"));
        assert_eq!(outcome.skipped_at_source, 0);
    }

    #[test]
    fn test_collect_rows_drops_foreign_and_channelless_rows() {
        let source = test_source();
        let mut outcome = FetchOutcome::default();

        let mut foreign = uk_row();
        foreign.country = Some("Spain".to_string());
        let mut unlisted = uk_row();
        unlisted.channel = None;

        source.collect_rows(vec![foreign, unlisted], &mut outcome);

        // Irrelevant rows are not listings, so they are not counted as
        // skipped either.
        assert!(outcome.events.is_empty());
        assert_eq!(outcome.skipped_at_source, 0);
    }

    #[test]
    fn test_collect_rows_counts_dateless_rows_as_skipped() {
        let source = test_source();
        let mut outcome = FetchOutcome::default();

        let mut dateless = uk_row();
        dateless.date_event = None;

        source.collect_rows(vec![dateless], &mut outcome);
        assert!(outcome.events.is_empty());
        assert_eq!(outcome.skipped_at_source, 1);
    }

    #[test]
    fn test_collect_rows_title_and_kickoff_fallbacks() {
        let source = test_source();
        let mut outcome = FetchOutcome::default();

        let mut row = uk_row();
        row.event = None;
        row.away_team = None;
        row.time = None;
        row.league = None;

        source.collect_rows(vec![row], &mut outcome);
        let event = &outcome.events[0];
        assert_eq!(event.title, "Arsenal vs TBD");
        assert_eq!(event.start_time, "2025-03-01T15:00:00");
        assert_eq!(event.league.as_deref(), Some("Unknown League"));
        assert!(event.description.is_none());
    }

    #[test]
    fn test_row_deserializes_from_upstream_shape() {
        let json = r#"{
            "strEvent": "Liverpool vs Everton",
            "strSport": "Soccer",
            "strLeague": "Premier League",
            "strHomeTeam": "Liverpool",
            "strAwayTeam": "Everton",
            "dateEvent": "2025-03-02",
            "strTime": "12:30:00",
            "strChannel": "Sky Sports Premier League",
            "strCountry": "United Kingdom",
            "idEvent": "2052711"
        }"#;

        let row: SportsDbRow = serde_json::from_str(json).unwrap();
        assert_eq!(row.event.as_deref(), Some("Liverpool vs Everton"));
        assert_eq!(row.country.as_deref(), Some("United Kingdom"));
    }
}
