//! # Synthetic Source
//!
//! Generates a plausible broadcast schedule when no live source is
//! configured, so a fresh install still has data to exercise the pipeline
//! against. Weekends are busier than weekdays, kickoffs land on quarter
//! hours in the afternoon and evening, and channel names are drawn from the
//! tenant's own channel list so resolution always succeeds. Registration is
//! gated by the registry: this source must never stand in for a configured
//! live adapter.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate, Weekday};
use rand::Rng;

use crate::sources::registry::Registry;
use crate::sources::{
    FallbackPolicy, FetchContext, FetchOutcome, RawEvent, SourceAdapter, SourceError,
    SourceMetadata,
};
use crate::sports::SportType;

pub const SYNTHETIC_SOURCE_SLUG: &str = "synthetic";

const FOOTBALL_LEAGUES: &[&str] = &[
    "Premier League",
    "La Liga",
    "Serie A",
    "Bundesliga",
];

const PREMIER_LEAGUE_TEAMS: &[&str] = &[
    "Arsenal",
    "Chelsea",
    "Liverpool",
    "Manchester United",
    "Manchester City",
    "Tottenham",
];

/// Occasional non-football filler, one pool of plausible titles per sport.
const SPECIAL_POOLS: &[(SportType, &[&str])] = &[
    (SportType::Tennis, &["ATP Tour Tennis", "WTA Tour Tennis"]),
    (SportType::Rugby, &["Six Nations Rugby", "Premiership Rugby"]),
    (SportType::Cricket, &["Test Match Cricket", "T20 Blast Cricket"]),
    (SportType::Boxing, &["Championship Boxing"]),
    (SportType::Formula1, &["Grand Prix Qualifying", "Grand Prix Race"]),
    (SportType::Golf, &["PGA Tour Golf"]),
];

const KICKOFF_MINUTES: &[u32] = &[0, 15, 30, 45];

fn events_for_day(day: NaiveDate) -> usize {
    match day.weekday() {
        Weekday::Sat | Weekday::Sun => 5,
        _ => 2,
    }
}

pub struct SyntheticSource;

impl SyntheticSource {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SyntheticSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SourceAdapter for SyntheticSource {
    fn slug(&self) -> &'static str {
        SYNTHETIC_SOURCE_SLUG
    }

    async fn fetch(&self, ctx: &FetchContext) -> Result<FetchOutcome, SourceError> {
        if ctx.channels.is_empty() {
            return Ok(FetchOutcome::default());
        }

        let mut rng = rand::thread_rng();
        let mut outcome = FetchOutcome::default();

        for day in ctx.window.days() {
            for _ in 0..events_for_day(day) {
                let hour = rng.gen_range(14..22);
                let minute = KICKOFF_MINUTES[rng.gen_range(0..KICKOFF_MINUTES.len())];
                let Some(start) = day
                    .and_hms_opt(hour, minute, 0)
                    .map(|naive| naive.and_utc())
                else {
                    continue;
                };
                // The first and last window days are partial; keep the
                // schedule strictly inside the window.
                if !ctx.window.contains(start) {
                    continue;
                }

                let channel = &ctx.channels[rng.gen_range(0..ctx.channels.len())];
                let start_time = start.format("%Y-%m-%dT%H:%M:00").to_string();

                // Roughly two thirds football, the rest drawn from the
                // specials pools.
                let event = if rng.gen_range(0..3) != 0 {
                    let league = FOOTBALL_LEAGUES[rng.gen_range(0..FOOTBALL_LEAGUES.len())];
                    if league == "Premier League" {
                        let home_idx = rng.gen_range(0..PREMIER_LEAGUE_TEAMS.len());
                        let mut away_idx = rng.gen_range(0..PREMIER_LEAGUE_TEAMS.len() - 1);
                        if away_idx >= home_idx {
                            away_idx += 1;
                        }
                        let home = PREMIER_LEAGUE_TEAMS[home_idx];
                        let away = PREMIER_LEAGUE_TEAMS[away_idx];
                        RawEvent {
                            title: format!("{}: {} vs {}", league, home, away),
                            sport_type: SportType::Football.as_str().to_string(),
                            league: Some(league.to_string()),
                            home_team: Some(home.to_string()),
                            away_team: Some(away.to_string()),
                            start_time,
                            end_time: None,
                            channel_name: channel.name.clone(),
                            description: None,
                        }
                    } else {
                        RawEvent {
                            title: format!("{} Match", league),
                            sport_type: SportType::Football.as_str().to_string(),
                            league: Some(league.to_string()),
                            home_team: None,
                            away_team: None,
                            start_time,
                            end_time: None,
                            channel_name: channel.name.clone(),
                            description: None,
                        }
                    }
                } else {
                    let (sport, titles) = SPECIAL_POOLS[rng.gen_range(0..SPECIAL_POOLS.len())];
                    RawEvent {
                        title: titles[rng.gen_range(0..titles.len())].to_string(),
                        sport_type: sport.as_str().to_string(),
                        league: None,
                        home_team: None,
                        away_team: None,
                        start_time,
                        end_time: None,
                        channel_name: channel.name.clone(),
                        description: None,
                    }
                };

                outcome.events.push(event);
            }
        }

        Ok(outcome)
    }
}

/// Register the synthetic source with the given registry
pub fn register_synthetic_source(registry: &mut Registry, source: Arc<SyntheticSource>) {
    let metadata = SourceMetadata::new(
        SYNTHETIC_SOURCE_SLUG,
        "Synthetic Generator",
        FallbackPolicy::FirstActive,
        false,
    );
    registry.register(source, metadata);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::channel::Model as Channel;
    use crate::sources::IngestWindow;
    use chrono::Utc;
    use uuid::Uuid;

    fn channel(name: &str) -> Channel {
        let now = Utc::now();
        Channel {
            id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            name: name.to_string(),
            is_active: true,
            created_at: now.into(),
            updated_at: now.into(),
        }
    }

    #[test]
    fn test_weekends_are_busier() {
        let saturday = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        let monday = NaiveDate::from_ymd_opt(2025, 3, 3).unwrap();
        assert_eq!(events_for_day(saturday), 5);
        assert_eq!(events_for_day(monday), 2);
    }

    #[tokio::test]
    async fn test_generated_schedule_shape() {
        let source = SyntheticSource::new();
        let channels = vec![channel("Sky Sports"), channel("BBC One")];
        let channel_names: Vec<&str> = channels.iter().map(|c| c.name.as_str()).collect();
        let ctx = FetchContext::new(Uuid::new_v4(), IngestWindow::from_now(7), channels.clone());

        let outcome = source.fetch(&ctx).await.unwrap();
        assert!(!outcome.is_empty());
        assert_eq!(outcome.failed_calls, 0);
        assert_eq!(outcome.skipped_at_source, 0);

        for event in &outcome.events {
            assert!(!event.title.is_empty());
            assert!(channel_names.contains(&event.channel_name.as_str()));
            assert!(!event.sport_type.is_empty());

            // Quarter-hour kickoffs between 14:00 and 21:45.
            let time_part = event.start_time.split('T').nth(1).unwrap();
            let hour: u32 = time_part[0..2].parse().unwrap();
            let minute: u32 = time_part[3..5].parse().unwrap();
            assert!((14..22).contains(&hour), "hour {} out of range", hour);
            assert!(KICKOFF_MINUTES.contains(&minute));
        }
    }

    #[tokio::test]
    async fn test_premier_league_fixtures_have_distinct_teams() {
        let source = SyntheticSource::new();
        let ctx = FetchContext::new(
            Uuid::new_v4(),
            IngestWindow::from_now(14),
            vec![channel("Sky Sports")],
        );

        let outcome = source.fetch(&ctx).await.unwrap();
        for event in outcome
            .events
            .iter()
            .filter(|e| e.league.as_deref() == Some("Premier League"))
        {
            assert_ne!(event.home_team, event.away_team);
            assert!(event.title.contains(" vs "));
        }
    }

    #[tokio::test]
    async fn test_empty_channel_list_yields_nothing() {
        let source = SyntheticSource::new();
        let ctx = FetchContext::new(Uuid::new_v4(), IngestWindow::from_now(7), vec![]);
        let outcome = source.fetch(&ctx).await.unwrap();
        assert!(outcome.is_empty());
    }
}
