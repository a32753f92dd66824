//! # Web Scrape Source
//!
//! Heuristic extraction from the tenant's registered listing pages. Each
//! page is fetched as static HTML (no script execution) with a browser-like
//! User-Agent, then walked block element by block element. An element
//! becomes a candidate only when its text mentions a sport or one of the
//! tenant's channels AND carries a clock time; everything else on the page
//! is ignored. Pages are allowed to yield nothing, and a page that cannot
//! be fetched is recorded as a failed call rather than failing the source,
//! so this adapter never returns an error for upstream trouble.

use std::collections::HashSet;
use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Timelike, Utc};
use regex::Regex;
use scraper::{Html, Selector};
use tracing::debug;

use crate::config::IngestConfig;
use crate::models::channel::Model as Channel;
use crate::repositories::data_source::DataSourceRepository;
use crate::sources::registry::Registry;
use crate::sources::{
    FallbackPolicy, FetchContext, FetchOutcome, RawEvent, SourceAdapter, SourceError,
    SourceMetadata,
};
use crate::sports;

pub const WEB_SCRAPE_SOURCE_SLUG: &str = "web_scrape";

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Listing rows are short; anything longer is a container wrapping many
/// rows, which the walk will visit individually anyway.
const MAX_BLOCK_TEXT_LEN: usize = 300;
const MIN_BLOCK_TEXT_LEN: usize = 8;
const SNIPPET_TITLE_CHARS: usize = 60;

static CLOCK_RE: OnceLock<Regex> = OnceLock::new();
static TEAM_VS_RE: OnceLock<Regex> = OnceLock::new();

fn clock_re() -> &'static Regex {
    CLOCK_RE.get_or_init(|| Regex::new(r"(?i)\b(\d{1,2})[:.]([0-5]\d)\s*(am|pm)?\b").unwrap())
}

fn team_vs_re() -> &'static Regex {
    TEAM_VS_RE.get_or_init(|| {
        Regex::new(
            r"([A-Z][\w'&.-]*(?:\s+[A-Z&][\w'&.-]*){0,3})\s+(?i:vs?\.?)\s+([A-Z][\w'&.-]*(?:\s+[A-Z&][\w'&.-]*){0,3})",
        )
        .unwrap()
    })
}

#[derive(Debug, Default)]
struct PageExtraction {
    events: Vec<RawEvent>,
    skipped: u32,
}

pub struct WebScrapeSource {
    max_events_per_source: usize,
    client: reqwest::Client,
}

impl WebScrapeSource {
    pub fn new(ingest: &IngestConfig) -> Self {
        Self {
            max_events_per_source: ingest.scrape_max_events_per_source as usize,
            client: reqwest::Client::new(),
        }
    }
}

/// Parse a clock match into 24-hour `(hour, minute)`.
fn extract_clock(text: &str) -> Option<(u32, u32)> {
    let caps = clock_re().captures(text)?;
    let mut hour: u32 = caps.get(1)?.as_str().parse().ok()?;
    let minute: u32 = caps.get(2)?.as_str().parse().ok()?;

    match caps.get(3) {
        Some(meridiem) => {
            if hour == 0 || hour > 12 {
                return None;
            }
            let meridiem = meridiem.as_str().to_lowercase();
            if meridiem == "pm" && hour != 12 {
                hour += 12;
            } else if meridiem == "am" && hour == 12 {
                hour = 0;
            }
        }
        None => {
            if hour > 23 {
                return None;
            }
        }
    }

    Some((hour, minute))
}

fn team_vs_title(text: &str) -> Option<(String, String, String)> {
    let caps = team_vs_re().captures(text)?;
    let home = caps.get(1)?.as_str().trim().to_string();
    let away = caps.get(2)?.as_str().trim().to_string();
    let title = format!("{} vs {}", home, away);
    Some((title, home, away))
}

fn snippet_title(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.chars().count() <= SNIPPET_TITLE_CHARS {
        trimmed.to_string()
    } else {
        trimmed
            .chars()
            .take(SNIPPET_TITLE_CHARS)
            .collect::<String>()
            .trim_end()
            .to_string()
    }
}

/// Listing pages carry clock times, not dates. Anchor the extracted time to
/// its next occurrence so scraped events always lie ahead of the run.
fn anchor_clock(now: DateTime<Utc>, hour: u32, minute: u32) -> String {
    let mut anchored = now
        .with_hour(hour)
        .and_then(|t| t.with_minute(minute))
        .and_then(|t| t.with_second(0))
        .unwrap_or(now);
    if anchored <= now {
        anchored += Duration::days(1);
    }
    anchored.format("%Y-%m-%dT%H:%M:00").to_string()
}

/// Walk one fetched page. Sync on purpose: `scraper::Html` is not `Send`,
/// so it must never be held across an await point.
fn extract_page_events(
    html: &str,
    source_name: &str,
    channels: &[Channel],
    cap: usize,
    now: DateTime<Utc>,
) -> PageExtraction {
    let mut extraction = PageExtraction::default();

    // Cheap reject before any DOM work.
    if sports::detect_sport_keywords(html).is_none() {
        return extraction;
    }

    let Ok(block_selector) = Selector::parse("div, li, article, section, td, p") else {
        return extraction;
    };

    let document = Html::parse_document(html);
    let mut seen: HashSet<String> = HashSet::new();

    for element in document.select(&block_selector) {
        let text = element
            .text()
            .collect::<String>()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ");
        if text.len() < MIN_BLOCK_TEXT_LEN || text.len() > MAX_BLOCK_TEXT_LEN {
            continue;
        }

        let sport = sports::detect_sport_keywords(&text);
        let text_lower = text.to_lowercase();
        let matched_channel = channels
            .iter()
            .find(|c| text_lower.contains(&c.name.to_lowercase()));
        if sport.is_none() && matched_channel.is_none() {
            continue;
        }
        if !clock_re().is_match(&text) {
            continue;
        }

        let Some((hour, minute)) = extract_clock(&text) else {
            // Matched the time-like gate but failed to parse as a real
            // clock, so the element cannot yield a start time.
            extraction.skipped += 1;
            continue;
        };

        let (title, home_team, away_team) = match team_vs_title(&text) {
            Some((title, home, away)) => (title, Some(home), Some(away)),
            None => (snippet_title(&text), None, None),
        };

        let dedupe_token = format!("{}|{:02}:{:02}", title.to_lowercase(), hour, minute);
        if !seen.insert(dedupe_token) {
            continue;
        }

        if extraction.events.len() >= cap {
            extraction.skipped += 1;
            continue;
        }

        extraction.events.push(RawEvent {
            title,
            sport_type: sport.map(|s| s.as_str().to_string()).unwrap_or_default(),
            league: None,
            home_team,
            away_team,
            start_time: anchor_clock(now, hour, minute),
            end_time: None,
            channel_name: matched_channel
                .map(|c| c.name.clone())
                .unwrap_or_else(|| source_name.to_string()),
            description: None,
        });
    }

    extraction
}

#[async_trait]
impl SourceAdapter for WebScrapeSource {
    fn slug(&self) -> &'static str {
        WEB_SCRAPE_SOURCE_SLUG
    }

    async fn fetch(&self, ctx: &FetchContext) -> Result<FetchOutcome, SourceError> {
        let db = ctx
            .db
            .as_ref()
            .ok_or_else(|| SourceError::config("web_scrape requires a database handle"))?;

        crate::seeds::data_source::ensure_default_sources(db, ctx.tenant_id)
            .await
            .map_err(|e| SourceError::unavailable(format!("source catalog: {}", e)))?;

        let repo = DataSourceRepository::new(db);
        let sources = repo
            .list_active(ctx.tenant_id)
            .await
            .map_err(|e| SourceError::unavailable(format!("source catalog: {}", e)))?;

        let mut outcome = FetchOutcome::default();
        let now = Utc::now();

        for source in sources {
            outcome.sources_consulted += 1;

            let response = match self
                .client
                .get(&source.url)
                .header(reqwest::header::USER_AGENT, BROWSER_USER_AGENT)
                .send()
                .await
            {
                Ok(response) => response,
                Err(err) => {
                    debug!(url = %source.url, "scrape fetch failed: {}", err);
                    outcome.failed_calls += 1;
                    continue;
                }
            };

            if !response.status().is_success() {
                debug!(url = %source.url, status = %response.status(), "scrape fetch rejected");
                outcome.failed_calls += 1;
                continue;
            }

            let body = match response.text().await {
                Ok(body) => body,
                Err(err) => {
                    debug!(url = %source.url, "scrape body read failed: {}", err);
                    outcome.failed_calls += 1;
                    continue;
                }
            };

            let extraction = extract_page_events(
                &body,
                &source.name,
                &ctx.channels,
                self.max_events_per_source,
                now,
            );
            debug!(
                url = %source.url,
                matched = extraction.events.len(),
                skipped = extraction.skipped,
                "scrape page walked"
            );
            outcome.skipped_at_source += extraction.skipped;
            outcome.events.extend(extraction.events);

            if let Err(err) = repo.record_scrape(source.id).await {
                debug!(source = %source.name, "scrape bookkeeping failed: {}", err);
            }
        }

        Ok(outcome)
    }
}

/// Register the web scrape source with the given registry
pub fn register_web_scrape_source(registry: &mut Registry, source: Arc<WebScrapeSource>) {
    let metadata = SourceMetadata::new(
        WEB_SCRAPE_SOURCE_SLUG,
        "Web Scrape",
        FallbackPolicy::Drop,
        false,
    );
    registry.register(source, metadata);
}
