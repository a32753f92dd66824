//! # Ingestion Pipeline
//!
//! Orchestrates one ingestion run for a tenant: fan the registered source
//! adapters out under a concurrency cap, normalize whatever they return
//! against the tenant's active channels, drop duplicates, insert the rest,
//! and persist a run record carrying per-source diagnostics.
//!
//! Source precedence is registration order. The fetches themselves run
//! concurrently, but results are reassembled in that order before
//! deduplication so the first registered source wins identity-key ties.

pub mod dedup;
pub mod normalize;
pub mod report;
pub mod resolve;
pub mod scheduler;

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use metrics::{counter, histogram};
use sea_orm::{DatabaseConnection, DbErr, Set};
use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::timeout;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::config::IngestConfig;
use crate::models::event;
use crate::repositories::channel::ChannelRepository;
use crate::repositories::event::EventRepository;
use crate::repositories::ingest_run::IngestRunRepository;
use crate::repositories::tenant::TenantRepository;
use crate::sources::{FetchContext, FetchOutcome, IngestWindow, Registry, SourceError};

pub use dedup::{DedupOutcome, candidate_key, dedupe_digest, filter_candidates, identity_key};
pub use normalize::{CandidateEvent, NormalizeStats, parse_event_time};
pub use report::{IngestReport, Issue, IssueKind, SourceReport, SourceStatus};
pub use scheduler::IngestScheduler;

/// Errors surfaced by [`Ingestor::run`].
#[derive(Debug, Error)]
pub enum IngestError {
    /// The tenant does not exist.
    #[error("tenant not found: {tenant_id}")]
    TenantNotFound { tenant_id: Uuid },

    /// The tenant has no active channels, so nothing can be scheduled
    /// against it. No run record is written in this case.
    #[error("tenant {tenant_id} has no active channels")]
    NoActiveChannels { tenant_id: Uuid },

    /// A database operation failed.
    #[error("ingest persistence failed: {0}")]
    Persistence(#[from] DbErr),
}

/// Per-run overrides accepted by [`Ingestor::run`].
///
/// Anything left as `None` falls back to the configured default. Unknown
/// slugs in `sources` are ignored here; the HTTP layer rejects them before
/// a run starts.
#[derive(Debug, Clone, Default)]
pub struct IngestOptions {
    pub window_days: Option<u32>,
    pub sources: Option<Vec<String>>,
}

/// What one adapter fetch produced, including the ways it can go wrong
/// without returning at all.
enum FetchResult {
    Fetched(FetchOutcome),
    Failed(SourceError),
    TimedOut,
}

/// Drives ingestion runs end to end.
#[derive(Clone)]
pub struct Ingestor {
    db: DatabaseConnection,
    registry: Arc<Registry>,
    config: IngestConfig,
}

impl Ingestor {
    pub fn new(db: DatabaseConnection, registry: Arc<Registry>, config: IngestConfig) -> Self {
        Self {
            db,
            registry,
            config,
        }
    }

    /// Registered source metadata, in precedence order.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Run one ingestion pass for the tenant and return its report.
    ///
    /// The run record is written for every run that reaches the fetch
    /// stage, including runs that later fail to persist events.
    #[instrument(skip_all, fields(tenant_id = %tenant_id))]
    pub async fn run(
        &self,
        tenant_id: Uuid,
        opts: IngestOptions,
    ) -> Result<IngestReport, IngestError> {
        let run_timer = Instant::now();
        let started_at = Utc::now();
        let run_id = Uuid::new_v4();

        TenantRepository::new(&self.db)
            .find_by_id(tenant_id)
            .await?
            .ok_or(IngestError::TenantNotFound { tenant_id })?;

        let channels = ChannelRepository::new(&self.db)
            .list_active(tenant_id)
            .await?;
        if channels.is_empty() {
            return Err(IngestError::NoActiveChannels { tenant_id });
        }

        let window_days = opts.window_days.unwrap_or(self.config.window_days);
        let window = IngestWindow::from_now(window_days);
        let selected = self.select_sources(opts.sources.as_deref());

        info!(
            run_id = %run_id,
            window_days = window_days,
            sources = selected.len(),
            channels = channels.len(),
            "Starting ingest run"
        );

        let ctx = FetchContext::new(tenant_id, window, channels.clone()).with_db(self.db.clone());
        let slots = self.fetch_all(&selected, &ctx).await;

        let mut sources = Vec::with_capacity(selected.len());
        let mut issues = Vec::new();
        let mut candidates = Vec::new();
        let mut skipped: u32 = 0;

        for (slug, slot) in selected.iter().map(|slug| slug.as_str()).zip(slots) {
            let outcome_label = match &slot {
                Some(FetchResult::Fetched(_)) => "fetched",
                Some(FetchResult::Failed(_)) => "failed",
                Some(FetchResult::TimedOut) => "timeout",
                None => "aborted",
            };
            let metric_labels = vec![
                ("source_slug", slug.to_string()),
                ("outcome", outcome_label.to_string()),
            ];
            counter!("ingest_source_fetches_total", &metric_labels).increment(1);

            match slot {
                Some(FetchResult::Fetched(outcome)) => {
                    let mut report = SourceReport::from_outcome(slug, &outcome);
                    skipped += outcome.skipped_at_source;

                    let policy = match self.registry.metadata_for(slug) {
                        Ok(metadata) => metadata.fallback_policy,
                        Err(_) => {
                            sources.push(report);
                            continue;
                        }
                    };
                    let (mut batch, stats) =
                        normalize::normalize_batch(slug, outcome.events, &channels, policy);
                    report.channel_fallbacks = stats.channel_fallbacks;
                    sources.push(report);
                    skipped += stats.unparseable_time + stats.unresolved_channel;
                    if stats.unparseable_time > 0 {
                        issues.push(Issue::source_issue(
                            slug,
                            IssueKind::UnparseableTime,
                            format!(
                                "{} event(s) dropped with unparseable start times",
                                stats.unparseable_time
                            ),
                        ));
                    }
                    if stats.unresolved_channel > 0 {
                        issues.push(Issue::source_issue(
                            slug,
                            IssueKind::UnresolvedChannel,
                            format!(
                                "{} event(s) dropped with unresolved channel names",
                                stats.unresolved_channel
                            ),
                        ));
                    }
                    if stats.channel_fallbacks > 0 {
                        debug!(
                            source = slug,
                            fallbacks = stats.channel_fallbacks,
                            "Bound events to the first active channel"
                        );
                    }
                    candidates.append(&mut batch);
                }
                Some(FetchResult::Failed(err)) => {
                    warn!(source = slug, error = %err, "Source fetch failed");
                    sources.push(SourceReport::failed(slug));
                    issues.push(Issue::source_issue(slug, IssueKind::from(&err), err.to_string()));
                }
                Some(FetchResult::TimedOut) => {
                    warn!(
                        source = slug,
                        timeout_seconds = self.config.adapter_timeout_seconds,
                        "Source fetch timed out"
                    );
                    sources.push(SourceReport::failed(slug));
                    issues.push(Issue::source_issue(
                        slug,
                        IssueKind::SourceTimeout,
                        format!(
                            "no response within {}s",
                            self.config.adapter_timeout_seconds
                        ),
                    ));
                }
                None => {
                    sources.push(SourceReport::failed(slug));
                    issues.push(Issue::source_issue(
                        slug,
                        IssueKind::SourceUnavailable,
                        "fetch task aborted",
                    ));
                }
            }
        }

        let event_repo = EventRepository::new(&self.db);
        let existing = event_repo
            .list_window(tenant_id, window.start, window.end)
            .await?;
        let DedupOutcome {
            survivors,
            duplicates,
        } = dedup::filter_candidates(candidates, &existing);
        skipped += duplicates;

        let mut report = IngestReport {
            run_id,
            tenant_id,
            window_start: window.start,
            window_end: window.end,
            inserted_count: 0,
            skipped_count: skipped,
            sources,
            sport_breakdown: sport_breakdown(&survivors),
            issues,
        };

        let runs = IngestRunRepository::new(&self.db);
        let attempted = survivors.len() as u64;
        let inserted = if survivors.is_empty() {
            0
        } else {
            match event_repo.insert_many(event_models(tenant_id, &survivors)).await {
                Ok(inserted) => inserted,
                Err(err) => {
                    report
                        .issues
                        .push(Issue::run_issue(IssueKind::PersistenceFailure, err.to_string()));
                    if let Err(record_err) = runs
                        .record(&report, "failed", started_at, Some(Utc::now()))
                        .await
                    {
                        error!(
                            error = ?record_err,
                            run_id = %run_id,
                            "Failed to record failed ingest run"
                        );
                    }
                    let metric_labels = vec![("status", "failed".to_string())];
                    counter!("ingest_runs_total", &metric_labels).increment(1);
                    return Err(IngestError::Persistence(err));
                }
            }
        };

        // The unique index may reject rows a concurrent run inserted after
        // our window query; those land in the skipped tally.
        let raced = attempted.saturating_sub(inserted) as u32;
        if raced > 0 {
            debug!(run_id = %run_id, raced = raced, "Concurrent run inserted overlapping events");
        }
        report.inserted_count = inserted as u32;
        report.skipped_count += raced;

        runs.record(&report, "completed", started_at, Some(Utc::now()))
            .await?;

        let elapsed = run_timer.elapsed();
        histogram!("ingest_run_duration_ms").record(elapsed.as_secs_f64() * 1_000.0);
        let metric_labels = vec![("status", "completed".to_string())];
        counter!("ingest_runs_total", &metric_labels).increment(1);
        counter!("ingest_events_inserted_total").increment(u64::from(report.inserted_count));
        counter!("ingest_events_skipped_total").increment(u64::from(report.skipped_count));

        info!(
            run_id = %run_id,
            inserted = report.inserted_count,
            skipped = report.skipped_count,
            sources = report.sources.len(),
            issues = report.issues.len(),
            duration_ms = elapsed.as_millis() as u64,
            "Ingest run completed"
        );

        Ok(report)
    }

    /// Slugs to fetch this run, in registration (precedence) order.
    fn select_sources(&self, wanted: Option<&[String]>) -> Vec<String> {
        self.registry
            .list_metadata()
            .into_iter()
            .filter(|metadata| match wanted {
                Some(wanted) => wanted.iter().any(|slug| slug == &metadata.slug),
                None => true,
            })
            .map(|metadata| metadata.slug)
            .collect()
    }

    /// Fetch every selected source concurrently and hand the results back
    /// in selection order. A slot stays `None` when its task panicked.
    async fn fetch_all(&self, selected: &[String], ctx: &FetchContext) -> Vec<Option<FetchResult>> {
        let limiter = Arc::new(Semaphore::new(
            self.config.max_concurrent_sources.max(1) as usize
        ));
        let fetch_timeout = Duration::from_secs(self.config.adapter_timeout_seconds);
        let mut join_set = JoinSet::new();

        for (index, slug) in selected.iter().enumerate() {
            let adapter = match self.registry.get(slug) {
                Ok(adapter) => adapter,
                Err(_) => continue,
            };
            let limiter = Arc::clone(&limiter);
            let ctx = ctx.clone();
            join_set.spawn(async move {
                // The semaphore is never closed while fetches are running,
                // so a failed acquire just means we run unthrottled.
                let _permit = limiter.acquire_owned().await.ok();
                let result = match timeout(fetch_timeout, adapter.fetch(&ctx)).await {
                    Ok(Ok(outcome)) => FetchResult::Fetched(outcome),
                    Ok(Err(err)) => FetchResult::Failed(err),
                    Err(_) => FetchResult::TimedOut,
                };
                (index, result)
            });
        }

        let mut slots: Vec<Option<FetchResult>> = Vec::with_capacity(selected.len());
        slots.resize_with(selected.len(), || None);
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((index, result)) => slots[index] = Some(result),
                Err(err) => error!(error = ?err, "Source fetch task aborted"),
            }
        }
        slots
    }
}

/// Count surviving candidates per canonical sport label.
fn sport_breakdown(survivors: &[CandidateEvent]) -> BTreeMap<String, u32> {
    let mut breakdown = BTreeMap::new();
    for candidate in survivors {
        *breakdown
            .entry(candidate.sport_type.as_str().to_string())
            .or_insert(0) += 1;
    }
    breakdown
}

/// Build insertable rows for the surviving candidates, digesting each
/// identity key into the stored `dedupe_key`.
fn event_models(tenant_id: Uuid, survivors: &[CandidateEvent]) -> Vec<event::ActiveModel> {
    let now = Utc::now();
    survivors
        .iter()
        .map(|candidate| event::ActiveModel {
            id: Set(Uuid::new_v4()),
            tenant_id: Set(tenant_id),
            channel_id: Set(candidate.channel_id),
            title: Set(candidate.title.clone()),
            sport_type: Set(candidate.sport_type.as_str().to_string()),
            league: Set(candidate.league.clone()),
            home_team: Set(candidate.home_team.clone()),
            away_team: Set(candidate.away_team.clone()),
            start_time: Set(candidate.start_time.into()),
            end_time: Set(candidate.end_time.map(Into::into)),
            description: Set(candidate.description.clone()),
            is_featured: Set(false),
            is_hidden: Set(false),
            source_slug: Set(candidate.source_slug.clone()),
            dedupe_key: Set(Some(dedup::dedupe_digest(&dedup::candidate_key(candidate)))),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sports::SportType;
    use chrono::TimeZone;

    fn candidate(slug: &str, title: &str, sport: SportType) -> CandidateEvent {
        CandidateEvent {
            source_slug: slug.to_string(),
            title: title.to_string(),
            sport_type: sport,
            league: None,
            home_team: None,
            away_team: None,
            start_time: Utc.with_ymd_and_hms(2025, 3, 1, 15, 0, 0).unwrap(),
            end_time: None,
            channel_id: Uuid::new_v4(),
            description: None,
        }
    }

    #[test]
    fn test_sport_breakdown_counts_per_label() {
        let survivors = vec![
            candidate("sports_db", "Arsenal vs Chelsea", SportType::Football),
            candidate("sports_db", "Leeds vs Hull", SportType::Football),
            candidate("web_scrape", "ATP Tour Tennis", SportType::Tennis),
        ];

        let breakdown = sport_breakdown(&survivors);
        assert_eq!(breakdown.get("football"), Some(&2));
        assert_eq!(breakdown.get("tennis"), Some(&1));
        assert_eq!(breakdown.len(), 2);
    }

    #[test]
    fn test_event_models_carry_digested_dedupe_keys() {
        let tenant_id = Uuid::new_v4();
        let survivors = vec![candidate(
            "fixtures_api",
            "Arsenal vs Chelsea",
            SportType::Football,
        )];

        let models = event_models(tenant_id, &survivors);
        assert_eq!(models.len(), 1);

        let model = &models[0];
        assert_eq!(model.tenant_id.as_ref(), &tenant_id);
        assert_eq!(model.source_slug.as_ref(), "fixtures_api");
        assert_eq!(model.is_hidden.as_ref(), &false);

        let digest = model
            .dedupe_key
            .as_ref()
            .clone()
            .unwrap_or_else(|| panic!("dedupe key must be set"));
        assert_eq!(digest.len(), 64);
        assert_eq!(
            digest,
            dedup::dedupe_digest(&dedup::candidate_key(&survivors[0]))
        );
    }

    #[test]
    fn test_event_models_distinct_inputs_get_distinct_keys() {
        let tenant_id = Uuid::new_v4();
        let survivors = vec![
            candidate("sports_db", "Arsenal vs Chelsea", SportType::Football),
            candidate("sports_db", "Leeds vs Hull", SportType::Football),
        ];

        let models = event_models(tenant_id, &survivors);
        assert_ne!(
            models[0].dedupe_key.as_ref(),
            models[1].dedupe_key.as_ref()
        );
    }
}
