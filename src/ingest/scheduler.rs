//! # Ingest Scheduler
//!
//! Background loop that runs one ingestion pass for every tenant on a
//! fixed tick. Each tick's sleep gets a jittered extension so multiple
//! deployments do not hit the same upstream sources in lockstep.

use std::time::Instant;

use metrics::{counter, histogram};
use rand::Rng;
use sea_orm::{DatabaseConnection, DbErr};
use tokio::time::{Duration as TokioDuration, sleep};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument};

use crate::config::SchedulerConfig;
use crate::ingest::{IngestError, IngestOptions, Ingestor};
use crate::repositories::tenant::TenantRepository;

/// Background ingestion scheduler.
pub struct IngestScheduler {
    config: SchedulerConfig,
    db: DatabaseConnection,
    ingestor: Ingestor,
}

#[derive(Debug, Default)]
struct TickStats {
    tenants_polled: u64,
    runs_completed: u64,
    runs_skipped: u64,
    runs_failed: u64,
    events_inserted: u64,
}

impl IngestScheduler {
    pub fn new(config: SchedulerConfig, db: DatabaseConnection, ingestor: Ingestor) -> Self {
        Self {
            config,
            db,
            ingestor,
        }
    }

    /// Run the scheduler loop until the provided shutdown token fires.
    #[instrument(skip_all)]
    pub async fn run(self, shutdown: CancellationToken) {
        info!(
            tick_interval_seconds = self.config.tick_interval_seconds,
            "Starting ingest scheduler"
        );

        loop {
            let jitter_seconds = sample_jitter_seconds(&self.config);
            let tick_interval =
                TokioDuration::from_secs(self.config.tick_interval_seconds + jitter_seconds);
            debug!(
                jitter_seconds = jitter_seconds,
                "Ingest scheduler sleeping until next tick"
            );

            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("Ingest scheduler shutdown requested");
                    break;
                }
                _ = sleep(tick_interval) => {
                    let tick_started = Instant::now();
                    if let Err(err) = self.tick().await {
                        error!(error = ?err, "Scheduler tick failed");
                    }
                    let elapsed = tick_started.elapsed();
                    counter!("ingest_scheduler_ticks_total").increment(1);
                    histogram!("ingest_scheduler_tick_duration_ms")
                        .record(elapsed.as_secs_f64() * 1_000.0);
                }
            }
        }

        info!("Ingest scheduler stopped");
    }

    /// Run every tenant once, sequentially. One tenant failing never stops
    /// the sweep for the others.
    async fn tick(&self) -> Result<(), DbErr> {
        let tenants = TenantRepository::new(&self.db).list().await?;
        let mut stats = TickStats::default();

        for tenant in tenants {
            stats.tenants_polled += 1;
            match self
                .ingestor
                .run(tenant.id, IngestOptions::default())
                .await
            {
                Ok(report) => {
                    stats.runs_completed += 1;
                    stats.events_inserted += u64::from(report.inserted_count);
                }
                Err(IngestError::NoActiveChannels { .. }) => {
                    debug!(tenant_id = %tenant.id, "Skipping tenant with no active channels");
                    stats.runs_skipped += 1;
                }
                Err(err) => {
                    stats.runs_failed += 1;
                    error!(
                        error = ?err,
                        tenant_id = %tenant.id,
                        "Scheduled ingest run failed"
                    );
                }
            }
        }

        debug!(
            polled = stats.tenants_polled,
            completed = stats.runs_completed,
            skipped = stats.runs_skipped,
            failed = stats.runs_failed,
            inserted = stats.events_inserted,
            "Scheduler tick completed"
        );

        Ok(())
    }
}

fn sample_jitter_seconds(config: &SchedulerConfig) -> u64 {
    let mut rng = rand::thread_rng();
    compute_jitter_seconds(config, &mut rng)
}

fn compute_jitter_seconds<R: Rng + ?Sized>(config: &SchedulerConfig, rng: &mut R) -> u64 {
    let min = config.jitter_pct_min.max(0.0);
    let max = config.jitter_pct_max.max(min);

    if min == 0.0 && max == 0.0 {
        return 0;
    }

    let jitter_pct = if (max - min).abs() < f64::EPSILON {
        min
    } else {
        rng.gen_range(min..=max)
    };

    (config.tick_interval_seconds as f64 * jitter_pct).round() as u64
}
