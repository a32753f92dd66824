//! End-to-end ingestion runs against scripted sources and an in-memory
//! database: deduplication, channel resolution, failure isolation, and
//! run recording.

#[path = "test_utils/mod.rs"]
mod test_utils;

use std::sync::Arc;

use anyhow::Result;
use chrono::{Duration, Utc};
use fixturecast::ingest::{IngestError, IngestOptions, IssueKind, SourceStatus};
use fixturecast::models::Event;
use fixturecast::repositories::IngestRunRepository;
use fixturecast::sources::{FallbackPolicy, Registry};
use sea_orm::EntityTrait;
use test_utils::{
    ScriptedSource, build_ingestor, create_test_channel, create_test_tenant, raw_event,
    register_scripted, setup_test_db,
};
use uuid::Uuid;

/// A kickoff comfortably inside the default ingestion window.
fn upcoming_kickoff() -> String {
    (Utc::now() + Duration::days(3)).to_rfc3339()
}

#[tokio::test]
async fn duplicate_event_across_sources_is_inserted_once() -> Result<()> {
    let db = setup_test_db().await?;
    let tenant_id = create_test_tenant(&db, None).await?;
    let channel_id = create_test_channel(&db, tenant_id, "Sky Sports", true).await?;

    let kickoff = upcoming_kickoff();
    let mut registry = Registry::new();
    register_scripted(
        &mut registry,
        ScriptedSource::returning(
            "alpha",
            vec![raw_event("Arsenal vs Chelsea", &kickoff, "Sky Sports")],
        ),
        FallbackPolicy::Drop,
    );
    register_scripted(
        &mut registry,
        ScriptedSource::returning(
            "beta",
            vec![raw_event("Arsenal vs Chelsea", &kickoff, "Sky Sports")],
        ),
        FallbackPolicy::Drop,
    );

    let ingestor = build_ingestor(&db, Arc::new(registry));
    let report = ingestor.run(tenant_id, IngestOptions::default()).await?;

    assert_eq!(report.inserted_count, 1);
    assert_eq!(report.skipped_count, 1);
    assert_eq!(report.sources.len(), 2);
    assert_eq!(report.sources[0].status, SourceStatus::Used);
    assert_eq!(report.sport_breakdown.get("football"), Some(&1));

    // First registered source wins the identity-key tie.
    let rows = Event::find().all(&db).await?;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].source_slug, "alpha");
    assert_eq!(rows[0].channel_id, channel_id);
    assert_eq!(rows[0].title, "Arsenal vs Chelsea");
    assert!(rows[0].dedupe_key.is_some());
    Ok(())
}

#[tokio::test]
async fn rerunning_the_same_window_inserts_nothing() -> Result<()> {
    let db = setup_test_db().await?;
    let tenant_id = create_test_tenant(&db, None).await?;
    create_test_channel(&db, tenant_id, "Sky Sports", true).await?;

    let kickoff = upcoming_kickoff();
    let mut registry = Registry::new();
    register_scripted(
        &mut registry,
        ScriptedSource::returning(
            "alpha",
            vec![raw_event("Arsenal vs Chelsea", &kickoff, "Sky Sports")],
        ),
        FallbackPolicy::Drop,
    );

    let ingestor = build_ingestor(&db, Arc::new(registry));
    let first = ingestor.run(tenant_id, IngestOptions::default()).await?;
    assert_eq!(first.inserted_count, 1);

    let second = ingestor.run(tenant_id, IngestOptions::default()).await?;
    assert_eq!(second.inserted_count, 0);
    assert_eq!(second.skipped_count, 1);

    let rows = Event::find().all(&db).await?;
    assert_eq!(rows.len(), 1);
    Ok(())
}

#[tokio::test]
async fn failing_source_does_not_block_the_others() -> Result<()> {
    let db = setup_test_db().await?;
    let tenant_id = create_test_tenant(&db, None).await?;
    create_test_channel(&db, tenant_id, "Sky Sports", true).await?;

    let kickoff = upcoming_kickoff();
    let mut registry = Registry::new();
    register_scripted(
        &mut registry,
        ScriptedSource::failing("alpha"),
        FallbackPolicy::Drop,
    );
    register_scripted(
        &mut registry,
        ScriptedSource::returning(
            "beta",
            vec![raw_event("Leeds vs Everton", &kickoff, "Sky Sports")],
        ),
        FallbackPolicy::Drop,
    );

    let ingestor = build_ingestor(&db, Arc::new(registry));
    let report = ingestor.run(tenant_id, IngestOptions::default()).await?;

    assert_eq!(report.inserted_count, 1);
    assert_eq!(report.sources[0].slug, "alpha");
    assert_eq!(report.sources[0].status, SourceStatus::Failed);
    assert_eq!(report.sources[1].status, SourceStatus::Used);
    assert!(report.issues.iter().any(|issue| {
        issue.kind == IssueKind::SourceUnavailable && issue.source.as_deref() == Some("alpha")
    }));
    Ok(())
}

#[tokio::test]
async fn channel_names_resolve_through_family_tokens() -> Result<()> {
    let db = setup_test_db().await?;
    let tenant_id = create_test_tenant(&db, None).await?;
    let sky_id = create_test_channel(&db, tenant_id, "Sky Sports", true).await?;

    let kickoff = upcoming_kickoff();
    let mut registry = Registry::new();
    register_scripted(
        &mut registry,
        ScriptedSource::returning(
            "alpha",
            vec![raw_event(
                "Wolves vs Brentford",
                &kickoff,
                "SkySports Main Event",
            )],
        ),
        FallbackPolicy::Drop,
    );

    let ingestor = build_ingestor(&db, Arc::new(registry));
    let report = ingestor.run(tenant_id, IngestOptions::default()).await?;

    assert_eq!(report.inserted_count, 1);
    assert_eq!(report.sources[0].channel_fallbacks, 0);

    let rows = Event::find().all(&db).await?;
    assert_eq!(rows[0].channel_id, sky_id);
    Ok(())
}

#[tokio::test]
async fn unresolved_channel_follows_the_source_fallback_policy() -> Result<()> {
    let db = setup_test_db().await?;
    let tenant_id = create_test_tenant(&db, None).await?;
    let first_channel = create_test_channel(&db, tenant_id, "Sky Sports", true).await?;

    let kickoff = upcoming_kickoff();
    let mut registry = Registry::new();
    register_scripted(
        &mut registry,
        ScriptedSource::returning(
            "lenient",
            vec![raw_event("Boxing Night", &kickoff, "Eurosport 9")],
        ),
        FallbackPolicy::FirstActive,
    );

    let ingestor = build_ingestor(&db, Arc::new(registry));
    let report = ingestor.run(tenant_id, IngestOptions::default()).await?;

    assert_eq!(report.inserted_count, 1);
    assert_eq!(report.sources[0].channel_fallbacks, 1);
    let rows = Event::find().all(&db).await?;
    assert_eq!(rows[0].channel_id, first_channel);
    Ok(())
}

#[tokio::test]
async fn drop_policy_skips_events_on_unknown_channels() -> Result<()> {
    let db = setup_test_db().await?;
    let tenant_id = create_test_tenant(&db, None).await?;
    create_test_channel(&db, tenant_id, "Sky Sports", true).await?;

    let kickoff = upcoming_kickoff();
    let mut registry = Registry::new();
    register_scripted(
        &mut registry,
        ScriptedSource::returning(
            "strict",
            vec![raw_event("Boxing Night", &kickoff, "Eurosport 9")],
        ),
        FallbackPolicy::Drop,
    );

    let ingestor = build_ingestor(&db, Arc::new(registry));
    let report = ingestor.run(tenant_id, IngestOptions::default()).await?;

    assert_eq!(report.inserted_count, 0);
    assert_eq!(report.skipped_count, 1);
    assert_eq!(report.sources[0].channel_fallbacks, 0);
    assert!(report
        .issues
        .iter()
        .any(|issue| issue.kind == IssueKind::UnresolvedChannel));
    assert!(Event::find().all(&db).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn unparseable_start_times_are_skipped_and_reported() -> Result<()> {
    let db = setup_test_db().await?;
    let tenant_id = create_test_tenant(&db, None).await?;
    create_test_channel(&db, tenant_id, "Sky Sports", true).await?;

    let mut registry = Registry::new();
    register_scripted(
        &mut registry,
        ScriptedSource::returning(
            "alpha",
            vec![raw_event("Cup Final", "TBC", "Sky Sports")],
        ),
        FallbackPolicy::Drop,
    );

    let ingestor = build_ingestor(&db, Arc::new(registry));
    let report = ingestor.run(tenant_id, IngestOptions::default()).await?;

    assert_eq!(report.inserted_count, 0);
    assert_eq!(report.skipped_count, 1);
    assert_eq!(report.sources[0].fetched, 1);
    assert!(report
        .issues
        .iter()
        .any(|issue| issue.kind == IssueKind::UnparseableTime));
    assert!(Event::find().all(&db).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn tenant_without_active_channels_is_rejected_before_any_run() -> Result<()> {
    let db = setup_test_db().await?;
    let tenant_id = create_test_tenant(&db, None).await?;
    create_test_channel(&db, tenant_id, "Sky Sports", false).await?;

    let mut registry = Registry::new();
    register_scripted(
        &mut registry,
        ScriptedSource::returning("alpha", Vec::new()),
        FallbackPolicy::Drop,
    );

    let ingestor = build_ingestor(&db, Arc::new(registry));
    let err = ingestor
        .run(tenant_id, IngestOptions::default())
        .await
        .expect_err("run should be refused");
    assert!(matches!(err, IngestError::NoActiveChannels { .. }));

    // Refused runs leave no history behind.
    let runs = IngestRunRepository::new(&db).recent(tenant_id, 10).await?;
    assert!(runs.is_empty());
    Ok(())
}

#[tokio::test]
async fn unknown_tenant_is_rejected() -> Result<()> {
    let db = setup_test_db().await?;
    let mut registry = Registry::new();
    register_scripted(
        &mut registry,
        ScriptedSource::returning("alpha", Vec::new()),
        FallbackPolicy::Drop,
    );

    let ingestor = build_ingestor(&db, Arc::new(registry));
    let err = ingestor
        .run(Uuid::new_v4(), IngestOptions::default())
        .await
        .expect_err("run should be refused");
    assert!(matches!(err, IngestError::TenantNotFound { .. }));
    Ok(())
}

#[tokio::test]
async fn source_selection_limits_the_run_to_named_slugs() -> Result<()> {
    let db = setup_test_db().await?;
    let tenant_id = create_test_tenant(&db, None).await?;
    create_test_channel(&db, tenant_id, "Sky Sports", true).await?;

    let kickoff = upcoming_kickoff();
    let mut registry = Registry::new();
    register_scripted(
        &mut registry,
        ScriptedSource::returning(
            "alpha",
            vec![raw_event("Arsenal vs Chelsea", &kickoff, "Sky Sports")],
        ),
        FallbackPolicy::Drop,
    );
    register_scripted(
        &mut registry,
        ScriptedSource::returning(
            "beta",
            vec![raw_event("Leeds vs Everton", &kickoff, "Sky Sports")],
        ),
        FallbackPolicy::Drop,
    );

    let ingestor = build_ingestor(&db, Arc::new(registry));
    let opts = IngestOptions {
        sources: Some(vec!["beta".to_string()]),
        ..IngestOptions::default()
    };
    let report = ingestor.run(tenant_id, opts).await?;

    assert_eq!(report.sources.len(), 1);
    assert_eq!(report.sources[0].slug, "beta");
    let rows = Event::find().all(&db).await?;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].source_slug, "beta");
    Ok(())
}

#[tokio::test]
async fn window_override_shapes_the_report_window() -> Result<()> {
    let db = setup_test_db().await?;
    let tenant_id = create_test_tenant(&db, None).await?;
    create_test_channel(&db, tenant_id, "Sky Sports", true).await?;

    let mut registry = Registry::new();
    register_scripted(
        &mut registry,
        ScriptedSource::returning("alpha", Vec::new()),
        FallbackPolicy::Drop,
    );

    let ingestor = build_ingestor(&db, Arc::new(registry));
    let opts = IngestOptions {
        window_days: Some(7),
        ..IngestOptions::default()
    };
    let report = ingestor.run(tenant_id, opts).await?;

    assert_eq!((report.window_end - report.window_start).num_days(), 7);
    assert_eq!(report.sources[0].status, SourceStatus::Empty);
    Ok(())
}

#[tokio::test]
async fn completed_runs_are_recorded_with_their_counts() -> Result<()> {
    let db = setup_test_db().await?;
    let tenant_id = create_test_tenant(&db, None).await?;
    create_test_channel(&db, tenant_id, "Sky Sports", true).await?;

    let kickoff = upcoming_kickoff();
    let mut registry = Registry::new();
    register_scripted(
        &mut registry,
        ScriptedSource::returning(
            "alpha",
            vec![
                raw_event("Arsenal vs Chelsea", &kickoff, "Sky Sports"),
                raw_event("Leeds vs Everton", &kickoff, "Sky Sports"),
            ],
        ),
        FallbackPolicy::Drop,
    );

    let ingestor = build_ingestor(&db, Arc::new(registry));
    let report = ingestor.run(tenant_id, IngestOptions::default()).await?;
    assert_eq!(report.inserted_count, 2);

    let runs = IngestRunRepository::new(&db).recent(tenant_id, 10).await?;
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].id, report.run_id);
    assert_eq!(runs[0].status, "completed");
    assert_eq!(runs[0].inserted_count, 2);
    assert_eq!(runs[0].skipped_count, 0);
    assert!(runs[0].finished_at.is_some());
    Ok(())
}
