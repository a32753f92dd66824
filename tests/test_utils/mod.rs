//! Shared helpers for the integration suites.
//!
//! Provides an in-memory SQLite database with migrations applied, fixture
//! builders for tenants, channels, and events, and a scripted source
//! adapter so pipeline scenarios never touch a real upstream.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fixturecast::config::{AppConfig, IngestConfig};
use fixturecast::ingest::Ingestor;
use fixturecast::models::{channel, event, tenant};
use fixturecast::server::AppState;
use fixturecast::sources::{
    FallbackPolicy, FetchContext, FetchOutcome, RawEvent, Registry, SourceAdapter, SourceError,
    SourceMetadata,
};
use migration::{Migrator, MigratorTrait};
use sea_orm::{ActiveModelTrait, Database, DatabaseConnection, Set};
use uuid::Uuid;

/// Fresh in-memory SQLite database with the full schema applied.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = Database::connect("sqlite::memory:").await?;
    Migrator::up(&db, None).await?;
    Ok(db)
}

#[allow(dead_code)]
pub async fn create_test_tenant(db: &DatabaseConnection, tenant_id: Option<Uuid>) -> Result<Uuid> {
    let id = tenant_id.unwrap_or_else(Uuid::new_v4);
    tenant::ActiveModel {
        id: Set(id),
        name: Set(format!("Test Tenant {}", &id.to_string()[..8])),
        created_at: Set(Utc::now().into()),
    }
    .insert(db)
    .await?;
    Ok(id)
}

#[allow(dead_code)]
pub async fn create_test_channel(
    db: &DatabaseConnection,
    tenant_id: Uuid,
    name: &str,
    is_active: bool,
) -> Result<Uuid> {
    let id = Uuid::new_v4();
    let now = Utc::now();
    channel::ActiveModel {
        id: Set(id),
        tenant_id: Set(tenant_id),
        name: Set(name.to_string()),
        is_active: Set(is_active),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(db)
    .await?;
    Ok(id)
}

/// Insert an event row directly, bypassing the pipeline.
#[allow(dead_code)]
pub async fn seed_event(
    db: &DatabaseConnection,
    tenant_id: Uuid,
    channel_id: Uuid,
    title: &str,
    sport_type: &str,
    start_time: DateTime<Utc>,
) -> Result<Uuid> {
    let id = Uuid::new_v4();
    let now = Utc::now();
    event::ActiveModel {
        id: Set(id),
        tenant_id: Set(tenant_id),
        channel_id: Set(channel_id),
        title: Set(title.to_string()),
        sport_type: Set(sport_type.to_string()),
        league: Set(None),
        home_team: Set(None),
        away_team: Set(None),
        start_time: Set(start_time.into()),
        end_time: Set(None),
        description: Set(None),
        is_featured: Set(false),
        is_hidden: Set(false),
        source_slug: Set("seeded".to_string()),
        dedupe_key: Set(None),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(db)
    .await?;
    Ok(id)
}

/// In-memory channel model for fetch contexts that never touch a database.
#[allow(dead_code)]
pub fn channel_model(name: &str) -> channel::Model {
    let now = Utc::now();
    channel::Model {
        id: Uuid::new_v4(),
        tenant_id: Uuid::new_v4(),
        name: name.to_string(),
        is_active: true,
        created_at: now.into(),
        updated_at: now.into(),
    }
}

/// Raw event with the fields every adapter is required to fill.
#[allow(dead_code)]
pub fn raw_event(title: &str, start_time: &str, channel_name: &str) -> RawEvent {
    RawEvent {
        title: title.to_string(),
        sport_type: "Football".to_string(),
        start_time: start_time.to_string(),
        channel_name: channel_name.to_string(),
        ..RawEvent::default()
    }
}

/// Canned adapter: replays the same events (or the same failure) on every
/// fetch, which makes idempotence scenarios easy to script.
#[allow(dead_code)]
pub struct ScriptedSource {
    slug: &'static str,
    events: Vec<RawEvent>,
    fail: bool,
}

#[allow(dead_code)]
impl ScriptedSource {
    pub fn returning(slug: &'static str, events: Vec<RawEvent>) -> Arc<Self> {
        Arc::new(Self {
            slug,
            events,
            fail: false,
        })
    }

    pub fn failing(slug: &'static str) -> Arc<Self> {
        Arc::new(Self {
            slug,
            events: Vec::new(),
            fail: true,
        })
    }
}

#[async_trait]
impl SourceAdapter for ScriptedSource {
    fn slug(&self) -> &'static str {
        self.slug
    }

    async fn fetch(&self, _ctx: &FetchContext) -> Result<FetchOutcome, SourceError> {
        if self.fail {
            return Err(SourceError::unavailable("scripted outage"));
        }
        Ok(FetchOutcome::from_events(self.events.clone()))
    }
}

#[allow(dead_code)]
pub fn register_scripted(
    registry: &mut Registry,
    source: Arc<ScriptedSource>,
    policy: FallbackPolicy,
) {
    let metadata = SourceMetadata::new(source.slug(), source.slug().to_string(), policy, false);
    registry.register(source, metadata);
}

#[allow(dead_code)]
pub fn build_ingestor(db: &DatabaseConnection, registry: Arc<Registry>) -> Ingestor {
    Ingestor::new(db.clone(), registry, IngestConfig::default())
}

/// Application state wired against the test database, for router tests.
#[allow(dead_code)]
pub fn build_app_state(db: DatabaseConnection, registry: Arc<Registry>) -> AppState {
    let ingestor = Ingestor::new(db.clone(), Arc::clone(&registry), IngestConfig::default());
    AppState {
        db,
        config: Arc::new(AppConfig::default()),
        registry,
        ingestor,
    }
}
