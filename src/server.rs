//! # Server Configuration
//!
//! This module contains the server setup and configuration for the
//! Fixturecast API.

use std::sync::Arc;

use axum::{
    Router,
    extract::Request,
    middleware::{self, Next},
    response::Response,
    routing::get,
};
use migration::{Migrator, MigratorTrait};
use sea_orm::DatabaseConnection;
use tokio_util::sync::CancellationToken;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::db;
use crate::handlers;
use crate::ingest::{IngestScheduler, Ingestor};
use crate::sources::Registry;
use crate::telemetry::{self, TraceContext};

/// Application state containing shared resources
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: Arc<AppConfig>,
    pub registry: Arc<Registry>,
    pub ingestor: Ingestor,
}

/// Attach a fresh trace ID to the request so error envelopes and log lines
/// emitted while handling it can be correlated.
async fn request_context_middleware(mut request: Request, next: Next) -> Response {
    let context = TraceContext {
        trace_id: Uuid::new_v4().to_string(),
    };
    request.extensions_mut().insert(context.clone());

    telemetry::with_trace_context(context, next.run(request)).await
}

/// Creates and configures the Axum application router
pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route(
            "/tenants/{tenant_id}/ingest-runs",
            get(handlers::ingest_runs::list_ingest_runs)
                .post(handlers::ingest_runs::trigger_ingest_run),
        )
        .route(
            "/tenants/{tenant_id}/events",
            get(handlers::events::list_events),
        )
        .route(
            "/tenants/{tenant_id}/channels",
            get(handlers::channels::list_channels),
        )
        .route(
            "/tenants/{tenant_id}/data-sources",
            get(handlers::data_sources::list_data_sources)
                .post(handlers::data_sources::create_data_source),
        )
        .route(
            "/tenants/{tenant_id}/data-sources/{source_id}",
            axum::routing::patch(handlers::data_sources::update_data_source)
                .delete(handlers::data_sources::delete_data_source),
        )
        .with_state(state)
        .layer(middleware::from_fn(request_context_middleware))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .merge(SwaggerUi::new("/docs").url("/openapi.json", ApiDoc::openapi()))
}

/// Starts the server with the given configuration
pub async fn run_server(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let db = db::init_pool(&config).await?;
    Migrator::up(&db, None).await?;

    let config = Arc::new(config);
    let registry = Arc::new(Registry::from_config(&config));
    let ingestor = Ingestor::new(db.clone(), Arc::clone(&registry), config.ingest.clone());

    let state = AppState {
        db: db.clone(),
        config: Arc::clone(&config),
        registry,
        ingestor: ingestor.clone(),
    };

    // The scheduler shares the shutdown token with the HTTP server so one
    // signal stops both.
    let shutdown = CancellationToken::new();
    let mut scheduler_handle = None;
    if config.scheduler.enabled {
        let scheduler = IngestScheduler::new(config.scheduler.clone(), db, ingestor);
        scheduler_handle = Some(tokio::spawn(scheduler.run(shutdown.clone())));
    } else {
        info!("Ingest scheduler disabled by configuration");
    }

    let app = create_app(state);

    let addr = config
        .bind_addr()
        .map_err(|e| format!("Invalid server address: {}", e))?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %addr, profile = %config.profile, "Server listening");

    let shutdown_for_server = shutdown.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            shutdown_for_server.cancel();
        })
        .await?;

    shutdown.cancel();
    if let Some(handle) = scheduler_handle {
        let _ = handle.await;
    }

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::root,
        crate::handlers::health,
        crate::handlers::ingest_runs::trigger_ingest_run,
        crate::handlers::ingest_runs::list_ingest_runs,
        crate::handlers::events::list_events,
        crate::handlers::channels::list_channels,
        crate::handlers::data_sources::list_data_sources,
        crate::handlers::data_sources::create_data_source,
        crate::handlers::data_sources::update_data_source,
        crate::handlers::data_sources::delete_data_source,
    ),
    components(
        schemas(
            crate::models::ServiceInfo,
            crate::handlers::HealthStatus,
            crate::error::ApiError,
            crate::ingest::report::IngestReport,
            crate::ingest::report::SourceReport,
            crate::ingest::report::SourceStatus,
            crate::ingest::report::Issue,
            crate::ingest::report::IssueKind,
            crate::handlers::ingest_runs::TriggerIngestRequest,
            crate::handlers::ingest_runs::IngestRunInfo,
            crate::handlers::ingest_runs::IngestRunsResponse,
            crate::handlers::events::EventInfo,
            crate::handlers::events::EventsResponse,
            crate::handlers::channels::ChannelInfo,
            crate::handlers::channels::ChannelsResponse,
            crate::handlers::data_sources::CreateDataSourceRequest,
            crate::handlers::data_sources::UpdateDataSourceRequest,
            crate::handlers::data_sources::DataSourceInfo,
            crate::handlers::data_sources::DataSourcesResponse,
        )
    ),
    info(
        title = "Fixturecast API",
        description = "Sports broadcast event ingestion and deduplication API",
        version = env!("CARGO_PKG_VERSION"),
    )
)]
pub struct ApiDoc;
