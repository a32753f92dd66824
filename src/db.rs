//! Database pool setup for the fixturecast service.
//!
//! Production deployments run against Postgres; the local profile and the
//! test suite run against SQLite, which needs different pool settings.

use anyhow::{Context, Result};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::time::Duration;
use tokio::time::sleep;

use crate::config::AppConfig;

const CONNECT_ATTEMPTS: u32 = 5;
const FIRST_RETRY_DELAY: Duration = Duration::from_millis(100);

/// Errors that can occur while bringing up the pool.
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("Failed to connect to database: {source}")]
    ConnectionFailed {
        #[from]
        source: sea_orm::DbErr,
    },
    #[error("Invalid database configuration: {message}")]
    InvalidConfiguration { message: String },
}

fn is_sqlite(url: &str) -> bool {
    url.starts_with("sqlite:")
}

/// Build connection options for the configured backend.
///
/// An in-memory SQLite database exists per connection, so the pool is
/// pinned to a single connection there; a pool of independent empty
/// databases would lose every write between requests.
fn connect_options(cfg: &AppConfig) -> ConnectOptions {
    let mut opt = ConnectOptions::new(&cfg.database_url);
    opt.acquire_timeout(Duration::from_millis(cfg.db_acquire_timeout_ms))
        .sqlx_logging(true)
        .sqlx_logging_level(log::LevelFilter::Debug);

    if is_sqlite(&cfg.database_url) {
        opt.max_connections(1);
    } else {
        opt.max_connections(cfg.db_max_connections)
            .idle_timeout(Duration::from_secs(600))
            .max_lifetime(Duration::from_secs(1800));
    }

    opt
}

/// Connect to the configured database, retrying transient failures with
/// exponential backoff.
///
/// # Examples
///
/// ```no_run
/// use fixturecast::{config::AppConfig, db::init_pool};
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let config = AppConfig::default();
///     let db = init_pool(&config).await?;
///     Ok(())
/// }
/// ```
pub async fn init_pool(cfg: &AppConfig) -> Result<DatabaseConnection> {
    if cfg.database_url.is_empty() {
        return Err(DatabaseError::InvalidConfiguration {
            message: "Database URL cannot be empty".to_string(),
        }
        .into());
    }

    let opt = connect_options(cfg);
    let mut retry_delay = FIRST_RETRY_DELAY;
    let mut last_error = None;

    for attempt in 1..=CONNECT_ATTEMPTS {
        match Database::connect(opt.clone()).await {
            Ok(conn) => {
                log::info!("Database connection established (attempt {})", attempt);
                return Ok(conn);
            }
            Err(e) => {
                log::warn!(
                    "Database connection attempt {}/{} failed: {}",
                    attempt,
                    CONNECT_ATTEMPTS,
                    e
                );
                last_error = Some(e);
                if attempt < CONNECT_ATTEMPTS {
                    sleep(retry_delay).await;
                    retry_delay *= 2;
                }
            }
        }
    }

    let source = last_error.context("database connect loop ended without an error")?;
    log::error!(
        "Giving up on database connection after {} attempts",
        CONNECT_ATTEMPTS
    );
    Err(DatabaseError::ConnectionFailed { source }.into())
}

/// Ping the database with a trivial query. Used by the `/health` endpoint.
pub async fn health_check(db: &DatabaseConnection) -> Result<()> {
    let stmt = Statement::from_string(db.get_database_backend(), "SELECT 1".to_string());

    db.query_one(stmt)
        .await
        .context("Database health check failed")?;

    Ok(())
}
