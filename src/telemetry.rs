//! Tracing setup and request correlation.
//!
//! Every HTTP request runs inside a task-local [`TraceContext`] so error
//! envelopes and log lines can be tied back to the request that produced
//! them.

use std::any::type_name_of_val;
use std::sync::atomic::{AtomicBool, Ordering};

use log::LevelFilter;
use thiserror::Error;
use tokio::task_local;
use tracing_log::LogTracer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::Layer,
    layer::SubscriberExt,
    util::{SubscriberInitExt, TryInitError},
};

use crate::config::AppConfig;

/// Correlation metadata for the running request task.
#[derive(Debug, Clone)]
pub struct TraceContext {
    pub trace_id: String,
}

task_local! {
    static ACTIVE_TRACE_CONTEXT: TraceContext;
}

#[derive(Debug, Error)]
pub enum TelemetryInitError {
    #[error("failed to install log tracer bridge: {0}")]
    LogTracer(#[from] log::SetLoggerError),
    #[error("failed to install tracing subscriber: {0}")]
    Subscriber(#[from] TryInitError),
}

static TELEMETRY_INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Directives appended when the configured level carries none of its own.
/// The HTML parsing stack underneath the scrape adapter traces every tree
/// mutation, and sqlx logs each statement; neither belongs in service logs
/// below debug.
const QUIET_DEPENDENCIES: &[&str] = &["html5ever=warn", "selectors=warn", "sqlx=warn"];

fn filter_directives(configured_level: &str) -> String {
    if configured_level.contains(',') || configured_level.contains('=') {
        // The operator wrote full directives; take them as-is.
        return configured_level.to_string();
    }

    let mut directives = vec![configured_level.to_string()];
    directives.extend(QUIET_DEPENDENCIES.iter().map(|d| (*d).to_string()));
    directives.join(",")
}

fn build_env_filter(configured_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directives(configured_level)))
}

/// Install the global tracing subscriber and the `log::` bridge exactly once.
///
/// Later calls are no-ops so tests and embedded uses can call it freely.
pub fn init_tracing(config: &AppConfig) -> Result<(), TelemetryInitError> {
    if TELEMETRY_INITIALIZED
        .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
        .is_err()
    {
        return Ok(());
    }

    // The bridge must be in place before the first `log::` macro fires.
    if let Err(err) = LogTracer::builder()
        .with_max_level(LevelFilter::Trace)
        .init()
    {
        // A LogTracer registered by an earlier caller is fine; any other
        // logger means `log::` output will bypass tracing.
        let logger_type = type_name_of_val(log::logger());
        if !logger_type.contains("LogTracer") {
            eprintln!("Warning: log bridge not installed ({}); `log::` macros will not reach the tracing pipeline", err);
        }
    }

    let fmt_layer = match config.log_format.as_str() {
        "pretty" => fmt::layer().pretty().boxed(),
        _ => fmt::layer().json().boxed(),
    };

    if let Err(err) = tracing_subscriber::registry()
        .with(build_env_filter(&config.log_level))
        .with(fmt_layer)
        .try_init()
    {
        TELEMETRY_INITIALIZED.store(false, Ordering::SeqCst);
        eprintln!(
            "Warning: tracing subscriber not installed ({}); an earlier subscriber remains active",
            err
        );
    }

    Ok(())
}

/// Run `future` with `context` available through [`current_trace_id`].
pub async fn with_trace_context<Fut, R>(context: TraceContext, future: Fut) -> R
where
    Fut: std::future::Future<Output = R>,
{
    ACTIVE_TRACE_CONTEXT.scope(context, future).await
}

/// Trace ID of the running task, if a request context is active.
pub fn current_trace_id() -> Option<String> {
    ACTIVE_TRACE_CONTEXT
        .try_with(|ctx| ctx.trace_id.clone())
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn trace_id_is_scoped_to_the_wrapped_future() {
        assert_eq!(current_trace_id(), None);

        let context = TraceContext {
            trace_id: "trace-123".to_string(),
        };
        let seen = with_trace_context(context, async { current_trace_id() }).await;
        assert_eq!(seen.as_deref(), Some("trace-123"));

        assert_eq!(current_trace_id(), None);
    }

    #[test]
    fn plain_levels_gain_dependency_quieting() {
        let directives = filter_directives("info");
        assert!(directives.contains("html5ever=warn"));
        assert!(directives.contains("sqlx=warn"));

        // Explicit directives are left alone
        assert_eq!(filter_directives("debug,hyper=info"), "debug,hyper=info");
    }
}
