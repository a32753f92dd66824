//! API-Football adapter tests, including the in-band error object the
//! upstream uses instead of HTTP status codes.

#[path = "test_utils/mod.rs"]
mod test_utils;

use anyhow::Result;
use fixturecast::config::IngestConfig;
use fixturecast::sources::{
    FetchContext, FixturesApiSource, IngestWindow, SourceAdapter, SourceError,
};
use serde_json::json;
use test_utils::channel_model;
use uuid::Uuid;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn source_for(server: &MockServer) -> FixturesApiSource {
    FixturesApiSource::new(
        "fixtkey".to_string(),
        server.uri(),
        &IngestConfig::default(),
    )
}

fn test_context() -> FetchContext {
    FetchContext::new(
        Uuid::new_v4(),
        IngestWindow::from_now(7),
        vec![channel_model("Sky Sports")],
    )
}

#[tokio::test]
async fn fixtures_become_events_on_the_configured_channel() -> Result<()> {
    let mock_server = MockServer::start().await;

    let full_row = json!({
        "fixture": { "date": "2025-09-01T16:30:00+00:00" },
        "league": { "name": "Premier League", "round": "4" },
        "teams": {
            "home": { "name": "Arsenal" },
            "away": { "name": "Chelsea" }
        }
    });
    let incomplete_row = json!({
        "fixture": { "date": "2025-09-01T19:00:00+00:00" }
    });

    Mock::given(method("GET"))
        .and(path("/fixtures"))
        .and(header("x-apisports-key", "fixtkey"))
        .and(query_param("league", "39"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "errors": [],
            "response": [full_row, incomplete_row]
        })))
        .mount(&mock_server)
        .await;

    let outcome = source_for(&mock_server).fetch(&test_context()).await?;

    assert_eq!(outcome.events.len(), 1);
    let event = &outcome.events[0];
    assert_eq!(event.title, "Arsenal vs Chelsea");
    assert_eq!(event.channel_name, "Sky Sports");
    assert_eq!(event.home_team.as_deref(), Some("Arsenal"));
    assert_eq!(event.away_team.as_deref(), Some("Chelsea"));
    assert_eq!(
        event.description.as_deref(),
        Some("Premier League - Round 4")
    );
    assert_eq!(outcome.skipped_at_source, 1);
    assert_eq!(outcome.sources_consulted, 1);
    Ok(())
}

#[tokio::test]
async fn token_error_in_the_body_maps_to_auth() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/fixtures"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "errors": { "token": "Error/Missing application key." },
            "response": []
        })))
        .mount(&mock_server)
        .await;

    let err = source_for(&mock_server)
        .fetch(&test_context())
        .await
        .expect_err("token error should fail the fetch");
    assert!(matches!(err, SourceError::Auth { .. }));
}

#[tokio::test]
async fn request_quota_error_maps_to_rate_limited() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/fixtures"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "errors": { "requests": "You have reached the request limit for the day." },
            "response": []
        })))
        .mount(&mock_server)
        .await;

    let err = source_for(&mock_server)
        .fetch(&test_context())
        .await
        .expect_err("quota error should fail the fetch");
    assert!(matches!(
        err,
        SourceError::RateLimited {
            retry_after_secs: None
        }
    ));
}

#[tokio::test]
async fn http_failure_maps_to_unavailable() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/fixtures"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let err = source_for(&mock_server)
        .fetch(&test_context())
        .await
        .expect_err("500 should fail the fetch");
    assert!(matches!(err, SourceError::Unavailable { .. }));
}
