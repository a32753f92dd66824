//! Web scrape adapter tests against mocked listing pages and a real
//! source catalog.

#[path = "test_utils/mod.rs"]
mod test_utils;

use anyhow::Result;
use fixturecast::config::IngestConfig;
use fixturecast::repositories::DataSourceRepository;
use fixturecast::repositories::data_source::NewDataSource;
use fixturecast::sources::{
    FetchContext, IngestWindow, SourceAdapter, SourceError, WebScrapeSource,
};
use test_utils::{channel_model, create_test_tenant, setup_test_db};
use uuid::Uuid;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const LISTING_PAGE: &str = r#"
    <html><body>
      <div class="listing">Premier League: Arsenal vs Chelsea, kick-off 19:30</div>
      <div class="listing">Gardening tips for spring</div>
    </body></html>
"#;

#[tokio::test]
async fn scrapes_registered_pages_and_records_the_visit() -> Result<()> {
    let db = setup_test_db().await?;
    let tenant_id = create_test_tenant(&db, None).await?;
    let mock_server = MockServer::start().await;

    // A non-empty catalog keeps the default seed pages out of the run.
    let repo = DataSourceRepository::new(&db);
    let source = repo
        .create(
            tenant_id,
            NewDataSource {
                name: "Listings Mock".to_string(),
                url: mock_server.uri(),
                description: None,
                is_active: true,
            },
        )
        .await?;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(LISTING_PAGE))
        .mount(&mock_server)
        .await;

    let ctx = FetchContext::new(
        tenant_id,
        IngestWindow::from_now(7),
        vec![channel_model("Sky Sports")],
    )
    .with_db(db.clone());

    let outcome = WebScrapeSource::new(&IngestConfig::default())
        .fetch(&ctx)
        .await?;

    assert_eq!(outcome.events.len(), 1);
    assert_eq!(outcome.events[0].title, "Arsenal vs Chelsea");
    assert_eq!(outcome.events[0].channel_name, "Listings Mock");
    assert!(outcome.events[0].start_time.ends_with("T19:30:00"));
    assert_eq!(outcome.sources_consulted, 1);
    assert_eq!(outcome.failed_calls, 0);

    let refreshed = repo
        .find_by_id(tenant_id, source.id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("source vanished"))?;
    assert_eq!(refreshed.scrape_count, 1);
    assert!(refreshed.last_scraped_at.is_some());
    Ok(())
}

#[tokio::test]
async fn fetch_without_a_database_handle_is_a_config_error() {
    let ctx = FetchContext::new(
        Uuid::new_v4(),
        IngestWindow::from_now(7),
        vec![channel_model("Sky Sports")],
    );

    let err = WebScrapeSource::new(&IngestConfig::default())
        .fetch(&ctx)
        .await
        .expect_err("missing database should be refused");
    assert!(matches!(err, SourceError::Config { .. }));
}

#[tokio::test]
async fn unreachable_page_is_a_failed_call_not_an_error() -> Result<()> {
    let db = setup_test_db().await?;
    let tenant_id = create_test_tenant(&db, None).await?;
    let mock_server = MockServer::start().await;

    DataSourceRepository::new(&db)
        .create(
            tenant_id,
            NewDataSource {
                name: "Broken Mock".to_string(),
                url: mock_server.uri(),
                description: None,
                is_active: true,
            },
        )
        .await?;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let ctx = FetchContext::new(
        tenant_id,
        IngestWindow::from_now(7),
        vec![channel_model("Sky Sports")],
    )
    .with_db(db.clone());

    let outcome = WebScrapeSource::new(&IngestConfig::default())
        .fetch(&ctx)
        .await?;

    assert!(outcome.events.is_empty());
    assert_eq!(outcome.failed_calls, 1);
    assert_eq!(outcome.sources_consulted, 1);
    Ok(())
}
