//! Integration tests for the crawler
//!
//! These tests use wiremock to serve listing and detail pages and run the
//! full crawl cycle end-to-end against a real SQLite file and checkpoint.

use listing_harvest::checkpoint::JsonCheckpointStore;
use listing_harvest::config::{parse_config, Config};
use listing_harvest::output::export_sink;
use listing_harvest::storage::{Sink, SqliteSink};
use listing_harvest::{HarvestError, Orchestrator, RunState, StopReason};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration pointing at the mock server
fn create_test_config(
    base_url: &str,
    dir: &Path,
    keywords: &[&str],
    pages: u32,
    target: u64,
    fetch_details: bool,
) -> Config {
    let keywords = keywords
        .iter()
        .map(|k| format!("\"{}\"", k))
        .collect::<Vec<_>>()
        .join(", ");

    parse_config(&format!(
        r#"
[crawler]
keywords = [{keywords}]
pages-per-keyword = {pages}
target-items = {target}
fetch-details = {fetch_details}

[fetch]
request-timeout = 5
retry-delay = 0
listing-delay-min = 0
listing-delay-max = 0
detail-delay-min = 0
detail-delay-max = 0

[user-agent]
crawler-name = "TestBot"
crawler-version = "1.0.0"
contact-url = "https://example.com/contact"
contact-email = "test@example.com"

[site]
listing-url = "{base_url}/empleos/de-{{keyword}}/"
detail-url = "{base_url}/empleos/empleo-{{id}}/"

[output]
checkpoint-path = "{checkpoint}"
database-path = "{database}"
csv-path = "{csv}"
"#,
        checkpoint = dir.join("checkpoint.json").display(),
        database = dir.join("jobs.db").display(),
        csv = dir.join("jobs.csv").display(),
    ))
    .expect("test config should be valid")
}

/// Renders a listing page with one job card per id
fn listing_html(ids: &[u32]) -> String {
    let cards: String = ids
        .iter()
        .map(|id| {
            format!(
                r#"<div id="jobcard-{id}">
                     <h2>Analista {id}</h2>
                     <div class="flex flex-row justify-between items-center">
                       <span>Empresa {id}</span>, <span>Guadalajara, Jalisco</span>
                     </div>
                     <span class="mr-2 text-grey-900 font-base font-light mb-4">$15,000 Mensual</span>
                   </div>"#
            )
        })
        .collect();
    format!("<html><body>{}</body></html>", cards)
}

fn html(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(body)
        .insert_header("content-type", "text/html")
}

/// Mounts a listing page; later pages must be mounted before page 1
async fn mount_listing(server: &MockServer, keyword: &str, page: u32, ids: &[u32]) {
    let route = format!("/empleos/de-{}/", keyword);
    let mock = Mock::given(method("GET")).and(path(route.as_str()));
    let mock = if page > 1 {
        mock.and(query_param("page", page.to_string().as_str()))
    } else {
        mock
    };
    mock.respond_with(html(listing_html(ids)))
        .mount(server)
        .await;
}

fn checkpoint_store(dir: &Path) -> JsonCheckpointStore {
    JsonCheckpointStore::new(dir.join("checkpoint.json"))
}

fn database(dir: &Path) -> PathBuf {
    dir.join("jobs.db")
}

#[tokio::test]
async fn test_crawl_stops_at_target() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_listing(&server, "a", 2, &[101]).await;
    mount_listing(&server, "b", 2, &[105]).await;
    mount_listing(&server, "a", 1, &[101, 102]).await;
    mount_listing(&server, "b", 1, &[103, 104]).await;

    let config = create_test_config(&server.uri(), dir.path(), &["a", "b"], 2, 3, false);
    let mut orchestrator = Orchestrator::from_config(&config).unwrap();
    let outcome = orchestrator.run(CancellationToken::new()).await.unwrap();

    assert_eq!(outcome.state, RunState::Completed);
    assert_eq!(outcome.stop_reason, StopReason::TargetReached);
    assert_eq!(outcome.cells_processed, 3);
    assert_eq!(outcome.stats.total_items, 4);

    let checkpoint = checkpoint_store(dir.path())
        .load_checked()
        .unwrap()
        .expect("checkpoint should exist");
    assert_eq!(checkpoint.total_items, 4);
    assert_eq!((checkpoint.current_keyword, checkpoint.current_page), (2, 1));
    assert_eq!(checkpoint.keywords_completed, 1);
    assert_eq!(checkpoint.jobs_per_page, vec![2, 0, 2]);
    assert_eq!(checkpoint.seen_links.len(), 4);

    let sink = SqliteSink::new(&database(dir.path())).unwrap();
    assert_eq!(sink.count().unwrap(), 4);
    let first = sink
        .get_by_key(&format!("{}/empleos/empleo-101/", server.uri()))
        .unwrap()
        .expect("listing 101 should be stored");
    assert_eq!(first.organization, "Empresa 101");
    assert_eq!(first.keyword, "a");
}

#[tokio::test]
async fn test_failed_page_is_skipped() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_listing(&server, "a", 2, &[201, 202]).await;
    Mock::given(method("GET"))
        .and(path("/empleos/de-a/"))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&server)
        .await;

    let config = create_test_config(&server.uri(), dir.path(), &["a"], 2, 100, false);
    let mut orchestrator = Orchestrator::from_config(&config).unwrap();
    let outcome = orchestrator.run(CancellationToken::new()).await.unwrap();

    assert_eq!(outcome.stop_reason, StopReason::PlanExhausted);
    assert_eq!(outcome.cells_processed, 2);

    let checkpoint = checkpoint_store(dir.path()).load_checked().unwrap().unwrap();
    assert_eq!(checkpoint.jobs_per_page, vec![0, 2]);
    assert_eq!((checkpoint.current_keyword, checkpoint.current_page), (1, 2));
    assert_eq!(checkpoint.total_items, 2);
}

#[tokio::test]
async fn test_resume_continues_after_last_page() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_listing(&server, "a", 2, &[302, 303]).await;
    Mock::given(method("GET"))
        .and(path("/empleos/de-a/"))
        .respond_with(html(listing_html(&[300, 301])))
        .expect(1)
        .mount(&server)
        .await;

    let config = create_test_config(&server.uri(), dir.path(), &["a"], 2, 2, false);
    let first = Orchestrator::from_config(&config)
        .unwrap()
        .run(CancellationToken::new())
        .await;
    let first = first.unwrap();
    assert_eq!(first.stop_reason, StopReason::TargetReached);
    assert_eq!(first.cells_processed, 1);

    let config = create_test_config(&server.uri(), dir.path(), &["a"], 2, 10, false);
    let mut orchestrator = Orchestrator::from_config(&config).unwrap();
    let second = orchestrator.run(CancellationToken::new()).await.unwrap();

    assert_eq!(second.stop_reason, StopReason::PlanExhausted);
    assert_eq!(second.cells_processed, 1);
    assert_eq!(second.stats.total_items, 4);

    let sink = SqliteSink::new(&database(dir.path())).unwrap();
    assert_eq!(sink.count().unwrap(), 4);
}

#[tokio::test]
async fn test_rerun_at_target_does_nothing() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_listing(&server, "a", 1, &[401, 402]).await;

    let config = create_test_config(&server.uri(), dir.path(), &["a"], 1, 2, false);
    let mut orchestrator = Orchestrator::from_config(&config).unwrap();
    orchestrator.run(CancellationToken::new()).await.unwrap();
    let before = checkpoint_store(dir.path()).load_checked().unwrap().unwrap();

    let mut orchestrator = Orchestrator::from_config(&config).unwrap();
    let outcome = orchestrator.run(CancellationToken::new()).await.unwrap();

    assert_eq!(outcome.state, RunState::Completed);
    assert_eq!(outcome.stop_reason, StopReason::TargetReached);
    assert_eq!(outcome.cells_processed, 0);

    let after = checkpoint_store(dir.path()).load_checked().unwrap().unwrap();
    assert_eq!(after.total_items, before.total_items);
    assert_eq!(after.seen_links, before.seen_links);
    assert_eq!(after.jobs_per_page, before.jobs_per_page);
}

#[tokio::test]
async fn test_duplicates_across_keywords_are_counted_once() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_listing(&server, "a", 1, &[501, 502]).await;
    mount_listing(&server, "b", 1, &[502, 501, 503]).await;

    let config = create_test_config(&server.uri(), dir.path(), &["a", "b"], 1, 100, false);
    let mut orchestrator = Orchestrator::from_config(&config).unwrap();
    let outcome = orchestrator.run(CancellationToken::new()).await.unwrap();

    assert_eq!(outcome.stop_reason, StopReason::PlanExhausted);
    assert_eq!(outcome.stats.total_items, 3);

    let checkpoint = checkpoint_store(dir.path()).load_checked().unwrap().unwrap();
    assert_eq!(checkpoint.jobs_per_page, vec![2, 1]);
    assert_eq!(checkpoint.keywords_completed, 2);
}

#[tokio::test]
async fn test_details_are_fetched_and_exported() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_listing(&server, "a", 1, &[601]).await;
    Mock::given(method("GET"))
        .and(path("/empleos/empleo-601/"))
        .respond_with(html(
            r#"<html><body><div class="job-description">
                 Administración de   nómina y prestaciones.
               </div></body></html>"#
                .to_string(),
        ))
        .expect(1)
        .mount(&server)
        .await;

    let config = create_test_config(&server.uri(), dir.path(), &["a"], 1, 100, true);
    let mut orchestrator = Orchestrator::from_config(&config).unwrap();
    orchestrator.run(CancellationToken::new()).await.unwrap();

    let sink = SqliteSink::new(&database(dir.path())).unwrap();
    let items = sink.all_items().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].description, "Administración de nómina y prestaciones.");

    let csv_path = dir.path().join("jobs.csv");
    assert_eq!(export_sink(&sink, &csv_path).unwrap(), 1);
    let exported = std::fs::read_to_string(&csv_path).unwrap();
    assert!(exported.contains("Administración de nómina y prestaciones."));
}

#[tokio::test]
async fn test_corrupt_checkpoint_starts_fresh() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    std::fs::write(dir.path().join("checkpoint.json"), "{ not json").unwrap();
    std::fs::write(dir.path().join("checkpoint.json.tmp"), "half written").unwrap();
    mount_listing(&server, "a", 1, &[701]).await;

    let config = create_test_config(&server.uri(), dir.path(), &["a"], 1, 100, false);
    let mut orchestrator = Orchestrator::from_config(&config).unwrap();
    let outcome = orchestrator.run(CancellationToken::new()).await.unwrap();

    assert_eq!(outcome.cells_processed, 1);
    let checkpoint = checkpoint_store(dir.path()).load_checked().unwrap().unwrap();
    assert_eq!(checkpoint.total_items, 1);
}

#[tokio::test]
async fn test_cancelled_before_start_fetches_nothing() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .respond_with(html(listing_html(&[801])))
        .expect(0)
        .mount(&server)
        .await;

    let config = create_test_config(&server.uri(), dir.path(), &["a"], 3, 100, false);
    let token = CancellationToken::new();
    token.cancel();

    let mut orchestrator = Orchestrator::from_config(&config).unwrap();
    let outcome = orchestrator.run(token).await.unwrap();

    assert_eq!(outcome.state, RunState::Completed);
    assert_eq!(outcome.stop_reason, StopReason::Cancelled);
    assert_eq!(outcome.cells_processed, 0);
}

#[tokio::test]
async fn test_unwritable_checkpoint_aborts_run() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .respond_with(html(listing_html(&[901])))
        .expect(0)
        .mount(&server)
        .await;

    let mut config = create_test_config(&server.uri(), dir.path(), &["a"], 1, 100, false);
    let blocker = dir.path().join("blocker");
    std::fs::write(&blocker, "not a directory").unwrap();
    config.output.checkpoint_path = blocker.join("checkpoint.json").display().to_string();

    let mut orchestrator = Orchestrator::from_config(&config).unwrap();
    let result = orchestrator.run(CancellationToken::new()).await;

    assert!(matches!(result, Err(HarvestError::SetupFatal(_))));
    assert_eq!(orchestrator.state(), RunState::Aborted);
}
