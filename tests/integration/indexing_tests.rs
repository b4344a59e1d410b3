//! Integration tests for the indexing core
//!
//! These tests use wiremock to serve a small site over HTTP and run full
//! indexing passes against a real SQLite database.

use lemma_crawl::config::{parse_config, IndexingConfig, SiteConfig, UserAgentConfig};
use lemma_crawl::crawler::HttpFetcher;
use lemma_crawl::indexing::{IndexingService, WordLemmaExtractor};
use lemma_crawl::storage::{SqliteStorage, Storage};
use lemma_crawl::{IndexingError, SiteStatus};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(format!("<html><body>{}</body></html>", body))
        .insert_header("content-type", "text/html")
}

async fn mount_page(server: &MockServer, page: &str, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(page))
        .respond_with(response)
        .mount(server)
        .await;
}

/// Root with two links whose text contains "test" three times
async fn mount_example_site(server: &MockServer) {
    mount_page(
        server,
        "/",
        html(r#"<p>test test test</p><a href="/page1">Page 1</a><a href="page2">Page 2</a>"#),
    )
    .await;
    mount_page(server, "/page1", html("<p>a test page</p>")).await;
    mount_page(server, "/page2", html("<p>nothing here</p>")).await;
}

fn fetcher() -> Arc<HttpFetcher> {
    let user_agent = UserAgentConfig {
        user_agent: "LemmaCrawlTest/1.0".to_string(),
        referer: "https://www.google.com".to_string(),
    };
    Arc::new(HttpFetcher::new(&user_agent, Duration::from_secs(5)).expect("Failed to build fetcher"))
}

fn create_service(site_url: &str) -> (Arc<SqliteStorage>, IndexingService) {
    let storage = Arc::new(SqliteStorage::new_in_memory().expect("Failed to open database"));
    let settings = IndexingConfig {
        fetch_delay_ms: 0,
        ..IndexingConfig::default()
    };
    let service = IndexingService::new(
        vec![SiteConfig::new(site_url, "Example")],
        settings,
        storage.clone(),
        fetcher(),
        Arc::new(WordLemmaExtractor::default()),
    );
    (storage, service)
}

async fn run_to_completion(service: &IndexingService) {
    service.start_indexing().expect("Failed to start indexing");
    tokio::time::timeout(Duration::from_secs(10), service.wait_for_idle())
        .await
        .expect("Indexing did not finish in time");
}

#[tokio::test]
async fn test_end_to_end_single_site() {
    let server = MockServer::start().await;
    mount_example_site(&server).await;
    let (storage, service) = create_service(&server.uri());

    run_to_completion(&service).await;

    let sites = storage.list_sites().unwrap();
    assert_eq!(sites.len(), 1);
    let site = &sites[0];
    assert_eq!(site.status, SiteStatus::Indexed);
    assert_eq!(site.name, "Example");
    assert_eq!(site.last_error, None);

    let pages = storage.list_pages(site.id).unwrap();
    let paths: Vec<&str> = pages.iter().map(|p| p.path.as_str()).collect();
    assert_eq!(paths, vec!["/", "/page1", "/page2"]);
    assert!(pages.iter().all(|p| p.code == 200));

    let lemma = storage.find_lemma(site.id, "test").unwrap().expect("lemma 'test' missing");
    assert!(lemma.frequency >= 3);
    assert_eq!(lemma.frequency, 4);

    // Every page containing "test" links to the lemma with its local count
    let rank_on = |page_path: &str| {
        let page = pages.iter().find(|p| p.path == page_path).unwrap();
        storage
            .index_entries_for_page(page.id)
            .unwrap()
            .into_iter()
            .find(|entry| entry.lemma_id == lemma.id)
            .map(|entry| entry.rank)
    };
    assert_eq!(rank_on("/"), Some(3.0));
    assert_eq!(rank_on("/page1"), Some(1.0));
    assert_eq!(rank_on("/page2"), None);
}

#[tokio::test]
async fn test_recrawl_is_idempotent_for_pages_and_additive_for_lemmas() {
    let server = MockServer::start().await;
    mount_example_site(&server).await;
    let (storage, service) = create_service(&server.uri());

    run_to_completion(&service).await;
    let site = storage.list_sites().unwrap().remove(0);
    let first_pages = storage.list_pages(site.id).unwrap();
    let first_frequency = storage.find_lemma(site.id, "test").unwrap().unwrap().frequency;

    run_to_completion(&service).await;

    assert_eq!(storage.list_sites().unwrap().len(), 1);
    assert_eq!(storage.list_pages(site.id).unwrap(), first_pages);
    assert_eq!(
        storage.find_lemma(site.id, "test").unwrap().unwrap().frequency,
        first_frequency * 2
    );

    // "test" and "page" on the root, no duplicate entries
    let root = &first_pages[0];
    assert_eq!(storage.index_entries_for_page(root.id).unwrap().len(), 2);
}

#[tokio::test]
async fn test_broken_link_does_not_fail_site() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        html(r#"<a href="/missing">Gone</a><a href="/page1">Page 1</a>"#),
    )
    .await;
    mount_page(&server, "/missing", ResponseTemplate::new(404)).await;
    mount_page(&server, "/page1", html("<p>still here</p>")).await;
    let (storage, service) = create_service(&server.uri());

    run_to_completion(&service).await;

    let site = storage.list_sites().unwrap().remove(0);
    assert_eq!(site.status, SiteStatus::Indexed);
    let paths: Vec<String> = storage
        .list_pages(site.id)
        .unwrap()
        .into_iter()
        .map(|p| p.path)
        .collect();
    assert_eq!(paths, vec!["/", "/page1"]);
}

#[tokio::test]
async fn test_unreachable_root_fails_site() {
    let server = MockServer::start().await;
    mount_page(&server, "/", ResponseTemplate::new(500)).await;
    let (storage, service) = create_service(&server.uri());

    run_to_completion(&service).await;

    let site = storage.list_sites().unwrap().remove(0);
    assert_eq!(site.status, SiteStatus::Failed);
    let error = site.last_error.expect("failed site must record its error");
    assert!(error.contains("500"), "unexpected error: {}", error);
    assert!(storage.list_pages(site.id).unwrap().is_empty());
}

#[tokio::test]
async fn test_single_page_reindex() {
    let server = MockServer::start().await;
    mount_example_site(&server).await;
    let (storage, service) = create_service(&server.uri());

    let before_crawl = service.index_page(&format!("{}/page1", server.uri())).await;
    assert!(matches!(before_crawl, Err(IndexingError::SiteNotFound(_))));

    run_to_completion(&service).await;

    let page = service
        .index_page(&format!("{}/page1", server.uri()))
        .await
        .expect("Failed to re-index page");
    assert_eq!(page.path, "/page1");

    let site = storage.list_sites().unwrap().remove(0);
    assert_eq!(storage.list_pages(site.id).unwrap().len(), 3);
    assert_eq!(
        storage.find_lemma(site.id, "test").unwrap().unwrap().frequency,
        5
    );

    let foreign = service.index_page("http://unknown.invalid/page").await;
    assert!(matches!(foreign, Err(IndexingError::SiteNotFound(_))));
}

#[tokio::test]
async fn test_service_from_config_file_database() {
    let server = MockServer::start().await;
    mount_example_site(&server).await;
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("index.db");

    let config = parse_config(&format!(
        r#"
[indexing]
fetch-delay-ms = 0

[user-agent]
user-agent = "LemmaCrawlTest/1.0"
referer = "https://www.google.com"

[storage]
database-path = "{}"

[[sites]]
url = "{}"
name = "Example"
"#,
        db_path.display(),
        server.uri()
    ))
    .expect("Failed to parse config");

    let service = IndexingService::from_config(&config).expect("Failed to build service");
    run_to_completion(&service).await;

    let storage = SqliteStorage::new(&db_path).unwrap();
    let site = storage.find_site_by_url(&server.uri()).unwrap().unwrap();
    assert_eq!(site.status, SiteStatus::Indexed);
    assert_eq!(storage.site_statistics(site.id).unwrap().pages, 3);
}
