use std::path::Path;
use tempfile::TempDir;
use wayback_mirror::archive::{TimeRangeSpec, TimeSpec};
use wayback_mirror::config::Config;
use wayback_mirror::crawler::Coordinator;
use wayback_mirror::output::CrawlStatistics;
use wiremock::matchers::{method, path, path_regex, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const INDEX_PATH: &str = "/cdx/search/cdx";
const HEADER: &str = r#"["timestamp","original","statuscode","digest"]"#;

/// Creates a test configuration pointed at the mock archive
fn create_test_config(archive: &MockServer, output: &Path) -> Config {
    let mut config = Config::from_domains(vec!["example.com".to_string()]);
    config.archive.base_url = archive.uri();
    config.archive.time_range =
        TimeRangeSpec::Pair(vec![TimeSpec::from("20200101"), TimeSpec::from("20201231")]);
    config.crawler.concurrency = 4;
    config.output.directory = output.to_string_lossy().to_string();
    config.crawler.retry_delay = 10;
    config.user_agent.crawler_name = "TestBot".to_string();
    config
}

/// Index listing body with the given (timestamp, original, status, digest) rows
fn listing(rows: &[(&str, &str, &str, &str)]) -> String {
    let mut lines = vec![HEADER.to_string()];
    for (timestamp, original, status, digest) in rows {
        lines.push(format!(
            r#"["{}","{}","{}","{}"]"#,
            timestamp, original, status, digest
        ));
    }
    format!("[{}]", lines.join(","))
}

async fn mount_index(server: &MockServer, target: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(INDEX_PATH))
        .and(query_param("url", target))
        .and(query_param("output", "json"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(body, "application/json"),
        )
        .mount(server)
        .await;
}

async fn mount_snapshot(server: &MockServer, timestamp: &str, html: &str) {
    Mock::given(method("GET"))
        .and(path_regex(format!("^/web/{}id_/", timestamp)))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(html, "text/html; charset=utf-8"),
        )
        .expect(1)
        .mount(server)
        .await;
}

async fn run(config: Config) -> CrawlStatistics {
    Coordinator::new(config)
        .expect("Failed to create coordinator")
        .run()
        .await
        .expect("Mirror failed")
}

fn snapshot_file(output: &Path, parts: &[&str], name: &str) -> std::path::PathBuf {
    let mut path = output.to_path_buf();
    for part in parts {
        path.push(part);
    }
    path.push(format!("{}.snapshot", name));
    path
}

#[tokio::test]
async fn test_full_mirror_single_domain() {
    let archive = MockServer::start().await;
    let output = TempDir::new().unwrap();

    // Anchor before the window, a duplicate inside it, a change, and a
    // capture after the window
    mount_index(
        &archive,
        "example.com",
        listing(&[
            ("20190601000000", "http://example.com/", "200", "A"),
            ("20200301000000", "http://example.com/", "200", "A"),
            ("20200401000000", "http://example.com/", "301", "R"),
            ("20200601000000", "http://example.com/", "200", "B"),
            ("20210101000000", "http://example.com/", "200", "C"),
        ]),
    )
    .await;
    mount_index(
        &archive,
        "example.com/about",
        listing(&[("20200701000000", "http://example.com/about", "200", "D")]),
    )
    .await;

    mount_snapshot(
        &archive,
        "20190601000000",
        r#"<html><head><title>Home v1</title></head><body>
            <a href="/about">About</a>
            <a href="/logo.png">Logo</a>
            <a href="https://elsewhere.org/">Elsewhere</a>
        </body></html>"#,
    )
    .await;
    mount_snapshot(
        &archive,
        "20200601000000",
        r#"<html><body><a href="/about#team">About</a></body></html>"#,
    )
    .await;
    mount_snapshot(&archive, "20200701000000", "<html><body>About us</body></html>").await;

    let stats = run(create_test_config(&archive, output.path())).await;

    assert_eq!(stats.index_queries, 2);
    assert_eq!(stats.snapshot_requests, 3);
    assert_eq!(stats.snapshots_saved, 3);
    assert_eq!(stats.not_archived, 0);
    assert_eq!(stats.fetch_failures, 0);
    assert_eq!(stats.links_followed, 1);

    let home_v1 = snapshot_file(output.path(), &["example.com"], "20190601000000");
    let home_v2 = snapshot_file(output.path(), &["example.com"], "20200601000000");
    let about = snapshot_file(output.path(), &["example.com", "about"], "20200701000000");

    assert!(std::fs::read_to_string(&home_v1).unwrap().contains("Home v1"));
    assert!(home_v2.exists());
    assert_eq!(
        std::fs::read_to_string(&about).unwrap(),
        "<html><body>About us</body></html>"
    );

    // Unchanged, redirect and out-of-window captures were never stored
    let stored = std::fs::read_dir(output.path().join("example.com"))
        .unwrap()
        .filter(|entry| entry.as_ref().unwrap().path().is_file())
        .count();
    assert_eq!(stored, 2);
}

#[tokio::test]
async fn test_not_archived_fetches_no_snapshots() {
    let archive = MockServer::start().await;
    let output = TempDir::new().unwrap();

    mount_index(&archive, "example.com", format!("[{}]", HEADER)).await;

    Mock::given(method("GET"))
        .and(path_regex("^/web/"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&archive)
        .await;

    let stats = run(create_test_config(&archive, output.path())).await;

    assert_eq!(stats.index_queries, 1);
    assert_eq!(stats.not_archived, 1);
    assert_eq!(stats.snapshots_saved, 0);
    assert!(!output.path().join("example.com").exists());
}

#[tokio::test]
async fn test_index_errors_are_not_retried() {
    let archive = MockServer::start().await;
    let output = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path(INDEX_PATH))
        .respond_with(ResponseTemplate::new(503).set_body_string("<html>busy</html>"))
        .expect(1)
        .mount(&archive)
        .await;

    let stats = run(create_test_config(&archive, output.path())).await;

    assert_eq!(stats.retries, 0);
    assert_eq!(stats.not_archived, 1);
}

#[tokio::test]
async fn test_server_errors_retried_then_surfaced() {
    let archive = MockServer::start().await;
    let output = TempDir::new().unwrap();

    mount_index(
        &archive,
        "example.com",
        listing(&[("20200301000000", "http://example.com/", "200", "A")]),
    )
    .await;

    // The third 503 in a row is handed on instead of retried
    Mock::given(method("GET"))
        .and(path_regex("^/web/20200301000000id_/"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&archive)
        .await;

    let started = std::time::Instant::now();
    let stats = run(create_test_config(&archive, output.path())).await;

    // Retries wait 10ms, then 20ms
    assert!(started.elapsed() >= std::time::Duration::from_millis(30));
    assert_eq!(stats.retries, 2);
    assert_eq!(stats.error_responses, 1);
    assert_eq!(stats.snapshots_saved, 0);
}

#[tokio::test]
async fn test_transient_error_recovers() {
    let archive = MockServer::start().await;
    let output = TempDir::new().unwrap();

    mount_index(
        &archive,
        "example.com",
        listing(&[("20200301000000", "http://example.com/", "200", "A")]),
    )
    .await;

    Mock::given(method("GET"))
        .and(path_regex("^/web/20200301000000id_/"))
        .respond_with(ResponseTemplate::new(502))
        .up_to_n_times(1)
        .mount(&archive)
        .await;
    mount_snapshot(&archive, "20200301000000", "<html>recovered</html>").await;

    let stats = run(create_test_config(&archive, output.path())).await;

    assert_eq!(stats.retries, 1);
    assert_eq!(stats.snapshots_saved, 1);
    assert!(snapshot_file(output.path(), &["example.com"], "20200301000000").exists());
}

#[tokio::test]
async fn test_depth_limit_and_deny_patterns() {
    let archive = MockServer::start().await;
    let output = TempDir::new().unwrap();

    mount_index(
        &archive,
        "example.com",
        listing(&[("20200301000000", "http://example.com/", "200", "A")]),
    )
    .await;
    mount_index(
        &archive,
        "example.com/docs",
        listing(&[("20200302000000", "http://example.com/docs", "200", "B")]),
    )
    .await;

    mount_snapshot(
        &archive,
        "20200301000000",
        r#"<a href="/docs">Docs</a><a href="/private/area">Private</a>"#,
    )
    .await;
    mount_snapshot(&archive, "20200302000000", r#"<a href="/docs/deeper">Deeper</a>"#).await;

    // Neither the denied page nor anything past depth 1 is looked up
    Mock::given(method("GET"))
        .and(path(INDEX_PATH))
        .and(query_param("url", "example.com/private/area"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&archive)
        .await;
    Mock::given(method("GET"))
        .and(path(INDEX_PATH))
        .and(query_param("url", "example.com/docs/deeper"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&archive)
        .await;

    let mut config = create_test_config(&archive, output.path());
    config.mirror.max_depth = Some(1);
    config.mirror.deny = vec!["/private/".to_string()];

    let stats = run(config).await;

    assert_eq!(stats.index_queries, 2);
    assert_eq!(stats.snapshots_saved, 2);
    assert_eq!(stats.links_followed, 1);
}

#[tokio::test]
async fn test_unix_filenames() {
    let archive = MockServer::start().await;
    let output = TempDir::new().unwrap();

    mount_index(
        &archive,
        "example.com",
        listing(&[("20200101000000", "http://example.com/", "200", "A")]),
    )
    .await;
    mount_snapshot(&archive, "20200101000000", "<html></html>").await;

    let mut config = create_test_config(&archive, output.path());
    config.output.unix_filenames = true;

    let stats = run(config).await;

    assert_eq!(stats.snapshots_saved, 1);
    assert!(snapshot_file(output.path(), &["example.com"], "1577836800").exists());
}
