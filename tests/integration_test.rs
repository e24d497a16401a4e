// Integration tests for ct-sweep against a mock CT search endpoint
use ct_sweep::config::EnumConfig;
use ct_sweep::ct_search::{CertSource, CrtShClient, Dispatcher, Enumerator};
use ct_sweep::output::directory::{DirectorySink, SUBDOMAINS_FILE, WILDCARDS_FILE};
use ct_sweep::progress::ProgressIndicator;
use ct_sweep::stats::StatsCollector;
use ct_sweep::types::RunStatus;

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio_test::{assert_err, assert_ok};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_config(server: &MockServer, workers: usize, skip_done: bool) -> EnumConfig {
    EnumConfig {
        endpoint: format!("{}/", server.uri()),
        workers,
        rate_delay: Duration::ZERO,
        max_retries: 3,
        timeout: Duration::from_secs(5),
        skip_done,
        max_queries: None,
    }
}

fn build_dispatcher(config: &EnumConfig, out_dir: &Path, stats: StatsCollector) -> Dispatcher {
    let client = CrtShClient::new(config, stats.clone()).unwrap();
    let enumerator = Enumerator::new(Arc::new(client), config.max_queries, stats.clone());
    Dispatcher::new(
        Arc::new(enumerator),
        Arc::new(DirectorySink::new(out_dir)),
        config,
        stats,
        ProgressIndicator::new(false),
    )
}

/// Answer `q=%.{pattern}` with the given JSON body
async fn mount_json(server: &MockServer, pattern: &str, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/"))
        .and(query_param("q", format!("%.{}", pattern)))
        .and(query_param("output", "json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

fn read(dir: &Path, seed: &str, file: &str) -> String {
    std::fs::read_to_string(dir.join(seed).join(file)).unwrap()
}

#[tokio::test]
async fn test_fetch_returns_body() {
    let server = MockServer::start().await;
    mount_json(
        &server,
        "example.com",
        serde_json::json!([{ "name_value": "www.example.com" }]),
    )
    .await;

    let stats = StatsCollector::new();
    let client = CrtShClient::new(&test_config(&server, 1, true), stats.clone()).unwrap();

    let body = assert_ok!(client.fetch("example.com").await);
    let text = String::from_utf8(body).unwrap();
    assert!(text.contains("www.example.com"));
    assert_eq!(stats.snapshot().requests_sent, 1);
    assert_eq!(stats.snapshot().requests_failed, 0);
}

#[tokio::test]
async fn test_retry_exhaustion_makes_exact_attempts() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&server)
        .await;

    let stats = StatsCollector::new();
    let client = CrtShClient::new(&test_config(&server, 1, true), stats.clone()).unwrap();

    assert_err!(client.fetch("example.com").await);

    let snapshot = stats.snapshot();
    assert_eq!(snapshot.requests_sent, 3);
    assert_eq!(snapshot.requests_failed, 3);
}

#[tokio::test]
async fn test_retry_recovers_after_transient_failures() {
    let server = MockServer::start().await;

    // First two attempts fail, the third succeeds
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(502))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    mount_json(
        &server,
        "example.com",
        serde_json::json!([{ "name_value": "api.example.com" }]),
    )
    .await;

    let stats = StatsCollector::new();
    let client = CrtShClient::new(&test_config(&server, 1, true), stats.clone()).unwrap();

    let body = assert_ok!(client.fetch("example.com").await);
    assert!(String::from_utf8(body).unwrap().contains("api.example.com"));
    assert_eq!(stats.snapshot().requests_sent, 3);
    assert_eq!(stats.snapshot().requests_failed, 2);
}

#[tokio::test]
async fn test_rate_delay_applied_after_success() {
    let server = MockServer::start().await;
    mount_json(&server, "example.com", serde_json::json!([])).await;

    let mut config = test_config(&server, 1, true);
    config.rate_delay = Duration::from_millis(200);
    let client = CrtShClient::new(&config, StatsCollector::new()).unwrap();

    let started = std::time::Instant::now();
    assert_ok!(client.fetch("example.com").await);
    assert!(started.elapsed() >= Duration::from_millis(200));
}

#[tokio::test]
async fn test_rate_delay_applied_after_each_failure() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&server)
        .await;

    let mut config = test_config(&server, 1, true);
    config.rate_delay = Duration::from_millis(100);
    let client = CrtShClient::new(&config, StatsCollector::new()).unwrap();

    let started = std::time::Instant::now();
    assert_err!(client.fetch("example.com").await);
    assert!(started.elapsed() >= Duration::from_millis(300));
}

/// Plain HTTP server that promises more body than it sends, then hangs up
async fn start_truncating_server() -> (String, Arc<AtomicUsize>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let connections = Arc::new(AtomicUsize::new(0));
    let counter = connections.clone();

    tokio::spawn(async move {
        while let Ok((mut stream, _)) = listener.accept().await {
            counter.fetch_add(1, Ordering::SeqCst);

            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                match stream.read(&mut buf).await {
                    Ok(0) | Err(_) => break,
                    Ok(n) => request.extend_from_slice(&buf[..n]),
                }
            }

            let response = "HTTP/1.1 200 OK\r\n\
                            Content-Type: application/json\r\n\
                            Content-Length: 100\r\n\
                            \r\n\
                            [{\"name_value\":";
            let _ = stream.write_all(response.as_bytes()).await;
            let _ = stream.shutdown().await;
        }
    });

    (format!("http://{}/", addr), connections)
}

#[tokio::test]
async fn test_truncated_body_is_retried_as_failure() {
    let (endpoint, connections) = start_truncating_server().await;

    let config = EnumConfig {
        endpoint,
        rate_delay: Duration::ZERO,
        max_retries: 3,
        timeout: Duration::from_secs(5),
        ..EnumConfig::default()
    };
    let stats = StatsCollector::new();
    let client = CrtShClient::new(&config, stats.clone()).unwrap();

    let err = assert_err!(client.fetch("example.com").await);
    assert!(format!("{:#}", err).contains("Failed after 3 attempts"));

    assert_eq!(connections.load(Ordering::SeqCst), 3);
    let snapshot = stats.snapshot();
    assert_eq!(snapshot.requests_sent, 3);
    assert_eq!(snapshot.requests_failed, 3);
}

#[tokio::test]
async fn test_recursive_scenario_writes_files() {
    let server = MockServer::start().await;
    mount_json(
        &server,
        "example.com",
        serde_json::json!([{ "name_value": "www.example.com\n*.shop.example.com" }]),
    )
    .await;
    // Re-announces itself; must not be queried again
    Mock::given(method("GET"))
        .and(query_param("q", "%.shop.example.com"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!([{ "name_value": "*.shop.example.com" }])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let out = TempDir::new().unwrap();
    let dispatcher = build_dispatcher(&test_config(&server, 1, true), out.path(), StatsCollector::new());

    let reports = dispatcher.run(vec!["example.com".to_string()]).await;

    assert_eq!(
        reports[0].status,
        RunStatus::Completed {
            subdomains: 1,
            wildcard_roots: 1,
            queries: 2,
        }
    );
    assert_eq!(read(out.path(), "example.com", SUBDOMAINS_FILE), "www.example.com\n");
    assert_eq!(read(out.path(), "example.com", WILDCARDS_FILE), "shop.example.com\n");
}

#[tokio::test]
async fn test_empty_upstream_creates_empty_files() {
    let server = MockServer::start().await;
    mount_json(&server, "quiet.example", serde_json::json!([])).await;

    let out = TempDir::new().unwrap();
    let dispatcher = build_dispatcher(&test_config(&server, 1, true), out.path(), StatsCollector::new());

    let reports = dispatcher.run(vec!["quiet.example".to_string()]).await;

    assert!(matches!(reports[0].status, RunStatus::Completed { subdomains: 0, wildcard_roots: 0, .. }));
    assert_eq!(read(out.path(), "quiet.example", SUBDOMAINS_FILE), "");
    assert_eq!(read(out.path(), "quiet.example", WILDCARDS_FILE), "");
}

#[tokio::test]
async fn test_skip_done_makes_no_requests() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("[]"))
        .expect(0)
        .mount(&server)
        .await;

    let out = TempDir::new().unwrap();
    let seed_dir = out.path().join("example.com");
    std::fs::create_dir_all(&seed_dir).unwrap();
    std::fs::write(seed_dir.join(SUBDOMAINS_FILE), "www.example.com\n").unwrap();

    let stats = StatsCollector::new();
    let dispatcher = build_dispatcher(&test_config(&server, 1, true), out.path(), stats.clone());

    let reports = dispatcher.run(vec!["example.com".to_string()]).await;

    assert_eq!(reports[0].status, RunStatus::Skipped);
    assert_eq!(stats.snapshot().domains_skipped, 1);
    assert_eq!(read(out.path(), "example.com", SUBDOMAINS_FILE), "www.example.com\n");
}

#[tokio::test]
async fn test_empty_existing_results_are_not_skipped() {
    let server = MockServer::start().await;
    mount_json(
        &server,
        "example.com",
        serde_json::json!([{ "name_value": "www.example.com" }]),
    )
    .await;

    let out = TempDir::new().unwrap();
    let seed_dir = out.path().join("example.com");
    std::fs::create_dir_all(&seed_dir).unwrap();
    std::fs::write(seed_dir.join(SUBDOMAINS_FILE), "").unwrap();

    let dispatcher = build_dispatcher(&test_config(&server, 1, true), out.path(), StatsCollector::new());
    let reports = dispatcher.run(vec!["example.com".to_string()]).await;

    assert!(matches!(reports[0].status, RunStatus::Completed { .. }));
    assert_eq!(read(out.path(), "example.com", SUBDOMAINS_FILE), "www.example.com\n");
}

#[tokio::test]
async fn test_abandoned_and_invalid_seeds_do_not_stop_batch() {
    let server = MockServer::start().await;
    mount_json(
        &server,
        "good.example",
        serde_json::json!([{ "name_value": "www.good.example" }]),
    )
    .await;
    Mock::given(method("GET"))
        .and(query_param("q", "%.down.example"))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(query_param("q", "%.garbled.example"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .expect(1)
        .mount(&server)
        .await;

    let out = TempDir::new().unwrap();
    let stats = StatsCollector::new();
    let dispatcher = build_dispatcher(&test_config(&server, 1, true), out.path(), stats.clone());

    let reports = dispatcher
        .run(vec![
            "down.example".to_string(),
            "../escape".to_string(),
            "garbled.example".to_string(),
            "good.example".to_string(),
        ])
        .await;

    assert_eq!(reports.len(), 4);
    assert!(matches!(reports[0].status, RunStatus::Completed { .. }));
    assert!(reports[1].status.is_failure());
    assert!(matches!(reports[2].status, RunStatus::Completed { .. }));
    assert!(matches!(reports[3].status, RunStatus::Completed { subdomains: 1, .. }));

    assert_eq!(read(out.path(), "down.example", SUBDOMAINS_FILE), "");
    assert_eq!(read(out.path(), "garbled.example", SUBDOMAINS_FILE), "");
    assert_eq!(read(out.path(), "good.example", SUBDOMAINS_FILE), "www.good.example\n");

    let snapshot = stats.snapshot();
    assert_eq!(snapshot.hostnames_abandoned, 2);
    assert_eq!(snapshot.domains_failed, 1);
    assert_eq!(snapshot.domains_completed, 3);
}

async fn mount_fleet(server: &MockServer) -> Vec<String> {
    let seeds = ["alpha.test", "bravo.test", "charlie.test", "delta.test", "echo.test", "foxtrot.test"];

    for (i, seed) in seeds.iter().enumerate() {
        mount_json(
            server,
            seed,
            serde_json::json!([
                { "name_value": format!("www.{seed}\n*.zone{i}.{seed}") },
                { "name_value": format!("mail.{seed}") },
            ]),
        )
        .await;
        mount_json(
            server,
            &format!("zone{i}.{seed}"),
            serde_json::json!([
                { "name_value": format!("host{i}.zone{i}.{seed}\n*.{seed}") },
            ]),
        )
        .await;
    }

    seeds.iter().map(|s| s.to_string()).collect()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_results_match_sequential() {
    let server = MockServer::start().await;
    let seeds = mount_fleet(&server).await;

    let sequential_out = TempDir::new().unwrap();
    let sequential = build_dispatcher(
        &test_config(&server, 1, false),
        sequential_out.path(),
        StatsCollector::new(),
    )
    .run(seeds.clone())
    .await;

    let concurrent_out = TempDir::new().unwrap();
    let concurrent = build_dispatcher(
        &test_config(&server, 4, false),
        concurrent_out.path(),
        StatsCollector::new(),
    )
    .run(seeds.clone())
    .await;

    assert_eq!(sequential, concurrent);

    for seed in &seeds {
        for file in [SUBDOMAINS_FILE, WILDCARDS_FILE] {
            assert_eq!(
                read(sequential_out.path(), seed, file),
                read(concurrent_out.path(), seed, file),
                "{} differs for {}",
                file,
                seed
            );
        }
    }

    assert_eq!(
        read(concurrent_out.path(), "charlie.test", SUBDOMAINS_FILE),
        "host2.zone2.charlie.test\nmail.charlie.test\nwww.charlie.test\n"
    );
    assert_eq!(
        read(concurrent_out.path(), "charlie.test", WILDCARDS_FILE),
        "charlie.test\nzone2.charlie.test\n"
    );
}
