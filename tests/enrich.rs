//! End-to-end enrichment runs against a mock AbuseIPDB server.

use httpmock::prelude::*;
use serde_json::json;
use zentinel_ip_enrich::config::{AbuseIPDBConfig, InputConfig, OutputConfig};
use zentinel_ip_enrich::{Config, Enricher};

/// Build a config pointing at the mock server with no inter-call delay.
fn make_config(server: &MockServer, dir: &std::path::Path, input: &str) -> Config {
    let input_path = dir.join("ips.txt");
    std::fs::write(&input_path, input).expect("Failed to write input list");

    let mut abuseipdb = AbuseIPDBConfig::with_api_key("integration-key");
    abuseipdb.endpoint = server.url("/api/v2/check");
    abuseipdb.delay_between_ms = 0;
    abuseipdb.default_retry_after_seconds = 0;

    Config {
        abuseipdb,
        input: InputConfig {
            path: input_path,
            max_records: 1000,
        },
        output: OutputConfig {
            path: dir.join("enriched_ips.csv"),
        },
    }
}

#[tokio::test]
async fn test_mixed_outcomes() {
    let server = MockServer::start_async().await;

    let high = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/api/v2/check")
                .header("Key", "integration-key")
                .query_param("ipAddress", "8.8.8.8")
                .query_param("maxAgeInDays", "30");
            then.status(200).json_body(json!({
                "data": {
                    "ipAddress": "8.8.8.8",
                    "abuseConfidenceScore": 92,
                    "totalReports": 12,
                    "lastReportedAt": "2026-10-17T08:00:00+00:00",
                    "countryCode": "US",
                    "usageType": "Content Delivery Network",
                    "isp": "Google LLC",
                    "domain": "google.com"
                }
            }));
        })
        .await;

    let broken = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/api/v2/check")
                .query_param("ipAddress", "1.1.1.1");
            then.status(500).body("internal error");
        })
        .await;

    let limited = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/api/v2/check")
                .query_param("ipAddress", "2001:db8::1");
            then.status(429).header("Retry-After", "0");
        })
        .await;

    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let config = make_config(
        &server,
        dir.path(),
        "8.8.8.8\nnot-an-ip\n1.1.1.1\n\n2001:0db8:0:0:0:0:0:1\n008.8.8.8\n8.8.8.8\n2001:db8::1\n",
    );

    let enricher = Enricher::from_config(&config).expect("Failed to create enricher");
    let summary = enricher.run(&config).await.expect("Run failed");

    high.assert_calls_async(1).await;
    broken.assert_calls_async(1).await;
    limited.assert_calls_async(2).await;

    assert_eq!(summary.total, 3);
    assert_eq!(summary.succeeded, 1);
    assert_eq!(summary.failed, 2);
    assert_eq!(summary.invalid, 2);

    let report = std::fs::read_to_string(&config.output.path).expect("Report missing");
    let lines: Vec<&str> = report.lines().collect();
    assert_eq!(
        lines,
        vec![
            "IP,AbuseScore,Severity,TotalReports,LastReportedAt,Country,UsageType,ISP,Domain",
            "8.8.8.8,92,high,12,2026-10-17T08:00:00+00:00,US,Content Delivery Network,Google LLC,google.com",
            "1.1.1.1,,failed,,,,,,",
            "2001:db8::1,,failed,,,,,,",
        ]
    );
}

#[tokio::test]
async fn test_record_limit_caps_requests() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/api/v2/check");
            then.status(200)
                .json_body(json!({ "data": { "abuseConfidenceScore": 0 } }));
        })
        .await;

    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let input: String = (1..=5).map(|i| format!("192.0.2.{}\n", i)).collect();
    let mut config = make_config(&server, dir.path(), &input);
    config.input.max_records = 3;

    let enricher = Enricher::from_config(&config).expect("Failed to create enricher");
    let summary = enricher.run(&config).await.expect("Run failed");

    mock.assert_calls_async(3).await;
    assert_eq!(summary.total, 3);
    assert_eq!(summary.dropped, 2);

    let report = std::fs::read_to_string(&config.output.path).expect("Report missing");
    let ips: Vec<&str> = report
        .lines()
        .skip(1)
        .map(|l| l.split(',').next().unwrap_or_default())
        .collect();
    assert_eq!(ips, vec!["192.0.2.1", "192.0.2.2", "192.0.2.3"]);
    assert!(report.lines().skip(1).all(|l| l.contains(",0,low,")));
}

#[tokio::test]
async fn test_unwritable_output_is_fatal() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/v2/check");
            then.status(200)
                .json_body(json!({ "data": { "abuseConfidenceScore": 5 } }));
        })
        .await;

    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let mut config = make_config(&server, dir.path(), "192.0.2.10\n");
    config.output.path = dir.path().join("missing").join("report.csv");

    let enricher = Enricher::from_config(&config).expect("Failed to create enricher");
    assert!(enricher.run(&config).await.is_err());
    assert!(!config.output.path.exists());
}
