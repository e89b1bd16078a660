//! HTTP-level tests for the Autofiller client against a local mock server.

use std::time::Duration;

use autofiller_client::{
    AutofillerClient, AutofillerError, ClientConfig, ErrorKind, ExtractOptions, ExtractionStatus,
    FileInput, JobState, WaitOptions,
};
use chrono::{TimeZone, Utc};
use mockito::{Matcher, Server};

const API_KEY: &str = "af_test_key";

fn client_for(url: &str) -> AutofillerClient {
    client_with(ClientConfig::new(API_KEY).unwrap().with_base_url(url))
}

fn client_with(config: ClientConfig) -> AutofillerClient {
    AutofillerClient::with_config(config.with_retry_delay(Duration::ZERO)).unwrap()
}

fn extraction_body(id: &str) -> String {
    format!(
        r#"{{
            "id": "{id}",
            "status": "completed",
            "domain_pack": "invoice-standard",
            "data": {{"invoice_number": "INV-001", "total": 99.5}},
            "confidence": {{"invoice_number": 0.97}},
            "metadata": {{"pages": 2, "processing_time_ms": 800, "model_version": "docu-2024.03"}}
        }}"#
    )
}

fn fast_wait() -> WaitOptions {
    WaitOptions::new()
        .with_poll_interval(Duration::from_millis(10))
        .with_max_wait(Duration::from_secs(5))
}

#[tokio::test]
async fn test_health_is_unauthenticated_and_parses_timestamp() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/health")
        .match_header("authorization", Matcher::Missing)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"status":"healthy","version":"2024.1","timestamp":"2024-01-15T00:00:00Z"}"#)
        .create_async()
        .await;

    let health = client_for(&server.url()).health().await.unwrap();

    mock.assert_async().await;
    assert_eq!(health.status, "healthy");
    assert_eq!(health.version, "2024.1");
    assert_eq!(
        health.timestamp,
        Some(Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap())
    );
}

#[tokio::test]
async fn test_extract_sends_bearer_and_multipart_fields() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/extract")
        .match_header("authorization", format!("Bearer {}", API_KEY).as_str())
        .match_header("content-type", Matcher::Regex("^multipart/form-data".into()))
        .match_body(Matcher::AllOf(vec![
            Matcher::Regex(r#"name="file"; filename="invoice.pdf""#.into()),
            Matcher::Regex("%PDF-1.7 fake".into()),
            Matcher::Regex(r#"name="domain_pack"\r\n\r\ninvoice-standard"#.into()),
            Matcher::Regex(r#"name="options"\r\n\r\n\{"include_confidence":true\}"#.into()),
        ]))
        .with_status(200)
        .with_body(extraction_body("ext_1"))
        .create_async()
        .await;

    let options = ExtractOptions::new()
        .with_domain_pack("invoice-standard")
        .with_confidence(true);
    let result = client_for(&server.url())
        .extract(FileInput::bytes(b"%PDF-1.7 fake".to_vec(), "invoice.pdf"), &options)
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(result.id, "ext_1");
    assert_eq!(result.status, ExtractionStatus::Completed);
    assert_eq!(result.metadata.pages, 2);
    assert_eq!(result.confidence_for("invoice_number"), Some(0.97));
}

#[tokio::test]
async fn test_extract_omits_options_when_unset() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/extract")
        .match_body(Matcher::Regex(r#"name="options""#.into()))
        .expect(0)
        .create_async()
        .await;
    let fallback = server
        .mock("POST", "/extract")
        .with_status(200)
        .with_body(extraction_body("ext_2"))
        .create_async()
        .await;

    client_for(&server.url())
        .extract(
            FileInput::bytes(b"data".to_vec(), "scan.png"),
            &ExtractOptions::default(),
        )
        .await
        .unwrap();

    mock.assert_async().await;
    fallback.assert_async().await;
}

#[tokio::test]
async fn test_extract_from_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("receipt.pdf");
    std::fs::write(&path, b"%PDF-1.4 receipt").unwrap();

    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/extract")
        .match_body(Matcher::AllOf(vec![
            Matcher::Regex(r#"filename="receipt.pdf""#.into()),
            Matcher::Regex("(?i)content-type: application/pdf".into()),
            Matcher::Regex("%PDF-1.4 receipt".into()),
        ]))
        .with_status(200)
        .with_body(extraction_body("ext_3"))
        .create_async()
        .await;

    let result = client_for(&server.url())
        .extract(FileInput::path(&path), &ExtractOptions::default())
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(result.id, "ext_3");
}

#[tokio::test]
async fn test_extract_from_stream() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/extract")
        .match_body(Matcher::AllOf(vec![
            Matcher::Regex(r#"name="file"; filename="scan.pdf""#.into()),
            Matcher::Regex("(?i)content-type: application/pdf".into()),
            Matcher::Regex("%PDF-1.7 streamed scan".into()),
        ]))
        .with_status(200)
        .with_body(extraction_body("ext_stream"))
        .create_async()
        .await;

    let reader = std::io::Cursor::new(b"%PDF-1.7 streamed scan".to_vec());
    let result = client_for(&server.url())
        .extract(FileInput::stream(reader, "scan.pdf"), &ExtractOptions::default())
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(result.id, "ext_stream");
}

#[test]
fn test_api_key_unusable_in_header_rejected_at_construction() {
    let err = ClientConfig::new("af_key\n").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    let err = AutofillerClient::new("af_key\n").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_ne!(err.code(), "request_failed");
}

#[tokio::test]
async fn test_bytes_without_filename_fails_before_network() {
    let mut server = Server::new_async().await;
    let mock = server.mock("POST", "/extract").expect(0).create_async().await;

    let err = client_for(&server.url())
        .extract(
            FileInput::Bytes {
                data: b"data".to_vec().into(),
                filename: None,
            },
            &ExtractOptions::default(),
        )
        .await
        .unwrap_err();

    mock.assert_async().await;
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[tokio::test]
async fn test_rate_limit_keeps_message_and_is_not_retried() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/extract")
        .with_status(429)
        .with_body(r#"{"code":"rate_limit_exceeded","message":"slow down"}"#)
        .expect(1)
        .create_async()
        .await;

    let err = client_for(&server.url())
        .extract(
            FileInput::bytes(b"data".to_vec(), "a.pdf"),
            &ExtractOptions::default(),
        )
        .await
        .unwrap_err();

    mock.assert_async().await;
    match err {
        AutofillerError::RateLimit { message } => assert_eq!(message, "slow down"),
        other => panic!("expected rate limit error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_status_classification() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/domain-packs/unauthorized")
        .with_status(401)
        .with_body(r#"{"message":"Invalid API key"}"#)
        .create_async()
        .await;
    server
        .mock("GET", "/domain-packs/invalid")
        .with_status(422)
        .with_body(r#"{"code":"unprocessable","message":"bad name"}"#)
        .create_async()
        .await;
    server
        .mock("GET", "/domain-packs/missing")
        .with_status(404)
        .with_body("not json")
        .create_async()
        .await;

    let client = client_for(&server.url());

    let err = client.get_domain_pack("unauthorized").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Authentication);
    assert_eq!(err.message(), "Invalid API key");

    let err = client.get_domain_pack("invalid").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(err.message(), "bad name");

    let err = client.get_domain_pack("missing").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Api);
    assert_eq!(err.code(), "http_404");
    assert_eq!(err.message(), "Not Found");
    assert_eq!(err.status(), Some(404));
}

#[tokio::test]
async fn test_malformed_success_body_is_protocol_error() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/jobs/job_1")
        .with_status(200)
        .with_body("{not json")
        .create_async()
        .await;

    let err = client_for(&server.url()).get_job("job_1").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Protocol);
}

#[tokio::test]
async fn test_async_extraction_polls_until_completed() {
    let mut server = Server::new_async().await;
    let submit = server
        .mock("POST", "/extract/async")
        .match_body(Matcher::Regex(
            r#"name="webhook_url"\r\n\r\nhttps://hooks.example.com/af"#.into(),
        ))
        .with_status(202)
        .with_body(r#"{"job_id":"job_42","status":"pending","estimated_time_seconds":30}"#)
        .create_async()
        .await;
    let processing = server
        .mock("GET", "/jobs/job_42")
        .with_status(200)
        .with_body(r#"{"job_id":"job_42","status":"processing","progress":40}"#)
        .expect(1)
        .create_async()
        .await;
    let completed = server
        .mock("GET", "/jobs/job_42")
        .with_status(200)
        .with_body(format!(
            r#"{{"job_id":"job_42","status":"completed","progress":100,"result":{}}}"#,
            extraction_body("ext_42")
        ))
        .expect(1)
        .create_async()
        .await;

    let client = client_for(&server.url());
    let handle = client
        .extract_async(
            FileInput::bytes(b"data".to_vec(), "large.pdf"),
            &ExtractOptions::new().with_webhook_url("https://hooks.example.com/af"),
        )
        .await
        .unwrap();

    assert_eq!(handle.job_id, "job_42");
    assert_eq!(handle.status, JobState::Pending);
    assert_eq!(handle.estimated_time_seconds, Some(30));

    let result = client.wait_for_job(&handle.job_id, &fast_wait()).await.unwrap();

    submit.assert_async().await;
    processing.assert_async().await;
    completed.assert_async().await;
    assert_eq!(result.id, "ext_42");
    assert_eq!(result.field("invoice_number").unwrap(), "INV-001");
}

#[tokio::test]
async fn test_failed_job_surfaces_server_error() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/jobs/job_7")
        .with_status(200)
        .with_body(
            r#"{"job_id":"job_7","status":"failed","error":{"code":"ocr_failed","message":"Page 3 is blank"}}"#,
        )
        .expect(1)
        .create_async()
        .await;

    let err = client_for(&server.url())
        .wait_for_job("job_7", &fast_wait())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Extraction);
    assert_eq!(err.code(), "ocr_failed");
    assert_eq!(err.message(), "Page 3 is blank");
}

#[tokio::test]
async fn test_get_job_retries_transient_failures() {
    let mut server = Server::new_async().await;
    let unavailable = server
        .mock("GET", "/jobs/job_9")
        .with_status(503)
        .expect(2)
        .create_async()
        .await;
    let ok = server
        .mock("GET", "/jobs/job_9")
        .with_status(200)
        .with_body(r#"{"job_id":"job_9","status":"pending"}"#)
        .expect(1)
        .create_async()
        .await;

    let job = client_for(&server.url()).get_job("job_9").await.unwrap();

    unavailable.assert_async().await;
    ok.assert_async().await;
    assert_eq!(job.status, JobState::Pending);
}

#[tokio::test]
async fn test_retries_stop_at_max_retries() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/domain-packs")
        .with_status(500)
        .with_body(r#"{"code":"internal","message":"oops"}"#)
        .expect(3)
        .create_async()
        .await;

    let client = client_with(
        ClientConfig::new(API_KEY)
            .unwrap()
            .with_base_url(server.url())
            .with_max_retries(2),
    );
    let err = client.list_domain_packs().await.unwrap_err();

    mock.assert_async().await;
    assert_eq!(err.code(), "internal");
    assert_eq!(err.status(), Some(500));
}

#[tokio::test]
async fn test_client_errors_are_not_retried() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/jobs/gone")
        .with_status(404)
        .expect(1)
        .create_async()
        .await;

    let err = client_for(&server.url()).get_job("gone").await.unwrap_err();

    mock.assert_async().await;
    assert_eq!(err.code(), "http_404");
}

#[tokio::test]
async fn test_domain_packs() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/domain-packs")
        .with_status(200)
        .with_body(
            r#"{"items":[
                {"name":"invoice-standard","version":"2.0.0","description":"Invoices","schema":{"type":"object"}},
                {"name":"tax-w2","version":"1.2.0","description":"W-2","schema":{"type":"object"},"supported_formats":["pdf"]}
            ]}"#,
        )
        .create_async()
        .await;
    server
        .mock("GET", "/domain-packs/tax-w2")
        .with_status(200)
        .with_body(
            r#"{"name":"tax-w2","version":"1.2.0","description":"W-2",
                "schema":{"type":"object","properties":{"wages":{"type":"number"}}},
                "routing":{"keywords":["W-2"],"anchors":["Box 1"]}}"#,
        )
        .create_async()
        .await;

    let client = client_for(&server.url());

    let packs = client.list_domain_packs().await.unwrap();
    assert_eq!(packs.len(), 2);
    assert_eq!(packs[1].supported_formats, Some(vec!["pdf".to_string()]));

    let pack = client.get_domain_pack("tax-w2").await.unwrap();
    assert_eq!(pack.field_names(), vec!["wages"]);
    assert_eq!(pack.routing.unwrap().anchors, vec!["Box 1"]);
}

#[tokio::test]
async fn test_batch_reports_each_file() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/extract")
        .match_body(Matcher::Regex(r#"filename="good.pdf""#.into()))
        .with_status(200)
        .with_body(extraction_body("ext_good"))
        .create_async()
        .await;
    server
        .mock("POST", "/extract")
        .match_body(Matcher::Regex(r#"filename="bad.pdf""#.into()))
        .with_status(422)
        .with_body(r#"{"message":"unsupported document"}"#)
        .create_async()
        .await;

    let files = vec![
        FileInput::bytes(b"one".to_vec(), "good.pdf"),
        FileInput::bytes(b"two".to_vec(), "bad.pdf"),
        FileInput::Bytes {
            data: b"three".to_vec().into(),
            filename: None,
        },
    ];

    let report = client_for(&server.url())
        .extract_batch(files, &ExtractOptions::default(), 2)
        .await;

    assert_eq!(report.items.len(), 3);
    assert_eq!(report.succeeded(), 1);
    assert_eq!(report.failed(), 2);
    assert_eq!(report.items[0].outcome.as_ref().unwrap().id, "ext_good");
    assert_eq!(
        report.items[1].outcome.as_ref().unwrap_err().kind(),
        ErrorKind::Validation
    );
    assert_eq!(report.items[1].label, "bad.pdf (3 bytes)");
}

#[tokio::test]
async fn test_request_timeout() {
    // Accept connections but never answer.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let _server = tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });

    let client = client_with(
        ClientConfig::new(API_KEY)
            .unwrap()
            .with_base_url(format!("http://{}", addr))
            .with_timeout(Duration::from_millis(200))
            .with_max_retries(0),
    );

    let err = client.get_job("job_slow").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Timeout);
}

#[tokio::test]
async fn test_connection_refused_is_request_failed() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = client_with(
        ClientConfig::new(API_KEY)
            .unwrap()
            .with_base_url(format!("http://{}", addr))
            .with_max_retries(0),
    );

    let err = client.health().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Api);
    assert_eq!(err.code(), "request_failed");
}
