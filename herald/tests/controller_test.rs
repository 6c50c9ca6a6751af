//! Configuration loading and single-message delivery through the controller

use std::io::Write;

use herald::Herald;
use herald_common::Message;

fn write_config(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    file.write_all(content.as_bytes()).expect("write config");
    file
}

#[test]
fn test_from_file_missing() {
    let result = Herald::from_file(std::path::Path::new("/nonexistent/herald.config.ron"));
    let error = result.expect_err("missing file should fail");
    assert!(error.to_string().contains("Failed to read config"));
}

#[test]
fn test_from_file_malformed() {
    let file = write_config("(delivery: (max_retries: \"two\"))");
    let error = Herald::from_file(file.path()).expect_err("bad config should fail");
    assert!(error.to_string().contains("Failed to parse config"));
}

#[tokio::test]
async fn test_send_falls_back_to_reliable_provider() {
    let file = write_config(
        r#"(
            delivery: (base_delay_ms: 1),
            providers: [
                (name: "AlwaysDown", failure_rate: 1.0, latency_ms: 0),
                (name: "AlwaysUp", failure_rate: 0.0, latency_ms: 0),
            ],
        )"#,
    );
    let herald = Herald::from_file(file.path()).expect("config should load");
    let message = Message::new(["user@example.com"], "Hello", "World");

    let result = herald.send(&message).await.expect("send should succeed");

    assert!(result.overall_success);
    assert_eq!(result.final_provider, "AlwaysUp");
    assert_eq!(result.attempts.len(), 3);
    assert_eq!(
        result.attempts[0].error.as_deref(),
        Some("AlwaysDown temporarily unavailable")
    );
}

#[tokio::test]
async fn test_orchestrator_suppresses_duplicates() {
    let file = write_config(
        r#"(providers: [(name: "AlwaysUp", failure_rate: 0.0, latency_ms: 0)])"#,
    );
    let herald = Herald::from_file(file.path()).expect("config should load");
    let orchestrator = herald.orchestrator().await.expect("orchestrator");
    let message = Message::new(["user@example.com"], "Hello", "World");

    let first = orchestrator.send_email(&message).await.expect("send");
    let second = orchestrator.send_email(&message).await.expect("send");

    assert_eq!(first.final_provider, "AlwaysUp");
    assert_eq!(second.final_provider, "IdempotencyCheck");
    assert!(second.attempts.is_empty());
}

#[tokio::test]
async fn test_invalid_admission_config_rejected() {
    let file = write_config("(admission: (ttl_secs: 0))");
    let herald = Herald::from_file(file.path()).expect("config should load");

    assert!(herald.orchestrator().await.is_err());
}
