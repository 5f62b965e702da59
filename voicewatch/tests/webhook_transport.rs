//! HTTP webhook transport against a local receiver.

mod common;

use std::sync::Arc;

use common::{CountingReporter, closed_address, fast_retry, spawn_receiver};
use voicewatch::Error;
use voicewatch::metrics::MetricsCollector;
use voicewatch::notification::{
    DeliveryMode, HttpTransportConfig, HttpWebhookTransport, WebhookTransport,
};

struct Harness {
    transport: HttpWebhookTransport,
    reporter: Arc<CountingReporter>,
    metrics: Arc<MetricsCollector>,
}

fn harness(mode: DeliveryMode) -> Harness {
    let reporter = Arc::new(CountingReporter::default());
    let metrics = Arc::new(MetricsCollector::new());
    let config = HttpTransportConfig {
        retry: fast_retry(),
        mode,
        ..Default::default()
    };
    let transport = HttpWebhookTransport::new(config, reporter.clone(), metrics.clone())
        .expect("Failed to build transport");

    Harness {
        transport,
        reporter,
        metrics,
    }
}

#[tokio::test]
async fn test_successful_call() {
    let server = spawn_receiver(0).await;
    let h = harness(DeliveryMode::Lenient);

    h.transport
        .call(&format!("{}/hook?u=bob", server.base))
        .await
        .unwrap();

    assert_eq!(server.receiver.requests(), vec!["/hook?u=bob"]);
    assert_eq!(h.reporter.count(), 0);
    assert_eq!(h.metrics.webhook_failures(), 0);
}

#[tokio::test]
async fn test_persistent_failure_is_swallowed_after_three_attempts() {
    let server = spawn_receiver(0).await;
    let h = harness(DeliveryMode::Lenient);

    let result = h
        .transport
        .call(&format!("{}/always-500", server.base))
        .await;

    assert!(result.is_ok());
    assert_eq!(server.receiver.hits("/always-500"), 3);
    assert_eq!(h.reporter.count(), 1);
    assert_eq!(h.metrics.webhook_failures(), 1);
}

#[tokio::test]
async fn test_persistent_failure_propagates_in_strict_mode() {
    let server = spawn_receiver(0).await;
    let h = harness(DeliveryMode::Strict);

    let result = h
        .transport
        .call(&format!("{}/always-500", server.base))
        .await;

    assert!(matches!(result, Err(Error::Delivery { .. })));
    assert_eq!(server.receiver.hits("/always-500"), 3);
    assert_eq!(h.reporter.count(), 1);
}

#[tokio::test]
async fn test_recovers_within_retry_budget() {
    let server = spawn_receiver(2).await;
    let h = harness(DeliveryMode::Strict);

    h.transport
        .call(&format!("{}/hook", server.base))
        .await
        .unwrap();

    assert_eq!(server.receiver.hits("/hook"), 3);
    assert_eq!(h.reporter.count(), 0);
    assert_eq!(h.metrics.webhook_failures(), 0);
}

#[tokio::test]
async fn test_client_error_status_is_a_failure() {
    let server = spawn_receiver(0).await;
    let h = harness(DeliveryMode::Strict);

    let result = h.transport.call(&format!("{}/missing", server.base)).await;

    assert!(result.is_err());
    assert_eq!(server.receiver.hits("/missing"), 3);
}

#[tokio::test]
async fn test_redirects_are_followed() {
    let server = spawn_receiver(0).await;
    let h = harness(DeliveryMode::Strict);

    h.transport
        .call(&format!("{}/redirect", server.base))
        .await
        .unwrap();

    assert_eq!(
        server.receiver.requests(),
        vec!["/redirect", "/hook?from=redirect"]
    );
}

#[tokio::test]
async fn test_connection_refused() {
    let base = closed_address().await;
    let h = harness(DeliveryMode::Lenient);

    let result = h.transport.call(&format!("{base}/hook")).await;

    assert!(result.is_ok());
    assert_eq!(h.reporter.count(), 1);
    assert_eq!(h.metrics.webhook_failures(), 1);
}
