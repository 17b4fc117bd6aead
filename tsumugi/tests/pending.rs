//! Acknowledgement tracking and expiry.

mod common;

use std::{sync::Arc, time::Duration};
use tsumugi::{LogKind, testing::MemoryLogSink};

#[tokio::test(start_paused = true)]
async fn test_unacknowledged_action_expires_within_two_periods() {
    let log = Arc::new(MemoryLogSink::new());
    let client = common::connected_client(&log);

    let echo = client.send_group_message(100, "anyone there?").unwrap().unwrap();
    assert!(client.api().pending().contains(echo));

    tokio::time::sleep(Duration::from_secs(29)).await;
    assert!(client.api().pending().contains(echo));
    assert_eq!(log.count(LogKind::Error), 0);

    tokio::time::sleep(Duration::from_secs(32)).await;
    assert!(!client.api().pending().contains(echo));
    assert_eq!(
        log.texts(LogKind::Error),
        vec![format!("request {echo} timed out after 30s")]
    );
}

#[tokio::test(start_paused = true)]
async fn test_acknowledged_action_never_times_out() {
    let log = Arc::new(MemoryLogSink::new());
    let client = common::connected_client(&log);

    let echo = client.send_group_message(100, "hi").unwrap().unwrap();
    client
        .api()
        .connection()
        .deliver(common::ack(echo, "ok", 0))
        .await;
    assert!(client.api().pending().is_empty());

    tokio::time::sleep(Duration::from_secs(61)).await;
    assert_eq!(log.count(LogKind::Error), 0);
}

#[tokio::test]
async fn test_unknown_acknowledgement_is_ignored() {
    let log = Arc::new(MemoryLogSink::new());
    let client = common::connected_client(&log);

    let echo = client.send_group_message(100, "hi").unwrap().unwrap();
    client
        .api()
        .connection()
        .deliver(common::ack(echo + 1000, "ok", 0))
        .await;

    assert!(client.api().pending().contains(echo));
    assert_eq!(log.count(LogKind::Error), 0);
}

#[tokio::test]
async fn test_failed_acknowledgement_is_logged() {
    let log = Arc::new(MemoryLogSink::new());
    let client = common::connected_client(&log);

    let echo = client.send_private_message(42, "hi").unwrap().unwrap();
    client
        .api()
        .connection()
        .deliver(common::ack(echo, "failed", 100))
        .await;

    assert!(!client.api().pending().contains(echo));
    let errors = log.texts(LogKind::Error);
    assert_eq!(errors.len(), 1);
    assert!(errors[0].starts_with(&format!("request {echo} failed")));
}

#[tokio::test]
async fn test_malformed_acknowledgement_is_logged() {
    let log = Arc::new(MemoryLogSink::new());
    let client = common::connected_client(&log);

    client.api().connection().deliver("]]").await;

    let errors = log.texts(LogKind::Error);
    assert_eq!(errors.len(), 1);
    assert!(errors[0].starts_with("failed to decode acknowledgement"));
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_stops_sweeper() {
    let log = Arc::new(MemoryLogSink::new());
    let client = common::connected_client(&log);

    let echo = client.send_group_message(1, "bye").unwrap().unwrap();
    client.shutdown();

    tokio::time::sleep(Duration::from_secs(120)).await;
    assert!(client.api().pending().contains(echo));
    assert_eq!(log.count(LogKind::Error), 0);
}
