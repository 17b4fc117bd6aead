//! Event routing through the client's event connection.

mod common;

use std::sync::Arc;
use tsumugi::{
    Event, Filter, LogKind, PluginBuilder,
    testing::{CountingHandler, MemoryLogSink, PanickingHandler, RecordingHandler},
};

fn is_join(event: &Event) -> bool {
    event.is_notice("group_increase")
}

#[tokio::test]
async fn test_join_event_reaches_filtered_and_catch_all_handlers() {
    let log = Arc::new(MemoryLogSink::new());
    let welcome_user = RecordingHandler::<Event>::new();
    let log_event = CountingHandler::new();

    let client = common::builder(&log)
        .register(
            PluginBuilder::new("welcome")
                .filter("join", is_join)
                .handler("join", welcome_user.clone()),
        )
        .register(PluginBuilder::new("logger").handler("any", log_event.clone()))
        .initialize()
        .unwrap();

    let events = client.event_connection();

    events.deliver(common::join_event(100, 42)).await;
    assert_eq!(welcome_user.count(), 1);
    assert_eq!(log_event.count(), 1);
    assert_eq!(welcome_user.events()[0].user_id, Some(42));

    events.deliver(common::group_message(100, 42, "hello")).await;
    assert_eq!(welcome_user.count(), 1);
    assert_eq!(log_event.count(), 2);

    assert_eq!(log.count(LogKind::Error), 0);
}

#[tokio::test]
async fn test_malformed_event_is_dropped_and_reported_once() {
    let log = Arc::new(MemoryLogSink::new());
    let catch_all = CountingHandler::new();

    let client = common::builder(&log)
        .register(PluginBuilder::new("logger").handler("any", catch_all.clone()))
        .initialize()
        .unwrap();

    client.event_connection().deliver("{not json").await;

    assert_eq!(catch_all.count(), 0);
    let errors = log.texts(LogKind::Error);
    assert_eq!(errors.len(), 1);
    assert!(errors[0].starts_with("failed to decode event"));
}

#[tokio::test]
async fn test_panicking_plugin_does_not_starve_others() {
    let log = Arc::new(MemoryLogSink::new());
    let survivor = CountingHandler::new();

    let client = common::builder(&log)
        .register(PluginBuilder::new("explodes").handler("boom", PanickingHandler::new("kaboom")))
        .register(PluginBuilder::new("survivor").handler("count", survivor.clone()))
        .initialize()
        .unwrap();

    let events = client.event_connection();
    events.deliver(common::group_message(1, 2, "first")).await;
    events.deliver(common::group_message(1, 2, "second")).await;

    assert_eq!(survivor.count(), 2);
    let errors = log.texts(LogKind::Error);
    assert_eq!(errors.len(), 2);
    assert!(errors.iter().all(|text| text.contains("plugin explodes failed")));
    assert!(errors[0].contains("kaboom"));
}

#[tokio::test]
async fn test_handler_error_is_logged_and_plugin_continues() {
    let log = Arc::new(MemoryLogSink::new());
    let after = CountingHandler::new();

    let client = common::builder(&log)
        .register(
            PluginBuilder::new("flaky")
                .handler("fails", |_: &Event| async {
                    Err::<(), _>(std::io::Error::other("backend down"))
                })
                .handler("after", after.clone()),
        )
        .initialize()
        .unwrap();

    client.event_connection().deliver(common::group_message(1, 2, "x")).await;

    assert_eq!(after.count(), 1);
    let errors = log.texts(LogKind::Error);
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("flaky"));
    assert!(errors[0].contains("backend down"));
}

#[tokio::test]
async fn test_combined_filters() {
    let log = Arc::new(MemoryLogSink::new());
    let ping = RecordingHandler::<Event>::new();
    let not_ping = CountingHandler::new();

    let is_group = |e: &Event| e.is_group_message();
    let says_ping = |e: &Event| e.text() == Some("!ping");

    let client = common::builder(&log)
        .register(
            PluginBuilder::new("commands")
                .filter("ping", is_group.and(says_ping))
                .filter("chatter", is_group.and(says_ping.not()))
                .handler("ping", ping.clone())
                .handler("chatter", not_ping.clone()),
        )
        .initialize()
        .unwrap();

    let events = client.event_connection();
    events.deliver(common::group_message(1, 2, "!ping")).await;
    events.deliver(common::group_message(1, 2, "hello")).await;
    events.deliver(common::join_event(1, 2)).await;

    assert_eq!(ping.count(), 1);
    assert_eq!(ping.events()[0].text(), Some("!ping"));
    assert_eq!(not_ping.count(), 1);
}
