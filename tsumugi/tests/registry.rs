//! Plugin registration through the client builder.

mod common;

use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};
use tsumugi::{
    BoxError, Event, Filters, Handlers, Plugin, PluginBuilder, UnusedFilter,
    testing::{CountingHandler, MemoryLogSink, RecordingHandler},
};

/// A plugin implemented as a dedicated type.
struct Greeter {
    greeted: RecordingHandler<Event>,
    loads: Arc<AtomicUsize>,
}

impl Plugin<Event> for Greeter {
    fn name(&self) -> &str {
        "greeter"
    }

    fn load(&self) -> Result<(), BoxError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn filters(&self) -> Filters<Event> {
        Filters::new()
            .filter("greet", |e: &Event| e.text() == Some("hi"))
            .filter("typo", |e: &Event| e.text() == Some("hii"))
    }

    fn handlers(&self) -> Handlers<Event> {
        Handlers::new().handler("greet", self.greeted.clone())
    }
}

#[tokio::test]
async fn test_typed_plugin_and_unused_filter_report() {
    let log = Arc::new(MemoryLogSink::new());
    let greeted = RecordingHandler::new();
    let loads = Arc::new(AtomicUsize::new(0));

    let client = common::builder(&log)
        .register(Greeter {
            greeted: greeted.clone(),
            loads: loads.clone(),
        })
        .initialize()
        .unwrap();

    assert_eq!(loads.load(Ordering::SeqCst), 1);
    assert_eq!(
        client.registry().unused_filters(),
        &[UnusedFilter {
            plugin: "greeter".into(),
            key: "typo".into()
        }]
    );
    // Unused filters are a developer hint, not a log entry.
    assert!(log.entries().is_empty());

    let events = client.event_connection();
    events.deliver(common::group_message(1, 2, "hi")).await;
    events.deliver(common::group_message(1, 2, "hii")).await;
    assert_eq!(greeted.count(), 1);
}

#[tokio::test]
async fn test_later_plugin_with_same_name_supersedes() {
    let log = Arc::new(MemoryLogSink::new());
    let first = CountingHandler::new();
    let second = CountingHandler::new();
    let other = CountingHandler::new();

    let client = common::builder(&log)
        .register(PluginBuilder::new("dup").handler("old", first.clone()))
        .register(PluginBuilder::new("other").handler("any", other.clone()))
        .register(PluginBuilder::new("dup").handler("new", second.clone()))
        .initialize()
        .unwrap();

    assert_eq!(
        client.registry().names().collect::<Vec<_>>(),
        vec!["dup", "other"]
    );

    client
        .event_connection()
        .deliver(common::group_message(1, 2, "x"))
        .await;

    assert_eq!(first.count(), 0);
    assert_eq!(second.count(), 1);
    assert_eq!(other.count(), 1);
}

#[tokio::test]
async fn test_every_unclaimed_handler_runs_once_per_event() {
    let log = Arc::new(MemoryLogSink::new());
    let a = CountingHandler::new();
    let b = CountingHandler::new();
    let gated = CountingHandler::new();

    let client = common::builder(&log)
        .register(
            PluginBuilder::new("multi")
                .filter("gated", |_: &Event| false)
                .handler("a", a.clone())
                .handler("b", b.clone())
                .handler("gated", gated.clone()),
        )
        .initialize()
        .unwrap();

    for n in 0..3 {
        client
            .event_connection()
            .deliver(common::group_message(1, 2, &n.to_string()))
            .await;
    }

    assert_eq!(a.count(), 3);
    assert_eq!(b.count(), 3);
    assert_eq!(gated.count(), 0);
}
