//! Shared fixtures for the gateway client tests.

#![allow(dead_code)]

use std::sync::Arc;
use tsumugi::{
    ClientBuilder, GatewayClient, GatewayConfig,
    testing::{MemoryLogSink, MockConnection},
};

pub type MockClient = GatewayClient<MockConnection>;

/// A client builder over mock connections reporting to `log`.
pub fn builder(log: &Arc<MemoryLogSink>) -> ClientBuilder<MockConnection> {
    GatewayClient::builder(GatewayConfig::default(), log.clone())
}

/// A client with no plugins whose API connection is up.
pub fn connected_client(log: &Arc<MemoryLogSink>) -> MockClient {
    let client = builder(log).initialize().unwrap();
    client.api().connection().set_connected(true);
    client
}

/// A member joined `group_id`.
pub fn join_event(group_id: i64, user_id: i64) -> String {
    serde_json::json!({
        "time": 1700000000,
        "self_id": 10001,
        "post_type": "notice",
        "notice_type": "group_increase",
        "sub_type": "approve",
        "group_id": group_id,
        "user_id": user_id,
        "operator_id": user_id
    })
    .to_string()
}

/// `user_id` said `text` in `group_id`.
pub fn group_message(group_id: i64, user_id: i64, text: &str) -> String {
    serde_json::json!({
        "time": 1700000000,
        "self_id": 10001,
        "post_type": "message",
        "message_type": "group",
        "sub_type": "normal",
        "group_id": group_id,
        "user_id": user_id,
        "message": text,
        "raw_message": text
    })
    .to_string()
}

/// An acknowledgement for `echo`.
pub fn ack(echo: u64, status: &str, retcode: i64) -> String {
    serde_json::json!({
        "status": status,
        "retcode": retcode,
        "data": null,
        "echo": echo
    })
    .to_string()
}
