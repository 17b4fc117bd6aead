//! Inbound gateway events.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tsumugi_core::Message;

/// An event pushed by the gateway over the event connection.
///
/// Only the fields plugins commonly inspect are typed; everything else is
/// kept in [`extra`](Event::extra). Any JSON object decodes; anything else
/// is rejected and dropped by the client.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Unix timestamp at which the gateway produced the event.
    #[serde(default)]
    pub time: i64,
    /// Account the gateway is logged in as.
    #[serde(default)]
    pub self_id: i64,
    /// `message`, `notice`, `request` or `meta_event`.
    #[serde(default)]
    pub post_type: String,
    /// `group` or `private` for messages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_type: Option<String>,
    /// Kind of notice, e.g. `group_increase`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notice_type: Option<String>,
    /// `friend` or `group` for requests.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_type: Option<String>,
    /// `lifecycle` or `heartbeat` for meta events.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta_event_type: Option<String>,
    /// Refinement of the primary type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_type: Option<String>,
    /// Group the event happened in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<i64>,
    /// User the event is about.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
    /// Id of the message, for message events.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<i64>,
    /// Either a plain string or an array of message segments.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<Value>,
    /// The message flattened to plain text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_message: Option<String>,
    /// Remaining fields, untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Message for Event {}

impl Event {
    /// Decode an event from a raw frame.
    ///
    /// # Errors
    ///
    /// Fails when the payload is not a JSON object.
    pub fn from_slice(payload: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(payload)
    }

    /// Whether this is a chat message of any kind.
    pub fn is_message(&self) -> bool {
        self.post_type == "message"
    }

    /// Whether this is a message posted in a group.
    pub fn is_group_message(&self) -> bool {
        self.is_message() && self.message_type.as_deref() == Some("group")
    }

    /// Whether this is a direct message.
    pub fn is_private_message(&self) -> bool {
        self.is_message() && self.message_type.as_deref() == Some("private")
    }

    /// Whether this is a notice of the given type, e.g. `group_increase`.
    pub fn is_notice(&self, notice_type: &str) -> bool {
        self.post_type == "notice" && self.notice_type.as_deref() == Some(notice_type)
    }

    /// The message text: `raw_message` when present, else a string `message`.
    pub fn text(&self) -> Option<&str> {
        self.raw_message
            .as_deref()
            .or_else(|| self.message.as_ref().and_then(Value::as_str))
    }
}
