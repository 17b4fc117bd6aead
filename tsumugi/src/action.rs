//! Outbound actions and their acknowledgements.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Correlation id attached to every outbound action.
pub type Echo = u64;

/// An API call the gateway should perform.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Action {
    /// Post a message to a group.
    SendGroupMsg {
        /// Target group.
        group_id: i64,
        /// Message body.
        message: String,
    },
    /// Send a direct message to a user.
    SendPrivateMsg {
        /// Target user.
        user_id: i64,
        /// Message body.
        message: String,
    },
}

impl Action {
    /// Build a group message action.
    pub fn group_message(group_id: i64, message: impl Into<String>) -> Self {
        Action::SendGroupMsg {
            group_id,
            message: message.into(),
        }
    }

    /// Build a private message action.
    pub fn private_message(user_id: i64, message: impl Into<String>) -> Self {
        Action::SendPrivateMsg {
            user_id,
            message: message.into(),
        }
    }

    /// The gateway endpoint name.
    pub fn name(&self) -> &'static str {
        match self {
            Action::SendGroupMsg { .. } => "send_group_msg",
            Action::SendPrivateMsg { .. } => "send_private_msg",
        }
    }

    /// Serialize the request frame carrying this action under `echo`.
    ///
    /// # Errors
    ///
    /// Propagates serializer failures.
    pub fn encode(&self, echo: Echo) -> Result<String, serde_json::Error> {
        serde_json::to_string(&ActionFrame {
            action: self.name(),
            params: self,
            echo,
        })
    }
}

/// Wire shape of a request on the API connection.
#[derive(Debug, Serialize)]
pub struct ActionFrame<'a> {
    /// Endpoint name.
    pub action: &'static str,
    /// Endpoint arguments.
    pub params: &'a Action,
    /// Correlation id echoed back in the acknowledgement.
    pub echo: Echo,
}

/// Acknowledgement received on the API connection.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ActionResponse {
    /// Correlation id of the acknowledged request, if the gateway sent one.
    #[serde(default)]
    pub echo: Option<Echo>,
    /// `ok`, `async` or `failed`.
    #[serde(default)]
    pub status: Option<String>,
    /// Zero on success.
    #[serde(default)]
    pub retcode: Option<i64>,
    /// Endpoint-specific result.
    #[serde(default)]
    pub data: Option<Value>,
}

impl ActionResponse {
    /// Decode an acknowledgement frame.
    ///
    /// # Errors
    ///
    /// Fails when the payload is not a JSON object or `echo` is not an
    /// unsigned integer.
    pub fn from_slice(payload: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(payload)
    }

    /// Whether the gateway reported that the action failed.
    pub fn is_failure(&self) -> bool {
        self.status.as_deref() == Some("failed") || self.retcode.is_some_and(|code| code != 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_message_frame() {
        let frame = Action::group_message(123, "hi").encode(7).unwrap();
        let value: Value = serde_json::from_str(&frame).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "action": "send_group_msg",
                "params": { "group_id": 123, "message": "hi" },
                "echo": 7
            })
        );
    }

    #[test]
    fn test_private_message_frame() {
        let frame = Action::private_message(42, "psst").encode(1).unwrap();
        let value: Value = serde_json::from_str(&frame).unwrap();
        assert_eq!(value["action"], "send_private_msg");
        assert_eq!(value["params"]["user_id"], 42);
    }

    #[test]
    fn test_response_failure() {
        let ok = ActionResponse::from_slice(br#"{"status":"ok","retcode":0,"echo":5}"#).unwrap();
        assert_eq!(ok.echo, Some(5));
        assert!(!ok.is_failure());

        let failed =
            ActionResponse::from_slice(br#"{"status":"failed","retcode":100,"echo":6}"#).unwrap();
        assert!(failed.is_failure());

        let no_echo = ActionResponse::from_slice(br#"{"status":"ok"}"#).unwrap();
        assert_eq!(no_echo.echo, None);
    }
}
