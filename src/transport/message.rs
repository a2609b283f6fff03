//! Wire frames.
//!
//! Every frame is a JSON object tagged by `type`. Browser clients call the
//! topic `channel`: inbound frames accept either name and outbound frames
//! carry both.

use serde::{Deserialize, Serialize};
use tungstenite::protocol::Message as WsMessage;

use crate::utils::BrokerError;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    #[serde(rename = "subscribe_request")]
    SubscribeRequest {
        #[serde(alias = "channel")]
        topic: String,
    },
    #[serde(rename = "approve_subscription")]
    ApproveSubscription {
        #[serde(alias = "channel")]
        topic: String,
        requesting_user: String,
    },
    /// `user` and `timestamp` may be present but are ignored; the relay
    /// stamps its own.
    #[serde(rename = "chat_message")]
    ChatMessage {
        #[serde(alias = "channel")]
        topic: String,
        message: String,
    },
    /// Moderator only. Without a topic, lists every pending request.
    #[serde(rename = "list_pending")]
    ListPending {
        #[serde(default, alias = "channel")]
        topic: Option<String>,
    },
}

impl ClientMessage {
    /// Decode and validate one inbound text frame.
    pub fn decode(text: &str) -> Result<Self, BrokerError> {
        let msg: ClientMessage = serde_json::from_str(text)
            .map_err(|e| BrokerError::MalformedFrame(e.to_string()))?;

        let blank = |field: &str| BrokerError::MalformedFrame(format!("`{field}` must not be empty"));
        let problem = match &msg {
            ClientMessage::SubscribeRequest { topic }
            | ClientMessage::ChatMessage { topic, .. }
            | ClientMessage::ApproveSubscription { topic, .. }
                if topic.trim().is_empty() =>
            {
                Some(blank("topic"))
            }
            ClientMessage::ApproveSubscription {
                requesting_user, ..
            } if requesting_user.trim().is_empty() => Some(blank("requesting_user")),
            _ => None,
        };
        match problem {
            Some(err) => Err(err),
            None => Ok(msg),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "type")]
pub enum ServerMessage {
    /// Sent to moderators: a pending entry exists.
    #[serde(rename = "subscription_request")]
    SubscriptionRequest {
        topic: String,
        requesting_user: String,
        timestamp: String,
    },
    #[serde(rename = "subscription_approved")]
    SubscriptionApproved {
        topic: String,
        message: String,
        timestamp: String,
    },
    #[serde(rename = "chat_message")]
    ChatMessage {
        topic: String,
        message: String,
        user: String,
        timestamp: String,
    },
    #[serde(rename = "system")]
    System { message: String, timestamp: String },
    #[serde(rename = "error")]
    Error { message: String, timestamp: String },
}

impl ServerMessage {
    pub fn system(message: impl Into<String>) -> Self {
        ServerMessage::System {
            message: message.into(),
            timestamp: now(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        ServerMessage::Error {
            message: message.into(),
            timestamp: now(),
        }
    }

    /// Encode for the socket. Frames with a topic repeat it as `channel`
    /// for browser clients that read that field.
    pub fn to_ws(&self) -> Result<WsMessage, serde_json::Error> {
        let mut value = serde_json::to_value(self)?;
        if let Some(frame) = value.as_object_mut() {
            if let Some(topic) = frame.get("topic").cloned() {
                frame.insert("channel".to_string(), topic);
            }
        }
        serde_json::to_string(&value).map(WsMessage::text)
    }
}

/// Emission timestamp, RFC 3339 in UTC.
pub fn now() -> String {
    chrono::Utc::now().to_rfc3339()
}
