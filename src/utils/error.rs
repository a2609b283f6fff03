//! Errors raised while routing client frames.
//!
//! Every variant except `ConnectionLost` and `UnknownSession` is reported back
//! to the offending sender; the `Display` text becomes the `message` field of
//! the emitted frame. None of them terminate the connection.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BrokerError {
    #[error("Unauthorized: only moderators can approve subscriptions")]
    AuthorizationDenied,

    #[error("Unauthorized: only moderators can list pending requests")]
    ModeratorOnly,

    #[error("Not subscribed to channel {topic}")]
    NotAMember { topic: String },

    #[error("Subscription request for {topic} is already pending")]
    AlreadyPending { topic: String },

    #[error("Already subscribed to {topic}")]
    AlreadyMember { topic: String },

    #[error("No pending request from {requesting_user} for {topic}")]
    UnknownRequest {
        topic: String,
        requesting_user: String,
    },

    #[error("Malformed frame: {0}")]
    MalformedFrame(String),

    #[error("Connection lost: {0}")]
    ConnectionLost(String),

    #[error("No live session {session} for {user}")]
    UnknownSession { user: String, session: String },
}

impl BrokerError {
    /// Duplicate subscribe attempts are idempotent no-ops, surfaced as notices.
    pub fn is_duplicate(&self) -> bool {
        matches!(
            self,
            BrokerError::AlreadyPending { .. } | BrokerError::AlreadyMember { .. }
        )
    }

    /// Whether the sender should hear about this error at all.
    pub fn is_reportable(&self) -> bool {
        !matches!(
            self,
            BrokerError::ConnectionLost(_) | BrokerError::UnknownSession { .. }
        )
    }
}
