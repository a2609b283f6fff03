use std::fmt;

use tokio::sync::mpsc::UnboundedSender;
use tungstenite::protocol::frame::coding::CloseCode;
use tungstenite::protocol::{CloseFrame, Message as WsMessage};
use uuid::Uuid;

/// Why a connection ended. The close-frame variants are what the peer sees.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisconnectReason {
    /// Another connection registered the same identity.
    Superseded,
    /// The handshake did not carry a known identity.
    UnknownUser,
    /// `broker.max_connections` sessions are already live.
    CapacityReached,
    /// No frame arrived within the heartbeat timeout.
    Unresponsive,
    ClientClosed,
    TransportError,
    WriteFailed,
}

impl DisconnectReason {
    pub fn close_code(self) -> CloseCode {
        match self {
            DisconnectReason::Superseded => CloseCode::Library(4000),
            DisconnectReason::UnknownUser => CloseCode::Library(4001),
            DisconnectReason::CapacityReached => CloseCode::Again,
            DisconnectReason::Unresponsive => CloseCode::Away,
            DisconnectReason::ClientClosed
            | DisconnectReason::TransportError
            | DisconnectReason::WriteFailed => CloseCode::Normal,
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            DisconnectReason::Superseded => "superseded by a newer connection",
            DisconnectReason::UnknownUser => "user not found",
            DisconnectReason::CapacityReached => "too many connections",
            DisconnectReason::Unresponsive => "heartbeat timed out",
            DisconnectReason::ClientClosed => "closed by client",
            DisconnectReason::TransportError => "transport error",
            DisconnectReason::WriteFailed => "write failed",
        }
    }

    pub fn close_message(self) -> WsMessage {
        WsMessage::Close(Some(CloseFrame {
            code: self.close_code(),
            reason: self.description().into(),
        }))
    }
}

impl fmt::Display for DisconnectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// One live physical connection as seen by the broker.
///
/// Sends never block: frames go into an unbounded queue drained by the
/// connection's write loop.
#[derive(Debug)]
pub struct Connection {
    pub id: String,
    sender: UnboundedSender<WsMessage>,
}

impl Connection {
    pub fn new(sender: UnboundedSender<WsMessage>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            sender,
        }
    }

    /// Queue a frame. Returns false if the write loop is already gone.
    pub fn send(&self, msg: WsMessage) -> bool {
        self.sender.send(msg).is_ok()
    }

    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    /// Queue a close frame; the write loop flushes it and stops.
    pub fn close(&self, reason: DisconnectReason) {
        let _ = self.sender.send(reason.close_message());
    }
}
