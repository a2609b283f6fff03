//! The `transport` module handles network communication with clients over
//! WebSockets.
//!
//! It defines the JSON frames exchanged with clients, reads the identity a
//! connection was opened with, and supervises each connection's read and
//! write loops and heartbeat, handing decoded frames to the broker.

pub mod handshake;
pub mod heartbeat;
pub mod message;
pub mod websocket;

pub use message::{ClientMessage, ServerMessage};
pub use websocket::{serve, start_websocket_server};
