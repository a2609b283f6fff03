//! # modrelay
//!
//! `modrelay` is an in-memory chat relay with moderated topics. Each user
//! holds a single WebSocket; joining a topic takes a moderator's approval,
//! and chat messages reach only the topic's current members.
//!
//! ## Core Modules
//!
//! - `broker`: sessions, topic membership, pending requests, and the routing
//!   of client frames across them.
//! - `client`: the broker's handle on one physical connection.
//! - `config`: loading server, broker, logging, and user settings.
//! - `transport`: the WebSocket server, handshake, and wire frames.
//! - `utils`: error taxonomy and logging setup.

pub mod broker;
pub mod client;
pub mod config;
pub mod transport;
pub mod utils;
