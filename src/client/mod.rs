//! The `client` module defines the broker's handle on one physical
//! connection: an id, the sending half of the connection's outbound queue,
//! and the reasons a connection can be ended.

pub mod connection;
pub use connection::{Connection, DisconnectReason};
