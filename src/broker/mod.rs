//! The broker: who is connected, who belongs to which topic, and who is
//! waiting for a moderator.
//!
//! - `session`: one live `Session` per user, replace-on-reconnect.
//! - `topic`: lazily created topics and their member sets.
//! - `pending`: subscription requests awaiting approval, oldest first.
//! - `engine`: the `Broker` aggregate that routes client frames across the
//!   three.

pub mod engine;
pub mod pending;
pub mod session;
pub mod topic;

pub use engine::{Broker, SharedBroker, lock_broker};
