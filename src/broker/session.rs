//! Session registry
//!
//! One live `Session` per user id. Registering an id that already has a
//! session closes the old connection with `DisconnectReason::Superseded` and
//! hands the old session back so the broker can release its memberships.

use std::collections::{HashMap, HashSet};

use crate::broker::topic::UserId;
use crate::client::{Connection, DisconnectReason};

#[derive(Debug)]
pub struct Session {
    pub user: UserId,
    /// Copied from login; fixed for the life of the session.
    pub moderator: bool,
    pub connection: Connection,
    pub topics: HashSet<String>,
}

impl Session {
    pub fn new(user: &str, moderator: bool, connection: Connection) -> Self {
        Self {
            user: user.to_string(),
            moderator,
            connection,
            topics: HashSet::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.connection.id
    }
}

#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: HashMap<UserId, Session>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install `session`, returning the one it replaced (already closed).
    pub fn register(&mut self, session: Session) -> Option<Session> {
        let previous = self.sessions.insert(session.user.clone(), session);
        if let Some(previous) = &previous {
            previous.connection.close(DisconnectReason::Superseded);
        }
        previous
    }

    pub fn lookup(&self, user: &str) -> Option<&Session> {
        self.sessions.get(user)
    }

    pub fn lookup_mut(&mut self, user: &str) -> Option<&mut Session> {
        self.sessions.get_mut(user)
    }

    /// The session for `user`, but only if it is still the connection
    /// identified by `session_id`.
    pub fn current(&self, user: &str, session_id: &str) -> Option<&Session> {
        self.sessions.get(user).filter(|s| s.id() == session_id)
    }

    pub fn remove(&mut self, user: &str) -> Option<Session> {
        self.sessions.remove(user)
    }

    /// Remove the entry only if it still belongs to `session_id`, so a late
    /// teardown of a superseded connection leaves its replacement alone.
    pub fn remove_current(&mut self, user: &str, session_id: &str) -> Option<Session> {
        self.current(user, session_id)?;
        self.sessions.remove(user)
    }

    pub fn contains(&self, user: &str) -> bool {
        self.sessions.contains_key(user)
    }

    pub fn moderators(&self) -> impl Iterator<Item = &Session> {
        self.sessions.values().filter(|s| s.moderator)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
