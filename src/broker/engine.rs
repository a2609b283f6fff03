//! Broker engine
//!
//! `Broker` owns the three pieces of shared state (sessions, topic
//! membership, pending requests) and implements the protocol on top of them:
//! - `subscribe_request` queues a pending entry and tells the moderators
//! - `approve_subscription` (moderators only) moves the entry into the topic
//! - `chat_message` (members only) fans out to the topic's current members
//! - `list_pending` (moderators only) replays the queue to the caller
//!
//! Concurrency and usage notes:
//! - The API is synchronous and meant to sit behind one coarse lock
//!   (`SharedBroker`). Every handler validates before it mutates, so a
//!   rejected frame leaves no partial state behind.
//! - Outbound frames are pushed onto per-connection unbounded queues, so
//!   holding the lock while "sending" never waits on a socket.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, info, warn};

use crate::broker::pending::{PendingQueue, PendingRequest};
use crate::broker::session::{Session, SessionRegistry};
use crate::broker::topic::TopicDirectory;
use crate::client::{Connection, DisconnectReason};
use crate::transport::message::{ClientMessage, ServerMessage, now};
use crate::utils::BrokerError;

pub type SharedBroker = Arc<Mutex<Broker>>;

/// Lock the broker, recovering the state if a holder panicked.
pub fn lock_broker(broker: &SharedBroker) -> MutexGuard<'_, Broker> {
    broker.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug, Default)]
pub struct Broker {
    sessions: SessionRegistry,
    topics: TopicDirectory,
    pending: PendingQueue,
}

impl Broker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> SharedBroker {
        Arc::new(Mutex::new(Self::new()))
    }

    pub fn sessions(&self) -> &SessionRegistry {
        &self.sessions
    }

    pub fn topics(&self) -> &TopicDirectory {
        &self.topics
    }

    pub fn pending(&self) -> &PendingQueue {
        &self.pending
    }

    /// Register a connection for `user`.
    ///
    /// A previous session for the same user is closed as superseded and its
    /// memberships are dropped: the new connection starts with none. A user
    /// with no previous session picks up any approvals granted while they
    /// were offline. Moderators are sent the current pending queue, minus
    /// their own requests.
    pub fn connect(&mut self, user: &str, moderator: bool, connection: Connection) {
        let mut session = Session::new(user, moderator, connection);
        let session_id = session.id().to_string();

        if !self.sessions.contains(user) {
            session.topics = self.topics.topics_of(user).into_iter().collect();
        }

        if let Some(previous) = self.sessions.register(session) {
            self.release_memberships(&previous);
            info!(
                user,
                session = %session_id,
                superseded = %previous.id(),
                "session replaced by a newer connection"
            );
        } else {
            info!(user, session = %session_id, moderator, "session registered");
        }

        if moderator {
            self.send_pending(user, None);
        }
    }

    /// Tear down the session `session_id` of `user`.
    ///
    /// Returns false if that session is already gone (torn down before, or
    /// replaced), in which case nothing changes.
    pub fn disconnect(&mut self, user: &str, session_id: &str, reason: DisconnectReason) -> bool {
        match self.sessions.remove_current(user, session_id) {
            Some(session) => {
                self.release_memberships(&session);
                info!(user, session = %session_id, %reason, "session closed");
                true
            }
            None => {
                debug!(user, session = %session_id, %reason, "session already released");
                false
            }
        }
    }

    /// Decode and route one inbound text frame from `session_id`.
    ///
    /// Failures are reported to the sender and never close the connection.
    pub fn handle_message(&mut self, user: &str, session_id: &str, text: &str) {
        if self.sessions.current(user, session_id).is_none() {
            let err = BrokerError::UnknownSession {
                user: user.to_string(),
                session: session_id.to_string(),
            };
            debug!(%err, "dropping frame from a released session");
            return;
        }

        let result = ClientMessage::decode(text).and_then(|msg| self.dispatch(user, msg));
        if let Err(err) = result {
            self.report(user, &err);
        }
    }

    /// Report `err` to `session_id`, unless that session has been released.
    pub fn reject(&self, user: &str, session_id: &str, err: &BrokerError) {
        if self.sessions.current(user, session_id).is_some() {
            self.report(user, err);
        }
    }

    fn dispatch(&mut self, user: &str, msg: ClientMessage) -> Result<(), BrokerError> {
        match msg {
            ClientMessage::SubscribeRequest { topic } => self.request_subscription(user, &topic),
            ClientMessage::ApproveSubscription {
                topic,
                requesting_user,
            } => self.approve_subscription(user, &topic, &requesting_user),
            ClientMessage::ChatMessage { topic, message } => self.relay_chat(user, &topic, message),
            ClientMessage::ListPending { topic } => self.list_pending(user, topic.as_deref()),
        }
    }

    /// Tell `user` why their frame was not applied.
    pub fn report(&self, user: &str, err: &BrokerError) {
        if !err.is_reportable() {
            return;
        }
        let frame = if err.is_duplicate() {
            debug!(user, %err, "duplicate subscription request");
            ServerMessage::system(err.to_string())
        } else {
            warn!(user, %err, "rejected client frame");
            ServerMessage::error(err.to_string())
        };
        self.unicast(user, &frame);
    }

    pub fn request_subscription(&mut self, user: &str, topic: &str) -> Result<(), BrokerError> {
        if self.topics.is_member(topic, user) {
            return Err(BrokerError::AlreadyMember {
                topic: topic.to_string(),
            });
        }
        let request = self
            .pending
            .enqueue(topic, user)
            .ok_or_else(|| BrokerError::AlreadyPending {
                topic: topic.to_string(),
            })?;

        info!(user, topic, "subscription request queued");
        self.notify_moderators(&request);
        self.unicast(
            user,
            &ServerMessage::system(format!("Subscription request sent for {topic}")),
        );
        Ok(())
    }

    pub fn approve_subscription(
        &mut self,
        moderator: &str,
        topic: &str,
        requesting_user: &str,
    ) -> Result<(), BrokerError> {
        if !self.sessions.lookup(moderator).is_some_and(|s| s.moderator) {
            return Err(BrokerError::AuthorizationDenied);
        }
        let request = self
            .pending
            .resolve(topic, requesting_user)
            .ok_or_else(|| BrokerError::UnknownRequest {
                topic: topic.to_string(),
                requesting_user: requesting_user.to_string(),
            })?;

        self.topics.add_member(topic, requesting_user);
        if let Some(session) = self.sessions.lookup_mut(requesting_user) {
            session.topics.insert(topic.to_string());
        }
        let waited = chrono::Utc::now() - request.created_at;
        info!(
            moderator,
            requesting_user,
            topic,
            waited_secs = waited.num_seconds(),
            "subscription approved"
        );

        self.unicast(
            requesting_user,
            &ServerMessage::SubscriptionApproved {
                topic: topic.to_string(),
                message: format!("Your subscription to {topic} was approved"),
                timestamp: now(),
            },
        );
        self.unicast(
            moderator,
            &ServerMessage::system(format!("Approved {requesting_user} for {topic}")),
        );
        Ok(())
    }

    pub fn relay_chat(&mut self, user: &str, topic: &str, message: String) -> Result<(), BrokerError> {
        if !self.topics.is_member(topic, user) {
            return Err(BrokerError::NotAMember {
                topic: topic.to_string(),
            });
        }
        let frame = ServerMessage::ChatMessage {
            topic: topic.to_string(),
            message,
            user: user.to_string(),
            timestamp: now(),
        };
        let delivered = self.multicast(topic, &frame);
        debug!(user, topic, delivered, "chat message relayed");
        Ok(())
    }

    pub fn list_pending(&self, user: &str, topic: Option<&str>) -> Result<(), BrokerError> {
        if !self.sessions.lookup(user).is_some_and(|s| s.moderator) {
            return Err(BrokerError::ModeratorOnly);
        }
        self.send_pending(user, topic);
        Ok(())
    }

    /// Queue `frame` for `user`'s live session. Missing or closed sessions are
    /// skipped.
    pub fn unicast(&self, user: &str, frame: &ServerMessage) -> bool {
        let Some(session) = self.sessions.lookup(user) else {
            debug!(user, "no live session, dropping frame");
            return false;
        };
        match frame.to_ws() {
            Ok(msg) => deliver(session, msg),
            Err(e) => {
                warn!(user, error = %e, "failed to serialize frame");
                false
            }
        }
    }

    /// Deliver `frame` to a snapshot of `topic`'s members. Returns how many
    /// connections accepted it.
    pub fn multicast(&self, topic: &str, frame: &ServerMessage) -> usize {
        let msg = match frame.to_ws() {
            Ok(msg) => msg,
            Err(e) => {
                warn!(topic, error = %e, "failed to serialize frame");
                return 0;
            }
        };
        self.topics
            .members(topic)
            .iter()
            .filter_map(|member| self.sessions.lookup(member))
            .filter(|session| deliver(session, msg.clone()))
            .count()
    }

    fn notify_moderators(&self, request: &PendingRequest) {
        let frame = request_frame(request);
        let msg = match frame.to_ws() {
            Ok(msg) => msg,
            Err(e) => {
                warn!(error = %e, "failed to serialize frame");
                return;
            }
        };
        for session in self
            .sessions
            .moderators()
            .filter(|s| s.user != request.requesting_user)
        {
            deliver(session, msg.clone());
        }
    }

    /// Replay pending requests to moderator `user`, leaving out their own.
    fn send_pending(&self, user: &str, topic: Option<&str>) {
        let requests: Vec<&PendingRequest> = match topic {
            Some(topic) => self.pending.list_topic(topic).collect(),
            None => self.pending.list().iter().collect(),
        };
        for request in requests.into_iter().filter(|r| r.requesting_user != user) {
            self.unicast(user, &request_frame(request));
        }
    }

    fn release_memberships(&mut self, session: &Session) {
        for topic in &session.topics {
            self.topics.remove_member(topic, &session.user);
        }
    }
}

fn request_frame(request: &PendingRequest) -> ServerMessage {
    ServerMessage::SubscriptionRequest {
        topic: request.topic.clone(),
        requesting_user: request.requesting_user.clone(),
        timestamp: now(),
    }
}

fn deliver(session: &Session, msg: tungstenite::protocol::Message) -> bool {
    if session.connection.is_closed() {
        debug!(user = %session.user, session = %session.id(), "skipping closed connection");
        return false;
    }
    if !session.connection.send(msg) {
        debug!(user = %session.user, session = %session.id(), "connection closed mid-send");
        return false;
    }
    true
}
