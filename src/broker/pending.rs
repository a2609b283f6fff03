//! Pending subscription requests, oldest first.
//!
//! There is no reject or expiry: an entry leaves the queue only when a
//! moderator approves it. Approval is rare next to chat traffic, so a linear
//! scan is fine here.

use chrono::{DateTime, Utc};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingRequest {
    pub topic: String,
    pub requesting_user: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
pub struct PendingQueue {
    entries: Vec<PendingRequest>,
}

impl PendingQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a request. Returns `None` when the same pair is already queued.
    ///
    /// Membership is not checked here; the broker rejects members before
    /// calling this.
    pub fn enqueue(&mut self, topic: &str, requesting_user: &str) -> Option<PendingRequest> {
        if self.contains(topic, requesting_user) {
            return None;
        }
        let request = PendingRequest {
            topic: topic.to_string(),
            requesting_user: requesting_user.to_string(),
            created_at: Utc::now(),
        };
        self.entries.push(request.clone());
        Some(request)
    }

    pub fn contains(&self, topic: &str, requesting_user: &str) -> bool {
        self.entries
            .iter()
            .any(|r| r.topic == topic && r.requesting_user == requesting_user)
    }

    /// All outstanding requests in arrival order.
    pub fn list(&self) -> &[PendingRequest] {
        &self.entries
    }

    pub fn list_topic<'a>(&'a self, topic: &'a str) -> impl Iterator<Item = &'a PendingRequest> {
        self.entries.iter().filter(move |r| r.topic == topic)
    }

    /// Remove the matching entry. `None` if there was nothing to remove.
    pub fn resolve(&mut self, topic: &str, requesting_user: &str) -> Option<PendingRequest> {
        let idx = self
            .entries
            .iter()
            .position(|r| r.topic == topic && r.requesting_user == requesting_user)?;
        Some(self.entries.remove(idx))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
