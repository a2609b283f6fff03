//! Topic directory
//!
//! Topics are created lazily on first membership and never deleted; an empty
//! topic is harmless. Membership is a plain `HashSet` of user ids.
//!
//! Callers synchronize access through the broker lock.

use std::collections::{HashMap, HashSet};

pub type UserId = String;

#[derive(Debug, Default)]
pub struct Topic {
    pub name: String,
    pub members: HashSet<UserId>,
}

impl Topic {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            members: HashSet::new(),
        }
    }

    /// Returns true if the user was not already a member.
    pub fn add(&mut self, user: UserId) -> bool {
        self.members.insert(user)
    }

    pub fn remove(&mut self, user: &str) -> bool {
        self.members.remove(user)
    }
}

#[derive(Debug, Default)]
pub struct TopicDirectory {
    topics: HashMap<String, Topic>,
}

impl TopicDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_member(&self, topic: &str, user: &str) -> bool {
        self.topics
            .get(topic)
            .is_some_and(|t| t.members.contains(user))
    }

    /// Idempotent.
    pub fn add_member(&mut self, topic: &str, user: &str) -> bool {
        self.topics
            .entry(topic.to_string())
            .or_insert_with(|| Topic::new(topic))
            .add(user.to_string())
    }

    /// Idempotent; unknown topics are ignored.
    pub fn remove_member(&mut self, topic: &str, user: &str) -> bool {
        self.topics
            .get_mut(topic)
            .is_some_and(|t| t.remove(user))
    }

    /// Snapshot of the current members, safe to iterate while the directory
    /// changes.
    pub fn members(&self, topic: &str) -> Vec<UserId> {
        self.topics
            .get(topic)
            .map(|t| t.members.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Every topic `user` currently belongs to.
    pub fn topics_of(&self, user: &str) -> Vec<String> {
        self.topics
            .values()
            .filter(|t| t.members.contains(user))
            .map(|t| t.name.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.topics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }
}
