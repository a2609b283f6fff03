//! Connection parameters.
//!
//! Authentication happens before a socket reaches the relay; the identity
//! arrives as `?user_id=<name>` and the role flag as `&moderator=true`. When a
//! user list is configured it is authoritative for both.

use crate::client::DisconnectReason;
use crate::config::UserSettings;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user: String,
    pub moderator: bool,
}

pub fn authorize(query: Option<&str>, users: &[UserSettings]) -> Result<Identity, DisconnectReason> {
    let mut user = None;
    let mut moderator = false;
    for (key, value) in url::form_urlencoded::parse(query.unwrap_or_default().as_bytes()) {
        match &*key {
            "user_id" => user = Some(value.trim().to_string()),
            "moderator" => moderator = matches!(&*value, "true" | "1" | "yes"),
            _ => {}
        }
    }

    let user = user
        .filter(|u| !u.is_empty())
        .ok_or(DisconnectReason::UnknownUser)?;

    if users.is_empty() {
        return Ok(Identity { user, moderator });
    }
    users
        .iter()
        .find(|u| u.name == user)
        .map(|u| Identity {
            user: u.name.clone(),
            moderator: u.moderator,
        })
        .ok_or(DisconnectReason::UnknownUser)
}
