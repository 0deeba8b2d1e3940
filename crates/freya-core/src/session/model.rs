//! Core session domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::message::Message;

/// Returns the current time as an RFC 3339 string.
pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339()
}

/// A named, timestamped container for an ordered transcript.
///
/// `user_id` is absent for guest sessions; the persistence layer branches on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: String,
    #[serde(
        default,
        rename = "user_id",
        alias = "userId",
        skip_serializing_if = "Option::is_none"
    )]
    pub user_id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub messages: Vec<Message>,
    pub created_at: String,
    pub last_updated_at: String,
}

impl Session {
    /// Creates an empty session for a guest context.
    pub fn new_guest(ordinal: usize) -> Self {
        let now = now_timestamp();
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: None,
            name: format!("Guest Chat {}", ordinal + 1),
            messages: Vec::new(),
            created_at: now.clone(),
            last_updated_at: now,
        }
    }

    /// Default display name for an account-backed session.
    pub fn default_name(ordinal: usize) -> String {
        format!("Chat {}", ordinal + 1)
    }

    pub fn is_guest(&self) -> bool {
        self.user_id.is_none()
    }

    /// Parses `last_updated_at`, if it is a valid RFC 3339 timestamp.
    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.last_updated_at)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }

    /// Orders two sessions by recency of their last update.
    ///
    /// Falls back to string comparison when either timestamp does not parse.
    pub fn cmp_recency(&self, other: &Session) -> std::cmp::Ordering {
        match (self.last_updated(), other.last_updated()) {
            (Some(a), Some(b)) => a.cmp(&b),
            _ => self.last_updated_at.cmp(&other.last_updated_at),
        }
    }
}

/// Returns the most recently updated session, if any.
pub fn latest_updated(sessions: &[Session]) -> Option<&Session> {
    sessions.iter().max_by(|a, b| a.cmp_recency(b))
}
