//! In-memory session store.
//!
//! Emulates the two-table backend (`chat_sessions`, `chat_messages`) inside the
//! process. Used in offline mode and as the reference store in tests.

use async_trait::async_trait;
use chrono::Utc;
use freya_core::error::{FreyaError, Result};
use freya_core::session::{Session, SessionStore};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::dto::{MessageRow, SessionRow};

#[derive(Default)]
struct Tables {
    sessions: HashMap<String, SessionRow>,
    messages: HashMap<String, MessageRow>,
}

impl Tables {
    fn messages_of(&self, session_id: &str) -> Vec<MessageRow> {
        self.messages
            .values()
            .filter(|row| row.session_id == session_id)
            .cloned()
            .collect()
    }
}

/// Session store keeping rows in memory.
#[derive(Default)]
pub struct InMemorySessionStore {
    tables: RwLock<Tables>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of message rows currently stored for `session_id`.
    pub async fn message_row_count(&self, session_id: &str) -> usize {
        self.tables.read().await.messages_of(session_id).len()
    }

    /// Inserts a session as-is, bypassing timestamp assignment. Used to seed data.
    pub async fn insert(&self, session: &Session) -> Result<()> {
        let owner = session
            .user_id
            .clone()
            .ok_or_else(|| FreyaError::data_access("Cannot store a guest session"))?;
        let mut tables = self.tables.write().await;
        tables.sessions.insert(
            session.id.clone(),
            SessionRow {
                id: session.id.clone(),
                user_id: owner.clone(),
                name: session.name.clone(),
                created_at: session.created_at.clone(),
                last_updated_at: session.last_updated_at.clone(),
            },
        );
        for (position, message) in session.messages.iter().enumerate() {
            tables.messages.insert(
                message.id.clone(),
                MessageRow::from_message(message, &session.id, &owner, position),
            );
        }
        Ok(())
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<Session>> {
        let tables = self.tables.read().await;
        let mut sessions: Vec<Session> = tables
            .sessions
            .values()
            .filter(|row| row.user_id == owner_id)
            .map(|row| row.clone().into_session(tables.messages_of(&row.id)))
            .collect();
        sessions.sort_by(|a, b| b.cmp_recency(a));
        Ok(sessions)
    }

    async fn create(&self, owner_id: &str, ordinal: usize) -> Result<Session> {
        let now = Utc::now().to_rfc3339();
        let row = SessionRow {
            id: Uuid::new_v4().to_string(),
            user_id: owner_id.to_string(),
            name: Session::default_name(ordinal),
            created_at: now.clone(),
            last_updated_at: now,
        };
        self.tables
            .write()
            .await
            .sessions
            .insert(row.id.clone(), row.clone());
        Ok(row.into_session(Vec::new()))
    }

    async fn update(&self, owner_id: &str, session: &Session) -> Result<Session> {
        let mut tables = self.tables.write().await;

        let row = tables
            .sessions
            .get_mut(&session.id)
            .filter(|row| row.user_id == owner_id)
            .ok_or_else(|| FreyaError::not_found("session", &session.id))?;
        row.name = session.name.clone();
        row.last_updated_at = Utc::now().to_rfc3339();
        let row = row.clone();

        // Upsert every message by id, then drop rows that left the transcript.
        for (position, message) in session.messages.iter().enumerate() {
            tables.messages.insert(
                message.id.clone(),
                MessageRow::from_message(message, &session.id, owner_id, position),
            );
        }
        let keep: std::collections::HashSet<&str> =
            session.messages.iter().map(|m| m.id.as_str()).collect();
        tables
            .messages
            .retain(|id, row| row.session_id != session.id || keep.contains(id.as_str()));

        let messages = tables.messages_of(&session.id);
        Ok(row.into_session(messages))
    }
}
