//! Row-level records of the session storage backend.
//!
//! The backend keeps sessions and messages in two tables with snake_case columns.
//! These records are the storage shape; `Session`/`Message` are the domain shape.

use freya_core::session::{Message, MessageType, Sender, Session};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A row of the `chat_sessions` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRow {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub created_at: String,
    pub last_updated_at: String,
}

/// A row of the `chat_messages` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageRow {
    pub id: String,
    pub session_id: String,
    pub user_id: String,
    /// Transcript position; rows are read back ordered by it.
    pub position: usize,
    pub sender: Sender,
    pub content: String,
    pub timestamp: String,
    #[serde(rename = "type")]
    pub message_type: MessageType,
    pub plugin_name: Option<String>,
    pub plugin_data: Option<Value>,
    pub error_message: Option<String>,
}

impl MessageRow {
    pub fn from_message(message: &Message, session_id: &str, user_id: &str, position: usize) -> Self {
        Self {
            id: message.id.clone(),
            session_id: session_id.to_string(),
            user_id: user_id.to_string(),
            position,
            sender: message.sender,
            content: message.content.clone(),
            timestamp: message.timestamp.clone(),
            message_type: message.message_type,
            plugin_name: message.plugin_name.clone(),
            plugin_data: message.plugin_data.clone(),
            error_message: message.error_message.clone(),
        }
    }
}

impl From<&MessageRow> for Message {
    fn from(row: &MessageRow) -> Self {
        Message {
            id: row.id.clone(),
            sender: row.sender,
            content: row.content.clone(),
            timestamp: row.timestamp.clone(),
            message_type: row.message_type,
            plugin_name: row.plugin_name.clone(),
            plugin_data: row.plugin_data.clone(),
            error_message: row.error_message.clone(),
        }
    }
}

impl SessionRow {
    /// Assembles the domain session from this row and its message rows.
    pub fn into_session(self, mut messages: Vec<MessageRow>) -> Session {
        messages.sort_by_key(|row| row.position);
        Session {
            id: self.id,
            user_id: Some(self.user_id),
            name: self.name,
            messages: messages.iter().map(Message::from).collect(),
            created_at: self.created_at,
            last_updated_at: self.last_updated_at,
        }
    }
}
