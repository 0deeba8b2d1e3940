//! Transcript message types.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::model::now_timestamp;

/// Who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Assistant,
}

/// How a message is rendered.
///
/// `Plugin` messages are handed to the originating plugin's renderer together with
/// their `plugin_data`; every other type is shown as plain text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    Text,
    Plugin,
    Loading,
    Error,
}

/// A single turn in a session.
///
/// Messages are never edited in place. A loading placeholder is superseded by a
/// new `Message` carrying the same `id` (see `ChatAction::ReplaceMessage`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub sender: Sender,
    pub content: String,
    /// Creation time (RFC 3339).
    pub timestamp: String,
    #[serde(rename = "type")]
    pub message_type: MessageType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plugin_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plugin_data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl Message {
    /// Generates a fresh message id.
    pub fn new_id() -> String {
        Uuid::new_v4().to_string()
    }

    fn assistant(id: String, content: impl Into<String>, message_type: MessageType) -> Self {
        Self {
            id,
            sender: Sender::Assistant,
            content: content.into(),
            timestamp: now_timestamp(),
            message_type,
            plugin_name: None,
            plugin_data: None,
            error_message: None,
        }
    }

    /// A text message typed by the user.
    pub fn user_text(content: impl Into<String>) -> Self {
        Self {
            id: Self::new_id(),
            sender: Sender::User,
            content: content.into(),
            timestamp: now_timestamp(),
            message_type: MessageType::Text,
            plugin_name: None,
            plugin_data: None,
            error_message: None,
        }
    }

    /// A plain assistant reply with a fresh id.
    pub fn assistant_text(content: impl Into<String>) -> Self {
        Self::assistant(Self::new_id(), content, MessageType::Text)
    }

    /// The placeholder shown while a plugin executes.
    pub fn loading(id: impl Into<String>, plugin_name: &str, label: &str) -> Self {
        let mut message = Self::assistant(id.into(), label, MessageType::Loading);
        message.plugin_name = Some(plugin_name.to_string());
        message
    }

    /// The resolved result of a successful plugin execution.
    ///
    /// `rendered` selects `MessageType::Plugin` over `MessageType::Text`.
    pub fn plugin_result(
        id: impl Into<String>,
        plugin_name: &str,
        content: impl Into<String>,
        data: Option<Value>,
        rendered: bool,
    ) -> Self {
        let message_type = if rendered {
            MessageType::Plugin
        } else {
            MessageType::Text
        };
        let mut message = Self::assistant(id.into(), content, message_type);
        message.plugin_name = Some(plugin_name.to_string());
        message.plugin_data = data;
        message
    }

    /// An error attributed to a plugin.
    pub fn plugin_error(
        id: impl Into<String>,
        plugin_name: &str,
        content: impl Into<String>,
        error_message: impl Into<String>,
    ) -> Self {
        let mut message = Self::assistant(id.into(), content, MessageType::Error);
        message.plugin_name = Some(plugin_name.to_string());
        message.error_message = Some(error_message.into());
        message
    }

    pub fn is_loading(&self) -> bool {
        self.message_type == MessageType::Loading
    }
}
