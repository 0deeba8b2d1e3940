//! Chat state model.

use crate::session::{Message, Session};

/// Everything the chat window renders.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatState {
    /// Transcript of the active session.
    pub current_messages: Vec<Message>,
    pub active_session_id: Option<String>,
    /// Roster of every session known to the current identity context.
    pub all_sessions: Vec<Session>,
    /// One-way latch for the startup phase; only a context reset clears it.
    pub is_initialized: bool,
    /// Set while a command is in flight; disables further submissions.
    pub is_assistant_processing: bool,
    /// Set while the lifecycle controller is loading data.
    pub is_loading: bool,
}

impl ChatState {
    pub fn active_session(&self) -> Option<&Session> {
        let id = self.active_session_id.as_deref()?;
        self.all_sessions.iter().find(|session| session.id == id)
    }

    pub fn find_session(&self, session_id: &str) -> Option<&Session> {
        self.all_sessions.iter().find(|session| session.id == session_id)
    }

    /// Display name of the active session.
    pub fn active_session_name(&self) -> String {
        match (&self.active_session_id, self.active_session()) {
            (_, Some(session)) => session.name.clone(),
            (Some(id), None) => format!("Session {}...", id.chars().take(4).collect::<String>()),
            (None, None) => "New Chat".to_string(),
        }
    }

    /// The active session's roster entry with the live transcript applied.
    pub fn active_session_snapshot(&self) -> Option<Session> {
        self.active_session().map(|session| Session {
            messages: self.current_messages.clone(),
            ..session.clone()
        })
    }
}
