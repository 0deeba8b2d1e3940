//! Chat actions.

use crate::session::{Message, Session};

/// The closed vocabulary of chat state transitions.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatAction {
    SetLoading(bool),
    InitializationLoaded {
        sessions: Vec<Session>,
        active_session_id: Option<String>,
    },
    SetActiveSessionAndMessages {
        session_id: String,
        messages: Vec<Message>,
    },
    ResetForNewContext,
    CreateNewSessionSuccess(Session),
    AddMessage(Message),
    /// Substitutes the message with the same id; ignored when no such id exists.
    ReplaceMessage(Message),
    SetAssistantProcessing(bool),
    MarkInitialized,
    /// Upserts a session into the roster by id.
    UpdateSessionInAllSessions(Session),
}

impl ChatAction {
    /// Whether this action can change the active transcript or which session is active.
    pub fn touches_messages(&self) -> bool {
        matches!(
            self,
            Self::AddMessage(_)
                | Self::ReplaceMessage(_)
                | Self::SetActiveSessionAndMessages { .. }
                | Self::CreateNewSessionSuccess(_)
        )
    }

    /// Short action name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::SetLoading(_) => "set-loading",
            Self::InitializationLoaded { .. } => "initialization-loaded",
            Self::SetActiveSessionAndMessages { .. } => "set-active-session-and-messages",
            Self::ResetForNewContext => "reset-for-new-context",
            Self::CreateNewSessionSuccess(_) => "create-new-session-success",
            Self::AddMessage(_) => "add-message",
            Self::ReplaceMessage(_) => "replace-message",
            Self::SetAssistantProcessing(_) => "set-assistant-processing",
            Self::MarkInitialized => "mark-initialized",
            Self::UpdateSessionInAllSessions(_) => "update-session-in-all-sessions",
        }
    }
}
