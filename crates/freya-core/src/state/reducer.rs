//! The chat reducer.

use super::action::ChatAction;
use super::model::ChatState;

/// Applies `action` to `state`, returning the next state.
pub fn reduce(state: &ChatState, action: ChatAction) -> ChatState {
    match action {
        ChatAction::SetLoading(is_loading) => ChatState {
            is_loading,
            ..state.clone()
        },

        // currentMessages is filled in by a following SetActiveSessionAndMessages
        ChatAction::InitializationLoaded {
            sessions,
            active_session_id,
        } => ChatState {
            all_sessions: sessions,
            active_session_id,
            ..state.clone()
        },

        ChatAction::SetActiveSessionAndMessages {
            session_id,
            messages,
        } => ChatState {
            active_session_id: Some(session_id),
            current_messages: messages,
            ..state.clone()
        },

        ChatAction::ResetForNewContext => ChatState::default(),

        ChatAction::CreateNewSessionSuccess(new_session) => {
            let mut all_sessions: Vec<_> = state
                .all_sessions
                .iter()
                .filter(|session| session.id != new_session.id)
                .cloned()
                .collect();
            let active_session_id = Some(new_session.id.clone());
            all_sessions.push(new_session);
            ChatState {
                all_sessions,
                active_session_id,
                current_messages: Vec::new(),
                ..state.clone()
            }
        }

        ChatAction::AddMessage(message) => {
            let mut next = state.clone();
            next.current_messages.push(message);
            next
        }

        ChatAction::ReplaceMessage(message) => {
            let mut next = state.clone();
            if let Some(slot) = next
                .current_messages
                .iter_mut()
                .find(|existing| existing.id == message.id)
            {
                *slot = message;
            }
            next
        }

        ChatAction::SetAssistantProcessing(is_assistant_processing) => ChatState {
            is_assistant_processing,
            ..state.clone()
        },

        ChatAction::MarkInitialized => ChatState {
            is_initialized: true,
            ..state.clone()
        },

        ChatAction::UpdateSessionInAllSessions(updated) => {
            let mut next = state.clone();
            match next
                .all_sessions
                .iter_mut()
                .find(|session| session.id == updated.id)
            {
                Some(slot) => *slot = updated,
                None => next.all_sessions.push(updated),
            }
            next
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{Message, MessageType, Session};

    fn session(id: &str) -> Session {
        Session {
            id: id.to_string(),
            user_id: None,
            name: format!("Chat {id}"),
            messages: Vec::new(),
            created_at: "2024-01-01T00:00:00Z".to_string(),
            last_updated_at: "2024-01-01T00:00:00Z".to_string(),
        }
    }

    #[test]
    fn test_initial_state() {
        let state = ChatState::default();
        assert!(state.all_sessions.is_empty());
        assert!(state.active_session_id.is_none());
        assert!(!state.is_initialized);
        assert!(!state.is_assistant_processing);
    }

    #[test]
    fn test_replace_keeps_position_and_single_copy() {
        let user = Message::user_text("/weather Paris");
        let loading = Message::loading("X", "weather", "Fetching weather...");
        let trailing = Message::assistant_text("later");

        let mut state = ChatState::default();
        for message in [user.clone(), loading, trailing.clone()] {
            state = reduce(&state, ChatAction::AddMessage(message));
        }

        let final_message = Message::plugin_result("X", "weather", "Sunny", None, false);
        let state = reduce(&state, ChatAction::ReplaceMessage(final_message.clone()));

        assert_eq!(state.current_messages.len(), 3);
        assert_eq!(state.current_messages[0], user);
        assert_eq!(state.current_messages[1], final_message);
        assert_eq!(state.current_messages[2], trailing);
        assert_eq!(
            state.current_messages.iter().filter(|m| m.id == "X").count(),
            1
        );
    }

    #[test]
    fn test_replace_unknown_id_is_noop() {
        let state = reduce(
            &ChatState::default(),
            ChatAction::AddMessage(Message::user_text("hi")),
        );
        let next = reduce(
            &state,
            ChatAction::ReplaceMessage(Message::assistant_text("orphan")),
        );
        assert_eq!(next, state);
    }

    #[test]
    fn test_reducer_is_pure() {
        let state = reduce(
            &ChatState::default(),
            ChatAction::CreateNewSessionSuccess(session("a")),
        );
        let action = ChatAction::AddMessage(Message::user_text("hello"));
        let first = reduce(&state, action.clone());
        let second = reduce(&state, action);
        assert_eq!(first, second);
        assert!(state.current_messages.is_empty());
    }

    #[test]
    fn test_create_new_session_appends_and_activates() {
        let mut state = reduce(
            &ChatState::default(),
            ChatAction::InitializationLoaded {
                sessions: vec![session("a")],
                active_session_id: Some("a".to_string()),
            },
        );
        state = reduce(&state, ChatAction::AddMessage(Message::user_text("hi")));
        let state = reduce(&state, ChatAction::CreateNewSessionSuccess(session("b")));

        assert_eq!(state.all_sessions.len(), 2);
        assert_eq!(state.all_sessions[1].id, "b");
        assert_eq!(state.active_session_id.as_deref(), Some("b"));
        assert!(state.current_messages.is_empty());
    }

    #[test]
    fn test_upsert_updates_in_place_or_appends() {
        let state = reduce(
            &ChatState::default(),
            ChatAction::InitializationLoaded {
                sessions: vec![session("a"), session("b")],
                active_session_id: None,
            },
        );

        let mut renamed = session("a");
        renamed.name = "Renamed".to_string();
        let state = reduce(&state, ChatAction::UpdateSessionInAllSessions(renamed));
        assert_eq!(state.all_sessions[0].name, "Renamed");
        assert_eq!(state.all_sessions.len(), 2);

        let state = reduce(&state, ChatAction::UpdateSessionInAllSessions(session("c")));
        assert_eq!(state.all_sessions.len(), 3);
        assert_eq!(state.all_sessions[2].id, "c");
    }

    #[test]
    fn test_upsert_does_not_leak_messages_between_sessions() {
        let mut state = reduce(
            &ChatState::default(),
            ChatAction::InitializationLoaded {
                sessions: vec![session("a"), session("b")],
                active_session_id: Some("a".to_string()),
            },
        );
        state = reduce(
            &state,
            ChatAction::SetActiveSessionAndMessages {
                session_id: "a".to_string(),
                messages: Vec::new(),
            },
        );
        state = reduce(&state, ChatAction::AddMessage(Message::user_text("for a")));

        let saved_a = state.active_session_snapshot().unwrap();
        state = reduce(&state, ChatAction::UpdateSessionInAllSessions(saved_a));
        state = reduce(&state, ChatAction::UpdateSessionInAllSessions(session("b")));

        assert_eq!(state.find_session("a").unwrap().messages.len(), 1);
        assert!(state.find_session("b").unwrap().messages.is_empty());
    }

    #[test]
    fn test_reset_clears_initialized_latch() {
        let mut state = reduce(&ChatState::default(), ChatAction::MarkInitialized);
        state = reduce(&state, ChatAction::SetAssistantProcessing(true));
        state = reduce(&state, ChatAction::SetLoading(true));
        assert!(state.is_initialized);

        let state = reduce(&state, ChatAction::ResetForNewContext);
        assert_eq!(state, ChatState::default());
    }

    #[test]
    fn test_flags_do_not_touch_messages() {
        let state = reduce(
            &ChatState::default(),
            ChatAction::AddMessage(Message::user_text("hi")),
        );
        let state = reduce(&state, ChatAction::SetLoading(true));
        let state = reduce(&state, ChatAction::SetAssistantProcessing(true));
        assert_eq!(state.current_messages.len(), 1);
        assert_eq!(state.current_messages[0].message_type, MessageType::Text);
    }

    #[test]
    fn test_touches_messages_classification() {
        assert!(ChatAction::AddMessage(Message::user_text("x")).touches_messages());
        assert!(!ChatAction::SetLoading(true).touches_messages());
        assert!(!ChatAction::UpdateSessionInAllSessions(session("a")).touches_messages());
    }
}
