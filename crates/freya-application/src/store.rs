//! Chat state container.
//!
//! Wraps the pure reducer with the lock, the identity context and a revision
//! counter. Every mutation of [`ChatState`] goes through a [`ChatAction`].

use freya_core::error::{FreyaError, Result};
use freya_core::identity::IdentityContext;
use freya_core::session::{Message, Session};
use freya_core::state::{ChatAction, ChatState, reduce};
use tokio::sync::RwLock;
use tracing::debug;

use crate::context::ChatContext;

/// The state after a dispatch, with the context it happened in.
#[derive(Debug, Clone)]
pub struct Dispatched {
    pub state: ChatState,
    pub context: ChatContext,
    /// Monotonic counter, bumped once per applied action.
    pub revision: u64,
    /// Whether any applied action changed the transcript or the active session.
    pub touched_messages: bool,
}

impl Dispatched {
    /// The active session with the live transcript, if the state is ready to be saved.
    pub fn saveable_session(&self) -> Option<Session> {
        if !self.touched_messages || !self.state.is_initialized {
            return None;
        }
        self.state.active_session_snapshot()
    }
}

/// Where a command was issued: which session, in which context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandTag {
    pub session_id: String,
    pub epoch: u64,
}

struct Inner {
    state: ChatState,
    context: ChatContext,
    revision: u64,
}

impl Inner {
    fn apply(&mut self, actions: Vec<ChatAction>) -> Dispatched {
        let mut touched_messages = false;
        for action in actions {
            debug!(
                target: "freya::store",
                action = action.name(),
                epoch = self.context.epoch(),
                "Dispatching"
            );
            touched_messages |= action.touches_messages();
            self.state = reduce(&self.state, action);
            self.revision += 1;
        }
        Dispatched {
            state: self.state.clone(),
            context: self.context.clone(),
            revision: self.revision,
            touched_messages,
        }
    }

    fn tag_matches(&self, tag: &CommandTag) -> bool {
        self.context.epoch() == tag.epoch
            && self.state.active_session_id.as_deref() == Some(tag.session_id.as_str())
    }
}

pub struct ChatStore {
    inner: RwLock<Inner>,
}

impl ChatStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner {
                state: ChatState::default(),
                context: ChatContext::new(),
                revision: 0,
            }),
        }
    }

    pub async fn snapshot(&self) -> ChatState {
        self.inner.read().await.state.clone()
    }

    pub async fn context(&self) -> ChatContext {
        self.inner.read().await.context.clone()
    }

    pub async fn dispatch(&self, action: ChatAction) -> Dispatched {
        self.inner.write().await.apply(vec![action])
    }

    /// Applies `action` only while `epoch` is still the current context.
    pub async fn dispatch_in_epoch(&self, epoch: u64, action: ChatAction) -> Option<Dispatched> {
        let mut inner = self.inner.write().await;
        if inner.context.epoch() != epoch {
            return None;
        }
        Some(inner.apply(vec![action]))
    }

    /// Applies `action` only while the command's session is still active in its context.
    pub async fn dispatch_for(&self, tag: &CommandTag, action: ChatAction) -> Option<Dispatched> {
        let mut inner = self.inner.write().await;
        if !inner.tag_matches(tag) {
            return None;
        }
        Some(inner.apply(vec![action]))
    }

    /// Switches to a new identity context and wipes the chat state.
    ///
    /// The previous context's cancellation token fires, so commands still running
    /// for it stop and leave the new state alone.
    pub async fn reset_context(&self, identity: IdentityContext) -> Dispatched {
        let mut inner = self.inner.write().await;
        inner.context = inner.context.succeed(identity);
        inner.apply(vec![ChatAction::ResetForNewContext])
    }

    /// Admits a user command: appends the user's message and raises the processing flag.
    ///
    /// # Errors
    ///
    /// - `FreyaError::NoActiveSession` if no session is active
    /// - `FreyaError::AssistantBusy` if another command is still processing
    pub async fn begin_command(&self, message: Message) -> Result<(CommandTag, Dispatched)> {
        let mut inner = self.inner.write().await;
        let session_id = inner
            .state
            .active_session_id
            .clone()
            .ok_or(FreyaError::NoActiveSession)?;
        if inner.state.is_assistant_processing {
            return Err(FreyaError::AssistantBusy);
        }

        let tag = CommandTag {
            session_id,
            epoch: inner.context.epoch(),
        };
        let dispatched = inner.apply(vec![
            ChatAction::AddMessage(message),
            ChatAction::SetAssistantProcessing(true),
        ]);
        Ok((tag, dispatched))
    }

    /// Raises the processing flag unless it is already set.
    ///
    /// Returns `None` when another operation holds it.
    pub async fn try_begin_processing(&self) -> Option<Dispatched> {
        let mut inner = self.inner.write().await;
        if inner.state.is_assistant_processing {
            return None;
        }
        Some(inner.apply(vec![ChatAction::SetAssistantProcessing(true)]))
    }
}

impl Default for ChatStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(id: &str) -> Session {
        let mut session = Session::new_guest(0);
        session.id = id.to_string();
        session
    }

    async fn store_with_active(id: &str) -> ChatStore {
        let store = ChatStore::new();
        store.reset_context(IdentityContext::Guest).await;
        store
            .dispatch(ChatAction::CreateNewSessionSuccess(session(id)))
            .await;
        store
    }

    #[tokio::test]
    async fn test_begin_command_requires_active_session() {
        let store = ChatStore::new();
        let err = store
            .begin_command(Message::user_text("/joke"))
            .await
            .unwrap_err();
        assert!(matches!(err, FreyaError::NoActiveSession));
    }

    #[tokio::test]
    async fn test_begin_command_is_exclusive() {
        let store = store_with_active("a").await;
        let (tag, dispatched) = store
            .begin_command(Message::user_text("/joke"))
            .await
            .unwrap();
        assert_eq!(tag.session_id, "a");
        assert!(dispatched.state.is_assistant_processing);
        assert!(dispatched.touched_messages);

        let err = store
            .begin_command(Message::user_text("/joke"))
            .await
            .unwrap_err();
        assert!(matches!(err, FreyaError::AssistantBusy));
    }

    #[tokio::test]
    async fn test_dispatch_for_rejects_stale_tags() {
        let store = store_with_active("a").await;
        let (tag, _) = store
            .begin_command(Message::user_text("hello"))
            .await
            .unwrap();

        store
            .dispatch(ChatAction::CreateNewSessionSuccess(session("b")))
            .await;
        assert!(
            store
                .dispatch_for(&tag, ChatAction::AddMessage(Message::assistant_text("late")))
                .await
                .is_none()
        );
        assert!(store.snapshot().await.current_messages.is_empty());
    }

    #[tokio::test]
    async fn test_reset_context_bumps_epoch_and_cancels() {
        let store = store_with_active("a").await;
        let before = store.context().await;

        let dispatched = store.reset_context(IdentityContext::Guest).await;
        assert_eq!(dispatched.context.epoch(), before.epoch() + 1);
        assert!(before.cancellation().is_cancelled());
        assert_eq!(dispatched.state, ChatState::default());
        assert!(
            store
                .dispatch_in_epoch(before.epoch(), ChatAction::MarkInitialized)
                .await
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_saveable_session_requires_initialization() {
        let store = store_with_active("a").await;
        let dispatched = store
            .dispatch(ChatAction::AddMessage(Message::user_text("hi")))
            .await;
        assert!(dispatched.saveable_session().is_none());

        store.dispatch(ChatAction::MarkInitialized).await;
        let dispatched = store
            .dispatch(ChatAction::AddMessage(Message::user_text("again")))
            .await;
        let session = dispatched.saveable_session().unwrap();
        assert_eq!(session.id, "a");
        assert_eq!(session.messages.len(), 2);
    }
}
