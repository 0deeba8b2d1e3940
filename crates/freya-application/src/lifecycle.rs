//! Session lifecycle controller.
//!
//! `ChatOrchestrator` is the single entry point the front end talks to. It runs
//! the startup sequence whenever the identity changes, exposes the chat commands
//! and schedules a save after every transcript change.

use async_trait::async_trait;
use freya_core::error::{FreyaError, Result};
use freya_core::identity::{Credentials, Identity, IdentityContext, IdentityProvider, SignUpOutcome};
use freya_core::persistence::{ChatDataService, InitialData};
use freya_core::plugin::PluginRegistry;
use freya_core::session::{Session, latest_updated};
use freya_core::state::{ChatAction, ChatState};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::pipeline::{ChatDispatcher, CommandOutcome, ExecutionPipeline};
use crate::save_queue::SessionSaveQueue;
use crate::store::{ChatStore, Dispatched};

/// Coordinates identity, persistence and command execution for one chat window.
pub struct ChatOrchestrator {
    store: Arc<ChatStore>,
    saves: SessionSaveQueue,
    pipeline: ExecutionPipeline,
    service: Arc<dyn ChatDataService>,
    identity_provider: Arc<dyn IdentityProvider>,
}

#[async_trait]
impl ChatDispatcher for ChatOrchestrator {
    fn store(&self) -> &ChatStore {
        &self.store
    }

    async fn dispatched(&self, outcome: &Dispatched) {
        self.saves.schedule(outcome).await;
    }
}

impl ChatOrchestrator {
    pub fn new(
        service: Arc<dyn ChatDataService>,
        identity_provider: Arc<dyn IdentityProvider>,
        pipeline: ExecutionPipeline,
    ) -> Self {
        let store = Arc::new(ChatStore::new());
        Self {
            saves: SessionSaveQueue::new(Arc::clone(&store), Arc::clone(&service)),
            store,
            pipeline,
            service,
            identity_provider,
        }
    }

    pub async fn state(&self) -> ChatState {
        self.store.snapshot().await
    }

    pub async fn identity(&self) -> IdentityContext {
        self.store.context().await.identity().clone()
    }

    pub fn registry(&self) -> &PluginRegistry {
        self.pipeline.registry()
    }

    /// Waits for every scheduled save to settle.
    pub async fn flush_saves(&self) {
        self.saves.wait_idle().await;
    }

    async fn dispatch_in(&self, epoch: u64, action: ChatAction) -> Option<Dispatched> {
        let dispatched = self.store.dispatch_in_epoch(epoch, action).await?;
        self.saves.schedule(&dispatched).await;
        Some(dispatched)
    }

    async fn remember_active(&self, session_id: Option<&str>, identity: &IdentityContext) {
        if let Err(e) = self
            .service
            .save_active_session_identifier(session_id, identity)
            .await
        {
            warn!(
                target: "freya::lifecycle",
                error = %e,
                "Failed to persist the active session id"
            );
        }
    }

    // ------------------------------------------------------------------
    // Identity
    // ------------------------------------------------------------------

    /// Resolves the current identity with the provider and initializes the chat for it.
    ///
    /// A provider that cannot be reached leaves the user a guest.
    pub async fn bootstrap(&self) -> Result<IdentityContext> {
        let user = match self.identity_provider.initialize().await {
            Ok(user) => user,
            Err(e) => {
                warn!(target: "freya::lifecycle", error = %e, "Identity provider unavailable; continuing as guest");
                None
            }
        };
        let identity = IdentityContext::from_user(user);
        self.initialize(identity.clone()).await?;
        Ok(identity)
    }

    /// Signs in and, on success, reloads the chat for the new identity.
    ///
    /// # Errors
    ///
    /// Returns the provider's error (normally `FreyaError::Auth`); chat state is
    /// left untouched.
    pub async fn sign_in(&self, credentials: &Credentials) -> Result<Identity> {
        let user = self.identity_provider.sign_in(credentials).await?;
        self.adopt_identity(IdentityContext::Authenticated(user.clone()))
            .await?;
        Ok(user)
    }

    /// Registers an account. When the provider signs the new user in right away the
    /// chat is reloaded for them; otherwise the outcome's message says what to do next.
    pub async fn sign_up(&self, credentials: &Credentials) -> Result<SignUpOutcome> {
        let outcome = self.identity_provider.sign_up(credentials).await?;
        if let Some(user) = &outcome.user {
            self.adopt_identity(IdentityContext::Authenticated(user.clone()))
                .await?;
        }
        Ok(outcome)
    }

    /// Signs out and starts a fresh guest context.
    pub async fn sign_out(&self) -> Result<()> {
        let state = self.store.snapshot().await;
        if state.active_session().is_some_and(Session::is_guest) {
            self.remember_active(None, &IdentityContext::Guest).await;
        }
        self.identity_provider.sign_out().await?;
        self.initialize(IdentityContext::Guest).await
    }

    async fn adopt_identity(&self, identity: IdentityContext) -> Result<()> {
        let context = self.store.context().await;
        if context.identity() == &identity && self.store.snapshot().await.is_initialized {
            debug!(target: "freya::lifecycle", "Identity unchanged; keeping chat state");
            return Ok(());
        }
        self.initialize(identity).await
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Loads the chat for `identity` and picks the active session.
    ///
    /// The session that becomes active is, in order: the remembered active session
    /// if it was loaded, else the most recently updated loaded session, else a newly
    /// created one. A failed load is treated as an empty roster.
    ///
    /// # Errors
    ///
    /// `FreyaError::Internal` if `identity` is `Unknown`. Persistence failures are
    /// logged, not returned.
    pub async fn initialize(&self, identity: IdentityContext) -> Result<()> {
        if !identity.is_known() {
            return Err(FreyaError::internal(
                "Chat cannot be initialized before the identity is known",
            ));
        }
        info!(target: "freya::lifecycle", identity = %identity.label(), "Initializing chat");

        let reset = self.store.reset_context(identity.clone()).await;
        let epoch = reset.context.epoch();
        if self.dispatch_in(epoch, ChatAction::SetLoading(true)).await.is_none() {
            return self.superseded();
        }

        let data = match self.service.load_initial_data(&identity).await {
            Ok(data) => data,
            Err(e) => {
                error!(target: "freya::lifecycle", error = %e, "Failed to load sessions; starting empty");
                InitialData::empty()
            }
        };

        let InitialData {
            sessions,
            active_session_id,
        } = data;
        let remembered = active_session_id
            .as_deref()
            .and_then(|id| sessions.iter().find(|session| session.id == id))
            .cloned();
        let chosen = remembered.or_else(|| latest_updated(&sessions).cloned());

        if self
            .dispatch_in(
                epoch,
                ChatAction::InitializationLoaded {
                    sessions,
                    active_session_id,
                },
            )
            .await
            .is_none()
        {
            return self.superseded();
        }

        match chosen {
            Some(session) => {
                debug!(target: "freya::lifecycle", session_id = %session.id, "Activating loaded session");
                let activated = self
                    .dispatch_in(
                        epoch,
                        ChatAction::SetActiveSessionAndMessages {
                            session_id: session.id.clone(),
                            messages: session.messages,
                        },
                    )
                    .await;
                if activated.is_none() {
                    return self.superseded();
                }
                self.remember_active(Some(&session.id), &identity).await;
            }
            None => {
                if let Err(e) = self.create_session_in(epoch, &identity, 0).await {
                    error!(target: "freya::lifecycle", error = %e, "Failed to create the first session");
                }
            }
        }

        if self.dispatch_in(epoch, ChatAction::MarkInitialized).await.is_none()
            || self.dispatch_in(epoch, ChatAction::SetLoading(false)).await.is_none()
        {
            return self.superseded();
        }
        info!(target: "freya::lifecycle", identity = %identity.label(), "Chat initialized");
        Ok(())
    }

    fn superseded(&self) -> Result<()> {
        debug!(target: "freya::lifecycle", "Initialization superseded by a newer identity context");
        Ok(())
    }

    async fn create_session_in(
        &self,
        epoch: u64,
        identity: &IdentityContext,
        ordinal: usize,
    ) -> Result<Option<Session>> {
        let session = self.service.create_session(ordinal, identity).await?;
        if self
            .dispatch_in(epoch, ChatAction::CreateNewSessionSuccess(session.clone()))
            .await
            .is_none()
        {
            return Ok(None);
        }
        self.remember_active(Some(&session.id), identity).await;
        info!(target: "freya::lifecycle", session_id = %session.id, name = %session.name, "Created session");
        Ok(Some(session))
    }

    // ------------------------------------------------------------------
    // Commands
    // ------------------------------------------------------------------

    /// Submits one line of user input.
    pub async fn send_message(&self, text: &str) -> Result<CommandOutcome> {
        self.pipeline.submit(self, text).await
    }

    /// Starts a new session and makes it active.
    ///
    /// Returns `Ok(None)` without doing anything while the assistant is processing.
    ///
    /// # Errors
    ///
    /// Propagates the persistence adapter's error if the session cannot be created.
    pub async fn new_chat(&self) -> Result<Option<Session>> {
        let Some(begun) = self.store.try_begin_processing().await else {
            debug!(target: "freya::lifecycle", "New chat ignored while processing");
            return Ok(None);
        };
        let epoch = begun.context.epoch();
        let identity = begun.context.identity().clone();

        // Keep the outgoing transcript in the roster so switching back shows it.
        if let Some(current) = begun.state.active_session_snapshot() {
            self.dispatch_in(epoch, ChatAction::UpdateSessionInAllSessions(current))
                .await;
        }

        let created = self
            .create_session_in(epoch, &identity, begun.state.all_sessions.len())
            .await;
        self.dispatch_in(epoch, ChatAction::SetAssistantProcessing(false))
            .await;
        created
    }

    /// Makes an existing session active.
    ///
    /// # Errors
    ///
    /// - `FreyaError::AssistantBusy` while a command is processing
    /// - `FreyaError::NotFound` if the roster has no such session
    pub async fn switch_session(&self, session_id: &str) -> Result<()> {
        let begun = self
            .store
            .try_begin_processing()
            .await
            .ok_or(FreyaError::AssistantBusy)?;
        let epoch = begun.context.epoch();
        let result = self.switch_within(epoch, &begun, session_id).await;
        self.dispatch_in(epoch, ChatAction::SetAssistantProcessing(false))
            .await;
        result
    }

    async fn switch_within(&self, epoch: u64, begun: &Dispatched, session_id: &str) -> Result<()> {
        let state = &begun.state;
        let target = state
            .find_session(session_id)
            .cloned()
            .ok_or_else(|| FreyaError::not_found("session", session_id))?;
        if state.active_session_id.as_deref() == Some(session_id) {
            return Ok(());
        }

        if let Some(current) = state.active_session_snapshot() {
            self.dispatch_in(epoch, ChatAction::UpdateSessionInAllSessions(current))
                .await;
        }
        self.dispatch_in(
            epoch,
            ChatAction::SetActiveSessionAndMessages {
                session_id: target.id.clone(),
                messages: target.messages,
            },
        )
        .await
        .ok_or_else(|| FreyaError::internal("Identity changed while switching sessions"))?;

        self.remember_active(Some(&target.id), begun.context.identity())
            .await;
        info!(target: "freya::lifecycle", session_id = %target.id, "Switched session");
        Ok(())
    }
}
