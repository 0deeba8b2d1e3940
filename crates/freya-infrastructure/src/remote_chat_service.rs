//! Persistence adapter for authenticated identities.
//!
//! Sessions and messages go to a [`SessionStore`]; the remembered active-session
//! id is kept in the local key-value store under a per-user key.

use async_trait::async_trait;
use freya_core::error::{FreyaError, Result};
use freya_core::identity::IdentityContext;
use freya_core::persistence::{ChatDataService, InitialData};
use freya_core::session::{Session, SessionStore};
use freya_core::storage::{KeyValueStore, active_session_key};
use std::sync::Arc;
use tracing::{debug, info};

pub struct RemoteChatService {
    sessions: Arc<dyn SessionStore>,
    local_store: Arc<dyn KeyValueStore>,
}

impl RemoteChatService {
    pub fn new(sessions: Arc<dyn SessionStore>, local_store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            sessions,
            local_store,
        }
    }
}

fn require_user(identity: &IdentityContext) -> Result<&str> {
    identity
        .user_id()
        .ok_or_else(|| FreyaError::auth("An authenticated identity is required"))
}

#[async_trait]
impl ChatDataService for RemoteChatService {
    async fn load_initial_data(&self, identity: &IdentityContext) -> Result<InitialData> {
        let user_id = require_user(identity)?;
        let sessions = self.sessions.list_by_owner(user_id).await?;

        let remembered = self.local_store.get(&active_session_key(Some(user_id))).await?;
        let active_session_id =
            remembered.filter(|id| sessions.iter().any(|session| &session.id == id));

        info!(
            target: "freya::remote_chat_service",
            user_id,
            count = sessions.len(),
            active = ?active_session_id,
            "Loaded sessions"
        );
        Ok(InitialData {
            sessions,
            active_session_id,
        })
    }

    async fn create_session(&self, ordinal: usize, identity: &IdentityContext) -> Result<Session> {
        let user_id = require_user(identity)?;
        self.sessions.create(user_id, ordinal).await
    }

    async fn save_session(
        &self,
        session: &Session,
        identity: &IdentityContext,
    ) -> Result<Option<Session>> {
        let user_id = require_user(identity)?;
        match session.user_id.as_deref() {
            Some(owner) if owner == user_id => {}
            Some(owner) => {
                return Err(FreyaError::auth(format!(
                    "Session {} is owned by {}, not {}",
                    session.id, owner, user_id
                )));
            }
            None => {
                return Err(FreyaError::auth(format!(
                    "Session {} has no owner and cannot be stored",
                    session.id
                )));
            }
        }

        let saved = self.sessions.update(user_id, session).await?;
        debug!(
            target: "freya::remote_chat_service",
            session_id = %saved.id,
            messages = saved.messages.len(),
            "Session saved"
        );
        Ok(Some(saved))
    }

    async fn save_active_session_identifier(
        &self,
        session_id: Option<&str>,
        identity: &IdentityContext,
    ) -> Result<()> {
        let key = active_session_key(Some(require_user(identity)?));
        match session_id {
            Some(id) => self.local_store.set(&key, id).await,
            None => self.local_store.remove(&key).await,
        }
    }
}
