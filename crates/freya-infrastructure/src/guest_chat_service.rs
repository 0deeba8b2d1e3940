//! Persistence adapter for guest identities.
//!
//! Guest sessions live only in the chat state; the only thing written anywhere is
//! the active-session marker in the local key-value store.

use async_trait::async_trait;
use freya_core::error::Result;
use freya_core::identity::IdentityContext;
use freya_core::persistence::{ChatDataService, InitialData};
use freya_core::session::{Session, now_timestamp};
use freya_core::storage::{KeyValueStore, active_session_key};
use std::sync::Arc;
use tracing::debug;

pub struct GuestChatService {
    local_store: Arc<dyn KeyValueStore>,
}

impl GuestChatService {
    pub fn new(local_store: Arc<dyn KeyValueStore>) -> Self {
        Self { local_store }
    }
}

#[async_trait]
impl ChatDataService for GuestChatService {
    async fn load_initial_data(&self, _identity: &IdentityContext) -> Result<InitialData> {
        // A fresh guest context always starts from an empty roster; the lifecycle
        // controller creates the first session.
        Ok(InitialData::empty())
    }

    async fn create_session(&self, ordinal: usize, _identity: &IdentityContext) -> Result<Session> {
        Ok(Session::new_guest(ordinal))
    }

    async fn save_session(
        &self,
        session: &Session,
        _identity: &IdentityContext,
    ) -> Result<Option<Session>> {
        debug!(
            target: "freya::guest_chat_service",
            session_id = %session.id,
            "Guest session is not persisted"
        );
        let mut echoed = session.clone();
        echoed.last_updated_at = now_timestamp();
        Ok(Some(echoed))
    }

    async fn save_active_session_identifier(
        &self,
        session_id: Option<&str>,
        _identity: &IdentityContext,
    ) -> Result<()> {
        let key = active_session_key(None);
        match session_id {
            Some(id) => self.local_store.set(&key, id).await,
            None => self.local_store.remove(&key).await,
        }
    }
}
