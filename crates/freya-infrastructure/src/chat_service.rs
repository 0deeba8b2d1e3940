//! Selects the persistence adapter by identity.

use async_trait::async_trait;
use freya_core::error::{FreyaError, Result};
use freya_core::identity::IdentityContext;
use freya_core::persistence::{ChatDataService, InitialData};
use freya_core::session::Session;
use std::sync::Arc;

/// Routes each call to the guest or the authenticated adapter depending on the
/// identity passed with it.
pub struct IdentityRoutedChatService {
    guest: Arc<dyn ChatDataService>,
    authenticated: Arc<dyn ChatDataService>,
}

impl IdentityRoutedChatService {
    pub fn new(guest: Arc<dyn ChatDataService>, authenticated: Arc<dyn ChatDataService>) -> Self {
        Self {
            guest,
            authenticated,
        }
    }

    fn route(&self, identity: &IdentityContext) -> Result<&Arc<dyn ChatDataService>> {
        match identity {
            IdentityContext::Guest => Ok(&self.guest),
            IdentityContext::Authenticated(_) => Ok(&self.authenticated),
            IdentityContext::Unknown => Err(FreyaError::internal(
                "Persistence was called before the identity was resolved",
            )),
        }
    }
}

#[async_trait]
impl ChatDataService for IdentityRoutedChatService {
    async fn load_initial_data(&self, identity: &IdentityContext) -> Result<InitialData> {
        self.route(identity)?.load_initial_data(identity).await
    }

    async fn create_session(&self, ordinal: usize, identity: &IdentityContext) -> Result<Session> {
        self.route(identity)?.create_session(ordinal, identity).await
    }

    async fn save_session(
        &self,
        session: &Session,
        identity: &IdentityContext,
    ) -> Result<Option<Session>> {
        self.route(identity)?.save_session(session, identity).await
    }

    async fn save_active_session_identifier(
        &self,
        session_id: Option<&str>,
        identity: &IdentityContext,
    ) -> Result<()> {
        self.route(identity)?
            .save_active_session_identifier(session_id, identity)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::guest_chat_service::GuestChatService;
    use crate::memory_session_store::InMemorySessionStore;
    use crate::remote_chat_service::RemoteChatService;
    use crate::storage::MemoryKeyValueStore;
    use freya_core::identity::Identity;

    fn routed() -> IdentityRoutedChatService {
        let local = Arc::new(MemoryKeyValueStore::new());
        IdentityRoutedChatService::new(
            Arc::new(GuestChatService::new(local.clone())),
            Arc::new(RemoteChatService::new(
                Arc::new(InMemorySessionStore::new()),
                local,
            )),
        )
    }

    #[tokio::test]
    async fn test_routes_by_identity() {
        let service = routed();

        let guest = service
            .create_session(0, &IdentityContext::Guest)
            .await
            .unwrap();
        assert!(guest.is_guest());
        assert_eq!(guest.name, "Guest Chat 1");

        let alice = IdentityContext::Authenticated(Identity {
            id: "alice".to_string(),
            email: Some("alice@example.com".to_string()),
        });
        let owned = service.create_session(1, &alice).await.unwrap();
        assert_eq!(owned.user_id.as_deref(), Some("alice"));
        assert_eq!(owned.name, "Chat 2");
    }

    #[tokio::test]
    async fn test_unknown_identity_is_an_error() {
        let service = routed();
        assert!(
            service
                .load_initial_data(&IdentityContext::Unknown)
                .await
                .is_err()
        );
    }
}
