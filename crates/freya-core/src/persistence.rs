//! Persistence adapter contract.
//!
//! The chat core never talks to a store directly; it goes through a
//! [`ChatDataService`] and always passes the identity the call is made for.

use async_trait::async_trait;

use crate::error::Result;
use crate::identity::IdentityContext;
use crate::session::Session;

/// What the lifecycle controller needs to start a context.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InitialData {
    /// Newest-updated first.
    pub sessions: Vec<Session>,
    /// The remembered active session, only if it resolves to one of `sessions`.
    pub active_session_id: Option<String>,
}

impl InitialData {
    pub fn empty() -> Self {
        Self::default()
    }
}

/// Guest and account-backed storage behind one interface.
#[async_trait]
pub trait ChatDataService: Send + Sync {
    async fn load_initial_data(&self, identity: &IdentityContext) -> Result<InitialData>;

    /// Creates the session numbered `ordinal` (zero based) for `identity`.
    async fn create_session(&self, ordinal: usize, identity: &IdentityContext) -> Result<Session>;

    /// Persists `session`, returning the canonical stored copy when there is one.
    async fn save_session(
        &self,
        session: &Session,
        identity: &IdentityContext,
    ) -> Result<Option<Session>>;

    /// Remembers (or, with `None`, forgets) the active session for `identity`.
    async fn save_active_session_identifier(
        &self,
        session_id: Option<&str>,
        identity: &IdentityContext,
    ) -> Result<()>;
}
