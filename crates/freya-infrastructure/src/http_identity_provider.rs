//! Identity provider backed by the cookie-based auth endpoints.

use async_trait::async_trait;
use freya_core::error::{FreyaError, Result};
use freya_core::identity::{Credentials, Identity, IdentityProvider, SignUpOutcome};
use serde::Deserialize;
use tracing::{info, warn};

use crate::backend::BackendClient;

#[derive(Debug, Deserialize)]
struct UserEnvelope {
    #[serde(default)]
    user: Option<Identity>,
}

pub struct HttpIdentityProvider {
    backend: BackendClient,
}

impl HttpIdentityProvider {
    pub fn new(backend: BackendClient) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl IdentityProvider for HttpIdentityProvider {
    async fn initialize(&self) -> Result<Option<Identity>> {
        match self.backend.get_json::<UserEnvelope>("/api/auth/user").await {
            Ok(envelope) => Ok(envelope.user),
            // No session cookie, or an expired one, means guest.
            Err(e) if e.is_auth() => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn sign_in(&self, credentials: &Credentials) -> Result<Identity> {
        let envelope: UserEnvelope = self
            .backend
            .post_json("/api/auth/login", credentials)
            .await
            .map_err(into_auth)?;
        let user = envelope
            .user
            .ok_or_else(|| FreyaError::auth("Sign-in returned no user"))?;
        info!(target: "freya::auth", user_id = %user.id, "Signed in");
        Ok(user)
    }

    async fn sign_up(&self, credentials: &Credentials) -> Result<SignUpOutcome> {
        self.backend
            .post_json("/api/auth/signup", credentials)
            .await
            .map_err(into_auth)
    }

    async fn sign_out(&self) -> Result<()> {
        // The server clears the cookies either way; a failed call still ends the
        // local session.
        if let Err(e) = self.backend.post_empty("/api/auth/logout").await {
            warn!(target: "freya::auth", error = %e, "Sign-out request failed");
        }
        Ok(())
    }
}

/// Rejected credentials come back as 400; surface them as auth failures.
fn into_auth(error: FreyaError) -> FreyaError {
    match error {
        FreyaError::Remote { status, message } if (400..500).contains(&status) => {
            FreyaError::auth(message)
        }
        other => other,
    }
}
