//! Identity provider for offline use.
//!
//! Accounts exist only for the lifetime of the process.

use async_trait::async_trait;
use freya_core::error::{FreyaError, Result};
use freya_core::identity::{Credentials, Identity, IdentityProvider, SignUpOutcome};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

struct Account {
    id: String,
    password: String,
}

#[derive(Default)]
pub struct LocalIdentityProvider {
    accounts: RwLock<HashMap<String, Account>>,
    current: RwLock<Option<Identity>>,
}

impl LocalIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }
}

fn validate(credentials: &Credentials) -> Result<String> {
    let email = credentials.email.trim().to_lowercase();
    if email.is_empty() || !email.contains('@') {
        return Err(FreyaError::auth("A valid email address is required"));
    }
    if credentials.password.len() < 6 {
        return Err(FreyaError::auth("Password should be at least 6 characters"));
    }
    Ok(email)
}

#[async_trait]
impl IdentityProvider for LocalIdentityProvider {
    async fn initialize(&self) -> Result<Option<Identity>> {
        Ok(self.current.read().await.clone())
    }

    async fn sign_in(&self, credentials: &Credentials) -> Result<Identity> {
        let email = credentials.email.trim().to_lowercase();
        let accounts = self.accounts.read().await;
        let account = accounts
            .get(&email)
            .filter(|account| account.password == credentials.password)
            .ok_or_else(|| FreyaError::auth("Invalid login credentials"))?;

        let identity = Identity {
            id: account.id.clone(),
            email: Some(email),
        };
        *self.current.write().await = Some(identity.clone());
        info!(target: "freya::auth", user_id = %identity.id, "Signed in locally");
        Ok(identity)
    }

    async fn sign_up(&self, credentials: &Credentials) -> Result<SignUpOutcome> {
        let email = validate(credentials)?;
        let mut accounts = self.accounts.write().await;
        if accounts.contains_key(&email) {
            return Err(FreyaError::auth("User already registered"));
        }

        let id = Uuid::new_v4().to_string();
        accounts.insert(
            email.clone(),
            Account {
                id: id.clone(),
                password: credentials.password.clone(),
            },
        );
        let identity = Identity {
            id,
            email: Some(email),
        };
        *self.current.write().await = Some(identity.clone());
        Ok(SignUpOutcome {
            user: Some(identity),
            message: None,
        })
    }

    async fn sign_out(&self) -> Result<()> {
        *self.current.write().await = None;
        Ok(())
    }
}
