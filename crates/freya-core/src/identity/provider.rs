//! Identity provider trait.

use async_trait::async_trait;

use super::model::{Credentials, Identity, SignUpOutcome};
use crate::error::Result;

/// The external identity provider.
///
/// Every failure is returned as `FreyaError::Auth` (or a transport error) so the
/// caller can surface it next to the attempted action.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Resolves the current identity, `None` meaning guest.
    async fn initialize(&self) -> Result<Option<Identity>>;

    async fn sign_in(&self, credentials: &Credentials) -> Result<Identity>;

    async fn sign_up(&self, credentials: &Credentials) -> Result<SignUpOutcome>;

    async fn sign_out(&self) -> Result<()>;
}
