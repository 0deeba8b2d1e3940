//! Session store trait.
//!
//! Defines the CRUD surface of the durable backend that hosts account-backed
//! sessions and their messages.

use async_trait::async_trait;

use super::model::Session;
use crate::error::Result;

/// An abstract repository for account-backed session persistence.
///
/// Implementations own two record kinds: session rows (id, owner, name, timestamps)
/// and message rows (id, session reference, owner, payload). The store is the single
/// source of truth for authenticated identities; what it returns is canonical.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Lists every session owned by `owner_id`, newest `last_updated_at` first,
    /// each with its messages in transcript order.
    async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<Session>>;

    /// Creates an empty session named after `ordinal` and returns the stored record
    /// (server-assigned id and timestamps are authoritative).
    async fn create(&self, owner_id: &str, ordinal: usize) -> Result<Session>;

    /// Overwrites the session's metadata and replaces its message set.
    ///
    /// Messages are upserted by id and rows whose id is no longer present are
    /// removed. Returns the canonical stored session, including the refreshed
    /// `last_updated_at`.
    async fn update(&self, owner_id: &str, session: &Session) -> Result<Session>;
}
