//! Local key-value storage contract.

use async_trait::async_trait;

use crate::error::Result;

const GUEST_ACTIVE_SESSION_ID_KEY: &str = "freya-guest-activeSessionId";

/// Key under which the active session id is remembered for a user (or the guest).
pub fn active_session_key(user_id: Option<&str>) -> String {
    match user_id {
        Some(user_id) => format!("freya-activeSessionId-{user_id}"),
        None => GUEST_ACTIVE_SESSION_ID_KEY.to_string(),
    }
}

/// Simple string key-value store surviving for the lifetime of local storage.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;

    async fn set(&self, key: &str, value: &str) -> Result<()>;

    async fn remove(&self, key: &str) -> Result<()>;
}
