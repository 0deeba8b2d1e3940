//! Session store backed by the chat REST API.

use async_trait::async_trait;
use freya_core::error::{FreyaError, Result};
use freya_core::session::{Session, SessionStore};
use serde::Serialize;
use tracing::debug;

use crate::backend::BackendClient;

const SESSIONS_PATH: &str = "/api/chat/sessions";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateSessionRequest {
    session_number: usize,
}

/// Talks to `GET/POST /api/chat/sessions` and `PUT /api/chat/sessions/{id}`.
///
/// The backend scopes every call to the user behind the session cookie, so the
/// owner id is only used to verify what comes back.
pub struct HttpSessionStore {
    backend: BackendClient,
}

impl HttpSessionStore {
    pub fn new(backend: BackendClient) -> Self {
        Self { backend }
    }
}

fn ensure_owner(owner_id: &str, session: &Session) -> Result<()> {
    match session.user_id.as_deref() {
        Some(user_id) if user_id != owner_id => Err(FreyaError::auth(format!(
            "Session {} belongs to another user",
            session.id
        ))),
        _ => Ok(()),
    }
}

#[async_trait]
impl SessionStore for HttpSessionStore {
    async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<Session>> {
        let sessions: Vec<Session> = self.backend.get_json(SESSIONS_PATH).await?;
        debug!(
            target: "freya::http_session_store",
            count = sessions.len(),
            "Loaded sessions from backend"
        );
        // Drop anything the backend returned for a different owner.
        Ok(sessions
            .into_iter()
            .filter(|session| ensure_owner(owner_id, session).is_ok())
            .collect())
    }

    async fn create(&self, owner_id: &str, ordinal: usize) -> Result<Session> {
        let session: Session = self
            .backend
            .post_json(
                SESSIONS_PATH,
                &CreateSessionRequest {
                    session_number: ordinal,
                },
            )
            .await?;
        ensure_owner(owner_id, &session)?;
        Ok(session)
    }

    async fn update(&self, owner_id: &str, session: &Session) -> Result<Session> {
        ensure_owner(owner_id, session)?;
        let path = format!("{}/{}", SESSIONS_PATH, session.id);
        let updated: Session = self.backend.put_json(&path, session).await?;
        ensure_owner(owner_id, &updated)?;
        Ok(updated)
    }
}
