//! Identity models.

use serde::{Deserialize, Serialize};

/// An authenticated user as reported by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// Email/password pair submitted to the identity provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

/// Result of a sign-up request.
///
/// `user` is absent when the provider requires an out-of-band confirmation before
/// the account can sign in; `message` then explains what to do next.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SignUpOutcome {
    #[serde(default)]
    pub user: Option<Identity>,
    #[serde(default)]
    pub message: Option<String>,
}

/// The identity the chat state is scoped to.
///
/// `Unknown` is the state before the identity provider has answered; the session
/// lifecycle only runs for the two known variants.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum IdentityContext {
    #[default]
    Unknown,
    Guest,
    Authenticated(Identity),
}

impl IdentityContext {
    pub fn from_user(user: Option<Identity>) -> Self {
        match user {
            Some(identity) => Self::Authenticated(identity),
            None => Self::Guest,
        }
    }

    /// The owning user id, for authenticated contexts.
    pub fn user_id(&self) -> Option<&str> {
        match self {
            Self::Authenticated(identity) => Some(identity.id.as_str()),
            _ => None,
        }
    }

    pub fn email(&self) -> Option<&str> {
        match self {
            Self::Authenticated(identity) => identity.email.as_deref(),
            _ => None,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Unknown)
    }

    pub fn is_guest(&self) -> bool {
        matches!(self, Self::Guest)
    }

    /// Short label for logs.
    pub fn label(&self) -> String {
        match self {
            Self::Unknown => "unknown".to_string(),
            Self::Guest => "guest".to_string(),
            Self::Authenticated(identity) => format!("user:{}", identity.id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_user() {
        assert_eq!(IdentityContext::from_user(None), IdentityContext::Guest);
        let ctx = IdentityContext::from_user(Some(Identity {
            id: "u1".to_string(),
            email: Some("a@b.c".to_string()),
        }));
        assert_eq!(ctx.user_id(), Some("u1"));
        assert_eq!(ctx.email(), Some("a@b.c"));
        assert!(ctx.is_known());
    }

    #[test]
    fn test_unknown_is_not_known() {
        let ctx = IdentityContext::default();
        assert!(!ctx.is_known());
        assert_eq!(ctx.user_id(), None);
    }
}
