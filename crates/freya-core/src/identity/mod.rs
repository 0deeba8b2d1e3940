//! Identity domain module.
//!
//! The identity provider is an external collaborator; this module only describes
//! what the chat core consumes from it.

mod model;
mod provider;

pub use model::{Credentials, Identity, IdentityContext, SignUpOutcome};
pub use provider::IdentityProvider;
