//! The identity context chat state is scoped to.

use freya_core::identity::IdentityContext;
use tokio_util::sync::CancellationToken;

/// Identity plus a generation counter for everything issued on its behalf.
///
/// Every identity change produces a new context with a higher `epoch` and cancels
/// the previous context's token, so in-flight plugin calls and saves from the old
/// identity can tell that their results no longer apply.
#[derive(Debug, Clone)]
pub struct ChatContext {
    identity: IdentityContext,
    epoch: u64,
    cancellation: CancellationToken,
}

impl ChatContext {
    pub fn new() -> Self {
        Self {
            identity: IdentityContext::Unknown,
            epoch: 0,
            cancellation: CancellationToken::new(),
        }
    }

    /// Starts the next context, cancelling this one.
    pub fn succeed(&self, identity: IdentityContext) -> Self {
        self.cancellation.cancel();
        Self {
            identity,
            epoch: self.epoch + 1,
            cancellation: CancellationToken::new(),
        }
    }

    pub fn identity(&self) -> &IdentityContext {
        &self.identity
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }
}

impl Default for ChatContext {
    fn default() -> Self {
        Self::new()
    }
}
