//! Application layer for Freya.
//!
//! Coordinates the chat state machine, plugin execution and persistence:
//! - [`ChatStore`] owns the chat state and the identity context it is scoped to
//! - [`ExecutionPipeline`] turns one line of user input into transcript messages
//! - [`SessionSaveQueue`] serializes saves per session and reconciles results
//! - [`ChatOrchestrator`] runs the session lifecycle and the user-facing commands

pub mod context;
pub mod lifecycle;
pub mod pipeline;
pub mod save_queue;
pub mod store;

pub use context::ChatContext;
pub use lifecycle::ChatOrchestrator;
pub use pipeline::{
    CRITICAL_ERROR_CONTENT, ChatDispatcher, CommandOutcome, ExecutionPipeline, FALLBACK_REPLY,
    PLUGIN_ERROR_CONTENT,
};
pub use save_queue::SessionSaveQueue;
pub use store::{ChatStore, CommandTag, Dispatched};
