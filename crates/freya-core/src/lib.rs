//! Domain layer for Freya.
//!
//! Holds the chat domain models (messages, sessions, identities), the plugin
//! contract with its trigger matcher, the chat state reducer, and the traits the
//! infrastructure layer implements for persistence and identity.

pub mod config;
pub mod error;
pub mod identity;
pub mod persistence;
pub mod plugin;
pub mod session;
pub mod state;
pub mod storage;

pub use error::FreyaError;
