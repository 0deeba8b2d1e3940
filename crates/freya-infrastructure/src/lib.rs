//! Infrastructure layer for Freya.
//!
//! Concrete persistence adapters (guest and account-backed), session stores,
//! identity providers, local key-value stores and configuration loading.

pub mod backend;
pub mod chat_service;
pub mod config_loader;
pub mod dto;
pub mod guest_chat_service;
pub mod http_identity_provider;
pub mod http_session_store;
pub mod local_identity_provider;
pub mod memory_session_store;
pub mod paths;
pub mod remote_chat_service;
pub mod storage;

pub use crate::backend::BackendClient;
pub use crate::chat_service::IdentityRoutedChatService;
pub use crate::guest_chat_service::GuestChatService;
pub use crate::http_identity_provider::HttpIdentityProvider;
pub use crate::http_session_store::HttpSessionStore;
pub use crate::local_identity_provider::LocalIdentityProvider;
pub use crate::memory_session_store::InMemorySessionStore;
pub use crate::remote_chat_service::RemoteChatService;
pub use crate::storage::{FileKeyValueStore, MemoryKeyValueStore};
