//! Plugin contract and dispatch.
//!
//! A plugin is a command handler matched by a regular expression against the whole
//! user input. The registry tests plugins in registration order and the first match
//! wins.

mod contract;
mod matcher;
mod model;

pub use contract::{DEFAULT_LOADING_MESSAGE, Plugin, ResultRenderer};
pub use matcher::{PluginRegistry, TriggerMatch};
pub use model::{PluginResult, RenderedCard};
