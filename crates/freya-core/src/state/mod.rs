//! Chat window state machine.
//!
//! The message list and the session roster are only ever changed by feeding a
//! [`ChatAction`] through [`reduce`].

mod action;
mod model;
mod reducer;

pub use action::ChatAction;
pub use model::ChatState;
pub use reducer::reduce;
