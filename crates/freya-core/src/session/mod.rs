//! Session domain module.
//!
//! # Module Structure
//!
//! - `message`: transcript entries (`Message`, `Sender`, `MessageType`)
//! - `model`: the session container (`Session`)
//! - `store`: the remote session storage contract (`SessionStore`)

mod message;
mod model;
mod store;

pub use message::{Message, MessageType, Sender};
pub use model::{Session, latest_updated, now_timestamp};
pub use store::SessionStore;
