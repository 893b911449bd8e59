//! Nyx Session Persistence
//!
//! - A session is one snapshot of the tab set plus study-mode and timer state
//! - Snapshots are written after every state-affecting operation and once
//!   more on teardown; write failures never reach the caller
//! - Restore is opt-in and happens once at startup
//! - A copy may be mirrored to a remote endpoint, fire-and-forget

mod error;
mod mirror;
mod snapshot;
mod store;

pub use error::SessionError;
pub use mirror::SessionMirror;
pub use snapshot::{SessionSnapshot, SessionTab};
pub use store::{SessionStore, SESSION_KEY};

pub type Result<T> = std::result::Result<T, SessionError>;
