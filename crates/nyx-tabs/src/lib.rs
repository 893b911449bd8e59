//! Nyx Tab Management
//!
//! Tabs are kept in display order inside a [`TabRegistry`], which also owns
//! the active-tab pointer. At most one tab is active, and exactly one is
//! whenever the registry is non-empty.

mod error;
mod id;
mod registry;
mod tab;

pub use error::TabError;
pub use id::TabId;
pub use registry::TabRegistry;
pub use tab::{Tab, BLANK_URL, DEFAULT_TITLE, UNTITLED};

pub type Result<T> = std::result::Result<T, TabError>;
