//! Navigation error types

use nyx_tabs::TabId;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum NavigationError {
    #[error("Navigation to {url} is blocked in study mode")]
    BlockedByPolicy { url: String },

    #[error("Could not create a page surface for {tab_id}: {reason}")]
    SurfaceCreationFailed { tab_id: TabId, reason: String },

    #[error("Tab not found: {0}")]
    TabNotFound(TabId),

    #[error("Navigation input is empty")]
    EmptyInput,

    #[error("Unknown search engine: {0}")]
    UnknownSearchEngine(String),

    #[error("Storage error: {0}")]
    Storage(#[from] nyx_storage::StorageError),
}
