//! Session error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Storage error: {0}")]
    Storage(#[from] nyx_storage::StorageError),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid mirror endpoint {url}: {reason}")]
    InvalidMirrorUrl { url: String, reason: String },

    #[error("Failed to build mirror client: {0}")]
    MirrorClient(#[from] reqwest::Error),
}
