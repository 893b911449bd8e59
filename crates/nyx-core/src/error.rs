//! Core error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Storage error: {0}")]
    Storage(#[from] nyx_storage::StorageError),

    #[error("Tab error: {0}")]
    Tab(#[from] nyx_tabs::TabError),

    #[error("Session error: {0}")]
    Session(#[from] nyx_session::SessionError),

    #[error("Navigation error: {0}")]
    Navigation(#[from] nyx_navigation::NavigationError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Shell not initialized")]
    NotInitialized,

    #[error("No async runtime available for the study timer")]
    NoRuntime,
}
