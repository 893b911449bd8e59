//! Nyx Core
//!
//! The tab and session lifecycle manager for the Nyx shell. Embedders build
//! a [`LifecycleManager`] with a [`SurfaceFactory`] for their renderer, call
//! [`LifecycleManager::initialize`] once, then drive it with UI commands and
//! [`LifecycleManager::process_events`].

mod config;
mod error;
mod shell;
mod timer;

pub use config::Config;
pub use error::CoreError;
pub use shell::{
    LifecycleManager, Presentation, ShellNotice, ShellState, SEARCH_ENGINE_KEY, STUDY_SESSIONS_KEY,
    WHITELIST_KEY,
};
pub use timer::{StudyTimer, TimerOutcome, TimerTick, DEFAULT_STUDY_MINUTES, MAX_STUDY_MINUTES};

// Re-export core components
pub use nyx_navigation::{
    AddressBar, DownloadRecord, DownloadStatus, HistoryEntry, InputResolution, InputResolver,
    NavigationError, PageSurface, SearchProvider, SurfaceError, SurfaceEvent, SurfaceEventSink,
    SurfaceFactory,
};
pub use nyx_policy::{AccessPolicy, PolicyState};
pub use nyx_session::{SessionError, SessionSnapshot, SessionTab};
pub use nyx_storage::{Database, StorageError};
pub use nyx_tabs::{Tab, TabError, TabId, TabRegistry};

pub type Result<T> = std::result::Result<T, CoreError>;

/// Initialize logging
pub fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    fmt().with_env_filter(filter).with_target(true).init();
}
