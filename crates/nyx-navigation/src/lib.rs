//! Nyx Navigation
//!
//! - Address bar input resolution: explicit scheme → keep, domain-like →
//!   `https://`, anything else → search provider query url.
//! - The [`PageSurface`] contract and its typed lifecycle events.
//! - [`NavigationCoordinator`]: binds surfaces to tabs, enforces the access
//!   policy and folds surface events back into tab state.
//! - History and download logs written by event reconciliation.

mod coordinator;
mod downloads;
mod error;
mod history;
mod input;
mod surface;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use coordinator::{AddressBar, NavigationCoordinator, Reconciled};
pub use downloads::{DownloadLog, DownloadRecord, DownloadStatus};
pub use error::NavigationError;
pub use history::{HistoryEntry, HistoryManager, DEFAULT_HISTORY_LIMIT};
pub use input::{InputResolution, InputResolver, SearchProvider};
pub use surface::{
    PageSurface, SurfaceError, SurfaceEvent, SurfaceEventSink, SurfaceFactory, SurfaceMessage,
};

pub type Result<T> = std::result::Result<T, NavigationError>;
