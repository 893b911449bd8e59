//! Nyx Storage Layer
//!
//! SQLite-backed key/value settings plus the append-only history and
//! download tables. Everything the shell persists goes through here.

mod database;
mod error;
mod migrations;

pub use database::Database;
pub use error::StorageError;

pub type Result<T> = std::result::Result<T, StorageError>;
