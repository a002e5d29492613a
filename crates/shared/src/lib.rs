//! Shared library for the otakudesu browser.
//!
//! This crate provides the pieces every front-end needs regardless of how it
//! renders:
//! - Configuration management
//! - Data models (anime summaries, favorites, page cursors)
//! - SQLite-backed key-value persistence
//! - The favorites store
//! - File path utilities
//! - Logging infrastructure

pub mod config;
pub mod db;
pub mod favorites;
pub mod kv;
pub mod logging;
pub mod models;
pub mod paths;

// Re-export commonly used types
pub use config::Config;
pub use db::Database;
pub use favorites::{DuplicatePolicy, FavoritesStore};
pub use kv::{KeyValueStore, MemoryStore, SqliteStore, StorageError};
pub use logging::LogConfig;
pub use models::*;
pub use paths::DataPaths;

/// Common result type using anyhow::Error
pub type Result<T> = anyhow::Result<T>;
