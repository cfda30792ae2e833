//! Storage port for persisted auth sessions.
//!
//! This crate provides:
//! - The [`SessionStorage`] trait every backend implements
//! - [`StorageKeys`], the three slots a session occupies
//! - [`MemoryStorage`] for tests and ephemeral processes
//! - [`FileStorage`], a JSON file store used as the persistent default

mod file;
mod keys;
mod memory;
mod traits;

pub use file::FileStorage;
pub use keys::StorageKeys;
pub use memory::MemoryStorage;
pub use traits::SessionStorage;

use std::path::PathBuf;
use thiserror::Error;

/// Directory name used under the platform data dir.
pub const APP_DIR_NAME: &str = "session-auth";

/// File name of the default persistent store.
pub const STORE_FILE_NAME: &str = "session.json";

/// Error type for storage operations.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Backend-specific failure
    #[error("Storage backend error: {0}")]
    Backend(String),

    /// Encoding/decoding error
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Encoding(err.to_string())
    }
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Location of the default persistent store, if the platform has a data dir.
pub fn default_store_path() -> Option<PathBuf> {
    dirs::data_dir().map(|dir| dir.join(APP_DIR_NAME).join(STORE_FILE_NAME))
}

/// Create the default persistent storage implementation.
pub fn create_storage() -> StorageResult<FileStorage> {
    let path = default_store_path().ok_or_else(|| {
        StorageError::Backend("No data directory available on this platform".to_string())
    })?;
    FileStorage::open(path)
}
