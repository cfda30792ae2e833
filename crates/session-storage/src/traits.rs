//! Storage trait definitions.

use crate::StorageResult;

/// Trait for session storage backends.
///
/// Backends are plain last-write-wins key-value stores. No transactional
/// guarantee is expected across keys.
pub trait SessionStorage: Send + Sync {
    /// Retrieve a value
    fn get(&self, key: &str) -> StorageResult<Option<String>>;

    /// Store a value, overwriting any previous one
    fn set(&self, key: &str, value: &str) -> StorageResult<()>;

    /// Remove a value. Returns true if the key existed.
    fn remove(&self, key: &str) -> StorageResult<bool>;

    /// Check if a key exists
    fn has(&self, key: &str) -> StorageResult<bool> {
        Ok(self.get(key)?.is_some())
    }
}
