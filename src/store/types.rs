//! Checkpoint store trait

use crate::error::Result;
use async_trait::async_trait;

/// Shared key-value store holding serialized pagination state.
///
/// Keys are data kinds. Each call is individually atomic; nothing more is
/// promised, so a get followed by a set may race with other writers.
#[async_trait]
pub trait CheckpointStore: Send + Sync {
    /// Fetch the value stored under `key`
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous value
    async fn set(&self, key: &str, value: String) -> Result<()>;

    /// Remove `key`. Removing a missing key is not an error.
    async fn delete(&self, key: &str) -> Result<()>;
}

/// Operation counters for a store
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreStats {
    /// Calls to `get`
    pub gets: u64,
    /// `get` calls that found a value
    pub hits: u64,
    /// Calls to `set`
    pub sets: u64,
    /// Calls to `delete`
    pub deletes: u64,
}
