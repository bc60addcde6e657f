//! Checkpoint store module
//!
//! Key-value persistence for pagination state, keyed by data kind.
//! A store is a cache: anything it drops only costs recomputation.
//!
//! # Overview
//!
//! The store module provides:
//! - `CheckpointStore` - async get/set/delete contract
//! - `MemoryStore` - process-local store, optionally LRU-bounded
//! - `FileStore` - one JSON file per kind with atomic writes
//! - `from_config` - build a store from `StoreConfig`

mod file;
mod memory;
mod types;

pub use file::FileStore;
pub use memory::MemoryStore;
pub use types::{CheckpointStore, StoreStats};

use crate::config::StoreConfig;
use std::sync::Arc;

/// Build the store described by `config`
pub fn from_config(config: &StoreConfig) -> Arc<dyn CheckpointStore> {
    match config {
        StoreConfig::Memory { capacity: None } => Arc::new(MemoryStore::new()),
        StoreConfig::Memory {
            capacity: Some(capacity),
        } => Arc::new(MemoryStore::bounded(*capacity)),
        StoreConfig::File { dir } => Arc::new(FileStore::new(dir)),
    }
}

#[cfg(test)]
mod tests;
