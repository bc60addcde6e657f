//! In-memory checkpoint store
//!
//! Unbounded by default. A bounded store evicts the least recently used
//! kind once `capacity` kinds are held.

use super::types::{CheckpointStore, StoreStats};
use crate::error::Result;
use async_trait::async_trait;
use lru::LruCache;
use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Debug)]
enum Entries {
    Unbounded(HashMap<String, String>),
    Bounded(LruCache<String, String>),
}

impl Entries {
    fn get(&mut self, key: &str) -> Option<String> {
        match self {
            Self::Unbounded(map) => map.get(key).cloned(),
            Self::Bounded(cache) => cache.get(key).cloned(),
        }
    }

    fn set(&mut self, key: &str, value: String) {
        match self {
            Self::Unbounded(map) => {
                map.insert(key.to_string(), value);
            }
            Self::Bounded(cache) => {
                cache.put(key.to_string(), value);
            }
        }
    }

    fn delete(&mut self, key: &str) {
        match self {
            Self::Unbounded(map) => {
                map.remove(key);
            }
            Self::Bounded(cache) => {
                cache.pop(key);
            }
        }
    }

    fn len(&self) -> usize {
        match self {
            Self::Unbounded(map) => map.len(),
            Self::Bounded(cache) => cache.len(),
        }
    }
}

#[derive(Debug, Default)]
struct Counters {
    gets: AtomicU64,
    hits: AtomicU64,
    sets: AtomicU64,
    deletes: AtomicU64,
}

/// Process-local checkpoint store
///
/// Clones share the same entries.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    entries: Arc<Mutex<Entries>>,
    counters: Arc<Counters>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Create an unbounded store
    pub fn new() -> Self {
        Self::with_entries(Entries::Unbounded(HashMap::new()))
    }

    /// Create a store holding at most `capacity` kinds
    pub fn bounded(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self::with_entries(Entries::Bounded(LruCache::new(capacity)))
    }

    fn with_entries(entries: Entries) -> Self {
        Self {
            entries: Arc::new(Mutex::new(entries)),
            counters: Arc::new(Counters::default()),
        }
    }

    /// Number of kinds currently held
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    /// Whether the store is empty
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Whether `key` is present, without touching counters or recency
    pub async fn contains(&self, key: &str) -> bool {
        match &*self.entries.lock().await {
            Entries::Unbounded(map) => map.contains_key(key),
            Entries::Bounded(cache) => cache.contains(key),
        }
    }

    /// Snapshot of the operation counters
    pub fn stats(&self) -> StoreStats {
        StoreStats {
            gets: self.counters.gets.load(Ordering::Relaxed),
            hits: self.counters.hits.load(Ordering::Relaxed),
            sets: self.counters.sets.load(Ordering::Relaxed),
            deletes: self.counters.deletes.load(Ordering::Relaxed),
        }
    }
}

#[async_trait]
impl CheckpointStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.counters.gets.fetch_add(1, Ordering::Relaxed);
        let value = self.entries.lock().await.get(key);
        if value.is_some() {
            self.counters.hits.fetch_add(1, Ordering::Relaxed);
        }
        Ok(value)
    }

    async fn set(&self, key: &str, value: String) -> Result<()> {
        self.counters.sets.fetch_add(1, Ordering::Relaxed);
        self.entries.lock().await.set(key, value);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.counters.deletes.fetch_add(1, Ordering::Relaxed);
        self.entries.lock().await.delete(key);
        Ok(())
    }
}
