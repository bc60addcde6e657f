//! In-memory cursor source
//!
//! `MemoryCollection` holds the JSON records of one kind and notifies write
//! hooks after every insert, update and delete. `MemorySource` runs a query
//! over the live records and hands out opaque position cursors.

use super::types::{CursorSource, SourceStats};
use crate::error::{Error, Result};
use crate::invalidate::{WriteEvent, WriteHook, WriteHooks};
use crate::query::Query;
use crate::types::{Batch, Cursor, JsonValue};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

// ============================================================================
// Collection
// ============================================================================

/// Records of one data kind
#[derive(Debug, Clone)]
pub struct MemoryCollection {
    kind: String,
    records: Arc<RwLock<Vec<JsonValue>>>,
    hooks: WriteHooks,
}

impl MemoryCollection {
    /// Create an empty collection
    pub fn new(kind: impl Into<String>) -> Self {
        Self::with_records(kind, Vec::new())
    }

    /// Create a collection pre-filled with `records`, without firing hooks
    pub fn with_records(kind: impl Into<String>, records: Vec<JsonValue>) -> Self {
        Self {
            kind: kind.into(),
            records: Arc::new(RwLock::new(records)),
            hooks: WriteHooks::new(),
        }
    }

    /// Register a hook run after every write
    #[must_use]
    pub fn with_hook(mut self, hook: Arc<dyn WriteHook>) -> Self {
        self.hooks.register(hook);
        self
    }

    /// Data kind of this collection
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Number of stored records
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    /// Whether the collection is empty
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Record at `index` in insertion order
    pub async fn get(&self, index: usize) -> Option<JsonValue> {
        self.records.read().await.get(index).cloned()
    }

    /// Append a record. Returns its index.
    pub async fn insert(&self, record: JsonValue) -> Result<usize> {
        let index = {
            let mut records = self.records.write().await;
            records.push(record);
            records.len() - 1
        };
        self.hooks.notify(&WriteEvent::created(&self.kind)).await?;
        Ok(index)
    }

    /// Replace the record at `index`
    pub async fn update(&self, index: usize, record: JsonValue) -> Result<()> {
        {
            let mut records = self.records.write().await;
            let slot = records
                .get_mut(index)
                .ok_or_else(|| Error::Other(format!("No record at index {index}")))?;
            *slot = record;
        }
        self.hooks.notify(&WriteEvent::updated(&self.kind)).await
    }

    /// Remove and return the record at `index`
    pub async fn remove(&self, index: usize) -> Result<JsonValue> {
        let removed = {
            let mut records = self.records.write().await;
            if index >= records.len() {
                return Err(Error::Other(format!("No record at index {index}")));
            }
            records.remove(index)
        };
        self.hooks.notify(&WriteEvent::deleted(&self.kind)).await?;
        Ok(removed)
    }

    /// Cursor source running `query` over this collection
    pub fn source(&self, query: Query) -> Result<MemorySource> {
        if query.kind != self.kind {
            return Err(Error::invalid_query(format!(
                "query kind '{}' does not match collection '{}'",
                query.kind, self.kind
            )));
        }
        Ok(MemorySource {
            query,
            records: Arc::clone(&self.records),
            counters: Arc::new(Counters::default()),
        })
    }
}

// ============================================================================
// Source
// ============================================================================

#[derive(Debug, Default)]
struct Counters {
    counts: AtomicU64,
    fetches: AtomicU64,
    records_fetched: AtomicU64,
}

#[derive(Serialize, Deserialize)]
struct Position {
    #[serde(rename = "p")]
    index: usize,
}

/// Query over a `MemoryCollection`
///
/// Clones share call counters.
#[derive(Debug, Clone)]
pub struct MemorySource {
    query: Query,
    records: Arc<RwLock<Vec<JsonValue>>>,
    counters: Arc<Counters>,
}

impl MemorySource {
    /// Snapshot of the call counters
    pub fn stats(&self) -> SourceStats {
        SourceStats {
            counts: self.counters.counts.load(Ordering::Relaxed),
            fetches: self.counters.fetches.load(Ordering::Relaxed),
            records_fetched: self.counters.records_fetched.load(Ordering::Relaxed),
        }
    }

    async fn matching(&self) -> Vec<JsonValue> {
        let records = self.records.read().await;
        let mut matching: Vec<JsonValue> = records
            .iter()
            .filter(|r| self.query.matches(r))
            .cloned()
            .collect();
        // Stable, so unordered queries keep insertion order
        matching.sort_by(|a, b| self.query.compare(a, b));
        matching
    }
}

#[async_trait]
impl CursorSource for MemorySource {
    type Item = JsonValue;

    fn query(&self) -> &Query {
        &self.query
    }

    async fn count(&self) -> Result<u64> {
        self.counters.counts.fetch_add(1, Ordering::Relaxed);
        let records = self.records.read().await;
        Ok(records.iter().filter(|r| self.query.matches(r)).count() as u64)
    }

    async fn fetch_page(&self, size: usize, start: Option<&Cursor>) -> Result<Batch<JsonValue>> {
        self.counters.fetches.fetch_add(1, Ordering::Relaxed);

        let begin = match start {
            Some(cursor) => cursor.decode::<Position>()?.index,
            None => 0,
        };

        let matching = self.matching().await;
        let begin = begin.min(matching.len());
        let end = begin.saturating_add(size).min(matching.len());
        let items = matching[begin..end].to_vec();

        self.counters
            .records_fetched
            .fetch_add(items.len() as u64, Ordering::Relaxed);

        let next_cursor = Cursor::encode(&Position { index: end })?;
        Ok(Batch::new(items, Some(next_cursor), end < matching.len()))
    }
}
