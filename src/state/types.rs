//! State types for tracking pagination checkpoints
//!
//! These types are serialized to JSON and persisted in a checkpoint store.

use crate::error::Result;
use crate::query::QueryId;
use crate::types::Cursor;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Cached position at one offset of a query's result set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckpointEntry<T> {
    /// Resumes iteration exactly at this offset. `None` means the beginning.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cursor: Option<Cursor>,

    /// Page whose first record sits at this offset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub objects: Option<Vec<T>>,

    /// Whether records follow `objects`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub more: Option<bool>,
}

impl<T> Default for CheckpointEntry<T> {
    fn default() -> Self {
        Self {
            cursor: None,
            objects: None,
            more: None,
        }
    }
}

impl<T> CheckpointEntry<T> {
    /// Entry holding only a cursor
    pub fn with_cursor(cursor: Cursor) -> Self {
        Self {
            cursor: Some(cursor),
            objects: None,
            more: None,
        }
    }

    /// Whether page contents are cached here
    pub fn has_objects(&self) -> bool {
        self.objects.is_some()
    }
}

/// Checkpoints and counts for one query identity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaginationState<T> {
    /// Record count at the last count operation
    #[serde(default)]
    pub total: Option<u64>,

    /// ceil(total / page_size)
    #[serde(default)]
    pub pages: Option<u64>,

    /// Known offsets, kept sorted for nearest-below lookups
    #[serde(default = "BTreeMap::new")]
    pub checkpoints: BTreeMap<u64, CheckpointEntry<T>>,
}

impl<T> Default for PaginationState<T> {
    fn default() -> Self {
        Self {
            total: None,
            pages: None,
            checkpoints: BTreeMap::new(),
        }
    }
}

impl<T> PaginationState<T> {
    /// Create an empty state
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts as `(total, pages)` once both are known
    pub fn counts(&self) -> Option<(u64, u64)> {
        Some((self.total?, self.pages?))
    }

    /// Record the total and derive the page count
    pub fn set_total(&mut self, total: u64, page_size: usize) -> (u64, u64) {
        let pages = total.div_ceil(page_size.max(1) as u64);
        self.total = Some(total);
        self.pages = Some(pages);
        (total, pages)
    }

    /// Checkpoint stored exactly at `offset`
    pub fn get(&self, offset: u64) -> Option<&CheckpointEntry<T>> {
        self.checkpoints.get(&offset)
    }

    /// Cached page starting at `offset`, with its `more` flag
    pub fn cached_page(&self, offset: u64) -> Option<(&[T], bool)> {
        let entry = self.checkpoints.get(&offset)?;
        let objects = entry.objects.as_deref()?;
        Some((objects, entry.more.unwrap_or(false)))
    }

    /// Cursor stored exactly at `offset`
    pub fn cursor_at(&self, offset: u64) -> Option<&Cursor> {
        self.checkpoints.get(&offset)?.cursor.as_ref()
    }

    /// Closest checkpoint strictly below `start` that carries a cursor.
    ///
    /// `None` means iteration has to begin at offset 0.
    pub fn nearest_below(&self, start: u64) -> Option<(u64, &Cursor)> {
        self.checkpoints
            .range(..start)
            .rev()
            .find_map(|(offset, entry)| entry.cursor.as_ref().map(|c| (*offset, c)))
    }

    /// Store a cursor at `offset`. Returns whether anything changed.
    pub fn record_cursor(&mut self, offset: u64, cursor: Cursor) -> bool {
        let entry = self.checkpoints.entry(offset).or_default();
        if entry.cursor.as_ref() == Some(&cursor) {
            return false;
        }
        entry.cursor = Some(cursor);
        true
    }

    /// Store page contents at `offset`, keeping any cursor already there
    pub fn record_page(&mut self, offset: u64, objects: Vec<T>, more: bool) {
        let entry = self.checkpoints.entry(offset).or_default();
        entry.objects = Some(objects);
        entry.more = Some(more);
    }

    /// Known offsets in ascending order
    pub fn offsets(&self) -> impl Iterator<Item = u64> + '_ {
        self.checkpoints.keys().copied()
    }

    /// Number of stored checkpoints
    pub fn len(&self) -> usize {
        self.checkpoints.len()
    }

    /// Whether no checkpoint is stored
    pub fn is_empty(&self) -> bool {
        self.checkpoints.is_empty()
    }
}

/// All pagination state stored under one data kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QueryMap<T> {
    queries: HashMap<QueryId, PaginationState<T>>,
}

impl<T> Default for QueryMap<T> {
    fn default() -> Self {
        Self {
            queries: HashMap::new(),
        }
    }
}

impl<T> QueryMap<T> {
    /// Create an empty map
    pub fn new() -> Self {
        Self::default()
    }

    /// State for a query identity
    pub fn get(&self, id: &QueryId) -> Option<&PaginationState<T>> {
        self.queries.get(id)
    }

    /// Mutable state for a query identity, creating it if needed
    pub fn state_mut(&mut self, id: &QueryId) -> &mut PaginationState<T> {
        self.queries.entry(id.clone()).or_default()
    }

    /// Drop the state of one query identity
    pub fn remove(&mut self, id: &QueryId) -> Option<PaginationState<T>> {
        self.queries.remove(id)
    }

    /// Number of query identities tracked
    pub fn len(&self) -> usize {
        self.queries.len()
    }

    /// Whether no query is tracked
    pub fn is_empty(&self) -> bool {
        self.queries.is_empty()
    }
}

impl<T: Serialize + DeserializeOwned> QueryMap<T> {
    /// Parse a stored map
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize for storage
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}
