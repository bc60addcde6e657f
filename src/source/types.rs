//! Cursor source trait

use crate::error::Result;
use crate::query::Query;
use crate::types::{Batch, Cursor};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Forward-only access to the ordered results of one query
#[async_trait]
pub trait CursorSource: Send + Sync {
    /// Record type returned by the source
    type Item: Clone + Serialize + DeserializeOwned + Send + Sync;

    /// Query this source executes
    fn query(&self) -> &Query;

    /// Number of records matching the query
    async fn count(&self) -> Result<u64>;

    /// Read up to `size` records starting at `start` (or the beginning)
    async fn fetch_page(&self, size: usize, start: Option<&Cursor>)
        -> Result<Batch<Self::Item>>;
}

/// Call counters for a source
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SourceStats {
    /// Calls to `count`
    pub counts: u64,
    /// Calls to `fetch_page`
    pub fetches: u64,
    /// Records returned across all fetches
    pub records_fetched: u64,
}
