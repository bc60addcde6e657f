//! Paginator module
//!
//! Serves page N of a cursor-only result set by replaying from the closest
//! cached checkpoint instead of from the beginning.
//!
//! # Overview
//!
//! For each request the paginator:
//! 1. Loads the query map stored under the source's data kind
//! 2. Counts the result set once per query identity
//! 3. Returns a cached page directly when one exists at the page start
//! 4. Otherwise walks forward from the nearest checkpoint below the start,
//!    caching a cursor every `fetch_limit` records and at the page start
//! 5. Fetches the page, caches the cursor after it and its contents
//! 6. Writes the query map back when anything changed

use crate::config::PagerConfig;
use crate::error::{Error, Result};
use crate::invalidate::Invalidator;
use crate::query::Query;
use crate::source::CursorSource;
use crate::state::{PaginationState, QueryMap};
use crate::store::{self, CheckpointStore};
use crate::types::{Cursor, Page};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, warn};

/// Random-access pagination over cursor sources
///
/// Clones share the same checkpoint store.
#[derive(Clone)]
pub struct Paginator {
    store: Arc<dyn CheckpointStore>,
    config: PagerConfig,
}

impl Paginator {
    /// Create a paginator over an injected store
    pub fn new(store: Arc<dyn CheckpointStore>, config: PagerConfig) -> Self {
        Self { store, config }
    }

    /// Create a paginator with the store described by `config`
    pub fn from_config(config: PagerConfig) -> Result<Self> {
        config.validate()?;
        let store = store::from_config(&config.store);
        Ok(Self::new(store, config))
    }

    /// Get the checkpoint store
    pub fn store(&self) -> &Arc<dyn CheckpointStore> {
        &self.store
    }

    /// Get the configuration
    pub fn config(&self) -> &PagerConfig {
        &self.config
    }

    /// Invalidator sharing this paginator's store
    pub fn invalidator(&self) -> Invalidator {
        Invalidator::new(Arc::clone(&self.store))
    }

    /// Fetch page `page_number` (1-based) of `page_size` records from `source`
    pub async fn paginate<S>(
        &self,
        source: &S,
        page_size: usize,
        page_number: u64,
    ) -> Result<Page<S::Item>>
    where
        S: CursorSource + ?Sized,
    {
        if page_size == 0 {
            return Err(Error::invalid_page("page size must be at least 1"));
        }
        if page_number == 0 {
            return Err(Error::invalid_page("page number must be at least 1"));
        }
        let start = (page_number - 1)
            .checked_mul(page_size as u64)
            .ok_or_else(|| {
                Error::invalid_page(format!(
                    "page {page_number} of size {page_size} is out of range"
                ))
            })?;

        let query = source.query();
        let id = query.id(page_size);
        let mut map: QueryMap<S::Item> = self.load(&query.kind).await?;
        let mut changed = false;

        let page = {
            let state = map.state_mut(&id);
            let (total, pages) = match state.counts() {
                Some(counts) => counts,
                None => {
                    let total = source.count().await?;
                    changed = true;
                    state.set_total(total, page_size)
                }
            };
            self.read_page(source, state, page_size, start, total, pages, &mut changed)
                .await?
        };

        if changed {
            self.save(&query.kind, &map).await?;
        }
        Ok(page)
    }

    /// Stored state of `query` at `page_size`, if any
    pub async fn state<T>(
        &self,
        query: &Query,
        page_size: usize,
    ) -> Result<Option<PaginationState<T>>>
    where
        T: Serialize + DeserializeOwned,
    {
        let mut map: QueryMap<T> = self.load(&query.kind).await?;
        Ok(map.remove(&query.id(page_size)))
    }

    #[allow(clippy::too_many_arguments)]
    async fn read_page<S>(
        &self,
        source: &S,
        state: &mut PaginationState<S::Item>,
        page_size: usize,
        start: u64,
        total: u64,
        pages: u64,
        changed: &mut bool,
    ) -> Result<Page<S::Item>>
    where
        S: CursorSource + ?Sized,
    {
        let kind = source.query().kind.as_str();

        if start >= total {
            debug!(kind, start, total, "Page starts past the last record");
            return Ok(Page::empty(total, pages));
        }

        if let Some((objects, more)) = state.cached_page(start) {
            debug!(kind, start, "Serving page from cached checkpoint");
            return Ok(Page {
                objects: objects.to_vec(),
                total_records: total,
                total_pages: pages,
                more,
            });
        }

        let (mut offset, mut cursor) = match state.cursor_at(start) {
            Some(cursor) => (start, Some(cursor.clone())),
            None => match state.nearest_below(start) {
                Some((offset, cursor)) => (offset, Some(cursor.clone())),
                None => (0, None),
            },
        };
        debug!(kind, start, checkpoint = offset, "Closest checkpoint found");

        let step = self.config.fetch_limit.max(1);
        let limit = step as u64;
        while start - offset > limit {
            debug!(kind, from = offset, step, "Advancing cursor");
            let batch = source.fetch_page(step, cursor.as_ref()).await?;
            match exhausted_or_next(batch.len() as u64, limit, batch.more, batch.next_cursor) {
                Some(next) => {
                    offset += limit;
                    *changed |= state.record_cursor(offset, next.clone());
                    cursor = Some(next);
                }
                None => {
                    debug!(kind, offset, "Source ended before the page start");
                    return Ok(Page::empty(total, pages));
                }
            }
        }

        let diff = start - offset;
        if diff > 0 {
            let batch = source.fetch_page(diff as usize, cursor.as_ref()).await?;
            match exhausted_or_next(batch.len() as u64, diff, batch.more, batch.next_cursor) {
                Some(next) => {
                    *changed |= state.record_cursor(start, next.clone());
                    cursor = Some(next);
                }
                None => {
                    debug!(kind, offset, "Source ended before the page start");
                    return Ok(Page::empty(total, pages));
                }
            }
        }

        let batch = source.fetch_page(page_size, cursor.as_ref()).await?;
        if !batch.items.is_empty() {
            if let Some(next) = batch.next_cursor {
                let after = start + batch.items.len() as u64;
                *changed |= state.record_cursor(after, next);
            }
            if self.config.cache_objects {
                state.record_page(start, batch.items.clone(), batch.more);
                *changed = true;
            }
        }

        Ok(Page {
            objects: batch.items,
            total_records: total,
            total_pages: pages,
            more: batch.more,
        })
    }

    async fn load<T>(&self, kind: &str) -> Result<QueryMap<T>>
    where
        T: Serialize + DeserializeOwned,
    {
        let Some(raw) = self.store.get(kind).await? else {
            return Ok(QueryMap::new());
        };
        match QueryMap::from_json(&raw) {
            Ok(map) => Ok(map),
            Err(e) => {
                warn!(kind, error = %e, "Discarding malformed pagination state");
                Ok(QueryMap::new())
            }
        }
    }

    async fn save<T>(&self, kind: &str, map: &QueryMap<T>) -> Result<()>
    where
        T: Serialize + DeserializeOwned,
    {
        self.store.set(kind, map.to_json()?).await
    }
}

impl std::fmt::Debug for Paginator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Paginator")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Cursor to resume from after skipping `wanted` records, or `None` when the
/// source ran out first
fn exhausted_or_next(
    got: u64,
    wanted: u64,
    more: bool,
    next_cursor: Option<Cursor>,
) -> Option<Cursor> {
    if got < wanted || !more {
        return None;
    }
    next_cursor
}
