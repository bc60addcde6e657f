//! Query identity derivation
//!
//! The identity is a SHA-256 digest over the canonical JSON of the
//! filters, orders and page size, so it is stable across processes.
//! The kind is not part of it: stores are keyed by kind and
//! hold one entry per identity underneath.

use super::types::{Filter, Order, Query};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Stable identity of a query at a given page size
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QueryId(String);

#[derive(Serialize)]
struct Canonical<'a> {
    filters: &'a [Filter],
    orders: &'a [Order],
    page_size: usize,
}

impl QueryId {
    /// Derive the identity for `query` paginated by `page_size`
    pub fn derive(query: &Query, page_size: usize) -> Self {
        let canonical = Canonical {
            filters: &query.filters,
            orders: &query.orders,
            page_size,
        };
        // serde_json maps are sorted by key, so equal values serialize equally.
        // Strings, JSON values and integers only: serialization cannot fail.
        let text = serde_json::to_string(&canonical)
            .expect("query filters and orders always serialize to JSON");
        let digest = Sha256::digest(text.as_bytes());
        Self(URL_SAFE_NO_PAD.encode(digest))
    }

    /// Identity as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for QueryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Query {
    /// Identity of this query at `page_size`
    pub fn id(&self, page_size: usize) -> QueryId {
        QueryId::derive(self, page_size)
    }
}
