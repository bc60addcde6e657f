//! Common types used throughout cursor-pager
//!
//! This module contains the cursor token type and the batch/page
//! shapes passed between sources, the paginator and callers.

use crate::error::{Error, Result};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Type Aliases
// ============================================================================

/// JSON value type (re-exported from serde_json)
pub type JsonValue = serde_json::Value;

/// JSON object type
pub type JsonObject = serde_json::Map<String, JsonValue>;

// ============================================================================
// Cursor
// ============================================================================

/// Opaque, URL-safe position token in a forward-only result sequence
///
/// A cursor resumes iteration exactly at the record it was issued for.
/// Sources decide what goes inside; the paginator only stores and replays it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cursor(String);

impl Cursor {
    /// Wrap an already-encoded token
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Encode a serializable position as a URL-safe token
    pub fn encode<P: Serialize>(position: &P) -> Result<Self> {
        let json = serde_json::to_vec(position)?;
        Ok(Self(URL_SAFE_NO_PAD.encode(json)))
    }

    /// Decode the position previously stored with [`Cursor::encode`]
    pub fn decode<P: DeserializeOwned>(&self) -> Result<P> {
        let bytes = URL_SAFE_NO_PAD
            .decode(self.0.as_bytes())
            .map_err(|e| Error::invalid_cursor(format!("not base64: {e}")))?;
        serde_json::from_slice(&bytes)
            .map_err(|e| Error::invalid_cursor(format!("unexpected payload: {e}")))
    }

    /// Token as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume into the underlying token
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for Cursor {
    fn from(token: String) -> Self {
        Self(token)
    }
}

impl From<&str> for Cursor {
    fn from(token: &str) -> Self {
        Self(token.to_string())
    }
}

// ============================================================================
// Batch
// ============================================================================

/// One forward read from a cursor source
#[derive(Debug, Clone, PartialEq)]
pub struct Batch<T> {
    /// Items in source order
    pub items: Vec<T>,
    /// Position right after the last item, if the source issued one
    pub next_cursor: Option<Cursor>,
    /// Whether more items exist past this batch
    pub more: bool,
}

impl<T> Batch<T> {
    /// Create a batch
    pub fn new(items: Vec<T>, next_cursor: Option<Cursor>, more: bool) -> Self {
        Self {
            items,
            next_cursor,
            more,
        }
    }

    /// An empty, final batch
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            next_cursor: None,
            more: false,
        }
    }

    /// Number of items in this batch
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the batch holds no items
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

// ============================================================================
// Page
// ============================================================================

/// Result of a pagination request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    /// Records on the requested page
    pub objects: Vec<T>,
    /// Record count at the last count operation
    #[serde(rename = "totalrecords")]
    pub total_records: u64,
    /// ceil(total_records / page_size)
    #[serde(rename = "totalpages")]
    pub total_pages: u64,
    /// Whether records exist beyond this page
    pub more: bool,
}

impl<T> Page<T> {
    /// An empty page for a known total
    pub fn empty(total_records: u64, total_pages: u64) -> Self {
        Self {
            objects: Vec::new(),
            total_records,
            total_pages,
            more: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_cursor_encode_decode() {
        let cursor = Cursor::encode(&json!({"pos": 42})).unwrap();
        assert!(!cursor.as_str().contains('='));
        assert!(!cursor.as_str().contains('+'));

        let position: JsonValue = cursor.decode().unwrap();
        assert_eq!(position["pos"], 42);
    }

    #[test]
    fn test_cursor_decode_garbage() {
        let cursor = Cursor::new("!!not-base64!!");
        let result: Result<u64> = cursor.decode();
        assert!(matches!(result, Err(Error::InvalidCursor { .. })));
    }

    #[test]
    fn test_cursor_serializes_as_plain_string() {
        let cursor = Cursor::new("abc");
        assert_eq!(serde_json::to_string(&cursor).unwrap(), "\"abc\"");
        let restored: Cursor = serde_json::from_str("\"abc\"").unwrap();
        assert_eq!(restored, cursor);
    }

    #[test]
    fn test_page_field_names() {
        let page: Page<u32> = Page::empty(10, 5);
        let value = serde_json::to_value(&page).unwrap();
        assert_eq!(value["totalrecords"], 10);
        assert_eq!(value["totalpages"], 5);
        assert_eq!(value["more"], false);
        assert_eq!(value["objects"], json!([]));
    }

    #[test]
    fn test_batch_helpers() {
        let batch = Batch::new(vec![1, 2, 3], Some(Cursor::new("c")), true);
        assert_eq!(batch.len(), 3);
        assert!(!batch.is_empty());

        let empty: Batch<u8> = Batch::empty();
        assert!(empty.is_empty());
        assert!(!empty.more);
        assert!(empty.next_cursor.is_none());
    }
}
