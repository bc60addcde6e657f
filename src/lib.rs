// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # cursor-pager
//!
//! Random-access pagination over data sources that can only move forward
//! with opaque cursors.
//!
//! Serving page N of a cursor-only result set normally means walking every
//! record before it. cursor-pager remembers cursors at known offsets
//! ("checkpoints") in a pluggable store, so later requests resume from the
//! closest checkpoint below the page start.
//!
//! ## Features
//!
//! - **Checkpoint cache**: cursors cached at page starts and every `fetch_limit` records
//! - **Page cache**: page contents served without touching the source on repeat reads
//! - **Coarse invalidation**: any write to a kind drops all of its cached state
//! - **Pluggable stores**: in-memory (optionally LRU-bounded) or one JSON file per kind
//! - **Bundled sources**: in-memory JSON collections and DuckDB tables
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use cursor_pager::{MemoryCollection, PagerConfig, Paginator, Query, Result};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let pager = Paginator::from_config(PagerConfig::default())?;
//!
//!     let messages = MemoryCollection::new("messages")
//!         .with_hook(Arc::new(pager.invalidator()));
//!     messages.insert(serde_json::json!({"subject": "hello"})).await?;
//!
//!     let source = messages.source(Query::new("messages"))?;
//!     let page = pager.paginate(&source, 20, 1).await?;
//!     println!("{} of {} records", page.objects.len(), page.total_records);
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                           Paginator                             │
//! │   paginate(source, page_size, page_number) → Page               │
//! └─────────────────────────────────────────────────────────────────┘
//!                                │
//! ┌──────────────┬───────────────┴───────────────┬──────────────────┐
//! │    Source    │        CheckpointStore        │    Invalidate    │
//! ├──────────────┼───────────────────────────────┼──────────────────┤
//! │ Memory       │ Memory (HashMap / LRU)        │ WriteEvent       │
//! │ DuckDB       │ File (JSON per kind)          │ WriteHook        │
//! │              │                               │ Invalidator      │
//! └──────────────┴───────────────────────────────┴──────────────────┘
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Cursors, batches and pages
pub mod types;

/// Paginator and store configuration
pub mod config;

/// Query description and identity
pub mod query;

/// Cursor-only data sources
pub mod source;

/// Checkpoint store backends
pub mod store;

/// Per-query checkpoint state
pub mod state;

/// Random-access pagination
pub mod paginator;

/// Write hooks and cache invalidation
pub mod invalidate;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

// Re-export commonly used types
pub use config::{PagerConfig, StoreConfig};
pub use invalidate::{Invalidator, WriteEvent, WriteHook, WriteHooks};
pub use paginator::Paginator;
pub use query::{Direction, FilterOp, Query, QueryId};
pub use source::{CursorSource, DuckDbSource, MemoryCollection, MemorySource};
pub use state::{CheckpointEntry, PaginationState};
pub use store::{CheckpointStore, FileStore, MemoryStore};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
