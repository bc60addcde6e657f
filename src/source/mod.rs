//! Cursor source module
//!
//! A cursor source executes one query and can only move forward through
//! its results via opaque cursors.
//!
//! # Overview
//!
//! The source module provides:
//! - `CursorSource` - count + forward fetch contract
//! - `MemoryCollection` / `MemorySource` - in-memory JSON records with write hooks
//! - `DuckDbSource` - keyset pagination over a DuckDB table

mod database;
mod memory;
mod types;

pub use database::DuckDbSource;
pub use memory::{MemoryCollection, MemorySource};
pub use types::{CursorSource, SourceStats};
