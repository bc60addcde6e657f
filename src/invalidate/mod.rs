//! Invalidation module
//!
//! Any write to a record of a kind shifts offsets for every query over that
//! kind, so the whole stored state for the kind is dropped.
//!
//! # Overview
//!
//! The invalidate module provides:
//! - `WriteEvent` - tagged notification emitted after a record write
//! - `WriteHook` - callback registered against a storage layer's write path
//! - `WriteHooks` - ordered hook list a storage layer notifies
//! - `Invalidator` - hook deleting a kind's pagination state

mod hooks;

pub use hooks::{Invalidator, WriteEvent, WriteHook, WriteHooks};

#[cfg(test)]
mod tests;
