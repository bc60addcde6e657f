//! State management module
//!
//! Handles checkpoint tracking for paginated queries.
//! State is persisted in a checkpoint store between requests so later
//! requests can resume near the offset they need.
//!
//! # Overview
//!
//! The state module provides:
//! - `CheckpointEntry` - cursor (and optionally page contents) at one offset
//! - `PaginationState` - counts plus the sparse offset → checkpoint map of one query
//! - `QueryMap` - every query's state under one data kind, the unit stored

mod types;

pub use types::{CheckpointEntry, PaginationState, QueryMap};
