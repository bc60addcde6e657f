//! Query module
//!
//! A query is a data kind plus a filter set and a sort order. It is the
//! unit the checkpoint cache is keyed on.
//!
//! # Overview
//!
//! The query module provides:
//! - `Query` - kind, filters and ordering of a result set
//! - `QueryId` - stable identity of a query at a given page size
//! - `compare_values` - total ordering over JSON values used by filters and sorts

mod identity;
mod types;

pub use identity::QueryId;
pub use types::{compare_values, Direction, Filter, FilterOp, Order, Query};
