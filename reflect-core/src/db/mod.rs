//! Database layer for reflect
//!
//! This module provides the storage layer using SQLite with:
//! - Schema migrations
//! - Repository pattern for entry queries
//! - Owner-scoped access on every operation

pub mod repo;
pub mod schema;

pub use repo::{Database, EntryFilter, EntryPage, EntrySort, SortDir};
