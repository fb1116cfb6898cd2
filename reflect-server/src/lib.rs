//! reflect-server library
//!
//! The HTTP surface lives here so integration tests can build the
//! router against an in-memory database.

pub mod api;
