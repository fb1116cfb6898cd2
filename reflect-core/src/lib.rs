//! # reflect-core
//!
//! Core library for reflect - a journaling backend with cognitive
//! distortion analysis.
//!
//! This library provides:
//! - Domain types for journal entries, moods, and analyses
//! - Database storage layer with SQLite
//! - Analytics over entry windows (streaks, trends, progress)
//! - An analysis provider abstraction with a Gemini implementation
//! - Configuration management
//! - Logging infrastructure
//!
//! ## Example
//!
//! ```rust,no_run
//! use reflect_core::{Config, Database};
//!
//! // Load configuration
//! let config = Config::load().expect("failed to load config");
//!
//! // Open database
//! let db = Database::open(&Config::database_path()).expect("failed to open database");
//! db.migrate().expect("failed to run migrations");
//! ```

// Re-export commonly used items at the crate root
pub use config::Config;
pub use db::{Database, EntryFilter, EntryPage};
pub use error::{Error, Result};
pub use provider::AnalysisProvider;
pub use types::*;

// Public modules
pub mod analytics;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod provider;
pub mod types;
