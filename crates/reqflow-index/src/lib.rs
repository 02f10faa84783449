//! Reqflow Index
//!
//! In-memory inverted index answering ad-hoc filter queries without
//! re-scanning the collection.
//!
//! # Overview
//!
//! - [`MultiFieldIndex`]: Explicitly owned, explicitly rebuilt index over a
//!   collection snapshot
//! - [`intersect`], [`union`], [`difference`]: Set algebra for combining
//!   per-field predicate results
//! - [`FilterExpr`]: Composable predicate tree evaluated against an index
//! - [`SettingsStore`]: Key-value contract remembering indexed/visible fields
//!
//! # Example
//!
//! ```rust
//! use reqflow_index::{intersect, MultiFieldIndex};
//! use reqflow_model::Requirement;
//!
//! let items = vec![
//!     Requirement::new("1", "Hello World").with_planned_version("v1.0.0"),
//!     Requirement::new("2", "Hello There").with_planned_version("v2.0.0"),
//! ];
//!
//! let mut index = MultiFieldIndex::new();
//! index.build(items, &["title", "plannedVersion"]).unwrap();
//!
//! let hits = intersect(&[
//!     index.query("plannedVersion", "V1.0.0"),
//!     index.query_contains("title", "hello"),
//! ]);
//! assert_eq!(hits.len(), 1);
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod error;
mod filter;
mod index;
mod sets;
mod settings;

// Re-exports
pub use error::{IndexError, SettingsError};
pub use filter::FilterExpr;
pub use index::{IndexStats, MultiFieldIndex};
pub use sets::{difference, intersect, union, IdSet};
pub use settings::{IndexSettings, JsonFileSettingsStore, MemorySettingsStore, SettingsStore};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
