//! Reqflow Model
//!
//! Shared types for the batch review & mutation engine.
//!
//! # Core Concepts
//!
//! - [`ItemId`]: Stable unique identifier of a managed item
//! - [`Patchable`]: Items that accept a closed set of typed patches
//! - [`Indexable`]: Items that expose named field values for indexing
//! - [`Requirement`]: The product-requirement record managed by the application
//! - [`ScheduledReview`]: Two-level approval data attached to an item
//!
//! # Example
//!
//! ```rust
//! use reqflow_model::{Patchable, Requirement, RequirementPatch};
//!
//! let mut req = Requirement::new("REQ-1", "Login page");
//! let patch = RequirementPatch::PlannedVersion(Some("v1.0.0".to_string()));
//!
//! let undo = req.inverse(&patch);
//! req.apply(&patch);
//! assert_eq!(req.planned_version.as_deref(), Some("v1.0.0"));
//!
//! req.apply(&undo);
//! assert_eq!(req.planned_version, None);
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod error;
mod id;
mod item;
mod requirement;
mod review;

// Re-exports
pub use error::ModelError;
pub use id::ItemId;
pub use item::{Identified, Indexable, Patchable};
pub use requirement::{Priority, Requirement, RequirementPatch, RequirementStatus};
pub use review::{
    validate_opinion, LevelNumber, OverallReviewStatus, ReviewLevel, ReviewStatus,
    ScheduledReview, UserRef, OPINION_MAX_CHARS,
};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with reqflow items
    pub use crate::{
        Identified, Indexable, ItemId, LevelNumber, OverallReviewStatus, Patchable, Requirement,
        RequirementPatch, ReviewLevel, ReviewStatus, ScheduledReview, UserRef,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
