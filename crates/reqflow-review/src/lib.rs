//! Reqflow Review
//!
//! Two-level approval state machine attached to each reviewable item.
//!
//! # Overview
//!
//! - [`compute_overall_status`]: Pure projection of the level list into an
//!   [`OverallReviewStatus`](reqflow_model::OverallReviewStatus)
//! - [`is_valid_transition`]: The level-status transition table
//! - [`ReviewStateMachine`]: Computes [`ReviewPatch`]es for level decisions,
//!   optionally enforcing the transition table
//!
//! # Example
//!
//! ```rust
//! use reqflow_model::{LevelNumber, OverallReviewStatus, Requirement, ReviewStatus, ScheduledReview};
//! use reqflow_review::{compute_overall_status, set_level_status};
//!
//! let mut req = Requirement::new("REQ-1", "Audit log")
//!     .with_review(ScheduledReview::pending(&[LevelNumber::First]));
//!
//! let patch = set_level_status(&req, LevelNumber::First, ReviewStatus::Approved, None).unwrap();
//! patch.apply_to(&mut req);
//!
//! assert_eq!(compute_overall_status(&req), OverallReviewStatus::Level1Approved);
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod error;
mod machine;
mod status;
mod transition;

// Re-exports
pub use error::ReviewError;
pub use machine::{set_level_status, LevelDecision, ReviewPatch, ReviewStateMachine, TransitionPolicy};
pub use status::{compute_overall_status, get_level, Reviewable};
pub use transition::{allowed_transitions, is_valid_transition, validate_transition};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
