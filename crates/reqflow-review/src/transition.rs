//! Per-level status transition table

use reqflow_model::{LevelNumber, ReviewStatus};

use crate::error::ReviewError;

/// Statuses reachable from `from` in one write
#[must_use]
pub fn allowed_transitions(from: ReviewStatus) -> &'static [ReviewStatus] {
    use ReviewStatus::{Approved, Pending, Rejected};
    match from {
        Pending => &[Approved, Rejected],
        Approved => &[Rejected],
        Rejected => &[Approved, Pending],
    }
}

/// Whether `from -> to` is in the transition table
#[must_use]
pub fn is_valid_transition(from: ReviewStatus, to: ReviewStatus) -> bool {
    allowed_transitions(from).contains(&to)
}

/// Check a level write against the table
///
/// Writing the current status again is always accepted.
///
/// # Errors
/// Returns [`ReviewError::IllegalTransition`] for writes outside the table
pub fn validate_transition(
    level: LevelNumber,
    from: ReviewStatus,
    to: ReviewStatus,
) -> Result<(), ReviewError> {
    if from == to || is_valid_transition(from, to) {
        Ok(())
    } else {
        Err(ReviewError::IllegalTransition { level, from, to })
    }
}
