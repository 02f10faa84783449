//! Review error types

use reqflow_model::{ItemId, LevelNumber, ModelError, ReviewStatus};

/// Review state machine errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReviewError {
    /// Item never entered review
    #[error("item {id} has no review data")]
    NoReviewBlock {
        /// Item without a review block
        id: ItemId,
    },

    /// Decision carries an invalid value, such as an overlong opinion
    #[error(transparent)]
    Model(#[from] ModelError),

    /// Transition outside the table while enforcement is on
    #[error("illegal review transition on level {level}: {from} -> {to}")]
    IllegalTransition {
        /// Level being written
        level: LevelNumber,
        /// Current status
        from: ReviewStatus,
        /// Requested status
        to: ReviewStatus,
    },
}

impl ReviewError {
    /// Whether the caller should report this as a skip rather than a failure
    #[inline]
    #[must_use]
    pub fn is_skip(&self) -> bool {
        matches!(self, Self::NoReviewBlock { .. })
    }
}
