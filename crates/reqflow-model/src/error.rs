//! Error types for the model crate

/// Errors raised while constructing or parsing model values
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    /// Review level outside 1..=2
    #[error("invalid review level {0}: only levels 1 and 2 exist")]
    InvalidLevel(u8),

    /// Same level appears twice in one review block
    #[error("duplicate review level {0}")]
    DuplicateLevel(u8),

    /// Unknown review status name
    #[error("unknown review status: {0}")]
    UnknownReviewStatus(String),

    /// Unknown requirement status name
    #[error("unknown requirement status: {0}")]
    UnknownRequirementStatus(String),

    /// Unknown priority name
    #[error("unknown priority: {0}")]
    UnknownPriority(String),

    /// Opinion exceeds the length contract
    #[error("opinion is {len} characters, limit is {max}")]
    OpinionTooLong {
        /// Actual length in characters
        len: usize,
        /// Allowed maximum
        max: usize,
    },

    /// Empty identifier
    #[error("item id must not be empty")]
    EmptyId,
}
