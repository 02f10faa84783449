//! Error types for batch orchestration
//!
//! Provides error handling for:
//! - Remote store failures (per item, never fatal to a batch)
//! - Batch-level failures the executor cannot classify per item
//! - Engine configuration loading

use reqflow_model::ItemId;

/// Remote store errors
///
/// The `Display` text is the human-readable message shown to users.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RemoteError {
    /// Item does not exist remotely
    #[error("item {0} not found")]
    NotFound(ItemId),

    /// Store refused the change
    #[error("{0}")]
    Rejected(String),

    /// Store could not be reached
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Batch-level errors
///
/// Per-item failures never surface here; they are collected into the
/// batch result.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BatchError {
    /// Chunk size of zero
    #[error("batch size must be at least 1")]
    InvalidBatchSize,

    /// Outcome count does not match the selection
    #[error("batch accounting mismatch: {recorded} outcomes for {expected} items")]
    AccountingMismatch {
        /// Items in the selection
        expected: usize,
        /// Outcomes recorded
        recorded: usize,
    },
}

/// Configuration loading errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("config io error: {0}")]
    Io(#[from] std::io::Error),

    /// Config file is not valid TOML or has the wrong shape
    #[error("config parse error: {0}")]
    Parse(#[from] toml::de::Error),
}
