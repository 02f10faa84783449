//! Error types for index building and settings persistence

use reqflow_model::ItemId;

/// Index build errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IndexError {
    /// Two items in the collection share an identifier
    #[error("duplicate item id in collection: {0}")]
    DuplicateId(ItemId),
}

/// Settings store errors
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// Backing file could not be read or written
    #[error("settings io error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored value is not valid JSON or has the wrong shape
    #[error("settings format error: {0}")]
    Format(#[from] serde_json::Error),
}
