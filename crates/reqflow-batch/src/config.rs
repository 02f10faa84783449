//! Engine configuration
//!
//! Loaded from TOML; every field has a default.
//!
//! ```toml
//! conflict_policy = "serialize_per_item"
//! transition_policy = "enforced"
//! indexed_fields = ["title", "plannedVersion", "tags"]
//!
//! [batch]
//! batch_size = 25
//! batch_delay_ms = 50
//! ```

use crate::error::ConfigError;
use reqflow_review::TransitionPolicy;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Default items per chunk
pub const DEFAULT_BATCH_SIZE: usize = 10;

/// Default pause between chunks, in milliseconds
pub const DEFAULT_BATCH_DELAY_MS: u64 = 100;

/// Settings for one batch run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Name shown in notifications, e.g. "Approve"
    pub operation_name: String,
    /// Items per chunk
    pub batch_size: usize,
    /// Pause between chunks, in milliseconds
    pub batch_delay_ms: u64,
    /// Emit progress after each chunk
    pub show_progress: bool,
    /// Announce full success
    pub show_success: bool,
    /// Announce empty selections, partial and total failures
    pub show_error: bool,
}

impl BatchConfig {
    /// Default configuration for a named operation
    #[inline]
    #[must_use]
    pub fn new(operation_name: impl Into<String>) -> Self {
        Self {
            operation_name: operation_name.into(),
            ..Self::default()
        }
    }

    /// With batch size
    #[inline]
    #[must_use]
    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.batch_size = size;
        self
    }

    /// With delay between chunks
    #[inline]
    #[must_use]
    pub fn with_delay_ms(mut self, delay_ms: u64) -> Self {
        self.batch_delay_ms = delay_ms;
        self
    }

    /// With progress notifications on or off
    #[inline]
    #[must_use]
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// With success notification on or off
    #[inline]
    #[must_use]
    pub fn with_success(mut self, show: bool) -> Self {
        self.show_success = show;
        self
    }

    /// With error notifications on or off
    #[inline]
    #[must_use]
    pub fn with_error(mut self, show: bool) -> Self {
        self.show_error = show;
        self
    }

    /// All notifications off
    #[inline]
    #[must_use]
    pub fn quiet(self) -> Self {
        self.with_progress(false).with_success(false).with_error(false)
    }

    /// Pause between chunks
    #[inline]
    #[must_use]
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.batch_delay_ms)
    }
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            operation_name: "Batch operation".to_string(),
            batch_size: DEFAULT_BATCH_SIZE,
            batch_delay_ms: DEFAULT_BATCH_DELAY_MS,
            show_progress: true,
            show_success: true,
            show_error: true,
        }
    }
}

/// What happens when two optimistic updates target the same item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictPolicy {
    /// Updates run concurrently; the last remote confirmation wins
    #[default]
    LastConfirmationWins,
    /// Updates on one id queue behind each other
    SerializePerItem,
}

/// Top-level engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Defaults for batch runs
    pub batch: BatchConfig,
    /// Same-item optimistic update policy
    pub conflict_policy: ConflictPolicy,
    /// Review level write policy
    pub transition_policy: TransitionPolicy,
    /// Fields indexed when no stored view settings exist
    pub indexed_fields: Vec<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            batch: BatchConfig::default(),
            conflict_policy: ConflictPolicy::default(),
            transition_policy: TransitionPolicy::default(),
            indexed_fields: vec![
                "title".to_string(),
                "plannedVersion".to_string(),
                "status".to_string(),
                "tags".to_string(),
            ],
        }
    }
}

impl EngineConfig {
    /// Parse from TOML text
    ///
    /// # Errors
    /// Returns [`ConfigError::Parse`] on malformed input
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(raw)?)
    }

    /// Load from a TOML file
    ///
    /// # Errors
    /// Returns error if the file cannot be read or parsed
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }
}
