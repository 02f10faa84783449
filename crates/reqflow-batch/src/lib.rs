//! Reqflow Batch - Mutation orchestration
//!
//! Applies mutations across selections and reconciles local state with the
//! remote store:
//! - [`BatchExecutor`]: Chunked execution with progress and per-item
//!   failure isolation
//! - [`OptimisticCoordinator`]: Apply locally, confirm remotely, revert on
//!   failure
//! - [`BatchReporter`] / [`ToastReporter`]: Outcome events translated into
//!   UI notifications
//! - [`Repository`]: Remote "read collection / write one item" contract
//!
//! # Example
//!
//! ```rust,ignore
//! use reqflow_batch::{BatchConfig, BatchExecutor, ToastReporter};
//!
//! # async fn example(items: Vec<Requirement>, notifier: Arc<dyn Notifier>) -> anyhow::Result<()> {
//! let executor = BatchExecutor::new(Arc::new(ToastReporter::new(notifier)));
//! let config = BatchConfig::new("Approve").with_batch_size(20);
//!
//! let result = executor
//!     .execute(items, |item| async move { approve(item).await }, &config)
//!     .await?;
//!
//! println!("{} of {} approved", result.success_count(), result.total());
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod executor;
pub mod notify;
pub mod optimistic;
pub mod report;
pub mod repository;

// Re-exports for convenience
pub use config::{BatchConfig, ConflictPolicy, EngineConfig};
pub use error::{BatchError, ConfigError, RemoteError};
pub use executor::{partition_chunks, BatchExecutor, BatchOperationResult, FailedItem};
pub use notify::{Notifier, ToastHandle, TracingNotifier};
pub use optimistic::{
    OptimisticCoordinator, OptimisticOptions, RollbackSnapshot, UpdateOutcome, UpdatePhase,
};
pub use report::{BatchEvent, BatchReporter, BatchSummary, NoopReporter, RunId, ToastReporter};
pub use repository::{InMemoryRepository, Repository};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for running batch and optimistic mutations
    pub use crate::{
        BatchConfig, BatchExecutor, BatchOperationResult, Notifier, OptimisticCoordinator,
        OptimisticOptions, Repository, ToastReporter, UpdateOutcome,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
