//! Batch outcome reporting
//!
//! The executor emits [`BatchEvent`]s; a [`BatchReporter`] decides how they
//! reach the user. [`ToastReporter`] renders them through a [`Notifier`].

use crate::error::BatchError;
use crate::executor::BatchOperationResult;
use crate::notify::{Notifier, ToastHandle};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

static NEXT_RUN: AtomicU64 = AtomicU64::new(0);

/// Identity of one batch run, unique within the process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RunId(u64);

impl RunId {
    /// Allocate a fresh id
    #[must_use]
    pub fn next() -> Self {
        Self(NEXT_RUN.fetch_add(1, Ordering::Relaxed))
    }
}

/// Final classification of a batch run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchSummary {
    /// Every item succeeded
    Succeeded {
        /// Items processed
        count: usize,
    },
    /// Some items failed
    Partial {
        /// Successful items
        succeeded: usize,
        /// Failed items
        failed: usize,
    },
    /// Every item failed
    Failed {
        /// Items processed
        count: usize,
        /// Message of the first failure in input order
        first_error: String,
    },
}

impl BatchSummary {
    /// Classify a non-empty result
    #[must_use]
    pub fn from_result<T>(result: &BatchOperationResult<T>) -> Self {
        match (result.success_count(), result.fail_count()) {
            (succeeded, 0) => Self::Succeeded { count: succeeded },
            (0, failed) => Self::Failed {
                count: failed,
                first_error: result
                    .failed()
                    .first()
                    .map(|f| f.error.to_string())
                    .unwrap_or_default(),
            },
            (succeeded, failed) => Self::Partial { succeeded, failed },
        }
    }

    /// Check if every item succeeded
    #[inline]
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded { .. })
    }
}

/// Event emitted during a batch run
#[derive(Debug, Clone, Copy)]
pub enum BatchEvent<'a> {
    /// Selection was empty; nothing ran
    EmptySelection {
        /// Operation name
        operation: &'a str,
    },
    /// First chunk is about to run
    Started {
        /// Run emitting the event
        run: RunId,
        /// Operation name
        operation: &'a str,
        /// Items in the selection
        total: usize,
    },
    /// A chunk finished
    Progress {
        /// Run emitting the event
        run: RunId,
        /// Operation name
        operation: &'a str,
        /// Items settled so far
        processed: usize,
        /// Items in the selection
        total: usize,
    },
    /// Every chunk finished
    Finished {
        /// Run emitting the event
        run: RunId,
        /// Operation name
        operation: &'a str,
        /// Outcome classification
        summary: &'a BatchSummary,
        /// Whether the configuration asks for this outcome to be shown
        announce: bool,
    },
    /// Run stopped on an error outside any single item
    Aborted {
        /// Run emitting the event
        run: RunId,
        /// Operation name
        operation: &'a str,
        /// Cause
        error: &'a BatchError,
    },
}

/// Receiver of batch events
pub trait BatchReporter: Send + Sync {
    /// Handle one event
    fn report(&self, event: BatchEvent<'_>);
}

/// Reporter that drops every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopReporter;

impl BatchReporter for NoopReporter {
    fn report(&self, _event: BatchEvent<'_>) {}
}

/// Reporter rendering events as toasts
///
/// Keeps one loading toast per run, replaced on each progress event and
/// dismissed when the run ends.
pub struct ToastReporter {
    notifier: Arc<dyn Notifier>,
    progress: Mutex<HashMap<RunId, ToastHandle>>,
}

impl ToastReporter {
    /// Create reporter over a notifier
    #[inline]
    #[must_use]
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self {
            notifier,
            progress: Mutex::new(HashMap::new()),
        }
    }

    fn replace_progress(&self, run: RunId, message: &str) {
        let previous = self.progress.lock().remove(&run);
        if let Some(handle) = previous {
            self.notifier.dismiss(handle);
        }
        let handle = self.notifier.loading(message);
        self.progress.lock().insert(run, handle);
    }

    fn clear_progress(&self, run: RunId) {
        let previous = self.progress.lock().remove(&run);
        if let Some(handle) = previous {
            self.notifier.dismiss(handle);
        }
    }
}

impl std::fmt::Debug for ToastReporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToastReporter")
            .field("active", &self.progress.lock().len())
            .finish_non_exhaustive()
    }
}

impl BatchReporter for ToastReporter {
    fn report(&self, event: BatchEvent<'_>) {
        match event {
            BatchEvent::EmptySelection { operation } => {
                self.notifier
                    .error(&format!("{operation}: nothing selected"), None);
            }
            BatchEvent::Started {
                run,
                operation,
                total,
            } => {
                self.replace_progress(run, &format!("{operation}: 0/{total}"));
            }
            BatchEvent::Progress {
                run,
                operation,
                processed,
                total,
            } => {
                self.replace_progress(run, &format!("{operation}: {processed}/{total}"));
            }
            BatchEvent::Finished {
                run,
                operation,
                summary,
                announce,
            } => {
                self.clear_progress(run);
                if !announce {
                    return;
                }
                match summary {
                    BatchSummary::Succeeded { count } => {
                        self.notifier
                            .success(&format!("{operation} completed: {count} succeeded"));
                    }
                    BatchSummary::Partial { succeeded, failed } => {
                        self.notifier.warning(&format!(
                            "{operation} partially completed: {succeeded} succeeded, {failed} failed"
                        ));
                    }
                    BatchSummary::Failed { count, first_error } => {
                        let description = if *count > 1 {
                            format!("{first_error} (and {} more failures)", count - 1)
                        } else {
                            first_error.clone()
                        };
                        self.notifier
                            .error(&format!("{operation} failed"), Some(&description));
                    }
                }
            }
            BatchEvent::Aborted {
                run,
                operation,
                error,
            } => {
                self.clear_progress(run);
                self.notifier
                    .error(&format!("{operation} aborted"), Some(&error.to_string()));
            }
        }
    }
}
