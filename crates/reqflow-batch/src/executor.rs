//! Chunked batch execution
//!
//! Items are split into consecutive chunks of `batch_size`. Chunks run one
//! after another with `batch_delay_ms` between them; items within a chunk
//! run concurrently. A failing or panicking item never affects its
//! neighbours.

use crate::config::BatchConfig;
use crate::error::BatchError;
use crate::report::{BatchEvent, BatchReporter, BatchSummary, NoopReporter, RunId};
use futures::future::join_all;
use futures::FutureExt;
use std::any::Any;
use std::future::Future;
use std::ops::Range;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

/// Split `len` items into consecutive ranges of at most `size`
///
/// Returns no ranges when `len` or `size` is zero.
#[must_use]
pub fn partition_chunks(len: usize, size: usize) -> Vec<Range<usize>> {
    if size == 0 {
        return Vec::new();
    }
    (0..len)
        .step_by(size)
        .map(|start| start..(start + size).min(len))
        .collect()
}

/// Item whose mutation failed
#[derive(Debug)]
pub struct FailedItem<T> {
    /// The input item
    pub item: T,
    /// Failure cause
    pub error: anyhow::Error,
}

/// Outcome of a batch run
///
/// Both lists keep input order.
#[derive(Debug)]
pub struct BatchOperationResult<T> {
    succeeded: Vec<T>,
    failed: Vec<FailedItem<T>>,
    total: usize,
}

impl<T> BatchOperationResult<T> {
    /// Result of a run over nothing
    #[inline]
    #[must_use]
    pub fn empty() -> Self {
        Self {
            succeeded: Vec::new(),
            failed: Vec::new(),
            total: 0,
        }
    }

    /// Assemble a result from settled items
    #[must_use]
    pub fn from_parts(succeeded: Vec<T>, failed: Vec<FailedItem<T>>) -> Self {
        let total = succeeded.len() + failed.len();
        Self {
            succeeded,
            failed,
            total,
        }
    }

    /// Successful item count
    #[inline]
    #[must_use]
    pub fn success_count(&self) -> usize {
        self.succeeded.len()
    }

    /// Failed item count
    #[inline]
    #[must_use]
    pub fn fail_count(&self) -> usize {
        self.failed.len()
    }

    /// Items in the selection
    #[inline]
    #[must_use]
    pub fn total(&self) -> usize {
        self.total
    }

    /// Successful items
    #[inline]
    #[must_use]
    pub fn succeeded(&self) -> &[T] {
        &self.succeeded
    }

    /// Failed items with their errors
    #[inline]
    #[must_use]
    pub fn failed(&self) -> &[FailedItem<T>] {
        &self.failed
    }

    /// Split into successes and failures
    #[must_use]
    pub fn into_parts(self) -> (Vec<T>, Vec<FailedItem<T>>) {
        (self.succeeded, self.failed)
    }
}

/// Runs a mutation across a selection
#[derive(Clone)]
pub struct BatchExecutor {
    reporter: Arc<dyn BatchReporter>,
}

impl BatchExecutor {
    /// Create executor reporting to `reporter`
    #[inline]
    #[must_use]
    pub fn new(reporter: Arc<dyn BatchReporter>) -> Self {
        Self { reporter }
    }

    /// Create executor that reports nothing
    #[inline]
    #[must_use]
    pub fn headless() -> Self {
        Self::new(Arc::new(NoopReporter))
    }

    /// Apply `mutate` to every item
    ///
    /// An empty selection returns an empty result without calling
    /// `mutate`. Per-item errors and panics are collected into the result.
    ///
    /// # Errors
    /// - [`BatchError::InvalidBatchSize`] when `batch_size` is zero
    /// - [`BatchError::AccountingMismatch`] when outcomes go missing
    ///
    /// Both are reported as [`BatchEvent::Aborted`] before returning.
    pub async fn execute<T, F, Fut>(
        &self,
        items: Vec<T>,
        mutate: F,
        config: &BatchConfig,
    ) -> Result<BatchOperationResult<T>, BatchError>
    where
        T: Clone,
        F: Fn(T) -> Fut,
        Fut: Future<Output = anyhow::Result<()>>,
    {
        let operation = config.operation_name.as_str();

        if items.is_empty() {
            tracing::debug!(operation, "Empty selection, nothing to do");
            if config.show_error {
                self.reporter.report(BatchEvent::EmptySelection { operation });
            }
            return Ok(BatchOperationResult::empty());
        }

        let run = RunId::next();
        if config.batch_size == 0 {
            return Err(self.abort(run, operation, BatchError::InvalidBatchSize));
        }

        let total = items.len();
        let chunks = partition_chunks(total, config.batch_size);
        tracing::info!(
            operation,
            total,
            chunks = chunks.len(),
            batch_size = config.batch_size,
            "Starting batch"
        );

        if config.show_progress {
            self.reporter.report(BatchEvent::Started {
                run,
                operation,
                total,
            });
        }

        let mut succeeded = Vec::new();
        let mut failed = Vec::new();
        let last = chunks.len().saturating_sub(1);

        for (index, range) in chunks.into_iter().enumerate() {
            let chunk = &items[range];
            let outcomes = join_all(chunk.iter().map(|item| {
                // The closure may panic before handing back its future
                let started = std::panic::catch_unwind(AssertUnwindSafe(|| mutate(item.clone())));
                async move {
                    match started {
                        Ok(future) => AssertUnwindSafe(future).catch_unwind().await,
                        Err(payload) => Err(payload),
                    }
                }
            }))
            .await;

            for (item, outcome) in chunk.iter().zip(outcomes) {
                match outcome {
                    Ok(Ok(())) => succeeded.push(item.clone()),
                    Ok(Err(error)) => failed.push(FailedItem {
                        item: item.clone(),
                        error,
                    }),
                    Err(payload) => {
                        let message = panic_message(payload.as_ref());
                        tracing::error!(operation, chunk = index, "Mutation panicked: {message}");
                        failed.push(FailedItem {
                            item: item.clone(),
                            error: anyhow::anyhow!("mutation panicked: {message}"),
                        });
                    }
                }
            }

            let processed = succeeded.len() + failed.len();
            tracing::debug!(operation, chunk = index, processed, total, "Chunk settled");
            if config.show_progress {
                self.reporter.report(BatchEvent::Progress {
                    run,
                    operation,
                    processed,
                    total,
                });
            }

            if index < last && config.batch_delay_ms > 0 {
                tokio::time::sleep(config.delay()).await;
            }
        }

        let result = BatchOperationResult::from_parts(succeeded, failed);
        if result.total() != total {
            return Err(self.abort(
                run,
                operation,
                BatchError::AccountingMismatch {
                    expected: total,
                    recorded: result.total(),
                },
            ));
        }

        let summary = BatchSummary::from_result(&result);
        if summary.is_success() {
            tracing::info!(operation, succeeded = result.success_count(), "Batch completed");
        } else {
            tracing::warn!(
                operation,
                succeeded = result.success_count(),
                failed = result.fail_count(),
                "Batch completed with failures"
            );
        }

        let announce = if summary.is_success() {
            config.show_success
        } else {
            config.show_error
        };
        self.reporter.report(BatchEvent::Finished {
            run,
            operation,
            summary: &summary,
            announce,
        });

        Ok(result)
    }

    fn abort(&self, run: RunId, operation: &str, error: BatchError) -> BatchError {
        tracing::error!(operation, %error, "Batch aborted");
        self.reporter.report(BatchEvent::Aborted {
            run,
            operation,
            error: &error,
        });
        error
    }
}

impl std::fmt::Debug for BatchExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchExecutor").finish_non_exhaustive()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
