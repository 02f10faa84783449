//! Optimistic update coordination
//!
//! The host applies a patch locally before calling the coordinator. The
//! coordinator confirms the patch remotely and, on failure, sends the
//! inverse patch so the remote side returns to the pre-update state.
//!
//! # Lifecycle
//!
//! ```text
//! Idle -> Updating -> Confirmed
//!                  -> RolledBack
//! ```
//!
//! A snapshot exists only while `Updating`. A failed rollback is logged
//! and never retried.

use crate::config::ConflictPolicy;
use crate::error::RemoteError;
use crate::notify::Notifier;
use crate::repository::Repository;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use futures::future::join_all;
use reqflow_model::{ItemId, Patchable};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Pre-update state of one in-flight update
#[derive(Debug, Clone)]
pub struct RollbackSnapshot<T: Patchable> {
    /// Update that registered this snapshot
    pub update_id: u64,
    /// Item as the caller saw it before patching
    pub original: T,
    /// Patch restoring `original`
    pub revert: T::Patch,
    /// When the snapshot was taken
    pub taken_at: DateTime<Utc>,
}

/// Phase of the latest update on an item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum UpdatePhase {
    /// No update seen
    #[default]
    Idle,
    /// Remote confirmation outstanding
    Updating,
    /// Remote side accepted the patch
    Confirmed,
    /// Remote side rejected the patch
    RolledBack,
}

/// Result of one optimistic update
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateOutcome<T> {
    /// Remote side accepted; carries the authoritative item
    Confirmed(T),
    /// Remote side rejected and the revert succeeded
    RolledBack {
        /// Why the forward patch failed
        error: RemoteError,
    },
    /// Remote side rejected and the revert failed too
    RollbackFailed {
        /// Why the forward patch failed
        error: RemoteError,
        /// Why the revert failed
        rollback_error: RemoteError,
    },
}

impl<T> UpdateOutcome<T> {
    /// Terminal phase for this outcome
    #[inline]
    #[must_use]
    pub fn phase(&self) -> UpdatePhase {
        match self {
            Self::Confirmed(_) => UpdatePhase::Confirmed,
            Self::RolledBack { .. } | Self::RollbackFailed { .. } => UpdatePhase::RolledBack,
        }
    }

    /// Check if the remote side accepted the patch
    #[inline]
    #[must_use]
    pub fn is_confirmed(&self) -> bool {
        matches!(self, Self::Confirmed(_))
    }

    /// Confirmed item, if any
    #[must_use]
    pub fn confirmed(self) -> Option<T> {
        match self {
            Self::Confirmed(item) => Some(item),
            _ => None,
        }
    }

    /// Convert into a result for composing with the batch executor
    ///
    /// # Errors
    /// Returns the forward failure when the update did not stick
    pub fn into_result(self) -> anyhow::Result<T> {
        match self {
            Self::Confirmed(item) => Ok(item),
            Self::RolledBack { error } => Err(error.into()),
            Self::RollbackFailed {
                error,
                rollback_error,
            } => Err(anyhow::anyhow!(
                "{error} (rollback also failed: {rollback_error})"
            )),
        }
    }
}

/// Callback on a confirmed item
pub type SuccessCallback<T> = Arc<dyn Fn(&T) + Send + Sync>;

/// Callback on a failed update
pub type ErrorCallback = Arc<dyn Fn(&RemoteError) + Send + Sync>;

/// Per-call options
pub struct OptimisticOptions<T> {
    /// Toast text on success
    pub success_message: String,
    /// Toast text on failure
    pub error_message: String,
    /// Suppress toasts
    pub silent: bool,
    /// Called with the confirmed item
    pub on_success: Option<SuccessCallback<T>>,
    /// Called with the forward failure
    pub on_error: Option<ErrorCallback>,
}

impl<T> OptimisticOptions<T> {
    /// Default options
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With success message
    #[inline]
    #[must_use]
    pub fn with_success_message(mut self, message: impl Into<String>) -> Self {
        self.success_message = message.into();
        self
    }

    /// With error message
    #[inline]
    #[must_use]
    pub fn with_error_message(mut self, message: impl Into<String>) -> Self {
        self.error_message = message.into();
        self
    }

    /// Without toasts
    #[inline]
    #[must_use]
    pub fn silent(mut self) -> Self {
        self.silent = true;
        self
    }

    /// With success callback
    #[must_use]
    pub fn on_success(mut self, callback: impl Fn(&T) + Send + Sync + 'static) -> Self {
        self.on_success = Some(Arc::new(callback));
        self
    }

    /// With error callback
    #[must_use]
    pub fn on_error(mut self, callback: impl Fn(&RemoteError) + Send + Sync + 'static) -> Self {
        self.on_error = Some(Arc::new(callback));
        self
    }
}

impl<T> Default for OptimisticOptions<T> {
    fn default() -> Self {
        Self {
            success_message: "Changes saved".to_string(),
            error_message: "Failed to save changes".to_string(),
            silent: false,
            on_success: None,
            on_error: None,
        }
    }
}

impl<T> Clone for OptimisticOptions<T> {
    fn clone(&self) -> Self {
        Self {
            success_message: self.success_message.clone(),
            error_message: self.error_message.clone(),
            silent: self.silent,
            on_success: self.on_success.clone(),
            on_error: self.on_error.clone(),
        }
    }
}

impl<T> std::fmt::Debug for OptimisticOptions<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OptimisticOptions")
            .field("success_message", &self.success_message)
            .field("error_message", &self.error_message)
            .field("silent", &self.silent)
            .field("on_success", &self.on_success.is_some())
            .field("on_error", &self.on_error.is_some())
            .finish()
    }
}

/// Reconciles locally applied patches with the remote store
pub struct OptimisticCoordinator<T: Patchable> {
    repository: Arc<dyn Repository<T>>,
    notifier: Arc<dyn Notifier>,
    policy: ConflictPolicy,
    snapshots: DashMap<ItemId, RollbackSnapshot<T>>,
    item_locks: DashMap<ItemId, Arc<Mutex<()>>>,
    next_update: AtomicU64,
}

impl<T: Patchable> OptimisticCoordinator<T> {
    /// Create coordinator with the default conflict policy
    #[must_use]
    pub fn new(repository: Arc<dyn Repository<T>>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            repository,
            notifier,
            policy: ConflictPolicy::default(),
            snapshots: DashMap::new(),
            item_locks: DashMap::new(),
            next_update: AtomicU64::new(0),
        }
    }

    /// With conflict policy
    #[inline]
    #[must_use]
    pub fn with_policy(mut self, policy: ConflictPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Active conflict policy
    #[inline]
    #[must_use]
    pub fn policy(&self) -> ConflictPolicy {
        self.policy
    }

    /// Phase of `id` as seen by the coordinator
    ///
    /// `Updating` while an update is in flight, `Idle` otherwise. Settled
    /// updates are not remembered; their terminal phase is
    /// [`UpdateOutcome::phase`].
    #[must_use]
    pub fn phase(&self, id: &ItemId) -> UpdatePhase {
        if self.snapshots.contains_key(id) {
            UpdatePhase::Updating
        } else {
            UpdatePhase::Idle
        }
    }

    /// Entries held for in-flight updates, snapshots and per-id queues
    #[must_use]
    pub fn tracked_items(&self) -> usize {
        self.snapshots.len() + self.item_locks.len()
    }

    /// Registered snapshot for `id`, if an update is in flight
    #[must_use]
    pub fn snapshot(&self, id: &ItemId) -> Option<RollbackSnapshot<T>> {
        self.snapshots.get(id).map(|s| s.value().clone())
    }

    /// Confirm `patch` remotely, returning the confirmed item or `None`
    pub async fn optimistic_update(
        &self,
        current: &T,
        patch: T::Patch,
        options: &OptimisticOptions<T>,
    ) -> Option<T> {
        self.optimistic_update_detailed(current, patch, options)
            .await
            .confirmed()
    }

    /// Confirm `patch` remotely and report exactly what happened
    ///
    /// `current` is the item before the local patch; its inverse of `patch`
    /// is what gets sent back on failure.
    pub async fn optimistic_update_detailed(
        &self,
        current: &T,
        patch: T::Patch,
        options: &OptimisticOptions<T>,
    ) -> UpdateOutcome<T> {
        let id = current.id().clone();
        let guard = match self.policy {
            ConflictPolicy::SerializePerItem => Some(self.lock_item(&id).await),
            ConflictPolicy::LastConfirmationWins => None,
        };

        let update_id = self.next_update.fetch_add(1, Ordering::Relaxed);
        let revert = current.inverse(&patch);
        let snapshot = RollbackSnapshot {
            update_id,
            original: current.clone(),
            revert: revert.clone(),
            taken_at: Utc::now(),
        };
        if let Some(previous) = self.snapshots.insert(id.clone(), snapshot) {
            tracing::debug!(
                item = %id,
                update_id,
                replaced = previous.update_id,
                "Concurrent update on item, snapshot replaced"
            );
        }

        tracing::debug!(item = %id, update_id, "Confirming optimistic update");
        let outcome = match self.repository.apply(&id, &patch).await {
            Ok(confirmed) => UpdateOutcome::Confirmed(confirmed),
            Err(error) => {
                tracing::warn!(item = %id, update_id, %error, "Remote update failed, rolling back");
                match self.repository.apply(&id, &revert).await {
                    Ok(_) => UpdateOutcome::RolledBack { error },
                    Err(rollback_error) => {
                        tracing::error!(
                            item = %id,
                            update_id,
                            %error,
                            %rollback_error,
                            "Rollback failed, remote state may diverge"
                        );
                        UpdateOutcome::RollbackFailed {
                            error,
                            rollback_error,
                        }
                    }
                }
            }
        };

        self.snapshots
            .remove_if(&id, |_, snapshot| snapshot.update_id == update_id);

        self.announce(&outcome, options);

        drop(guard);
        self.item_locks
            .remove_if(&id, |_, lock| Arc::strong_count(lock) == 1);

        outcome
    }

    /// Confirm one patch per item in parallel
    ///
    /// Individual toasts are suppressed; one aggregate toast is shown
    /// unless `options.silent`. Returns the confirmed count.
    pub async fn batch_optimistic_update<F>(
        &self,
        items: &[T],
        patch_fn: F,
        options: &OptimisticOptions<T>,
    ) -> usize
    where
        F: Fn(&T) -> T::Patch,
    {
        if items.is_empty() {
            tracing::debug!("Empty selection, no optimistic updates");
            return 0;
        }

        let per_item = options.clone().silent();
        let outcomes = join_all(
            items
                .iter()
                .map(|item| self.optimistic_update_detailed(item, patch_fn(item), &per_item)),
        )
        .await;

        let total = items.len();
        let confirmed = outcomes.iter().filter(|o| o.is_confirmed()).count();
        tracing::info!(total, confirmed, "Batch optimistic update settled");

        if !options.silent {
            if confirmed == total {
                self.notifier
                    .success(&format!("{}: {confirmed} updated", options.success_message));
            } else if confirmed > 0 {
                self.notifier.warning(&format!(
                    "{confirmed} of {total} updated, {} rolled back",
                    total - confirmed
                ));
            } else {
                self.notifier.error(
                    &options.error_message,
                    Some(&format!("all {total} updates rolled back")),
                );
            }
        }

        confirmed
    }

    async fn lock_item(&self, id: &ItemId) -> OwnedMutexGuard<()> {
        let lock = self.item_locks.entry(id.clone()).or_default().clone();
        lock.lock_owned().await
    }

    fn announce(&self, outcome: &UpdateOutcome<T>, options: &OptimisticOptions<T>) {
        match outcome {
            UpdateOutcome::Confirmed(item) => {
                if !options.silent {
                    self.notifier.success(&options.success_message);
                }
                if let Some(callback) = &options.on_success {
                    callback(item);
                }
            }
            UpdateOutcome::RolledBack { error } | UpdateOutcome::RollbackFailed { error, .. } => {
                if !options.silent {
                    self.notifier
                        .error(&options.error_message, Some(&error.to_string()));
                }
                if let Some(callback) = &options.on_error {
                    callback(error);
                }
            }
        }
    }
}

impl<T: Patchable> std::fmt::Debug for OptimisticCoordinator<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OptimisticCoordinator")
            .field("policy", &self.policy)
            .field("in_flight", &self.snapshots.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::ToastHandle;
    use crate::repository::InMemoryRepository;
    use async_trait::async_trait;
    use parking_lot::Mutex as SyncMutex;
    use pretty_assertions::assert_eq;
    use reqflow_model::{Requirement, RequirementPatch, RequirementStatus};
    use std::sync::atomic::AtomicUsize;

    #[derive(Default)]
    struct Toasts(SyncMutex<Vec<String>>);

    impl Notifier for Toasts {
        fn loading(&self, message: &str) -> ToastHandle {
            self.0.lock().push(format!("loading: {message}"));
            ToastHandle::new(0)
        }
        fn success(&self, message: &str) {
            self.0.lock().push(format!("success: {message}"));
        }
        fn error(&self, message: &str, description: Option<&str>) {
            self.0
                .lock()
                .push(format!("error: {message} | {}", description.unwrap_or("-")));
        }
        fn warning(&self, message: &str) {
            self.0.lock().push(format!("warning: {message}"));
        }
        fn dismiss(&self, _handle: ToastHandle) {}
    }

    /// Rejects forward patches on listed ids and records every call
    struct Rejecting {
        inner: InMemoryRepository<Requirement>,
        reject: Vec<&'static str>,
        calls: SyncMutex<Vec<(ItemId, RequirementPatch)>>,
    }

    #[async_trait]
    impl Repository<Requirement> for Rejecting {
        async fn list(&self) -> Result<Vec<Requirement>, RemoteError> {
            self.inner.list().await
        }

        async fn apply(
            &self,
            id: &ItemId,
            patch: &RequirementPatch,
        ) -> Result<Requirement, RemoteError> {
            let first_call = !self.calls.lock().iter().any(|(seen, _)| seen == id);
            self.calls.lock().push((id.clone(), patch.clone()));
            if first_call && self.reject.contains(&id.as_str()) {
                return Err(RemoteError::Rejected("locked by another user".into()));
            }
            self.inner.apply(id, patch).await
        }
    }

    fn setup(reject: Vec<&'static str>) -> (Arc<Rejecting>, Arc<Toasts>, Vec<Requirement>) {
        let items = vec![Requirement::new("a", "A"), Requirement::new("b", "B")];
        let repo = Arc::new(Rejecting {
            inner: InMemoryRepository::with_items(items.clone()),
            reject,
            calls: SyncMutex::new(Vec::new()),
        });
        (repo, Arc::new(Toasts::default()), items)
    }

    #[tokio::test]
    async fn confirmed_update_returns_remote_item() {
        let (repo, toasts, items) = setup(vec![]);
        let coordinator = OptimisticCoordinator::<Requirement>::new(repo.clone(), toasts.clone());
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = seen.clone();
        let options = OptimisticOptions::new().on_success(move |_: &Requirement| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let confirmed = coordinator
            .optimistic_update(
                &items[0],
                RequirementPatch::Status(RequirementStatus::Open),
                &options,
            )
            .await
            .unwrap();

        assert_eq!(confirmed.status, RequirementStatus::Open);
        assert_eq!(seen.load(Ordering::SeqCst), 1);
        assert_eq!(coordinator.phase(&ItemId::new("a")), UpdatePhase::Idle);
        assert_eq!(coordinator.phase(&ItemId::new("b")), UpdatePhase::Idle);
        assert!(coordinator.snapshot(&ItemId::new("a")).is_none());
        assert_eq!(*toasts.0.lock(), vec!["success: Changes saved".to_string()]);
    }

    #[tokio::test]
    async fn rejected_update_sends_inverse() {
        let (repo, toasts, items) = setup(vec!["a"]);
        let coordinator = OptimisticCoordinator::<Requirement>::new(repo.clone(), toasts.clone());

        let outcome = coordinator
            .optimistic_update_detailed(
                &items[0],
                RequirementPatch::Status(RequirementStatus::Done),
                &OptimisticOptions::new(),
            )
            .await;

        assert_eq!(
            outcome,
            UpdateOutcome::RolledBack {
                error: RemoteError::Rejected("locked by another user".into())
            }
        );
        assert_eq!(
            *repo.calls.lock(),
            vec![
                (ItemId::new("a"), RequirementPatch::Status(RequirementStatus::Done)),
                (ItemId::new("a"), RequirementPatch::Status(RequirementStatus::Draft)),
            ]
        );
        assert_eq!(outcome.phase(), UpdatePhase::RolledBack);
        assert_eq!(coordinator.phase(&ItemId::new("a")), UpdatePhase::Idle);
        assert_eq!(
            *toasts.0.lock(),
            vec!["error: Failed to save changes | locked by another user".to_string()]
        );
    }

    #[tokio::test]
    async fn batch_shows_one_aggregate_toast() {
        let (repo, toasts, items) = setup(vec!["b"]);
        let coordinator = OptimisticCoordinator::<Requirement>::new(repo, toasts.clone());

        let confirmed = coordinator
            .batch_optimistic_update(
                &items,
                |_| RequirementPatch::Title("renamed".into()),
                &OptimisticOptions::new(),
            )
            .await;

        assert_eq!(confirmed, 1);
        assert_eq!(
            *toasts.0.lock(),
            vec!["warning: 1 of 2 updated, 1 rolled back".to_string()]
        );
    }

    #[test]
    fn into_result_keeps_remote_message() {
        let outcome: UpdateOutcome<Requirement> = UpdateOutcome::RolledBack {
            error: RemoteError::Rejected("stale version".into()),
        };
        assert_eq!(outcome.into_result().unwrap_err().to_string(), "stale version");
    }
}
