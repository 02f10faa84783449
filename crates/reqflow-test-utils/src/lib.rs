//! Testing utilities for the Reqflow workspace
//!
//! Shared fixtures, a recording notifier, and a scripted repository.

#![allow(missing_docs)]

use async_trait::async_trait;
use parking_lot::Mutex;
use reqflow_batch::{InMemoryRepository, Notifier, RemoteError, Repository, ToastHandle};
use reqflow_model::{ItemId, LevelNumber, Patchable, Priority, Requirement, ScheduledReview};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Loading,
    Success,
    Error,
    Warning,
    Dismiss,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub kind: ToastKind,
    pub message: String,
    pub description: Option<String>,
}

/// Notifier that records every call in order
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    toasts: Mutex<Vec<Toast>>,
    next_handle: AtomicU64,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn toasts(&self) -> Vec<Toast> {
        self.toasts.lock().clone()
    }

    pub fn of_kind(&self, kind: ToastKind) -> Vec<Toast> {
        self.toasts
            .lock()
            .iter()
            .filter(|t| t.kind == kind)
            .cloned()
            .collect()
    }

    /// Success, warning and error toasts; loading and dismiss are skipped
    pub fn outcomes(&self) -> Vec<Toast> {
        self.toasts
            .lock()
            .iter()
            .filter(|t| !matches!(t.kind, ToastKind::Loading | ToastKind::Dismiss))
            .cloned()
            .collect()
    }

    fn push(&self, kind: ToastKind, message: &str, description: Option<&str>) {
        self.toasts.lock().push(Toast {
            kind,
            message: message.to_string(),
            description: description.map(str::to_string),
        });
    }
}

impl Notifier for RecordingNotifier {
    fn loading(&self, message: &str) -> ToastHandle {
        self.push(ToastKind::Loading, message, None);
        ToastHandle::new(self.next_handle.fetch_add(1, Ordering::Relaxed))
    }

    fn success(&self, message: &str) {
        self.push(ToastKind::Success, message, None);
    }

    fn error(&self, message: &str, description: Option<&str>) {
        self.push(ToastKind::Error, message, description);
    }

    fn warning(&self, message: &str) {
        self.push(ToastKind::Warning, message, None);
    }

    fn dismiss(&self, handle: ToastHandle) {
        self.push(ToastKind::Dismiss, &handle.raw().to_string(), None);
    }
}

/// How a scripted repository answers calls for one id
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Script {
    RejectAlways,
    RejectOnce,
}

/// Repository wrapper that records calls and fails on demand
pub struct ScriptedRepository<T: Patchable> {
    inner: InMemoryRepository<T>,
    calls: Mutex<Vec<(ItemId, T::Patch)>>,
    scripts: Mutex<HashMap<ItemId, Script>>,
    rejected_once: Mutex<HashSet<ItemId>>,
    reject_all: bool,
    latency: Option<Duration>,
}

impl<T: Patchable> ScriptedRepository<T> {
    pub fn new(items: impl IntoIterator<Item = T>) -> Self {
        Self {
            inner: InMemoryRepository::with_items(items),
            calls: Mutex::new(Vec::new()),
            scripts: Mutex::new(HashMap::new()),
            rejected_once: Mutex::new(HashSet::new()),
            reject_all: false,
            latency: None,
        }
    }

    /// Reject every call, rollbacks included
    pub fn rejecting_all(mut self) -> Self {
        self.reject_all = true;
        self
    }

    /// Reject every call on these ids
    pub fn rejecting<I: Into<ItemId>>(self, ids: impl IntoIterator<Item = I>) -> Self {
        self.script(ids, Script::RejectAlways)
    }

    /// Reject the first call on these ids, so rollbacks succeed
    pub fn rejecting_once<I: Into<ItemId>>(self, ids: impl IntoIterator<Item = I>) -> Self {
        self.script(ids, Script::RejectOnce)
    }

    /// Sleep before answering each call
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn inner(&self) -> &InMemoryRepository<T> {
        &self.inner
    }

    pub fn calls(&self) -> Vec<(ItemId, T::Patch)> {
        self.calls.lock().clone()
    }

    pub fn calls_for(&self, id: &str) -> Vec<T::Patch> {
        self.calls
            .lock()
            .iter()
            .filter(|(seen, _)| seen.as_str() == id)
            .map(|(_, patch)| patch.clone())
            .collect()
    }

    fn script<I: Into<ItemId>>(self, ids: impl IntoIterator<Item = I>, script: Script) -> Self {
        {
            let mut scripts = self.scripts.lock();
            for id in ids {
                scripts.insert(id.into(), script);
            }
        }
        self
    }

    fn should_reject(&self, id: &ItemId) -> bool {
        if self.reject_all {
            return true;
        }
        match self.scripts.lock().get(id) {
            Some(Script::RejectAlways) => true,
            Some(Script::RejectOnce) => self.rejected_once.lock().insert(id.clone()),
            None => false,
        }
    }
}

#[async_trait]
impl<T: Patchable> Repository<T> for ScriptedRepository<T> {
    async fn list(&self) -> Result<Vec<T>, RemoteError> {
        self.inner.list().await
    }

    async fn apply(&self, id: &ItemId, patch: &T::Patch) -> Result<T, RemoteError> {
        self.calls.lock().push((id.clone(), patch.clone()));
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        if self.should_reject(id) {
            return Err(RemoteError::Rejected(format!("{id} rejected by store")));
        }
        self.inner.apply(id, patch).await
    }
}

/// `count` requirements with a pending level-1 review
pub fn pending_review_items(count: usize) -> Vec<Requirement> {
    (1..=count)
        .map(|n| {
            Requirement::new(format!("REQ-{n}"), format!("Requirement {n}"))
                .with_review(ScheduledReview::pending(&[LevelNumber::First]))
        })
        .collect()
}

/// Small varied collection for index and query tests
pub fn sample_requirements() -> Vec<Requirement> {
    vec![
        Requirement::new("REQ-1", "Hello World")
            .with_planned_version("v1.2")
            .with_priority(Priority::High)
            .with_tags(["search", "ui"]),
        Requirement::new("REQ-2", "Hello There")
            .with_planned_version("v1.3")
            .with_tags(["ui"]),
        Requirement::new("REQ-3", "Export to CSV")
            .with_planned_version("v2.0")
            .with_priority(Priority::Low)
            .with_tags(["export"]),
        Requirement::new("REQ-4", "Audit log")
            .with_priority(Priority::Critical)
            .with_review(ScheduledReview::pending(&[LevelNumber::First, LevelNumber::Second])),
    ]
}
