//! UI notification contract
//!
//! The engine decides when to notify; rendering belongs to the host.

use std::sync::atomic::{AtomicU64, Ordering};

/// Handle of a loading toast, used to dismiss it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ToastHandle(u64);

impl ToastHandle {
    /// Wrap a host-assigned handle value
    #[inline]
    #[must_use]
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw handle value
    #[inline]
    #[must_use]
    pub fn raw(self) -> u64 {
        self.0
    }
}

/// Toast/progress surface provided by the host
pub trait Notifier: Send + Sync {
    /// Show a loading indicator
    fn loading(&self, message: &str) -> ToastHandle;

    /// Show a success message
    fn success(&self, message: &str);

    /// Show an error message with optional detail
    fn error(&self, message: &str, description: Option<&str>);

    /// Show a warning message
    fn warning(&self, message: &str);

    /// Remove a loading indicator
    fn dismiss(&self, handle: ToastHandle);
}

/// Notifier writing every toast to the tracing log
///
/// Used by headless hosts such as the command line.
#[derive(Debug, Default)]
pub struct TracingNotifier {
    next_handle: AtomicU64,
}

impl TracingNotifier {
    /// Create notifier
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Notifier for TracingNotifier {
    fn loading(&self, message: &str) -> ToastHandle {
        let handle = ToastHandle::new(self.next_handle.fetch_add(1, Ordering::Relaxed));
        tracing::info!(toast = handle.raw(), "{message}");
        handle
    }

    fn success(&self, message: &str) {
        tracing::info!("{message}");
    }

    fn error(&self, message: &str, description: Option<&str>) {
        match description {
            Some(description) => tracing::error!("{message}: {description}"),
            None => tracing::error!("{message}"),
        }
    }

    fn warning(&self, message: &str) {
        tracing::warn!("{message}");
    }

    fn dismiss(&self, handle: ToastHandle) {
        tracing::trace!(toast = handle.raw(), "dismissed");
    }
}
