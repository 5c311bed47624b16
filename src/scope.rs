//! In-flight request tracking for one view.
//!
//! Every backend call a view starts runs through its `ViewScope`. Tearing the
//! view down (dropping the scope or calling `cancel_all`) aborts whatever is
//! still pending, so late responses never land in a view that is gone.

use futures::future::{AbortHandle, Abortable};
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScopeError {
    #[error("request aborted: view was closed")]
    Aborted,
}

#[derive(Debug, Default)]
pub struct ViewScope {
    next_id: AtomicU64,
    cancelled: AtomicBool,
    in_flight: Mutex<HashMap<u64, AbortHandle>>,
}

impl ViewScope {
    pub fn new() -> Self {
        Self::default()
    }

    fn handles(&self) -> MutexGuard<'_, HashMap<u64, AbortHandle>> {
        self.in_flight
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Run `fut` until it completes or the scope is cancelled.
    pub async fn run<F, T>(&self, fut: F) -> Result<T, ScopeError>
    where
        F: Future<Output = T>,
    {
        if self.is_cancelled() {
            return Err(ScopeError::Aborted);
        }
        let (handle, registration) = AbortHandle::new_pair();
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.handles().insert(id, handle);
        // Cancellation may have raced the registration above.
        if self.is_cancelled() {
            self.handles().remove(&id);
            return Err(ScopeError::Aborted);
        }
        let result = Abortable::new(fut, registration).await;
        self.handles().remove(&id);
        result.map_err(|_| ScopeError::Aborted)
    }

    pub fn in_flight(&self) -> usize {
        self.handles().len()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Abort everything pending; later `run` calls fail immediately.
    pub fn cancel_all(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        let handles: Vec<AbortHandle> = self.handles().drain().map(|(_, h)| h).collect();
        if !handles.is_empty() {
            debug!(count = handles.len(), "aborting in-flight requests");
        }
        for handle in handles {
            handle.abort();
        }
    }
}

/// Cloneable handle that closes a scope from outside the view, e.g. while a
/// request holds the view borrowed.
#[derive(Debug, Clone)]
pub struct ScopeHandle {
    scope: Arc<ViewScope>,
}

impl ScopeHandle {
    pub fn new(scope: Arc<ViewScope>) -> Self {
        Self { scope }
    }

    pub fn close(&self) {
        self.scope.cancel_all();
    }

    pub fn is_closed(&self) -> bool {
        self.scope.is_cancelled()
    }
}

impl Drop for ViewScope {
    fn drop(&mut self) {
        self.cancel_all();
    }
}
