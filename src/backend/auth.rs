//! Auth-state listeners with explicit unsubscribe handles.
use super::Session;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthEvent {
    SignedIn,
    SignedOut,
    TokenRefreshed,
}

pub type AuthHandler = Box<dyn Fn(AuthEvent, Option<&Session>) + Send + Sync>;

type Handlers = BTreeMap<u64, Arc<AuthHandler>>;

#[derive(Default)]
struct Registry {
    next_id: u64,
    handlers: Handlers,
}

/// Listener registry shared by a backend client and its handles.
#[derive(Clone, Default)]
pub struct AuthListeners {
    inner: Arc<Mutex<Registry>>,
}

impl std::fmt::Debug for AuthListeners {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthListeners")
            .field("count", &self.len())
            .finish()
    }
}

// A panicking handler must not take the registry down with it.
fn lock(registry: &Mutex<Registry>) -> MutexGuard<'_, Registry> {
    registry.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl AuthListeners {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, handler: AuthHandler) -> Unsubscribe {
        let mut registry = lock(&self.inner);
        let id = registry.next_id;
        registry.next_id += 1;
        registry.handlers.insert(id, Arc::new(handler));
        Unsubscribe {
            registry: Arc::downgrade(&self.inner),
            id,
        }
    }

    /// Call every handler in subscription order. Handlers run outside the lock,
    /// so they may subscribe or unsubscribe.
    pub fn emit(&self, event: AuthEvent, session: Option<&Session>) {
        let handlers: Vec<Arc<AuthHandler>> = lock(&self.inner).handlers.values().cloned().collect();
        debug!(?event, listeners = handlers.len(), "auth state change");
        for handler in handlers {
            (handler.as_ref())(event, session);
        }
    }

    pub fn len(&self) -> usize {
        lock(&self.inner).handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Handle returned by `on_auth_state_change`. Dropping it keeps the listener.
#[must_use = "call unsubscribe() to remove the listener"]
#[derive(Debug)]
pub struct Unsubscribe {
    registry: Weak<Mutex<Registry>>,
    id: u64,
}

impl Unsubscribe {
    /// Remove the listener. Returns false if it was already gone.
    pub fn unsubscribe(self) -> bool {
        match self.registry.upgrade() {
            Some(registry) => lock(&registry).handlers.remove(&self.id).is_some(),
            None => false,
        }
    }
}
