//! Subscription scopes.
//!
//! A scope ties subscriptions to the lifetime of some consumer context, a
//! view or a session for example. When the scope terminates, every
//! subscription bound to it is removed. A scope may also ask to be told
//! after each delivery, so it can schedule a refresh.

use std::fmt;
use std::sync::{Mutex, PoisonError};

/// Callback run once when a scope terminates.
pub type TerminateHook = Box<dyn FnOnce() + Send + 'static>;

/// A consumer lifetime that subscriptions can be bound to.
pub trait Scope: Send + Sync {
    /// Register a hook to run when the scope terminates.
    ///
    /// If the scope has already terminated the hook runs immediately.
    fn on_terminate(&self, hook: TerminateHook);

    /// Called after a bound subscriber has handled a message.
    fn after_dispatch(&self) {}
}

/// Ready-made [`Scope`] that terminates explicitly or when dropped.
pub struct Lifetime {
    /// `None` once terminated.
    hooks: Mutex<Option<Vec<TerminateHook>>>,
    refresh: Option<Box<dyn Fn() + Send + Sync>>,
}

impl Lifetime {
    /// Create a live scope with no refresh hook.
    #[must_use]
    pub fn new() -> Self {
        Self {
            hooks: Mutex::new(Some(Vec::new())),
            refresh: None,
        }
    }

    /// Create a live scope that runs `refresh` after every bound delivery.
    #[must_use]
    pub fn with_refresh<F>(refresh: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        Self {
            hooks: Mutex::new(Some(Vec::new())),
            refresh: Some(Box::new(refresh)),
        }
    }

    /// Terminate the scope, running every registered hook once.
    ///
    /// Later calls do nothing.
    pub fn terminate(&self) {
        let hooks = self
            .hooks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        for hook in hooks.into_iter().flatten() {
            hook();
        }
    }

    /// Check if the scope has terminated.
    #[must_use]
    pub fn is_terminated(&self) -> bool {
        self.hooks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }
}

impl Default for Lifetime {
    fn default() -> Self {
        Self::new()
    }
}

impl Scope for Lifetime {
    fn on_terminate(&self, hook: TerminateHook) {
        let mut hooks = self.hooks.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(pending) = hooks.as_mut() {
            pending.push(hook);
            return;
        }
        drop(hooks);
        hook();
    }

    fn after_dispatch(&self) {
        if let Some(refresh) = &self.refresh {
            refresh();
        }
    }
}

impl Drop for Lifetime {
    fn drop(&mut self) {
        self.terminate();
    }
}

impl fmt::Debug for Lifetime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lifetime")
            .field("terminated", &self.is_terminated())
            .field("refresh", &self.refresh.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn counting_hook(counter: &Arc<AtomicUsize>) -> TerminateHook {
        let counter = Arc::clone(counter);
        Box::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn test_terminate_runs_hooks_once() {
        let runs = Arc::new(AtomicUsize::new(0));
        let scope = Lifetime::new();
        scope.on_terminate(counting_hook(&runs));
        scope.on_terminate(counting_hook(&runs));

        scope.terminate();
        scope.terminate();
        assert_eq!(runs.load(Ordering::SeqCst), 2);
        assert!(scope.is_terminated());
    }

    #[test]
    fn test_hook_after_termination_runs_immediately() {
        let runs = Arc::new(AtomicUsize::new(0));
        let scope = Lifetime::new();
        scope.terminate();

        scope.on_terminate(counting_hook(&runs));
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_drop_terminates() {
        let runs = Arc::new(AtomicUsize::new(0));
        {
            let scope = Lifetime::new();
            scope.on_terminate(counting_hook(&runs));
        }
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_refresh_hook() {
        let refreshes = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&refreshes);
        let scope = Lifetime::with_refresh(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        scope.after_dispatch();
        scope.after_dispatch();
        assert_eq!(refreshes.load(Ordering::SeqCst), 2);

        Lifetime::new().after_dispatch();
    }
}
