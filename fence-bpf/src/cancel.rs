//! Cooperative cancellation.
//!
//! A single [`CancelToken`] is shared by the control loop, the event source
//! and the signal handler. Cancelling wakes every thread parked in
//! [`CancelToken::wait`] or [`CancelToken::wait_timeout`].

use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

#[derive(Debug, Default)]
struct Inner {
    cancelled: Mutex<bool>,
    cond: Condvar,
}

/// Cloneable cancellation signal. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    inner: Arc<Inner>,
}

impl CancelToken {
    /// Create a token in the not-cancelled state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation and wake all waiters. Idempotent.
    pub fn cancel(&self) {
        let mut cancelled = self.lock();
        *cancelled = true;
        self.inner.cond.notify_all();
    }

    /// Returns true once cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        *self.lock()
    }

    /// Block until cancellation is requested.
    pub fn wait(&self) {
        let mut cancelled = self.lock();
        while !*cancelled {
            cancelled = self
                .inner
                .cond
                .wait(cancelled)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Block until cancellation or until `timeout` elapses.
    /// Returns true if the token is cancelled.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let cancelled = self.lock();
        let (cancelled, _) = self
            .inner
            .cond
            .wait_timeout_while(cancelled, timeout, |c| !*c)
            .unwrap_or_else(PoisonError::into_inner);
        *cancelled
    }

    fn lock(&self) -> MutexGuard<'_, bool> {
        self.inner
            .cancelled
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
