//! One-shot countdown join barrier.
//!
//! A barrier is created for a fixed number of independent producers. Each
//! producer calls [`JoinBarrier::signal`] once it is done; when the count
//! reaches the target the barrier fires, running the registered callback
//! exactly once and waking every [`JoinBarrier::wait`]er. Arrival order does
//! not matter and producers may run on any thread.
//!
//! Registering a callback after the barrier fired runs it immediately.

use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::watch;

type Callback = Box<dyn FnOnce() + Send + 'static>;

struct Inner {
    count: usize,
    fired: bool,
    callback: Option<Callback>,
}

pub struct JoinBarrier {
    target: usize,
    inner: Mutex<Inner>,
    fired_tx: watch::Sender<bool>,
}

#[derive(Debug, thiserror::Error)]
#[error("Join barrier timed out with {received} of {target} signals")]
pub struct BarrierTimeout {
    pub received: usize,
    pub target: usize,
}

impl JoinBarrier {
    /// A barrier waiting for `target` signals. A target of zero starts fired.
    #[must_use]
    pub fn new(target: usize) -> Self {
        let fired = target == 0;
        let (fired_tx, _) = watch::channel(fired);
        Self {
            target,
            inner: Mutex::new(Inner {
                count: 0,
                fired,
                callback: None,
            }),
            fired_tx,
        }
    }

    // A panicking callback runs outside the lock, so poisoning only means a
    // producer panicked mid-increment; the counter is still consistent.
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Record one completion. Fires the barrier on the signal that reaches the
    /// target; later signals only bump the count.
    pub fn signal(&self) {
        let callback = {
            let mut inner = self.lock();
            inner.count += 1;
            if inner.fired || inner.count < self.target {
                return;
            }
            inner.fired = true;
            inner.callback.take()
        };

        tracing::trace!(target_count = self.target, "join_barrier_fired");
        self.fired_tx.send_replace(true);
        if let Some(cb) = callback {
            cb();
        }
    }

    /// Register the completion callback.
    ///
    /// While pending, a new registration replaces the previous one. Once
    /// fired, the callback runs immediately on the caller's thread.
    pub fn on_complete<F>(&self, callback: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let mut inner = self.lock();
        if inner.fired {
            drop(inner);
            callback();
        } else {
            inner.callback = Some(Box::new(callback));
        }
    }

    /// Resolve once the barrier has fired.
    pub async fn wait(&self) {
        let mut rx = self.fired_tx.subscribe();
        // The sender lives in `self`, so the channel cannot close while we wait.
        let _ = rx.wait_for(|fired| *fired).await;
    }

    /// [`wait`](Self::wait) bounded by `timeout`.
    ///
    /// # Errors
    ///
    /// Returns `BarrierTimeout` if the target was not reached in time.
    pub async fn wait_timeout(&self, timeout: Duration) -> Result<(), BarrierTimeout> {
        tokio::time::timeout(timeout, self.wait())
            .await
            .map_err(|_| BarrierTimeout {
                received: self.count(),
                target: self.target,
            })
    }

    #[must_use]
    pub fn count(&self) -> usize {
        self.lock().count
    }

    #[must_use]
    pub fn target(&self) -> usize {
        self.target
    }

    #[must_use]
    pub fn is_fired(&self) -> bool {
        self.lock().fired
    }
}

impl std::fmt::Debug for JoinBarrier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.lock();
        f.debug_struct("JoinBarrier")
            .field("target", &self.target)
            .field("count", &inner.count)
            .field("fired", &inner.fired)
            .finish_non_exhaustive()
    }
}
