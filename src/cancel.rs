//! Cooperative cancellation for the async combinators.
//!
//! Combinators never cancel anything themselves; they consult a
//! [`CancellationSignal`] before running a continuation and race the
//! continuation against it. Cancellation surfaces as a failed outcome whose
//! error has [`ErrorKind::Cancelled`](crate::ErrorKind::Cancelled).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::Notify;

/// Source of a cancellation request.
///
/// Implement this to plug in an existing cancellation mechanism.
#[async_trait::async_trait]
pub trait CancellationSignal: Send + Sync {
    /// Returns `true` once cancellation has been requested.
    fn is_cancelled(&self) -> bool;

    /// Resolve once cancellation has been requested.
    async fn cancelled(&self);
}

#[derive(Debug, Default)]
struct Inner {
    cancelled: AtomicBool,
    notify: Notify,
}

/// Cloneable cancellation token. All clones observe the same request.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    inner: Arc<Inner>,
}

impl CancellationToken {
    /// Create a token that has not been cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation and wake every waiter. Idempotent.
    pub fn cancel(&self) {
        if !self.inner.cancelled.swap(true, Ordering::SeqCst) {
            self.inner.notify.notify_waiters();
        }
    }
}

#[async_trait::async_trait]
impl CancellationSignal for CancellationToken {
    fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    async fn cancelled(&self) {
        loop {
            // Register before checking so a concurrent `cancel` is not missed.
            let notified = self.inner.notify.notified();
            if self.is_cancelled() {
                return;
            }
            notified.await;
        }
    }
}
