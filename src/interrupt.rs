//! Cooperative cancellation shared between the signal handler and the transfer loop.
//!
//! The binary raises the flag from a `ctrl_c` listener; the transferrer checks
//! it before every chunk and races it against network waits.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::Notify;

/// Cloneable handle to a one-shot interrupt signal.
#[derive(Debug, Clone, Default)]
pub struct InterruptFlag {
    inner: Arc<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    raised: AtomicBool,
    notify: Notify,
}

impl InterruptFlag {
    /// Creates a flag that has not been raised.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Raises the flag and wakes every waiter. Idempotent.
    pub fn raise(&self) {
        self.inner.raised.store(true, Ordering::SeqCst);
        self.inner.notify.notify_waiters();
    }

    /// Returns true once [`raise`](Self::raise) has been called.
    #[must_use]
    pub fn is_raised(&self) -> bool {
        self.inner.raised.load(Ordering::SeqCst)
    }

    /// Completes when the flag is raised (immediately if it already is).
    pub async fn raised(&self) {
        loop {
            // Register before checking so a concurrent raise() can't slip between.
            let notified = self.inner.notify.notified();
            if self.is_raised() {
                return;
            }
            notified.await;
        }
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn test_interrupt_flag_starts_lowered() {
        let flag = InterruptFlag::new();
        assert!(!flag.is_raised());
    }

    #[test]
    fn test_interrupt_flag_clones_share_state() {
        let flag = InterruptFlag::new();
        let handle = flag.clone();
        handle.raise();
        assert!(flag.is_raised());
    }

    #[tokio::test]
    async fn test_raised_completes_immediately_when_already_raised() {
        let flag = InterruptFlag::new();
        flag.raise();
        tokio::time::timeout(Duration::from_secs(1), flag.raised())
            .await
            .expect("raised() should complete");
    }

    #[tokio::test]
    async fn test_raised_wakes_pending_waiter() {
        let flag = InterruptFlag::new();
        let waiter = {
            let flag = flag.clone();
            tokio::spawn(async move { flag.raised().await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        flag.raise();
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter should wake")
            .expect("waiter task should not panic");
    }
}
