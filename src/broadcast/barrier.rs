//! Join barrier for in-flight write tasks
//!
//! Every spawned write task holds a [`BarrierGuard`]. [`WriteBarrier::wait`]
//! resolves once no guards remain.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::Notify;

/// Counting barrier that tracks in-flight tasks
#[derive(Debug, Clone, Default)]
pub(crate) struct WriteBarrier {
    inner: Arc<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    count: AtomicUsize,
    drained: Notify,
}

/// Held by a task for as long as it is in flight
///
/// Dropping the guard (including during a panic unwind) releases the slot.
#[derive(Debug)]
pub(crate) struct BarrierGuard {
    inner: Arc<Inner>,
}

impl WriteBarrier {
    /// Create an empty barrier
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a task, must be called before the task is spawned
    pub fn enter(&self) -> BarrierGuard {
        self.inner.count.fetch_add(1, Ordering::AcqRel);
        BarrierGuard {
            inner: Arc::clone(&self.inner),
        }
    }

    /// Number of tasks currently holding a guard
    pub fn in_flight(&self) -> usize {
        self.inner.count.load(Ordering::Acquire)
    }

    /// Wait until every guard has been dropped
    ///
    /// Returns immediately if nothing is in flight. There is no timeout.
    pub async fn wait(&self) {
        loop {
            let notified = self.inner.drained.notified();
            tokio::pin!(notified);

            // Register interest before checking so a concurrent drop can't be missed
            notified.as_mut().enable();

            if self.inner.count.load(Ordering::Acquire) == 0 {
                return;
            }

            notified.await;
        }
    }
}

impl Drop for BarrierGuard {
    fn drop(&mut self) {
        if self.inner.count.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.inner.drained.notify_waiters();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn test_wait_when_empty() {
        let barrier = WriteBarrier::new();

        tokio::time::timeout(Duration::from_millis(100), barrier.wait())
            .await
            .expect("wait on an empty barrier should return immediately");
    }

    #[tokio::test]
    async fn test_wait_for_guards() {
        let barrier = WriteBarrier::new();
        let first = barrier.enter();
        let second = barrier.enter();
        assert_eq!(barrier.in_flight(), 2);

        let waiter = {
            let barrier = barrier.clone();
            tokio::spawn(async move { barrier.wait().await })
        };

        drop(first);
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());
        assert_eq!(barrier.in_flight(), 1);

        drop(second);
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter should finish once all guards are dropped")
            .unwrap();
        assert_eq!(barrier.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_guard_released_on_panic() {
        let barrier = WriteBarrier::new();
        let guard = barrier.enter();

        let task = tokio::spawn(async move {
            let _guard = guard;
            panic!("write task panicked");
        });
        assert!(task.await.is_err());

        assert_eq!(barrier.in_flight(), 0);
        barrier.wait().await;
    }

    #[tokio::test]
    async fn test_multiple_waiters() {
        let barrier = WriteBarrier::new();
        let guard = barrier.enter();

        let waiters: Vec<_> = (0..3)
            .map(|_| {
                let barrier = barrier.clone();
                tokio::spawn(async move { barrier.wait().await })
            })
            .collect();

        tokio::task::yield_now().await;
        drop(guard);

        for waiter in waiters {
            tokio::time::timeout(Duration::from_secs(1), waiter)
                .await
                .unwrap()
                .unwrap();
        }
    }
}
