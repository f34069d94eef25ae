//! Cooperative shutdown flag

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::Notify;

#[derive(Debug, Default)]
struct Inner {
    triggered: AtomicBool,
    notify: Notify,
}

/// Set once by a signal handler; checked by the engine at loop boundaries
#[derive(Debug, Clone, Default)]
pub struct ShutdownFlag {
    inner: Arc<Inner>,
}

impl ShutdownFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request shutdown and wake every waiter
    pub fn trigger(&self) {
        self.inner.triggered.store(true, Ordering::SeqCst);
        self.inner.notify.notify_waiters();
    }

    pub fn is_triggered(&self) -> bool {
        self.inner.triggered.load(Ordering::SeqCst)
    }

    /// Resolve once shutdown has been requested
    pub async fn wait(&self) {
        loop {
            let notified = self.inner.notify.notified();
            if self.is_triggered() {
                return;
            }
            notified.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_wait_returns_after_trigger() {
        let flag = ShutdownFlag::new();
        let waiter = {
            let flag = flag.clone();
            tokio::spawn(async move { flag.wait().await })
        };

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(!flag.is_triggered());
        flag.trigger();

        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_wait_after_trigger_is_immediate() {
        let flag = ShutdownFlag::new();
        flag.trigger();
        flag.wait().await;
        assert!(flag.is_triggered());
    }
}
