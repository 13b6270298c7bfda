//! Cooperative cancellation shared by the pipeline, the hasher and the client

use std::sync::Arc;
use tokio::sync::watch;

/// Cloneable shutdown flag. Once triggered it stays triggered.
#[derive(Debug, Clone)]
pub struct Shutdown {
    sender: Arc<watch::Sender<bool>>,
    receiver: watch::Receiver<bool>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (sender, receiver) = watch::channel(false);
        Self {
            sender: Arc::new(sender),
            receiver,
        }
    }

    /// Request shutdown. Every clone observes it.
    pub fn trigger(&self) {
        self.sender.send_replace(true);
    }

    pub fn is_triggered(&self) -> bool {
        *self.receiver.borrow()
    }

    /// Resolves once shutdown has been requested
    pub async fn triggered(&self) {
        let mut receiver = self.receiver.clone();
        // The sender lives as long as `self`, so this only returns once the flag flips
        let _ = receiver.wait_for(|triggered| *triggered).await;
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_trigger_is_visible_to_clones() {
        let shutdown = Shutdown::new();
        let clone = shutdown.clone();
        assert!(!clone.is_triggered());

        shutdown.trigger();
        assert!(clone.is_triggered());
    }

    #[tokio::test]
    async fn test_triggered_wakes_waiters() {
        let shutdown = Shutdown::new();
        let waiter = {
            let shutdown = shutdown.clone();
            tokio::spawn(async move { shutdown.triggered().await })
        };

        tokio::time::sleep(Duration::from_millis(10)).await;
        shutdown.trigger();

        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter should wake")
            .unwrap();
    }

    #[tokio::test]
    async fn test_triggered_returns_immediately_when_already_set() {
        let shutdown = Shutdown::new();
        shutdown.trigger();
        tokio::time::timeout(Duration::from_millis(50), shutdown.triggered())
            .await
            .expect("already triggered");
    }
}
