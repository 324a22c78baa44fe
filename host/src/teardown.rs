//! Teardown controller for a verification host.
//!
//! Listens for SIGINT/SIGTERM and flips a `watch` flag that every running
//! flow observes. Late subscribers still see the flag once it is set.

use tokio::signal;
use tokio::sync::watch;

/// Coordinates teardown of every flow started by a host.
///
/// Flows take a receiver from [`subscribe`](Self::subscribe). Once
/// [`teardown`](Self::teardown) has been called, every receiver, including
/// ones created afterwards, observes `true`.
pub struct TeardownController {
    tx: watch::Sender<bool>,
}

impl TeardownController {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx }
    }

    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }

    /// Trigger teardown programmatically. Idempotent.
    pub fn teardown(&self) {
        self.tx.send_if_modified(|fired| !std::mem::replace(fired, true));
    }

    pub fn is_torn_down(&self) -> bool {
        *self.tx.borrow()
    }

    /// Wait for SIGTERM or SIGINT, then trigger teardown.
    pub async fn wait_for_signal(&self) {
        let ctrl_c = signal::ctrl_c();

        #[cfg(unix)]
        let terminate = async {
            match signal::unix::signal(signal::unix::SignalKind::terminate()) {
                Ok(mut stream) => {
                    stream.recv().await;
                }
                Err(e) => {
                    tracing::warn!(error = %e, "failed to install SIGTERM handler");
                    std::future::pending::<()>().await;
                }
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => { tracing::info!("received SIGINT, tearing down"); }
            _ = terminate => { tracing::info!("received SIGTERM, tearing down"); }
        }

        self.teardown();
    }
}

impl Default for TeardownController {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn programmatic_teardown_notifies_subscribers() {
        let controller = TeardownController::new();
        let mut rx1 = controller.subscribe();
        let mut rx2 = controller.subscribe();
        controller.teardown();
        assert!(rx1.wait_for(|fired| *fired).await.is_ok());
        assert!(rx2.wait_for(|fired| *fired).await.is_ok());
        assert!(controller.is_torn_down());
    }

    #[tokio::test]
    async fn late_subscriber_sees_teardown() {
        let controller = TeardownController::new();
        controller.teardown();
        let rx = controller.subscribe();
        assert!(*rx.borrow());
    }

    #[test]
    fn teardown_is_idempotent() {
        let controller = TeardownController::new();
        let mut rx = controller.subscribe();
        controller.teardown();
        assert!(rx.has_changed().unwrap());
        rx.borrow_and_update();
        controller.teardown();
        assert!(!rx.has_changed().unwrap());
    }
}
