// src/engine/shutdown.rs
use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;

/// Process-wide stop signal. Cloned into every task; the first reason given wins.
#[derive(Clone, Debug)]
pub struct Shutdown {
    tx: Arc<watch::Sender<Option<String>>>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(None);
        Self { tx: Arc::new(tx) }
    }

    /// Fire the signal. Returns false if it had already fired.
    pub fn trigger(&self, reason: impl Into<String>) -> bool {
        let reason = reason.into();
        let fired = self.tx.send_if_modified(|current| {
            if current.is_some() {
                return false;
            }
            *current = Some(reason.clone());
            true
        });
        if fired {
            info!("Shutting down: {}", reason);
        }
        fired
    }

    pub fn is_triggered(&self) -> bool {
        self.tx.borrow().is_some()
    }

    pub fn reason(&self) -> Option<String> {
        self.tx.borrow().clone()
    }

    /// Resolve once the signal has fired
    pub async fn wait(&self) {
        let mut rx = self.tx.subscribe();
        let _ = rx.wait_for(Option::is_some).await;
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
