//! Shutdown coordination.
//!
//! A latched flag: once triggered it stays triggered, so a task that
//! subscribes late still sees the stop request.

use tokio::sync::watch;

/// Sending half, held by whoever decides the process should stop.
#[derive(Clone)]
pub struct Shutdown {
    tx: watch::Sender<bool>,
}

/// Receiving half, awaited by long-running tasks.
#[derive(Clone)]
pub struct ShutdownSignal {
    rx: watch::Receiver<bool>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx }
    }

    pub fn subscribe(&self) -> ShutdownSignal {
        ShutdownSignal {
            rx: self.tx.subscribe(),
        }
    }

    /// Request shutdown. Idempotent.
    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_triggered(&self) -> bool {
        *self.tx.borrow()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

impl ShutdownSignal {
    /// Resolve once shutdown has been requested, or the coordinator is gone.
    pub async fn recv(mut self) {
        let _ = self.rx.wait_for(|stop| *stop).await;
    }
}
