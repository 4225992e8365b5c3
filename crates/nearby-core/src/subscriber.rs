//! Change subscription: maps transport-level "something changed" signals to
//! typed refresh requests.
//!
//! The push channel gives no payload guarantees, so the subscriber never
//! interprets a signal beyond "re-fetch"; the engine owns deciding when and
//! how to run the pipeline. Forwarding is non-blocking relative to the
//! transport: if a refresh is already queued, further signals are dropped
//! (the queued run will pick their changes up anyway).

use tokio::sync::mpsc;

/// Backend relations whose changes are pushed to the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeTable {
    Messages,
    Notifications,
    Relationships,
}

/// One viewer-scoped change signal from the push channel. The payload is
/// advisory only and never trusted; every signal triggers a full re-fetch.
#[derive(Debug, Clone)]
pub struct ChangeSignal {
    pub table: ChangeTable,
    pub row_id: Option<String>,
}

/// Typed request the subscriber emits toward the engine.
#[derive(Debug, Clone, Copy)]
pub struct RefreshRequested {
    /// Push-triggered refreshes are always silent: the previous feed stays
    /// visible until the new result replaces it atomically.
    pub silent: bool,
}

pub struct ChangeSubscriber {
    refresh_tx: mpsc::Sender<RefreshRequested>,
}

impl ChangeSubscriber {
    pub fn new(refresh_tx: mpsc::Sender<RefreshRequested>) -> Self {
        Self { refresh_tx }
    }

    /// Handle one pushed signal. Never blocks the delivery mechanism.
    pub fn on_signal(&self, signal: ChangeSignal) {
        tracing::debug!(table = ?signal.table, "change signal received");
        if self
            .refresh_tx
            .try_send(RefreshRequested { silent: true })
            .is_err()
        {
            // Queue full: a refresh is already pending and will observe
            // this change too.
            tracing::debug!("refresh already queued, signal coalesced");
        }
    }

    /// Drains a transport-owned signal stream until it closes.
    pub async fn run(self, mut signal_rx: mpsc::Receiver<ChangeSignal>) {
        while let Some(signal) = signal_rx.recv().await {
            self.on_signal(signal);
        }
        tracing::debug!("change-signal stream closed");
    }
}
