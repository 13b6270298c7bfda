//! Bridges core progress reporting to the renderer task

use anisort_core::{ProgressProvider, ProgressUpdate};
use std::sync::Mutex;
use tokio::sync::mpsc;

/// Sends updates to a renderer without ever blocking a worker.
///
/// Updates are dropped when the channel is full; `complete` drops the sender
/// so the renderer loop ends.
pub struct ChannelProvider {
    tx: Mutex<Option<mpsc::Sender<ProgressUpdate>>>,
}

impl ChannelProvider {
    pub fn new(tx: mpsc::Sender<ProgressUpdate>) -> Self {
        Self {
            tx: Mutex::new(Some(tx)),
        }
    }

    fn sender(&self) -> Option<mpsc::Sender<ProgressUpdate>> {
        self.tx.lock().ok().and_then(|guard| guard.clone())
    }
}

impl ProgressProvider for ChannelProvider {
    fn report(&self, update: ProgressUpdate) {
        if let Some(tx) = self.sender() {
            // FileFinished lines matter more than one more bar tick
            if matches!(update, ProgressUpdate::FileFinished { .. }) {
                if let Err(mpsc::error::TrySendError::Full(update)) = tx.try_send(update) {
                    tokio::spawn(async move {
                        let _ = tx.send(update).await;
                    });
                }
            } else {
                let _ = tx.try_send(update);
            }
        }
    }

    fn complete(&self) {
        if let Ok(mut guard) = self.tx.lock() {
            *guard = None;
        }
    }
}

pub fn progress_channel(capacity: usize) -> (ChannelProvider, mpsc::Receiver<ProgressUpdate>) {
    let (tx, rx) = mpsc::channel(capacity);
    (ChannelProvider::new(tx), rx)
}
