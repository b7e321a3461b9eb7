use std::sync::Arc;

use chrono::Utc;
use tokio::sync::mpsc;

use super::messages::{CacheMessage, CacheStatus};
use crate::entry::{Entry, Snapshot};
use crate::store::{SnapshotStore, StoreError};

/// Cache actor main loop
pub struct CacheActor {
    snapshot: Snapshot,
    store: SnapshotStore,
    status: CacheStatus,
    receiver: mpsc::Receiver<CacheMessage>,
}

impl CacheActor {
    pub fn new(store: SnapshotStore, receiver: mpsc::Receiver<CacheMessage>) -> Self {
        Self {
            snapshot: Arc::new(Vec::new()),
            store,
            status: CacheStatus::default(),
            receiver,
        }
    }

    /// Runs until every handle has been dropped.
    pub async fn run(mut self) {
        tracing::info!(path = %self.store.path().display(), "Cache actor started");

        while let Some(msg) = self.receiver.recv().await {
            self.handle_message(msg).await;
        }

        tracing::info!("Cache actor stopped");
    }

    async fn handle_message(&mut self, msg: CacheMessage) {
        match msg {
            CacheMessage::Read { reply } => {
                let _ = reply.send(Arc::clone(&self.snapshot));
            }

            CacheMessage::Install { entries, reply } => {
                let result = self.handle_install(entries).await;
                let _ = reply.send(result);
            }

            CacheMessage::Status { reply } => {
                let _ = reply.send(self.status.clone());
            }
        }
    }

    async fn handle_install(&mut self, entries: Vec<Entry>) -> Result<(), StoreError> {
        self.snapshot = Arc::new(entries);
        self.status.entries = self.snapshot.len();
        self.status.installs += 1;
        self.status.last_install = Some(Utc::now());

        match self.store.save(&self.snapshot).await {
            Ok(()) => {
                if self.status.persist_error.take().is_some() {
                    tracing::info!("Snapshot persistence recovered");
                }
                tracing::info!(entries = self.snapshot.len(), "Installed new snapshot");
                Ok(())
            }
            Err(e) => {
                tracing::error!(
                    error = %e,
                    entries = self.snapshot.len(),
                    "Failed to persist snapshot, serving it from memory only"
                );
                self.status.persist_error = Some(e.to_string());
                Err(e)
            }
        }
    }
}
