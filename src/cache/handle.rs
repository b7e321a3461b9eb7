use tokio::sync::{mpsc, oneshot};

use super::messages::{CacheMessage, CacheStatus};
use super::CacheError;
use crate::entry::{Entry, Snapshot};

/// Cloneable front end of the cache actor.
#[derive(Clone)]
pub struct CacheHandle {
    sender: mpsc::Sender<CacheMessage>,
}

impl CacheHandle {
    pub fn new(sender: mpsc::Sender<CacheMessage>) -> Self {
        Self { sender }
    }

    /// The snapshot installed at the time the actor handles this request.
    pub async fn snapshot(&self) -> Result<Snapshot, CacheError> {
        let (reply, rx) = oneshot::channel();
        self.sender
            .send(CacheMessage::Read { reply })
            .await
            .map_err(|_| CacheError::Closed)?;
        rx.await.map_err(|_| CacheError::Closed)
    }

    /// Installs `entries` as the new snapshot and waits until the actor has
    /// tried to persist it.
    ///
    /// On [`CacheError::Persist`] the new snapshot is still being served.
    pub async fn install(&self, entries: Vec<Entry>) -> Result<(), CacheError> {
        let (reply, rx) = oneshot::channel();
        self.sender
            .send(CacheMessage::Install { entries, reply })
            .await
            .map_err(|_| CacheError::Closed)?;
        rx.await.map_err(|_| CacheError::Closed)??;
        Ok(())
    }

    pub async fn status(&self) -> Result<CacheStatus, CacheError> {
        let (reply, rx) = oneshot::channel();
        self.sender
            .send(CacheMessage::Status { reply })
            .await
            .map_err(|_| CacheError::Closed)?;
        rx.await.map_err(|_| CacheError::Closed)
    }
}
