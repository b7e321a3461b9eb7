use chrono::{DateTime, Utc};
use tokio::sync::oneshot;

use crate::entry::{Entry, Snapshot};
use crate::store::StoreError;

/// Messages accepted by the cache actor
pub enum CacheMessage {
    /// Hand out the current snapshot
    Read { reply: oneshot::Sender<Snapshot> },

    /// Replace the snapshot, then persist it
    Install {
        entries: Vec<Entry>,
        reply: oneshot::Sender<Result<(), StoreError>>,
    },

    /// Report counters and the persistence state
    Status { reply: oneshot::Sender<CacheStatus> },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStatus {
    /// Number of entries in the current snapshot
    pub entries: usize,
    /// Installs handled since startup
    pub installs: u64,
    pub last_install: Option<DateTime<Utc>>,
    /// Error of the most recent failed save, cleared by the next good one
    pub persist_error: Option<String>,
}

impl CacheStatus {
    pub fn is_degraded(&self) -> bool {
        self.persist_error.is_some()
    }
}
