//! The cache actor: sole owner of the current entry snapshot.
//!
//! Reads and installs travel over one queue and are handled strictly in
//! order, so an install (replace, then persist) completes before the next
//! read is answered.

mod handle;
mod messages;
mod runner;

use thiserror::Error;
use tokio::sync::mpsc;

use crate::store::{SnapshotStore, StoreError};

pub use handle::CacheHandle;
pub use messages::{CacheMessage, CacheStatus};
pub use runner::CacheActor;

const CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Error)]
pub enum CacheError {
    /// The actor task is no longer running
    #[error("Cache actor is not running")]
    Closed,
    /// The snapshot was installed but could not be persisted
    #[error("Snapshot installed but not persisted: {0}")]
    Persist(#[from] StoreError),
}

/// Starts the cache actor with an empty snapshot and returns its handle.
pub fn spawn(store: SnapshotStore) -> CacheHandle {
    let (sender, receiver) = mpsc::channel(CHANNEL_CAPACITY);
    let actor = CacheActor::new(store, receiver);
    tokio::spawn(actor.run());
    CacheHandle::new(sender)
}
