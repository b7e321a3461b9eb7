use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::entry::Entry;

/// Version tag written into every snapshot file.
pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to read snapshot {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to write snapshot {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Snapshot {} is corrupt: {source}", path.display())]
    Corrupt {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("Snapshot {} has unsupported format version {found}", path.display())]
    UnsupportedVersion { path: PathBuf, found: u32 },
    #[error("Failed to encode snapshot: {0}")]
    Encode(#[source] serde_json::Error),
}

#[derive(Serialize)]
struct SnapshotFileRef<'a> {
    version: u32,
    entries: &'a [Entry],
}

#[derive(Deserialize)]
struct SnapshotFile {
    entries: Vec<Entry>,
}

#[derive(Deserialize)]
struct VersionProbe {
    version: u32,
}

/// Single-file JSON persistence for the aggregated entry set.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replaces the file contents with `entries`. The data is written to a
    /// sibling temporary file first and renamed over the target.
    pub async fn save(&self, entries: &[Entry]) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec(&SnapshotFileRef {
            version: FORMAT_VERSION,
            entries,
        })
        .map_err(StoreError::Encode)?;

        let temp_path = self.temp_path();
        tokio::fs::write(&temp_path, &bytes)
            .await
            .map_err(|source| StoreError::Write {
                path: temp_path.clone(),
                source,
            })?;

        if let Err(source) = tokio::fs::rename(&temp_path, &self.path).await {
            let _ = tokio::fs::remove_file(&temp_path).await;
            return Err(StoreError::Write {
                path: self.path.clone(),
                source,
            });
        }

        debug!(
            path = %self.path.display(),
            entries = entries.len(),
            "Snapshot saved"
        );
        Ok(())
    }

    /// Reads the persisted snapshot. A missing file is `Ok(None)`.
    pub async fn load(&self) -> Result<Option<Vec<Entry>>, StoreError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(StoreError::Read {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        let probe: VersionProbe =
            serde_json::from_slice(&bytes).map_err(|source| self.corrupt(source))?;
        if probe.version != FORMAT_VERSION {
            return Err(StoreError::UnsupportedVersion {
                path: self.path.clone(),
                found: probe.version,
            });
        }

        let file: SnapshotFile =
            serde_json::from_slice(&bytes).map_err(|source| self.corrupt(source))?;
        debug!(
            path = %self.path.display(),
            entries = file.entries.len(),
            "Snapshot loaded"
        );
        Ok(Some(file.entries))
    }

    fn corrupt(&self, source: serde_json::Error) -> StoreError {
        StoreError::Corrupt {
            path: self.path.clone(),
            source,
        }
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_else(|| "snapshot".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}
