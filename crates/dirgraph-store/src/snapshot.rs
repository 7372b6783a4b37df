//! JSON snapshot persistence for [`MemoryGraphStore`].

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use dirgraph_core::StoreError;

use crate::memory::{GraphState, MemoryGraphStore};

/// Current snapshot format version.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Errors that can occur while loading or saving a snapshot.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// I/O failure on the snapshot file.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The snapshot could not be encoded or decoded.
    #[error("Invalid snapshot {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The snapshot was written by an incompatible version.
    #[error("Unsupported snapshot version {found} (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },

    /// The store could not be read.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl SnapshotError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    fn json(path: &Path, source: serde_json::Error) -> Self {
        Self::Json {
            path: path.to_path_buf(),
            source,
        }
    }
}

#[derive(Serialize, Deserialize)]
struct Snapshot {
    version: u32,
    graph: GraphState,
}

impl MemoryGraphStore {
    /// Load a store from a snapshot file.
    ///
    /// A missing file yields an empty store, so the first scan against a
    /// new snapshot path needs no setup step.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SnapshotError> {
        let path = path.as_ref();
        let file = match File::open(path) {
            Ok(file) => file,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "no snapshot found, starting empty");
                return Ok(Self::new());
            }
            Err(err) => return Err(SnapshotError::io(path, err)),
        };

        let snapshot: Snapshot = serde_json::from_reader(BufReader::new(file))
            .map_err(|e| SnapshotError::json(path, e))?;
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(SnapshotError::UnsupportedVersion {
                found: snapshot.version,
                expected: SNAPSHOT_VERSION,
            });
        }

        let store = Self::from_state(snapshot.graph);
        let counts = store.counts()?;
        tracing::debug!(path = %path.display(), ?counts, "loaded snapshot");
        Ok(store)
    }

    /// Write the store to a snapshot file.
    ///
    /// The snapshot is written next to the target and renamed into place.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), SnapshotError> {
        let path = path.as_ref();
        let snapshot = Snapshot {
            version: SNAPSHOT_VERSION,
            graph: self.snapshot_state()?,
        };

        let tmp_path = path.with_extension("tmp");
        let file = File::create(&tmp_path).map_err(|e| SnapshotError::io(&tmp_path, e))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer(&mut writer, &snapshot).map_err(|e| SnapshotError::json(path, e))?;
        writer.flush().map_err(|e| SnapshotError::io(&tmp_path, e))?;
        drop(writer);

        fs::rename(&tmp_path, path).map_err(|e| SnapshotError::io(path, e))?;
        tracing::debug!(path = %path.display(), "saved snapshot");
        Ok(())
    }
}
