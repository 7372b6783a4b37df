//! Error types for ingestion.

use std::path::PathBuf;

use dirgraph_core::StoreError;
use thiserror::Error;

/// Failures of the filesystem walk. These abort a scan.
#[derive(Debug, Error)]
pub enum WalkError {
    /// The scan root could not be resolved.
    #[error("Could not stat {path}: {source}")]
    Root {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The scan root is not a directory.
    #[error("Not a directory: {path}")]
    NotADirectory { path: PathBuf },

    /// Reading a directory entry or its metadata failed.
    #[error("Error walking directory: {source}")]
    Entry {
        #[source]
        source: jwalk::Error,
    },

    /// The pipeline stopped accepting events mid-walk.
    #[error("Ingestion pipeline closed while walking {path}")]
    PipelineClosed { path: String },
}

/// Failures while ingesting a single event or driving a scan.
#[derive(Debug, Error)]
pub enum IngestError {
    /// A store call failed for the given path.
    #[error("Store failure at {path}: {source}")]
    Store {
        path: String,
        #[source]
        source: StoreError,
    },

    /// A file event whose path has no parent directory.
    #[error("File has no parent directory: {path}")]
    Orphan { path: String },

    /// The walk failed.
    #[error(transparent)]
    Walk(#[from] WalkError),

    /// A pipeline or scan task panicked or was cancelled.
    #[error("Ingestion task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl IngestError {
    pub(crate) fn store(path: &str, source: StoreError) -> Self {
        Self::Store {
            path: path.to_string(),
            source,
        }
    }
}
