//! Concurrent filesystem ingestion for dirgraph.
//!
//! This crate turns a stream of path events into directory and file nodes
//! linked by containment edges in a [`GraphStore`].
//!
//! # Overview
//!
//! - **Dispatcher** handles directory events strictly in order and forwards
//!   file events
//! - **Worker pool** creates file nodes and their edges concurrently
//! - **Directory cache** short-circuits repeated path resolution
//! - **Walker** produces pre-ordered events from a real directory tree
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use dirgraph_core::IngestConfig;
//! use dirgraph_ingest::{IngestPipeline, ScanPlan, run_scan};
//! use dirgraph_store::MemoryGraphStore;
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let store = Arc::new(MemoryGraphStore::new());
//! let mut pipeline = IngestPipeline::new(store, IngestConfig::default());
//! pipeline.start();
//!
//! run_scan(&pipeline, &ScanPlan::new("/data")).await?;
//! let counters = pipeline.shutdown().await?;
//! println!("Ingested {} files", counters.files_processed);
//! # Ok(())
//! # }
//! ```

mod cache;
mod error;
mod pipeline;
mod progress;
mod resolver;
mod walker;

pub use cache::DirectoryCache;
pub use error::{IngestError, WalkError};
pub use pipeline::IngestPipeline;
pub use progress::IngestCounters;
pub use resolver::{ensure_directory, ingest_directory, ingest_file, resolve_directory};
pub use walker::{ScanPlan, ScanSummary, ancestor_events, rebase, run_scan, walk_events};

// Re-export core types for convenience
pub use dirgraph_core::{GraphStore, IngestConfig, NodeId, PathEvent};
