//! Core types and traits for dirgraph.
//!
//! This crate provides the data structures shared by every other crate in
//! the workspace: directory and file nodes, containment edges, the
//! [`GraphStore`] contract the ingestion pipeline writes through, and the
//! ingestion configuration.

mod config;
mod error;
mod node;
mod store;

pub use config::{IngestConfig, IngestConfigBuilder};
pub use error::StoreError;
pub use node::{
    Collection, ContainsEdge, DirectoryNode, EdgeId, EntryKind, FileNode, Node, NodeId, PathEvent,
    parent_path,
};
pub use store::{GraphStore, TRAVERSAL_MAX_DEPTH, Traversal};
