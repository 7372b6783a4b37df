//! Ensure-directory and per-event ingestion against the store.
//!
//! These functions are blocking; the pipeline runs them on Tokio's blocking
//! pool. Resolution is not transactional: two callers resolving the same
//! uncached path at once can both miss and both create a node.

use dirgraph_core::{DirectoryNode, FileNode, GraphStore, NodeId, PathEvent};

use crate::cache::DirectoryCache;
use crate::error::IngestError;

/// Resolve a directory by cache, then store lookup. Never creates.
pub fn resolve_directory<S: GraphStore + ?Sized>(
    store: &S,
    cache: &DirectoryCache,
    path: &str,
) -> Result<Option<NodeId>, IngestError> {
    if let Some(id) = cache.get(path) {
        return Ok(Some(id));
    }

    let found = store
        .lookup_directory(path)
        .map_err(|e| IngestError::store(path, e))?;
    if let Some(id) = found {
        cache.insert(path, id);
    }
    Ok(found)
}

/// Resolve a directory by cache, then store lookup, creating it on a miss.
///
/// The result is cached either way. Calling this twice in sequence for the
/// same path returns the same id.
pub fn ensure_directory<S: GraphStore + ?Sized>(
    store: &S,
    cache: &DirectoryCache,
    path: &str,
) -> Result<NodeId, IngestError> {
    if let Some(id) = resolve_directory(store, cache, path)? {
        return Ok(id);
    }

    let id = store
        .create_node(DirectoryNode::new(path).into())
        .map_err(|e| IngestError::store(path, e))?;
    tracing::debug!(path, %id, "created directory");
    cache.insert(path, id);
    Ok(id)
}

/// Handle a directory event: ensure the directory, then link it under its
/// parent if the parent is already known and the edge is new.
///
/// The parent is never created here, so the first directory of a walk ends
/// up without an inbound edge unless its ancestors were ingested first.
pub fn ingest_directory<S: GraphStore + ?Sized>(
    store: &S,
    cache: &DirectoryCache,
    path: &str,
) -> Result<NodeId, IngestError> {
    let id = ensure_directory(store, cache, path)?;

    let Some(parent_path) = dirgraph_core::parent_path(path) else {
        return Ok(id);
    };
    let Some(parent) = resolve_directory(store, cache, parent_path)? else {
        tracing::debug!(path, parent = parent_path, "parent not ingested, skipping edge");
        return Ok(id);
    };

    let exists = store
        .edge_exists(parent, id)
        .map_err(|e| IngestError::store(path, e))?;
    if !exists {
        store
            .create_edge(parent, id)
            .map_err(|e| IngestError::store(path, e))?;
    }
    Ok(id)
}

/// Handle a file event: ensure the parent directory, create the file node and
/// link it. File edges are never deduplicated.
pub fn ingest_file<S: GraphStore + ?Sized>(
    store: &S,
    cache: &DirectoryCache,
    event: &PathEvent,
) -> Result<NodeId, IngestError> {
    let parent_path = event.parent().ok_or_else(|| IngestError::Orphan {
        path: event.path.clone(),
    })?;
    let parent = ensure_directory(store, cache, parent_path)?;

    let file = FileNode::new(event.path.as_str(), event.size, event.modified);
    let id = store
        .create_node(file.into())
        .map_err(|e| IngestError::store(&event.path, e))?;
    store
        .create_edge(parent, id)
        .map_err(|e| IngestError::store(&event.path, e))?;

    tracing::debug!(path = %event.path, %id, size = event.size, "ingested file");
    Ok(id)
}
