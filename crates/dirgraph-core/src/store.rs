//! The graph store contract.

use crate::error::StoreError;
use crate::node::{Collection, EdgeId, Node, NodeId};

/// Depth limit used for subtree traversals.
pub const TRAVERSAL_MAX_DEPTH: u32 = 10_000;

/// Lazy sequence of nodes produced by [`GraphStore::traverse`].
pub type Traversal<'a> = Box<dyn Iterator<Item = Result<(NodeId, Node), StoreError>> + Send + 'a>;

/// Operations the ingestion pipeline and categorization runs need from a
/// graph-shaped document store.
///
/// All calls are blocking and may wait on I/O. Implementations must be safe
/// to share between the dispatcher and every worker.
pub trait GraphStore: Send + Sync {
    /// Create a node and return its new id.
    fn create_node(&self, node: Node) -> Result<NodeId, StoreError>;

    /// Look a node up by its natural key (the path).
    ///
    /// Returns `Ok(None)` when no such node exists.
    fn lookup_node(
        &self,
        collection: Collection,
        key: &str,
    ) -> Result<Option<(Node, NodeId)>, StoreError>;

    /// Create a directed containment edge. No implicit deduplication.
    fn create_edge(&self, from: NodeId, to: NodeId) -> Result<EdgeId, StoreError>;

    /// Check whether an edge `from -> to` exists.
    fn edge_exists(&self, from: NodeId, to: NodeId) -> Result<bool, StoreError>;

    /// Remove every document of a collection. Returns how many were removed.
    fn truncate(&self, collection: Collection) -> Result<u64, StoreError>;

    /// Walk outbound containment edges from `start`, yielding every reachable
    /// node (including `start` itself at depth 0) whose collection matches
    /// `filter`, down to `max_depth`.
    fn traverse(
        &self,
        start: NodeId,
        filter: Option<Collection>,
        max_depth: u32,
    ) -> Result<Traversal<'_>, StoreError>;

    /// Remove a node and every edge touching it.
    ///
    /// Returns `false` if the node did not exist.
    fn remove_node(&self, id: NodeId) -> Result<bool, StoreError>;

    /// Look up a directory id by path.
    fn lookup_directory(&self, path: &str) -> Result<Option<NodeId>, StoreError> {
        Ok(self
            .lookup_node(Collection::Directories, path)?
            .map(|(_, id)| id))
    }
}
