//! In-memory graph store.

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::sync::RwLock;

use serde::{Deserialize, Serialize};

use dirgraph_core::{
    Collection, ContainsEdge, DirectoryNode, EdgeId, FileNode, GraphStore, Node, NodeId,
    StoreError, Traversal,
};

/// Number of documents per collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreCounts {
    /// Directory nodes.
    pub directories: u64,
    /// File nodes.
    pub files: u64,
    /// Containment edges.
    pub edges: u64,
}

/// Persistent part of the graph plus derived lookup indexes.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub(crate) struct GraphState {
    next_key: u64,
    directories: BTreeMap<u64, DirectoryNode>,
    files: BTreeMap<u64, FileNode>,
    edges: BTreeMap<u64, ContainsEdge>,

    /// Path to the first directory created with that path.
    #[serde(skip)]
    directory_index: HashMap<String, u64>,
    #[serde(skip)]
    outbound: HashMap<NodeId, Vec<u64>>,
    #[serde(skip)]
    inbound: HashMap<NodeId, Vec<u64>>,
}

impl GraphState {
    fn allocate_key(&mut self) -> u64 {
        self.next_key += 1;
        self.next_key
    }

    fn contains(&self, id: NodeId) -> bool {
        match id.collection {
            Collection::Directories => self.directories.contains_key(&id.key),
            Collection::Files => self.files.contains_key(&id.key),
            Collection::Edges => false,
        }
    }

    fn node(&self, id: NodeId) -> Option<Node> {
        match id.collection {
            Collection::Directories => self.directories.get(&id.key).cloned().map(Node::from),
            Collection::Files => self.files.get(&id.key).cloned().map(Node::from),
            Collection::Edges => None,
        }
    }

    fn children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.outbound
            .get(&id)
            .into_iter()
            .flatten()
            .filter_map(|key| self.edges.get(key))
            .map(|edge| edge.to)
    }

    fn unlink_edge(&mut self, key: u64) {
        if let Some(edge) = self.edges.remove(&key) {
            if let Some(keys) = self.outbound.get_mut(&edge.from) {
                keys.retain(|k| *k != key);
            }
            if let Some(keys) = self.inbound.get_mut(&edge.to) {
                keys.retain(|k| *k != key);
            }
        }
    }

    /// Rebuild the lookup indexes after loading a snapshot.
    pub(crate) fn rebuild_indexes(&mut self) {
        self.directory_index.clear();
        self.outbound.clear();
        self.inbound.clear();

        for (key, dir) in &self.directories {
            self.directory_index.entry(dir.path.clone()).or_insert(*key);
        }
        for (key, edge) in &self.edges {
            self.outbound.entry(edge.from).or_default().push(*key);
            self.inbound.entry(edge.to).or_default().push(*key);
        }

        let highest = [
            self.directories.keys().next_back(),
            self.files.keys().next_back(),
            self.edges.keys().next_back(),
        ]
        .into_iter()
        .flatten()
        .copied()
        .max()
        .unwrap_or(0);
        self.next_key = self.next_key.max(highest);
    }
}

/// Graph store holding every collection in memory.
///
/// Directory lookups go through a path index; when duplicate directory
/// nodes exist for one path, lookups resolve to the oldest. File lookups
/// scan the file collection.
#[derive(Debug, Default)]
pub struct MemoryGraphStore {
    state: RwLock<GraphState>,
}

impl MemoryGraphStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_state(mut state: GraphState) -> Self {
        state.rebuild_indexes();
        Self {
            state: RwLock::new(state),
        }
    }

    pub(crate) fn snapshot_state(&self) -> Result<GraphState, StoreError> {
        Ok(self.state.read()?.clone())
    }

    /// Number of documents in each collection.
    pub fn counts(&self) -> Result<StoreCounts, StoreError> {
        let state = self.state.read()?;
        Ok(StoreCounts {
            directories: state.directories.len() as u64,
            files: state.files.len() as u64,
            edges: state.edges.len() as u64,
        })
    }

    /// Direct children of a node, one entry per outbound edge.
    pub fn children(&self, id: NodeId) -> Result<Vec<NodeId>, StoreError> {
        let state = self.state.read()?;
        Ok(state.children(id).collect())
    }

    /// Number of directory nodes recorded for a path.
    pub fn directories_with_path(&self, path: &str) -> Result<usize, StoreError> {
        let state = self.state.read()?;
        Ok(state.directories.values().filter(|d| d.path == path).count())
    }
}

impl GraphStore for MemoryGraphStore {
    fn create_node(&self, node: Node) -> Result<NodeId, StoreError> {
        let mut state = self.state.write()?;
        let key = state.allocate_key();
        match node {
            Node::Directory(dir) => {
                state.directory_index.entry(dir.path.clone()).or_insert(key);
                state.directories.insert(key, dir);
                Ok(NodeId::directory(key))
            }
            Node::File(file) => {
                state.files.insert(key, file);
                Ok(NodeId::file(key))
            }
        }
    }

    fn lookup_node(
        &self,
        collection: Collection,
        key: &str,
    ) -> Result<Option<(Node, NodeId)>, StoreError> {
        let state = self.state.read()?;
        let found = match collection {
            Collection::Directories => state.directory_index.get(key).and_then(|k| {
                state
                    .directories
                    .get(k)
                    .map(|dir| (Node::from(dir.clone()), NodeId::directory(*k)))
            }),
            Collection::Files => state
                .files
                .iter()
                .find(|(_, file)| file.path == key)
                .map(|(k, file)| (Node::from(file.clone()), NodeId::file(*k))),
            Collection::Edges => None,
        };
        Ok(found)
    }

    fn create_edge(&self, from: NodeId, to: NodeId) -> Result<EdgeId, StoreError> {
        let mut state = self.state.write()?;
        if !from.is_directory() {
            return Err(StoreError::WrongCollection {
                id: from,
                expected: Collection::Directories,
            });
        }
        for id in [from, to] {
            if !state.contains(id) {
                return Err(StoreError::UnknownNode { id });
            }
        }

        let key = state.allocate_key();
        state.edges.insert(key, ContainsEdge::new(from, to));
        state.outbound.entry(from).or_default().push(key);
        state.inbound.entry(to).or_default().push(key);
        Ok(EdgeId(key))
    }

    fn edge_exists(&self, from: NodeId, to: NodeId) -> Result<bool, StoreError> {
        let state = self.state.read()?;
        let exists = state.children(from).any(|child| child == to);
        Ok(exists)
    }

    fn truncate(&self, collection: Collection) -> Result<u64, StoreError> {
        let mut state = self.state.write()?;
        let removed = match collection {
            Collection::Directories => {
                state.directory_index.clear();
                std::mem::take(&mut state.directories).len()
            }
            Collection::Files => std::mem::take(&mut state.files).len(),
            Collection::Edges => {
                state.outbound.clear();
                state.inbound.clear();
                std::mem::take(&mut state.edges).len()
            }
        };
        tracing::debug!(collection = %collection, removed, "truncated collection");
        Ok(removed as u64)
    }

    fn traverse(
        &self,
        start: NodeId,
        filter: Option<Collection>,
        max_depth: u32,
    ) -> Result<Traversal<'_>, StoreError> {
        if !self.state.read()?.contains(start) {
            return Err(StoreError::UnknownNode { id: start });
        }
        Ok(Box::new(MemoryTraversal {
            store: self,
            queue: VecDeque::from([(start, 0)]),
            visited: HashSet::from([start]),
            filter,
            max_depth,
            done: false,
        }))
    }

    fn remove_node(&self, id: NodeId) -> Result<bool, StoreError> {
        let mut state = self.state.write()?;
        let existed = match id.collection {
            Collection::Directories => match state.directories.remove(&id.key) {
                Some(dir) => {
                    if state.directory_index.get(&dir.path) == Some(&id.key) {
                        state.directory_index.remove(&dir.path);
                        let replacement = state
                            .directories
                            .iter()
                            .find(|(_, other)| other.path == dir.path)
                            .map(|(k, _)| *k);
                        if let Some(k) = replacement {
                            state.directory_index.insert(dir.path, k);
                        }
                    }
                    true
                }
                None => false,
            },
            Collection::Files => state.files.remove(&id.key).is_some(),
            Collection::Edges => false,
        };

        let touching: Vec<u64> = state
            .outbound
            .remove(&id)
            .into_iter()
            .chain(state.inbound.remove(&id))
            .flatten()
            .collect();
        for key in touching {
            state.unlink_edge(key);
        }

        Ok(existed)
    }
}

/// Breadth-first walk over outbound edges.
///
/// The read lock is taken per step, so writers are never blocked for the
/// length of a traversal.
struct MemoryTraversal<'a> {
    store: &'a MemoryGraphStore,
    queue: VecDeque<(NodeId, u32)>,
    visited: HashSet<NodeId>,
    filter: Option<Collection>,
    max_depth: u32,
    done: bool,
}

impl Iterator for MemoryTraversal<'_> {
    type Item = Result<(NodeId, Node), StoreError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        loop {
            let (id, depth) = self.queue.pop_front()?;

            let state = match self.store.state.read() {
                Ok(state) => state,
                Err(_) => {
                    self.done = true;
                    return Some(Err(StoreError::Poisoned));
                }
            };

            // Dangling edge left behind by a truncate.
            let Some(node) = state.node(id) else {
                continue;
            };

            if depth < self.max_depth {
                for child in state.children(id) {
                    if self.visited.insert(child) {
                        self.queue.push_back((child, depth + 1));
                    }
                }
            }
            drop(state);

            if self.filter.is_none_or(|c| c == id.collection) {
                return Some(Ok((id, node)));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn dir(store: &MemoryGraphStore, path: &str) -> NodeId {
        store.create_node(DirectoryNode::new(path).into()).unwrap()
    }

    fn file(store: &MemoryGraphStore, path: &str, size: u64) -> NodeId {
        store
            .create_node(FileNode::new(path, size, Utc::now()).into())
            .unwrap()
    }

    #[test]
    fn test_create_and_lookup_directory() {
        let store = MemoryGraphStore::new();
        let id = dir(&store, "/data");

        let (node, found) = store
            .lookup_node(Collection::Directories, "/data")
            .unwrap()
            .unwrap();
        assert_eq!(found, id);
        assert_eq!(node.path(), "/data");
        assert!(store.lookup_directory("/missing").unwrap().is_none());
    }

    #[test]
    fn test_duplicate_directories_resolve_to_oldest() {
        let store = MemoryGraphStore::new();
        let first = dir(&store, "/data");
        let _second = dir(&store, "/data");

        assert_eq!(store.directories_with_path("/data").unwrap(), 2);
        assert_eq!(store.lookup_directory("/data").unwrap(), Some(first));
    }

    #[test]
    fn test_edges_are_not_deduplicated() {
        let store = MemoryGraphStore::new();
        let a = dir(&store, "/a");
        let b = dir(&store, "/a/b");

        assert!(!store.edge_exists(a, b).unwrap());
        store.create_edge(a, b).unwrap();
        store.create_edge(a, b).unwrap();
        assert!(store.edge_exists(a, b).unwrap());
        assert_eq!(store.children(a).unwrap().len(), 2);
    }

    #[test]
    fn test_edge_from_file_rejected() {
        let store = MemoryGraphStore::new();
        let a = dir(&store, "/a");
        let f = file(&store, "/a/f", 1);

        let err = store.create_edge(f, a).unwrap_err();
        assert!(matches!(err, StoreError::WrongCollection { .. }));

        let err = store.create_edge(a, NodeId::file(999)).unwrap_err();
        assert!(matches!(err, StoreError::UnknownNode { .. }));
    }

    #[test]
    fn test_traverse_filters_and_depth() {
        let store = MemoryGraphStore::new();
        let root = dir(&store, "/r");
        let sub = dir(&store, "/r/s");
        let f1 = file(&store, "/r/f1", 1);
        let f2 = file(&store, "/r/s/f2", 2);
        store.create_edge(root, sub).unwrap();
        store.create_edge(root, f1).unwrap();
        store.create_edge(sub, f2).unwrap();

        let files: Vec<NodeId> = store
            .traverse(root, Some(Collection::Files), 10)
            .unwrap()
            .map(|r| r.unwrap().0)
            .collect();
        assert_eq!(files, vec![f1, f2]);

        let shallow: Vec<NodeId> = store
            .traverse(root, None, 1)
            .unwrap()
            .map(|r| r.unwrap().0)
            .collect();
        assert_eq!(shallow, vec![root, sub, f1]);

        assert!(store.traverse(NodeId::directory(999), None, 1).is_err());
    }

    #[test]
    fn test_remove_node_drops_edges() {
        let store = MemoryGraphStore::new();
        let root = dir(&store, "/r");
        let sub = dir(&store, "/r/s");
        let f = file(&store, "/r/s/f", 1);
        store.create_edge(root, sub).unwrap();
        store.create_edge(sub, f).unwrap();

        assert!(store.remove_node(sub).unwrap());
        assert!(!store.remove_node(sub).unwrap());
        assert_eq!(store.counts().unwrap().edges, 0);
        assert!(store.children(root).unwrap().is_empty());
        assert!(store.lookup_directory("/r/s").unwrap().is_none());
    }

    #[test]
    fn test_truncate() {
        let store = MemoryGraphStore::new();
        let root = dir(&store, "/r");
        let f = file(&store, "/r/f", 1);
        store.create_edge(root, f).unwrap();

        assert_eq!(store.truncate(Collection::Files).unwrap(), 1);
        assert_eq!(store.truncate(Collection::Edges).unwrap(), 1);
        assert_eq!(store.truncate(Collection::Directories).unwrap(), 1);
        assert_eq!(store.counts().unwrap(), StoreCounts::default());
        assert!(store.lookup_directory("/r").unwrap().is_none());
    }
}
