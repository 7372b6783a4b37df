//! Graph node, edge and event types.

use std::fmt;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A document collection in the graph store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Collection {
    /// Directory vertices, keyed by path.
    Directories,
    /// File vertices.
    Files,
    /// Containment edges.
    Edges,
}

impl Collection {
    /// Name of the collection as stored.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Directories => "directories",
            Self::Files => "files",
            Self::Edges => "contains",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Collection-qualified identifier of a node, e.g. `directories/17`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId {
    /// Collection the node lives in.
    pub collection: Collection,
    /// Key within the collection.
    pub key: u64,
}

impl NodeId {
    /// Create a new node id.
    pub fn new(collection: Collection, key: u64) -> Self {
        Self { collection, key }
    }

    /// Id of a directory node.
    pub fn directory(key: u64) -> Self {
        Self::new(Collection::Directories, key)
    }

    /// Id of a file node.
    pub fn file(key: u64) -> Self {
        Self::new(Collection::Files, key)
    }

    /// Check if this id refers to a directory.
    pub fn is_directory(&self) -> bool {
        self.collection == Collection::Directories
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.collection, self.key)
    }
}

/// Identifier of a containment edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EdgeId(pub u64);

/// A directory vertex. The path is its natural key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryNode {
    /// Canonical directory path.
    pub path: String,
}

impl DirectoryNode {
    /// Create a directory node for a path.
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

/// A file vertex, created once per ingestion event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileNode {
    /// Full path of the file.
    pub path: String,
    /// Size in bytes.
    pub size: u64,
    /// Last modification time.
    pub modified: DateTime<Utc>,
}

impl FileNode {
    /// Create a new file node.
    pub fn new(path: impl Into<String>, size: u64, modified: DateTime<Utc>) -> Self {
        Self {
            path: path.into(),
            size,
            modified,
        }
    }

    /// File name component of the path.
    pub fn name(&self) -> &str {
        Path::new(&self.path)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(&self.path)
    }
}

/// Any vertex stored in the graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Node {
    /// Directory vertex.
    Directory(DirectoryNode),
    /// File vertex.
    File(FileNode),
}

impl Node {
    /// Collection this node belongs to.
    pub fn collection(&self) -> Collection {
        match self {
            Self::Directory(_) => Collection::Directories,
            Self::File(_) => Collection::Files,
        }
    }

    /// Path of the node.
    pub fn path(&self) -> &str {
        match self {
            Self::Directory(dir) => &dir.path,
            Self::File(file) => &file.path,
        }
    }

    /// Check if this is a directory.
    pub fn is_dir(&self) -> bool {
        matches!(self, Self::Directory(_))
    }

    /// Check if this is a file.
    pub fn is_file(&self) -> bool {
        matches!(self, Self::File(_))
    }

    /// Borrow the file payload, if this is a file.
    pub fn as_file(&self) -> Option<&FileNode> {
        match self {
            Self::File(file) => Some(file),
            Self::Directory(_) => None,
        }
    }
}

impl From<DirectoryNode> for Node {
    fn from(dir: DirectoryNode) -> Self {
        Self::Directory(dir)
    }
}

impl From<FileNode> for Node {
    fn from(file: FileNode) -> Self {
        Self::File(file)
    }
}

/// Directed "directory contains child" edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContainsEdge {
    /// Containing directory.
    pub from: NodeId,
    /// Contained directory or file.
    pub to: NodeId,
}

impl ContainsEdge {
    /// Create a new edge.
    pub fn new(from: NodeId, to: NodeId) -> Self {
        Self { from, to }
    }
}

/// Kind of filesystem entry carried by a [`PathEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryKind {
    /// A directory.
    Directory,
    /// A regular file.
    File,
}

/// One entry emitted by a filesystem walk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathEvent {
    /// Full path as it should be recorded in the graph.
    pub path: String,
    /// Directory or file.
    pub kind: EntryKind,
    /// Size in bytes (0 for directories).
    pub size: u64,
    /// Last modification time.
    pub modified: DateTime<Utc>,
}

impl PathEvent {
    /// Create a directory event.
    pub fn directory(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind: EntryKind::Directory,
            size: 0,
            modified: DateTime::<Utc>::UNIX_EPOCH,
        }
    }

    /// Create a file event.
    pub fn file(path: impl Into<String>, size: u64, modified: DateTime<Utc>) -> Self {
        Self {
            path: path.into(),
            kind: EntryKind::File,
            size,
            modified,
        }
    }

    /// Check if this event describes a directory.
    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }

    /// Path of the containing directory.
    pub fn parent(&self) -> Option<&str> {
        parent_path(&self.path)
    }
}

/// Parent directory of a path, or `None` for a root or bare name.
pub fn parent_path(path: &str) -> Option<&str> {
    Path::new(path)
        .parent()
        .and_then(|p| p.to_str())
        .filter(|p| !p.is_empty())
}
