//! Graph store implementation for dirgraph.
//!
//! [`MemoryGraphStore`] keeps directories, files and containment edges in
//! memory behind a single read/write lock and implements the
//! [`GraphStore`](dirgraph_core::GraphStore) contract. Its state can be
//! persisted to and restored from a JSON snapshot so repeated scans and
//! categorization runs can share one graph across process invocations.
//!
//! ```rust,no_run
//! use dirgraph_store::MemoryGraphStore;
//!
//! let store = MemoryGraphStore::load("dirgraph.json").unwrap();
//! println!("{:?}", store.counts().unwrap());
//! store.save("dirgraph.json").unwrap();
//! ```

mod memory;
mod snapshot;

pub use memory::{MemoryGraphStore, StoreCounts};
pub use snapshot::{SNAPSHOT_VERSION, SnapshotError};

// Re-export core types for convenience
pub use dirgraph_core::{Collection, GraphStore, Node, NodeId, StoreError};
