//! Error types for graph store operations.

use std::sync::PoisonError;

use thiserror::Error;

use crate::node::{Collection, NodeId};

/// Errors returned by a [`GraphStore`](crate::GraphStore).
///
/// A lookup miss is not an error; lookups return `Ok(None)` instead.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A lock guarding store state was poisoned by a panicking writer.
    #[error("Store state lock poisoned")]
    Poisoned,

    /// The referenced node does not exist.
    #[error("Unknown node: {id}")]
    UnknownNode { id: NodeId },

    /// The node exists but lives in a collection the operation does not accept.
    #[error("Node {id} is not in collection {expected}")]
    WrongCollection { id: NodeId, expected: Collection },

    /// Failure reported by the storage backend.
    #[error("Store backend error: {message}")]
    Backend { message: String },
}

impl StoreError {
    /// Create a backend error from any message.
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
        }
    }
}

impl<T> From<PoisonError<T>> for StoreError {
    fn from(_: PoisonError<T>) -> Self {
        Self::Poisoned
    }
}
