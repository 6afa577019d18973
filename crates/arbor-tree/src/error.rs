//! Error types for tree construction and traversal.

use crate::tree::NodeId;

/// Errors that can occur while building or querying a tree.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TreeError {
    /// A node name is not usable as a path segment.
    #[error("invalid node name {name:?}: {reason}")]
    InvalidName {
        /// The rejected name.
        name: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A bounded traversal was asked to descend zero levels.
    #[error("depth delta must be positive, got {0}")]
    InvalidDepthDelta(usize),

    /// Data can be associated with a node only once.
    #[error("data already set on node {path}")]
    DataAlreadySet {
        /// Path of the node that already carries data.
        path: String,
    },

    /// The parent already has a child with this name.
    #[error("node {parent} already has a child named {name:?}")]
    DuplicateChild {
        /// Path of the parent node.
        parent: String,
        /// The conflicting child name.
        name: String,
    },

    /// The handle does not belong to this tree.
    #[error("node not found: {0:?}")]
    NodeNotFound(NodeId),

    /// The nodes live in different trees and share no ancestor.
    #[error("nodes do not share a common ancestor")]
    NoCommonAncestor,

    /// A trie key was inserted twice.
    #[error("duplicate key: {0:?}")]
    DuplicateKey(String),
}

/// Convenience alias for tree results.
pub type TreeResult<T> = Result<T, TreeError>;
