//! Name-keyed trees for Arbor.
//!
//! This crate provides an arena-backed tree whose nodes are addressed by
//! `/`-delimited paths, a set of traversal algorithms that work against any
//! type implementing [`TreeNode`], reusable visitors, an observable tree that
//! notifies listeners of structural changes, and a character trie built on
//! the same machinery.
//!
//! # Key Types
//!
//! - [`Tree`] -- Arena of named nodes; children are kept in name order
//! - [`NodeRef`] -- Borrowed, copyable handle implementing [`TreeNode`]
//! - [`TreeNode`] -- Capability consumed by every [`traversal`] function
//! - [`TreeVisitor`] -- Per-node callback; closures qualify
//! - [`ObservableTree`] -- Tree that announces node additions and data association
//! - [`Trie`] -- String-keyed map storing one node per character

pub mod error;
pub mod node;
pub mod observable;
pub mod path;
pub mod traversal;
pub mod tree;
pub mod trie;
pub mod visitors;

pub use error::{TreeError, TreeResult};
pub use node::TreeNode;
pub use observable::{FnListener, ListenerId, NodeEvent, NodeListener, ObservableTree};
pub use path::DELIMITER;
pub use tree::{NodeId, NodeRef, Tree};
pub use trie::Trie;
pub use visitors::{
    CollectionVisitor, DepthFilterVisitor, LeafCollectionVisitor, NoopVisitor, SizeVisitor,
    TreeVisitor,
};
