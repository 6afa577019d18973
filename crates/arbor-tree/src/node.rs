//! The [`TreeNode`] capability all traversal algorithms operate against.
//!
//! Anything that can name its parent, list its children in sibling order and
//! optionally expose a payload can be walked by [`crate::traversal`]: arena
//! trees, tries, or ad-hoc views over foreign structures.

use std::borrow::Cow;

/// A lightweight handle to a node in some tree.
///
/// Handles are `Copy`; equality between handles is node *identity*, never
/// structural equality. Implementations must return children in a stable
/// sibling order since every traversal derives its determinism from it.
pub trait TreeNode: Copy + Eq {
    /// Payload type carried by nodes.
    type Data;

    /// The parent of this node, or `None` for the root.
    fn parent(&self) -> Option<Self>;

    /// Children of this node in sibling order.
    fn children(&self) -> Vec<Self>;

    /// The payload associated with this node, if any.
    fn data(&self) -> Option<&Self::Data>;

    /// Label used for name-based lookups and path rendering.
    fn name(&self) -> Cow<'_, str>;

    /// A memoized depth, if the node type keeps one.
    ///
    /// [`crate::traversal::depth`] falls back to walking the parent chain
    /// when this returns `None`.
    fn cached_depth(&self) -> Option<usize> {
        None
    }
}
