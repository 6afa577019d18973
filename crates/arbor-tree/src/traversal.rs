//! Traversal algorithms over any [`TreeNode`].
//!
//! Every function here works against the capability alone, so arena trees,
//! tries and ad-hoc wrappers all share one implementation.
//!
//! Visitors receive `(depth, node)` where `depth` is the node's distance from
//! the root of its tree. Sibling order is whatever [`TreeNode::children`]
//! returns (ascending name order for [`crate::Tree`]); all traversal results
//! derive their determinism from it.

use std::collections::VecDeque;

use crate::error::{TreeError, TreeResult};
use crate::node::TreeNode;
use crate::path::{is_absolute, join_path, split_path};
use crate::visitors::{
    DepthFilterVisitor, LeafCollectionVisitor, NoopVisitor, SizeVisitor, TreeVisitor,
};

// ---------------------------------------------------------------
// Core traversals
// ---------------------------------------------------------------

/// Pre-order depth-first traversal of the subtree at `node`.
pub fn depth_first<N, V>(node: N, visitor: &mut V)
where
    N: TreeNode,
    V: TreeVisitor<N> + ?Sized,
{
    depth_first_conditional(node, visitor, |_| true);
}

/// Breadth-first traversal of the subtree at `node`.
pub fn breadth_first<N, V>(node: N, visitor: &mut V)
where
    N: TreeNode,
    V: TreeVisitor<N> + ?Sized,
{
    breadth_first_conditional(node, visitor, |_| true);
}

/// Depth-first traversal guarded by a continuation predicate.
///
/// `proceed` is evaluated before each node is visited. When it returns
/// `false` the node is not visited and its subtree is not entered.
pub fn depth_first_conditional<N, V, P>(node: N, visitor: &mut V, mut proceed: P)
where
    N: TreeNode,
    V: TreeVisitor<N> + ?Sized,
    P: FnMut(&N) -> bool,
{
    let mut stack = vec![(node, depth(node))];
    while let Some((current, level)) = stack.pop() {
        if !proceed(&current) {
            continue;
        }
        visitor.on_node(level, current);
        // Reversed so the first child is popped first.
        for child in current.children().into_iter().rev() {
            stack.push((child, level + 1));
        }
    }
}

/// Breadth-first traversal guarded by a continuation predicate.
///
/// A node rejected by `proceed` is neither visited nor expanded.
pub fn breadth_first_conditional<N, V, P>(node: N, visitor: &mut V, mut proceed: P)
where
    N: TreeNode,
    V: TreeVisitor<N> + ?Sized,
    P: FnMut(&N) -> bool,
{
    let mut queue = VecDeque::new();
    queue.push_back((node, depth(node)));
    while let Some((current, level)) = queue.pop_front() {
        if !proceed(&current) {
            continue;
        }
        visitor.on_node(level, current);
        for child in current.children() {
            queue.push_back((child, level + 1));
        }
    }
}

/// Depth-first traversal limited to `max_delta_depth` levels below and
/// including `node`.
///
/// A delta of 1 visits only `node`. Fails with
/// [`TreeError::InvalidDepthDelta`] when the delta is zero.
pub fn depth_first_plus_depth<N, V>(node: N, visitor: &mut V, max_delta_depth: usize) -> TreeResult<()>
where
    N: TreeNode,
    V: TreeVisitor<N> + ?Sized,
{
    if max_delta_depth == 0 {
        return Err(TreeError::InvalidDepthDelta(max_delta_depth));
    }
    let limit = depth(node) + max_delta_depth;
    depth_first_conditional(node, visitor, |candidate| depth(*candidate) < limit);
    Ok(())
}

/// Returns `true` if `predicate` holds for every node of the subtree.
///
/// Stops descending at the first failure.
pub fn all<N, P>(node: N, mut predicate: P) -> bool
where
    N: TreeNode,
    P: FnMut(&N) -> bool,
{
    let mut holds = true;
    depth_first_conditional(node, &mut NoopVisitor, |candidate| {
        if holds {
            holds = predicate(candidate);
        }
        holds
    });
    holds
}

/// Returns `true` if `predicate` holds for at least one node of the subtree.
///
/// Stops descending at the first match.
pub fn any<N, P>(node: N, mut predicate: P) -> bool
where
    N: TreeNode,
    P: FnMut(&N) -> bool,
{
    let mut found = false;
    depth_first_conditional(node, &mut NoopVisitor, |candidate| {
        if !found && predicate(candidate) {
            found = true;
        }
        !found
    });
    found
}

// ---------------------------------------------------------------
// Shape queries
// ---------------------------------------------------------------

/// Distance from the root: the node's cached depth if it keeps one,
/// otherwise the length of its parent chain.
pub fn depth<N: TreeNode>(node: N) -> usize {
    node.cached_depth()
        .unwrap_or_else(|| ancestors(node).len())
}

/// Returns `true` if the node has no parent.
pub fn is_root<N: TreeNode>(node: N) -> bool {
    node.parent().is_none()
}

/// Returns `true` if the node has no children.
pub fn is_leaf<N: TreeNode>(node: N) -> bool {
    node.children().is_empty()
}

/// The root of the node's tree.
pub fn root<N: TreeNode>(node: N) -> N {
    let mut current = node;
    while let Some(parent) = current.parent() {
        current = parent;
    }
    current
}

/// Parent chain of a node, nearest first. The node itself is not included.
pub fn ancestors<N: TreeNode>(node: N) -> Vec<N> {
    let mut chain = Vec::new();
    let mut current = node;
    while let Some(parent) = current.parent() {
        chain.push(parent);
        current = parent;
    }
    chain
}

/// Number of nodes in the subtree, including `node`.
pub fn size_of<N: TreeNode>(node: N) -> usize {
    let mut visitor = SizeVisitor::new();
    depth_first(node, &mut visitor);
    visitor.count()
}

/// Position of `node` among its parent's children, `None` for the root.
pub fn index_of<N: TreeNode>(node: N) -> Option<usize> {
    node.parent()?
        .children()
        .iter()
        .position(|sibling| *sibling == node)
}

// ---------------------------------------------------------------
// Lookups
// ---------------------------------------------------------------

/// First node, in pre-order, for which `predicate` holds.
pub fn find_first<N, P>(node: N, mut predicate: P) -> Option<N>
where
    N: TreeNode,
    P: FnMut(&N) -> bool,
{
    let mut found = None;
    depth_first_conditional(node, &mut NoopVisitor, |candidate| {
        if found.is_some() {
            return false;
        }
        if predicate(candidate) {
            found = Some(*candidate);
        }
        true
    });
    found
}

/// Direct child with the given name.
pub fn child_by_name<N: TreeNode>(node: N, name: &str) -> Option<N> {
    node.children().into_iter().find(|child| child.name() == name)
}

/// First descendant of `node` (breadth-first, excluding `node` itself) with
/// the given name.
///
/// The search covers the whole subtree at any depth, not just the direct
/// children, but never leaves it: pass [`root`]`(node)` to search the whole
/// tree.
pub fn child_by_name_deep<N: TreeNode>(node: N, name: &str) -> Option<N> {
    let mut queue: VecDeque<N> = node.children().into();
    while let Some(current) = queue.pop_front() {
        if current.name() == name {
            return Some(current);
        }
        queue.extend(current.children());
    }
    None
}

/// Resolve a path by name without creating anything.
///
/// A leading `/` resolves from the root and absorbs a first segment equal to
/// the root's name, mirroring [`crate::Tree::find_by_path`].
pub fn find_by_path<N: TreeNode>(node: N, path: &str) -> Option<N> {
    let mut segments = split_path(path).into_iter().peekable();
    let mut current = node;
    if is_absolute(path) {
        current = root(node);
        if segments.peek().is_some_and(|first| *first == current.name()) {
            segments.next();
        }
    }
    for segment in segments {
        current = child_by_name(current, segment)?;
    }
    Some(current)
}

// ---------------------------------------------------------------
// Leaves and levels
// ---------------------------------------------------------------

/// Leaves of the subtree in depth-first order.
pub fn leaf_nodes<N: TreeNode>(node: N) -> Vec<N> {
    let mut visitor = LeafCollectionVisitor::new();
    depth_first(node, &mut visitor);
    visitor.into_nodes()
}

/// Root-to-leaf paths of every leaf below `node`, named with `name_fn`.
pub fn leaf_paths<N, F>(node: N, name_fn: F) -> Vec<String>
where
    N: TreeNode,
    F: Fn(&N) -> String,
{
    leaf_nodes(node)
        .into_iter()
        .map(|leaf| {
            let mut chain = ancestors(leaf);
            chain.reverse();
            chain.push(leaf);
            join_path(chain.iter().map(&name_fn))
        })
        .collect()
}

/// The first deepest leaf found in depth-first order.
pub fn deepest_leaf<N: TreeNode>(node: N) -> N {
    let mut deepest = (depth(node), node);
    let mut visitor = |level: usize, candidate: N| {
        if level > deepest.0 && is_leaf(candidate) {
            deepest = (level, candidate);
        }
    };
    depth_first(node, &mut visitor);
    deepest.1
}

/// Depth of the first deepest leaf below `node`.
pub fn max_depth<N: TreeNode>(node: N) -> usize {
    depth(deepest_leaf(node))
}

/// Nodes exactly `relative_depth` levels below `node`, in depth-first order.
///
/// Runs a [`depth_first_plus_depth`] traversal that stops at the target
/// level and keeps only the nodes found there.
pub fn nodes_at_depth<N: TreeNode>(node: N, relative_depth: usize) -> Vec<N> {
    let mut visitor = DepthFilterVisitor::new(depth(node) + relative_depth);
    // The delta is at least one, which the bounded traversal always accepts.
    match depth_first_plus_depth(node, &mut visitor, relative_depth + 1) {
        Ok(()) => visitor.into_nodes(),
        Err(_) => Vec::new(),
    }
}

// ---------------------------------------------------------------
// Relatives
// ---------------------------------------------------------------

/// The deepest node that is an ancestor of (or equal to) both `a` and `b`.
///
/// Fails with [`TreeError::NoCommonAncestor`] when the nodes belong to
/// different trees.
pub fn common_ancestor<N: TreeNode>(a: N, b: N) -> TreeResult<N> {
    let (mut a, mut b) = (a, b);
    let (mut depth_a, mut depth_b) = (depth(a), depth(b));

    while depth_a > depth_b {
        a = a.parent().ok_or(TreeError::NoCommonAncestor)?;
        depth_a -= 1;
    }
    while depth_b > depth_a {
        b = b.parent().ok_or(TreeError::NoCommonAncestor)?;
        depth_b -= 1;
    }
    while a != b {
        a = a.parent().ok_or(TreeError::NoCommonAncestor)?;
        b = b.parent().ok_or(TreeError::NoCommonAncestor)?;
    }
    Ok(a)
}

/// Common ancestor of every node in `nodes`.
///
/// `None` for an empty input, the node itself for a single node.
pub fn common_ancestor_of<N, I>(nodes: I) -> TreeResult<Option<N>>
where
    N: TreeNode,
    I: IntoIterator<Item = N>,
{
    let mut nodes = nodes.into_iter();
    let Some(first) = nodes.next() else {
        return Ok(None);
    };
    nodes
        .try_fold(first, |acc, node| common_ancestor(acc, node))
        .map(Some)
}

/// Successor of `node` when the tree is read level by level, left to right.
///
/// Returns the next sibling if there is one. For a last child, moves to the
/// next sibling of the parent that has children (skipping empty branches,
/// possibly crossing into cousins higher up) and returns its first child.
/// `None` when no such node exists.
pub fn next_sibling<N: TreeNode>(node: N) -> Option<N> {
    let parent = node.parent()?;
    let siblings = parent.children();
    let index = siblings.iter().position(|sibling| *sibling == node)?;
    if let Some(next) = siblings.get(index + 1) {
        return Some(*next);
    }

    let mut uncle = next_sibling(parent)?;
    loop {
        if let Some(first) = uncle.children().into_iter().next() {
            return Some(first);
        }
        uncle = next_sibling(uncle)?;
    }
}

/// Payloads of the given nodes, skipping nodes without data.
pub fn strip_data<N: TreeNode>(nodes: &[N]) -> Vec<&N::Data> {
    nodes.iter().filter_map(|node| node.data()).collect()
}
