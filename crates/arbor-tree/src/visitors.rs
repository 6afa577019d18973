//! Reusable visitors for [`crate::traversal`].

use crate::node::TreeNode;

/// Callback invoked once per visited node with the node's depth.
///
/// Any `FnMut(usize, N)` closure is a visitor.
pub trait TreeVisitor<N> {
    /// Called for each visited node.
    fn on_node(&mut self, depth: usize, node: N);
}

impl<N, F> TreeVisitor<N> for F
where
    F: FnMut(usize, N),
{
    fn on_node(&mut self, depth: usize, node: N) {
        self(depth, node)
    }
}

/// Visitor that ignores every node. Useful when only the traversal's
/// continuation predicate matters.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopVisitor;

impl<N> TreeVisitor<N> for NoopVisitor {
    fn on_node(&mut self, _depth: usize, _node: N) {}
}

/// Counts visited nodes.
#[derive(Clone, Copy, Debug, Default)]
pub struct SizeVisitor {
    count: usize,
}

impl SizeVisitor {
    /// Create a visitor with a zero count.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of nodes visited so far.
    pub fn count(&self) -> usize {
        self.count
    }
}

impl<N> TreeVisitor<N> for SizeVisitor {
    fn on_node(&mut self, _depth: usize, _node: N) {
        self.count += 1;
    }
}

/// Collects every visited node in visiting order.
///
/// Reusing the visitor for another traversal appends to the same
/// collection; call [`CollectionVisitor::clear`] to start over.
#[derive(Clone, Debug)]
pub struct CollectionVisitor<N> {
    nodes: Vec<N>,
}

impl<N> CollectionVisitor<N> {
    /// Create an empty collector.
    pub fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    /// Nodes collected so far.
    pub fn nodes(&self) -> &[N] {
        &self.nodes
    }

    /// Number of nodes collected so far.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if nothing has been collected.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Drop everything collected so far.
    pub fn clear(&mut self) {
        self.nodes.clear();
    }

    /// Consume the visitor, returning the collected nodes.
    pub fn into_nodes(self) -> Vec<N> {
        self.nodes
    }
}

impl<N> Default for CollectionVisitor<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N> TreeVisitor<N> for CollectionVisitor<N> {
    fn on_node(&mut self, _depth: usize, node: N) {
        self.nodes.push(node);
    }
}

/// Collects only nodes without children.
#[derive(Clone, Debug)]
pub struct LeafCollectionVisitor<N> {
    leaves: Vec<N>,
}

impl<N> LeafCollectionVisitor<N> {
    /// Create an empty collector.
    pub fn new() -> Self {
        Self { leaves: Vec::new() }
    }

    /// Leaves collected so far.
    pub fn nodes(&self) -> &[N] {
        &self.leaves
    }

    /// Consume the visitor, returning the collected leaves.
    pub fn into_nodes(self) -> Vec<N> {
        self.leaves
    }
}

impl<N> Default for LeafCollectionVisitor<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N: TreeNode> TreeVisitor<N> for LeafCollectionVisitor<N> {
    fn on_node(&mut self, _depth: usize, node: N) {
        if node.children().is_empty() {
            self.leaves.push(node);
        }
    }
}

/// Collects nodes found at exactly one depth.
#[derive(Clone, Debug)]
pub struct DepthFilterVisitor<N> {
    depth: usize,
    nodes: Vec<N>,
}

impl<N> DepthFilterVisitor<N> {
    /// Collect nodes at `depth`.
    pub fn new(depth: usize) -> Self {
        Self {
            depth,
            nodes: Vec::new(),
        }
    }

    /// Consume the visitor, returning the collected nodes.
    pub fn into_nodes(self) -> Vec<N> {
        self.nodes
    }
}

impl<N> TreeVisitor<N> for DepthFilterVisitor<N> {
    fn on_node(&mut self, depth: usize, node: N) {
        if depth == self.depth {
            self.nodes.push(node);
        }
    }
}
