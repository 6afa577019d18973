//! Name-keyed arena tree.
//!
//! [`Tree`] owns every node in a flat arena; [`NodeId`] is an opaque index
//! into it and [`NodeRef`] is a borrowed handle implementing [`TreeNode`].
//!
//! # Invariants
//!
//! - Sibling names are unique; children are kept in ascending name order.
//! - Every child's parent link points back at the node that lists it.
//! - Data is associated with a node at most once.
//! - Nodes are never removed. A tree only grows, or is rebuilt through [`Tree::copy`].

use std::borrow::Cow;
use std::cell::OnceCell;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::debug;

use crate::error::{TreeError, TreeResult};
use crate::node::TreeNode;
use crate::path::{is_absolute, join_path, split_path, validate_name};
use crate::traversal;

static NEXT_TREE: AtomicU64 = AtomicU64::new(0);

/// Opaque handle to a node inside a [`Tree`].
///
/// An id remembers the tree that issued it. Handing it to any other tree
/// fails with [`TreeError::NodeNotFound`], even when the index is in range
/// there. A clone of a tree accepts the original's ids; [`Tree::copy`]
/// produces a new tree with ids of its own.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    tree: u64,
    index: usize,
}

impl NodeId {
    /// Position of the node in its arena. Creation order within a tree.
    pub fn index(self) -> usize {
        self.index
    }
}

#[derive(Clone, Debug)]
struct Slot<T> {
    name: String,
    data: Option<T>,
    parent: Option<NodeId>,
    children: BTreeMap<String, NodeId>,
    // Assumes the ancestry above the node never changes once computed.
    depth: OnceCell<usize>,
}

impl<T> Slot<T> {
    fn new(name: String, data: Option<T>, parent: Option<NodeId>) -> Self {
        Self {
            name,
            data,
            parent,
            children: BTreeMap::new(),
            depth: OnceCell::new(),
        }
    }
}

/// A tree of named nodes with optional payloads.
///
/// Not synchronized: a tree has a single writer, enforced by `&mut self`.
/// Wrap it in [`crate::ObservableTree`] to be notified of mutations.
#[derive(Clone, Debug)]
pub struct Tree<T> {
    token: u64,
    slots: Vec<Slot<T>>,
}

impl<T> Tree<T> {
    /// Create a tree consisting of a single root node.
    ///
    /// Fails with [`TreeError::InvalidName`] if `name` contains the path delimiter.
    pub fn new(name: impl Into<String>) -> TreeResult<Self> {
        let name = name.into();
        validate_name(&name)?;
        Ok(Self::with_root(name, None))
    }

    pub(crate) fn with_root(name: String, data: Option<T>) -> Self {
        Self {
            token: NEXT_TREE.fetch_add(1, Ordering::Relaxed),
            slots: vec![Slot::new(name, data, None)],
        }
    }

    /// Build a tree from a path whose first segment names the root.
    ///
    /// Returns the tree and the node at the end of the path.
    ///
    /// ```
    /// use arbor_tree::Tree;
    ///
    /// let (tree, seven) = Tree::<()>::from_path("root/a/seven").unwrap();
    /// assert_eq!(tree.path(seven), "root/a/seven");
    /// assert_eq!(tree.node_count(), 3);
    /// ```
    pub fn from_path(path: &str) -> TreeResult<(Self, NodeId)> {
        let segments = split_path(path);
        let Some((first, rest)) = segments.split_first() else {
            return Err(TreeError::InvalidName {
                name: path.to_string(),
                reason: "path has no segments".into(),
            });
        };

        let mut tree = Self::with_root((*first).to_string(), None);
        let mut current = tree.root();
        for segment in rest {
            current = tree.child_or_insert(current, segment);
        }
        Ok((tree, current))
    }

    /// The root node's handle.
    pub fn root(&self) -> NodeId {
        self.id_at(0)
    }

    /// Borrowed handle to the root node.
    pub fn root_node(&self) -> NodeRef<'_, T> {
        NodeRef {
            tree: self,
            id: self.root(),
        }
    }

    /// Total number of nodes in the tree.
    pub fn node_count(&self) -> usize {
        self.slots.len()
    }

    /// Returns `true` if the handle belongs to this tree.
    pub fn contains(&self, id: NodeId) -> bool {
        id.tree == self.token && id.index < self.slots.len()
    }

    /// Borrowed handle to a node, or `None` if the id is not part of this tree.
    pub fn get(&self, id: NodeId) -> Option<NodeRef<'_, T>> {
        self.contains(id).then_some(NodeRef { tree: self, id })
    }

    /// Borrowed handle to a node.
    ///
    /// # Panics
    ///
    /// Panics if `id` does not belong to this tree. Use [`Tree::get`] for a
    /// fallible lookup.
    pub fn node(&self, id: NodeId) -> NodeRef<'_, T> {
        assert!(self.contains(id), "node {id:?} does not belong to this tree");
        NodeRef { tree: self, id }
    }

    /// Name of a node. Panics like [`Tree::node`].
    pub fn name(&self, id: NodeId) -> &str {
        self.node(id).name()
    }

    /// Payload of a node. Panics like [`Tree::node`].
    pub fn data(&self, id: NodeId) -> Option<&T> {
        self.node(id).data()
    }

    /// Parent of a node. Panics like [`Tree::node`].
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent().map(|p| p.id)
    }

    /// Children of a node in ascending name order. Panics like [`Tree::node`].
    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        self.node(id).slot().children.values().copied().collect()
    }

    /// Direct child with the given name.
    pub fn child(&self, id: NodeId, name: &str) -> Option<NodeId> {
        self.get(id)?.slot().children.get(name).copied()
    }

    /// Distance from the root (0 for the root itself), memoized per node.
    pub fn depth(&self, id: NodeId) -> usize {
        self.node(id).depth()
    }

    /// Number of nodes in the subtree rooted at `id`, including `id`.
    pub fn size(&self, id: NodeId) -> usize {
        traversal::size_of(self.node(id))
    }

    /// Delimiter-joined names from the root down to `id`.
    pub fn path(&self, id: NodeId) -> String {
        self.node(id).path()
    }

    // ---------------------------------------------------------------
    // Mutation
    // ---------------------------------------------------------------

    /// Create and link a new child under `parent`.
    ///
    /// Fails if the name contains the delimiter or if `parent` already has a
    /// child with that name.
    pub fn add_child(
        &mut self,
        parent: NodeId,
        name: impl Into<String>,
        data: Option<T>,
    ) -> TreeResult<NodeId> {
        let name = name.into();
        validate_name(&name)?;
        self.ensure_vacant(parent, &name)?;

        let id = self.link(parent, name, data);
        debug!(parent = %self.path(parent), child = %self.name(id), "added child node");
        Ok(id)
    }

    /// Associate data with a node that has none yet.
    pub fn set_data(&mut self, id: NodeId, data: T) -> TreeResult<()> {
        if self.slot(id)?.data.is_some() {
            return Err(TreeError::DataAlreadySet {
                path: self.path(id),
            });
        }
        self.slots[id.index].data = Some(data);
        debug!(node = %self.path(id), "associated data with node");
        Ok(())
    }

    /// Resolve `path` from `start`, creating every missing segment.
    ///
    /// A leading `/` resolves from the root; if the first segment then equals
    /// the root's name it is absorbed. Re-parsing an existing path returns the
    /// same node and creates nothing.
    pub fn parse(&mut self, start: NodeId, path: &str) -> TreeResult<NodeId> {
        let (mut current, segments) = self.resolve(start, path)?;
        for segment in segments {
            current = self.child_or_insert(current, segment);
        }
        Ok(current)
    }

    /// Read-only counterpart of [`Tree::parse`]: `None` if any segment is missing.
    pub fn find_by_path(&self, start: NodeId, path: &str) -> Option<NodeId> {
        let (mut current, segments) = self.resolve(start, path).ok()?;
        for segment in segments {
            current = self.child(current, segment)?;
        }
        Some(current)
    }

    /// First node named `name` in depth-first order from `start` (inclusive).
    pub fn find_by_name(&self, start: NodeId, name: &str) -> Option<NodeId> {
        let start = self.get(start)?;
        traversal::find_first(start, |node| node.name() == name).map(|node| node.id)
    }

    /// Deep structural clone of the subtree at `id` as a new, detached tree.
    pub fn copy(&self, id: NodeId) -> TreeResult<Tree<T>>
    where
        T: Clone,
    {
        let slot = self.slot(id)?;
        let mut copy = Tree::with_root(slot.name.clone(), slot.data.clone());
        let root = copy.root();
        copy.graft_children(root, self, id);
        Ok(copy)
    }

    /// Deep-copy `node` from `source` as a new child of `parent`.
    ///
    /// Returns the id of the copy inside this tree.
    pub fn add_all(&mut self, parent: NodeId, source: &Tree<T>, node: NodeId) -> TreeResult<NodeId>
    where
        T: Clone,
    {
        let src = source.slot(node)?;
        self.ensure_vacant(parent, &src.name)?;

        let id = self.link(parent, src.name.clone(), src.data.clone());
        self.graft_children(id, source, node);
        debug!(
            parent = %self.path(parent),
            child = %self.name(id),
            size = self.size(id),
            "grafted subtree copy"
        );
        Ok(id)
    }

    /// [`Tree::add_all`] for several source nodes, in the given order.
    pub fn add_all_nodes(
        &mut self,
        parent: NodeId,
        source: &Tree<T>,
        nodes: &[NodeId],
    ) -> TreeResult<Vec<NodeId>>
    where
        T: Clone,
    {
        nodes
            .iter()
            .map(|&node| self.add_all(parent, source, node))
            .collect()
    }

    /// Deep-copy a subtree of this tree under `parent`.
    pub fn add_copy(&mut self, parent: NodeId, node: NodeId) -> TreeResult<NodeId>
    where
        T: Clone,
    {
        let detached = self.copy(node)?;
        self.add_all(parent, &detached, detached.root())
    }

    /// Fan a node out into `n` numbered siblings, then do the same for its parent.
    ///
    /// For a node `x` under `p`, appends `x1..=xn` to `p`, each holding copies
    /// of `x`'s children (not its data), then calls `multiply(p, n)`. The root
    /// is never multiplied, which ends the ascent. Every level multiplies the
    /// siblings created below it, so growth is exponential in the depth.
    ///
    /// ```
    /// use arbor_tree::{traversal, Tree};
    ///
    /// let (mut tree, seven) = Tree::<()>::from_path("root/a/seven").unwrap();
    /// let a = tree.parent(seven).unwrap();
    /// tree.multiply(a, 3).unwrap();
    ///
    /// let paths = traversal::leaf_paths(tree.root_node(), |n| n.name().to_string());
    /// assert_eq!(paths, ["root/a/seven", "root/a1/seven", "root/a2/seven", "root/a3/seven"]);
    /// ```
    pub fn multiply(&mut self, node: NodeId, n: usize) -> TreeResult<()>
    where
        T: Clone,
    {
        let slot = self.slot(node)?;
        let Some(parent) = slot.parent else {
            return Ok(());
        };
        let name = slot.name.clone();
        let originals: Vec<NodeId> = slot.children.values().copied().collect();
        let template = self.copy(node)?;
        let template_children = template.children(template.root());

        for i in 1..=n {
            let sibling = self.add_child(parent, format!("{name}{i}"), None)?;
            self.add_all_nodes(sibling, &template, &template_children)?;
        }
        debug!(
            node = %self.path(node),
            copies = n,
            children = originals.len(),
            "multiplied node"
        );

        self.multiply(parent, n)
    }

    // ---------------------------------------------------------------
    // Internals
    // ---------------------------------------------------------------

    /// Ids of the nodes created after the arena held `count` nodes, in
    /// creation order (parents before children).
    pub(crate) fn created_since(&self, count: usize) -> impl Iterator<Item = NodeId> {
        let tree = self.token;
        (count..self.slots.len()).map(move |index| NodeId { tree, index })
    }

    fn id_at(&self, index: usize) -> NodeId {
        NodeId {
            tree: self.token,
            index,
        }
    }

    fn slot(&self, id: NodeId) -> TreeResult<&Slot<T>> {
        if !self.contains(id) {
            return Err(TreeError::NodeNotFound(id));
        }
        Ok(&self.slots[id.index])
    }

    fn ensure_vacant(&self, parent: NodeId, name: &str) -> TreeResult<()> {
        if self.slot(parent)?.children.contains_key(name) {
            return Err(TreeError::DuplicateChild {
                parent: self.path(parent),
                name: name.to_string(),
            });
        }
        Ok(())
    }

    /// Push a node into the arena and link it under `parent`.
    /// The caller guarantees `parent` exists and `name` is vacant.
    fn link(&mut self, parent: NodeId, name: String, data: Option<T>) -> NodeId {
        let id = self.id_at(self.slots.len());
        self.slots.push(Slot::new(name.clone(), data, Some(parent)));
        self.slots[parent.index].children.insert(name, id);
        id
    }

    fn child_or_insert(&mut self, parent: NodeId, name: &str) -> NodeId {
        match self.slots[parent.index].children.get(name) {
            Some(&id) => id,
            None => self.link(parent, name.to_string(), None),
        }
    }

    /// Copy the children of `source_node` (recursively) under `target`,
    /// which must have no children yet.
    fn graft_children(&mut self, target: NodeId, source: &Tree<T>, source_node: NodeId)
    where
        T: Clone,
    {
        for (name, &child) in &source.slots[source_node.index].children {
            let copied = self.link(target, name.clone(), source.slots[child.index].data.clone());
            self.graft_children(copied, source, child);
        }
    }

    fn resolve<'p>(&self, start: NodeId, path: &'p str) -> TreeResult<(NodeId, Vec<&'p str>)> {
        self.slot(start)?;
        let mut segments = split_path(path);
        if !is_absolute(path) {
            return Ok((start, segments));
        }
        if segments.first() == Some(&self.slots[0].name.as_str()) {
            segments.remove(0);
        }
        Ok((self.root(), segments))
    }

    fn write_subtree(&self, f: &mut fmt::Formatter<'_>, id: NodeId, indent: usize) -> fmt::Result
    where
        T: fmt::Display,
    {
        let slot = &self.slots[id.index];
        write!(f, "{:indent$}{}", "", slot.name, indent = indent * 2)?;
        if let Some(data) = &slot.data {
            write!(f, " = {data}")?;
        }
        writeln!(f)?;
        for &child in slot.children.values() {
            self.write_subtree(f, child, indent + 1)?;
        }
        Ok(())
    }
}

/// Renders one node per line, indented two spaces per level, with ` = data`
/// appended where present.
impl<T: fmt::Display> fmt::Display for Tree<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_subtree(f, self.root(), 0)
    }
}

/// Borrowed handle to a node of a [`Tree`].
pub struct NodeRef<'a, T> {
    tree: &'a Tree<T>,
    id: NodeId,
}

impl<'a, T> NodeRef<'a, T> {
    fn slot(&self) -> &'a Slot<T> {
        &self.tree.slots[self.id.index]
    }

    /// The node's id within its tree.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// The tree this node belongs to.
    pub fn tree(&self) -> &'a Tree<T> {
        self.tree
    }

    /// The node's name.
    pub fn name(&self) -> &'a str {
        &self.slot().name
    }

    /// The node's payload, if any.
    pub fn data(&self) -> Option<&'a T> {
        self.slot().data.as_ref()
    }

    /// The parent node, or `None` for the root.
    pub fn parent(&self) -> Option<NodeRef<'a, T>> {
        self.slot().parent.map(|id| NodeRef {
            tree: self.tree,
            id,
        })
    }

    /// Children in ascending name order.
    pub fn children(&self) -> impl Iterator<Item = NodeRef<'a, T>> + 'a {
        let tree = self.tree;
        self.slot()
            .children
            .values()
            .map(move |&id| NodeRef { tree, id })
    }

    /// Direct child with the given name.
    pub fn child(&self, name: &str) -> Option<NodeRef<'a, T>> {
        self.slot().children.get(name).map(|&id| NodeRef {
            tree: self.tree,
            id,
        })
    }

    /// Returns `true` for the root node.
    pub fn is_root(&self) -> bool {
        self.slot().parent.is_none()
    }

    /// Returns `true` if the node has no children.
    pub fn is_leaf(&self) -> bool {
        self.slot().children.is_empty()
    }

    /// Distance from the root, memoized on first use.
    pub fn depth(&self) -> usize {
        *self
            .slot()
            .depth
            .get_or_init(|| self.parent().map_or(0, |parent| parent.depth() + 1))
    }

    /// Number of nodes in this subtree, including this node.
    pub fn size(&self) -> usize {
        traversal::size_of(*self)
    }

    /// Delimiter-joined names from the root down to this node.
    pub fn path(&self) -> String {
        let mut names: Vec<&str> = traversal::ancestors(*self)
            .into_iter()
            .map(|node| node.name())
            .collect();
        names.reverse();
        names.push(self.name());
        join_path(names)
    }
}

impl<T> Clone for NodeRef<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for NodeRef<'_, T> {}

impl<T> PartialEq for NodeRef<'_, T> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.tree, other.tree) && self.id == other.id
    }
}

impl<T> Eq for NodeRef<'_, T> {}

impl<T> fmt::Debug for NodeRef<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("NodeRef").field(&self.path()).finish()
    }
}

impl<'a, T> TreeNode for NodeRef<'a, T> {
    type Data = T;

    fn parent(&self) -> Option<Self> {
        NodeRef::parent(self)
    }

    fn children(&self) -> Vec<Self> {
        NodeRef::children(self).collect()
    }

    fn data(&self) -> Option<&T> {
        NodeRef::data(self)
    }

    fn name(&self) -> Cow<'_, str> {
        Cow::Borrowed(NodeRef::name(self))
    }

    fn cached_depth(&self) -> Option<usize> {
        Some(self.depth())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Tree<i32> {
        let mut tree = Tree::new("a").unwrap();
        let root = tree.root();
        for path in ["b1/c1", "b1/c2", "b2/alpha", "b2/beta"] {
            tree.parse(root, path).unwrap();
        }
        tree
    }

    // ----------------------------------------------------------
    // Construction
    // ----------------------------------------------------------

    #[test]
    fn new_tree_has_single_root() {
        let tree: Tree<()> = Tree::new("root").unwrap();
        assert_eq!(tree.node_count(), 1);
        assert_eq!(tree.name(tree.root()), "root");
        assert!(tree.root_node().is_root());
        assert!(tree.root_node().is_leaf());
        assert_eq!(tree.depth(tree.root()), 0);
    }

    #[test]
    fn new_tree_rejects_delimiter_in_name() {
        let result: TreeResult<Tree<()>> = Tree::new("a/b");
        assert!(matches!(result, Err(TreeError::InvalidName { .. })));
    }

    #[test]
    fn from_path_without_segments_is_rejected() {
        assert!(matches!(
            Tree::<()>::from_path(" / // "),
            Err(TreeError::InvalidName { .. })
        ));
    }

    #[test]
    fn from_path_returns_terminal_node() {
        let (tree, leaf) = Tree::<()>::from_path("/root/a/seven/").unwrap();
        assert_eq!(tree.name(tree.root()), "root");
        assert_eq!(tree.name(leaf), "seven");
        assert_eq!(tree.path(leaf), "root/a/seven");
        assert_eq!(tree.depth(leaf), 2);
    }

    // ----------------------------------------------------------
    // Children and data
    // ----------------------------------------------------------

    #[test]
    fn add_child_links_parent_and_child() {
        let mut tree = Tree::new("root").unwrap();
        let child = tree.add_child(tree.root(), "x", Some(7)).unwrap();
        assert_eq!(tree.parent(child), Some(tree.root()));
        assert_eq!(tree.children(tree.root()), vec![child]);
        assert_eq!(tree.data(child), Some(&7));
    }

    #[test]
    fn duplicate_child_is_rejected() {
        let mut tree: Tree<()> = Tree::new("root").unwrap();
        tree.add_child(tree.root(), "x", None).unwrap();
        let result = tree.add_child(tree.root(), "x", None);
        assert!(matches!(
            result,
            Err(TreeError::DuplicateChild { ref parent, ref name }) if parent == "root" && name == "x"
        ));
        assert_eq!(tree.node_count(), 2);
    }

    #[test]
    fn child_name_with_delimiter_is_rejected() {
        let mut tree: Tree<()> = Tree::new("root").unwrap();
        let result = tree.add_child(tree.root(), "x/y", None);
        assert!(matches!(result, Err(TreeError::InvalidName { .. })));
    }

    #[test]
    fn foreign_node_id_is_reported() {
        let mut small: Tree<()> = Tree::new("small").unwrap();
        let big = sample();
        let foreign = big.find_by_name(big.root(), "beta").unwrap();
        assert!(small.get(foreign).is_none());
        assert_eq!(
            small.add_child(foreign, "x", None),
            Err(TreeError::NodeNotFound(foreign))
        );
    }

    #[test]
    fn in_range_id_from_another_tree_is_rejected() {
        let mut small: Tree<i32> = Tree::new("small").unwrap();
        small.add_child(small.root(), "x", None).unwrap();
        let big = sample();
        let foreign = big.child(big.root(), "b1").unwrap();
        assert!(foreign.index() < small.node_count());

        assert!(!small.contains(foreign));
        assert!(small.get(foreign).is_none());
        assert!(small.find_by_path(big.root(), "x").is_none());
        assert_eq!(
            small.add_child(foreign, "y", None),
            Err(TreeError::NodeNotFound(foreign))
        );
        assert_eq!(small.set_data(foreign, 1), Err(TreeError::NodeNotFound(foreign)));
    }

    #[test]
    #[should_panic(expected = "does not belong to this tree")]
    fn infallible_accessors_panic_on_foreign_ids() {
        let small: Tree<i32> = Tree::new("small").unwrap();
        let big = sample();
        small.name(big.root());
    }

    #[test]
    fn clones_accept_ids_but_copies_issue_their_own() {
        let tree = sample();
        let b1 = tree.child(tree.root(), "b1").unwrap();
        assert_eq!(tree.clone().path(b1), "a/b1");

        let copy = tree.copy(tree.root()).unwrap();
        assert!(copy.get(b1).is_none());
        assert_ne!(copy.root(), tree.root());
    }

    #[test]
    fn children_are_ordered_by_name() {
        let mut tree: Tree<()> = Tree::new("root").unwrap();
        for name in ["zeta", "alpha", "mu", "beta"] {
            tree.add_child(tree.root(), name, None).unwrap();
        }
        let names: Vec<&str> = tree.root_node().children().map(|c| c.name()).collect();
        assert_eq!(names, vec!["alpha", "beta", "mu", "zeta"]);
    }

    #[test]
    fn data_is_set_at_most_once() {
        let mut tree = Tree::new("root").unwrap();
        let node = tree.parse(tree.root(), "a/b").unwrap();
        tree.set_data(node, 1).unwrap();
        let result = tree.set_data(node, 2);
        assert!(matches!(
            result,
            Err(TreeError::DataAlreadySet { ref path }) if path == "root/a/b"
        ));
        assert_eq!(tree.data(node), Some(&1));
    }

    // ----------------------------------------------------------
    // Paths
    // ----------------------------------------------------------

    #[test]
    fn parse_is_idempotent() {
        let mut tree: Tree<()> = Tree::new("root").unwrap();
        let first = tree.parse(tree.root(), "a/b/c").unwrap();
        let size = tree.size(tree.root());
        let second = tree.parse(tree.root(), " a // b /c/").unwrap();
        assert_eq!(first, second);
        assert_eq!(tree.size(tree.root()), size);
    }

    #[test]
    fn absolute_parse_absorbs_root_name() {
        let mut tree: Tree<()> = Tree::new("root").unwrap();
        let b = tree.parse(tree.root(), "a/b").unwrap();
        assert_eq!(tree.parse(b, "/root/a/b").unwrap(), b);
        assert_eq!(tree.parse(b, "/a/b").unwrap(), b);
        assert_eq!(tree.node_count(), 3);
    }

    #[test]
    fn relative_parse_starts_at_given_node() {
        let mut tree: Tree<()> = Tree::new("root").unwrap();
        let a = tree.parse(tree.root(), "a").unwrap();
        let nested = tree.parse(a, "a/x").unwrap();
        assert_eq!(tree.path(nested), "root/a/a/x");
    }

    #[test]
    fn find_by_path_has_no_side_effects() {
        let tree = sample();
        let count = tree.node_count();
        assert!(tree.find_by_path(tree.root(), "b1/missing").is_none());
        assert_eq!(tree.node_count(), count);

        let c2 = tree.find_by_path(tree.root(), "/a/b1/c2").unwrap();
        assert_eq!(tree.path(c2), "a/b1/c2");
        assert_eq!(tree.find_by_path(tree.root(), ""), Some(tree.root()));
    }

    #[test]
    fn find_by_name_searches_depth_first_including_self() {
        let tree = sample();
        let alpha = tree.find_by_name(tree.root(), "alpha").unwrap();
        assert_eq!(tree.path(alpha), "a/b2/alpha");
        assert_eq!(tree.find_by_name(alpha, "alpha"), Some(alpha));
        assert!(tree.find_by_name(tree.root(), "gamma").is_none());
    }

    #[test]
    fn depth_and_size() {
        let tree = sample();
        let b1 = tree.child(tree.root(), "b1").unwrap();
        let c1 = tree.child(b1, "c1").unwrap();
        assert_eq!(tree.depth(b1), 1);
        assert_eq!(tree.depth(c1), 2);
        assert_eq!(tree.size(tree.root()), 7);
        assert_eq!(tree.size(b1), 3);
        assert_eq!(tree.size(c1), 1);
    }

    // ----------------------------------------------------------
    // Copy and graft
    // ----------------------------------------------------------

    #[test]
    fn copy_is_structurally_equal_and_detached() {
        let mut tree = sample();
        let b1 = tree.child(tree.root(), "b1").unwrap();
        tree.set_data(b1, 42).unwrap();

        let mut copy = tree.copy(tree.root()).unwrap();
        assert_eq!(copy.to_string(), tree.to_string());

        let before = tree.size(tree.root());
        copy.parse(copy.root(), "b3/extra").unwrap();
        assert_eq!(tree.size(tree.root()), before);
        assert_eq!(copy.size(copy.root()), before + 2);
    }

    #[test]
    fn copy_of_subtree_becomes_root() {
        let tree = sample();
        let b2 = tree.child(tree.root(), "b2").unwrap();
        let copy = tree.copy(b2).unwrap();
        assert_eq!(copy.name(copy.root()), "b2");
        assert!(copy.root_node().is_root());
        assert_eq!(copy.size(copy.root()), 3);
    }

    #[test]
    fn add_all_grafts_copies_from_another_tree() {
        let source = sample();
        let b1 = source.child(source.root(), "b1").unwrap();
        let b2 = source.child(source.root(), "b2").unwrap();

        let mut target: Tree<i32> = Tree::new("t").unwrap();
        let added = target.add_all_nodes(target.root(), &source, &[b1, b2]).unwrap();
        assert_eq!(added.len(), 2);
        assert_eq!(target.size(target.root()), 7);
        assert_eq!(target.parent(added[0]), Some(target.root()));
        assert!(target.find_by_path(target.root(), "b2/beta").is_some());
    }

    #[test]
    fn add_all_rejects_name_collision() {
        let source = sample();
        let b1 = source.child(source.root(), "b1").unwrap();
        let mut target: Tree<i32> = Tree::new("t").unwrap();
        target.add_child(target.root(), "b1", None).unwrap();
        assert!(matches!(
            target.add_all(target.root(), &source, b1),
            Err(TreeError::DuplicateChild { .. })
        ));
    }

    #[test]
    fn add_copy_within_same_tree() {
        let mut tree = sample();
        let b1 = tree.child(tree.root(), "b1").unwrap();
        let b2 = tree.child(tree.root(), "b2").unwrap();
        let copied = tree.add_copy(b2, b1).unwrap();
        assert_eq!(tree.path(copied), "a/b2/b1");
        assert_eq!(tree.size(copied), 3);
        assert_eq!(tree.size(b1), 3);
    }

    // ----------------------------------------------------------
    // Multiply
    // ----------------------------------------------------------

    #[test]
    fn multiply_root_is_noop() {
        let mut tree = sample();
        let count = tree.node_count();
        tree.multiply(tree.root(), 5).unwrap();
        assert_eq!(tree.node_count(), count);
    }

    #[test]
    fn multiply_copies_children_but_not_data() {
        let (mut tree, seven) = Tree::from_path("root/a/seven").unwrap();
        let a = tree.parent(seven).unwrap();
        tree.set_data(a, "payload").unwrap();
        tree.set_data(seven, "leaf").unwrap();
        tree.multiply(a, 2).unwrap();

        let a1 = tree.child(tree.root(), "a1").unwrap();
        assert_eq!(tree.data(a1), None);
        let copied_seven = tree.child(a1, "seven").unwrap();
        assert_eq!(tree.data(copied_seven), Some(&"leaf"));
    }

    #[test]
    fn multiply_cascades_to_parent() {
        let (mut tree, c) = Tree::<()>::from_path("r/p/c").unwrap();
        tree.multiply(c, 1).unwrap();
        // p gets c1, then r gets p1 holding copies of c and c1.
        assert!(tree.find_by_path(tree.root(), "p/c1").is_some());
        assert!(tree.find_by_path(tree.root(), "p1/c").is_some());
        assert!(tree.find_by_path(tree.root(), "p1/c1").is_some());
        assert_eq!(tree.node_count(), 7);
    }

    // ----------------------------------------------------------
    // Rendering and handles
    // ----------------------------------------------------------

    #[test]
    fn display_indents_by_depth() {
        let mut tree = Tree::new("root").unwrap();
        let a = tree.add_child(tree.root(), "a", Some(1)).unwrap();
        tree.add_child(a, "b", None).unwrap();
        assert_eq!(tree.to_string(), "root\n  a = 1\n    b\n");
    }

    #[test]
    fn node_refs_compare_by_identity() {
        let left = sample();
        let right = sample();
        assert_eq!(left.root_node(), left.root_node());
        assert_ne!(left.root_node(), right.root_node());
        assert_eq!(format!("{:?}", left.root_node()), "NodeRef(\"a\")");
    }
}
