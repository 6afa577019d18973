//! Trees that notify listeners about structural and data mutations.
//!
//! [`ObservableTree`] decorates a [`Tree`] with one listener set shared by
//! the whole tree. Every registration and every notification goes through
//! that set's mutex: one coarse lock per tree, none per node. Events fire
//! synchronously, in registration order, on a snapshot of the set, so a
//! listener may add or remove listeners from inside a callback.
//!
//! Reads go through `Deref<Target = Tree<T>>`; all mutation goes through the
//! decorator so that no change can bypass the listeners.

use std::ops::Deref;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::debug;

use crate::error::TreeResult;
use crate::tree::{NodeId, Tree};

/// Identifies a registered listener for later removal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// A mutation observed on an [`ObservableTree`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeEvent {
    /// `child` was linked under `parent`.
    NodeAdded {
        /// The node that received the child.
        parent: NodeId,
        /// The new node.
        child: NodeId,
    },
    /// Data was associated with `node`.
    DataAssociated {
        /// The node that now carries data.
        node: NodeId,
    },
}

/// Receives mutation events from an [`ObservableTree`].
///
/// Both callbacks default to no-ops.
pub trait NodeListener<T>: Send + Sync {
    /// Called after `child` has been linked under `parent`.
    fn on_node_added(&self, _tree: &ObservableTree<T>, _parent: NodeId, _child: NodeId) {}

    /// Called after data has been associated with `node`.
    fn on_data_associated(&self, _tree: &ObservableTree<T>, _node: NodeId) {}
}

/// Adapts a closure receiving [`NodeEvent`]s into a [`NodeListener`].
pub struct FnListener<F>(pub F);

impl<T, F> NodeListener<T> for FnListener<F>
where
    F: Fn(&ObservableTree<T>, NodeEvent) + Send + Sync,
{
    fn on_node_added(&self, tree: &ObservableTree<T>, parent: NodeId, child: NodeId) {
        (self.0)(tree, NodeEvent::NodeAdded { parent, child })
    }

    fn on_data_associated(&self, tree: &ObservableTree<T>, node: NodeId) {
        (self.0)(tree, NodeEvent::DataAssociated { node })
    }
}

type Registration<T> = (ListenerId, Arc<dyn NodeListener<T>>);

struct Listeners<T> {
    next_id: u64,
    entries: Vec<Registration<T>>,
}

/// A [`Tree`] whose mutations are reported to registered listeners.
pub struct ObservableTree<T> {
    tree: Tree<T>,
    // Created on first registration.
    listeners: Mutex<Option<Listeners<T>>>,
}

impl<T> ObservableTree<T> {
    /// Create an observable tree with a single root node.
    pub fn new(name: impl Into<String>) -> TreeResult<Self> {
        Ok(Self::from_tree(Tree::new(name)?))
    }

    /// Wrap an existing tree. Nodes already present produce no events.
    pub fn from_tree(tree: Tree<T>) -> Self {
        Self {
            tree,
            listeners: Mutex::new(None),
        }
    }

    /// The underlying tree.
    pub fn tree(&self) -> &Tree<T> {
        &self.tree
    }

    /// Unwrap the underlying tree, dropping every listener.
    pub fn into_inner(self) -> Tree<T> {
        self.tree
    }

    // ---------------------------------------------------------------
    // Listener registration
    // ---------------------------------------------------------------

    /// Register a listener for the whole tree.
    pub fn add_listener(&self, listener: Arc<dyn NodeListener<T>>) -> ListenerId {
        let mut guard = self.lock();
        let listeners = guard.get_or_insert_with(|| Listeners {
            next_id: 0,
            entries: Vec::new(),
        });
        let id = ListenerId(listeners.next_id);
        listeners.next_id += 1;
        listeners.entries.push((id, listener));
        debug!(listener = id.0, total = listeners.entries.len(), "registered tree listener");
        id
    }

    /// Remove a listener. Returns `true` if it was registered.
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        let mut guard = self.lock();
        let Some(listeners) = guard.as_mut() else {
            return false;
        };
        let before = listeners.entries.len();
        listeners.entries.retain(|(registered, _)| *registered != id);
        before != listeners.entries.len()
    }

    /// Number of registered listeners.
    pub fn listener_count(&self) -> usize {
        self.lock().as_ref().map_or(0, |listeners| listeners.entries.len())
    }

    // ---------------------------------------------------------------
    // Mutation
    // ---------------------------------------------------------------

    /// [`Tree::add_child`], then notify.
    pub fn add_child(
        &mut self,
        parent: NodeId,
        name: impl Into<String>,
        data: Option<T>,
    ) -> TreeResult<NodeId> {
        let first_new = self.tree.node_count();
        let id = self.tree.add_child(parent, name, data)?;
        self.announce_since(first_new);
        Ok(id)
    }

    /// [`Tree::set_data`], then notify.
    pub fn set_data(&mut self, id: NodeId, data: T) -> TreeResult<()> {
        self.tree.set_data(id, data)?;
        self.fire(NodeEvent::DataAssociated { node: id });
        Ok(())
    }

    /// [`Tree::parse`], notifying once per created node.
    pub fn parse(&mut self, start: NodeId, path: &str) -> TreeResult<NodeId> {
        let first_new = self.tree.node_count();
        let id = self.tree.parse(start, path)?;
        self.announce_since(first_new);
        Ok(id)
    }

    /// [`Tree::add_all`], notifying once per copied node.
    pub fn add_all(&mut self, parent: NodeId, source: &Tree<T>, node: NodeId) -> TreeResult<NodeId>
    where
        T: Clone,
    {
        let first_new = self.tree.node_count();
        let result = self.tree.add_all(parent, source, node);
        self.announce_since(first_new);
        result
    }

    /// [`Tree::multiply`], notifying once per created node.
    ///
    /// Nodes created before a failing level are still announced.
    pub fn multiply(&mut self, node: NodeId, n: usize) -> TreeResult<()>
    where
        T: Clone,
    {
        let first_new = self.tree.node_count();
        let result = self.tree.multiply(node, n);
        self.announce_since(first_new);
        result
    }

    // ---------------------------------------------------------------
    // Notification
    // ---------------------------------------------------------------

    fn lock(&self) -> MutexGuard<'_, Option<Listeners<T>>> {
        self.listeners.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn snapshot(&self) -> Vec<Arc<dyn NodeListener<T>>> {
        self.lock().as_ref().map_or_else(Vec::new, |listeners| {
            listeners
                .entries
                .iter()
                .map(|(_, listener)| Arc::clone(listener))
                .collect()
        })
    }

    /// Announce every node created since the arena held `first_new` nodes.
    ///
    /// Arena ids are handed out sequentially, so new nodes are exactly the
    /// ids from `first_new` upwards, parents before children.
    fn announce_since(&self, first_new: usize) {
        for child in self.tree.created_since(first_new) {
            if let Some(parent) = self.tree.parent(child) {
                self.fire(NodeEvent::NodeAdded { parent, child });
            }
            if self.tree.data(child).is_some() {
                self.fire(NodeEvent::DataAssociated { node: child });
            }
        }
    }

    fn fire(&self, event: NodeEvent) {
        let listeners = self.snapshot();
        if listeners.is_empty() {
            return;
        }
        for listener in &listeners {
            match event {
                NodeEvent::NodeAdded { parent, child } => listener.on_node_added(self, parent, child),
                NodeEvent::DataAssociated { node } => listener.on_data_associated(self, node),
            }
        }
    }
}

impl<T> Deref for ObservableTree<T> {
    type Target = Tree<T>;

    fn deref(&self) -> &Tree<T> {
        &self.tree
    }
}
