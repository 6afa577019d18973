//! Character trie on top of [`Tree`].
//!
//! Each character of a key is one node, named by that character, so the
//! whole [`crate::traversal`] toolkit applies to tries unchanged. Values live
//! in node data and, like all node data, are write-once.

use tracing::debug;

use crate::error::{TreeError, TreeResult};
use crate::traversal;
use crate::tree::{NodeId, NodeRef, Tree};

/// A map from string keys to values, sharing storage between common prefixes.
#[derive(Clone, Debug)]
pub struct Trie<V> {
    tree: Tree<V>,
    len: usize,
}

impl<V> Trie<V> {
    /// Create an empty trie.
    pub fn new() -> Self {
        Self {
            tree: Tree::with_root(String::new(), None),
            len: 0,
        }
    }

    /// Number of keys stored.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if no key is stored.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Insert a key.
    ///
    /// Fails with [`TreeError::DuplicateKey`] if the key is already present,
    /// and with [`TreeError::InvalidName`] if it contains the path delimiter.
    pub fn insert(&mut self, key: &str, value: V) -> TreeResult<()> {
        let mut current = self.tree.root();
        let mut buf = [0u8; 4];
        for ch in key.chars() {
            let label: &str = ch.encode_utf8(&mut buf);
            current = match self.tree.child(current, label) {
                Some(child) => child,
                None => self.tree.add_child(current, label, None)?,
            };
        }

        if self.tree.data(current).is_some() {
            return Err(TreeError::DuplicateKey(key.to_string()));
        }
        self.tree.set_data(current, value)?;
        self.len += 1;
        debug!(key, keys = self.len, "inserted trie key");
        Ok(())
    }

    /// Value stored under `key`.
    pub fn get(&self, key: &str) -> Option<&V> {
        self.node(key)?.data()
    }

    /// Returns `true` if `key` is stored.
    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Returns `true` if any stored key starts with `prefix`.
    pub fn has_prefix(&self, prefix: &str) -> bool {
        self.node(prefix)
            .is_some_and(|node| traversal::any(node, |n| n.data().is_some()))
    }

    /// Stored keys starting with `prefix`, in ascending order.
    pub fn keys_with_prefix(&self, prefix: &str) -> Vec<String> {
        let Some(start) = self.node(prefix) else {
            return Vec::new();
        };
        let mut keys = Vec::new();
        traversal::depth_first(start, &mut |_depth: usize, node: NodeRef<'_, V>| {
            if node.data().is_some() {
                keys.push(Self::key_of(node));
            }
        });
        keys
    }

    /// The node reached by following `prefix` from the root.
    pub fn node(&self, prefix: &str) -> Option<NodeRef<'_, V>> {
        let mut current: NodeId = self.tree.root();
        let mut buf = [0u8; 4];
        for ch in prefix.chars() {
            current = self.tree.child(current, ch.encode_utf8(&mut buf))?;
        }
        self.tree.get(current)
    }

    /// The trie's root node.
    pub fn root(&self) -> NodeRef<'_, V> {
        self.tree.root_node()
    }

    /// The underlying tree.
    pub fn tree(&self) -> &Tree<V> {
        &self.tree
    }

    fn key_of(node: NodeRef<'_, V>) -> String {
        let mut chars: Vec<&str> = traversal::ancestors(node)
            .into_iter()
            .map(|n| n.name())
            .collect();
        chars.reverse();
        chars.push(node.name());
        chars.concat()
    }
}

impl<V> Default for Trie<V> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Trie<u32> {
        let mut trie = Trie::new();
        for (i, word) in ["tea", "ten", "to", "inn", "in", "tenor"].iter().enumerate() {
            trie.insert(word, i as u32).unwrap();
        }
        trie
    }

    #[test]
    fn insert_and_get() {
        let trie = sample();
        assert_eq!(trie.len(), 6);
        assert_eq!(trie.get("ten"), Some(&1));
        assert_eq!(trie.get("in"), Some(&4));
        assert_eq!(trie.get("te"), None);
        assert!(trie.contains_key("tenor"));
        assert!(!trie.contains_key("tenors"));
    }

    #[test]
    fn duplicate_key_is_rejected() {
        let mut trie = sample();
        assert_eq!(
            trie.insert("to", 99),
            Err(TreeError::DuplicateKey("to".to_string()))
        );
        assert_eq!(trie.get("to"), Some(&2));
        assert_eq!(trie.len(), 6);
    }

    #[test]
    fn prefixes() {
        let trie = sample();
        assert!(trie.has_prefix("te"));
        assert!(trie.has_prefix(""));
        assert!(!trie.has_prefix("x"));
        assert_eq!(trie.keys_with_prefix("te"), vec!["tea", "ten", "tenor"]);
        assert_eq!(
            trie.keys_with_prefix(""),
            vec!["in", "inn", "tea", "ten", "tenor", "to"]
        );
        assert!(trie.keys_with_prefix("q").is_empty());
    }

    #[test]
    fn shared_prefixes_share_nodes() {
        let trie = sample();
        // root + t,e,a,n,o,r,o + i,n,n
        assert_eq!(trie.tree().node_count(), 11);
        assert_eq!(traversal::max_depth(trie.root()), 5);
    }

    #[test]
    fn empty_trie() {
        let trie: Trie<()> = Trie::default();
        assert!(trie.is_empty());
        assert!(!trie.has_prefix(""));
        assert!(trie.keys_with_prefix("").is_empty());
    }

    #[test]
    fn unicode_keys() {
        let mut trie = Trie::new();
        trie.insert("über", 1).unwrap();
        trie.insert("übel", 2).unwrap();
        assert_eq!(trie.keys_with_prefix("üb"), vec!["übel", "über"]);
    }

    #[test]
    fn delimiter_is_not_a_valid_key_character() {
        let mut trie = Trie::new();
        assert!(matches!(
            trie.insert("a/b", 1),
            Err(TreeError::InvalidName { .. })
        ));
    }
}
