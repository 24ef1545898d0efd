//! Binary prefix trie, one instance per address family.
//!
//! The trie maps canonical prefixes to values and exposes the walk
//! primitives the lookup structures are built from: exact access,
//! covering-key resolution, the parent chain and nearest stored
//! descendants. It is populated once from a batch and then only read.

use crate::models::{Afi, Prefix};

/// A trie node. A node is *stored* when its prefix is a key of the
/// trie; other nodes only connect stored keys. The family root is
/// always stored so ancestor walks bottom out, but it carries a value
/// only when one was inserted for the zero-length prefix.
struct Node<V> {
    stored: bool,
    value: Option<V>,
    left: Option<Box<Node<V>>>,
    right: Option<Box<Node<V>>>,
}

impl<V> Node<V> {
    fn empty() -> Self {
        Node {
            stored: false,
            value: None,
            left: None,
            right: None,
        }
    }

    fn child(&self, bit: bool) -> Option<&Node<V>> {
        if bit {
            self.right.as_deref()
        } else {
            self.left.as_deref()
        }
    }

    fn child_or_insert(&mut self, bit: bool) -> &mut Node<V> {
        let slot = if bit { &mut self.right } else { &mut self.left };
        slot.get_or_insert_with(|| Box::new(Node::empty()))
    }
}

/// A binary trie over the prefixes of one address family.
pub struct PrefixTrie<V> {
    afi: Afi,
    root: Node<V>,
}

impl<V> PrefixTrie<V> {
    pub fn new(afi: Afi) -> Self {
        PrefixTrie {
            afi,
            root: Node {
                stored: true,
                value: None,
                left: None,
                right: None,
            },
        }
    }

    pub fn afi(&self) -> Afi {
        self.afi
    }

    fn node(&self, prefix: &Prefix) -> Option<&Node<V>> {
        debug_assert_eq!(prefix.afi(), self.afi);
        let mut node = &self.root;
        for depth in 0..prefix.prefix_len() {
            node = node.child(prefix.bit(depth))?;
        }
        Some(node)
    }

    /// Binds `value` to the exact canonical prefix, replacing any
    /// existing binding.
    pub fn insert(&mut self, prefix: Prefix, value: V) {
        debug_assert_eq!(prefix.afi(), self.afi);
        let mut node = &mut self.root;
        for depth in 0..prefix.prefix_len() {
            node = node.child_or_insert(prefix.bit(depth));
        }
        node.stored = true;
        node.value = Some(value);
    }

    /// The value bound at exactly `prefix`. Absence is a value, not an
    /// error; covering entries are the caller's concern.
    pub fn get(&self, prefix: &Prefix) -> Option<&V> {
        self.node(prefix)?.value.as_ref()
    }

    pub fn get_mut(&mut self, prefix: &Prefix) -> Option<&mut V> {
        debug_assert_eq!(prefix.afi(), self.afi);
        let mut node = &mut self.root;
        for depth in 0..prefix.prefix_len() {
            node = match prefix.bit(depth) {
                true => node.right.as_deref_mut()?,
                false => node.left.as_deref_mut()?,
            };
        }
        node.value.as_mut()
    }

    /// Entry-style access: binds `default()` at `prefix` unless a value
    /// is already present, then hands out the binding.
    pub fn or_insert_with(&mut self, prefix: Prefix, default: impl FnOnce() -> V) -> &mut V {
        debug_assert_eq!(prefix.afi(), self.afi);
        let mut node = &mut self.root;
        for depth in 0..prefix.prefix_len() {
            node = node.child_or_insert(prefix.bit(depth));
        }
        node.stored = true;
        node.value.get_or_insert_with(default)
    }

    /// Whether `prefix` is a stored key. The sentinel root counts even
    /// when it has no value.
    pub fn has_key(&self, prefix: &Prefix) -> bool {
        self.node(prefix).is_some_and(|node| node.stored)
    }

    /// The deepest stored key equal to `prefix` or covering it. Total:
    /// the family root is always stored.
    pub fn key_for(&self, prefix: &Prefix) -> Prefix {
        debug_assert_eq!(prefix.afi(), self.afi);
        let mut node = &self.root;
        let mut deepest = 0;
        for depth in 0..prefix.prefix_len() {
            match node.child(prefix.bit(depth)) {
                Some(child) => {
                    node = child;
                    if node.stored {
                        deepest = depth + 1;
                    }
                }
                None => break,
            }
        }
        self.truncated(prefix, deepest)
    }

    /// The deepest stored proper ancestor of `key`, or `None` at the
    /// family root.
    pub fn parent_of(&self, key: &Prefix) -> Option<Prefix> {
        debug_assert_eq!(key.afi(), self.afi);
        if key.prefix_len() == 0 {
            return None;
        }
        let mut node = &self.root;
        let mut deepest = 0;
        for depth in 0..key.prefix_len() - 1 {
            match node.child(key.bit(depth)) {
                Some(child) => {
                    node = child;
                    if node.stored {
                        deepest = depth + 1;
                    }
                }
                None => break,
            }
        }
        Some(self.truncated(key, deepest))
    }

    /// The nearest stored descendants of `key`: every stored key below
    /// it with no other stored key in between. Intermediate structural
    /// nodes are skipped, so a child is not necessarily one bit longer.
    pub fn children_of(&self, key: &Prefix) -> Vec<Prefix> {
        debug_assert_eq!(key.afi(), self.afi);
        let mut out = Vec::new();
        let Some(node) = self.node(key) else {
            return out;
        };
        let depth = key.prefix_len();
        if depth == self.afi.bits() {
            return out;
        }
        if let Some(left) = node.left.as_deref() {
            self.collect_nearest(left, key.bits(), depth + 1, &mut out);
        }
        if let Some(right) = node.right.as_deref() {
            let bits = key.bits() | 1u128 << (self.afi.bits() - 1 - depth);
            self.collect_nearest(right, bits, depth + 1, &mut out);
        }
        out
    }

    fn collect_nearest(&self, node: &Node<V>, bits: u128, depth: u8, out: &mut Vec<Prefix>) {
        if node.stored {
            out.push(Prefix::from_bits(self.afi, bits, depth));
            return;
        }
        if let Some(left) = node.left.as_deref() {
            self.collect_nearest(left, bits, depth + 1, out);
        }
        if let Some(right) = node.right.as_deref() {
            let bits = bits | 1u128 << (self.afi.bits() - 1 - depth);
            self.collect_nearest(right, bits, depth + 1, out);
        }
    }

    fn truncated(&self, prefix: &Prefix, len: u8) -> Prefix {
        let bits = if len == 0 {
            0
        } else {
            let host_bits = self.afi.bits() - len;
            prefix.bits() >> host_bits << host_bits
        };
        Prefix::from_bits(self.afi, bits, len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn p(s: &str) -> Prefix {
        Prefix::from_str(s).unwrap()
    }

    fn build_trie(prefixes: &[&str]) -> PrefixTrie<String> {
        let mut trie = PrefixTrie::new(Afi::Ipv4);
        for prefix in prefixes {
            trie.insert(p(prefix), prefix.to_string());
        }
        trie
    }

    #[test]
    fn test_insert_and_get() {
        let mut trie = build_trie(&["193.0.0.0/21", "193.0.0.0/24"]);
        assert_eq!(trie.get(&p("193.0.0.0/21")).unwrap(), "193.0.0.0/21");
        assert_eq!(trie.get(&p("193.0.0.0/24")).unwrap(), "193.0.0.0/24");
        assert!(trie.get(&p("193.0.0.0/22")).is_none());
        assert!(trie.get(&p("0.0.0.0/0")).is_none());

        // exact overwrite, regardless of structurally overlapping keys
        trie.insert(p("193.0.0.0/21"), "replaced".to_string());
        assert_eq!(trie.get(&p("193.0.0.0/21")).unwrap(), "replaced");
        assert_eq!(trie.get(&p("193.0.0.0/24")).unwrap(), "193.0.0.0/24");
    }

    #[test]
    fn test_insertion_order_is_irrelevant() {
        let forward = build_trie(&["10.0.0.0/8", "10.0.0.0/16", "10.1.0.0/16"]);
        let backward = build_trie(&["10.1.0.0/16", "10.0.0.0/16", "10.0.0.0/8"]);
        for key in ["10.0.0.0/8", "10.0.0.0/16", "10.1.0.0/16"] {
            assert_eq!(forward.get(&p(key)), backward.get(&p(key)));
        }
        assert_eq!(
            forward.children_of(&p("10.0.0.0/8")),
            backward.children_of(&p("10.0.0.0/8"))
        );
    }

    #[test]
    fn test_key_for_exact_and_covering() {
        let trie = build_trie(&["193.0.0.0/21"]);
        assert_eq!(trie.key_for(&p("193.0.0.0/21")), p("193.0.0.0/21"));
        // more specific query resolves to the covering stored key
        assert_eq!(trie.key_for(&p("193.0.0.0/24")), p("193.0.0.0/21"));
        assert_eq!(trie.key_for(&p("193.0.0.1/32")), p("193.0.0.0/21"));
        // unrelated query bottoms out at the sentinel root
        assert_eq!(trie.key_for(&p("10.0.0.0/8")), p("0.0.0.0/0"));
    }

    #[test]
    fn test_parent_chain() {
        let trie = build_trie(&["10.0.0.0/8", "10.0.0.0/16", "10.0.0.0/24"]);
        assert_eq!(trie.parent_of(&p("10.0.0.0/24")), Some(p("10.0.0.0/16")));
        assert_eq!(trie.parent_of(&p("10.0.0.0/16")), Some(p("10.0.0.0/8")));
        assert_eq!(trie.parent_of(&p("10.0.0.0/8")), Some(p("0.0.0.0/0")));
        assert_eq!(trie.parent_of(&p("0.0.0.0/0")), None);
    }

    #[test]
    fn test_children_skip_unstored_levels() {
        // no stored key between /8 and the /24s
        let trie = build_trie(&["10.0.0.0/8", "10.0.0.0/24", "10.0.1.0/24", "10.128.0.0/24"]);
        let mut children = trie.children_of(&p("10.0.0.0/8"));
        children.sort();
        assert_eq!(
            children,
            vec![p("10.0.0.0/24"), p("10.0.1.0/24"), p("10.128.0.0/24")]
        );

        // a stored key shadows everything below it
        let trie = build_trie(&["10.0.0.0/8", "10.0.0.0/16", "10.0.0.0/24"]);
        assert_eq!(trie.children_of(&p("10.0.0.0/8")), vec![p("10.0.0.0/16")]);
        assert_eq!(trie.children_of(&p("10.0.0.0/16")), vec![p("10.0.0.0/24")]);
        assert!(trie.children_of(&p("10.0.0.0/24")).is_empty());
    }

    #[test]
    fn test_root_children() {
        let trie = build_trie(&["10.0.0.0/8", "193.0.0.0/21"]);
        let mut children = trie.children_of(&p("0.0.0.0/0"));
        children.sort();
        assert_eq!(children, vec![p("10.0.0.0/8"), p("193.0.0.0/21")]);
    }

    #[test]
    fn test_or_insert_with() {
        let mut trie: PrefixTrie<Vec<u32>> = PrefixTrie::new(Afi::Ipv4);
        trie.or_insert_with(p("193.0.0.0/21"), Vec::new).push(1);
        trie.or_insert_with(p("193.0.0.0/21"), Vec::new).push(2);
        assert_eq!(trie.get(&p("193.0.0.0/21")).unwrap(), &vec![1, 2]);
    }

    #[test]
    fn test_sentinel_root_is_key_without_value() {
        let trie: PrefixTrie<String> = PrefixTrie::new(Afi::Ipv6);
        let root = Prefix::from_str("::/0").unwrap();
        assert!(trie.has_key(&root));
        assert!(trie.get(&root).is_none());
        assert_eq!(trie.key_for(&Prefix::from_str("2001:db8::/32").unwrap()), root);
    }

    #[test]
    fn test_host_prefix_keys() {
        let mut trie: PrefixTrie<String> = PrefixTrie::new(Afi::Ipv4);
        trie.insert(p("193.0.0.1/32"), "host".to_string());
        assert_eq!(trie.get(&p("193.0.0.1/32")).unwrap(), "host");
        assert!(trie.children_of(&p("193.0.0.1/32")).is_empty());
        assert_eq!(trie.parent_of(&p("193.0.0.1/32")), Some(p("0.0.0.0/0")));
    }
}
