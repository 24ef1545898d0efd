//! Prefix-indexed lookup structures.
//!
//! [`PrefixLookup`] pairs one trie per address family behind a single
//! prefix-keyed API and implements the four traversal policies the
//! domain lookups are built from. The domain lookups decide whether a
//! key holds a single value ([`StatsEntryLookup`], [`RirLookup`],
//! [`CombinedAllocationsLookup`]) or a set of values ([`RoaLookup`],
//! [`RisWhoisLookup`]).

mod ris;
mod roa;
mod stats;

pub use ris::{RisWhoisLookup, DEFAULT_VISIBILITY_THRESHOLD};
pub use roa::RoaLookup;
pub use stats::{CombinedAllocationsLookup, RirLookup, StatsEntryLookup};

use crate::error::LookupError;
use crate::models::{Afi, Prefix};
use crate::trie::PrefixTrie;

/// A pair of per-family tries behind one prefix-keyed API.
///
/// Construction seeds both family roots as sentinel keys so ancestor
/// and descendant walks always bottom out; a sentinel root never yields
/// a value. Once populated the structure is only read, so shared
/// references may be queried concurrently.
pub struct PrefixLookup<V> {
    trie4: PrefixTrie<V>,
    trie6: PrefixTrie<V>,
}

impl<V> Default for PrefixLookup<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> PrefixLookup<V> {
    pub fn new() -> Self {
        PrefixLookup {
            trie4: PrefixTrie::new(Afi::Ipv4),
            trie6: PrefixTrie::new(Afi::Ipv6),
        }
    }

    /// The trie matching the address family of the query.
    fn trie(&self, prefix: &Prefix) -> &PrefixTrie<V> {
        match prefix.afi() {
            Afi::Ipv4 => &self.trie4,
            Afi::Ipv6 => &self.trie6,
        }
    }

    fn trie_mut(&mut self, prefix: &Prefix) -> &mut PrefixTrie<V> {
        match prefix.afi() {
            Afi::Ipv4 => &mut self.trie4,
            Afi::Ipv6 => &mut self.trie6,
        }
    }

    /// Binds `value` at the exact canonical prefix, replacing any
    /// existing binding.
    pub fn insert(&mut self, prefix: Prefix, value: V) {
        self.trie_mut(&prefix).insert(prefix, value);
    }

    /// Entry-style access for set-valued stores.
    pub fn or_insert_with(&mut self, prefix: Prefix, default: impl FnOnce() -> V) -> &mut V {
        self.trie_mut(&prefix).or_insert_with(prefix, default)
    }

    /// The value bound at exactly `prefix`, if any.
    pub fn get(&self, prefix: &Prefix) -> Option<&V> {
        self.trie(prefix).get(prefix)
    }

    pub fn get_mut(&mut self, prefix: &Prefix) -> Option<&mut V> {
        self.trie_mut(prefix).get_mut(prefix)
    }

    /// Like [`get`](Self::get) but with must-exist semantics: absence
    /// becomes [`LookupError::NotFound`].
    pub fn require(&self, prefix: &Prefix) -> Result<&V, LookupError> {
        self.get(prefix)
            .ok_or(LookupError::NotFound { prefix: *prefix })
    }

    pub fn contains(&self, prefix: &Prefix) -> bool {
        self.get(prefix).is_some()
    }

    /// Values for `prefix` and every less specific stored above it,
    /// most specific first. A value bound at the zero-length root is
    /// yielded last; a bare sentinel root is not.
    pub fn lookup(&self, prefix: &Prefix) -> Vec<&V> {
        let trie = self.trie(prefix);
        let mut out = Vec::new();
        let mut key = Some(trie.key_for(prefix));
        while let Some(current) = key {
            if let Some(value) = trie.get(&current) {
                out.push(value);
            }
            key = trie.parent_of(&current);
        }
        out
    }

    /// The value at the nearest covering key plus every stored
    /// descendant overlapping `prefix`. When `prefix` itself is unbound
    /// the walk starts at its closest covering key, whose value (a less
    /// specific) is included; sibling branches outside the query are
    /// pruned.
    pub fn children(&self, prefix: &Prefix) -> Vec<&V> {
        let trie = self.trie(prefix);
        let mut out = Vec::new();
        let mut stack = vec![trie.key_for(prefix)];
        while let Some(key) = stack.pop() {
            for child in trie.children_of(&key) {
                if child.overlaps(prefix) {
                    stack.push(child);
                }
            }
            if let Some(value) = trie.get(&key) {
                out.push(value);
            }
        }
        out
    }

    /// Values at stored keys *strictly* more specific than `prefix`:
    /// contained in it and not equal to it. The exact key's own value
    /// is never yielded; combine with [`lookup`](Self::lookup) (or use
    /// [`more_and_less_specifics`](Self::more_and_less_specifics)) when
    /// the exact match is wanted too.
    pub fn more_specifics(&self, prefix: &Prefix) -> Vec<&V> {
        let trie = self.trie(prefix);
        let mut out = Vec::new();
        // The start key covers the query, so none of its children can be
        // an ancestor of the query: containment pruning walks exactly
        // the query's subtree.
        let mut stack = vec![trie.key_for(prefix)];
        while let Some(key) = stack.pop() {
            for child in trie.children_of(&key) {
                if prefix.contains(&child) {
                    stack.push(child);
                }
            }
            if key != *prefix && prefix.contains(&key) {
                if let Some(value) = trie.get(&key) {
                    out.push(value);
                }
            }
        }
        out
    }

    /// Union of [`more_specifics`](Self::more_specifics) and
    /// [`lookup`](Self::lookup): everything under the query plus the
    /// exact match and everything above it. The two passes are disjoint
    /// by construction, so no value is yielded twice.
    pub fn more_and_less_specifics(&self, prefix: &Prefix) -> Vec<&V> {
        let mut out = self.more_specifics(prefix);
        out.extend(self.lookup(prefix));
        out
    }
}
