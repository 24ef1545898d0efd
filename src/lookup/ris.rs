use std::collections::HashSet;

use super::PrefixLookup;
use crate::models::{Prefix, RisEntry};

/// Default minimum number of RIS peers that must see an announcement
/// before it counts as visible.
pub const DEFAULT_VISIBILITY_THRESHOLD: u32 = 10;

/// BGP visibility data from RIPE RIS `riswhoisdump` files.
///
/// Every key holds the set of entries announced for exactly that
/// prefix; default routes land on the zero-length root key, which is
/// why ancestor walks over this data usually end in a handful of 0/0
/// origins rather than nothing.
pub struct RisWhoisLookup {
    inner: PrefixLookup<HashSet<RisEntry>>,
}

impl RisWhoisLookup {
    /// Keeps entries seen by at least `visibility_threshold` peers.
    pub fn with_threshold(
        entries: impl IntoIterator<Item = RisEntry>,
        visibility_threshold: u32,
    ) -> Self {
        let mut inner = PrefixLookup::new();
        for entry in entries
            .into_iter()
            .filter(|entry| entry.seen_by_peers >= visibility_threshold)
        {
            inner.or_insert_with(entry.prefix, HashSet::new).insert(entry);
        }
        RisWhoisLookup { inner }
    }

    pub fn new(entries: impl IntoIterator<Item = RisEntry>) -> Self {
        Self::with_threshold(entries, DEFAULT_VISIBILITY_THRESHOLD)
    }

    /// Entries for `prefix` and every less specific covering it, most
    /// specific key first.
    pub fn lookup(&self, prefix: &Prefix) -> Vec<&RisEntry> {
        self.inner.lookup(prefix).into_iter().flatten().collect()
    }

    /// Entries strictly more specific than `prefix`.
    pub fn more_specifics(&self, prefix: &Prefix) -> Vec<&RisEntry> {
        self.inner
            .more_specifics(prefix)
            .into_iter()
            .flatten()
            .collect()
    }

    /// Everything under `prefix` plus the exact match and everything
    /// covering it.
    pub fn more_and_less_specifics(&self, prefix: &Prefix) -> Vec<&RisEntry> {
        self.inner
            .more_and_less_specifics(prefix)
            .into_iter()
            .flatten()
            .collect()
    }

    pub fn contains(&self, prefix: &Prefix) -> bool {
        self.inner.contains(prefix)
    }
}
