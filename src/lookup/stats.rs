use itertools::Itertools;

use super::PrefixLookup;
use crate::error::LookupError;
use crate::models::{
    merged_cidrs, CombinedEntry, DelegatedStatsEntry, Prefix, ResourceAfi,
};

/// Composite key for one merge partition. A partition can never mix
/// registries or families because the key carries both.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct GroupKey {
    rir: String,
    afi: ResourceAfi,
    opaque_id: Option<String>,
}

impl GroupKey {
    fn registry(entry: &DelegatedStatsEntry) -> Self {
        GroupKey {
            rir: entry.rir.clone(),
            afi: entry.afi,
            opaque_id: None,
        }
    }

    fn allocation(entry: &DelegatedStatsEntry, opaque_id: &str) -> Self {
        GroupKey {
            rir: entry.rir.clone(),
            afi: entry.afi,
            opaque_id: Some(opaque_id.to_string()),
        }
    }
}

fn ip_entries(entries: &[DelegatedStatsEntry]) -> impl Iterator<Item = &DelegatedStatsEntry> {
    entries.iter().filter(|entry| entry.afi.is_ip())
}

/// The fewest aligned CIDR blocks exactly covering the union of the
/// members' address ranges.
fn covering_blocks<'a>(
    members: impl IntoIterator<Item = &'a DelegatedStatsEntry>,
) -> Vec<Prefix> {
    merged_cidrs(
        members
            .into_iter()
            .filter_map(|entry| entry.resource.ip_range())
            .collect(),
    )
}

/// Per-record allocation lookup: every CIDR fragment of a delegation
/// points at its line. ASN lines never participate.
pub struct StatsEntryLookup {
    inner: PrefixLookup<DelegatedStatsEntry>,
}

impl StatsEntryLookup {
    pub fn new(entries: &[DelegatedStatsEntry]) -> Self {
        let mut inner = PrefixLookup::new();
        for entry in ip_entries(entries) {
            for cidr in entry.resource.cidrs() {
                inner.insert(cidr, entry.clone());
            }
        }
        StatsEntryLookup { inner }
    }

    pub fn get(&self, prefix: &Prefix) -> Option<&DelegatedStatsEntry> {
        self.inner.get(prefix)
    }

    pub fn require(&self, prefix: &Prefix) -> Result<&DelegatedStatsEntry, LookupError> {
        self.inner.require(prefix)
    }

    /// The delegation covering `prefix` and all less specifics above
    /// it, most specific first.
    pub fn lookup(&self, prefix: &Prefix) -> Vec<&DelegatedStatsEntry> {
        self.inner.lookup(prefix)
    }

    /// Delegations inside `prefix`, plus the one at its nearest
    /// covering key.
    pub fn children(&self, prefix: &Prefix) -> Vec<&DelegatedStatsEntry> {
        self.inner.children(prefix)
    }
}

/// Registry ownership lookup: merges each registry's delegations into
/// minimal covering blocks and stores the registry id under each block.
pub struct RirLookup {
    inner: PrefixLookup<String>,
}

impl RirLookup {
    pub fn new(entries: &[DelegatedStatsEntry]) -> Self {
        let keyed = ip_entries(entries)
            .map(|entry| (GroupKey::registry(entry), entry))
            .sorted_by(|a, b| a.0.cmp(&b.0));
        let chunks = keyed.chunk_by(|(key, _)| key.clone());

        let mut inner = PrefixLookup::new();
        for (key, group) in &chunks {
            for block in covering_blocks(group.map(|(_, entry)| entry)) {
                inner.insert(block, key.rir.clone());
            }
        }
        RirLookup { inner }
    }

    pub fn get(&self, prefix: &Prefix) -> Option<&String> {
        self.inner.get(prefix)
    }

    /// The registry responsible for `prefix`, resolved through the most
    /// specific covering block.
    pub fn rir_for(&self, prefix: &Prefix) -> Option<&str> {
        self.inner
            .lookup(prefix)
            .first()
            .map(|rir| rir.as_str())
    }

    pub fn lookup(&self, prefix: &Prefix) -> Vec<&String> {
        self.inner.lookup(prefix)
    }
}

/// Allocation groups merged to covering blocks: answers "what is the
/// full allocation history behind this range".
pub struct CombinedAllocationsLookup {
    inner: PrefixLookup<CombinedEntry>,
}

impl CombinedAllocationsLookup {
    /// Groups extended delegated stats by (registry, family, opaque id)
    /// and stores one [`CombinedEntry`] per covering block. Every block
    /// of a group references all of the group's lines. Records without
    /// an opaque id cannot be grouped; feeding plain (non-extended)
    /// stats in is a contract violation and aborts construction.
    pub fn new(entries: &[DelegatedStatsEntry]) -> Result<Self, LookupError> {
        let mut keyed = Vec::new();
        for entry in ip_entries(entries) {
            let opaque_id = entry.opaque_id.as_deref().ok_or_else(|| {
                LookupError::ContractViolation(format!(
                    "delegation line for {} in {} has no opaque id; combined \
                     allocations need extended stats",
                    entry.resource, entry.rir
                ))
            })?;
            keyed.push((GroupKey::allocation(entry, opaque_id), entry));
        }

        let sorted = keyed.into_iter().sorted_by(|a, b| a.0.cmp(&b.0));
        let chunks = sorted.chunk_by(|(key, _)| key.clone());

        let mut inner = PrefixLookup::new();
        for (key, group) in &chunks {
            let members: Vec<&DelegatedStatsEntry> = group.map(|(_, entry)| entry).collect();
            let records: Vec<DelegatedStatsEntry> =
                members.iter().map(|&entry| entry.clone()).collect();
            let opaque_id = key.opaque_id.clone().unwrap_or_default();
            for block in covering_blocks(members.iter().copied()) {
                inner.insert(
                    block,
                    CombinedEntry {
                        rir: key.rir.clone(),
                        opaque_id: opaque_id.clone(),
                        entries: records.clone(),
                        resource: block,
                    },
                );
            }
        }
        Ok(CombinedAllocationsLookup { inner })
    }

    pub fn get(&self, prefix: &Prefix) -> Option<&CombinedEntry> {
        self.inner.get(prefix)
    }

    pub fn require(&self, prefix: &Prefix) -> Result<&CombinedEntry, LookupError> {
        self.inner.require(prefix)
    }

    /// The allocation covering `prefix` and all less specifics above
    /// it, most specific first.
    pub fn lookup(&self, prefix: &Prefix) -> Vec<&CombinedEntry> {
        self.inner.lookup(prefix)
    }

    /// Allocations inside `prefix`, plus the one at its nearest
    /// covering key.
    pub fn children(&self, prefix: &Prefix) -> Vec<&CombinedEntry> {
        self.inner.children(prefix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AddrRange, Resource};
    use chrono::NaiveDate;
    use std::net::IpAddr;
    use std::str::FromStr;

    fn v4_entry(rir: &str, opaque_id: Option<&str>, start: &str, count: u128) -> DelegatedStatsEntry {
        DelegatedStatsEntry {
            rir: rir.to_string(),
            country: "NL".to_string(),
            afi: ResourceAfi::Ipv4,
            length: count as u64,
            date: NaiveDate::from_ymd_opt(2005, 1, 1).unwrap(),
            status: "allocated".to_string(),
            opaque_id: opaque_id.map(str::to_string),
            category: None,
            resource: Resource::Ipv4(AddrRange::from_count(
                IpAddr::from_str(start).unwrap(),
                count,
            )),
        }
    }

    fn asn_entry(rir: &str) -> DelegatedStatsEntry {
        DelegatedStatsEntry {
            rir: rir.to_string(),
            country: "NL".to_string(),
            afi: ResourceAfi::Asn,
            length: 1,
            date: NaiveDate::from_ymd_opt(2005, 1, 1).unwrap(),
            status: "allocated".to_string(),
            opaque_id: Some("asn-holder".to_string()),
            category: None,
            resource: Resource::Asn(crate::models::AsnRange {
                start: crate::models::Asn::new(3333),
                count: 1,
            }),
        }
    }

    fn p(s: &str) -> Prefix {
        Prefix::from_str(s).unwrap()
    }

    #[test]
    fn test_stats_entry_lookup() {
        let entries = vec![
            v4_entry("ripencc", Some("a1"), "193.0.0.0", 2048),
            v4_entry("arin", Some("b1"), "10.0.0.0", 256),
            asn_entry("ripencc"),
        ];
        let lookup = StatsEntryLookup::new(&entries);

        assert_eq!(lookup.get(&p("193.0.0.0/21")).unwrap().rir, "ripencc");
        assert_eq!(lookup.lookup(&p("193.0.0.0/24"))[0].rir, "ripencc");
        assert!(lookup.get(&p("193.0.0.0/16")).is_none());
        assert!(lookup.require(&p("192.0.2.0/24")).is_err());
    }

    #[test]
    fn test_unaligned_delegation_fragments_point_at_one_line() {
        // 1536 addresses: a /22 plus a /23, both referencing the line
        let entries = vec![v4_entry("ripencc", Some("a1"), "193.0.0.0", 1536)];
        let lookup = StatsEntryLookup::new(&entries);
        assert!(lookup.get(&p("193.0.0.0/22")).is_some());
        assert!(lookup.get(&p("193.0.4.0/23")).is_some());
        assert_eq!(
            lookup.get(&p("193.0.0.0/22")).unwrap(),
            lookup.get(&p("193.0.4.0/23")).unwrap()
        );
    }

    #[test]
    fn test_rir_lookup_merges_across_allocations() {
        let entries = vec![
            v4_entry("ripencc", Some("a1"), "193.0.0.0", 1024),
            v4_entry("ripencc", Some("a2"), "193.0.4.0", 1024),
            v4_entry("arin", Some("b1"), "10.0.0.0", 256),
            asn_entry("ripencc"),
        ];
        let lookup = RirLookup::new(&entries);

        // the two adjacent RIPE NCC allocations merge to one /21 block
        assert_eq!(lookup.get(&p("193.0.0.0/21")).unwrap(), "ripencc");
        assert!(lookup.get(&p("193.0.0.0/22")).is_none());

        assert_eq!(lookup.rir_for(&p("193.0.2.0/24")), Some("ripencc"));
        assert_eq!(lookup.rir_for(&p("10.0.0.128/25")), Some("arin"));
        assert_eq!(lookup.rir_for(&p("192.0.2.0/24")), None);
    }

    #[test]
    fn test_combined_allocations_group_by_opaque_id() {
        let entries = vec![
            v4_entry("ripencc", Some("a1"), "193.0.0.0", 1024),
            v4_entry("ripencc", Some("a1"), "193.0.4.0", 1024),
            v4_entry("ripencc", Some("a2"), "193.0.8.0", 1024),
        ];
        let lookup = CombinedAllocationsLookup::new(&entries).unwrap();

        // a1's adjacent fragments merge into one covering /21
        let combined = lookup.get(&p("193.0.0.0/21")).unwrap();
        assert_eq!(combined.opaque_id, "a1");
        assert_eq!(combined.entries.len(), 2);

        // a2 stays separate even though it is adjacent to a1
        let combined = lookup.get(&p("193.0.8.0/22")).unwrap();
        assert_eq!(combined.opaque_id, "a2");
        assert_eq!(combined.entries.len(), 1);
    }

    #[test]
    fn test_combined_allocations_fragmented_group() {
        // non-contiguous fragments: two covering blocks, each
        // referencing the full history, each overlapping only its own
        // fragment
        let entries = vec![
            v4_entry("ripencc", Some("a1"), "193.0.0.0", 1024),
            v4_entry("ripencc", Some("a1"), "193.0.16.0", 1024),
        ];
        let lookup = CombinedAllocationsLookup::new(&entries).unwrap();

        for block in ["193.0.0.0/22", "193.0.16.0/22"] {
            let combined = lookup.get(&p(block)).unwrap();
            assert_eq!(combined.entries.len(), 2);
            assert_eq!(combined.overlapping_entries().len(), 1);
        }
    }

    #[test]
    fn test_combined_allocations_reject_missing_opaque_id() {
        let entries = vec![v4_entry("ripencc", None, "193.0.0.0", 1024)];
        assert!(matches!(
            CombinedAllocationsLookup::new(&entries),
            Err(LookupError::ContractViolation(_))
        ));
    }

    #[test]
    fn test_rebuild_is_deterministic() {
        let mut entries = vec![
            v4_entry("ripencc", Some("a1"), "193.0.0.0", 1024),
            v4_entry("ripencc", Some("a2"), "193.0.8.0", 1024),
            v4_entry("arin", Some("b1"), "10.0.0.0", 256),
        ];
        let first = CombinedAllocationsLookup::new(&entries).unwrap();
        entries.reverse();
        let second = CombinedAllocationsLookup::new(&entries).unwrap();
        for block in ["193.0.0.0/22", "193.0.8.0/22", "10.0.0.0/24"] {
            assert_eq!(
                first.get(&p(block)).map(|c| (&c.rir, &c.opaque_id)),
                second.get(&p(block)).map(|c| (&c.rir, &c.opaque_id))
            );
        }
    }
}
