use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

use super::{AddrRange, Asn, Prefix, ResourceAfi};

/// An ASN delegation: a first AS number and the count of consecutive
/// numbers handed out with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AsnRange {
    pub start: Asn,
    pub count: u32,
}

impl AsnRange {
    pub fn end(&self) -> Asn {
        Asn::new(
            self.start
                .as_u32()
                .saturating_add(self.count.saturating_sub(1)),
        )
    }
}

impl Display for AsnRange {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.count <= 1 {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{}-{}", self.start, self.end())
        }
    }
}

/// The number resource of one delegation line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Resource {
    /// IPv4 delegations are a start address plus a count and may not be
    /// CIDR aligned.
    Ipv4(AddrRange),
    /// IPv6 delegations are always a single prefix.
    Ipv6(Prefix),
    /// AS number delegations; these never enter a prefix trie.
    Asn(AsnRange),
}

impl Resource {
    pub fn afi(&self) -> ResourceAfi {
        match self {
            Resource::Ipv4(_) => ResourceAfi::Ipv4,
            Resource::Ipv6(_) => ResourceAfi::Ipv6,
            Resource::Asn(_) => ResourceAfi::Asn,
        }
    }

    /// The covered address range, for IP resources.
    pub fn ip_range(&self) -> Option<AddrRange> {
        match self {
            Resource::Ipv4(range) => Some(*range),
            Resource::Ipv6(prefix) => Some(AddrRange::from(*prefix)),
            Resource::Asn(_) => None,
        }
    }

    /// Minimal CIDR decomposition, for IP resources; empty for ASNs.
    pub fn cidrs(&self) -> Vec<Prefix> {
        match self {
            Resource::Ipv4(range) => range.cidrs(),
            Resource::Ipv6(prefix) => vec![*prefix],
            Resource::Asn(_) => Vec::new(),
        }
    }
}

impl Display for Resource {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Resource::Ipv4(range) => write!(f, "{range}"),
            Resource::Ipv6(prefix) => write!(f, "{prefix}"),
            Resource::Asn(range) => write!(f, "{range}"),
        }
    }
}

/// One line of (extended) delegated stats data. Immutable once decoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelegatedStatsEntry {
    pub rir: String,
    pub country: String,
    pub afi: ResourceAfi,
    /// The value column: address count for IPv4/ASN lines, prefix
    /// length for IPv6 lines.
    pub length: u64,
    pub date: NaiveDate,
    pub status: String,
    /// Operator-assigned id grouping lines into one logical allocation.
    /// Only present in extended stats files.
    pub opaque_id: Option<String>,
    pub category: Option<String>,
    pub resource: Resource,
}

/// A covering block for a group of delegation lines belonging to one
/// allocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CombinedEntry {
    pub rir: String,
    pub opaque_id: String,
    /// Every line of the allocation group, not only those under
    /// [`resource`](Self::resource): a group with non-contiguous
    /// fragments is split over several covering blocks which all
    /// reference the full history.
    pub entries: Vec<DelegatedStatsEntry>,
    /// The covering prefix this entry is stored under.
    pub resource: Prefix,
}

impl CombinedEntry {
    /// The subset of [`entries`](Self::entries) whose resource lies
    /// inside the covering prefix.
    pub fn overlapping_entries(&self) -> Vec<&DelegatedStatsEntry> {
        let covering = AddrRange::from(self.resource);
        self.entries
            .iter()
            .filter(|entry| {
                entry
                    .resource
                    .ip_range()
                    .is_some_and(|range| covering.contains(&range))
            })
            .collect()
    }
}
