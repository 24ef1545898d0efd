use std::fmt::{Debug, Display, Formatter};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use super::{Afi, Prefix};

/// An inclusive range of addresses within one family.
///
/// Delegation files hand out IPv4 space as a start address plus a
/// count, which is not necessarily CIDR aligned; covering-block
/// computation works on ranges and only goes back to prefixes at the
/// end.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AddrRange {
    afi: Afi,
    start: u128,
    end: u128,
}

impl AddrRange {
    /// The range starting at `start` covering `count` addresses,
    /// clamped to the family bounds.
    pub fn from_count(start: IpAddr, count: u128) -> Self {
        let afi = Afi::from(start);
        let start = match start {
            IpAddr::V4(addr) => u32::from(addr) as u128,
            IpAddr::V6(addr) => u128::from(addr),
        };
        let end = start
            .saturating_add(count.saturating_sub(1))
            .min(family_max(afi));
        AddrRange { afi, start, end }
    }

    pub(crate) fn from_bits(afi: Afi, start: u128, end: u128) -> Self {
        debug_assert!(start <= end);
        AddrRange { afi, start, end }
    }

    pub fn afi(&self) -> Afi {
        self.afi
    }

    pub fn start_addr(&self) -> IpAddr {
        self.addr(self.start)
    }

    pub fn end_addr(&self) -> IpAddr {
        self.addr(self.end)
    }

    fn addr(&self, bits: u128) -> IpAddr {
        match self.afi {
            Afi::Ipv4 => IpAddr::V4(Ipv4Addr::from(bits as u32)),
            Afi::Ipv6 => IpAddr::V6(Ipv6Addr::from(bits)),
        }
    }

    /// Number of covered addresses; `None` for the full IPv6 space.
    /// Ranges are inclusive and never empty.
    pub fn address_count(&self) -> Option<u128> {
        (self.end - self.start).checked_add(1)
    }

    pub fn contains(&self, other: &AddrRange) -> bool {
        self.afi == other.afi && self.start <= other.start && other.end <= self.end
    }

    pub fn overlaps(&self, other: &AddrRange) -> bool {
        self.afi == other.afi && self.start <= other.end && other.start <= self.end
    }

    /// Decomposes the range into the minimal list of bit-aligned CIDR
    /// blocks that exactly cover it, in address order.
    pub fn cidrs(&self) -> Vec<Prefix> {
        let family_bits = self.afi.bits() as u32;
        let mut out = Vec::new();
        let mut cursor = self.start;
        loop {
            // the largest block size the alignment of `cursor` allows
            let align = if cursor == 0 {
                family_bits
            } else {
                cursor.trailing_zeros().min(family_bits)
            };
            // the largest block size still fitting before `end`
            let span = self.end - cursor;
            let fit = if span == u128::MAX {
                128
            } else {
                (span + 1).ilog2()
            };
            let block = align.min(fit);
            out.push(Prefix::from_bits(
                self.afi,
                cursor,
                (family_bits - block) as u8,
            ));
            let last_of_block = if block == 128 {
                u128::MAX
            } else {
                (1u128 << block) - 1
            };
            if span == last_of_block {
                return out;
            }
            cursor += last_of_block + 1;
        }
    }
}

impl From<Prefix> for AddrRange {
    fn from(prefix: Prefix) -> Self {
        let (start, end) = prefix.range();
        AddrRange {
            afi: prefix.afi(),
            start,
            end,
        }
    }
}

impl Display for AddrRange {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.start_addr(), self.end_addr())
    }
}

impl Debug for AddrRange {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.start_addr(), self.end_addr())
    }
}

fn family_max(afi: Afi) -> u128 {
    match afi {
        Afi::Ipv4 => u32::MAX as u128,
        Afi::Ipv6 => u128::MAX,
    }
}

/// Coalesces ranges into the fewest inclusive ranges covering exactly
/// the same addresses: overlapping and adjacent ranges of one family
/// melt together. Input order does not matter.
pub fn merge_ranges(mut ranges: Vec<AddrRange>) -> Vec<AddrRange> {
    ranges.sort();
    let mut merged: Vec<AddrRange> = Vec::new();
    for range in ranges {
        match merged.last_mut() {
            Some(last) if last.afi == range.afi && range.start <= last.end.saturating_add(1) => {
                last.end = last.end.max(range.end);
            }
            _ => merged.push(range),
        }
    }
    merged
}

/// The minimal set of non-overlapping bit-aligned CIDR blocks covering
/// exactly the union of the given ranges.
pub fn merged_cidrs(ranges: Vec<AddrRange>) -> Vec<Prefix> {
    merge_ranges(ranges)
        .iter()
        .flat_map(AddrRange::cidrs)
        .collect()
}

mod serde_impl {
    use super::*;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Serialize, Deserialize)]
    struct AddrRangeRepr {
        start: IpAddr,
        end: IpAddr,
    }

    impl Serialize for AddrRange {
        fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            AddrRangeRepr {
                start: self.start_addr(),
                end: self.end_addr(),
            }
            .serialize(serializer)
        }
    }

    impl<'de> Deserialize<'de> for AddrRange {
        fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
        where
            D: Deserializer<'de>,
        {
            let repr = AddrRangeRepr::deserialize(deserializer)?;
            match (repr.start, repr.end) {
                (IpAddr::V4(start), IpAddr::V4(end)) if start <= end => Ok(AddrRange {
                    afi: Afi::Ipv4,
                    start: u32::from(start) as u128,
                    end: u32::from(end) as u128,
                }),
                (IpAddr::V6(start), IpAddr::V6(end)) if start <= end => Ok(AddrRange {
                    afi: Afi::Ipv6,
                    start: u128::from(start),
                    end: u128::from(end),
                }),
                _ => Err(serde::de::Error::custom("invalid address range")),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn v4(s: &str) -> IpAddr {
        IpAddr::from_str(s).unwrap()
    }

    fn prefixes(cidrs: &[Prefix]) -> Vec<String> {
        cidrs.iter().map(|p| p.to_string()).collect()
    }

    #[test]
    fn test_cidrs_aligned_range() {
        let range = AddrRange::from_count(v4("193.0.0.0"), 2048);
        assert_eq!(prefixes(&range.cidrs()), vec!["193.0.0.0/21"]);
    }

    #[test]
    fn test_cidrs_unaligned_range() {
        // 192.0.2.1 .. 192.0.2.6 needs four blocks
        let range = AddrRange::from_count(v4("192.0.2.1"), 6);
        assert_eq!(
            prefixes(&range.cidrs()),
            vec![
                "192.0.2.1/32",
                "192.0.2.2/31",
                "192.0.2.4/31",
                "192.0.2.6/32"
            ]
        );
    }

    #[test]
    fn test_cidrs_non_power_of_two_count() {
        // a /22 plus a /24 worth of space
        let range = AddrRange::from_count(v4("10.0.0.0"), 1280);
        assert_eq!(prefixes(&range.cidrs()), vec!["10.0.0.0/22", "10.0.4.0/24"]);
    }

    #[test]
    fn test_cidrs_full_v4_space() {
        let range = AddrRange::from_count(v4("0.0.0.0"), 1 << 32);
        assert_eq!(prefixes(&range.cidrs()), vec!["0.0.0.0/0"]);
    }

    #[test]
    fn test_cidrs_full_v6_space() {
        let range = AddrRange::from(Prefix::from_str("::/0").unwrap());
        assert_eq!(prefixes(&range.cidrs()), vec!["::/0"]);
    }

    #[test]
    fn test_merge_adjacent_aligned() {
        let merged = merged_cidrs(vec![
            AddrRange::from(Prefix::from_str("192.0.2.0/24").unwrap()),
            AddrRange::from(Prefix::from_str("192.0.3.0/24").unwrap()),
        ]);
        assert_eq!(prefixes(&merged), vec!["192.0.2.0/23"]);
    }

    #[test]
    fn test_merge_adjacent_unaligned_stays_split() {
        // adjacent but the /23 parent boundary does not line up
        let merged = merged_cidrs(vec![
            AddrRange::from(Prefix::from_str("192.0.1.0/24").unwrap()),
            AddrRange::from(Prefix::from_str("192.0.2.0/24").unwrap()),
        ]);
        assert_eq!(prefixes(&merged), vec!["192.0.1.0/24", "192.0.2.0/24"]);
    }

    #[test]
    fn test_merge_disjoint_and_overlapping() {
        let merged = merge_ranges(vec![
            AddrRange::from_count(v4("10.0.0.0"), 512),
            AddrRange::from_count(v4("10.0.1.0"), 256),
            AddrRange::from_count(v4("10.2.0.0"), 256),
        ]);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].to_string(), "10.0.0.0-10.0.1.255");
        assert_eq!(merged[1].to_string(), "10.2.0.0-10.2.0.255");
    }

    #[test]
    fn test_merge_preserves_exact_coverage() {
        let inputs = vec![
            AddrRange::from_count(v4("10.0.0.3"), 7),
            AddrRange::from_count(v4("10.0.0.16"), 16),
            AddrRange::from_count(v4("10.0.0.8"), 8),
        ];
        let total: u128 = merge_ranges(inputs)
            .iter()
            .filter_map(AddrRange::address_count)
            .sum();
        // 3..=9 and 8..=31 coalesce to 3..=31
        assert_eq!(total, 29);
    }

    #[test]
    fn test_contains_and_overlaps() {
        let outer = AddrRange::from_count(v4("10.0.0.0"), 256);
        let inner = AddrRange::from_count(v4("10.0.0.64"), 16);
        let disjoint = AddrRange::from_count(v4("10.0.1.0"), 16);
        assert!(outer.contains(&inner));
        assert!(!inner.contains(&outer));
        assert!(outer.overlaps(&inner));
        assert!(!outer.overlaps(&disjoint));
    }
}
