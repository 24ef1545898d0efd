use std::collections::HashSet;

use super::PrefixLookup;
use crate::models::{Prefix, RoaRecord, RouteOriginAuthorization};

/// VRPs indexed by prefix.
///
/// Multiple VRPs may share one exact prefix (different origins or max
/// lengths), so every key holds the set of VRPs matching it exactly.
/// Candidate selection for route origin validation retrieves the most
/// specific covering key and walks the less specifics from there.
pub struct RoaLookup {
    inner: PrefixLookup<HashSet<RouteOriginAuthorization>>,
}

impl RoaLookup {
    pub fn new(vrps: impl IntoIterator<Item = RouteOriginAuthorization>) -> Self {
        let mut inner = PrefixLookup::new();
        for vrp in vrps {
            inner.or_insert_with(vrp.prefix, HashSet::new).insert(vrp);
        }
        RoaLookup { inner }
    }

    /// Builds the lookup from decoder output, collapsing each record to
    /// its authorization tuple.
    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a RoaRecord>) -> Self {
        Self::new(records.into_iter().map(RoaRecord::vrp))
    }

    /// The VRPs bound at exactly `prefix`.
    pub fn get(&self, prefix: &Prefix) -> Option<&HashSet<RouteOriginAuthorization>> {
        self.inner.get(prefix)
    }

    /// All VRPs whose prefix equals or covers `prefix`: the RFC 6483
    /// candidate set, most specific key first.
    pub fn lookup(&self, prefix: &Prefix) -> Vec<&RouteOriginAuthorization> {
        self.inner.lookup(prefix).into_iter().flatten().collect()
    }

    pub fn contains(&self, prefix: &Prefix) -> bool {
        self.inner.contains(prefix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Asn;
    use std::str::FromStr;

    fn vrp(asn: u32, prefix: &str, max_length: Option<u8>) -> RouteOriginAuthorization {
        RouteOriginAuthorization::new(Asn::new(asn), Prefix::from_str(prefix).unwrap(), max_length)
    }

    #[test]
    fn test_multiple_vrps_per_prefix() {
        let lookup = RoaLookup::new([
            vrp(8987, "100.20.0.0/14", Some(24)),
            vrp(14618, "100.20.0.0/14", Some(24)),
            vrp(16509, "100.20.0.0/14", Some(24)),
        ]);
        let exact = lookup.get(&Prefix::from_str("100.20.0.0/14").unwrap()).unwrap();
        assert_eq!(exact.len(), 3);
    }

    #[test]
    fn test_candidates_include_less_specifics_only() {
        let lookup = RoaLookup::new([vrp(3333, "193.0.0.0/21", Some(21))]);

        // exact and more specific queries find the covering VRP
        assert_eq!(lookup.lookup(&Prefix::from_str("193.0.0.0/21").unwrap()).len(), 1);
        assert_eq!(lookup.lookup(&Prefix::from_str("193.0.0.0/32").unwrap()).len(), 1);

        // a less specific query reaches no VRP
        assert!(lookup.lookup(&Prefix::from_str("193.0.0.0/16").unwrap()).is_empty());
    }

    #[test]
    fn test_duplicate_vrps_collapse() {
        let lookup = RoaLookup::new([
            vrp(3333, "193.0.0.0/21", Some(21)),
            vrp(3333, "193.0.0.0/21", Some(21)),
        ]);
        assert_eq!(lookup.get(&Prefix::from_str("193.0.0.0/21").unwrap()).unwrap().len(), 1);
    }
}
