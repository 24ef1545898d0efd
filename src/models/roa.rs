use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

use super::{Asn, OriginAsn, Prefix};

/// A validated ROA payload: the (asn, prefix, max length) authorization
/// tuple that VRP sets and the route origin validation procedure work
/// on.
///
/// Without an explicit max length a VRP authorizes exactly its own
/// prefix length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RouteOriginAuthorization {
    pub asn: Asn,
    pub prefix: Prefix,
    pub max_length: Option<u8>,
}

impl RouteOriginAuthorization {
    pub fn new(asn: Asn, prefix: Prefix, max_length: Option<u8>) -> Self {
        RouteOriginAuthorization {
            asn,
            prefix,
            max_length,
        }
    }
}

impl Display for RouteOriginAuthorization {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.max_length {
            Some(max_length) => write!(f, "{}-{} => AS{}", self.prefix, max_length, self.asn),
            None => write!(f, "{} => AS{}", self.prefix, self.asn),
        }
    }
}

/// Decoder output: a VRP plus the export metadata validators attach to
/// it. Which fields are present depends on the export format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoaRecord {
    pub asn: Asn,
    pub prefix: Prefix,
    pub max_length: Option<u8>,
    pub trust_anchor: Option<String>,
    pub uri: Option<String>,
    pub expires: Option<DateTime<Utc>>,
    pub not_before: Option<DateTime<Utc>>,
    pub not_after: Option<DateTime<Utc>>,
}

impl RoaRecord {
    /// The bare authorization tuple, dropping the export metadata.
    pub fn vrp(&self) -> RouteOriginAuthorization {
        RouteOriginAuthorization {
            asn: self.asn,
            prefix: self.prefix,
            max_length: self.max_length,
        }
    }
}

/// A BGP announcement as seen by a route collector: the input to route
/// origin validation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Announcement {
    pub prefix: Prefix,
    /// Kept as parsed text so AS-SET placeholders survive; see
    /// [`OriginAsn`].
    pub origin: OriginAsn,
}

impl Announcement {
    pub fn new(prefix: Prefix, origin: OriginAsn) -> Self {
        Announcement { prefix, origin }
    }
}

/// One `riswhoisdump` line: an origin announcing a prefix, and how many
/// RIS peers saw the announcement.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RisEntry {
    pub origin: OriginAsn,
    pub prefix: Prefix,
    pub seen_by_peers: u32,
}

impl From<&RisEntry> for Announcement {
    fn from(entry: &RisEntry) -> Self {
        Announcement {
            prefix: entry.prefix,
            origin: entry.origin.clone(),
        }
    }
}
