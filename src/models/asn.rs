use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use thiserror::Error;

/// ASN -- Autonomous System Number
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Asn(u32);

impl Asn {
    pub const fn new(asn: u32) -> Self {
        Asn(asn)
    }

    pub const fn as_u32(&self) -> u32 {
        self.0
    }
}

impl From<u32> for Asn {
    fn from(value: u32) -> Self {
        Asn(value)
    }
}

impl From<Asn> for u32 {
    fn from(value: Asn) -> Self {
        value.0
    }
}

impl PartialEq<u32> for Asn {
    fn eq(&self, other: &u32) -> bool {
        self.0 == *other
    }
}

impl Display for Asn {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Error)]
#[error("invalid AS number: {0}")]
pub struct AsnParseError(pub String);

impl FromStr for Asn {
    type Err = AsnParseError;

    /// Accepts a plain number with an optional `AS` prefix, as emitted
    /// by validator CSV exports (`AS3333`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s
            .strip_prefix("AS")
            .or_else(|| s.strip_prefix("as"))
            .unwrap_or(s);
        digits
            .parse::<u32>()
            .map(Asn)
            .map_err(|_| AsnParseError(s.to_string()))
    }
}

/// The origin of a BGP announcement.
///
/// RIS dumps carry AS-SET placeholders such as `{12703}`. These can
/// never be RPKI valid (RFC 6907 §7.1.8) and must never compare equal
/// to a plain AS number, so they are preserved as text instead of being
/// coerced.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum OriginAsn {
    Asn(Asn),
    /// An AS-SET placeholder, or any origin token that is not a plain
    /// AS number.
    AsSet(String),
}

impl OriginAsn {
    /// Whether this origin is the given AS number. AS-SETs match
    /// nothing.
    pub fn matches(&self, asn: Asn) -> bool {
        matches!(self, OriginAsn::Asn(origin) if *origin == asn)
    }

    pub fn as_asn(&self) -> Option<Asn> {
        match self {
            OriginAsn::Asn(asn) => Some(*asn),
            OriginAsn::AsSet(_) => None,
        }
    }
}

impl From<&str> for OriginAsn {
    fn from(value: &str) -> Self {
        match Asn::from_str(value) {
            Ok(asn) => OriginAsn::Asn(asn),
            Err(_) => OriginAsn::AsSet(value.to_string()),
        }
    }
}

impl From<Asn> for OriginAsn {
    fn from(value: Asn) -> Self {
        OriginAsn::Asn(value)
    }
}

impl FromStr for OriginAsn {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(OriginAsn::from(s))
    }
}

impl Display for OriginAsn {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            OriginAsn::Asn(asn) => write!(f, "{asn}"),
            OriginAsn::AsSet(raw) => write!(f, "{raw}"),
        }
    }
}

mod serde_impl {
    use super::*;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    impl Serialize for OriginAsn {
        fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            serializer.collect_str(self)
        }
    }

    impl<'de> Deserialize<'de> for OriginAsn {
        fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
        where
            D: Deserializer<'de>,
        {
            let raw = String::deserialize(deserializer)?;
            Ok(OriginAsn::from(raw.as_str()))
        }
    }
}
