use num_enum::{IntoPrimitive, TryFromPrimitive};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::net::IpAddr;
use std::str::FromStr;
use thiserror::Error;

/// AFI -- Address Family Identifier
///
/// <https://www.iana.org/assignments/address-family-numbers/address-family-numbers.xhtml>
#[derive(
    Debug,
    PartialEq,
    TryFromPrimitive,
    IntoPrimitive,
    Clone,
    Copy,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
)]
#[repr(u16)]
pub enum Afi {
    Ipv4 = 1,
    Ipv6 = 2,
}

impl Afi {
    /// Number of address bits in this family.
    pub const fn bits(&self) -> u8 {
        match self {
            Afi::Ipv4 => 32,
            Afi::Ipv6 => 128,
        }
    }
}

impl From<IpAddr> for Afi {
    #[inline]
    fn from(value: IpAddr) -> Self {
        match value {
            IpAddr::V4(_) => Afi::Ipv4,
            IpAddr::V6(_) => Afi::Ipv6,
        }
    }
}

impl Display for Afi {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Afi::Ipv4 => write!(f, "ipv4"),
            Afi::Ipv6 => write!(f, "ipv6"),
        }
    }
}

/// The address family column of a delegation record: `ipv4`, `ipv6` or
/// `asn`. Only the IP families ever enter a prefix trie.
#[derive(Debug, PartialEq, Clone, Copy, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceAfi {
    Ipv4,
    Ipv6,
    Asn,
}

impl ResourceAfi {
    pub const fn is_ip(&self) -> bool {
        !matches!(self, ResourceAfi::Asn)
    }
}

impl From<Afi> for ResourceAfi {
    fn from(value: Afi) -> Self {
        match value {
            Afi::Ipv4 => ResourceAfi::Ipv4,
            Afi::Ipv6 => ResourceAfi::Ipv6,
        }
    }
}

#[derive(Debug, Error)]
#[error("unknown address family: {0}")]
pub struct AfiParseError(pub String);

impl FromStr for ResourceAfi {
    type Err = AfiParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ipv4" => Ok(ResourceAfi::Ipv4),
            "ipv6" => Ok(ResourceAfi::Ipv6),
            "asn" => Ok(ResourceAfi::Asn),
            other => Err(AfiParseError(other.to_string())),
        }
    }
}

impl Display for ResourceAfi {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ResourceAfi::Ipv4 => write!(f, "ipv4"),
            ResourceAfi::Ipv6 => write!(f, "ipv6"),
            ResourceAfi::Asn => write!(f, "asn"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_afi_from_addr() {
        assert_eq!(
            Afi::from(IpAddr::V4(std::net::Ipv4Addr::new(127, 0, 0, 1))),
            Afi::Ipv4
        );
        assert_eq!(
            Afi::from(IpAddr::V6(std::net::Ipv6Addr::new(0, 0, 0, 0, 0, 0, 0, 1))),
            Afi::Ipv6
        );
    }

    #[test]
    fn test_afi_repr() {
        assert_eq!(Afi::Ipv4 as u16, 1);
        assert_eq!(Afi::Ipv6 as u16, 2);
        assert_eq!(Afi::Ipv4.bits(), 32);
        assert_eq!(Afi::Ipv6.bits(), 128);
    }

    #[test]
    fn test_resource_afi_from_str() {
        assert_eq!("ipv4".parse::<ResourceAfi>().unwrap(), ResourceAfi::Ipv4);
        assert_eq!("ipv6".parse::<ResourceAfi>().unwrap(), ResourceAfi::Ipv6);
        assert_eq!("asn".parse::<ResourceAfi>().unwrap(), ResourceAfi::Asn);
        assert!("20230103".parse::<ResourceAfi>().is_err());
        assert!(ResourceAfi::Asn.to_string() == "asn");
        assert!(!ResourceAfi::Asn.is_ip());
        assert!(ResourceAfi::Ipv6.is_ip());
    }
}
