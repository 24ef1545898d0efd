use ipnet::{IpNet, Ipv4Net, Ipv6Net};
use std::fmt::{Debug, Display, Formatter};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::str::FromStr;
use thiserror::Error;

use super::Afi;

/// A canonical IPv4/IPv6 network prefix.
///
/// The wrapped network always has the bits beyond its prefix length
/// cleared, so equality, ordering and hashing are defined on the
/// canonical (address, length) form alone. Immutable once constructed.
#[derive(PartialEq, Eq, Clone, Copy, Hash, PartialOrd, Ord)]
pub struct Prefix(IpNet);

#[derive(Debug, Error)]
#[error("invalid prefix string: {0}")]
pub struct PrefixParseError(pub String);

impl Prefix {
    /// Canonicalizes `net` by clearing its host bits.
    pub fn new(net: IpNet) -> Self {
        Prefix(net.trunc())
    }

    /// The host prefix (/32 or /128) for a single address.
    pub fn from_addr(addr: IpAddr) -> Self {
        Prefix(IpNet::from(addr))
    }

    pub(crate) fn from_bits(afi: Afi, bits: u128, len: u8) -> Self {
        let net = match afi {
            Afi::Ipv4 => IpNet::V4(
                Ipv4Net::new(Ipv4Addr::from(bits as u32), len)
                    .expect("prefix length within family bounds"),
            ),
            Afi::Ipv6 => IpNet::V6(
                Ipv6Net::new(Ipv6Addr::from(bits), len)
                    .expect("prefix length within family bounds"),
            ),
        };
        Prefix(net)
    }

    pub fn afi(&self) -> Afi {
        match self.0 {
            IpNet::V4(_) => Afi::Ipv4,
            IpNet::V6(_) => Afi::Ipv6,
        }
    }

    pub fn addr(&self) -> IpAddr {
        self.0.addr()
    }

    pub fn prefix_len(&self) -> u8 {
        self.0.prefix_len()
    }

    /// The network address as an integer, right-aligned in 128 bits.
    pub(crate) fn bits(&self) -> u128 {
        match self.0 {
            IpNet::V4(net) => u32::from(net.addr()) as u128,
            IpNet::V6(net) => u128::from(net.addr()),
        }
    }

    /// Value of the `idx`-th address bit, counting from the most
    /// significant bit of the family.
    pub(crate) fn bit(&self, idx: u8) -> bool {
        debug_assert!(idx < self.afi().bits());
        self.bits() >> (self.afi().bits() - 1 - idx) & 1 == 1
    }

    /// First and last covered address as integers.
    pub(crate) fn range(&self) -> (u128, u128) {
        let host_bits = self.afi().bits() - self.prefix_len();
        let span = if host_bits == 128 {
            u128::MAX
        } else {
            (1u128 << host_bits) - 1
        };
        (self.bits(), self.bits() + span)
    }

    /// Range containment: every address of `other` falls within `self`.
    /// Equal prefixes contain each other; families never mix.
    pub fn contains(&self, other: &Prefix) -> bool {
        if self.afi() != other.afi() {
            return false;
        }
        let (start, end) = self.range();
        let (other_start, other_end) = other.range();
        start <= other_start && other_end <= end
    }

    /// Whether the two prefixes share any address. Two prefixes of one
    /// family overlap exactly when one contains the other.
    pub fn overlaps(&self, other: &Prefix) -> bool {
        self.contains(other) || other.contains(self)
    }
}

impl From<IpNet> for Prefix {
    fn from(net: IpNet) -> Self {
        Prefix::new(net)
    }
}

impl From<IpAddr> for Prefix {
    fn from(addr: IpAddr) -> Self {
        Prefix::from_addr(addr)
    }
}

impl FromStr for Prefix {
    type Err = PrefixParseError;

    /// Accepts `address/length` or a bare address, which becomes the
    /// host-length prefix of its family.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(net) = IpNet::from_str(s) {
            return Ok(Prefix::new(net));
        }
        IpAddr::from_str(s)
            .map(Prefix::from_addr)
            .map_err(|_| PrefixParseError(s.to_string()))
    }
}

impl Display for Prefix {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// Keep debug output as compact as display output.
impl Debug for Prefix {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

mod serde_impl {
    use super::*;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    impl Serialize for Prefix {
        fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            self.0.serialize(serializer)
        }
    }

    impl<'de> Deserialize<'de> for Prefix {
        fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
        where
            D: Deserializer<'de>,
        {
            IpNet::deserialize(deserializer).map(Prefix::new)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_str() {
        let prefix = Prefix::from_str("193.0.0.0/21").unwrap();
        assert_eq!(prefix.afi(), Afi::Ipv4);
        assert_eq!(prefix.prefix_len(), 21);
        assert_eq!(prefix.to_string(), "193.0.0.0/21");

        let v6 = Prefix::from_str("2001:db8::/32").unwrap();
        assert_eq!(v6.afi(), Afi::Ipv6);

        assert!(Prefix::from_str("not-a-prefix").is_err());
    }

    #[test]
    fn test_bare_address_is_host_prefix() {
        assert_eq!(
            Prefix::from_str("193.0.0.1").unwrap(),
            Prefix::from_str("193.0.0.1/32").unwrap()
        );
        assert_eq!(
            Prefix::from_str("2001:db8::1").unwrap(),
            Prefix::from_str("2001:db8::1/128").unwrap()
        );
    }

    #[test]
    fn test_canonicalization() {
        // host bits are cleared on construction
        assert_eq!(
            Prefix::from_str("193.0.5.1/21").unwrap(),
            Prefix::from_str("193.0.0.0/21").unwrap()
        );
    }

    #[test]
    fn test_contains_and_overlaps() {
        let p21 = Prefix::from_str("193.0.0.0/21").unwrap();
        let p24 = Prefix::from_str("193.0.3.0/24").unwrap();
        let other = Prefix::from_str("10.0.0.0/8").unwrap();

        assert!(p21.contains(&p24));
        assert!(!p24.contains(&p21));
        assert!(p21.contains(&p21));
        assert!(p21.overlaps(&p24));
        assert!(p24.overlaps(&p21));
        assert!(!p21.overlaps(&other));

        // families never contain each other
        let v6 = Prefix::from_str("::/0").unwrap();
        assert!(!v6.contains(&p21));
    }

    #[test]
    fn test_zero_length_range() {
        let all4 = Prefix::from_str("0.0.0.0/0").unwrap();
        assert_eq!(all4.range(), (0, u32::MAX as u128));
        let all6 = Prefix::from_str("::/0").unwrap();
        assert_eq!(all6.range(), (0, u128::MAX));
    }

    #[test]
    fn test_bit_indexing() {
        let prefix = Prefix::from_str("128.0.0.0/1").unwrap();
        assert!(prefix.bit(0));
        let prefix = Prefix::from_str("64.0.0.0/2").unwrap();
        assert!(!prefix.bit(0));
        assert!(prefix.bit(1));
    }

    #[test]
    fn test_serde_round_trip() {
        let prefix = Prefix::from_str("193.0.0.0/21").unwrap();
        let json = serde_json::to_string(&prefix).unwrap();
        assert_eq!(json, "\"193.0.0.0/21\"");
        let back: Prefix = serde_json::from_str(&json).unwrap();
        assert_eq!(back, prefix);
    }
}
