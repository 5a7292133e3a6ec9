use std::str::FromStr;

use serde::Serialize;

use crate::{ipv4, ipv6, AddrError, AddrResult};

/// Structured rendering shared by both address families.
#[derive(Serialize)]
pub(crate) struct Descriptor {
    pub family: &'static str,
    pub addr: String,
    pub hash: u64,
}

/// An address of either family.
///
/// An IPv4-mapped IPv6 address compares and hashes equal to the IPv4 address it carries.
#[derive(Debug, Clone, Copy)]
pub enum IpAddress {
    V4(ipv4::Address),
    V6(ipv6::Address),
}

impl IpAddress {
    pub fn is_v4(&self) -> bool {
        matches!(self, IpAddress::V4(_))
    }

    pub fn is_v6(&self) -> bool {
        matches!(self, IpAddress::V6(_))
    }

    /// Number of bits in an address of this family.
    pub fn bit_count(&self) -> u8 {
        match self {
            IpAddress::V4(_) => ipv4::BIT_COUNT,
            IpAddress::V6(_) => ipv6::Address::BIT_COUNT,
        }
    }

    /// Keep the `num_bits` high bits and clear the rest.
    pub fn mask(&self, num_bits: usize) -> AddrResult<IpAddress> {
        Ok(match self {
            IpAddress::V4(addr) => IpAddress::V4(addr.mask(num_bits)?),
            IpAddress::V6(addr) => IpAddress::V6(addr.mask(num_bits)?),
        })
    }

    /// Parse `addr/len` into a network address, masked to `len`, and the prefix length.
    ///
    /// Without `/len` the prefix covers the whole address.
    pub fn create_network(cidr_network: &str) -> AddrResult<(IpAddress, u8)> {
        let (host, len) = match cidr_network.split_once('/') {
            Some((host, len)) => (host, Some(len)),
            None => (cidr_network, None),
        };

        let addr: IpAddress = host.parse()?;
        let bits = addr.bit_count() as usize;
        let len = match len {
            None => bits,
            Some(len) => {
                if len.is_empty() || !len.bytes().all(|b| b.is_ascii_digit()) {
                    return Err(AddrError::AddressFormat(format!(
                        "Invalid prefix length '{}' in network '{}'",
                        len, cidr_network
                    )));
                }
                // digits only, so parsing can only fail on overflow
                len.parse::<usize>().unwrap_or(usize::MAX)
            }
        };
        if len > bits {
            return Err(AddrError::InvalidPrefixLength { len, max: bits });
        }

        Ok((addr.mask(len)?, len as u8))
    }

    /// Hash the address. Equal addresses hash equally across families.
    pub fn hash(&self) -> u64 {
        match self {
            IpAddress::V4(addr) => addr.hash(),
            IpAddress::V6(addr) => addr.hash(),
        }
    }

    pub fn to_json(&self) -> AddrResult<String> {
        match self {
            IpAddress::V4(addr) => addr.to_json(),
            IpAddress::V6(addr) => addr.to_json(),
        }
    }

    /// Collapse an IPv4-mapped address to IPv4.
    fn normalized(&self) -> IpAddress {
        match self {
            IpAddress::V6(addr) if addr.is_ipv4_mapped() => {
                addr.create_ipv4().map(IpAddress::V4).unwrap_or(*self)
            }
            _ => *self,
        }
    }
}

impl PartialEq for IpAddress {
    fn eq(&self, other: &Self) -> bool {
        match (self.normalized(), other.normalized()) {
            (IpAddress::V4(a), IpAddress::V4(b)) => a == b,
            (IpAddress::V6(a), IpAddress::V6(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for IpAddress {}

impl std::hash::Hash for IpAddress {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        state.write_u64(IpAddress::hash(self));
    }
}

impl From<ipv4::Address> for IpAddress {
    fn from(addr: ipv4::Address) -> Self {
        IpAddress::V4(addr)
    }
}

impl From<ipv6::Address> for IpAddress {
    fn from(addr: ipv6::Address) -> Self {
        IpAddress::V6(addr)
    }
}

/// Anything with a colon is taken as IPv6.
impl FromStr for IpAddress {
    type Err = AddrError;

    fn from_str(value: &str) -> AddrResult<Self> {
        if value.contains(':') {
            Ok(IpAddress::V6(value.parse()?))
        } else {
            Ok(IpAddress::V4(value.parse()?))
        }
    }
}

impl std::fmt::Display for IpAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            IpAddress::V4(addr) => write!(f, "{}", addr),
            IpAddress::V6(addr) => write!(f, "{}", addr),
        }
    }
}
