use std::str::FromStr;

use crate::{addr::Descriptor, hash, ipv6, AddrError, AddrResult};

/// Size of IPv4 adderess in octets.
///
/// [RFC 791 § 3.2]: https://www.rfc-editor.org/rfc/rfc791#section-3.2
pub const ADDR_SIZE: usize = 4;

/// Number of bits in an IPv4 address.
pub const BIT_COUNT: u8 = 32;

/// A four-octet IPv4 address.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Default)]
pub struct Address(pub [u8; ADDR_SIZE]);

impl Address {
    /// An unspecified address.
    pub const UNSPECIFIED: Address = Address([0x00; ADDR_SIZE]);

    /// The broadcast address.
    pub const BROADCAST: Address = Address([0xff; ADDR_SIZE]);

    /// The usual loopback address.
    pub const LOOPBACK: Address = Address([127, 0, 0, 1]);

    /// Construct an IPv4 address from parts.
    pub const fn new(a0: u8, a1: u8, a2: u8, a3: u8) -> Address {
        Address([a0, a1, a2, a3])
    }

    /// Construct an IPv4 address from a sequence of octets, in big-endian.
    pub fn from_bytes(data: &[u8]) -> AddrResult<Address> {
        let bytes: [u8; ADDR_SIZE] = data.try_into().map_err(|_| {
            AddrError::AddressFormat(format!(
                "Invalid IPv4 binary data: length must be {} bytes, got {}",
                ADDR_SIZE,
                data.len()
            ))
        })?;
        Ok(Address(bytes))
    }

    /// Return an IPv4 address as a sequence of octets, in big-endian.
    pub const fn as_bytes(&self) -> &[u8; ADDR_SIZE] {
        &self.0
    }

    /// Query whether the address is the broadcast address.
    pub fn is_broadcast(&self) -> bool {
        *self == Self::BROADCAST
    }

    /// Query whether the address is a multicast address.
    pub const fn is_multicast(&self) -> bool {
        self.0[0] & 0xf0 == 224
    }

    /// Query whether the address falls into the "unspecified" range.
    pub const fn is_unspecified(&self) -> bool {
        self.0[0] == 0
    }

    /// Query whether the address falls into the "link-local" range.
    pub fn is_link_local(&self) -> bool {
        self.0[0..2] == [169, 254]
    }

    /// Query whether the address falls into the "loopback" range.
    pub const fn is_loopback(&self) -> bool {
        self.0[0] == 127
    }

    /// Query whether the address is loopback or falls into one of the [RFC 1918] blocks.
    ///
    /// [RFC 1918]: https://www.rfc-editor.org/rfc/rfc1918#section-3
    pub const fn is_private(&self) -> bool {
        self.is_loopback()
            || self.0[0] == 10
            || (self.0[0] == 172 && self.0[1] & 0xf0 == 16)
            || (self.0[0] == 192 && self.0[1] == 168)
    }

    /// Keep the `num_bits` high bits and clear the rest.
    pub fn mask(&self, num_bits: usize) -> AddrResult<Address> {
        if num_bits > BIT_COUNT as usize {
            return Err(AddrError::InvalidPrefixLength {
                len: num_bits,
                max: BIT_COUNT as usize,
            });
        }
        // a shift by the full width means an empty mask
        let mask = u32::MAX
            .checked_shl(BIT_COUNT as u32 - num_bits as u32)
            .unwrap_or(0);
        Ok(Address::from(u32::from(*self) & mask))
    }

    /// Return the IPv4-mapped IPv6 form, `::ffff:a.b.c.d`.
    pub fn create_ipv6(&self) -> ipv6::Address {
        let mut bytes = [0u8; ipv6::ADDR_SIZE];
        bytes[10] = 0xff;
        bytes[11] = 0xff;
        bytes[12..].copy_from_slice(&self.0);
        ipv6::Address::from(bytes)
    }

    /// Hash value shared with the IPv4-mapped IPv6 form of this address.
    pub fn hash(&self) -> u64 {
        let (h1, h2) = hash::hash128(&self.0);
        hash::combine(libc::AF_INET as u64, &[h1, h2])
    }

    /// Render `{"family":"IPv4","addr":...,"hash":...}`.
    pub fn to_json(&self) -> AddrResult<String> {
        let descriptor = Descriptor {
            family: "IPv4",
            addr: self.to_string(),
            hash: self.hash(),
        };
        Ok(serde_json::to_string(&descriptor)?)
    }
}

impl std::hash::Hash for Address {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        state.write_u64(Address::hash(self));
    }
}

impl From<std::net::Ipv4Addr> for Address {
    fn from(x: std::net::Ipv4Addr) -> Address {
        Address(x.octets())
    }
}

impl From<Address> for std::net::Ipv4Addr {
    fn from(Address(x): Address) -> std::net::Ipv4Addr {
        x.into()
    }
}

/// Parse strict dotted-quad notation.
impl FromStr for Address {
    type Err = AddrError;

    fn from_str(value: &str) -> AddrResult<Self> {
        let invalid = || AddrError::AddressFormat(format!("Invalid IPv4 address '{}'", value));

        let mut addr = Address::UNSPECIFIED;
        let mut parts = value.split('.');
        for octet in addr.0.iter_mut() {
            let part = parts.next().ok_or_else(invalid)?;
            if part.is_empty() || part.len() > 3 || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(invalid());
            }
            *octet = part.parse::<u8>().map_err(|_| invalid())?;
        }
        if parts.next().is_some() {
            return Err(invalid());
        }
        Ok(addr)
    }
}

impl From<u32> for Address {
    fn from(value: u32) -> Self {
        Self(value.to_be_bytes())
    }
}

impl From<Address> for u32 {
    fn from(Address(x): Address) -> u32 {
        u32::from_be_bytes(x)
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let bytes = self.0;
        write!(f, "{}.{}.{}.{}", bytes[0], bytes[1], bytes[2], bytes[3])
    }
}
