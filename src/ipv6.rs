use std::{
    ffi::{CStr, CString},
    fmt::Write,
    mem, ptr,
    str::FromStr,
};

use bytes::Buf;
use nix::sys::socket::SockaddrIn6;
use tracing::{debug, trace, warn};

use crate::{
    addr::{Descriptor, IpAddress},
    hash, ipv4,
    mac::MacAddress,
    masks::{self, BIT_COUNT},
    octets::{self, ByteArray16},
    AddrError, AddrResult,
};

pub use crate::octets::ADDR_SIZE;

/// Large enough for any numeric host, including a `%zone` suffix.
const HOST_BUF_LEN: usize = 1025;

/// A CIDR network: an address and a prefix length in bits.
pub type CidrNetworkV6 = (Address, u8);

/// Transition mechanism an address belongs to, judged by its prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddrType {
    Normal,
    /// `2001:0000::/32`, see [RFC 4380].
    ///
    /// [RFC 4380]: https://www.rfc-editor.org/rfc/rfc4380#section-2.6
    Teredo,
    /// `2002::/16`, see [RFC 3056].
    ///
    /// [RFC 3056]: https://www.rfc-editor.org/rfc/rfc3056#section-2
    SixToFour,
}

/// A sixteen-octet IPv6 address with its zone index.
///
/// Values are immutable: every transformation returns a new address. Equality and ordering
/// take the scope id into account, hashing does not.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Default)]
pub struct Address {
    bytes: ByteArray16,
    scope: u16,
}

impl Address {
    /// Number of bits in an address.
    pub const BIT_COUNT: u8 = BIT_COUNT;

    /// Number of octets in an address.
    pub const BYTE_COUNT: usize = ADDR_SIZE;

    /// First 32 bits of a Teredo address.
    pub const PREFIX_TEREDO: u32 = 0x2001_0000;

    /// First 16 bits of a 6to4 address.
    pub const PREFIX_6TO4: u16 = 0x2002;

    /// The [unspecified address].
    ///
    /// [unspecified address]: https://www.rfc-editor.org/rfc/rfc4291#section-2.5.2
    pub const UNSPECIFIED: Address = Address::new([0x00; ADDR_SIZE]);

    /// The [loopback address].
    ///
    /// [loopback address]: https://www.rfc-editor.org/rfc/rfc4291#section-2.5.3
    pub const LOOPBACK: Address = Address::new([
        0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        0x01,
    ]);

    /// The link-local [all nodes multicast address], `ff02::1`.
    ///
    /// [all nodes multicast address]: https://www.rfc-editor.org/rfc/rfc4291#section-2.7.1
    pub const LINK_LOCAL_ALL_NODES: Address = Address::new([
        0xff, 0x02, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        0x01,
    ]);

    /// Construct an address from its octets, in big-endian, with scope id 0.
    pub const fn new(bytes: ByteArray16) -> Address {
        Address { bytes, scope: 0 }
    }

    /// Query whether `value` is a numeric IPv6 literal, optionally wrapped in brackets.
    ///
    /// The same rules as [`Address::from_str`] apply; no name lookup happens.
    pub fn validate(value: &str) -> bool {
        value.parse::<Address>().is_ok()
    }

    /// Construct an address from a sequence of octets, in big-endian.
    ///
    /// Fails unless `data` is exactly sixteen octets long. The scope id is 0.
    pub fn from_binary(data: &[u8]) -> AddrResult<Address> {
        let bytes: ByteArray16 = data.try_into().map_err(|_| {
            AddrError::AddressFormat(format!(
                "Invalid IPv6 binary data: length must be {} bytes, got {}",
                ADDR_SIZE,
                data.len()
            ))
        })?;
        Ok(Address::new(bytes))
    }

    /// Derive the link-local address of an interface from its MAC address.
    ///
    /// The interface identifier is the modified EUI-64 form of the MAC: the universal/local
    /// bit is flipped and `ff:fe` is inserted in the middle. See [RFC 4291 § 2.5.1] and
    /// [Appendix A].
    ///
    /// [RFC 4291 § 2.5.1]: https://www.rfc-editor.org/rfc/rfc4291#section-2.5.1
    /// [Appendix A]: https://www.rfc-editor.org/rfc/rfc4291#appendix-A
    pub const fn link_local(mac: MacAddress) -> Address {
        let m = mac.0;
        Address::new([
            0xfe,
            0x80,
            0x00,
            0x00,
            0x00,
            0x00,
            0x00,
            0x00,
            m[0] ^ 0x02,
            m[1],
            m[2],
            0xff,
            0xfe,
            m[3],
            m[4],
            m[5],
        ])
    }

    /// Construct an address from a platform socket address, keeping its scope id.
    pub fn from_sockaddr(sa: &libc::sockaddr_in6) -> Address {
        Address {
            bytes: sa.sin6_addr.s6_addr,
            scope: sa.sin6_scope_id as u16,
        }
    }

    /// Return a platform socket address with port 0.
    pub fn to_sockaddr(&self) -> libc::sockaddr_in6 {
        // SAFETY: sockaddr_in6 is plain old data, all-zero is a valid value.
        let mut sa: libc::sockaddr_in6 = unsafe { mem::zeroed() };
        sa.sin6_family = libc::AF_INET6 as libc::sa_family_t;
        sa.sin6_addr.s6_addr = self.bytes;
        sa.sin6_scope_id = self.scope as u32;
        sa
    }

    /// Return the zone index.
    pub const fn scope_id(&self) -> u16 {
        self.scope
    }

    /// Return a copy of this address with another zone index.
    pub const fn with_scope_id(self, scope: u16) -> Address {
        Address {
            bytes: self.bytes,
            scope,
        }
    }

    /// Return the address as a sequence of octets, in big-endian.
    pub const fn as_bytes(&self) -> &ByteArray16 {
        &self.bytes
    }

    pub const fn to_byte_array(&self) -> ByteArray16 {
        self.bytes
    }

    /// Query whether every bit is zero.
    pub fn is_zero(&self) -> bool {
        self.bytes == [0u8; ADDR_SIZE]
    }

    /// Query whether the address is an [IPv4-mapped] address, `::ffff:0:0/96`.
    ///
    /// [IPv4-mapped]: https://www.rfc-editor.org/rfc/rfc4291#section-2.5.5.2
    pub fn is_ipv4_mapped(&self) -> bool {
        self.bytes[..10].iter().all(|&b| b == 0x00) && self.bytes[10..12] == [0xff, 0xff]
    }

    /// Return the IPv4 address embedded in an IPv4-mapped address.
    pub fn create_ipv4(&self) -> AddrResult<ipv4::Address> {
        self.mapped_ipv4().ok_or_else(|| {
            AddrError::TypeMismatch(format!("Invalid IP '{}': not an IPv4-mapped address", self))
        })
    }

    fn mapped_ipv4(&self) -> Option<ipv4::Address> {
        if !self.is_ipv4_mapped() {
            return None;
        }
        let b = &self.bytes;
        Some(ipv4::Address::new(b[12], b[13], b[14], b[15]))
    }

    /// Classify the address by its transition prefix.
    pub fn address_type(&self) -> AddrType {
        // network byte order: the first word is the most significant
        let mut head = &self.bytes[..4];
        let hi = head.get_u16();
        let lo = head.get_u16();

        if ((u32::from(hi) << 16) | u32::from(lo)) == Self::PREFIX_TEREDO {
            AddrType::Teredo
        } else if hi == Self::PREFIX_6TO4 {
            AddrType::SixToFour
        } else {
            AddrType::Normal
        }
    }

    pub fn is_teredo(&self) -> bool {
        self.address_type() == AddrType::Teredo
    }

    pub fn is_6to4(&self) -> bool {
        self.address_type() == AddrType::SixToFour
    }

    /// Return the IPv4 address carried in octets 2 to 5 of a 6to4 address.
    pub fn get_ipv4_for_6to4(&self) -> AddrResult<ipv4::Address> {
        if !self.is_6to4() {
            return Err(AddrError::TypeMismatch(format!(
                "Invalid IP '{}': not a 6to4 address",
                self
            )));
        }
        let b = &self.bytes;
        Ok(ipv4::Address::new(b[2], b[3], b[4], b[5]))
    }

    /// Query whether this is `::1`, or an IPv4-mapped loopback address.
    pub fn is_loopback(&self) -> bool {
        if self.mapped_ipv4().map_or(false, |v4| v4.is_loopback()) {
            return true;
        }
        self.bytes == Self::LOOPBACK.bytes
    }

    /// Query whether the address is loopback, a mapped private IPv4 address, or a
    /// [unique local address] in `fc00::/7`.
    ///
    /// [unique local address]: https://www.rfc-editor.org/rfc/rfc4193#section-3.1
    pub fn is_private(&self) -> bool {
        if self.mapped_ipv4().map_or(false, |v4| v4.is_private()) {
            return true;
        }
        self.is_loopback() || self.in_binary_subnet([0xfc, 0x00], 7)
    }

    /// Query whether the address is in `fe80::/10`.
    pub fn is_link_local(&self) -> bool {
        self.in_binary_subnet([0xfe, 0x80], 10)
    }

    /// Query whether the address is exactly `ff02::1`.
    pub fn is_link_local_broadcast(&self) -> bool {
        self.bytes == Self::LINK_LOCAL_ALL_NODES.bytes
    }

    pub const fn is_multicast(&self) -> bool {
        self.bytes[0] == 0xff
    }

    /// Return the four flag bits of a multicast address.
    ///
    /// # Panics
    /// The function panics if the address is not multicast.
    pub fn get_multicast_flags(&self) -> u8 {
        assert!(self.is_multicast(), "{} is not a multicast address", self);
        (self.bytes[1] >> 4) & 0x0f
    }

    /// Return the four scope bits of a multicast address.
    ///
    /// # Panics
    /// The function panics if the address is not multicast.
    pub fn get_multicast_scope(&self) -> u8 {
        assert!(self.is_multicast(), "{} is not a multicast address", self);
        self.bytes[1] & 0x0f
    }

    /// Query whether the address may be routed over the internet: global unicast in
    /// `2000::/3`, or multicast with global scope.
    pub fn is_routable(&self) -> bool {
        self.in_binary_subnet([0x20, 0x00], 3)
            || (self.is_multicast() && self.get_multicast_scope() == 0x0e)
    }

    pub fn is_nonroutable(&self) -> bool {
        !self.is_routable()
    }

    /// Return the solicited-node multicast address, `ff02::1:ffXX:XXXX`, built from the
    /// low 24 bits of this address. See [RFC 4291 § 2.7.1].
    ///
    /// # Panics
    /// The function panics if the address is multicast; only unicast and anycast addresses
    /// have a solicited-node address.
    ///
    /// [RFC 4291 § 2.7.1]: https://www.rfc-editor.org/rfc/rfc4291#section-2.7.1
    pub fn get_solicited_node_address(&self) -> Address {
        assert!(
            !self.is_multicast(),
            "{} is multicast, solicited-node addresses need a unicast source",
            self
        );
        let mut bytes = [
            0xff, 0x02, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x01, 0xff, 0x00,
            0x00, 0x00,
        ];
        bytes[13..].copy_from_slice(&self.bytes[13..]);
        Address::new(bytes)
    }

    /// Keep the `num_bits` high bits and clear the rest. The scope id is dropped.
    pub fn mask(&self, num_bits: usize) -> AddrResult<Address> {
        let mask = masks::fetch_mask(num_bits)?;
        Ok(Address::new(octets::mask(mask, &self.bytes)))
    }

    /// Query whether the address is inside the network written as `addr/len`.
    ///
    /// Fails if the network does not parse or is not IPv6.
    pub fn in_subnet(&self, cidr_network: &str) -> AddrResult<bool> {
        let (subnet, len) = IpAddress::create_network(cidr_network)?;
        match subnet {
            IpAddress::V6(subnet) => {
                Ok(self.in_subnet_with_mask(&subnet, masks::fetch_mask(len as usize)?))
            }
            IpAddress::V4(_) => Err(AddrError::AddressFormat(format!(
                "Address '{}' is not a V6 address",
                subnet.to_json()?
            ))),
        }
    }

    /// Query whether this address and `subnet` agree on every bit set in `mask`.
    pub fn in_subnet_with_mask(&self, subnet: &Address, mask: &ByteArray16) -> bool {
        octets::mask(&self.bytes, mask) == octets::mask(&subnet.bytes, mask)
    }

    /// Return the longest network containing both `one` and `two`.
    pub fn longest_common_prefix(
        one: &CidrNetworkV6,
        two: &CidrNetworkV6,
    ) -> AddrResult<CidrNetworkV6> {
        for &(_, len) in [one, two] {
            if len > BIT_COUNT {
                return Err(AddrError::InvalidPrefixLength {
                    len: len as usize,
                    max: BIT_COUNT as usize,
                });
            }
        }
        let (prefix, len) =
            octets::longest_common_prefix(&one.0.bytes, one.1, &two.0.bytes, two.1);
        Ok((Address::new(prefix), len))
    }

    /// Return the `index`th octet, counting from the most significant.
    pub fn get_nth_ms_byte(&self, index: usize) -> AddrResult<u8> {
        if index >= ADDR_SIZE {
            return Err(AddrError::IndexOutOfRange {
                index,
                len: ADDR_SIZE,
            });
        }
        Ok(self.bytes[index])
    }

    /// Return the `index`th octet, counting from the least significant.
    pub fn get_nth_ls_byte(&self, index: usize) -> AddrResult<u8> {
        if index >= ADDR_SIZE {
            return Err(AddrError::IndexOutOfRange {
                index,
                len: ADDR_SIZE,
            });
        }
        Ok(self.bytes[ADDR_SIZE - 1 - index])
    }

    pub fn get_nth_ms_bit(&self, index: usize) -> AddrResult<bool> {
        let bits = BIT_COUNT as usize;
        if index >= bits {
            return Err(AddrError::IndexOutOfRange { index, len: bits });
        }
        Ok((self.bytes[index / 8] >> (7 - index % 8)) & 0x01 != 0)
    }

    pub fn get_nth_ls_bit(&self, index: usize) -> AddrResult<bool> {
        let bits = BIT_COUNT as usize;
        if index >= bits {
            return Err(AddrError::IndexOutOfRange { index, len: bits });
        }
        self.get_nth_ms_bit(bits - 1 - index)
    }

    /// Render the address in [RFC 5952] form through the platform's numeric host
    /// formatting. A non-zero scope id is rendered as a `%zone` suffix.
    ///
    /// [RFC 5952]: https://www.rfc-editor.org/rfc/rfc5952#section-4
    pub fn to_canonical_string(&self) -> AddrResult<String> {
        let sa = self.to_sockaddr();
        let mut host = [0 as libc::c_char; HOST_BUF_LEN];
        // SAFETY: `sa` is a fully initialised sockaddr_in6 and `host` outlives the call.
        let ret = unsafe {
            libc::getnameinfo(
                &sa as *const libc::sockaddr_in6 as *const libc::sockaddr,
                mem::size_of::<libc::sockaddr_in6>() as libc::socklen_t,
                host.as_mut_ptr(),
                host.len() as libc::socklen_t,
                ptr::null_mut(),
                0,
                libc::NI_NUMERICHOST,
            )
        };
        if ret != 0 {
            let hex = octets::to_hex(&self.bytes);
            debug!(hex = %hex, error = %gai_error(ret), "getnameinfo failed");
            return Err(AddrError::AddressFormat(format!(
                "Invalid address with hex '{}'",
                hex
            )));
        }
        // SAFETY: getnameinfo NUL-terminates `host` on success.
        let host = unsafe { CStr::from_ptr(host.as_ptr()) };
        Ok(host.to_string_lossy().into_owned())
    }

    /// Render all eight groups as four lowercase hex digits, without compression.
    pub fn to_fully_qualified(&self) -> String {
        let mut data = &self.bytes[..];
        let mut out = String::with_capacity(39);
        while data.has_remaining() {
            if !out.is_empty() {
                out.push(':');
            }
            // writing to a String cannot fail
            let _ = write!(out, "{:04x}", data.get_u16());
        }
        out
    }

    /// Render `{"family":"IPv6","addr":...,"hash":...}`.
    pub fn to_json(&self) -> AddrResult<String> {
        let descriptor = Descriptor {
            family: "IPv6",
            addr: self.to_canonical_string()?,
            hash: self.hash(),
        };
        Ok(serde_json::to_string(&descriptor)?)
    }

    /// Hash the address. An IPv4-mapped address hashes like the IPv4 address it carries,
    /// so both can key the same map through [`IpAddress`].
    pub fn hash(&self) -> u64 {
        if let Some(v4) = self.mapped_ipv4() {
            return v4.hash();
        }
        let (h1, h2) = hash::hash128(&self.bytes);
        hash::combine(libc::AF_INET6 as u64, &[h1, h2])
    }

    fn in_binary_subnet(&self, prefix: [u8; 2], num_bits: usize) -> bool {
        let masked = octets::mask(masks::fetch_mask_unchecked(num_bits), &self.bytes);
        masked[..2] == prefix
    }
}

fn gai_error(code: libc::c_int) -> String {
    // SAFETY: gai_strerror returns a pointer to a static NUL-terminated string.
    unsafe { CStr::from_ptr(libc::gai_strerror(code)) }
        .to_string_lossy()
        .into_owned()
}

/// Resolve a numeric IPv6 host with getaddrinfo. `AI_NUMERICHOST` keeps this off the network.
fn resolve_numeric(host: &str) -> AddrResult<Address> {
    let invalid = || AddrError::AddressFormat(format!("Invalid IPv6 address '{}'", host));

    let c_host = CString::new(host).map_err(|_| invalid())?;

    // SAFETY: addrinfo is plain old data, all-zero is a valid value.
    let mut hints: libc::addrinfo = unsafe { mem::zeroed() };
    hints.ai_family = libc::AF_INET6;
    hints.ai_socktype = libc::SOCK_STREAM;
    hints.ai_flags = libc::AI_NUMERICHOST;

    let mut result: *mut libc::addrinfo = ptr::null_mut();
    // SAFETY: all pointers are valid for the duration of the call.
    let ret = unsafe { libc::getaddrinfo(c_host.as_ptr(), ptr::null(), &hints, &mut result) };
    if ret != 0 || result.is_null() {
        debug!(host, error = %gai_error(ret), "numeric host rejected");
        return Err(invalid());
    }

    // SAFETY: on success `result` heads a list owned by us until freeaddrinfo.
    let addr = unsafe {
        let info = &*result;
        let addr = if info.ai_family == libc::AF_INET6 && !info.ai_addr.is_null() {
            Some(Address::from_sockaddr(
                &*(info.ai_addr as *const libc::sockaddr_in6),
            ))
        } else {
            None
        };
        libc::freeaddrinfo(result);
        addr
    };
    addr.ok_or_else(invalid)
}

/// Parse a numeric IPv6 literal, optionally wrapped in `[` and `]`, with an optional
/// `%zone` suffix.
impl FromStr for Address {
    type Err = AddrError;

    fn from_str(value: &str) -> AddrResult<Self> {
        if value.len() < 2 {
            return Err(AddrError::AddressFormat(format!(
                "Invalid IPv6 address '{}': address too short",
                value
            )));
        }
        let host = value
            .strip_prefix('[')
            .and_then(|v| v.strip_suffix(']'))
            .unwrap_or(value);
        let addr = resolve_numeric(host)?;
        trace!(host, scope = addr.scope, "parsed IPv6 address");
        Ok(addr)
    }
}

impl TryFrom<&[u8]> for Address {
    type Error = AddrError;

    fn try_from(data: &[u8]) -> AddrResult<Self> {
        Address::from_binary(data)
    }
}

impl From<ByteArray16> for Address {
    fn from(bytes: ByteArray16) -> Self {
        Address::new(bytes)
    }
}

impl From<std::net::Ipv6Addr> for Address {
    fn from(x: std::net::Ipv6Addr) -> Address {
        Address::new(x.octets())
    }
}

impl From<Address> for std::net::Ipv6Addr {
    fn from(addr: Address) -> std::net::Ipv6Addr {
        addr.bytes.into()
    }
}

impl From<SockaddrIn6> for Address {
    fn from(sa: SockaddrIn6) -> Address {
        Address {
            bytes: sa.ip().octets(),
            scope: sa.scope_id() as u16,
        }
    }
}

impl std::hash::Hash for Address {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        state.write_u64(Address::hash(self));
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self.to_canonical_string() {
            Ok(s) => f.write_str(&s),
            Err(err) => {
                warn!("{}, falling back to the uncompressed form", err);
                f.write_str(&self.to_fully_qualified())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use nix::sys::socket::SockaddrIn6;
    use rand::Rng;

    use super::{AddrType, Address};
    use crate::{ipv4, mac::MacAddress, AddrError};

    fn v6(s: &str) -> Address {
        s.parse().unwrap()
    }

    #[test]
    fn parse_text() {
        let addr = v6("2001:db8::1");
        assert_eq!(
            addr.to_byte_array(),
            [0x20, 0x01, 0x0d, 0xb8, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0x01]
        );
        assert_eq!(addr.scope_id(), 0);
        assert_eq!(v6("[2001:db8::1]"), addr);
        assert_eq!(v6("::"), Address::UNSPECIFIED);
        assert_eq!(v6("::1"), Address::LOOPBACK);
        assert_eq!(v6("::ffff:10.0.0.1"), ipv4::Address::new(10, 0, 0, 1).create_ipv6());
    }

    #[test]
    fn parse_text_rejects() {
        for bad in [
            "not-an-address",
            "",
            ":",
            "1.2.3.4",
            "2001:db8::1::2",
            "2001:db8:0:0:0:0:0:0:1",
            "[2001:db8::1",
            "localhost",
            "2001:db8::1\0",
        ] {
            assert!(
                matches!(bad.parse::<Address>(), Err(AddrError::AddressFormat(_))),
                "{:?}",
                bad
            );
            assert!(!Address::validate(bad), "{:?}", bad);
        }
    }

    #[test]
    fn validate_has_no_state() {
        for text in ["fe80::1", "bogus", "[::1]"] {
            assert_eq!(Address::validate(text), Address::validate(text));
        }
        assert!(Address::validate("[::1]"));
        assert!(Address::validate("2001:db8::"));
    }

    #[test]
    fn binary_round_trip() {
        let mut rng = rand::thread_rng();
        for _ in 0..64 {
            let bytes: [u8; 16] = rng.gen();
            let addr = Address::from_binary(&bytes).unwrap();
            assert_eq!(addr.to_byte_array(), bytes);
            assert_eq!(addr.scope_id(), 0);
        }
        assert!(matches!(
            Address::from_binary(&[0u8; 15]),
            Err(AddrError::AddressFormat(_))
        ));
        assert!(Address::try_from(&[0u8; 17][..]).is_err());
    }

    #[test]
    fn link_local_from_mac() {
        let mac: MacAddress = "00:11:22:33:44:55".parse().unwrap();
        let addr = Address::link_local(mac);
        assert_eq!(addr, v6("fe80::0211:22ff:fe33:4455"));
        assert_eq!(addr.to_string(), "fe80::211:22ff:fe33:4455");
        assert!(addr.is_link_local());

        let mac: MacAddress = "02:42:ac:11:00:02".parse().unwrap();
        assert_eq!(Address::link_local(mac).to_string(), "fe80::42:acff:fe11:2");
    }

    #[test]
    fn sockaddr_round_trip() {
        let addr = v6("fe80::1").with_scope_id(3);
        let sa = addr.to_sockaddr();
        assert_eq!(sa.sin6_family, libc::AF_INET6 as libc::sa_family_t);
        assert_eq!(sa.sin6_scope_id, 3);
        assert_eq!(Address::from_sockaddr(&sa), addr);
        assert_ne!(addr, v6("fe80::1"));

        let ip: std::net::Ipv6Addr = "2001:db8::7".parse().unwrap();
        let sa = SockaddrIn6::from(std::net::SocketAddrV6::new(ip, 443, 0, 9));
        let addr = Address::from(sa);
        assert_eq!(addr.as_bytes(), &ip.octets());
        assert_eq!(addr.scope_id(), 9);
        assert_eq!(std::net::Ipv6Addr::from(addr), ip);
    }

    #[test]
    fn mapped() {
        let addr = v6("::ffff:192.168.1.1");
        assert!(addr.is_ipv4_mapped());
        assert_eq!(addr.create_ipv4().unwrap(), ipv4::Address::new(192, 168, 1, 1));
        assert!(addr.is_private());

        assert!(!v6("::192.168.1.1").is_ipv4_mapped());
        assert!(!v6("1::ffff:192.168.1.1").is_ipv4_mapped());
        assert!(matches!(
            v6("2001:db8::1").create_ipv4(),
            Err(AddrError::TypeMismatch(_))
        ));
    }

    #[test]
    fn transition_types() {
        let teredo = v6("2001:0:4136:e378:8000:63bf:3fff:fdd2");
        assert_eq!(teredo.address_type(), AddrType::Teredo);
        assert!(teredo.is_teredo() && !teredo.is_6to4());

        let six_to_four = v6("2002:c000:0204::1");
        assert_eq!(six_to_four.address_type(), AddrType::SixToFour);
        assert_eq!(
            six_to_four.get_ipv4_for_6to4().unwrap(),
            ipv4::Address::new(192, 0, 2, 4)
        );

        // byte-swapped prefixes must not match
        assert_eq!(v6("0120::1").address_type(), AddrType::Normal);
        assert_eq!(v6("0220::1").address_type(), AddrType::Normal);
        assert_eq!(v6("2001:db8::1").address_type(), AddrType::Normal);
        assert!(matches!(
            teredo.get_ipv4_for_6to4(),
            Err(AddrError::TypeMismatch(_))
        ));
    }

    #[test]
    fn classification() {
        assert!(v6("::1").is_loopback());
        assert!(v6("::ffff:127.0.0.1").is_loopback());
        assert!(!v6("::2").is_loopback());

        assert!(v6("::1").is_private());
        assert!(v6("fc00::1").is_private());
        assert!(v6("fdff:ffff::1").is_private());
        assert!(!v6("fe00::1").is_private());
        assert!(!v6("::ffff:8.8.8.8").is_private());

        assert!(v6("fe80::1").is_link_local());
        assert!(v6("febf:ffff::1").is_link_local());
        assert!(!v6("fec0::1").is_link_local());

        assert!(v6("ff02::1").is_link_local_broadcast());
        assert!(!v6("ff02::2").is_link_local_broadcast());

        assert!(v6("2001:db8::1").is_routable());
        assert!(v6("3fff::1").is_routable());
        assert!(!v6("4000::1").is_routable());
        assert!(!v6("fe80::1").is_routable());
        assert!(v6("ff0e::1").is_routable());
        assert!(v6("ff02::1").is_nonroutable());
    }

    #[test]
    fn multicast_fields() {
        let addr = v6("ff3e::8000:1");
        assert!(addr.is_multicast());
        assert_eq!(addr.get_multicast_flags(), 0x3);
        assert_eq!(addr.get_multicast_scope(), 0xe);
        assert!(!v6("fe80::1").is_multicast());
    }

    #[test]
    #[should_panic]
    fn multicast_scope_needs_multicast() {
        v6("2001:db8::1").get_multicast_scope();
    }

    #[test]
    fn solicited_node() {
        assert_eq!(
            v6("fe80::1234:5678").get_solicited_node_address(),
            v6("ff02::1:ff34:5678")
        );
        // example from RFC 4291 § 2.7.1
        assert_eq!(
            v6("4037::1:800:200e:8c6c")
                .get_solicited_node_address()
                .to_string(),
            "ff02::1:ff0e:8c6c"
        );
    }

    #[test]
    #[should_panic]
    fn solicited_node_needs_unicast() {
        v6("ff02::1").get_solicited_node_address();
    }

    #[test]
    fn masking() {
        let addr = v6("2001:db8:abcd:1234::1");
        assert_eq!(addr.mask(32).unwrap(), v6("2001:db8::"));
        assert_eq!(addr.mask(0).unwrap(), Address::UNSPECIFIED);
        assert_eq!(addr.mask(128).unwrap(), addr);
        assert_eq!(addr.mask(35).unwrap(), v6("2001:db8:a000::"));
        assert!(matches!(
            addr.mask(200),
            Err(AddrError::InvalidPrefixLength { len: 200, .. })
        ));
        assert!(addr.mask(129).is_err());

        let mut rng = rand::thread_rng();
        for _ in 0..32 {
            let addr = Address::new(rng.gen());
            for n in 0..=128 {
                let once = addr.mask(n).unwrap();
                assert_eq!(once.mask(n).unwrap(), once);
            }
        }
    }

    #[test]
    fn subnets() {
        assert!(v6("2001:db8::1").in_subnet("2001:db8::/32").unwrap());
        assert!(!v6("2001:db9::1").in_subnet("2001:db8::/32").unwrap());
        assert!(v6("2001:db8::1").in_subnet("::/0").unwrap());
        assert!(v6("2001:db8::1").in_subnet("2001:db8::1").unwrap());
        assert!(!v6("2001:db8::2").in_subnet("2001:db8::1/128").unwrap());
        assert!(matches!(
            v6("2001:db8::1").in_subnet("10.0.0.0/8"),
            Err(AddrError::AddressFormat(_))
        ));
        assert!(v6("2001:db8::1").in_subnet("2001:db8::/129").is_err());
        assert!(v6("2001:db8::1").in_subnet("garbage/32").is_err());
    }

    #[test]
    fn common_prefix() {
        let (prefix, len) = Address::longest_common_prefix(
            &(v6("2001:db8::"), 64),
            &(v6("2001:db9::"), 48),
        )
        .unwrap();
        assert_eq!(len, 31);
        assert_eq!(prefix, v6("2001:db8::"));

        assert!(Address::longest_common_prefix(&(v6("::"), 129), &(v6("::"), 0)).is_err());
    }

    #[test]
    fn nth_byte_and_bit() {
        let addr = v6("8001:db8::ff");
        assert_eq!(addr.get_nth_ms_byte(0).unwrap(), 0x80);
        assert_eq!(addr.get_nth_ms_byte(15).unwrap(), 0xff);
        assert_eq!(addr.get_nth_ls_byte(0).unwrap(), 0xff);
        assert_eq!(addr.get_nth_ls_byte(15).unwrap(), 0x80);
        assert!(matches!(
            addr.get_nth_ms_byte(16),
            Err(AddrError::IndexOutOfRange { index: 16, len: 16 })
        ));
        assert!(addr.get_nth_ls_byte(16).is_err());

        assert!(addr.get_nth_ms_bit(0).unwrap());
        assert!(!addr.get_nth_ms_bit(1).unwrap());
        assert!(addr.get_nth_ls_bit(0).unwrap());
        assert!(!addr.get_nth_ls_bit(8).unwrap());
        assert!(addr.get_nth_ms_bit(128).is_err());
    }

    #[test]
    fn render() {
        let addr = v6("2001:0db8:0000:0000:0000:ff00:0042:8329");
        assert_eq!(addr.to_canonical_string().unwrap(), "2001:db8::ff00:42:8329");
        assert_eq!(
            addr.to_fully_qualified(),
            "2001:0db8:0000:0000:0000:ff00:0042:8329"
        );
        assert_eq!(
            Address::UNSPECIFIED.to_fully_qualified(),
            "0000:0000:0000:0000:0000:0000:0000:0000"
        );
        assert_eq!(v6("2001:db8:0:1:1:1:1:1").to_string(), "2001:db8:0:1:1:1:1:1");
        assert_eq!(v6("2001:0:0:1::1").to_string(), "2001:0:0:1::1");
        assert_eq!(v6("::ffff:1.2.3.4").to_string(), "::ffff:1.2.3.4");
    }

    #[test]
    fn json() {
        let addr = v6("2001:db8::1");
        let value: serde_json::Value = serde_json::from_str(&addr.to_json().unwrap()).unwrap();
        assert_eq!(value["family"], "IPv6");
        assert_eq!(value["addr"], "2001:db8::1");
        assert_eq!(value["hash"], addr.hash());
    }

    #[test]
    fn mapped_hash_matches_ipv4() {
        let mut rng = rand::thread_rng();
        for _ in 0..64 {
            let v4 = ipv4::Address(rng.gen());
            let mapped = v4.create_ipv6();
            assert_eq!(mapped.hash(), v4.hash());
            assert_eq!(mapped.hash(), mapped.create_ipv4().unwrap().hash());
        }
        assert_ne!(v6("2001:db8::1").hash(), v6("2001:db8::2").hash());
        assert_eq!(v6("fe80::1").hash(), v6("fe80::1").with_scope_id(2).hash());
    }
}
