use std::str::FromStr;

use crate::{AddrError, AddrResult};

/// Size of a MAC address in octets.
pub const MAC_SIZE: usize = 6;

/// A six-octet IEEE 802 MAC address.
#[derive(Debug, Hash, PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Default)]
pub struct MacAddress(pub [u8; MAC_SIZE]);

impl MacAddress {
    /// The broadcast address.
    pub const BROADCAST: MacAddress = MacAddress([0xff; MAC_SIZE]);

    /// Construct a MAC address from a sequence of octets, in big-endian.
    pub fn from_bytes(data: &[u8]) -> AddrResult<MacAddress> {
        let bytes: [u8; MAC_SIZE] = data.try_into().map_err(|_| {
            AddrError::AddressFormat(format!(
                "MAC address must be {} bytes, got {}",
                MAC_SIZE,
                data.len()
            ))
        })?;
        Ok(MacAddress(bytes))
    }

    /// Return a MAC address as a sequence of octets, in big-endian.
    pub const fn as_bytes(&self) -> &[u8; MAC_SIZE] {
        &self.0
    }

    /// Query whether the "multicast" bit in the OUI is set.
    pub const fn is_multicast(&self) -> bool {
        self.0[0] & 0x01 != 0
    }

    /// Query whether the "locally administered" bit in the OUI is set.
    pub const fn is_local(&self) -> bool {
        self.0[0] & 0x02 != 0
    }
}

/// Parse `aa:bb:cc:dd:ee:ff`, also accepting `-` as the separator.
impl FromStr for MacAddress {
    type Err = AddrError;

    fn from_str(value: &str) -> AddrResult<Self> {
        let invalid = || AddrError::AddressFormat(format!("Invalid MAC address '{}'", value));

        let mut bytes = [0u8; MAC_SIZE];
        let mut parts = value.split([':', '-']);
        for byte in bytes.iter_mut() {
            let part = parts.next().ok_or_else(invalid)?;
            if part.len() != 2 || !part.bytes().all(|b| b.is_ascii_hexdigit()) {
                return Err(invalid());
            }
            *byte = u8::from_str_radix(part, 16).map_err(|_| invalid())?;
        }
        if parts.next().is_some() {
            return Err(invalid());
        }
        Ok(MacAddress(bytes))
    }
}

impl std::fmt::Display for MacAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let bytes = self.0;
        write!(
            f,
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5]
        )
    }
}
