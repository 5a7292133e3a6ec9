//! Operations over fixed sixteen-octet buffers, in network byte order.

use std::fmt::Write;

use crate::masks;

/// Size of an IPv6 address in octets.
pub const ADDR_SIZE: usize = 16;

pub type ByteArray16 = [u8; ADDR_SIZE];

/// Octet-wise AND of two buffers.
pub fn mask(one: &ByteArray16, two: &ByteArray16) -> ByteArray16 {
    let mut out = [0u8; ADDR_SIZE];
    for (o, (a, b)) in out.iter_mut().zip(one.iter().zip(two.iter())) {
        *o = a & b;
    }
    out
}

/// Find the bits shared by two prefixes, looking at no more than the shorter of the two
/// prefix lengths.
///
/// Returns the common bits (everything past the common length is zero) and the common
/// length. Prefix lengths above 128 are treated as 128.
pub fn longest_common_prefix(
    one: &ByteArray16,
    one_len: u8,
    two: &ByteArray16,
    two_len: u8,
) -> (ByteArray16, u8) {
    let limit = one_len.min(two_len).min(masks::BIT_COUNT) as usize;

    // whole octets first
    let mut index = 0;
    while index < ADDR_SIZE && index * 8 < limit && one[index] == two[index] {
        index += 1;
    }

    let mut common = (index * 8).min(limit);
    if common < limit {
        // number of equal high bits in the first differing octet
        let same = (one[index] ^ two[index]).leading_zeros() as usize;
        common = (common + same).min(limit);
    }

    (mask(one, masks::fetch_mask_unchecked(common)), common as u8)
}

/// Render a buffer as lowercase hex, two digits per octet.
pub fn to_hex(data: &[u8]) -> String {
    let mut out = String::with_capacity(data.len() * 2);
    for b in data {
        // writing to a String cannot fail
        let _ = write!(out, "{:02x}", b);
    }
    out
}
