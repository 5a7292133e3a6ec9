use crate::{
    octets::{ByteArray16, ADDR_SIZE},
    AddrError, AddrResult,
};

/// Number of bits in an IPv6 address.
pub const BIT_COUNT: u8 = 128;

/// Netmasks for every prefix length from /0 to /128. Entry `n` has its `n` high bits set.
pub static MASKS: [ByteArray16; BIT_COUNT as usize + 1] = build();

const fn build() -> [ByteArray16; BIT_COUNT as usize + 1] {
    let mut masks = [[0u8; ADDR_SIZE]; BIT_COUNT as usize + 1];
    let mut len = 0;
    while len <= BIT_COUNT as usize {
        let mut octet = 0;
        while octet < ADDR_SIZE {
            let start = octet * 8;
            masks[len][octet] = if len >= start + 8 {
                0xff
            } else if len <= start {
                0x00
            } else {
                !(0xffu8 >> (len - start))
            };
            octet += 1;
        }
        len += 1;
    }
    masks
}

/// Return the netmask for a prefix length.
pub fn fetch_mask(len: usize) -> AddrResult<&'static ByteArray16> {
    if len > BIT_COUNT as usize {
        return Err(AddrError::InvalidPrefixLength {
            len,
            max: BIT_COUNT as usize,
        });
    }
    Ok(fetch_mask_unchecked(len))
}

/// # Panics
/// The function panics if `len` is greater than 128.
pub(crate) fn fetch_mask_unchecked(len: usize) -> &'static ByteArray16 {
    &MASKS[len]
}
