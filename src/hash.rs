use std::hash::Hasher;

use siphasher::sip128::{Hasher128, SipHasher13};

// Fixed keys keep hashes stable across processes.
const KEY0: u64 = 0x736f_6d65_7073_6575;
const KEY1: u64 = 0x646f_7261_6e64_6f6d;

const MUL: u64 = 0x9ddf_ea08_eb38_2d69;

/// Hash `data` into two 64-bit halves.
pub fn hash128(data: &[u8]) -> (u64, u64) {
    let mut hasher = SipHasher13::new_with_keys(KEY0, KEY1);
    hasher.write(data);
    let h = hasher.finish128();
    (h.h1, h.h2)
}

/// Fold a 128-bit value into 64 bits.
pub const fn hash_128_to_64(upper: u64, lower: u64) -> u64 {
    let mut a = (lower ^ upper).wrapping_mul(MUL);
    a ^= a >> 47;
    let mut b = (upper ^ a).wrapping_mul(MUL);
    b ^= b >> 47;
    b.wrapping_mul(MUL)
}

/// Chain `values` onto `seed`. Order matters.
pub fn combine(seed: u64, values: &[u64]) -> u64 {
    values
        .iter()
        .fold(seed, |acc, &value| hash_128_to_64(acc, value))
}
