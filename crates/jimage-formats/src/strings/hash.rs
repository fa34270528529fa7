//! Seeded string hash shared by the string table and the perfect hash index
//!
//! The function is a 32-bit FNV variant: for every byte the running value is
//! multiplied by [`HASH_MULTIPLIER`] and then XORed with the byte. The result
//! is masked to 31 bits so that it can be reduced with a plain modulo. Images
//! written by other implementations depend on this exact bit pattern.

/// FNV-1 32-bit prime, also used as the base seed
pub const HASH_MULTIPLIER: i32 = 0x0100_0193;

/// Mask that keeps a hash in the non-negative `i32` range
pub const POSITIVE_MASK: i32 = 0x7FFF_FFFF;

/// Run the hash over `data` starting from `seed`, without masking
///
/// Feeding the unmasked result of a prefix back in as the seed continues the
/// hash, so `unmasked_hash(b, unmasked_hash(a, s)) == unmasked_hash(a ++ b, s)`.
pub fn unmasked_hash(data: &[u8], seed: i32) -> i32 {
    data.iter()
        .fold(seed, |hash, &byte| hash.wrapping_mul(HASH_MULTIPLIER) ^ i32::from(byte))
}

/// Hash `data` with an explicit seed, masked to 31 bits
pub fn hash_code_with_seed(data: &[u8], seed: i32) -> i32 {
    unmasked_hash(data, seed) & POSITIVE_MASK
}

/// Hash `data` with the base seed, masked to 31 bits
///
/// This is the primary hash used to pick a redirect bucket.
pub fn hash_code(data: &[u8]) -> i32 {
    hash_code_with_seed(data, HASH_MULTIPLIER)
}
