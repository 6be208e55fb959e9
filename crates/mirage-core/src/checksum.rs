//! FNV-1a checksum fold.
//!
//! One fold function is used for every checksum in the system: world
//! tiles, agent positions, and the combination of the two. Each value is
//! folded as its eight little-endian bytes.

use std::hash::Hasher;

pub const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
pub const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Incremental 64-bit FNV-1a hasher.
#[derive(Debug, Clone, Copy)]
pub struct Fnv1a {
    hash: u64,
}

impl Fnv1a {
    pub fn new() -> Self {
        Self {
            hash: FNV_OFFSET_BASIS,
        }
    }

    /// Fold one signed value (two's complement bytes).
    pub fn write_signed(&mut self, value: i64) {
        self.write_u64(value as u64);
    }
}

impl Default for Fnv1a {
    fn default() -> Self {
        Self::new()
    }
}

impl Hasher for Fnv1a {
    fn finish(&self) -> u64 {
        self.hash
    }

    fn write(&mut self, bytes: &[u8]) {
        for byte in bytes {
            self.hash ^= u64::from(*byte);
            self.hash = self.hash.wrapping_mul(FNV_PRIME);
        }
    }

    fn write_u64(&mut self, value: u64) {
        self.write(&value.to_le_bytes());
    }
}

/// Fold a sequence of words.
pub fn fold<I>(values: I) -> u64
where
    I: IntoIterator<Item = u64>,
{
    let mut hasher = Fnv1a::new();
    for value in values {
        hasher.write_u64(value);
    }
    hasher.finish()
}

/// Combine the world and agent checksums into the per-tick total.
pub fn combine(world_checksum: u64, agents_checksum: u64) -> u64 {
    fold([world_checksum, agents_checksum])
}

/// Fixed-point representation of a coordinate used by agent checksums.
pub fn quantize_milli(value: f64) -> i64 {
    (value * 1000.0).round() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_fold_is_offset_basis() {
        assert_eq!(fold(std::iter::empty()), FNV_OFFSET_BASIS);
    }

    #[test]
    fn byte_fold_matches_reference_vector() {
        // FNV-1a 64 of "a".
        let mut h = Fnv1a::new();
        h.write(b"a");
        assert_eq!(h.finish(), 0xaf63_dc4c_8601_ec8c);
    }

    #[test]
    fn order_matters() {
        assert_ne!(fold([1, 2]), fold([2, 1]));
        assert_ne!(combine(1, 2), combine(2, 1));
    }

    #[test]
    fn quantize_rounds_to_nearest_milli() {
        assert_eq!(quantize_milli(1.2346), 1235);
        assert_eq!(quantize_milli(-0.0004), 0);
        assert_eq!(quantize_milli(3.0), 3000);
    }
}
