//! Hash normalizer: folds a 64-bit key hash into the table's 32-bit word and
//! mixes the high half into the low bits used for bucket masking.

/// Normalized hash stored in every entry.
pub(crate) type NormHash = u32;

#[inline]
pub(crate) fn spread(raw: u64) -> NormHash {
    let h = (raw ^ (raw >> 32)) as u32;
    h ^ (h >> 16)
}

#[cfg(test)]
mod tests {
    use super::spread;

    #[test]
    fn small_hashes_are_unchanged() {
        for raw in 0u64..1024 {
            assert_eq!(spread(raw), raw as u32);
        }
    }

    #[test]
    fn high_bits_reach_the_mask() {
        // Differ only above bit 16: without mixing both would share slot 0.
        let a = spread(1 << 16);
        let b = spread(2 << 16);
        assert_ne!(a & 0xf, b & 0xf);
        // Differ only in the upper 32 bits.
        assert_ne!(spread(1 << 32) & 0xff, spread(0) & 0xff);
    }
}
