//! CRC32 hashing utilities.
//!
//! ZIP stores the CRC32 (IEEE 802.3 polynomial) of every entry's uncompressed
//! data in both its local and central headers.

/// Compute the CRC32 of a byte slice.
///
/// Uses hardware acceleration when available (PCLMULQDQ on x86, CRC on aarch64).
#[inline]
pub fn hash_bytes(data: &[u8]) -> u32 {
    crc32fast::hash(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_hash() {
        assert_eq!(hash_bytes(&[]), 0);
    }

    #[test]
    fn test_known_hash() {
        assert_eq!(hash_bytes(b"hello"), 0x3610_A686);
    }
}
