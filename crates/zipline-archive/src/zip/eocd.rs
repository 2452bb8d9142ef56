//! End of Central Directory (EOCD) structures.

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

/// End of Central Directory Record (without signature).
///
/// This is the trailer found at the end of every archive. The 4-byte
/// signature (0x06054b50) is read separately before this struct. ZIP64
/// archives put sentinel values (0xFFFF / 0xFFFFFFFF) in these fields.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C, packed)]
pub struct EocdRecord {
    /// Number of this disk
    pub disk_number: u16,
    /// Disk where central directory starts
    pub central_dir_disk: u16,
    /// Number of central directory records on this disk
    pub central_dir_count_disk: u16,
    /// Total number of central directory records
    pub central_dir_count_total: u16,
    /// Size of central directory (bytes)
    pub central_dir_size: u32,
    /// Offset of start of central directory
    pub central_dir_offset: u32,
    /// Comment length
    pub comment_length: u16,
}

impl EocdRecord {
    /// EOCD signature bytes.
    pub const MAGIC: [u8; 4] = [0x50, 0x4b, 0x05, 0x06];

    /// EOCD signature as u32.
    pub const SIGNATURE: u32 = 0x06054b50;

    /// Size of the fixed part including the signature.
    pub const FIXED_SIZE: usize = 4 + std::mem::size_of::<Self>();

    /// How far from the end of the archive the EOCD can start: the fixed
    /// record plus the largest possible comment.
    pub const MAX_SEARCH: usize = Self::FIXED_SIZE + u16::MAX as usize;

    /// Build a single-disk record.
    pub fn new(entries: u16, central_dir_size: u32, central_dir_offset: u32, comment_length: u16) -> Self {
        Self {
            disk_number: 0,
            central_dir_disk: 0,
            central_dir_count_disk: entries,
            central_dir_count_total: entries,
            central_dir_size,
            central_dir_offset,
            comment_length,
        }
    }

    /// Check if this archive uses ZIP64 extensions.
    pub fn is_zip64(&self) -> bool {
        self.central_dir_count_total == 0xFFFF
            || self.central_dir_offset == 0xFFFFFFFF
            || self.central_dir_size == 0xFFFFFFFF
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_size() {
        assert_eq!(EocdRecord::FIXED_SIZE, 22);
        assert_eq!(EocdRecord::MAX_SEARCH, 65_557);
    }

    #[test]
    fn test_zip64_sentinels() {
        assert!(!EocdRecord::new(3, 100, 200, 0).is_zip64());
        assert!(EocdRecord::new(0xFFFF, 100, 200, 0).is_zip64());
        assert!(EocdRecord::new(3, 100, 0xFFFFFFFF, 0).is_zip64());
    }
}
