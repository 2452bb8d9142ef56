//! ZIP format structures.
//!
//! This module contains the low-level, bit-exact record layouts of classic
//! (non-ZIP64) archives and the compression method identifiers.

pub mod central_dir;
mod eocd;
pub mod extra;
mod local;

pub use central_dir::CentralDirectoryHeader;
pub use eocd::EocdRecord;
pub use local::LocalFileHeader;

/// Host system id stored in the upper byte of "version made by" for Unix.
pub const HOST_UNIX: u8 = 3;

/// "Version made by" written for new entries: Unix host, format version 6.3.
pub const VERSION_MADE_BY: u16 = ((HOST_UNIX as u16) << 8) | 63;

/// General purpose flag bit 3: sizes and CRC follow the data in a descriptor.
pub const FLAG_DATA_DESCRIPTOR: u16 = 1 << 3;

/// Optional signature opening a data descriptor.
pub const DATA_DESCRIPTOR_SIGNATURE: u32 = 0x0807_4b50;

/// Data descriptor size without its optional signature: CRC and two sizes.
pub const DATA_DESCRIPTOR_SIZE: u64 = 12;

/// General purpose flag bit 11: name and comment are UTF-8.
pub const FLAG_UTF8: u16 = 1 << 11;

/// Largest value a classic 16-bit length or count field can hold.
pub const MAX_U16: usize = u16::MAX as usize;

/// Largest value a classic 32-bit size or offset field can hold.
pub const MAX_U32: u64 = u32::MAX as u64;

/// Compression methods understood by the engine.
///
/// Entries using any other method can still be listed and read raw; a
/// decoding read reports [`crate::Error::UnsupportedCompression`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompressionMethod {
    /// No compression (stored).
    Store,
    /// Raw DEFLATE stream (no zlib wrapper).
    Deflate,
    /// bzip2.
    Bzip2,
    /// Zstandard.
    Zstd,
    /// Any method id the engine cannot decode.
    Unsupported(u16),
}

impl CompressionMethod {
    /// Build from the method id stored in ZIP headers.
    pub const fn from_zip_id(id: u16) -> Self {
        match id {
            0 => Self::Store,
            8 => Self::Deflate,
            12 => Self::Bzip2,
            93 => Self::Zstd,
            other => Self::Unsupported(other),
        }
    }

    /// The method id stored in ZIP headers.
    pub const fn zip_id(self) -> u16 {
        match self {
            Self::Store => 0,
            Self::Deflate => 8,
            Self::Bzip2 => 12,
            Self::Zstd => 93,
            Self::Unsupported(id) => id,
        }
    }

    /// Compact code used by bindings: -1 unsupported, 0 store, 1 deflate,
    /// 2 bzip2, 3 zstd.
    pub const fn code(self) -> i8 {
        match self {
            Self::Unsupported(_) => -1,
            Self::Store => 0,
            Self::Deflate => 1,
            Self::Bzip2 => 2,
            Self::Zstd => 3,
        }
    }

    /// Inverse of [`code`](Self::code) for the supported methods.
    pub const fn from_code(code: i8) -> Option<Self> {
        match code {
            0 => Some(Self::Store),
            1 => Some(Self::Deflate),
            2 => Some(Self::Bzip2),
            3 => Some(Self::Zstd),
            _ => None,
        }
    }

    /// Whether the codec can encode and decode this method.
    pub const fn is_supported(self) -> bool {
        !matches!(self, Self::Unsupported(_))
    }

    /// Minimum "version needed to extract" for this method.
    pub const fn version_needed(self) -> u16 {
        match self {
            Self::Store | Self::Unsupported(_) => 10,
            Self::Deflate => 20,
            Self::Bzip2 => 46,
            Self::Zstd => 63,
        }
    }

    /// Lowercase display name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Store => "store",
            Self::Deflate => "deflate",
            Self::Bzip2 => "bzip2",
            Self::Zstd => "zstd",
            Self::Unsupported(_) => "unsupported",
        }
    }
}

impl From<u16> for CompressionMethod {
    fn from(id: u16) -> Self {
        Self::from_zip_id(id)
    }
}

impl std::fmt::Display for CompressionMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unsupported(id) => f.pad(&format!("unsupported({})", id)),
            other => f.pad(other.name()),
        }
    }
}
