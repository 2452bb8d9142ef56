//! Error types for the archive crate.

use thiserror::Error;

/// Errors that can occur when reading or writing ZIP archives.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// I/O error with the operation and archive offset it happened at.
    #[error("I/O error while {op} at offset {offset}: {source}")]
    IoAt {
        op: &'static str,
        offset: u64,
        #[source]
        source: std::io::Error,
    },

    /// Buffer ran out while decoding a record.
    #[error("{0}")]
    Common(#[from] zipline_common::Error),

    /// Invalid ZIP magic bytes.
    #[error("invalid ZIP signature at offset {offset}: expected {expected:#010x}, got {actual:#010x}")]
    InvalidSignature {
        expected: u32,
        actual: u32,
        offset: u64,
    },

    /// Could not find the end of central directory record.
    #[error("could not find end of central directory record")]
    EocdNotFound,

    /// A record extends past the end of the archive.
    #[error("truncated {what} at offset {offset}")]
    Truncated { what: &'static str, offset: u64 },

    /// The archive or entry needs ZIP64 extensions.
    #[error("ZIP64 is not supported: {0}")]
    Zip64Unsupported(String),

    /// Unsupported compression method.
    #[error("unsupported compression method: {0}")]
    UnsupportedCompression(u16),

    /// Compression error.
    #[error("compression error: {0}")]
    Compression(String),

    /// Decompression error.
    #[error("decompression error: {0}")]
    Decompression(String),

    /// CRC32 of decompressed data does not match the stored value.
    #[error("CRC32 mismatch for {name}: expected {expected:#010x}, got {actual:#010x}")]
    IntegrityMismatch {
        name: String,
        expected: u32,
        actual: u32,
    },

    /// Entry not found.
    #[error("entry not found: {0}")]
    EntryNotFound(String),

    /// The archive handle was used after `close`.
    #[error("archive used after close")]
    UseAfterClose,

    /// The writer was used after it was closed or finished.
    #[error("writer is closed")]
    ClosedHandle,

    /// Alignment is neither zero nor a power of two.
    #[error("invalid alignment {0}: must be 0 or a power of two")]
    InvalidAlignment(u16),

    /// Archive comment does not fit in 16 bits.
    #[error("archive comment too long: {0} bytes (max 65535)")]
    CommentTooLong(usize),
}

impl Error {
    /// Whether this error means the bytes are not a readable classic ZIP
    /// archive (as opposed to an I/O or usage problem).
    pub fn is_malformed(&self) -> bool {
        matches!(
            self,
            Error::InvalidSignature { .. }
                | Error::EocdNotFound
                | Error::Truncated { .. }
                | Error::Common(zipline_common::Error::UnexpectedEof { .. })
        )
    }
}

/// Attach operation and offset context to I/O results.
pub(crate) trait IoContext<T> {
    fn at(self, op: &'static str, offset: u64) -> Result<T>;
}

impl<T> IoContext<T> for std::io::Result<T> {
    fn at(self, op: &'static str, offset: u64) -> Result<T> {
        self.map_err(|source| Error::IoAt { op, offset, source })
    }
}

/// Result type for archive operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_classification() {
        assert!(Error::EocdNotFound.is_malformed());
        assert!(Error::Truncated {
            what: "central directory",
            offset: 10
        }
        .is_malformed());
        assert!(!Error::UseAfterClose.is_malformed());
        assert!(!Error::UnsupportedCompression(99).is_malformed());
    }

    #[test]
    fn test_io_context() {
        let result: std::io::Result<()> = Err(std::io::Error::new(
            std::io::ErrorKind::UnexpectedEof,
            "short read",
        ));
        let err = result.at("reading local header", 42).unwrap_err();
        assert!(err.to_string().contains("offset 42"));
    }
}
