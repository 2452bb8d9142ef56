//! Compression codec for ZIP entries.
//!
//! Pure functions with no shared state. DEFLATE is the raw (headerless)
//! stream the ZIP format mandates, not the zlib-wrapped variant.

use std::io::{Read, Write};

use bzip2::read::BzDecoder;
use bzip2::write::BzEncoder;
use flate2::read::DeflateDecoder;
use flate2::write::DeflateEncoder;

use crate::zip::CompressionMethod;
use crate::{Error, Result};

/// Default DEFLATE level.
pub const DEFAULT_DEFLATE_LEVEL: u32 = 6;

/// Default bzip2 block size (in 100k units).
pub const DEFAULT_BZIP2_LEVEL: u32 = 6;

/// Compress `data` with the method's default level.
pub fn compress(method: CompressionMethod, data: &[u8]) -> Result<Vec<u8>> {
    compress_with_level(method, data, None)
}

/// Compress `data`, optionally overriding the codec level.
///
/// Levels are clamped to each codec's valid range.
pub fn compress_with_level(
    method: CompressionMethod,
    data: &[u8],
    level: Option<i32>,
) -> Result<Vec<u8>> {
    match method {
        CompressionMethod::Store => Ok(data.to_vec()),
        CompressionMethod::Deflate => {
            let level = level.map_or(DEFAULT_DEFLATE_LEVEL, |l| l.clamp(0, 9) as u32);
            let mut encoder = DeflateEncoder::new(Vec::new(), flate2::Compression::new(level));
            encoder
                .write_all(data)
                .map_err(|e| Error::Compression(e.to_string()))?;
            encoder.finish().map_err(|e| Error::Compression(e.to_string()))
        }
        CompressionMethod::Bzip2 => {
            let level = level.map_or(DEFAULT_BZIP2_LEVEL, |l| l.clamp(1, 9) as u32);
            let mut encoder = BzEncoder::new(Vec::new(), bzip2::Compression::new(level));
            encoder
                .write_all(data)
                .map_err(|e| Error::Compression(e.to_string()))?;
            encoder.finish().map_err(|e| Error::Compression(e.to_string()))
        }
        CompressionMethod::Zstd => {
            let level = level.unwrap_or(zstd::DEFAULT_COMPRESSION_LEVEL);
            zstd::bulk::compress(data, level).map_err(|e| Error::Compression(e.to_string()))
        }
        CompressionMethod::Unsupported(id) => Err(Error::UnsupportedCompression(id)),
    }
}

/// Decompress `data`, which must expand to exactly `expected_size` bytes.
pub fn decompress(method: CompressionMethod, data: &[u8], expected_size: usize) -> Result<Vec<u8>> {
    let output = match method {
        CompressionMethod::Store => data.to_vec(),
        CompressionMethod::Deflate => read_bounded(DeflateDecoder::new(data), expected_size)?,
        CompressionMethod::Bzip2 => read_bounded(BzDecoder::new(data), expected_size)?,
        CompressionMethod::Zstd => {
            let decoder =
                zstd::Decoder::new(data).map_err(|e| Error::Decompression(e.to_string()))?;
            read_bounded(decoder, expected_size)?
        }
        CompressionMethod::Unsupported(id) => return Err(Error::UnsupportedCompression(id)),
    };

    if output.len() != expected_size {
        return Err(Error::Decompression(format!(
            "{} entry size mismatch: expected {}, got {}",
            method,
            expected_size,
            output.len()
        )));
    }

    Ok(output)
}

/// Upper bound on the up-front output reservation; the declared size comes
/// from the archive and is not trusted.
const MAX_PREALLOC: usize = 64 << 20;

/// Drain a decoder, reading at most one byte more than expected so an
/// oversized stream is detected without inflating it fully.
fn read_bounded<R: Read>(decoder: R, expected_size: usize) -> Result<Vec<u8>> {
    let mut output = Vec::with_capacity(expected_size.min(MAX_PREALLOC));
    decoder
        .take(expected_size as u64 + 1)
        .read_to_end(&mut output)
        .map_err(|e| Error::Decompression(e.to_string()))?;
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    const METHODS: [CompressionMethod; 4] = [
        CompressionMethod::Store,
        CompressionMethod::Deflate,
        CompressionMethod::Bzip2,
        CompressionMethod::Zstd,
    ];

    #[test]
    fn test_roundtrip_all_methods() {
        let original = b"Hello, World! This is a test of ZIP entry compression.".repeat(20);

        for method in METHODS {
            let compressed = compress(method, &original).unwrap();
            let decompressed = decompress(method, &compressed, original.len()).unwrap();
            assert_eq!(decompressed, original, "method {}", method);
        }
    }

    #[test]
    fn test_roundtrip_empty() {
        for method in METHODS {
            let compressed = compress(method, &[]).unwrap();
            let decompressed = decompress(method, &compressed, 0).unwrap();
            assert!(decompressed.is_empty(), "method {}", method);
        }
    }

    #[test]
    fn test_deflate_is_raw() {
        let compressed = compress(CompressionMethod::Deflate, b"hello").unwrap();

        // zlib streams start with a CMF byte of 0x78; a raw stream of a short
        // input starts with a block header instead.
        assert_ne!(compressed[0], 0x78);

        let mut decoder = DeflateDecoder::new(&compressed[..]);
        let mut out = Vec::new();
        decoder.read_to_end(&mut out).unwrap();
        assert_eq!(out, b"hello");
    }

    #[test]
    fn test_size_mismatch() {
        let compressed = compress(CompressionMethod::Deflate, b"hello world").unwrap();
        assert!(matches!(
            decompress(CompressionMethod::Deflate, &compressed, 5),
            Err(Error::Decompression(_))
        ));
        assert!(matches!(
            decompress(CompressionMethod::Store, b"abc", 4),
            Err(Error::Decompression(_))
        ));
    }

    #[test]
    fn test_oversized_declared_size() {
        let compressed = compress(CompressionMethod::Deflate, b"tiny").unwrap();
        let output = read_bounded(DeflateDecoder::new(&compressed[..]), u32::MAX as usize).unwrap();
        assert_eq!(output, b"tiny");
        assert!(output.capacity() <= MAX_PREALLOC);

        assert!(matches!(
            decompress(CompressionMethod::Deflate, &compressed, u32::MAX as usize),
            Err(Error::Decompression(_))
        ));
    }

    #[test]
    fn test_unsupported() {
        assert!(matches!(
            compress(CompressionMethod::Unsupported(99), b"x"),
            Err(Error::UnsupportedCompression(99))
        ));
        assert!(matches!(
            decompress(CompressionMethod::Unsupported(99), b"x", 1),
            Err(Error::UnsupportedCompression(99))
        ));
    }

    #[test]
    fn test_level_override() {
        let data = vec![b'a'; 4096];
        let fast = compress_with_level(CompressionMethod::Deflate, &data, Some(1)).unwrap();
        let best = compress_with_level(CompressionMethod::Deflate, &data, Some(9)).unwrap();
        assert_eq!(decompress(CompressionMethod::Deflate, &fast, 4096).unwrap(), data);
        assert_eq!(decompress(CompressionMethod::Deflate, &best, 4096).unwrap(), data);
    }
}
