//! ZIP archive engine.
//!
//! Reads classic (non-ZIP64) ZIP archives with random access to individual
//! entries, writes new archives or appends to existing ones with a chosen
//! compression method and data alignment, and deletes entries either in
//! place or by rebuilding the archive.
//!
//! # Example
//!
//! ```no_run
//! use zipline_archive::{CompressionMethod, ZipArchive, ZipWriter};
//!
//! let mut writer = ZipWriter::create("out.zip")?;
//! writer.write_entry("hello.txt", b"hello", CompressionMethod::Deflate, 0)?;
//! writer.write_entry("lib/libfoo.so", &[0u8; 1024], CompressionMethod::Store, 4096)?;
//! writer.finish()?;
//!
//! let archive = ZipArchive::open("out.zip")?;
//! if let Some(entry) = archive.open_entry_by_name("hello.txt")? {
//!     assert_eq!(entry.read()?, b"hello");
//! }
//! # Ok::<(), zipline_archive::Error>(())
//! ```

mod archive;
pub mod codec;
mod delete;
mod entry;
mod error;
mod storage;
mod writer;
pub mod zip;

pub use archive::{EntryHandle, ZipArchive};
pub use entry::{DosDateTime, EntryRecord};
pub use error::{Error, Result};
pub use writer::{WriteOptions, ZipWriter, DEFAULT_DIR_PERMISSIONS, DEFAULT_FILE_PERMISSIONS};
pub use zip::CompressionMethod;
