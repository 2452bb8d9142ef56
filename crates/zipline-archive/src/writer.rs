//! ZIP archive writer.
//!
//! Entries are written front to back: a local header followed by the entry
//! data, one after the other. The central directory and EOCD are only
//! written when the writer is closed.
//!
//! In append mode the records of the existing archive are adopted as
//! parsed. New entries go after the previous end of the archive, leaving
//! the old central directory behind as dead space.

use std::ops::Range;
use std::path::Path;
use std::time::SystemTime;

use log::{debug, warn};
use zerocopy::IntoBytes;
use zipline_common::crc;

use crate::archive::Layout;
use crate::codec;
use crate::entry::{DosDateTime, EntryRecord};
use crate::storage::Storage;
use crate::zip::{
    extra, CentralDirectoryHeader, CompressionMethod, EocdRecord, LocalFileHeader, FLAG_UTF8,
    MAX_U16, MAX_U32, VERSION_MADE_BY,
};
use crate::{Error, Result};

/// Unix file type bits for a regular file.
const S_IFREG: u32 = 0o100000;

/// Unix file type bits for a directory.
const S_IFDIR: u32 = 0o040000;

/// MS-DOS directory attribute.
const DOS_DIRECTORY: u32 = 0x10;

/// Default permissions of file entries.
pub const DEFAULT_FILE_PERMISSIONS: u32 = 0o644;

/// Default permissions of directory entries.
pub const DEFAULT_DIR_PERMISSIONS: u32 = 0o755;

/// How one entry is encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteOptions {
    /// Compression method
    pub compression: CompressionMethod,
    /// Data alignment in bytes; 0 disables alignment
    pub alignment: u16,
    /// Codec level; the codec default when `None`
    pub level: Option<i32>,
    /// Modification time; the current time when `None`
    pub modified: Option<SystemTime>,
    /// Unix permission bits; 0o644 for files and 0o755 for directories when `None`
    pub permissions: Option<u32>,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self::new(CompressionMethod::Deflate)
    }
}

impl WriteOptions {
    pub fn new(compression: CompressionMethod) -> Self {
        Self {
            compression,
            alignment: 0,
            level: None,
            modified: None,
            permissions: None,
        }
    }

    pub fn compression(mut self, compression: CompressionMethod) -> Self {
        self.compression = compression;
        self
    }

    pub fn alignment(mut self, alignment: u16) -> Self {
        self.alignment = alignment;
        self
    }

    pub fn level(mut self, level: i32) -> Self {
        self.level = Some(level);
        self
    }

    pub fn modified(mut self, time: SystemTime) -> Self {
        self.modified = Some(time);
        self
    }

    pub fn permissions(mut self, mode: u32) -> Self {
        self.permissions = Some(mode & 0o7777);
        self
    }
}

/// Builds a new archive or appends to an existing one.
///
/// The writer must be closed with [`close`](Self::close),
/// [`finish`](Self::finish) or [`into_bytes`](Self::into_bytes); until then
/// the output has no central directory. After a failed `write_entry` the
/// output is in an unspecified state and the writer should be discarded.
pub struct ZipWriter {
    /// Output sink; `None` once closed
    pub(crate) sink: Option<Storage>,
    /// Adopted and newly written entries, in physical order
    pub(crate) records: Vec<EntryRecord>,
    /// Where the next local header goes
    pub(crate) cursor: u64,
    /// Archive comment
    pub(crate) comment: Vec<u8>,
    /// Trailer of an adopted archive, reusable when no entry is added
    pub(crate) old_trailer: Option<Range<u64>>,
}

impl ZipWriter {
    /// Create a new archive file, truncating any existing one.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self::fresh(Storage::open_write(path.as_ref(), true)?))
    }

    /// Open an archive file for appending, creating it if missing.
    pub fn append<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::adopt(Storage::open_write(path.as_ref(), false)?)
    }

    /// Build a new archive in memory.
    pub fn new_in_memory() -> Self {
        Self::fresh(Storage::memory(Vec::new()))
    }

    /// Append to an archive held in memory.
    pub fn append_bytes(bytes: Vec<u8>) -> Result<Self> {
        Self::adopt(Storage::memory(bytes))
    }

    pub(crate) fn fresh(sink: Storage) -> Self {
        Self {
            sink: Some(sink),
            records: Vec::new(),
            cursor: 0,
            comment: Vec::new(),
            old_trailer: None,
        }
    }

    /// Take over an existing archive; an empty sink starts a new one.
    pub(crate) fn adopt(mut sink: Storage) -> Result<Self> {
        if sink.len()? == 0 {
            return Ok(Self::fresh(sink));
        }

        let layout = Layout::read(&mut sink)?;
        debug!(
            "appending to archive with {} entries ({} bytes)",
            layout.records.len(),
            layout.archive_len
        );

        Ok(Self {
            sink: Some(sink),
            records: layout.records,
            cursor: layout.archive_len,
            comment: layout.comment,
            old_trailer: Some(layout.central_dir_offset..layout.archive_len),
        })
    }

    /// Records written or adopted so far.
    pub fn records(&self) -> &[EntryRecord] {
        &self.records
    }

    /// Number of entries the central directory will list.
    pub fn entry_count(&self) -> usize {
        self.records.len()
    }

    /// Current archive comment.
    pub fn comment(&self) -> &[u8] {
        &self.comment
    }

    /// Whether the writer has been closed.
    pub fn is_closed(&self) -> bool {
        self.sink.is_none()
    }

    /// Set the archive comment written into the EOCD.
    pub fn set_comment(&mut self, comment: impl Into<Vec<u8>>) -> Result<()> {
        self.ensure_open()?;

        let comment = comment.into();
        if comment.len() > MAX_U16 {
            return Err(Error::CommentTooLong(comment.len()));
        }
        self.comment = comment;
        Ok(())
    }

    /// Add a file entry with the given method and alignment.
    pub fn write_entry(
        &mut self,
        name: &str,
        data: &[u8],
        compression: CompressionMethod,
        alignment: u16,
    ) -> Result<()> {
        let options = WriteOptions::new(compression).alignment(alignment);
        self.write_entry_with(name, data, &options)
    }

    /// Add a file entry.
    ///
    /// With a non-zero alignment, the local header is padded through an
    /// extra field so the entry data starts at a multiple of it.
    pub fn write_entry_with(&mut self, name: &str, data: &[u8], options: &WriteOptions) -> Result<()> {
        self.ensure_open()?;

        if options.alignment != 0 && !options.alignment.is_power_of_two() {
            return Err(Error::InvalidAlignment(options.alignment));
        }
        if data.len() as u64 > MAX_U32 {
            return Err(Error::Zip64Unsupported(format!(
                "entry {} is {} bytes",
                name,
                data.len()
            )));
        }

        let crc32 = crc::hash_bytes(data);
        let stored = codec::compress_with_level(options.compression, data, options.level)?;
        if stored.len() as u64 > MAX_U32 {
            return Err(Error::Zip64Unsupported(format!(
                "entry {} compresses to {} bytes",
                name,
                stored.len()
            )));
        }

        let permissions = options.permissions.unwrap_or(DEFAULT_FILE_PERMISSIONS);
        let mut record = self.new_record(name.as_bytes().to_vec(), options);
        record.crc32 = crc32;
        record.compressed_size = stored.len() as u32;
        record.uncompressed_size = data.len() as u32;
        record.external_attrs = (S_IFREG | permissions) << 16;

        self.push_entry(record, Vec::new(), options.alignment, &stored)
    }

    /// Add a directory entry. A trailing `/` is added when missing.
    pub fn write_dir(&mut self, name: &str) -> Result<()> {
        self.write_dir_with(name, &WriteOptions::new(CompressionMethod::Store))
    }

    /// Add a directory entry; only the time and permissions of `options`
    /// apply.
    pub fn write_dir_with(&mut self, name: &str, options: &WriteOptions) -> Result<()> {
        self.ensure_open()?;

        let mut name = name.as_bytes().to_vec();
        if name.last() != Some(&b'/') {
            name.push(b'/');
        }

        let options = options.clone().compression(CompressionMethod::Store).alignment(0);
        let permissions = options.permissions.unwrap_or(DEFAULT_DIR_PERMISSIONS);
        let mut record = self.new_record(name, &options);
        record.crc32 = crc::hash_bytes(&[]);
        record.external_attrs = ((S_IFDIR | permissions) << 16) | DOS_DIRECTORY;

        self.push_entry(record, Vec::new(), 0, &[])
    }

    /// Write the central directory and EOCD and release the sink. Closing
    /// twice is a no-op. If closing fails the writer stays open, so a later
    /// `close` retries and the failure is reported again.
    pub fn close(&mut self) -> Result<()> {
        if self.sink.is_none() {
            return Ok(());
        }
        self.finalize()?;
        Ok(())
    }

    /// Close the writer, consuming it.
    pub fn finish(mut self) -> Result<()> {
        self.close()
    }

    /// Close the writer and return the archive bytes.
    pub fn into_bytes(mut self) -> Result<Vec<u8>> {
        self.finalize()?.into_bytes()
    }

    pub(crate) fn ensure_open(&self) -> Result<()> {
        if self.sink.is_none() {
            return Err(Error::ClosedHandle);
        }
        Ok(())
    }

    /// A record for a new entry, before sizes and CRC are known.
    fn new_record(&self, name: Vec<u8>, options: &WriteOptions) -> EntryRecord {
        let modified = options
            .modified
            .map_or_else(DosDateTime::now, DosDateTime::from_system_time);
        let flags = if name.is_ascii() { 0 } else { FLAG_UTF8 };

        EntryRecord {
            index: self.records.len(),
            name,
            comment: Vec::new(),
            extra: Vec::new(),
            method: options.compression,
            compressed_size: 0,
            uncompressed_size: 0,
            crc32: 0,
            local_header_offset: 0,
            modified,
            version_made_by: VERSION_MADE_BY,
            version_needed: options.compression.version_needed(),
            flags,
            internal_attrs: 0,
            external_attrs: 0,
        }
    }

    /// Write a local header and the stored bytes of `record` at the cursor.
    ///
    /// `local_extra` goes into the local header as is; an alignment field is
    /// appended to it when `alignment` is non-zero. The record's offset and
    /// index are filled in before it is added.
    pub(crate) fn push_entry(
        &mut self,
        mut record: EntryRecord,
        mut local_extra: Vec<u8>,
        alignment: u16,
        stored: &[u8],
    ) -> Result<()> {
        let sink = self.sink.as_mut().ok_or(Error::ClosedHandle)?;
        let offset = self.cursor;

        if record.name.len() > MAX_U16 {
            return Err(Error::Zip64Unsupported(format!(
                "entry name is {} bytes",
                record.name.len()
            )));
        }
        if self.records.len() >= MAX_U16 {
            return Err(Error::Zip64Unsupported(format!(
                "archive would hold more than {} entries",
                MAX_U16
            )));
        }

        if alignment != 0 {
            let padding =
                extra::alignment_padding(offset, record.name.len() + local_extra.len(), alignment);
            local_extra.extend(extra::alignment_field(alignment, padding));
        }
        if local_extra.len() > MAX_U16 {
            return Err(Error::Zip64Unsupported(format!(
                "local extra field is {} bytes",
                local_extra.len()
            )));
        }

        let header_len = LocalFileHeader::FIXED_SIZE + record.name.len() + local_extra.len();
        let end = offset + header_len as u64 + stored.len() as u64;
        if end > MAX_U32 {
            return Err(Error::Zip64Unsupported(format!(
                "entry {} would end at offset {}",
                record.name(),
                end
            )));
        }

        let local = LocalFileHeader {
            version_needed: record.version_needed,
            flags: record.flags,
            compression_method: record.method.zip_id(),
            last_mod_time: record.modified.time,
            last_mod_date: record.modified.date,
            crc32: record.crc32,
            compressed_size: record.compressed_size,
            uncompressed_size: record.uncompressed_size,
            file_name_length: record.name.len() as u16,
            extra_field_length: local_extra.len() as u16,
        };

        let mut header = Vec::with_capacity(header_len);
        header.extend_from_slice(&LocalFileHeader::SIGNATURE.to_le_bytes());
        header.extend_from_slice(local.as_bytes());
        header.extend_from_slice(&record.name);
        header.extend_from_slice(&local_extra);

        sink.write_all_at(offset, &header, "writing local header")?;
        sink.write_all_at(offset + header.len() as u64, stored, "writing entry data")?;

        record.index = self.records.len();
        record.local_header_offset = offset as u32;

        debug!(
            "wrote {} ({}, {} -> {} bytes) at {}",
            record.name(),
            record.method,
            record.uncompressed_size,
            record.compressed_size,
            offset
        );

        self.records.push(record);
        self.cursor = end;
        Ok(())
    }

    /// Where the trailer goes.
    ///
    /// After an append session that added nothing, the old trailer region is
    /// reused, right-aligned to the old end so the length stays the same.
    fn trailer_start(&self, trailer_len: u64) -> u64 {
        match &self.old_trailer {
            Some(region) if self.cursor == region.end => {
                if trailer_len <= region.end - region.start {
                    region.end - trailer_len
                } else {
                    region.start
                }
            }
            _ => self.cursor,
        }
    }

    /// Write the central directory and EOCD, truncate after them and hand
    /// back the sink. On failure the sink stays with the writer, which is
    /// still open.
    pub(crate) fn finalize(&mut self) -> Result<Storage> {
        let mut sink = self.sink.take().ok_or(Error::ClosedHandle)?;
        match self.write_trailer(&mut sink) {
            Ok(()) => Ok(sink),
            Err(e) => {
                self.sink = Some(sink);
                Err(e)
            }
        }
    }

    fn write_trailer(&self, sink: &mut Storage) -> Result<()> {
        if self.records.len() > MAX_U16 {
            return Err(Error::Zip64Unsupported(format!(
                "{} entries",
                self.records.len()
            )));
        }

        let central_size: usize = self.records.iter().map(EntryRecord::central_size).sum();
        let mut trailer = Vec::with_capacity(central_size + EocdRecord::FIXED_SIZE + self.comment.len());
        for record in &self.records {
            trailer.extend_from_slice(&CentralDirectoryHeader::SIGNATURE.to_le_bytes());
            trailer.extend_from_slice(record.central_header().as_bytes());
            trailer.extend_from_slice(&record.name);
            trailer.extend_from_slice(&record.extra);
            trailer.extend_from_slice(&record.comment);
        }

        let trailer_len = (central_size + EocdRecord::FIXED_SIZE + self.comment.len()) as u64;
        let start = self.trailer_start(trailer_len);
        if start + trailer_len > MAX_U32 {
            return Err(Error::Zip64Unsupported(format!(
                "central directory would end at offset {}",
                start + trailer_len
            )));
        }

        let eocd = EocdRecord::new(
            self.records.len() as u16,
            central_size as u32,
            start as u32,
            self.comment.len() as u16,
        );
        trailer.extend_from_slice(&EocdRecord::SIGNATURE.to_le_bytes());
        trailer.extend_from_slice(eocd.as_bytes());
        trailer.extend_from_slice(&self.comment);

        if let Some(region) = &self.old_trailer {
            if self.cursor == region.end && start > region.start {
                sink.zero_fill(region.start, start - region.start)?;
            }
        }

        sink.write_all_at(start, &trailer, "writing central directory")?;
        sink.set_len(start + trailer_len)?;
        sink.sync()?;

        debug!(
            "wrote central directory with {} entries at {}, archive is {} bytes",
            self.records.len(),
            start,
            start + trailer_len
        );

        Ok(())
    }
}

impl Drop for ZipWriter {
    fn drop(&mut self) {
        if self.sink.is_some() {
            warn!(
                "archive writer dropped without close; {} entries have no central directory",
                self.records.len()
            );
        }
    }
}

impl std::fmt::Debug for ZipWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZipWriter")
            .field("entries", &self.records.len())
            .field("cursor", &self.cursor)
            .field("closed", &self.is_closed())
            .finish()
    }
}
