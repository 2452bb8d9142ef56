//! ZIP archive index and entry reader.
//!
//! Opening an archive only parses its trailer and central directory; entry
//! data is fetched on demand through [`EntryHandle::read`]:
//!
//! 1. scan backwards from the end for the EOCD record,
//! 2. parse every central directory header sequentially,
//! 3. on read, parse the entry's local header to find where its data starts.

use std::path::Path;

use log::{debug, warn};
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use zipline_common::{crc, BinaryReader};

use crate::codec;
use crate::entry::EntryRecord;
use crate::storage::Storage;
use crate::zip::{CentralDirectoryHeader, EocdRecord, LocalFileHeader};
use crate::{Error, Result};

/// ZIP64 EOCD locator signature, which sits right before a ZIP64 archive's EOCD.
const EOCD64_LOCATOR_SIGNATURE: u32 = 0x07064b50;

/// Size of the ZIP64 EOCD locator including its signature.
const EOCD64_LOCATOR_SIZE: usize = 20;

/// A handle to one entry of an open archive.
///
/// The handle borrows the archive; reading it after the archive was closed
/// fails with [`Error::UseAfterClose`].
#[derive(Debug, Clone, Copy)]
pub struct EntryHandle<'a> {
    archive: &'a ZipArchive,
    record: &'a EntryRecord,
    raw: bool,
}

impl<'a> EntryHandle<'a> {
    /// The entry's central directory record.
    #[inline]
    pub fn record(&self) -> &'a EntryRecord {
        self.record
    }

    /// Whether [`read`](Self::read) returns the stored bytes untouched.
    #[inline]
    pub fn is_raw(&self) -> bool {
        self.raw
    }

    /// Read the entry.
    ///
    /// Raw handles return the stored bytes without decompression or CRC
    /// check. Otherwise the data is decompressed and verified against the
    /// recorded CRC32; directories always read as empty.
    pub fn read(&self) -> Result<Vec<u8>> {
        self.archive.read_record(self.record, self.raw)
    }

    /// Offset of the entry's data, resolved from its local header.
    pub fn data_offset(&self) -> Result<u64> {
        self.archive.data_offset(self.record)
    }
}

impl std::ops::Deref for EntryHandle<'_> {
    type Target = EntryRecord;

    fn deref(&self) -> &EntryRecord {
        self.record
    }
}

/// An open ZIP archive.
///
/// Holds the byte source and a point-in-time index of the central
/// directory. The source sits behind a mutex, so one archive can be shared
/// between threads; reads are serialized on it.
pub struct ZipArchive {
    /// Byte source; `None` once closed
    source: Mutex<Option<Storage>>,
    /// Source length at open time
    source_len: u64,
    /// Archive name, for diagnostics
    name: String,
    /// Entries in central directory order
    records: Vec<EntryRecord>,
    /// Name to first physical index
    lookup: FxHashMap<Vec<u8>, usize>,
    /// Archive comment
    comment: Vec<u8>,
}

impl ZipArchive {
    /// Open an archive file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "unknown".to_string());

        Self::from_storage(Storage::open_read(path)?, name)
    }

    /// Open an archive held in memory.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Result<Self> {
        Self::from_storage(Storage::memory(bytes.into()), "<memory>".to_string())
    }

    fn from_storage(mut storage: Storage, name: String) -> Result<Self> {
        let layout = Layout::read(&mut storage)?;

        let mut lookup = FxHashMap::default();
        lookup.reserve(layout.records.len());
        for record in &layout.records {
            lookup.entry(record.name.clone()).or_insert(record.index);
        }

        debug!(
            "opened {}: {} entries, central directory at {}",
            name,
            layout.records.len(),
            layout.central_dir_offset
        );

        Ok(Self {
            source: Mutex::new(Some(storage)),
            source_len: layout.archive_len,
            name,
            records: layout.records,
            lookup,
            comment: layout.comment,
        })
    }

    /// Release the byte source. Closing twice is a no-op.
    pub fn close(&self) {
        if self.source.lock().take().is_some() {
            debug!("closed {}", self.name);
        }
    }

    /// Whether [`close`](Self::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.source.lock().is_none()
    }

    /// Get the archive name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of entries in the central directory.
    pub fn entry_count(&self) -> Result<usize> {
        self.ensure_open()?;
        Ok(self.records.len())
    }

    /// Distinct entry names, in no particular order.
    ///
    /// Use [`records`](Self::records) for physical order and duplicates.
    pub fn entry_names(&self) -> Result<Vec<String>> {
        self.ensure_open()?;
        Ok(self
            .lookup
            .keys()
            .map(|name| String::from_utf8_lossy(name).into_owned())
            .collect())
    }

    /// All records, in central directory order.
    pub fn records(&self) -> Result<&[EntryRecord]> {
        self.ensure_open()?;
        Ok(&self.records)
    }

    /// Iterate over decoding handles for every entry, in physical order.
    pub fn iter(&self) -> Result<impl Iterator<Item = EntryHandle<'_>> + '_> {
        self.ensure_open()?;
        Ok(self.records.iter().map(move |record| self.handle(record, false)))
    }

    /// Raw archive comment.
    pub fn comment(&self) -> Result<&[u8]> {
        self.ensure_open()?;
        Ok(&self.comment)
    }

    /// Entry at `index`, read with decompression.
    pub fn open_entry(&self, index: usize) -> Result<Option<EntryHandle<'_>>> {
        self.lookup_index(index, false)
    }

    /// First entry named `name`, read with decompression.
    pub fn open_entry_by_name(&self, name: impl AsRef<[u8]>) -> Result<Option<EntryHandle<'_>>> {
        self.lookup_name(name.as_ref(), false)
    }

    /// Entry at `index`, read raw.
    pub fn open_entry_raw(&self, index: usize) -> Result<Option<EntryHandle<'_>>> {
        self.lookup_index(index, true)
    }

    /// First entry named `name`, read raw.
    pub fn open_entry_raw_by_name(&self, name: impl AsRef<[u8]>) -> Result<Option<EntryHandle<'_>>> {
        self.lookup_name(name.as_ref(), true)
    }

    /// Read a record's data, decompressed and verified unless `raw`.
    pub fn read_record(&self, record: &EntryRecord, raw: bool) -> Result<Vec<u8>> {
        if !raw && record.is_dir() {
            self.ensure_open()?;
            return Ok(Vec::new());
        }

        let stored = {
            let mut guard = self.source.lock();
            let storage = guard.as_mut().ok_or(Error::UseAfterClose)?;
            read_stored(storage, self.source_len, record)?.1
        };

        if raw {
            return Ok(stored);
        }
        decode(record, &stored)
    }

    /// Offset of a record's data, resolved from its local header.
    pub fn data_offset(&self, record: &EntryRecord) -> Result<u64> {
        let mut guard = self.source.lock();
        let storage = guard.as_mut().ok_or(Error::UseAfterClose)?;
        Ok(read_local(storage, self.source_len, record)?.data_offset)
    }

    fn ensure_open(&self) -> Result<()> {
        if self.is_closed() {
            return Err(Error::UseAfterClose);
        }
        Ok(())
    }

    #[inline]
    fn handle<'a>(&'a self, record: &'a EntryRecord, raw: bool) -> EntryHandle<'a> {
        EntryHandle {
            archive: self,
            record,
            raw,
        }
    }

    fn lookup_index(&self, index: usize, raw: bool) -> Result<Option<EntryHandle<'_>>> {
        self.ensure_open()?;
        Ok(self.records.get(index).map(|r| self.handle(r, raw)))
    }

    fn lookup_name(&self, name: &[u8], raw: bool) -> Result<Option<EntryHandle<'_>>> {
        self.ensure_open()?;
        Ok(self
            .lookup
            .get(name)
            .map(|&index| self.handle(&self.records[index], raw)))
    }
}

impl std::fmt::Debug for ZipArchive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZipArchive")
            .field("name", &self.name)
            .field("entries", &self.records.len())
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// Trailer and central directory of an archive.
#[derive(Debug)]
pub(crate) struct Layout {
    /// Entries in central directory order
    pub records: Vec<EntryRecord>,
    /// Archive comment
    pub comment: Vec<u8>,
    /// Offset of the first central directory header
    pub central_dir_offset: u64,
    /// Length of the archive
    pub archive_len: u64,
}

impl Layout {
    /// Locate the EOCD and parse the central directory.
    pub fn read(storage: &mut Storage) -> Result<Self> {
        let archive_len = storage.len()?;
        if archive_len < EocdRecord::FIXED_SIZE as u64 {
            return Err(Error::EocdNotFound);
        }

        let tail_start = archive_len.saturating_sub(EocdRecord::MAX_SEARCH as u64);
        let tail = storage.read_vec_at(
            tail_start,
            (archive_len - tail_start) as usize,
            "reading archive trailer",
        )?;

        let (pos, eocd) = find_eocd(&tail).ok_or(Error::EocdNotFound)?;
        let eocd_offset = tail_start + pos as u64;

        if eocd.is_zip64() && is_zip64_locator_before(&tail, pos) {
            return Err(Error::Zip64Unsupported(
                "archive has a ZIP64 end of central directory".to_string(),
            ));
        }

        let comment_start = pos + EocdRecord::FIXED_SIZE;
        let comment = tail[comment_start..comment_start + eocd.comment_length as usize].to_vec();

        let central_dir_offset = eocd.central_dir_offset as u64;
        let entry_count = eocd.central_dir_count_total as usize;
        debug!(
            "EOCD at {}: {} entries, central directory {} bytes at {}",
            eocd_offset,
            entry_count,
            { eocd.central_dir_size },
            central_dir_offset
        );

        if central_dir_offset > eocd_offset {
            return Err(Error::Truncated {
                what: "central directory",
                offset: central_dir_offset,
            });
        }

        // Parse up to the EOCD rather than trusting the recorded size.
        let central_dir = storage.read_vec_at(
            central_dir_offset,
            (eocd_offset - central_dir_offset) as usize,
            "reading central directory",
        )?;
        let records = parse_central_directory(&central_dir, central_dir_offset, entry_count)?;

        Ok(Self {
            records,
            comment,
            central_dir_offset,
            archive_len,
        })
    }
}

/// Find the last EOCD in `tail` whose fixed part and comment fit in the buffer.
fn find_eocd(tail: &[u8]) -> Option<(usize, EocdRecord)> {
    let finder = memchr::memmem::FinderRev::new(&EocdRecord::MAGIC);
    let mut end = tail.len();

    while let Some(pos) = finder.rfind(&tail[..end]) {
        let mut reader = BinaryReader::new_at(tail, pos + 4);
        if let Ok(eocd) = reader.read_struct::<EocdRecord>() {
            if pos + EocdRecord::FIXED_SIZE + eocd.comment_length as usize <= tail.len() {
                return Some((pos, eocd));
            }
        }
        end = pos;
    }

    None
}

fn is_zip64_locator_before(tail: &[u8], eocd_pos: usize) -> bool {
    eocd_pos >= EOCD64_LOCATOR_SIZE
        && BinaryReader::new_at(tail, eocd_pos - EOCD64_LOCATOR_SIZE).peek_u32().ok()
            == Some(EOCD64_LOCATOR_SIGNATURE)
}

fn parse_central_directory(data: &[u8], base: u64, count: usize) -> Result<Vec<EntryRecord>> {
    let mut reader = BinaryReader::new(data);
    let mut records = Vec::with_capacity(count);

    for index in 0..count {
        let offset = base + reader.position() as u64;
        let truncated = |_| Error::Truncated {
            what: "central directory header",
            offset,
        };

        let sig = reader.read_u32().map_err(truncated)?;
        if sig != CentralDirectoryHeader::SIGNATURE {
            return Err(Error::InvalidSignature {
                expected: CentralDirectoryHeader::SIGNATURE,
                actual: sig,
                offset,
            });
        }

        let header: CentralDirectoryHeader = reader.read_struct().map_err(truncated)?;
        let name = reader
            .read_bytes(header.file_name_length as usize)
            .map_err(truncated)?;
        let extra = reader
            .read_bytes(header.extra_field_length as usize)
            .map_err(truncated)?;
        let comment = reader
            .read_bytes(header.file_comment_length as usize)
            .map_err(truncated)?;

        records.push(EntryRecord::from_central(index, &header, name, extra, comment));
    }

    Ok(records)
}

/// A parsed local file header.
#[derive(Debug)]
pub(crate) struct LocalEntry {
    pub extra: Vec<u8>,
    pub data_offset: u64,
}

/// Parse the local header of `record`.
///
/// Name and extra lengths come from the local copy; a name length that
/// disagrees with the central directory is tolerated.
pub(crate) fn read_local(storage: &mut Storage, source_len: u64, record: &EntryRecord) -> Result<LocalEntry> {
    let offset = record.local_header_offset();
    if offset + LocalFileHeader::FIXED_SIZE as u64 > source_len {
        return Err(Error::Truncated {
            what: "local file header",
            offset,
        });
    }

    let fixed = storage.read_vec_at(offset, LocalFileHeader::FIXED_SIZE, "reading local header")?;
    let mut reader = BinaryReader::new(&fixed);

    let sig = reader.read_u32()?;
    if sig != LocalFileHeader::SIGNATURE {
        return Err(Error::InvalidSignature {
            expected: LocalFileHeader::SIGNATURE,
            actual: sig,
            offset,
        });
    }
    let header: LocalFileHeader = reader.read_struct()?;

    if header.file_name_length as usize != record.name.len() {
        warn!(
            "entry {} ({}): local name length {} differs from central {}",
            record.index,
            record.name(),
            { header.file_name_length },
            record.name.len()
        );
    }

    let data_offset = offset + (LocalFileHeader::FIXED_SIZE + header.variable_data_size()) as u64;
    let extra_offset = data_offset - header.extra_field_length as u64;
    if data_offset > source_len {
        return Err(Error::Truncated {
            what: "local file header",
            offset,
        });
    }

    let extra = storage.read_vec_at(
        extra_offset,
        header.extra_field_length as usize,
        "reading local extra field",
    )?;

    Ok(LocalEntry {
        extra,
        data_offset,
    })
}

/// Read the local header and stored (possibly compressed) bytes of `record`.
pub(crate) fn read_stored(
    storage: &mut Storage,
    source_len: u64,
    record: &EntryRecord,
) -> Result<(LocalEntry, Vec<u8>)> {
    let local = read_local(storage, source_len, record)?;

    if local.data_offset + record.compressed_size() > source_len {
        return Err(Error::Truncated {
            what: "entry data",
            offset: local.data_offset,
        });
    }

    let data = storage.read_vec_at(
        local.data_offset,
        record.compressed_size as usize,
        "reading entry data",
    )?;
    Ok((local, data))
}

/// Decompress stored bytes and verify their CRC32.
pub(crate) fn decode(record: &EntryRecord, stored: &[u8]) -> Result<Vec<u8>> {
    if record.is_dir() {
        return Ok(Vec::new());
    }

    let data = codec::decompress(record.method, stored, record.uncompressed_size as usize)?;

    let actual = crc::hash_bytes(&data);
    if actual != record.crc32 {
        return Err(Error::IntegrityMismatch {
            name: record.name().into_owned(),
            expected: record.crc32,
            actual,
        });
    }

    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::zip::CompressionMethod;
    use crate::ZipWriter;

    fn sample_archive() -> Vec<u8> {
        let mut writer = ZipWriter::new_in_memory();
        writer
            .write_entry("a.txt", b"hello", CompressionMethod::Deflate, 0)
            .unwrap();
        writer
            .write_entry("b.bin", &[7u8; 300], CompressionMethod::Store, 0)
            .unwrap();
        writer.write_dir("dir").unwrap();
        writer.set_comment(b"archive comment".to_vec()).unwrap();
        writer.into_bytes().unwrap()
    }

    /// Build a single stored entry by hand with the given method id.
    fn handmade_archive(method: u16, data: &[u8], crc32: u32) -> Vec<u8> {
        use zerocopy::IntoBytes;

        let name = b"odd.bin";
        let local = LocalFileHeader {
            version_needed: 20,
            flags: 0,
            compression_method: method,
            last_mod_time: 0,
            last_mod_date: 0x21,
            crc32,
            compressed_size: data.len() as u32,
            uncompressed_size: data.len() as u32,
            file_name_length: name.len() as u16,
            extra_field_length: 0,
        };
        let central = CentralDirectoryHeader {
            version_made_by: 0x033F,
            version_needed: 20,
            flags: 0,
            compression_method: method,
            last_mod_time: 0,
            last_mod_date: 0x21,
            crc32,
            compressed_size: data.len() as u32,
            uncompressed_size: data.len() as u32,
            file_name_length: name.len() as u16,
            extra_field_length: 0,
            file_comment_length: 0,
            disk_number_start: 0,
            internal_attrs: 0,
            external_attrs: 0,
            local_header_offset: 0,
        };

        let mut out = Vec::new();
        out.extend_from_slice(&LocalFileHeader::SIGNATURE.to_le_bytes());
        out.extend_from_slice(local.as_bytes());
        out.extend_from_slice(name);
        out.extend_from_slice(data);

        let cd_offset = out.len() as u32;
        out.extend_from_slice(&CentralDirectoryHeader::SIGNATURE.to_le_bytes());
        out.extend_from_slice(central.as_bytes());
        out.extend_from_slice(name);
        let cd_size = out.len() as u32 - cd_offset;

        out.extend_from_slice(&EocdRecord::SIGNATURE.to_le_bytes());
        out.extend_from_slice(EocdRecord::new(1, cd_size, cd_offset, 0).as_bytes());
        out
    }

    #[test]
    fn test_open_and_list() {
        let archive = ZipArchive::from_bytes(sample_archive()).unwrap();

        assert_eq!(archive.entry_count().unwrap(), 3);
        assert_eq!(archive.comment().unwrap(), b"archive comment");

        let mut names = archive.entry_names().unwrap();
        names.sort();
        assert_eq!(names, vec!["a.txt", "b.bin", "dir/"]);

        let records = archive.records().unwrap();
        assert_eq!(records[0].name(), "a.txt");
        assert_eq!(records[2].index(), 2);
    }

    #[test]
    fn test_read_by_name_and_index() {
        let archive = ZipArchive::from_bytes(sample_archive()).unwrap();

        let entry = archive.open_entry_by_name("a.txt").unwrap().unwrap();
        assert_eq!(entry.read().unwrap(), b"hello");
        assert_eq!(entry.crc32(), 0x3610A686);
        assert_eq!(entry.compression(), CompressionMethod::Deflate);

        let entry = archive.open_entry(1).unwrap().unwrap();
        assert_eq!(entry.read().unwrap(), vec![7u8; 300]);

        assert!(archive.open_entry(3).unwrap().is_none());
        assert!(archive.open_entry_by_name("missing").unwrap().is_none());
    }

    #[test]
    fn test_raw_read_is_untouched() {
        let archive = ZipArchive::from_bytes(sample_archive()).unwrap();

        let raw = archive.open_entry_raw(0).unwrap().unwrap();
        assert!(raw.is_raw());
        let stored = raw.read().unwrap();
        assert_eq!(stored.len() as u64, raw.compressed_size());
        assert_eq!(
            codec::decompress(CompressionMethod::Deflate, &stored, 5).unwrap(),
            b"hello"
        );
    }

    #[test]
    fn test_directory_entry() {
        let archive = ZipArchive::from_bytes(sample_archive()).unwrap();

        let dir = archive.open_entry_by_name("dir/").unwrap().unwrap();
        assert!(dir.is_dir());
        assert_eq!(dir.uncompressed_size(), 0);
        assert!(dir.read().unwrap().is_empty());

        let raw = archive.open_entry_raw_by_name("dir/").unwrap().unwrap();
        assert!(raw.read().unwrap().is_empty());
    }

    #[test]
    fn test_unsupported_method() {
        let bytes = handmade_archive(99, b"opaque", 0);
        let archive = ZipArchive::from_bytes(bytes).unwrap();

        let entry = archive.open_entry(0).unwrap().unwrap();
        assert_eq!(entry.compression(), CompressionMethod::Unsupported(99));
        assert_eq!(entry.compression().code(), -1);
        assert!(matches!(entry.read(), Err(Error::UnsupportedCompression(99))));

        let raw = archive.open_entry_raw(0).unwrap().unwrap();
        assert_eq!(raw.read().unwrap(), b"opaque");
    }

    #[test]
    fn test_crc_mismatch() {
        let bytes = handmade_archive(0, b"payload", 0xDEADBEEF);
        let archive = ZipArchive::from_bytes(bytes).unwrap();

        let entry = archive.open_entry(0).unwrap().unwrap();
        assert!(matches!(
            entry.read(),
            Err(Error::IntegrityMismatch {
                expected: 0xDEADBEEF,
                ..
            })
        ));

        // Raw reads skip the check, and the handle stays usable.
        assert_eq!(archive.open_entry_raw(0).unwrap().unwrap().read().unwrap(), b"payload");
    }

    #[test]
    fn test_duplicate_names_resolve_to_first() {
        let mut writer = ZipWriter::new_in_memory();
        writer.write_entry("dup.txt", b"first", CompressionMethod::Store, 0).unwrap();
        writer.write_entry("dup.txt", b"second", CompressionMethod::Store, 0).unwrap();
        let archive = ZipArchive::from_bytes(writer.into_bytes().unwrap()).unwrap();

        assert_eq!(archive.entry_count().unwrap(), 2);
        assert_eq!(archive.entry_names().unwrap(), vec!["dup.txt"]);

        let entry = archive.open_entry_by_name("dup.txt").unwrap().unwrap();
        assert_eq!(entry.index(), 0);
        assert_eq!(entry.read().unwrap(), b"first");
    }

    #[test]
    fn test_use_after_close() {
        let archive = ZipArchive::from_bytes(sample_archive()).unwrap();
        let entry = archive.open_entry(0).unwrap().unwrap();

        archive.close();
        archive.close();

        assert!(archive.is_closed());
        assert!(matches!(entry.read(), Err(Error::UseAfterClose)));
        assert!(matches!(archive.entry_count(), Err(Error::UseAfterClose)));
        assert!(matches!(archive.open_entry(0), Err(Error::UseAfterClose)));
    }

    #[test]
    fn test_malformed_inputs() {
        assert!(matches!(
            ZipArchive::from_bytes(Vec::new()),
            Err(Error::EocdNotFound)
        ));
        assert!(matches!(
            ZipArchive::from_bytes(vec![0u8; 1000]),
            Err(Error::EocdNotFound)
        ));

        // Corrupt the central directory signature.
        let mut bytes = sample_archive();
        let eocd = bytes.len() - 22 - 15;
        let cd_start =
            u32::from_le_bytes([bytes[eocd + 16], bytes[eocd + 17], bytes[eocd + 18], bytes[eocd + 19]])
                as usize;
        bytes[cd_start] = 0;

        let err = ZipArchive::from_bytes(bytes).unwrap_err();
        assert!(err.is_malformed());
        assert!(matches!(err, Error::InvalidSignature { .. }));
    }

    #[test]
    fn test_truncated_central_directory() {
        // Keep the trailer but claim more entries than exist.
        let mut patched = sample_archive();
        let eocd = patched.len() - 22 - 15;
        patched[eocd + 10] = 9;

        let err = ZipArchive::from_bytes(patched).unwrap_err();
        assert!(err.is_malformed());
    }

    #[test]
    fn test_zip64_rejected() {
        use zerocopy::IntoBytes;

        let mut bytes = Vec::new();
        bytes.extend_from_slice(&EOCD64_LOCATOR_SIGNATURE.to_le_bytes());
        bytes.extend_from_slice(&[0u8; EOCD64_LOCATOR_SIZE - 4]);
        bytes.extend_from_slice(&EocdRecord::SIGNATURE.to_le_bytes());
        bytes.extend_from_slice(EocdRecord::new(0xFFFF, 0xFFFFFFFF, 0xFFFFFFFF, 0).as_bytes());

        assert!(matches!(
            ZipArchive::from_bytes(bytes),
            Err(Error::Zip64Unsupported(_))
        ));
    }

    #[test]
    fn test_data_offset() {
        let archive = ZipArchive::from_bytes(sample_archive()).unwrap();
        let entry = archive.open_entry(0).unwrap().unwrap();

        assert_eq!(entry.local_header_offset(), 0);
        assert_eq!(entry.data_offset().unwrap(), 30 + 5);
    }

    #[test]
    fn test_open_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample.zip");
        std::fs::write(&path, sample_archive()).unwrap();

        let archive = ZipArchive::open(&path).unwrap();
        assert_eq!(archive.name(), "sample.zip");
        assert_eq!(
            archive.open_entry_by_name("a.txt").unwrap().unwrap().read().unwrap(),
            b"hello"
        );
    }
}
