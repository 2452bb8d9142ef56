//! ZIP archive entry records.

use std::borrow::Cow;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::zip::{CentralDirectoryHeader, CompressionMethod, HOST_UNIX};

/// Metadata of one entry, as listed in the central directory.
///
/// Records are immutable once parsed. They describe where the entry lives
/// and how it is encoded; use [`crate::ZipArchive::open_entry`] to get a
/// handle that can read the data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryRecord {
    /// Position in the central directory.
    pub(crate) index: usize,
    /// Raw name bytes (UTF-8 in practice, not guaranteed).
    pub(crate) name: Vec<u8>,
    /// Raw per-entry comment bytes.
    pub(crate) comment: Vec<u8>,
    /// Raw central-directory extra field.
    pub(crate) extra: Vec<u8>,
    pub(crate) method: CompressionMethod,
    pub(crate) compressed_size: u32,
    pub(crate) uncompressed_size: u32,
    pub(crate) crc32: u32,
    pub(crate) local_header_offset: u32,
    pub(crate) modified: DosDateTime,
    pub(crate) version_made_by: u16,
    pub(crate) version_needed: u16,
    pub(crate) flags: u16,
    pub(crate) internal_attrs: u16,
    pub(crate) external_attrs: u32,
}

impl EntryRecord {
    /// Build a record from a parsed central directory header.
    pub(crate) fn from_central(
        index: usize,
        header: &CentralDirectoryHeader,
        name: &[u8],
        extra: &[u8],
        comment: &[u8],
    ) -> Self {
        Self {
            index,
            name: name.to_vec(),
            comment: comment.to_vec(),
            extra: extra.to_vec(),
            method: CompressionMethod::from_zip_id(header.compression_method),
            compressed_size: header.compressed_size,
            uncompressed_size: header.uncompressed_size,
            crc32: header.crc32,
            local_header_offset: header.local_header_offset,
            modified: DosDateTime {
                time: header.last_mod_time,
                date: header.last_mod_date,
            },
            version_made_by: header.version_made_by,
            version_needed: header.version_needed,
            flags: header.flags,
            internal_attrs: header.internal_attrs,
            external_attrs: header.external_attrs,
        }
    }

    /// The central directory header describing this record.
    pub(crate) fn central_header(&self) -> CentralDirectoryHeader {
        CentralDirectoryHeader {
            version_made_by: self.version_made_by,
            version_needed: self.version_needed,
            flags: self.flags,
            compression_method: self.method.zip_id(),
            last_mod_time: self.modified.time,
            last_mod_date: self.modified.date,
            crc32: self.crc32,
            compressed_size: self.compressed_size,
            uncompressed_size: self.uncompressed_size,
            file_name_length: self.name.len() as u16,
            extra_field_length: self.extra.len() as u16,
            file_comment_length: self.comment.len() as u16,
            disk_number_start: 0,
            internal_attrs: self.internal_attrs,
            external_attrs: self.external_attrs,
            local_header_offset: self.local_header_offset,
        }
    }

    /// Size of this record's central directory header, including name,
    /// extra field and comment.
    pub(crate) fn central_size(&self) -> usize {
        CentralDirectoryHeader::FIXED_SIZE + self.central_header().variable_data_size()
    }

    /// Position in the central directory (0-based).
    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Entry name, lossily decoded as UTF-8.
    ///
    /// It is dangerous to use this name directly as an output path: it may
    /// be absolute or contain `..` components.
    #[inline]
    pub fn name(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.name)
    }

    /// Entry name as stored.
    #[inline]
    pub fn name_bytes(&self) -> &[u8] {
        &self.name
    }

    /// Entry comment as stored.
    #[inline]
    pub fn comment(&self) -> &[u8] {
        &self.comment
    }

    /// Compression method.
    #[inline]
    pub fn compression(&self) -> CompressionMethod {
        self.method
    }

    /// Size of the stored (compressed) data in bytes.
    #[inline]
    pub fn compressed_size(&self) -> u64 {
        self.compressed_size as u64
    }

    /// Size of the data once decompressed.
    #[inline]
    pub fn uncompressed_size(&self) -> u64 {
        self.uncompressed_size as u64
    }

    /// CRC32 of the uncompressed data.
    #[inline]
    pub fn crc32(&self) -> u32 {
        self.crc32
    }

    /// Offset of the entry's local file header.
    #[inline]
    pub fn local_header_offset(&self) -> u64 {
        self.local_header_offset as u64
    }

    /// Unix permission and type bits, when the entry was made on a Unix host.
    pub fn unix_mode(&self) -> Option<u32> {
        if (self.version_made_by >> 8) as u8 == HOST_UNIX {
            Some(self.external_attrs >> 16)
        } else {
            None
        }
    }

    /// Raw central-directory extra field, if the entry has one.
    pub fn extra_data(&self) -> Option<&[u8]> {
        if self.extra.is_empty() {
            None
        } else {
            Some(&self.extra)
        }
    }

    /// Last modification time in DOS format.
    #[inline]
    pub fn dos_datetime(&self) -> DosDateTime {
        self.modified
    }

    /// Last modification time as a `SystemTime`.
    ///
    /// DOS timestamps carry no timezone; they are interpreted as UTC.
    /// Returns None if the DOS fields are invalid.
    pub fn last_modified(&self) -> Option<SystemTime> {
        self.modified.to_system_time()
    }

    /// Check if this entry represents a directory.
    #[inline]
    pub fn is_dir(&self) -> bool {
        self.name.last() == Some(&b'/') && self.uncompressed_size == 0
    }
}

/// A DOS date/time pair as stored in ZIP headers.
///
/// - Time: bits 0-4 = seconds/2, bits 5-10 = minutes, bits 11-15 = hours
/// - Date: bits 0-4 = day, bits 5-8 = month, bits 9-15 = year-1980
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DosDateTime {
    pub time: u16,
    pub date: u16,
}

impl DosDateTime {
    /// 1980-01-01 00:00:00, the earliest representable instant.
    pub const EPOCH: Self = Self {
        time: 0,
        date: (1 << 5) | 1,
    };

    /// The current time.
    pub fn now() -> Self {
        Self::from_system_time(SystemTime::now())
    }

    /// Convert a `SystemTime` (as UTC), clamping to the DOS range
    /// 1980..=2107. Odd seconds round down.
    pub fn from_system_time(time: SystemTime) -> Self {
        let secs = time
            .duration_since(UNIX_EPOCH)
            .unwrap_or(Duration::ZERO)
            .as_secs() as i64;

        let days = secs.div_euclid(86_400);
        let time_of_day = secs.rem_euclid(86_400);
        let (year, month, day) = civil_from_days(days);

        if year < 1980 {
            return Self::EPOCH;
        }
        if year > 2107 {
            return Self {
                time: (23 << 11) | (59 << 5) | 29,
                date: (127 << 9) | (12 << 5) | 31,
            };
        }

        let hour = (time_of_day / 3600) as u16;
        let minute = ((time_of_day % 3600) / 60) as u16;
        let second = (time_of_day % 60) as u16;

        Self {
            time: (hour << 11) | (minute << 5) | (second / 2),
            date: (((year - 1980) as u16) << 9) | ((month as u16) << 5) | day as u16,
        }
    }

    /// Convert to a `SystemTime`, interpreting the fields as UTC.
    ///
    /// Returns None if the DOS fields are invalid.
    pub fn to_system_time(self) -> Option<SystemTime> {
        let year = 1980 + (self.date >> 9) as i64;
        let month = ((self.date >> 5) & 0x0F) as u32;
        let day = (self.date & 0x1F) as u32;
        let hour = (self.time >> 11) as i64;
        let minute = ((self.time >> 5) & 0x3F) as i64;
        let second = ((self.time & 0x1F) * 2) as i64;

        if !(1..=12).contains(&month)
            || day < 1
            || day > days_in_month(year, month)
            || hour > 23
            || minute > 59
            || second > 59
        {
            return None;
        }

        let days = days_from_civil(year, month, day);
        let secs = days * 86_400 + hour * 3600 + minute * 60 + second;

        UNIX_EPOCH.checked_add(Duration::from_secs(secs as u64))
    }
}

fn is_leap_year(year: i64) -> bool {
    (year % 4 == 0 && year % 100 != 0) || (year % 400 == 0)
}

fn days_in_month(year: i64, month: u32) -> u32 {
    const DAYS_IN_MONTH: [u32; 12] = [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];
    if month == 2 && is_leap_year(year) {
        29
    } else {
        DAYS_IN_MONTH[(month - 1) as usize]
    }
}

/// Days since 1970-01-01 for a proleptic Gregorian date.
fn days_from_civil(year: i64, month: u32, day: u32) -> i64 {
    let y = if month <= 2 { year - 1 } else { year };
    let era = y.div_euclid(400);
    let yoe = y - era * 400;
    let m = month as i64;
    let doy = (153 * (if m > 2 { m - 3 } else { m + 9 }) + 2) / 5 + day as i64 - 1;
    let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy;
    era * 146_097 + doe - 719_468
}

/// Inverse of [`days_from_civil`].
fn civil_from_days(days: i64) -> (i64, u32, u32) {
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z - era * 146_097;
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = (doy - (153 * mp + 2) / 5 + 1) as u32;
    let month = (if mp < 10 { mp + 3 } else { mp - 9 }) as u32;
    let year = yoe + era * 400 + i64::from(month <= 2);
    (year, month, day)
}
