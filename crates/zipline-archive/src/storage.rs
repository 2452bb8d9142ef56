//! Byte sources and sinks backing archives.
//!
//! Archives live either in a file or in a memory buffer. A third variant
//! holds a staged replacement for a file-backed archive: a temp file in the
//! same directory that is renamed over the target once complete.

use std::fs::{File, OpenOptions};
use std::io::{Cursor, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::error::IoContext;
use crate::Result;

/// Storage holding archive bytes.
#[derive(Debug)]
pub(crate) enum Storage {
    /// An archive file on disk.
    File { file: File, path: PathBuf },
    /// An in-memory archive.
    Memory(Cursor<Vec<u8>>),
    /// A temp file that will replace `target` when committed.
    Staged { file: NamedTempFile, target: PathBuf },
}

impl Storage {
    /// Open an existing file read-only.
    pub fn open_read(path: &Path) -> Result<Self> {
        let file = File::open(path).at("opening archive", 0)?;
        Ok(Self::File {
            file,
            path: path.to_path_buf(),
        })
    }

    /// Open a file for reading and writing, optionally truncating it.
    pub fn open_write(path: &Path, truncate: bool) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(truncate)
            .open(path)
            .at("opening archive for writing", 0)?;
        Ok(Self::File {
            file,
            path: path.to_path_buf(),
        })
    }

    /// Wrap an in-memory buffer.
    pub fn memory(bytes: Vec<u8>) -> Self {
        Self::Memory(Cursor::new(bytes))
    }

    /// A staging area for a full replacement of this storage.
    ///
    /// File-backed storage stages into a temp file beside the original so the
    /// final rename stays on one filesystem; memory storage stages in memory.
    pub fn staging(&self) -> Result<Self> {
        match self {
            Self::File { path, .. } | Self::Staged { target: path, .. } => {
                let dir = match path.parent() {
                    Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
                    _ => PathBuf::from("."),
                };
                let file = NamedTempFile::new_in(&dir).at("creating staging file", 0)?;
                // Temp files are created private; the replacement takes the
                // target's permissions.
                let permissions = std::fs::metadata(path)
                    .at("reading archive permissions", 0)?
                    .permissions();
                file.as_file()
                    .set_permissions(permissions)
                    .at("setting staging file permissions", 0)?;
                Ok(Self::Staged {
                    file,
                    target: path.clone(),
                })
            }
            Self::Memory(_) => Ok(Self::memory(Vec::new())),
        }
    }

    /// Make staged bytes permanent.
    ///
    /// A staged temp file is flushed and renamed over its target, yielding
    /// file storage for the target; other variants are returned unchanged.
    pub fn commit(self) -> Result<Self> {
        match self {
            Self::Staged { file, target } => {
                file.as_file().sync_all().at("syncing staging file", 0)?;
                let file = file
                    .persist(&target)
                    .map_err(|e| e.error)
                    .at("replacing archive", 0)?;
                Ok(Self::File { file, path: target })
            }
            other => Ok(other),
        }
    }

    /// Current length in bytes.
    pub fn len(&mut self) -> Result<u64> {
        match self {
            Self::Memory(cursor) => Ok(cursor.get_ref().len() as u64),
            other => other.seek(SeekFrom::End(0)).at("measuring archive", 0),
        }
    }

    /// Fill `buf` from `offset`.
    pub fn read_exact_at(&mut self, offset: u64, buf: &mut [u8], op: &'static str) -> Result<()> {
        self.seek(SeekFrom::Start(offset)).at(op, offset)?;
        self.read_exact(buf).at(op, offset)
    }

    /// Read `len` bytes from `offset` into a new buffer.
    pub fn read_vec_at(&mut self, offset: u64, len: usize, op: &'static str) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; len];
        self.read_exact_at(offset, &mut buf, op)?;
        Ok(buf)
    }

    /// Write `data` at `offset`.
    pub fn write_all_at(&mut self, offset: u64, data: &[u8], op: &'static str) -> Result<()> {
        self.seek(SeekFrom::Start(offset)).at(op, offset)?;
        self.write_all(data).at(op, offset)
    }

    /// Overwrite `len` bytes starting at `offset` with zeros.
    pub fn zero_fill(&mut self, offset: u64, len: u64) -> Result<()> {
        const CHUNK: usize = 64 * 1024;
        let zeros = [0u8; CHUNK];

        self.seek(SeekFrom::Start(offset)).at("zero filling", offset)?;
        let mut remaining = len;
        while remaining > 0 {
            let n = remaining.min(CHUNK as u64) as usize;
            self.write_all(&zeros[..n]).at("zero filling", offset + (len - remaining))?;
            remaining -= n as u64;
        }
        Ok(())
    }

    /// Truncate or extend to exactly `len` bytes.
    pub fn set_len(&mut self, len: u64) -> Result<()> {
        match self {
            Self::File { file, .. } => file.set_len(len).at("truncating archive", len),
            Self::Staged { file, .. } => file.as_file().set_len(len).at("truncating archive", len),
            Self::Memory(cursor) => {
                cursor.get_mut().resize(len as usize, 0);
                Ok(())
            }
        }
    }

    /// Flush buffered writes.
    pub fn sync(&mut self) -> Result<()> {
        self.flush().at("flushing archive", 0)
    }

    /// Take the bytes of memory storage; file storage is read back in full.
    pub fn into_bytes(self) -> Result<Vec<u8>> {
        match self {
            Self::Memory(cursor) => Ok(cursor.into_inner()),
            mut other => {
                let len = other.len()?;
                other.read_vec_at(0, len as usize, "reading archive")
            }
        }
    }
}

impl Read for Storage {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match self {
            Self::File { file, .. } => file.read(buf),
            Self::Memory(cursor) => cursor.read(buf),
            Self::Staged { file, .. } => file.read(buf),
        }
    }
}

impl Write for Storage {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match self {
            Self::File { file, .. } => file.write(buf),
            Self::Memory(cursor) => cursor.write(buf),
            Self::Staged { file, .. } => file.write(buf),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match self {
            Self::File { file, .. } => file.flush(),
            Self::Memory(cursor) => cursor.flush(),
            Self::Staged { file, .. } => file.flush(),
        }
    }
}

impl Seek for Storage {
    fn seek(&mut self, pos: SeekFrom) -> std::io::Result<u64> {
        match self {
            Self::File { file, .. } => file.seek(pos),
            Self::Memory(cursor) => cursor.seek(pos),
            Self::Staged { file, .. } => file.seek(pos),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_read_write() {
        let mut storage = Storage::memory(Vec::new());
        storage.write_all_at(0, b"hello world", "test").unwrap();
        storage.zero_fill(5, 1).unwrap();

        assert_eq!(storage.len().unwrap(), 11);
        assert_eq!(storage.read_vec_at(6, 5, "test").unwrap(), b"world");

        storage.set_len(5).unwrap();
        assert_eq!(storage.into_bytes().unwrap(), b"hello");
    }

    #[test]
    fn test_short_read_has_context() {
        let mut storage = Storage::memory(vec![1, 2, 3]);
        let err = storage.read_vec_at(2, 4, "reading entry data").unwrap_err();
        assert!(matches!(
            err,
            crate::Error::IoAt {
                op: "reading entry data",
                offset: 2,
                ..
            }
        ));
    }

    #[test]
    fn test_staged_commit_replaces_target() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("archive.zip");
        std::fs::write(&path, b"old contents").unwrap();

        let original = Storage::open_write(&path, false).unwrap();
        let mut staged = original.staging().unwrap();
        staged.write_all_at(0, b"new", "test").unwrap();

        // Nothing changes until commit.
        assert_eq!(std::fs::read(&path).unwrap(), b"old contents");

        let committed = staged.commit().unwrap();
        assert!(matches!(committed, Storage::File { .. }));
        assert_eq!(std::fs::read(&path).unwrap(), b"new");
    }

    #[test]
    fn test_dropped_staging_leaves_target() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("archive.zip");
        std::fs::write(&path, b"old contents").unwrap();

        let original = Storage::open_write(&path, false).unwrap();
        let mut staged = original.staging().unwrap();
        staged.write_all_at(0, b"partial", "test").unwrap();
        drop(staged);

        assert_eq!(std::fs::read(&path).unwrap(), b"old contents");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }
}
