//! Entry deletion.
//!
//! Two strategies, both on [`ZipWriter`]:
//!
//! - fill-void zeroes the entry's local header and data in place. The
//!   archive keeps its length and every other entry stays where it is.
//! - rebuild copies the surviving entries into a staged archive and swaps it
//!   in once complete, reclaiming the space.

use log::debug;
use rustc_hash::FxHashSet;

use crate::archive::{read_local, read_stored};
use crate::storage::Storage;
use crate::zip::{extra, DATA_DESCRIPTOR_SIGNATURE, DATA_DESCRIPTOR_SIZE, FLAG_DATA_DESCRIPTOR};
use crate::{Error, Result, ZipWriter};

impl ZipWriter {
    /// Delete the first entry named `name` by zeroing its local header and
    /// data.
    ///
    /// The space is not reclaimed. The entry disappears from the central
    /// directory written on close.
    pub fn delete_entry_fill_void(&mut self, name: &str) -> Result<()> {
        let sink = self.sink.as_mut().ok_or(Error::ClosedHandle)?;
        let position = self
            .records
            .iter()
            .position(|r| r.name == name.as_bytes())
            .ok_or_else(|| Error::EntryNotFound(name.to_string()))?;

        let record = &self.records[position];
        let len = sink.len()?;
        let local = read_local(sink, len, record)?;

        let start = record.local_header_offset();
        let mut end = local.data_offset + record.compressed_size();
        if end > len {
            return Err(Error::Truncated {
                what: "entry data",
                offset: local.data_offset,
            });
        }
        if record.flags & FLAG_DATA_DESCRIPTOR != 0 {
            end += descriptor_len(sink, end, len)?;
        }
        sink.zero_fill(start, end - start)?;

        debug!("zeroed {} ({} bytes at {})", name, end - start, start);

        self.records.remove(position);
        for (index, record) in self.records.iter_mut().enumerate().skip(position) {
            record.index = index;
        }
        Ok(())
    }

    /// Delete every entry whose name is in `names` by rebuilding the archive
    /// without them.
    ///
    /// Surviving entries are copied raw, in order, re-applying any recorded
    /// alignment. The original is replaced only once the new archive is
    /// complete: file archives through a temp file renamed over the original,
    /// memory archives by swapping buffers. On error the original is left as
    /// it was.
    pub fn delete_entries_rebuild<S: AsRef<str>>(&mut self, names: &[S]) -> Result<()> {
        self.ensure_open()?;

        let doomed: FxHashSet<&[u8]> = names.iter().map(|n| n.as_ref().as_bytes()).collect();
        for name in names {
            let name = name.as_ref();
            if !self.records.iter().any(|r| r.name == name.as_bytes()) {
                return Err(Error::EntryNotFound(name.to_string()));
            }
        }

        let mut source = self.sink.take().ok_or(Error::ClosedHandle)?;
        match self.rebuild_into_staging(&mut source, &doomed) {
            Ok(rebuilt) => {
                debug!(
                    "rebuilt archive without {} names, {} entries remain",
                    doomed.len(),
                    rebuilt.records.len()
                );
                *self = rebuilt;
                Ok(())
            }
            Err(e) => {
                self.sink = Some(source);
                Err(e)
            }
        }
    }

    /// Copy the entries not in `doomed` from `source` into a staged archive,
    /// commit it and reopen it for appending.
    fn rebuild_into_staging(&self, source: &mut Storage, doomed: &FxHashSet<&[u8]>) -> Result<Self> {
        let source_len = source.len()?;
        let mut staged = ZipWriter::fresh(source.staging()?);
        staged.comment = self.comment.clone();

        for record in self.records.iter().filter(|r| !doomed.contains(r.name.as_slice())) {
            let (local, stored) = read_stored(source, source_len, record)?;

            let alignment = extra::find_alignment(&local.extra).unwrap_or(0);
            let local_extra = extra::strip_alignment(&local.extra);

            // Only the stored bytes are copied; sizes and CRC move into the
            // headers.
            let mut copy = record.clone();
            copy.flags &= !FLAG_DATA_DESCRIPTOR;

            staged.push_entry(copy, local_extra, alignment, &stored)?;
        }

        let committed = staged.finalize()?.commit()?;
        ZipWriter::adopt(committed)
    }
}

/// Length of the data descriptor at `offset`, with or without its signature.
fn descriptor_len(sink: &mut Storage, offset: u64, len: u64) -> Result<u64> {
    let mut size = DATA_DESCRIPTOR_SIZE;
    if offset + 4 <= len {
        let mut sig = [0u8; 4];
        sink.read_exact_at(offset, &mut sig, "reading data descriptor")?;
        if u32::from_le_bytes(sig) == DATA_DESCRIPTOR_SIGNATURE {
            size += 4;
        }
    }
    if offset + size > len {
        return Err(Error::Truncated {
            what: "data descriptor",
            offset,
        });
    }
    Ok(size)
}
