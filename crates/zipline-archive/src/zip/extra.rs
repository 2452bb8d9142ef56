//! Extra field handling.
//!
//! Extra fields are a sequence of `(id: u16, size: u16, data[size])` blocks.
//! The only field the engine produces is the alignment field, which pads the
//! local header so the entry data starts on a chosen boundary:
//!
//! ```text
//! id = 0xD935 | size (u16) | alignment (u16) | zero padding
//! ```
//!
//! Storing the alignment next to the padding lets a rebuild re-apply it once
//! the entry has moved.

use zipline_common::BinaryReader;

/// Header id of the alignment extra field.
pub const ALIGNMENT_FIELD_ID: u16 = 0xD935;

/// Bytes of the alignment field that precede the zero padding.
pub const ALIGNMENT_FIELD_MIN: usize = 6;

/// One block of an extra field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtraField<'a> {
    /// Header id
    pub id: u16,
    /// Field payload
    pub data: &'a [u8],
}

/// Split an extra field into its blocks.
///
/// Returns `None` when the bytes are not a well-formed block sequence, as in
/// archives whose tools padded the extra field with bare zero bytes.
pub fn parse(extra: &[u8]) -> Option<Vec<ExtraField<'_>>> {
    let mut reader = BinaryReader::new(extra);
    let mut fields = Vec::new();

    while !reader.is_empty() {
        let id = reader.read_u16().ok()?;
        let size = reader.read_u16().ok()?;
        let data = reader.read_bytes(size as usize).ok()?;
        fields.push(ExtraField { id, data });
    }

    Some(fields)
}

/// Number of zero bytes needed after the alignment field header so that data
/// written after a local header starting at `header_offset` lands on a
/// multiple of `alignment`.
///
/// `variable_len` is the name length plus any other extra-field bytes that
/// precede the alignment field.
pub fn alignment_padding(header_offset: u64, variable_len: usize, alignment: u16) -> usize {
    let alignment = alignment as u64;
    let unpadded = header_offset
        + super::LocalFileHeader::FIXED_SIZE as u64
        + variable_len as u64
        + ALIGNMENT_FIELD_MIN as u64;

    ((alignment - unpadded % alignment) % alignment) as usize
}

/// Encode an alignment field carrying `padding` zero bytes.
pub fn alignment_field(alignment: u16, padding: usize) -> Vec<u8> {
    let size = (2 + padding) as u16;
    let mut field = Vec::with_capacity(ALIGNMENT_FIELD_MIN + padding);

    field.extend_from_slice(&ALIGNMENT_FIELD_ID.to_le_bytes());
    field.extend_from_slice(&size.to_le_bytes());
    field.extend_from_slice(&alignment.to_le_bytes());
    field.resize(ALIGNMENT_FIELD_MIN + padding, 0);
    field
}

/// The alignment recorded in an extra field, if any.
pub fn find_alignment(extra: &[u8]) -> Option<u16> {
    parse(extra)?
        .into_iter()
        .find(|f| f.id == ALIGNMENT_FIELD_ID && f.data.len() >= 2)
        .map(|f| u16::from_le_bytes([f.data[0], f.data[1]]))
        .filter(|a| a.is_power_of_two())
}

/// Drop alignment padding from an extra field, keeping every other block.
///
/// Malformed extra data is treated as padding and dropped entirely.
pub fn strip_alignment(extra: &[u8]) -> Vec<u8> {
    let Some(fields) = parse(extra) else {
        return Vec::new();
    };

    let mut out = Vec::with_capacity(extra.len());
    for field in fields.iter().filter(|f| f.id != ALIGNMENT_FIELD_ID) {
        out.extend_from_slice(&field.id.to_le_bytes());
        out.extend_from_slice(&(field.data.len() as u16).to_le_bytes());
        out.extend_from_slice(field.data);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_padding_lands_on_boundary() {
        for offset in [0u64, 1, 17, 4095, 4096, 10_000] {
            for name_len in [1usize, 5, 63] {
                for alignment in [2u16, 4, 16, 4096] {
                    let pad = alignment_padding(offset, name_len, alignment);
                    let data_start =
                        offset + 30 + name_len as u64 + (ALIGNMENT_FIELD_MIN + pad) as u64;
                    assert_eq!(data_start % alignment as u64, 0);
                    assert!(pad < alignment as usize);
                }
            }
        }
    }

    #[test]
    fn test_alignment_field_roundtrip() {
        let field = alignment_field(4096, 10);
        assert_eq!(field.len(), 16);
        assert_eq!(find_alignment(&field), Some(4096));

        let fields = parse(&field).unwrap();
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].id, ALIGNMENT_FIELD_ID);
        assert_eq!(fields[0].data.len(), 12);
    }

    #[test]
    fn test_strip_keeps_other_fields() {
        let mut extra = vec![0x55, 0x54, 0x01, 0x00, 0x07];
        extra.extend(alignment_field(4, 3));

        assert_eq!(strip_alignment(&extra), vec![0x55, 0x54, 0x01, 0x00, 0x07]);
    }

    #[test]
    fn test_malformed_extra() {
        assert!(parse(&[0, 0, 0]).is_none());
        assert!(strip_alignment(&[0, 0, 0]).is_empty());
        assert_eq!(find_alignment(&[0, 0, 0]), None);
    }
}
