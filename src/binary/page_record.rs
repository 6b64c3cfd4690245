//! Per-page record codec: a flatbuffers-style table holding a flat vector
//! of `TextLocation { offset, llx, lly, urx, ury }`.
//!
//! This is the payload written into each partition of a persistent
//! `DocPositions`, and the nested table used for every page inside a
//! composite [`super::snapshot`]. Layout is fixed-width per record — no
//! varint, no front-compression — so a single `offset * 20` multiply seeks
//! straight to any record, the same predictable-layout-over-minimum-size
//! tradeoff the rest of this crate's binary sections make.

use crate::error::{Error, Result};
use crate::offset_box::OffsetBox;
use crate::page_positions::PagePositions;

/// "PPOS" in ASCII.
pub const MAGIC: [u8; 4] = [0x50, 0x50, 0x4F, 0x53];
pub const VERSION: u8 = 1;

/// magic(4) + version(1) + count(4)
const HEADER_LEN: usize = 9;
/// offset(4) + llx(4) + lly(4) + urx(4) + ury(4)
const RECORD_LEN: usize = 20;

/// Maximum record count permitted in a single page table. Guards the
/// decoder against allocating absurd amounts of memory for a corrupted or
/// adversarial record.
pub const MAX_RECORDS: usize = 16 * 1024 * 1024;

/// Encodes a [`PagePositions`] into its on-disk/in-memory page-record form.
pub fn encode(positions: &PagePositions) -> Vec<u8> {
    let mut buf = Vec::with_capacity(HEADER_LEN + positions.len() * RECORD_LEN);
    buf.extend_from_slice(&MAGIC);
    buf.push(VERSION);
    buf.extend_from_slice(&(positions.len() as u32).to_le_bytes());
    for b in positions.iter() {
        buf.extend_from_slice(&b.offset.to_le_bytes());
        buf.extend_from_slice(&b.llx.to_le_bytes());
        buf.extend_from_slice(&b.lly.to_le_bytes());
        buf.extend_from_slice(&b.urx.to_le_bytes());
        buf.extend_from_slice(&b.ury.to_le_bytes());
    }
    buf
}

/// Decodes a page record. Rejects anything that isn't exactly
/// `HEADER_LEN + count * RECORD_LEN` bytes, to catch truncation that a CRC
/// mismatch (computed by the caller against the partition index) would
/// also catch, but cheaply and before the CRC pass.
pub fn decode(bytes: &[u8]) -> Result<PagePositions> {
    if bytes.len() < HEADER_LEN {
        return Err(Error::Corrupt("page record shorter than header".into()));
    }
    if bytes[0..4] != MAGIC {
        return Err(Error::Corrupt("page record magic mismatch".into()));
    }
    let version = bytes[4];
    if version != VERSION {
        return Err(Error::Corrupt(format!(
            "unsupported page record version {version}"
        )));
    }
    let count = u32::from_le_bytes(bytes[5..9].try_into().unwrap()) as usize;
    if count > MAX_RECORDS {
        return Err(Error::Corrupt(format!(
            "page record count {count} exceeds sanity bound"
        )));
    }
    let expected_len = HEADER_LEN + count * RECORD_LEN;
    if bytes.len() != expected_len {
        return Err(Error::Corrupt(format!(
            "page record length {} does not match header-declared {expected_len}",
            bytes.len()
        )));
    }

    let mut boxes = Vec::with_capacity(count);
    let mut pos = HEADER_LEN;
    for _ in 0..count {
        let offset = u32::from_le_bytes(bytes[pos..pos + 4].try_into().unwrap());
        let llx = f32::from_le_bytes(bytes[pos + 4..pos + 8].try_into().unwrap());
        let lly = f32::from_le_bytes(bytes[pos + 8..pos + 12].try_into().unwrap());
        let urx = f32::from_le_bytes(bytes[pos + 12..pos + 16].try_into().unwrap());
        let ury = f32::from_le_bytes(bytes[pos + 16..pos + 20].try_into().unwrap());
        boxes.push(OffsetBox::new(offset, llx, lly, urx, ury));
        pos += RECORD_LEN;
    }
    Ok(PagePositions::from_boxes(boxes))
}
