//! The composite `CorpusSnapshot` table: everything needed to reconstruct
//! a `CorpusIndex`'s file list, hash maps, and every document's page texts
//! and position maps from a single byte buffer.
//!
//! `CorpusIndex` itself owns the live hash maps; this module only knows
//! about the flattened view it serializes to and from, so the codec has no
//! dependency on the index's internal representation.

use crate::error::{Error, Result};
use crate::page_positions::PagePositions;

use super::page_record;
use super::varint::{decode_count, decode_string, decode_varint, encode_string, encode_varint};

/// "CSNP" in ASCII.
pub const MAGIC: [u8; 4] = [0x43, 0x53, 0x4E, 0x50];
pub const VERSION: u8 = 1;

/// One page's worth of materialized data, position-aligned with its
/// `page_num` inside [`DocSnapshot`].
#[derive(Debug, Clone, PartialEq)]
pub struct PageSnapshot {
    pub page_num: u32,
    pub text: String,
    pub positions: PagePositions,
}

/// A document's path, dense id, and every indexed page.
#[derive(Debug, Clone, PartialEq)]
pub struct DocSnapshot {
    pub path: String,
    pub doc_idx: u64,
    pub pages: Vec<PageSnapshot>,
}

/// One hash-keyed entry in the corpus's file map: the content hash, dense
/// index, path, and the document snapshot it points to.
#[derive(Debug, Clone, PartialEq)]
pub struct HashEntry {
    pub hash: String,
    pub index: u64,
    pub path: String,
    pub doc: DocSnapshot,
}

/// The full `CorpusSnapshot` table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CorpusSnapshot {
    pub docs: Vec<HashEntry>,
}

impl CorpusSnapshot {
    pub fn num_files(&self) -> u32 {
        self.docs.len() as u32
    }

    pub fn num_pages(&self) -> u32 {
        self.docs.iter().map(|d| d.doc.pages.len() as u32).sum()
    }
}

pub fn encode(snapshot: &CorpusSnapshot) -> Vec<u8> {
    let mut buf = Vec::new();
    buf.extend_from_slice(&MAGIC);
    buf.push(VERSION);
    buf.extend_from_slice(&snapshot.num_files().to_le_bytes());
    buf.extend_from_slice(&snapshot.num_pages().to_le_bytes());

    encode_varint(snapshot.docs.len() as u64, &mut buf);
    for entry in &snapshot.docs {
        encode_string(&entry.hash, &mut buf);
        encode_varint(entry.index, &mut buf);
        encode_string(&entry.path, &mut buf);

        encode_string(&entry.doc.path, &mut buf);
        encode_varint(entry.doc.doc_idx, &mut buf);

        encode_varint(entry.doc.pages.len() as u64, &mut buf);
        for page in &entry.doc.pages {
            encode_varint(page.page_num as u64, &mut buf);
            encode_string(&page.text, &mut buf);
            let record = page_record::encode(&page.positions);
            encode_varint(record.len() as u64, &mut buf);
            buf.extend_from_slice(&record);
        }
    }
    buf
}

pub fn decode(bytes: &[u8]) -> Result<CorpusSnapshot> {
    if bytes.len() < 13 {
        return Err(Error::Corrupt("snapshot shorter than header".into()));
    }
    if bytes[0..4] != MAGIC {
        return Err(Error::Corrupt("snapshot magic mismatch".into()));
    }
    let version = bytes[4];
    if version != VERSION {
        return Err(Error::Corrupt(format!("unsupported snapshot version {version}")));
    }
    // num_files/num_pages (bytes 5..9, 9..13) are a redundant summary,
    // recomputed below and compared as a consistency check.
    let declared_files = u32::from_le_bytes(bytes[5..9].try_into().unwrap());
    let declared_pages = u32::from_le_bytes(bytes[9..13].try_into().unwrap());

    let mut pos = 13usize;
    let (doc_count, used) = decode_count(&bytes[pos..])?;
    pos += used;

    let mut docs = Vec::with_capacity(doc_count);
    let mut total_pages = 0u32;
    for _ in 0..doc_count {
        let (hash, used) = decode_string(&bytes[pos..])?;
        pos += used;
        let (index, used) = decode_varint(&bytes[pos..])?;
        pos += used;
        let (path, used) = decode_string(&bytes[pos..])?;
        pos += used;

        let (doc_path, used) = decode_string(&bytes[pos..])?;
        pos += used;
        let (doc_idx, used) = decode_varint(&bytes[pos..])?;
        pos += used;

        let (page_count, used) = decode_count(&bytes[pos..])?;
        pos += used;

        let mut pages = Vec::with_capacity(page_count);
        for _ in 0..page_count {
            let (page_num, used) = decode_varint(&bytes[pos..])?;
            pos += used;
            let (text, used) = decode_string(&bytes[pos..])?;
            pos += used;
            let (record_len, used) = decode_varint(&bytes[pos..])?;
            pos += used;
            let record_len = record_len as usize;
            let end = pos
                .checked_add(record_len)
                .filter(|&e| e <= bytes.len())
                .ok_or_else(|| Error::Corrupt("truncated page record in snapshot".into()))?;
            let positions = page_record::decode(&bytes[pos..end])?;
            pos = end;

            pages.push(PageSnapshot {
                page_num: page_num as u32,
                text,
                positions,
            });
        }
        total_pages += pages.len() as u32;

        docs.push(HashEntry {
            hash,
            index,
            path,
            doc: DocSnapshot {
                path: doc_path,
                doc_idx,
                pages,
            },
        });
    }

    if docs.len() as u32 != declared_files {
        return Err(Error::Corrupt(format!(
            "snapshot declares {declared_files} files but contains {}",
            docs.len()
        )));
    }
    if total_pages != declared_pages {
        return Err(Error::Corrupt(format!(
            "snapshot declares {declared_pages} pages but contains {total_pages}"
        )));
    }

    Ok(CorpusSnapshot { docs })
}
