//! [`DocPositions`]: per-document page texts and position maps, held
//! either entirely in memory or partitioned across a handful of on-disk
//! artifacts.
//!
//! Rather than a nullable sub-struct plus an `is_mem()` predicate checked
//! at every call site, storage mode is a proper sum type: one [`Backend`]
//! enum with a `Memory` and a `Persistent` variant, both driven through
//! the same `add_page`/`read_page`/`close` surface, so nothing downstream
//! ever has to branch on storage mode.

use std::collections::{BTreeMap, HashMap};
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crc32fast::Hasher as Crc32;
use serde::{Deserialize, Serialize};

use crate::binary::page_record;
use crate::error::{Error, Result};
use crate::page_positions::PagePositions;

/// `{offset, size, crc32, pageNum}` — locates one page record inside a
/// persistent DocPositions' `.dat` file.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PagePartition {
    #[serde(rename = "Offset")]
    pub offset: u32,
    #[serde(rename = "Size")]
    pub size: u32,
    #[serde(rename = "Check")]
    pub crc32: u32,
    #[serde(rename = "PageNum")]
    pub page_num: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    OpenWriting,
    OpenReading,
    Closed,
}

struct MemoryEntry {
    page_num: u32,
    text: String,
    positions: PagePositions,
}

struct MemoryBackend {
    pages: Vec<MemoryEntry>,
    by_page_num: HashMap<u32, usize>,
}

struct PersistentBackend {
    root: PathBuf,
    hash: String,
    dat_writer: Option<File>,
    dat_reader: Option<File>,
    partitions: Vec<PagePartition>,
    by_page_num: HashMap<u32, usize>,
}

enum Backend {
    Memory(MemoryBackend),
    Persistent(PersistentBackend),
}

/// One document's page texts and position maps.
///
/// `Open-Writing` right after creation (only `add_page` is legal),
/// `Open-Reading` once reopened from disk without a writer, `Closed` after
/// `close()` (further writes are rejected; reads remain legal in every
/// state).
pub struct DocPositions {
    pub in_path: PathBuf,
    pub doc_idx: u64,
    state: State,
    backend: Backend,
}

impl DocPositions {
    /// A brand-new, empty, in-memory DocPositions, open for writing.
    pub fn new_memory(in_path: impl Into<PathBuf>, doc_idx: u64) -> Self {
        Self {
            in_path: in_path.into(),
            doc_idx,
            state: State::OpenWriting,
            backend: Backend::Memory(MemoryBackend {
                pages: Vec::new(),
                by_page_num: HashMap::new(),
            }),
        }
    }

    /// Creates the on-disk artifacts for a new persistent DocPositions
    /// rooted at `<positions_dir>/<hash>`, open for writing.
    pub fn create_persistent(
        positions_dir: &Path,
        in_path: impl Into<PathBuf>,
        doc_idx: u64,
        hash: &str,
    ) -> Result<Self> {
        fs::create_dir_all(positions_dir)?;
        let dat_path = positions_dir.join(format!("{hash}.dat"));
        let dat_writer = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&dat_path)?;

        Ok(Self {
            in_path: in_path.into(),
            doc_idx,
            state: State::OpenWriting,
            backend: Backend::Persistent(PersistentBackend {
                root: positions_dir.to_path_buf(),
                hash: hash.to_string(),
                dat_writer: Some(dat_writer),
                dat_reader: None,
                partitions: Vec::new(),
                by_page_num: HashMap::new(),
            }),
        })
    }

    /// Reopens an existing persistent DocPositions for reading, loading its
    /// partition index. No `.dat` handle is opened until the first read.
    pub fn open_persistent(
        positions_dir: &Path,
        in_path: impl Into<PathBuf>,
        doc_idx: u64,
        hash: &str,
    ) -> Result<Self> {
        let idx_path = positions_dir.join(format!("{hash}.idx.json"));
        let idx_bytes = fs::read(&idx_path)?;
        let partitions: Vec<PagePartition> = serde_json::from_slice(&idx_bytes)?;

        let mut by_page_num = HashMap::with_capacity(partitions.len());
        for (i, p) in partitions.iter().enumerate() {
            by_page_num.insert(p.page_num, i);
        }

        Ok(Self {
            in_path: in_path.into(),
            doc_idx,
            state: State::OpenReading,
            backend: Backend::Persistent(PersistentBackend {
                root: positions_dir.to_path_buf(),
                hash: hash.to_string(),
                dat_writer: None,
                dat_reader: None,
                partitions,
                by_page_num,
            }),
        })
    }

    pub fn page_count(&self) -> usize {
        match &self.backend {
            Backend::Memory(m) => m.pages.len(),
            Backend::Persistent(p) => p.partitions.len(),
        }
    }

    pub fn page_idx_for_page_num(&self, page_num: u32) -> Option<usize> {
        match &self.backend {
            Backend::Memory(m) => m.by_page_num.get(&page_num).copied(),
            Backend::Persistent(p) => p.by_page_num.get(&page_num).copied(),
        }
    }

    /// Appends one page's position map and text. Legal only in
    /// `Open-Writing`. Fails with [`Error::EmptyPage`] when `page_num == 0`
    /// (pages are 1-indexed). Returns the 0-based `pageIdx`.
    pub fn add_page(&mut self, page_num: u32, positions: &PagePositions, text: &str) -> Result<usize> {
        if page_num == 0 {
            return Err(Error::EmptyPage);
        }
        if self.state != State::OpenWriting {
            return Err(Error::IllegalState(
                "add_page is only legal while a DocPositions is open for writing".into(),
            ));
        }

        match &mut self.backend {
            Backend::Memory(m) => {
                let page_idx = m.pages.len();
                m.by_page_num.insert(page_num, page_idx);
                m.pages.push(MemoryEntry {
                    page_num,
                    text: text.to_string(),
                    positions: positions.clone(),
                });
                Ok(page_idx)
            }
            Backend::Persistent(p) => {
                let record = page_record::encode(positions);
                let mut crc = Crc32::new();
                crc.update(&record);
                let crc32 = crc.finalize();

                let writer = p
                    .dat_writer
                    .as_mut()
                    .ok_or_else(|| Error::IllegalState("persistent DocPositions has no open writer".into()))?;
                let offset = writer.stream_position()? as u32;
                writer.write_all(&record)?;

                let page_idx = p.partitions.len();
                p.partitions.push(PagePartition {
                    offset,
                    size: record.len() as u32,
                    crc32,
                    page_num,
                });
                p.by_page_num.insert(page_num, page_idx);

                let pages_dir = p.root.join(format!("{}.pages", p.hash));
                fs::create_dir_all(&pages_dir)?;
                fs::write(pages_dir.join(format!("{page_idx:03}.txt")), text)?;

                Ok(page_idx)
            }
        }
    }

    /// Reads back one page by its 0-based `pageIdx`. Legal in both open
    /// states and after `close()` — closing only forbids further writes.
    /// For the persistent backend this verifies the CRC-32 over the
    /// stored bytes and fails with [`Error::Corrupt`] on mismatch.
    pub fn read_page(&mut self, page_idx: usize) -> Result<(u32, PagePositions)> {
        match &mut self.backend {
            Backend::Memory(m) => {
                let entry = m
                    .pages
                    .get(page_idx)
                    .ok_or_else(|| Error::OutOfRange(format!("page index {page_idx} out of range")))?;
                Ok((entry.page_num, entry.positions.clone()))
            }
            Backend::Persistent(p) => {
                let partition = *p
                    .partitions
                    .get(page_idx)
                    .ok_or_else(|| Error::OutOfRange(format!("page index {page_idx} out of range")))?;

                if p.dat_reader.is_none() {
                    let path = p.root.join(format!("{}.dat", p.hash));
                    p.dat_reader = Some(File::open(path)?);
                }
                let reader = p.dat_reader.as_mut().unwrap();
                reader.seek(SeekFrom::Start(partition.offset as u64))?;
                let mut bytes = vec![0u8; partition.size as usize];
                reader.read_exact(&mut bytes)?;

                let mut crc = Crc32::new();
                crc.update(&bytes);
                if crc.finalize() != partition.crc32 {
                    return Err(Error::Corrupt(format!(
                        "CRC mismatch reading page {page_idx} of {}",
                        p.hash
                    )));
                }

                let positions = page_record::decode(&bytes)?;
                Ok((partition.page_num, positions))
            }
        }
    }

    /// The extracted text for one page, by 0-based `pageIdx`. Legal after
    /// `close()` as well, for the same reason as [`Self::read_page`].
    pub fn page_text(&mut self, page_idx: usize) -> Result<String> {
        match &self.backend {
            Backend::Memory(m) => m
                .pages
                .get(page_idx)
                .map(|e| e.text.clone())
                .ok_or_else(|| Error::OutOfRange(format!("page index {page_idx} out of range"))),
            Backend::Persistent(p) => {
                if page_idx >= p.partitions.len() {
                    return Err(Error::OutOfRange(format!("page index {page_idx} out of range")));
                }
                let path = p.root.join(format!("{}.pages", p.hash)).join(format!("{page_idx:03}.txt"));
                Ok(fs::read_to_string(path)?)
            }
        }
    }

    /// Flushes partitions to `.idx.json` and closes the `.dat` writer (persistent
    /// mode); no-op on in-memory DocPositions beyond the state transition. No
    /// writes are permitted after this returns.
    pub fn close(&mut self) -> Result<()> {
        if self.state == State::Closed {
            return Ok(());
        }
        if let Backend::Persistent(p) = &mut self.backend {
            if let Some(mut writer) = p.dat_writer.take() {
                writer.flush()?;
                let idx_path = p.root.join(format!("{}.idx.json", p.hash));
                let json = serde_json::to_vec_pretty(&p.partitions)?;
                fs::write(idx_path, json)?;
            }
        }
        self.state = State::Closed;
        Ok(())
    }

    /// Writes the optional `<hash>.dpl.json` diagnostic dump of the
    /// in-memory partition-to-page-number mapping (persistent mode only;
    /// memory-mode DocPositions have nowhere natural to put it and no
    /// on-disk footprint to begin with).
    pub fn dump_diagnostics(&self) -> Result<()> {
        if let Backend::Persistent(p) = &self.backend {
            let dump: BTreeMap<u32, &PagePartition> = p
                .partitions
                .iter()
                .map(|part| (part.page_num, part))
                .collect();
            let path = p.root.join(format!("{}.dpl.json", p.hash));
            fs::write(path, serde_json::to_vec_pretty(&dump)?)?;
        }
        Ok(())
    }

    pub fn is_persistent(&self) -> bool {
        matches!(self.backend, Backend::Persistent(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::offset_box::OffsetBox;

    fn sample_positions() -> PagePositions {
        let mut p = PagePositions::new();
        p.append(OffsetBox::new(0, 1.0, 1.0, 2.0, 2.0));
        p.append(OffsetBox::new(2, 3.0, 3.0, 4.0, 4.0));
        p
    }

    #[test]
    fn memory_add_then_read_round_trips() {
        let mut doc = DocPositions::new_memory("a.pdf", 0);
        let idx = doc.add_page(1, &sample_positions(), "hi there").unwrap();
        assert_eq!(idx, 0);
        let (page_num, positions) = doc.read_page(0).unwrap();
        assert_eq!(page_num, 1);
        assert_eq!(positions, sample_positions());
        assert_eq!(doc.page_text(0).unwrap(), "hi there");
    }

    #[test]
    fn empty_page_number_is_rejected() {
        let mut doc = DocPositions::new_memory("a.pdf", 0);
        let err = doc.add_page(0, &sample_positions(), "x").unwrap_err();
        assert!(matches!(err, Error::EmptyPage));
    }

    #[test]
    fn persistent_round_trip_with_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let mut doc = DocPositions::create_persistent(dir.path(), "a.pdf", 0, "abcdef0123").unwrap();
        doc.add_page(1, &sample_positions(), "page one").unwrap();
        doc.add_page(2, &sample_positions(), "page two").unwrap();
        doc.close().unwrap();

        let mut reopened =
            DocPositions::open_persistent(dir.path(), "a.pdf", 0, "abcdef0123").unwrap();
        assert_eq!(reopened.page_count(), 2);
        let (page_num, positions) = reopened.read_page(1).unwrap();
        assert_eq!(page_num, 2);
        assert_eq!(positions, sample_positions());
        assert_eq!(reopened.page_text(1).unwrap(), "page two");
    }

    #[test]
    fn corrupted_dat_file_is_detected() {
        let dir = tempfile::tempdir().unwrap();
        let mut doc = DocPositions::create_persistent(dir.path(), "a.pdf", 0, "abcdef0123").unwrap();
        doc.add_page(1, &sample_positions(), "page one").unwrap();
        doc.close().unwrap();

        let dat_path = dir.path().join("abcdef0123.dat");
        let mut bytes = fs::read(&dat_path).unwrap();
        bytes[0] ^= 0xFF;
        fs::write(&dat_path, bytes).unwrap();

        let mut reopened =
            DocPositions::open_persistent(dir.path(), "a.pdf", 0, "abcdef0123").unwrap();
        let err = reopened.read_page(0).unwrap_err();
        assert!(matches!(err, Error::Corrupt(_)));
    }

    #[test]
    fn out_of_range_page_idx_errors() {
        let mut doc = DocPositions::new_memory("a.pdf", 0);
        doc.add_page(1, &sample_positions(), "only page").unwrap();
        assert!(matches!(doc.read_page(5), Err(Error::OutOfRange(_))));
    }
}
