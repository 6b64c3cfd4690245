//! [`CorpusIndex`] (C5): the orchestrator. Owns the hash-addressed maps,
//! the file descriptor list, every document's [`DocPositions`], and the
//! backing [`InvertedTextIndex`], and drives the indexing and search
//! pipelines end to end.

mod id;

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{Cursor, Read, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use flate2::read::DeflateDecoder;
use flate2::write::DeflateEncoder;
use flate2::Compression;

use crate::binary::snapshot::{self, CorpusSnapshot, DocSnapshot, HashEntry, PageSnapshot};
use crate::config::IndexOptions;
use crate::doc_positions::DocPositions;
use crate::error::{Error, Result};
use crate::extraction::{extract_page_guarded, marks_to_positions, PdfExtractor};
use crate::hash::{hash_reader, FileDescriptor};
use crate::query::{line_at, line_number, phrase_spans, PageMatch, PdfMatchSet};
use crate::text_index::inverted::InvertedTextIndex;
use crate::text_index::TextIndex;

/// Builds a [`PdfExtractor`] for one file's raw bytes. The extractor
/// itself is out of scope for this crate; this is the seam a
/// caller plugs a real PDF library into.
pub type ExtractorFactory = dyn Fn(&Path, &[u8]) -> Result<Box<dyn PdfExtractor>> + Send + Sync;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Empty,
    Building,
    Flushed,
    Frozen,
}

/// The marker file that confirms a directory is (or may become) a
/// CorpusIndex root. Destructive `force_create` cleanup refuses to run
/// unless this file is already present, to avoid nuking an unrelated
/// directory.
const MARKER_FILE: &str = "file_list.json";

pub struct CorpusIndex {
    options: IndexOptions,
    root: Option<PathBuf>,
    state: State,
    last_flush: Instant,

    file_list: Vec<Option<FileDescriptor>>,
    by_hash: HashMap<String, usize>,
    by_idx: HashMap<usize, String>,
    by_hash_path: HashMap<String, PathBuf>,
    by_hash_doc: HashMap<String, DocPositions>,

    text_index: InvertedTextIndex,
    extractor_factory: Box<ExtractorFactory>,
}

impl CorpusIndex {
    /// `Create`. When `options.persist_dir` is absent the index
    /// is purely in memory; when present, directory contents are wiped
    /// first only if `force_create` is set *and* the marker file already
    /// exists there.
    pub fn create(
        paths: &[PathBuf],
        options: IndexOptions,
        extractor_factory: impl Fn(&Path, &[u8]) -> Result<Box<dyn PdfExtractor>> + Send + Sync + 'static,
    ) -> Result<Self> {
        let root = options.persist_dir.clone();
        if let Some(root) = &root {
            Self::prepare_root(root, options.force_create)?;
        }

        let text_index = match &root {
            Some(root) => InvertedTextIndex::open_or_create(&root.join("text_index").join("index.bin"), true)?,
            None => InvertedTextIndex::new(),
        };

        let mut index = Self {
            options,
            root,
            state: State::Empty,
            last_flush: Instant::now(),
            file_list: Vec::new(),
            by_hash: HashMap::new(),
            by_idx: HashMap::new(),
            by_hash_path: HashMap::new(),
            by_hash_doc: HashMap::new(),
            text_index,
            extractor_factory: Box::new(extractor_factory),
        };

        for path in paths {
            match index.add_file(path) {
                Ok(()) => {}
                Err(Error::Duplicate { .. }) => {}
                Err(e) if index.options.continue_on_failure => {
                    log::warn!("skipping {}: {e}", path.display());
                }
                Err(e) => return Err(e),
            }
        }

        Ok(index)
    }

    fn prepare_root(root: &Path, force_create: bool) -> Result<()> {
        fs::create_dir_all(root)?;
        let marker = root.join(MARKER_FILE);
        let has_existing_entries = fs::read_dir(root)?.next().is_some();

        if has_existing_entries {
            if !force_create {
                return Ok(());
            }
            if !marker.exists() {
                return Err(Error::IllegalState(format!(
                    "refusing to force_create over {}: no {MARKER_FILE} marker found",
                    root.display()
                )));
            }
            for entry in fs::read_dir(root)? {
                let entry = entry?;
                if entry.file_type()?.is_dir() {
                    fs::remove_dir_all(entry.path())?;
                } else {
                    fs::remove_file(entry.path())?;
                }
            }
        }
        Ok(())
    }

    /// Reopens an existing persistent index without re-indexing (spec
    /// `ReuseIndex`).
    pub fn reuse_index(
        persist_dir: &Path,
        options: IndexOptions,
        extractor_factory: impl Fn(&Path, &[u8]) -> Result<Box<dyn PdfExtractor>> + Send + Sync + 'static,
    ) -> Result<Self> {
        let marker = persist_dir.join(MARKER_FILE);
        let bytes = fs::read(&marker)?;
        let descriptors: Vec<FileDescriptor> = serde_json::from_slice(&bytes)?;

        let text_index = InvertedTextIndex::open_or_create(&persist_dir.join("text_index").join("index.bin"), false)?;

        let mut by_hash = HashMap::new();
        let mut by_idx = HashMap::new();
        let mut by_hash_path = HashMap::new();
        let mut by_hash_doc = HashMap::new();
        let mut file_list = Vec::with_capacity(descriptors.len());

        for (doc_idx, descriptor) in descriptors.into_iter().enumerate() {
            by_hash.insert(descriptor.hash.clone(), doc_idx);
            by_idx.insert(doc_idx, descriptor.hash.clone());
            by_hash_path.insert(descriptor.hash.clone(), descriptor.in_path.clone());
            let doc = DocPositions::open_persistent(
                &persist_dir.join("positions"),
                descriptor.in_path.clone(),
                doc_idx as u64,
                &descriptor.hash,
            )?;
            by_hash_doc.insert(descriptor.hash.clone(), doc);
            file_list.push(Some(descriptor));
        }

        Ok(Self {
            options,
            root: Some(persist_dir.to_path_buf()),
            state: State::Building,
            last_flush: Instant::now(),
            file_list,
            by_hash,
            by_idx,
            by_hash_path,
            by_hash_doc,
            text_index,
            extractor_factory: Box::new(extractor_factory),
        })
    }

    pub fn add_file(&mut self, path: &Path) -> Result<()> {
        let mut file = File::open(path)?;
        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes)?;
        self.add_bytes(path, bytes, &|| false)
    }

    /// `AddReader`: registers a PDF read from `reader` under the
    /// nominal `path`. `cancel` is polled between pages, so a caller can
    /// abort an in-progress file at a page boundary.
    pub fn add_reader<R: Read>(&mut self, path: &Path, reader: &mut R, cancel: &dyn Fn() -> bool) -> Result<()> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        self.add_bytes(path, bytes, cancel)
    }

    fn add_bytes(&mut self, path: &Path, bytes: Vec<u8>, cancel: &dyn Fn() -> bool) -> Result<()> {
        if self.state == State::Frozen {
            return Err(Error::IllegalState("AddFile is illegal once the index is Frozen".into()));
        }
        self.state = State::Building;

        let (hash, size_bytes) = hash_reader(&mut Cursor::new(&bytes))?;
        if self.by_hash.contains_key(&hash) {
            return Err(Error::Duplicate { path: path.to_path_buf() });
        }

        let doc_idx = self.file_list.len();
        self.file_list.push(Some(FileDescriptor {
            in_path: path.to_path_buf(),
            hash: hash.clone(),
            size_bytes,
        }));
        self.by_hash.insert(hash.clone(), doc_idx);
        self.by_idx.insert(doc_idx, hash.clone());
        self.by_hash_path.insert(hash.clone(), path.to_path_buf());

        match self.ingest(path, &bytes, doc_idx as u64, &hash, cancel) {
            Ok(indexed_ids) => {
                self.options.report(&format!("indexed {}", path.display()));
                let _ = indexed_ids;
                self.maybe_flush()?;
                Ok(())
            }
            Err(e) => {
                self.rollback(&hash, doc_idx);
                Err(e)
            }
        }
    }

    fn ingest(&mut self, path: &Path, bytes: &[u8], doc_idx: u64, hash: &str, cancel: &dyn Fn() -> bool) -> Result<Vec<String>> {
        let mut extractor = (self.extractor_factory)(path, bytes)?;
        let page_count = extractor.page_count()?;

        let mut doc = match &self.root {
            Some(root) => DocPositions::create_persistent(&root.join("positions"), path, doc_idx, hash)?,
            None => DocPositions::new_memory(path, doc_idx),
        };

        let mut indexed_ids = Vec::new();

        for page_num in 1..=page_count {
            if cancel() {
                doc.close().ok();
                return Err(Error::Cancelled);
            }

            let result = extract_page_guarded(extractor.as_mut(), path, page_num);
            let (text, marks) = match result {
                Ok(pair) => pair,
                Err(e) => {
                    if self.options.continue_on_failure {
                        log::warn!("{e}");
                        continue;
                    }
                    return Err(e);
                }
            };

            if text.is_empty() {
                continue;
            }

            let positions = marks_to_positions(&marks);
            let page_idx = doc.add_page(page_num, &positions, &text)?;

            let id = id::encode(doc_idx, page_idx);
            let mut fields = HashMap::new();
            fields.insert("text".to_string(), text);
            self.text_index.index(&id, &fields)?;
            indexed_ids.push(id);
        }

        doc.close()?;
        self.by_hash_doc.insert(hash.to_string(), doc);
        Ok(indexed_ids)
    }

    fn rollback(&mut self, hash: &str, doc_idx: usize) {
        if let Some(slot) = self.file_list.get_mut(doc_idx) {
            *slot = None;
        }
        self.by_hash.remove(hash);
        self.by_idx.remove(&doc_idx);
        self.by_hash_path.remove(hash);
        self.by_hash_doc.remove(hash);

        let prefix = id::encode(doc_idx as u64, 0);
        let doc_prefix = prefix.split_once('.').map(|(p, _)| p.to_string());
        if let Some(doc_prefix) = doc_prefix {
            self.text_index.retain_ids(|id| !id.starts_with(&format!("{doc_prefix}.")));
        }
    }

    fn maybe_flush(&mut self) -> Result<()> {
        if self.root.is_some() && self.last_flush.elapsed() >= self.options.flush_interval {
            self.flush()?;
        }
        Ok(())
    }

    /// Writes `file_list.json`. A no-op in memory mode.
    pub fn flush(&mut self) -> Result<()> {
        if let Some(root) = &self.root {
            let descriptors: Vec<&FileDescriptor> = self.file_list.iter().filter_map(|d| d.as_ref()).collect();
            fs::write(root.join(MARKER_FILE), serde_json::to_vec_pretty(&descriptors)?)?;
            self.text_index.flush()?;
        }
        self.last_flush = Instant::now();
        self.state = State::Flushed;
        Ok(())
    }

    /// Final flush and transition to `Frozen`. No further `AddFile` calls
    /// are accepted afterward.
    pub fn close(&mut self) -> Result<()> {
        self.flush()?;
        for doc in self.by_hash_doc.values_mut() {
            doc.close()?;
        }
        self.state = State::Frozen;
        Ok(())
    }

    pub fn doc_count(&self) -> usize {
        self.file_list.iter().filter(|d| d.is_some()).count()
    }

    /// `CorpusIndex.Search`.
    pub fn search(&mut self, term: &str, max_results: Option<i64>) -> Result<PdfMatchSet> {
        let size = self.options.resolve_max_results(max_results);
        let query_tokens = crate::analyzer::analyze_query(term);
        let result = self.text_index.search(term, size)?;

        let mut matches = Vec::new();
        for hit in &result.hits {
            let Ok((doc_idx, page_idx)) = id::decode(&hit.id) else {
                continue;
            };
            let Some(hash) = self.by_idx.get(&(doc_idx as usize)) else {
                continue;
            };
            let Some(locations) = hit.locations.get("text") else {
                continue;
            };

            let spans = phrase_spans(&query_tokens, locations);
            if spans.is_empty() {
                continue;
            }

            let Some(doc) = self.by_hash_doc.get_mut(hash) else {
                continue;
            };
            let (page_num, positions) = doc.read_page(page_idx)?;
            let page_text = doc.page_text(page_idx)?;

            let mut rects = Vec::with_capacity(spans.len());
            let mut line_numbers = Vec::with_capacity(spans.len());
            let mut lines = Vec::with_capacity(spans.len());
            for span in &spans {
                rects.push(positions.bbox(span.start, span.end));
                line_numbers.push(line_number(&page_text, span.start));
                lines.push(line_at(&page_text, span.start));
            }

            matches.push(PageMatch {
                in_path: doc.in_path.clone(),
                page_num,
                line_numbers,
                lines,
                spans,
                rects,
                raw_score: hit.score,
            });
        }

        Ok(PdfMatchSet {
            total: result.total,
            duration: result.duration,
            matches,
        })
    }

    /// Memory-mode only. Produces the length-prefixed,
    /// DEFLATE-compressed byte buffer.
    pub fn serialize(&mut self) -> Result<Vec<u8>> {
        if self.root.is_some() {
            return Err(Error::IllegalState("Serialize is memory-mode only".into()));
        }
        if self.state != State::Frozen {
            return Err(Error::IllegalState("Serialize requires the index to be Frozen".into()));
        }

        let snapshot = self.build_snapshot()?;
        let snap1 = deflate(&snapshot::encode(&snapshot));
        let snap2 = deflate(&self.text_index.export_bytes());

        let mut buf = Vec::with_capacity(8 + snap1.len() + snap2.len());
        buf.extend_from_slice(&(snap1.len() as u32).to_le_bytes());
        buf.extend_from_slice(&(snap2.len() as u32).to_le_bytes());
        buf.extend_from_slice(&snap1);
        buf.extend_from_slice(&snap2);
        Ok(buf)
    }

    pub fn deserialize(
        bytes: &[u8],
        options: IndexOptions,
        extractor_factory: impl Fn(&Path, &[u8]) -> Result<Box<dyn PdfExtractor>> + Send + Sync + 'static,
    ) -> Result<Self> {
        if bytes.len() < 8 {
            return Err(Error::Corrupt("serialized buffer shorter than header".into()));
        }
        let n1 = u32::from_le_bytes(bytes[0..4].try_into().unwrap()) as usize;
        let n2 = u32::from_le_bytes(bytes[4..8].try_into().unwrap()) as usize;
        if n1 == 0 || n2 == 0 {
            return Err(Error::Corrupt("serialized buffer declares an empty snapshot".into()));
        }
        if 8 + n1 + n2 != bytes.len() {
            return Err(Error::Corrupt("serialized buffer length does not match declared snapshot sizes".into()));
        }

        let snapshot = snapshot::decode(&inflate(&bytes[8..8 + n1])?)?;
        let text_index_bytes = inflate(&bytes[8 + n1..])?;

        let mut index = Self {
            options,
            root: None,
            state: State::Frozen,
            last_flush: Instant::now(),
            file_list: Vec::new(),
            by_hash: HashMap::new(),
            by_idx: HashMap::new(),
            by_hash_path: HashMap::new(),
            by_hash_doc: HashMap::new(),
            text_index: InvertedTextIndex::new(),
            extractor_factory: Box::new(extractor_factory),
        };
        index.text_index.import_bytes(&text_index_bytes)?;
        index.restore_snapshot(snapshot)?;
        Ok(index)
    }

    fn build_snapshot(&mut self) -> Result<CorpusSnapshot> {
        let mut docs = Vec::new();
        for (doc_idx, descriptor) in self.file_list.iter().enumerate() {
            let Some(descriptor) = descriptor else { continue };
            let Some(doc) = self.by_hash_doc.get_mut(&descriptor.hash) else { continue };

            let mut pages = Vec::with_capacity(doc.page_count());
            for page_idx in 0..doc.page_count() {
                let (page_num, positions) = doc.read_page(page_idx)?;
                let text = doc.page_text(page_idx)?;
                pages.push(PageSnapshot { page_num, text, positions });
            }

            docs.push(HashEntry {
                hash: descriptor.hash.clone(),
                index: doc_idx as u64,
                path: descriptor.in_path.to_string_lossy().into_owned(),
                doc: DocSnapshot {
                    path: descriptor.in_path.to_string_lossy().into_owned(),
                    doc_idx: doc_idx as u64,
                    pages,
                },
            });
        }
        Ok(CorpusSnapshot { docs })
    }

    fn restore_snapshot(&mut self, snapshot: CorpusSnapshot) -> Result<()> {
        for entry in snapshot.docs {
            let doc_idx = entry.doc.doc_idx;
            self.file_list.push(Some(FileDescriptor {
                in_path: PathBuf::from(&entry.path),
                hash: entry.hash.clone(),
                size_bytes: 0,
            }));
            self.by_hash.insert(entry.hash.clone(), doc_idx as usize);
            self.by_idx.insert(doc_idx as usize, entry.hash.clone());
            self.by_hash_path.insert(entry.hash.clone(), PathBuf::from(&entry.path));

            let mut doc = DocPositions::new_memory(PathBuf::from(&entry.doc.path), doc_idx);
            for page in entry.doc.pages {
                doc.add_page(page.page_num, &page.positions, &page.text)?;
            }
            doc.close()?;
            self.by_hash_doc.insert(entry.hash, doc);
        }
        Ok(())
    }
}

fn deflate(bytes: &[u8]) -> Vec<u8> {
    let mut encoder = DeflateEncoder::new(Vec::new(), Compression::best());
    encoder.write_all(bytes).expect("in-memory writer never fails");
    encoder.finish().expect("in-memory writer never fails")
}

fn inflate(bytes: &[u8]) -> Result<Vec<u8>> {
    let mut decoder = DeflateDecoder::new(bytes);
    let mut out = Vec::new();
    decoder
        .read_to_end(&mut out)
        .map_err(|e| Error::Corrupt(format!("failed to inflate snapshot: {e}")))?;
    Ok(out)
}
