//! A hand-rolled inverted index: `term -> doc id -> [Location]` postings,
//! built by tokenizing every document and collecting postings per term,
//! with no external search engine underneath.
//!
//! Documents here are never split into fields beyond a single `"text"`
//! field, and re-indexing an `id` fully replaces its postings rather than
//! accumulating them.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::analyzer::{analyze, analyze_query};
use crate::binary::varint::{decode_count, decode_string, encode_string};
use crate::error::{Error, Result};

use super::{Location, SearchHit, SearchResult, TextIndex};

const FIELD: &str = "text";

/// "TIDX" in ASCII — distinct from the corpus binary codecs' own magics.
const MAGIC: [u8; 4] = [0x54, 0x49, 0x44, 0x58];
const VERSION: u8 = 1;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct DocRecord {
    text: String,
}

/// A term-at-a-time inverted index over a flat namespace of document ids
/// (each id is one indexed page, per the corpus index's `"{docIdx}.{pageIdx}"`
/// scheme). Holds every document's raw text alongside the derived
/// postings so it can fully rebuild itself from [`export_bytes`] without a
/// separate postings codec.
pub struct InvertedTextIndex {
    docs: HashMap<String, DocRecord>,
    postings: HashMap<String, HashMap<String, Vec<Location>>>,
    path: Option<PathBuf>,
}

impl InvertedTextIndex {
    pub fn new() -> Self {
        Self {
            docs: HashMap::new(),
            postings: HashMap::new(),
            path: None,
        }
    }

    /// Disk form: opens `path` if it exists, otherwise creates an empty
    /// index there. Mirrors `CorpusIndex::create`'s own `force_create`
    /// semantics by simply overwriting when requested.
    pub fn open_or_create(path: &Path, force_create: bool) -> Result<Self> {
        if path.exists() && !force_create {
            let bytes = fs::read(path)?;
            let mut index = Self::new();
            index.import_bytes(&bytes)?;
            index.path = Some(path.to_path_buf());
            return Ok(index);
        }
        let mut index = Self::new();
        index.path = Some(path.to_path_buf());
        index.flush()?;
        Ok(index)
    }

    /// Writes the current state to the backing path, if this index is in
    /// disk mode. A no-op in memory mode.
    pub fn flush(&self) -> Result<()> {
        if let Some(path) = &self.path {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, self.export_bytes())?;
        }
        Ok(())
    }

    fn remove_doc(&mut self, id: &str) {
        if self.docs.remove(id).is_none() {
            return;
        }
        self.postings.retain(|_, by_doc| {
            by_doc.remove(id);
            !by_doc.is_empty()
        });
    }

    /// Removes every document whose id matches `predicate`. Used to unwind
    /// a partially-ingested file's pages when `AddFile` fails partway
    /// through.
    pub(crate) fn retain_ids(&mut self, predicate: impl Fn(&str) -> bool) {
        let doomed: Vec<String> = self.docs.keys().filter(|id| !predicate(id)).cloned().collect();
        for id in doomed {
            self.remove_doc(&id);
        }
    }

    /// Serializes every document's raw text; postings are rebuilt on
    /// import by re-running the analyzer, so only the text itself needs
    /// encoding.
    pub fn export_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(&MAGIC);
        buf.push(VERSION);

        let mut ids: Vec<&String> = self.docs.keys().collect();
        ids.sort();
        crate::binary::varint::encode_varint(ids.len() as u64, &mut buf);
        for id in ids {
            encode_string(id, &mut buf);
            encode_string(&self.docs[id].text, &mut buf);
        }
        buf
    }

    pub fn import_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        if bytes.len() < 5 || bytes[0..4] != MAGIC {
            return Err(Error::Corrupt("text index magic mismatch".into()));
        }
        if bytes[4] != VERSION {
            return Err(Error::Corrupt(format!("unsupported text index version {}", bytes[4])));
        }

        self.docs.clear();
        self.postings.clear();

        let mut pos = 5usize;
        let (doc_count, used) = decode_count(&bytes[pos..])?;
        pos += used;
        for _ in 0..doc_count {
            let (id, used) = decode_string(&bytes[pos..])?;
            pos += used;
            let (text, used) = decode_string(&bytes[pos..])?;
            pos += used;

            let mut fields = HashMap::new();
            fields.insert(FIELD.to_string(), text);
            self.index(&id, &fields)?;
        }
        Ok(())
    }
}

impl Default for InvertedTextIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl TextIndex for InvertedTextIndex {
    fn index(&mut self, id: &str, fields: &HashMap<String, String>) -> Result<()> {
        let Some(text) = fields.get(FIELD) else {
            return Err(Error::IllegalState(format!("document {id} has no {FIELD} field")));
        };

        self.remove_doc(id);

        let tokens = analyze(text);
        for (i, token) in tokens.iter().enumerate() {
            let location = Location {
                pos: (i + 1) as u32,
                start: token.start,
                end: token.end,
            };
            self.postings
                .entry(token.term.clone())
                .or_default()
                .entry(id.to_string())
                .or_default()
                .push(location);
        }

        self.docs.insert(id.to_string(), DocRecord { text: text.clone() });
        if self.path.is_some() {
            self.flush()?;
        }
        Ok(())
    }

    fn search(&self, query: &str, size: u32) -> Result<SearchResult> {
        let started = Instant::now();
        let query_tokens = analyze_query(query);
        let query_terms: HashSet<&str> = query_tokens.iter().map(String::as_str).collect();

        let mut matched_ids: HashSet<&str> = HashSet::new();
        for term in &query_terms {
            if let Some(by_doc) = self.postings.get(*term) {
                matched_ids.extend(by_doc.keys().map(String::as_str));
            }
        }

        let mut hits: Vec<SearchHit> = matched_ids
            .into_iter()
            .map(|id| {
                let mut locations: HashMap<String, Vec<Location>> = HashMap::new();
                let mut score = 0.0;
                for term in &query_terms {
                    if let Some(locs) = self.postings.get(*term).and_then(|by_doc| by_doc.get(id)) {
                        score += locs.len() as f64;
                        locations.insert((*term).to_string(), locs.clone());
                    }
                }

                let fragment = self
                    .docs
                    .get(id)
                    .and_then(|doc| fragment_around(&doc.text, &locations));

                let mut field_locations = HashMap::new();
                field_locations.insert(FIELD.to_string(), locations);

                let mut fragments = HashMap::new();
                if let Some(fragment) = fragment {
                    fragments.insert(FIELD.to_string(), vec![fragment]);
                }

                SearchHit {
                    id: id.to_string(),
                    score,
                    fragments,
                    locations: field_locations,
                }
            })
            .collect();

        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal).then_with(|| a.id.cmp(&b.id)));
        let total = hits.len() as u64;
        hits.truncate(size as usize);

        Ok(SearchResult {
            hits,
            total,
            duration: started.elapsed(),
        })
    }

    fn doc_count(&self) -> u64 {
        self.docs.len() as u64
    }
}

fn fragment_around(text: &str, locations: &HashMap<String, Vec<Location>>) -> Option<String> {
    let earliest = locations.values().flatten().map(|l| l.start).min()?;
    const RADIUS: usize = 40;
    let start = (earliest as usize).saturating_sub(RADIUS);
    let start = floor_char_boundary(text, start);
    let end = ((earliest as usize) + RADIUS).min(text.len());
    let end = ceil_char_boundary(text, end);
    Some(text[start..end].to_string())
}

fn floor_char_boundary(text: &str, mut idx: usize) -> usize {
    while idx > 0 && !text.is_char_boundary(idx) {
        idx -= 1;
    }
    idx
}

fn ceil_char_boundary(text: &str, mut idx: usize) -> usize {
    while idx < text.len() && !text.is_char_boundary(idx) {
        idx += 1;
    }
    idx
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(text: &str) -> HashMap<String, String> {
        let mut f = HashMap::new();
        f.insert(FIELD.to_string(), text.to_string());
        f
    }

    #[test]
    fn indexes_and_finds_a_document() {
        let mut index = InvertedTextIndex::new();
        index.index("0000.0", &fields("the quick brown fox")).unwrap();
        let result = index.search("brown fox", 10).unwrap();
        assert_eq!(result.hits.len(), 1);
        assert_eq!(result.hits[0].id, "0000.0");
    }

    #[test]
    fn reindexing_an_id_replaces_its_postings() {
        let mut index = InvertedTextIndex::new();
        index.index("0000.0", &fields("alpha")).unwrap();
        index.index("0000.0", &fields("beta")).unwrap();
        assert!(index.search("alpha", 10).unwrap().hits.is_empty());
        assert_eq!(index.search("beta", 10).unwrap().hits.len(), 1);
    }

    #[test]
    fn search_ranks_more_matching_terms_higher() {
        let mut index = InvertedTextIndex::new();
        index.index("0000.0", &fields("fox fox fox")).unwrap();
        index.index("0000.1", &fields("fox")).unwrap();
        let result = index.search("fox", 10).unwrap();
        assert_eq!(result.hits[0].id, "0000.0");
    }

    #[test]
    fn export_import_round_trips_search_results() {
        let mut index = InvertedTextIndex::new();
        index.index("0000.0", &fields("brown fox jumps")).unwrap();
        let bytes = index.export_bytes();

        let mut restored = InvertedTextIndex::new();
        restored.import_bytes(&bytes).unwrap();
        assert_eq!(restored.doc_count(), 1);
        assert_eq!(restored.search("fox", 10).unwrap().hits.len(), 1);
    }

    #[test]
    fn doc_count_reflects_distinct_ids() {
        let mut index = InvertedTextIndex::new();
        index.index("0000.0", &fields("a")).unwrap();
        index.index("0000.1", &fields("b")).unwrap();
        assert_eq!(index.doc_count(), 2);
    }
}
