//! The text-index adapter: a thin contract over a full-text engine, plus
//! [`inverted`]'s hand-rolled implementation of it.
//!
//! Deliberately not a wrapper around a heavyweight search engine — an
//! adapter trait with one concrete, dependency-free implementation behind
//! it, in the same spirit as the rest of the corpus index's hand-rolled
//! codecs.

pub mod inverted;

use std::collections::HashMap;
use std::time::Duration;

use crate::error::Result;

/// One occurrence of a term within a field: its 1-based token position and
/// the byte span of the word in the original text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    pub pos: u32,
    pub start: u32,
    pub end: u32,
}

/// One matched document from [`TextIndex::search`].
#[derive(Debug, Clone)]
pub struct SearchHit {
    pub id: String,
    pub score: f64,
    pub fragments: HashMap<String, Vec<String>>,
    pub locations: HashMap<String, HashMap<String, Vec<Location>>>,
}

#[derive(Debug, Clone)]
pub struct SearchResult {
    pub hits: Vec<SearchHit>,
    pub total: u64,
    pub duration: Duration,
}

/// The full-text engine contract. `Index`/`Search`/`DocCount`
/// are required of every implementation; the memory/disk persistence
/// methods are implementation-specific and live directly on
/// [`inverted::InvertedTextIndex`] rather than on this trait, since a
/// future non-hand-rolled backend would persist itself very differently.
pub trait TextIndex {
    /// Adds or replaces the document under `id`. `fields["text"]` is run
    /// through the shared analyzer so the query pipeline's own
    /// tokenization lines up with what got indexed.
    fn index(&mut self, id: &str, fields: &HashMap<String, String>) -> Result<()>;

    fn search(&self, query: &str, size: u32) -> Result<SearchResult>;

    fn doc_count(&self) -> u64;
}
