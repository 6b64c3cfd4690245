//! Full-text search across a corpus of PDF documents, with every hit
//! resolved down to the exact rectangle on the source page where the
//! matching text lives.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐   ┌────────────────┐   ┌─────────────────┐
//! │ offset_box   │──▶│ page_positions │──▶│ doc_positions    │
//! │ (OffsetBox)  │   │ (PagePositions,│   │ (per-document    │
//! │              │   │  BBox resolver)│   │  pages + text)   │
//! └──────────────┘   └────────────────┘   └─────────┬────────┘
//!                                                     │
//! ┌──────────────┐   ┌────────────────┐   ┌──────────▼────────┐
//! │ extraction   │──▶│  analyzer      │──▶│  text_index        │
//! │ (PdfExtractor│   │ (shared English│   │ (InvertedTextIndex)│
//! │  + panic     │   │  tokenizer)    │   │                    │
//! │  guard)      │   └────────────────┘   └──────────┬─────────┘
//! └──────────────┘                                    │
//!                                          ┌───────────▼──────────┐
//!                                          │    corpus_index       │
//!                                          │ (CorpusIndex: hash    │
//!                                          │  maps, AddFile,       │
//!                                          │  Search, (de)serialize│
//!                                          └───────────┬───────────┘
//!                                                       │
//!                                          ┌────────────▼───────────┐
//!                                          │ query (phrase scoring, │
//!                                          │ PdfMatchSet) + markup  │
//!                                          │ (groups spans by page) │
//!                                          └────────────────────────┘
//! ```
//!
//! The binary codecs live under [`binary`]: varint primitives, the
//! per-page record format, and the composite corpus snapshot used by
//! [`corpus_index::CorpusIndex::serialize`].

pub mod analyzer;
pub mod binary;
pub mod config;
pub mod corpus_index;
pub mod doc_positions;
pub mod error;
pub mod extraction;
pub mod hash;
pub mod markup;
pub mod offset_box;
pub mod page_positions;
pub mod query;
pub mod text_index;

pub use config::IndexOptions;
pub use corpus_index::CorpusIndex;
pub use doc_positions::{DocPositions, PagePartition};
pub use error::{Error, Result};
pub use extraction::{PdfExtractor, TextMark};
pub use hash::FileDescriptor;
pub use markup::{emit_markup, PdfWriter};
pub use offset_box::OffsetBox;
pub use page_positions::PagePositions;
pub use query::{PageMatch, PdfMatchSet, Span};
pub use text_index::inverted::InvertedTextIndex;
pub use text_index::{Location, SearchHit, SearchResult, TextIndex};
