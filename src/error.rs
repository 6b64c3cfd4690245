//! Error taxonomy for the crate.
//!
//! One enum covers every failure kind named by the position map, the corpus
//! index, and the query pipeline. Call sites decide which variants are fatal
//! and which are logged and skipped (`Duplicate`, `Extraction` under
//! `continue_on_failure`, `NoMatch`) — the type itself doesn't encode that
//! policy.

use std::path::PathBuf;

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// A hash, `docIdx`, or `pageIdx` was not present in the index.
    #[error("not found: {0}")]
    NotFound(String),

    /// A `pageIdx` was beyond the partition list, or an offset fell outside a page.
    #[error("out of range: {0}")]
    OutOfRange(String),

    /// CRC mismatch on a `.dat` read, malformed `file_list.json`, or a truncated snapshot.
    #[error("corrupt data: {0}")]
    Corrupt(String),

    /// `AddFile` of a hash already present in the index.
    #[error("duplicate file: {path}")]
    Duplicate { path: PathBuf },

    /// `AddPage` called with `pageNum == 0`.
    #[error("empty page: page numbers are 1-indexed, got 0")]
    EmptyPage,

    /// The extractor failed or produced empty text for a page.
    #[error("extraction failed for {path}: {reason}")]
    Extraction { path: PathBuf, reason: String },

    /// An underlying filesystem error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// A search hit had no resolvable phrase span.
    #[error("no match: {0}")]
    NoMatch(String),

    /// The index is in a state that forbids the requested operation
    /// (e.g. `AddFile` after `Serialize`, `ReadPage` before `Close`).
    #[error("illegal state: {0}")]
    IllegalState(String),

    /// The indexing loop observed a cancellation signal between pages.
    #[error("cancelled")]
    Cancelled,

    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),
}
