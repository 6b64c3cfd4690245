//! The extraction adapter: a thin contract over an external PDF
//! text-extractor.
//!
//! The extractor itself — the thing that walks a PDF's content streams and
//! produces glyph runs — is out of scope for this crate. What we own is
//! the seam: a trait any extractor can implement, the narrow `TextMark`
//! type it hands back per page, and a panic-to-error boundary so a single
//! malformed PDF can't take the whole indexing run down with it.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::Path;

use crate::error::{Error, Result};
use crate::offset_box::OffsetBox;
use crate::page_positions::PagePositions;

/// One glyph run reported by the extractor: a byte offset into the page's
/// extracted text, and its rectangle in PDF page coordinates.
///
/// Coordinates arrive as `f64` (the extractor's native precision) and are
/// narrowed to `f32` when converted into an [`OffsetBox`] — position maps
/// don't need double precision, and narrowing here keeps every downstream
/// type fixed-width.
#[derive(Debug, Clone, Copy)]
pub struct TextMark {
    pub offset: u32,
    pub llx: f64,
    pub lly: f64,
    pub urx: f64,
    pub ury: f64,
}

impl From<TextMark> for OffsetBox {
    fn from(m: TextMark) -> Self {
        OffsetBox::new(m.offset, m.llx as f32, m.lly as f32, m.urx as f32, m.ury as f32)
    }
}

/// Implemented by whatever extracts text and glyph geometry from a PDF.
/// `page_count` and `extract_page` are the entire surface the rest of the
/// crate depends on — everything else about how a PDF is parsed is the
/// extractor's business.
pub trait PdfExtractor {
    fn page_count(&mut self) -> Result<u32>;

    /// Extracts one 1-indexed page's text and glyph marks. An empty
    /// `marks` vec alongside non-empty text is legal (e.g. an
    /// image-only page the extractor chose not to OCR); the caller skips
    /// pages whose *text* comes back empty.
    fn extract_page(&mut self, page_num: u32) -> Result<(String, Vec<TextMark>)>;
}

/// Runs `extractor.extract_page(page_num)` behind a panic boundary,
/// converting an unwind into [`Error::Extraction`] so one bad PDF can't
/// abort indexing of the rest of the corpus.
pub fn extract_page_guarded(
    extractor: &mut dyn PdfExtractor,
    path: &Path,
    page_num: u32,
) -> Result<(String, Vec<TextMark>)> {
    match catch_unwind(AssertUnwindSafe(|| extractor.extract_page(page_num))) {
        Ok(result) => result,
        Err(panic) => {
            let reason = panic_message(&panic);
            Err(Error::Extraction {
                path: path.to_path_buf(),
                reason: format!("extractor panicked on page {page_num}: {reason}"),
            })
        }
    }
}

fn panic_message(payload: &Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Converts a page's `TextMark`s into a [`PagePositions`], in the order
/// the extractor reported them. The extractor is responsible for emitting
/// them in non-decreasing offset order (an append-only `PagePositions`
/// invariant); this function trusts that and just wraps the conversion.
pub fn marks_to_positions(marks: &[TextMark]) -> PagePositions {
    let mut positions = PagePositions::with_capacity(marks.len());
    for m in marks {
        positions.append(OffsetBox::from(*m));
    }
    positions
}
