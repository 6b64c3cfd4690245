//! A minimal, `lopdf`-backed [`PdfExtractor`]: the reference adapter this
//! binary plugs into [`CorpusIndex`] so the CLI has a real PDF to index.
//!
//! The crate itself treats extraction as out of scope and depends only on
//! the [`PdfExtractor`] seam; this implementation walks a page's content
//! stream looking for the handful of text-positioning operators (`Tm`,
//! `Td`, `TD`, `T*`, `Tj`, `'`, `Tf`) and turns each run of shown text into
//! one [`TextMark`]. It does not do glyph-level layout: the rectangle
//! reported for a run is an estimate (string length times font size)
//! rather than something read out of the font's actual glyph widths, and
//! PDF string encodings other than plain UTF-8-ish byte strings are not
//! decoded. Good enough to drive the CLI against a real corpus; not a
//! substitute for a real PDF renderer.

use std::path::{Path, PathBuf};

use lopdf::content::Content;
use lopdf::{Document, Object, ObjectId};

use pdfsearch::{Error, PdfExtractor, Result, TextMark};

pub struct LopdfExtractor {
    document: Document,
    pages: Vec<ObjectId>,
}

impl LopdfExtractor {
    pub fn open(path: &Path, bytes: &[u8]) -> Result<Self> {
        let document = Document::load_mem(bytes)
            .map_err(|e| extraction_error(path, format!("failed to parse PDF: {e}")))?;

        let mut entries: Vec<(u32, ObjectId)> = document.get_pages().into_iter().collect();
        entries.sort_by_key(|(page_num, _)| *page_num);
        let pages = entries.into_iter().map(|(_, id)| id).collect();

        Ok(Self { document, pages })
    }
}

/// Builds a [`pdfsearch::corpus_index::ExtractorFactory`]-shaped closure
/// (a bare `fn` coerces to one) that reads PDFs through `lopdf`.
pub fn open_extractor(path: &Path, bytes: &[u8]) -> Result<Box<dyn PdfExtractor>> {
    Ok(Box::new(LopdfExtractor::open(path, bytes)?))
}

impl PdfExtractor for LopdfExtractor {
    fn page_count(&mut self) -> Result<u32> {
        Ok(self.pages.len() as u32)
    }

    fn extract_page(&mut self, page_num: u32) -> Result<(String, Vec<TextMark>)> {
        let path = PathBuf::new();
        let Some(page_id) = self.pages.get((page_num - 1) as usize).copied() else {
            return Err(Error::OutOfRange(format!("page {page_num} does not exist")));
        };

        let content_bytes = self
            .document
            .get_page_content(page_id)
            .map_err(|e| extraction_error(&path, format!("failed to read page {page_num} content: {e}")))?;

        let content = Content::decode(&content_bytes)
            .map_err(|e| extraction_error(&path, format!("failed to decode content stream on page {page_num}: {e}")))?;

        Ok(parse_content_stream(&content))
    }
}

fn extraction_error(path: &Path, reason: String) -> Error {
    Error::Extraction { path: path.to_path_buf(), reason }
}

#[derive(Clone, Copy)]
struct TextState {
    tx: f64,
    ty: f64,
    leading: f64,
    font_size: f64,
}

impl Default for TextState {
    fn default() -> Self {
        Self { tx: 0.0, ty: 0.0, leading: 0.0, font_size: 12.0 }
    }
}

/// Walks `content`'s operators in order, concatenating every shown string
/// into one page-text buffer and recording a [`TextMark`] per run at the
/// byte offset it lands at.
fn parse_content_stream(content: &Content) -> (String, Vec<TextMark>) {
    let mut text = String::new();
    let mut marks = Vec::new();

    let mut matrix = TextState::default();
    let mut line_matrix = TextState::default();

    for op in &content.operations {
        match op.operator.as_str() {
            "Tm" => {
                let e = operand_f64(op.operands.get(4)).unwrap_or(matrix.tx);
                let f = operand_f64(op.operands.get(5)).unwrap_or(matrix.ty);
                matrix.tx = e;
                matrix.ty = f;
                line_matrix = matrix;
            }
            "Td" => {
                let tx = operand_f64(op.operands.first()).unwrap_or(0.0);
                let ty = operand_f64(op.operands.get(1)).unwrap_or(0.0);
                line_matrix.tx += tx;
                line_matrix.ty += ty;
                matrix = line_matrix;
            }
            "TD" => {
                let tx = operand_f64(op.operands.first()).unwrap_or(0.0);
                let ty = operand_f64(op.operands.get(1)).unwrap_or(0.0);
                line_matrix.leading = -ty;
                line_matrix.tx += tx;
                line_matrix.ty += ty;
                matrix = line_matrix;
            }
            "T*" => {
                line_matrix.ty -= line_matrix.leading;
                matrix = line_matrix;
            }
            "Tf" => {
                matrix.font_size = operand_f64(op.operands.get(1)).unwrap_or(matrix.font_size);
                line_matrix.font_size = matrix.font_size;
            }
            "TL" => {
                let leading = operand_f64(op.operands.first()).unwrap_or(0.0);
                matrix.leading = leading;
                line_matrix.leading = leading;
            }
            "Tj" => {
                if let Some(run) = operand_string(op.operands.first()) {
                    push_run(&mut text, &mut marks, &run, &matrix);
                }
            }
            "'" => {
                line_matrix.ty -= line_matrix.leading;
                matrix = line_matrix;
                if let Some(run) = operand_string(op.operands.first()) {
                    push_run(&mut text, &mut marks, &run, &matrix);
                }
            }
            "TJ" => {
                if let Some(Object::Array(items)) = op.operands.first() {
                    for item in items {
                        if let Object::String(bytes, _) = item {
                            let run = decode_pdf_string(bytes);
                            push_run(&mut text, &mut marks, &run, &matrix);
                        }
                    }
                }
            }
            "BT" => {
                matrix = TextState { font_size: matrix.font_size, ..TextState::default() };
                line_matrix = matrix;
            }
            _ => {}
        }
    }

    (text, marks)
}

fn push_run(text: &mut String, marks: &mut Vec<TextMark>, run: &str, state: &TextState) {
    if run.is_empty() {
        return;
    }
    let offset = text.len() as u32;
    let width = run.chars().count() as f64 * state.font_size * 0.5;
    marks.push(TextMark {
        offset,
        llx: state.tx,
        lly: state.ty,
        urx: state.tx + width,
        ury: state.ty + state.font_size,
    });
    text.push_str(run);
    text.push(' ');
}

fn operand_f64(object: Option<&Object>) -> Option<f64> {
    match object {
        Some(Object::Integer(v)) => Some(*v as f64),
        Some(Object::Real(v)) => Some(*v as f64),
        _ => None,
    }
}

fn operand_string(object: Option<&Object>) -> Option<String> {
    match object {
        Some(Object::String(bytes, _)) => Some(decode_pdf_string(bytes)),
        _ => None,
    }
}

fn decode_pdf_string(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}
