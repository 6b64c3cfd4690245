//! The markup emitter — interface only. Drawing rectangles onto a PDF page
//! is someone else's job (the external PDF writer); this module's entire
//! responsibility is turning a [`PdfMatchSet`] into the ordered,
//! deduplicated, capped `(page, rects)` calls that writer needs.

use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::offset_box::OffsetBox;
use crate::query::PdfMatchSet;

/// Implemented by the external component that actually draws rectangles
/// onto a page. Out of scope for this crate beyond this seam.
pub trait PdfWriter {
    fn draw_rects(&mut self, path: &Path, page_num: u32, rects: &[OffsetBox]) -> Result<()>;
}

/// Groups `match_set`'s spans by `(inPath, pageNum)` in first-appearance
/// order, drops duplicate pairs, caps to `max_pages` distinct pages and
/// `max_rects_per_page` rectangles per page (excess entries are dropped,
/// never an error), and hands each surviving group to `writer`.
pub fn emit_markup(
    match_set: &PdfMatchSet,
    max_pages: usize,
    max_rects_per_page: usize,
    writer: &mut dyn PdfWriter,
) -> Result<()> {
    let mut order: Vec<(PathBuf, u32)> = Vec::new();
    let mut rects_by_page: Vec<Vec<OffsetBox>> = Vec::new();

    for page_match in &match_set.matches {
        let key = (page_match.in_path.clone(), page_match.page_num);
        let group_idx = match order.iter().position(|k| *k == key) {
            Some(idx) => idx,
            None => {
                if order.len() >= max_pages {
                    continue;
                }
                order.push(key);
                rects_by_page.push(Vec::new());
                order.len() - 1
            }
        };

        let rects = &mut rects_by_page[group_idx];
        for rect in page_match.rects.iter().flatten() {
            if rects.len() >= max_rects_per_page {
                break;
            }
            rects.push(*rect);
        }
    }

    for ((path, page_num), rects) in order.into_iter().zip(rects_by_page) {
        writer.draw_rects(&path, page_num, &rects)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{PageMatch, Span};
    use std::time::Duration;

    struct RecordingWriter {
        calls: Vec<(PathBuf, u32, usize)>,
    }

    impl PdfWriter for RecordingWriter {
        fn draw_rects(&mut self, path: &Path, page_num: u32, rects: &[OffsetBox]) -> Result<()> {
            self.calls.push((path.to_path_buf(), page_num, rects.len()));
            Ok(())
        }
    }

    fn page_match(path: &str, page_num: u32, rect_count: usize) -> PageMatch {
        let rects = (0..rect_count)
            .map(|i| Some(OffsetBox::new(i as u32, 0.0, 0.0, 1.0, 1.0)))
            .collect();
        let spans = (0..rect_count).map(|_| Span { start: 0, end: 1, score: 1 }).collect();
        PageMatch {
            in_path: PathBuf::from(path),
            page_num,
            line_numbers: vec![1; rect_count],
            lines: vec!["line".to_string(); rect_count],
            spans,
            rects,
            raw_score: 1.0,
        }
    }

    #[test]
    fn groups_and_dedups_by_path_and_page() {
        let set = PdfMatchSet {
            total: 2,
            duration: Duration::from_millis(1),
            matches: vec![page_match("a.pdf", 1, 1), page_match("a.pdf", 1, 1)],
        };
        let mut writer = RecordingWriter { calls: Vec::new() };
        emit_markup(&set, 10, 10, &mut writer).unwrap();

        assert_eq!(writer.calls.len(), 1);
        assert_eq!(writer.calls[0].2, 2);
    }

    #[test]
    fn caps_pages_and_rects_by_dropping_not_erroring() {
        let set = PdfMatchSet {
            total: 3,
            duration: Duration::from_millis(1),
            matches: vec![
                page_match("a.pdf", 1, 5),
                page_match("b.pdf", 1, 5),
                page_match("c.pdf", 1, 5),
            ],
        };
        let mut writer = RecordingWriter { calls: Vec::new() };
        emit_markup(&set, 2, 3, &mut writer).unwrap();

        assert_eq!(writer.calls.len(), 2);
        assert!(writer.calls.iter().all(|(_, _, n)| *n <= 3));
    }

    #[test]
    fn preserves_first_appearance_order() {
        let set = PdfMatchSet {
            total: 2,
            duration: Duration::from_millis(1),
            matches: vec![page_match("b.pdf", 1, 1), page_match("a.pdf", 1, 1)],
        };
        let mut writer = RecordingWriter { calls: Vec::new() };
        emit_markup(&set, 10, 10, &mut writer).unwrap();

        assert_eq!(writer.calls[0].0, PathBuf::from("b.pdf"));
        assert_eq!(writer.calls[1].0, PathBuf::from("a.pdf"));
    }
}
