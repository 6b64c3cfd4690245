//! [`PagePositions`]: the ordered offset→rectangle map for one PDF page.

use crate::offset_box::OffsetBox;

/// Ordered sequence of [`OffsetBox`]es for one page.
///
/// Boxes are stored in non-decreasing order of `offset`; duplicates are
/// legal (this is a sequence, not a map) — consecutive boxes sharing an
/// offset typically represent a glyph run plus a trailing filler. The
/// sequence is append-only while the enclosing [`crate::DocPositions`] is
/// open for writing, and immutable once the page is closed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PagePositions {
    boxes: Vec<OffsetBox>,
}

/// Default sanity bound on a resolved rectangle's height (points).
/// Rectangles taller than this are still returned — it's a
/// logging hook for catching extractor bugs, not a hard limit.
pub const DEFAULT_SANITY_HEIGHT: f32 = 200.0;

impl PagePositions {
    pub fn new() -> Self {
        Self { boxes: Vec::new() }
    }

    pub fn with_capacity(cap: usize) -> Self {
        Self {
            boxes: Vec::with_capacity(cap),
        }
    }

    /// Append a box. Only meaningful before the enclosing document is
    /// closed; the type itself doesn't enforce that — `DocPositions` does.
    pub fn append(&mut self, b: OffsetBox) {
        self.boxes.push(b);
    }

    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }

    pub fn for_each(&self, mut f: impl FnMut(&OffsetBox)) {
        self.boxes.iter().for_each(|b| f(b));
    }

    pub fn iter(&self) -> impl Iterator<Item = &OffsetBox> {
        self.boxes.iter()
    }

    pub fn as_slice(&self) -> &[OffsetBox] {
        &self.boxes
    }

    pub fn from_boxes(boxes: Vec<OffsetBox>) -> Self {
        Self { boxes }
    }

    /// Index of the first box whose offset is `>= target`, or `len()` if
    /// none qualifies. Standard lower-bound binary search; offsets are
    /// non-decreasing so this is well defined even with duplicates.
    fn lower_bound(&self, target: u32) -> usize {
        self.boxes.partition_point(|b| b.offset < target)
    }

    /// Smallest axis-aligned rectangle enclosing every glyph run whose
    /// offset falls in the half-open window `[start, end)`, skipping
    /// filler boxes (pure whitespace, no geometry). Returns `None` if the
    /// window contains no non-filler box.
    ///
    /// The window is half-open: a span `{start, end}` from the query
    /// pipeline covers the byte range `text[start..end]`, and `end` is
    /// exclusive (it's one past the last matched byte), matching how Rust
    /// string slicing already treats byte ranges.
    pub fn bbox(&self, start: u32, end: u32) -> Option<OffsetBox> {
        if end <= start {
            return None;
        }
        let i0 = self.lower_bound(start);
        let i1 = self.lower_bound(end);
        if i0 >= self.boxes.len() || i1 <= i0 {
            return None;
        }

        let mut acc: Option<OffsetBox> = None;
        for b in &self.boxes[i0..i1] {
            if b.is_filler() {
                continue;
            }
            acc = Some(match acc {
                Some(r) => r.union(b),
                None => *b,
            });
        }

        if let Some(rect) = acc {
            if rect.height() > DEFAULT_SANITY_HEIGHT {
                log::warn!(
                    "bbox({start}, {end}) resolved to a {:.1}pt tall rectangle, \
                     exceeding the {DEFAULT_SANITY_HEIGHT}pt sanity bound \
                     (extractor may have produced a bad glyph run)",
                    rect.height()
                );
            }
        }
        acc
    }
}
