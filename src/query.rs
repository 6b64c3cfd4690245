//! The query pipeline's phrase-span scoring and the result types it
//! produces.
//!
//! Phrase scoring is pure: given the query's token sequence and one hit's
//! `term -> [Location]` map, it returns the best-scoring spans with no
//! knowledge of files, pages, or rectangles. [`crate::corpus_index`] is
//! what wires this into `DocPositions::bbox` and line-number resolution.

use std::collections::HashMap;
use std::time::Duration;

use crate::offset_box::OffsetBox;
use crate::text_index::Location;

/// One matched phrase run: its byte span in the page text and the count
/// of consecutive query tokens it accounts for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: u32,
    pub end: u32,
    pub score: u32,
}

/// Computes the best-scoring phrase spans for a query against one hit's
/// locations.
///
/// `query_tokens` is the analyzed query term sequence, duplicates
/// preserved, in query order. `locations` maps term -> every location the
/// term occurred at within the matched field.
pub fn phrase_spans(query_tokens: &[String], locations: &HashMap<String, Vec<Location>>) -> Vec<Span> {
    if query_tokens.is_empty() {
        return Vec::new();
    }

    // positions_by_token[i]: pos -> location, for query_tokens[i]. When a
    // term occupies the same pos more than once (shouldn't happen for a
    // single field, but the map is built defensively), the last location
    // in indexing order wins: remember the most recent occurrence for
    // that position.
    let positions_by_token: Vec<HashMap<u32, Location>> = query_tokens
        .iter()
        .map(|term| {
            let mut by_pos = HashMap::new();
            if let Some(locs) = locations.get(term) {
                for loc in locs {
                    by_pos.insert(loc.pos, *loc);
                }
            }
            by_pos
        })
        .collect();

    let mut starts: Vec<i64> = Vec::new();
    for (i, by_pos) in positions_by_token.iter().enumerate() {
        for &pos in by_pos.keys() {
            let start = pos as i64 - i as i64;
            if start >= 0 {
                starts.push(start);
            }
        }
    }
    starts.sort_unstable();
    starts.dedup();

    struct Phrase {
        start_byte: u32,
        end_byte: u32,
        score: u32,
    }

    let mut phrases = Vec::new();
    for start in starts {
        let mut score = 0u32;
        let mut first_start: Option<u32> = None;
        let mut last_end: Option<u32> = None;

        for (i, by_pos) in positions_by_token.iter().enumerate() {
            let candidate_pos = start + i as i64;
            if candidate_pos < 0 {
                continue;
            }
            if let Some(loc) = by_pos.get(&(candidate_pos as u32)) {
                score += 1;
                first_start.get_or_insert(loc.start);
                last_end = Some(loc.end);
            }
        }

        if score > 0 {
            phrases.push(Phrase {
                start_byte: first_start.unwrap(),
                end_byte: last_end.unwrap(),
                score,
            });
        }
    }

    let Some(best_score) = phrases.iter().map(|p| p.score).max() else {
        return Vec::new();
    };

    phrases
        .into_iter()
        .filter(|p| p.score == best_score)
        .map(|p| Span {
            start: p.start_byte,
            end: p.end_byte,
            score: p.score,
        })
        .collect()
}

/// One page's resolved matches.
#[derive(Debug, Clone)]
pub struct PageMatch {
    pub in_path: std::path::PathBuf,
    pub page_num: u32,
    pub line_numbers: Vec<u32>,
    pub lines: Vec<String>,
    pub spans: Vec<Span>,
    pub rects: Vec<Option<OffsetBox>>,
    pub raw_score: f64,
}

/// The result of a [`crate::corpus_index::CorpusIndex::search`] call.
#[derive(Debug, Clone)]
pub struct PdfMatchSet {
    pub total: u64,
    pub duration: Duration,
    pub matches: Vec<PageMatch>,
}

impl PdfMatchSet {
    /// Keeps only the spans whose score equals the global best score
    /// across the whole result set, and drops any `PageMatch` left with no
    /// spans.
    pub fn best(mut self) -> Self {
        let best_score = self
            .matches
            .iter()
            .flat_map(|m| m.spans.iter())
            .map(|s| s.score)
            .max();

        let Some(best_score) = best_score else {
            self.matches.clear();
            return self;
        };

        for m in &mut self.matches {
            let mut kept_spans = Vec::new();
            let mut kept_rects = Vec::new();
            let mut kept_lines = Vec::new();
            let mut kept_line_nums = Vec::new();
            for (i, span) in m.spans.iter().enumerate() {
                if span.score == best_score {
                    kept_spans.push(*span);
                    kept_rects.push(m.rects.get(i).copied().flatten());
                    if let Some(line) = m.lines.get(i) {
                        kept_lines.push(line.clone());
                    }
                    if let Some(&num) = m.line_numbers.get(i) {
                        kept_line_nums.push(num);
                    }
                }
            }
            m.spans = kept_spans;
            m.rects = kept_rects;
            m.lines = kept_lines;
            m.line_numbers = kept_line_nums;
        }

        self.matches.retain(|m| !m.spans.is_empty());
        self
    }

    pub fn files(&self) -> Vec<&std::path::Path> {
        let mut seen = Vec::new();
        for m in &self.matches {
            let path = m.in_path.as_path();
            if !seen.contains(&path) {
                seen.push(path);
            }
        }
        seen
    }

    pub fn total_matches(&self) -> usize {
        self.matches.iter().map(|m| m.spans.len()).sum()
    }
}

/// 1-based line number of the byte offset `pos` within `text`: the
/// index of the first newline strictly greater than
/// `pos`, i.e. `pos` falls on the line after the last newline at or before it.
pub fn line_number(text: &str, pos: u32) -> u32 {
    let newline_offsets: Vec<u32> = text
        .bytes()
        .enumerate()
        .filter(|&(_, b)| b == b'\n')
        .map(|(i, _)| i as u32)
        .collect();

    let line_idx = newline_offsets.partition_point(|&offset| offset <= pos);
    (line_idx + 1) as u32
}

/// The full line of text containing byte offset `pos`.
pub fn line_at(text: &str, pos: u32) -> String {
    let pos = (pos as usize).min(text.len());
    let start = text[..pos].rfind('\n').map(|i| i + 1).unwrap_or(0);
    let end = text[pos.min(text.len())..]
        .find('\n')
        .map(|i| pos + i)
        .unwrap_or(text.len());
    text[start..end].to_string()
}
