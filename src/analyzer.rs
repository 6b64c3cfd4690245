//! The English analyzer shared by indexing and querying: ASCII lowercase,
//! stop-word removal, Porter stemming, token boundaries at
//! Unicode word breaks. Both sides of the query path run the *same*
//! function, which is what makes position-based phrase scoring line up —
//! swapping analyzers between indexing and query time is unsupported.

use std::collections::HashSet;
use std::sync::LazyLock;

use rust_stemmers::{Algorithm, Stemmer};
use unicode_segmentation::UnicodeSegmentation;

/// One analyzed token: its stemmed, lowercased term and the byte span of
/// the original word it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub term: String,
    pub start: u32,
    pub end: u32,
}

static STOP_WORDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "a", "an", "and", "are", "as", "at", "be", "by", "for", "from", "has", "he", "in", "is",
        "it", "its", "of", "on", "that", "the", "to", "was", "were", "will", "with", "this",
        "but", "or", "not", "no", "so", "if", "than", "then", "there", "their", "they", "them",
        "we", "you", "your", "i", "do", "does", "did", "have", "had", "been", "being", "can",
        "could", "should", "would", "may", "might", "must", "shall", "about", "above", "after",
        "again", "all", "am", "any", "because", "before", "below", "between", "both", "each",
        "few", "further", "here", "how", "into", "more", "most", "other", "our", "out", "over",
        "own", "same", "some", "such", "through", "too", "under", "until", "up", "very", "what",
        "when", "where", "which", "while", "who", "whom", "why",
    ]
    .into_iter()
    .collect()
});

fn stemmer() -> Stemmer {
    Stemmer::create(Algorithm::English)
}

/// Tokenizes and analyzes `text`, returning tokens in order with byte
/// offsets into the original (unanalyzed) text. Stop words are dropped
/// entirely before positions are assigned — `Token` position in the
/// returned vec is the 1-based token position referenced elsewhere as
/// `pos`.
pub fn analyze(text: &str) -> Vec<Token> {
    let stemmer = stemmer();
    let mut tokens = Vec::new();

    for (start, word) in text.split_word_bound_indices() {
        if !word.chars().any(|c| c.is_alphanumeric()) {
            continue;
        }
        let lower = word.to_ascii_lowercase();
        if STOP_WORDS.contains(lower.as_str()) {
            continue;
        }
        let stemmed = stemmer.stem(&lower).into_owned();
        if stemmed.is_empty() {
            continue;
        }
        tokens.push(Token {
            term: stemmed,
            start: start as u32,
            end: (start + word.len()) as u32,
        });
    }

    tokens
}

/// Tokenizes a query string into its term sequence, duplicates preserved,
/// in query order. Position/offset information is dropped — only the term
/// sequence matters for phrase scoring.
pub fn analyze_query(text: &str) -> Vec<String> {
    analyze(text).into_iter().map(|t| t.term).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowercases_and_strips_punctuation() {
        let tokens = analyze("The Quick, Brown Fox!");
        let terms: Vec<&str> = tokens.iter().map(|t| t.term.as_str()).collect();
        assert_eq!(terms, vec!["quick", "brown", "fox"]);
    }

    #[test]
    fn stop_words_are_removed() {
        let tokens = analyze("the fox and the hound");
        let terms: Vec<&str> = tokens.iter().map(|t| t.term.as_str()).collect();
        assert_eq!(terms, vec!["fox", "hound"]);
    }

    #[test]
    fn stemming_normalizes_related_forms() {
        let running = analyze("running runs ran");
        assert_eq!(running[0].term, running[1].term);
    }

    #[test]
    fn offsets_point_back_into_source_text() {
        let tokens = analyze("brown fox");
        assert_eq!(&"brown fox"[tokens[0].start as usize..tokens[0].end as usize], "brown");
        assert_eq!(&"brown fox"[tokens[1].start as usize..tokens[1].end as usize], "fox");
    }

    #[test]
    fn query_tokenization_preserves_duplicates_and_order() {
        let terms = analyze_query("fox fox jumps");
        assert_eq!(terms, vec!["fox".to_string(), "fox".to_string(), "jump".to_string()]);
    }
}
