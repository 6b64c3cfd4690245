//! Criterion benchmarks for indexing and phrase-span search over a
//! synthetic corpus, built entirely in-process (no fixture files) using a
//! scripted extractor so the benchmark has no PDF-parsing dependency.

use std::path::Path;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use pdfsearch::{CorpusIndex, IndexOptions, PdfExtractor, Result, TextMark};

const WORDS: &[&str] = &[
    "quick", "brown", "fox", "jumps", "over", "lazy", "dog", "system", "design", "kernel",
    "vector", "matrix", "search", "index", "phrase", "token", "stream", "render", "buffer",
    "engine",
];

fn synthetic_page_text(page_num: u32, words_per_page: usize) -> String {
    let mut text = String::with_capacity(words_per_page * 6);
    for i in 0..words_per_page {
        let word = WORDS[(page_num as usize + i) % WORDS.len()];
        text.push_str(word);
        text.push(' ');
    }
    text
}

struct SyntheticExtractor {
    pages: Vec<String>,
}

impl PdfExtractor for SyntheticExtractor {
    fn page_count(&mut self) -> Result<u32> {
        Ok(self.pages.len() as u32)
    }

    fn extract_page(&mut self, page_num: u32) -> Result<(String, Vec<TextMark>)> {
        let text = self.pages[(page_num - 1) as usize].clone();
        let mut marks = Vec::new();
        let mut offset = 0u32;
        for (i, word) in text.split_whitespace().enumerate() {
            marks.push(TextMark {
                offset,
                llx: (i * 10) as f64,
                lly: 100.0,
                urx: (i * 10 + word.len()) as f64,
                ury: 110.0,
            });
            offset += word.len() as u32 + 1;
        }
        Ok((text, marks))
    }
}

fn factory(pages_per_doc: usize, words_per_page: usize) -> impl Fn(&Path, &[u8]) -> Result<Box<dyn PdfExtractor>> {
    move |_path, _bytes| {
        let pages = (0..pages_per_doc).map(|p| synthetic_page_text(p as u32, words_per_page)).collect();
        Ok(Box::new(SyntheticExtractor { pages }) as Box<dyn PdfExtractor>)
    }
}

fn build_corpus(num_docs: usize, pages_per_doc: usize, words_per_page: usize) -> CorpusIndex {
    let mut index = CorpusIndex::create(&[], IndexOptions::default(), factory(pages_per_doc, words_per_page)).unwrap();
    for i in 0..num_docs {
        // Bytes must differ per file or the content hash collides and
        // AddFile is rejected as a duplicate.
        let bytes = format!("%PDF-1.4 synthetic corpus doc {i}").into_bytes();
        let path = format!("doc-{i}.pdf");
        index.add_reader(Path::new(&path), &mut std::io::Cursor::new(bytes), &|| false).unwrap();
    }
    index.close().unwrap();
    index
}

fn bench_indexing(c: &mut Criterion) {
    let mut group = c.benchmark_group("indexing");
    for &num_docs in &[10usize, 50, 100] {
        group.bench_with_input(BenchmarkId::from_parameter(num_docs), &num_docs, |b, &num_docs| {
            b.iter(|| black_box(build_corpus(num_docs, 5, 200)));
        });
    }
    group.finish();
}

fn bench_phrase_search(c: &mut Criterion) {
    let mut index = build_corpus(200, 10, 300);

    let mut group = c.benchmark_group("phrase_search");
    group.bench_function("two_word_phrase", |b| {
        b.iter(|| black_box(index.search("quick brown", None).unwrap()));
    });
    group.bench_function("single_term", |b| {
        b.iter(|| black_box(index.search("kernel", None).unwrap()));
    });
    group.finish();
}

criterion_group!(benches, bench_indexing, bench_phrase_search);
criterion_main!(benches);
