//! End-to-end scenarios exercising `CorpusIndex` through its public API
//! with a scripted extractor, mirroring the seed suite's concrete cases:
//! a single-page PDF with a unique phrase, a multi-file search with tied
//! scores, a persistent round trip via `ReuseIndex`, and in-memory
//! `Serialize`/`Deserialize`.

use std::path::Path;

use pdfsearch::{CorpusIndex, Error, IndexOptions, PdfExtractor, TextMark};

#[derive(Clone)]
struct ScriptedExtractor {
    pages: Vec<(&'static str, Vec<TextMark>)>,
}

impl PdfExtractor for ScriptedExtractor {
    fn page_count(&mut self) -> pdfsearch::Result<u32> {
        Ok(self.pages.len() as u32)
    }

    fn extract_page(&mut self, page_num: u32) -> pdfsearch::Result<(String, Vec<TextMark>)> {
        let (text, marks) = self.pages[(page_num - 1) as usize].clone();
        Ok((text.to_string(), marks))
    }
}

fn mark(offset: u32, llx: f64, lly: f64, urx: f64, ury: f64) -> TextMark {
    TextMark { offset, llx, lly, urx, ury }
}

/// "The quick brown fox jumps" with the exact geometry from the seed
/// suite's scenario 1.
fn brown_fox_extractor(_path: &Path, _bytes: &[u8]) -> pdfsearch::Result<Box<dyn PdfExtractor>> {
    Ok(Box::new(ScriptedExtractor {
        pages: vec![(
            "The quick brown fox jumps",
            vec![
                mark(0, 10.0, 100.0, 20.0, 110.0),
                mark(4, 30.0, 100.0, 55.0, 110.0),
                mark(10, 60.0, 100.0, 90.0, 110.0),
                mark(16, 100.0, 100.0, 125.0, 110.0),
                mark(20, 135.0, 100.0, 170.0, 110.0),
            ],
        )],
    }))
}

fn extractor_with_text(text: &'static str) -> impl Fn(&Path, &[u8]) -> pdfsearch::Result<Box<dyn PdfExtractor>> {
    move |_path, _bytes| {
        Ok(Box::new(ScriptedExtractor {
            pages: vec![(text, vec![mark(0, 0.0, 0.0, 1.0, 1.0)])],
        }) as Box<dyn PdfExtractor>)
    }
}

fn write_fake_pdf(dir: &Path, name: &str, unique_bytes: &[u8]) -> std::path::PathBuf {
    let path = dir.join(name);
    let mut bytes = b"%PDF-1.4 fake ".to_vec();
    bytes.extend_from_slice(unique_bytes);
    std::fs::write(&path, bytes).unwrap();
    path
}

#[test]
fn single_page_pdf_with_unique_phrase() {
    let dir = tempfile::tempdir().unwrap();
    let pdf = write_fake_pdf(dir.path(), "a.pdf", b"1");

    let mut index = CorpusIndex::create(&[], IndexOptions::default(), brown_fox_extractor).unwrap();
    index.add_file(&pdf).unwrap();
    index.close().unwrap();

    let result = index.search("brown fox", None).unwrap();
    assert_eq!(result.matches.len(), 1);

    let page_match = &result.matches[0];
    assert_eq!(page_match.page_num, 1);
    assert_eq!(page_match.line_numbers, vec![1]);
    assert_eq!(page_match.spans.len(), 1);
    assert_eq!(page_match.spans[0].start, 10);
    assert_eq!(page_match.spans[0].end, 19);

    let rect = page_match.rects[0].unwrap();
    assert_eq!((rect.llx, rect.lly, rect.urx, rect.ury), (60.0, 100.0, 125.0, 110.0));
}

#[test]
fn multi_file_search_with_tied_scores_preserves_insertion_order() {
    let dir = tempfile::tempdir().unwrap();
    let a = write_fake_pdf(dir.path(), "a.pdf", b"A");
    let b = write_fake_pdf(dir.path(), "b.pdf", b"B");
    let c = write_fake_pdf(dir.path(), "c.pdf", b"C");

    // The factory dispatches on path so each file gets its own scripted
    // text; A and C each contain the phrase once, B doesn't, so the scores
    // tie between A and C.
    let factory_a = extractor_with_text("a red fox ran");
    let factory_b = extractor_with_text("nothing relevant here");
    let factory_c = extractor_with_text("a red fox hid");

    let mut index = CorpusIndex::create(&[], IndexOptions::default(), move |path, bytes| {
        if path.ends_with("a.pdf") {
            factory_a(path, bytes)
        } else if path.ends_with("b.pdf") {
            factory_b(path, bytes)
        } else {
            factory_c(path, bytes)
        }
    })
    .unwrap();

    index.add_file(&a).unwrap();
    index.add_file(&b).unwrap();
    index.add_file(&c).unwrap();
    index.close().unwrap();

    let result = index.search("red fox", None).unwrap();
    let files: Vec<_> = result.files();
    assert_eq!(files, vec![a.as_path(), c.as_path()]);
    assert!(result.total_matches() >= 2);
}

#[test]
fn persistent_round_trip_via_reuse_index() {
    let corpus_dir = tempfile::tempdir().unwrap();
    let index_dir = tempfile::tempdir().unwrap();
    let pdf = write_fake_pdf(corpus_dir.path(), "a.pdf", b"1");

    let options = IndexOptions { persist_dir: Some(index_dir.path().to_path_buf()), ..IndexOptions::default() };
    let mut index = CorpusIndex::create(&[], options, brown_fox_extractor).unwrap();
    index.add_file(&pdf).unwrap();
    index.close().unwrap();

    let before = index.search("brown fox", None).unwrap();

    let reopened_options = IndexOptions { persist_dir: Some(index_dir.path().to_path_buf()), ..IndexOptions::default() };
    let mut reopened = CorpusIndex::reuse_index(index_dir.path(), reopened_options, brown_fox_extractor).unwrap();
    let after = reopened.search("brown fox", None).unwrap();

    assert_eq!(before.matches.len(), after.matches.len());
    assert_eq!(before.matches[0].spans, after.matches[0].spans);
    assert_eq!(before.matches[0].page_num, after.matches[0].page_num);
}

#[test]
fn in_memory_serialize_deserialize_round_trips_search() {
    let dir = tempfile::tempdir().unwrap();
    let pdf = write_fake_pdf(dir.path(), "a.pdf", b"1");

    let mut index = CorpusIndex::create(&[], IndexOptions::default(), extractor_with_text("Type 1 font definition")).unwrap();
    index.add_file(&pdf).unwrap();
    index.close().unwrap();

    let original = index.search("Type 1", None).unwrap();

    let bytes = index.serialize().unwrap();
    let mut restored =
        CorpusIndex::deserialize(&bytes, IndexOptions::default(), extractor_with_text("Type 1 font definition")).unwrap();
    let restored_result = restored.search("Type 1", None).unwrap();

    assert_eq!(original.matches.len(), restored_result.matches.len());
    assert_eq!(original.matches[0].spans, restored_result.matches[0].spans);
}

#[test]
fn duplicate_file_is_rejected_and_maps_stay_coherent() {
    let dir = tempfile::tempdir().unwrap();
    let pdf = write_fake_pdf(dir.path(), "a.pdf", b"1");

    let mut index = CorpusIndex::create(&[], IndexOptions::default(), brown_fox_extractor).unwrap();
    index.add_file(&pdf).unwrap();
    let err = index.add_file(&pdf).unwrap_err();
    assert!(matches!(err, Error::Duplicate { .. }));
    assert_eq!(index.doc_count(), 1);
}

