//! Property-based checks for core invariants: BBox monotonicity and
//! filler-blindness, line numbering, and the text index's export/import
//! round trip.

use proptest::prelude::*;

use pdfsearch::{InvertedTextIndex, OffsetBox, PagePositions, TextIndex};

fn arb_word() -> impl Strategy<Value = String> {
    "[a-z]{1,8}"
}

fn arb_text() -> impl Strategy<Value = String> {
    proptest::collection::vec(arb_word(), 0..20).prop_map(|words| words.join(" "))
}

proptest! {
    #[test]
    fn line_number_points_into_a_line_containing_the_offset(text in arb_text(), raw_offset in 0u32..500) {
        if text.is_empty() {
            return Ok(());
        }
        let offset = raw_offset % (text.len() as u32);
        let line_num = pdfsearch::query::line_number(&text, offset);
        let lines: Vec<&str> = text.split('\n').collect();
        prop_assert!(line_num as usize >= 1 && line_num as usize <= lines.len());
    }

    #[test]
    fn bbox_monotonicity_holds_for_arbitrary_nonoverlapping_windows(
        count in 1usize..12,
        s1 in 0u32..50, grow1 in 0u32..20, grow2 in 0u32..20,
    ) {
        let mut positions = PagePositions::new();
        for i in 0..count {
            positions.append(OffsetBox::new(i as u32, i as f32, 0.0, i as f32 + 1.0, 10.0));
        }

        let e1 = s1 + grow1 + grow2 + 1;
        let s2 = s1 + grow1;
        let e2 = s2 + 1;
        if e1 as usize > count || e2 > e1 {
            return Ok(());
        }

        let outer = positions.bbox(s1, e1);
        let inner = positions.bbox(s2, e2);
        if let (Some(outer), Some(inner)) = (outer, inner) {
            prop_assert!(outer.contains(&inner));
        }
    }

    #[test]
    fn bbox_ignores_interspersed_fillers(count in 1usize..10) {
        let mut with_fillers = PagePositions::new();
        let mut without_fillers = PagePositions::new();
        for i in 0..count {
            let offset = (i * 2) as u32;
            with_fillers.append(OffsetBox::new(offset, i as f32, 0.0, i as f32 + 1.0, 10.0));
            with_fillers.append(OffsetBox::filler(offset + 1));
            without_fillers.append(OffsetBox::new(i as u32, i as f32, 0.0, i as f32 + 1.0, 10.0));
        }
        let end_with = (count * 2) as u32;
        let end_without = count as u32;
        prop_assert_eq!(with_fillers.bbox(0, end_with), without_fillers.bbox(0, end_without));
    }

    #[test]
    fn text_index_export_import_preserves_doc_count(
        docs in proptest::collection::vec(arb_text().prop_filter("non-empty", |t| !t.trim().is_empty()), 1..8)
    ) {
        let mut index = InvertedTextIndex::new();
        for (i, text) in docs.iter().enumerate() {
            let mut fields = std::collections::HashMap::new();
            fields.insert("text".to_string(), text.clone());
            index.index(&format!("{i:04X}.0"), &fields).unwrap();
        }

        let bytes = index.export_bytes();
        let mut restored = InvertedTextIndex::new();
        restored.import_bytes(&bytes).unwrap();

        prop_assert_eq!(index.doc_count(), restored.doc_count());
    }
}
