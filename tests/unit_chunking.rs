// Unit tests for the chunkers: greedy density windows, sentence windows and
// fixed word windows.
//
// Covers the window bound properties, the reference document spans, and the
// boundary behaviour of each chunker on short inputs.

use chunkscope::chunking::density::{
    chunk_document, combined_densities, DensityChunker, DensityParams,
};
use chunkscope::chunking::fixed::chunk_string_with_overlap;
use chunkscope::chunking::sentences::{
    split_and_reconstitute, SentenceWindowParams, SentenceWindows,
};
use chunkscope::text::{word_tokenize, UnicodeSplitter};
use chunkscope::topics::TopicSet;
use chunkscope::ChunkError;

const DOC0: &str =
    "This is a sentence about sample text. This is a sample sentence about testing densities in text.";

fn topics() -> TopicSet {
    TopicSet::from_terms([
        ("topic1", vec!["sample", "text"]),
        ("topic2", vec!["testing", "densities"]),
    ])
    .unwrap()
}

// ============================================================
// Greedy density chunker
// ============================================================

#[test]
fn reference_document_tokenizes_to_nineteen_tokens() {
    assert_eq!(word_tokenize(DOC0).len(), 19);
}

#[test]
fn reference_document_spans() {
    let chunks = chunk_document(
        DOC0,
        &topics(),
        DensityParams::new(5, 10, 3, 2),
        &UnicodeSplitter,
        Some("doc0"),
    )
    .unwrap();

    let spans: Vec<(usize, usize)> = chunks
        .iter()
        .map(|c| (c.substring_start, c.substring_end))
        .collect();
    assert_eq!(spans, vec![(0, 7), (4, 9), (6, 13), (10, 17)]);
}

#[test]
fn window_lengths_stay_within_bounds() {
    let set = topics();
    let params = DensityParams::new(4, 9, 2, 1);
    let chunker = DensityChunker::new(&set, params).unwrap();
    let tokens = word_tokenize(&[DOC0; 4].join(" "));

    let chunks = chunker.chunk_tokens("d", &tokens).unwrap();
    assert!(!chunks.is_empty());
    for c in &chunks {
        let len = c.substring_end - c.substring_start;
        assert!(len >= 4 && len <= 9, "window {len} out of bounds");
        assert!(c.substring_start < tokens.len());
        assert_eq!(c.densities.len(), 2);
    }
}

#[test]
fn consecutive_windows_overlap_by_configured_amount() {
    let set = topics();
    let chunker = DensityChunker::new(&set, DensityParams::new(5, 10, 3, 2)).unwrap();
    let tokens = word_tokenize(&[DOC0; 3].join(" "));
    let chunks = chunker.chunk_tokens("d", &tokens).unwrap();
    for pair in chunks.windows(2) {
        assert_eq!(pair[1].substring_start, pair[0].substring_end - 3);
    }
}

#[test]
fn l2_norm_matches_densities() {
    let chunks = chunk_document(DOC0, &topics(), DensityParams::new(5, 10, 3, 2), &UnicodeSplitter, None)
        .unwrap();
    for c in &chunks {
        let expected = c.densities.iter().map(|d| d * d).sum::<f64>().sqrt();
        assert!((c.l2_norm - expected).abs() < 1e-12);
        assert!(c.densities.iter().all(|d| (0.0..=1.0).contains(d)));
    }
}

#[test]
fn combined_densities_skips_short_documents() {
    let table = combined_densities(
        &["short doc", "also short"],
        &topics(),
        DensityParams::default(),
        &UnicodeSplitter,
    )
    .unwrap();
    assert!(table.is_empty());
    assert_eq!(table.columns().len(), 7);
}

#[test]
fn overlap_equal_to_min_is_rejected() {
    let set = topics();
    assert!(matches!(
        DensityChunker::new(&set, DensityParams::new(5, 10, 5, 1)),
        Err(ChunkError::InputValidation(_))
    ));
}

// ============================================================
// Sentence windows
// ============================================================

#[test]
fn sentence_windows_cover_reference_text() {
    let chunks = split_and_reconstitute(&[DOC0], &UnicodeSplitter, SentenceWindowParams::new(1, 2, 1)).unwrap();
    let spans: Vec<(usize, usize)> = chunks.iter().map(|c| (c.start, c.end)).collect();
    assert_eq!(spans, vec![(0, 1), (0, 2), (1, 2)]);
    assert_eq!(chunks[1].text, DOC0);
}

#[test]
fn sentence_windows_one_doc_id_per_input() {
    let docs = [
        "One. Two. Three.",
        "Four. Five. Six.",
    ];
    let chunks = split_and_reconstitute(&docs, &UnicodeSplitter, SentenceWindowParams::new(1, 2, 1)).unwrap();
    let mut doc_ids: Vec<&str> = chunks.iter().map(|c| c.doc_id.as_str()).collect();
    doc_ids.dedup();
    assert_eq!(doc_ids.len(), 2);
}

#[test]
fn sentence_windows_are_restartable() {
    let windows = SentenceWindows::from_text(
        "The first one. The second one. The third one. The fourth one.",
        &UnicodeSplitter,
        SentenceWindowParams::new(2, 3, 1),
    )
    .unwrap();
    let replay = windows.restart();
    assert_eq!(replay.doc_id(), windows.doc_id());
    let first: Vec<(usize, usize)> = windows.map(|c| (c.start, c.end)).collect();
    let second: Vec<(usize, usize)> = replay.map(|c| (c.start, c.end)).collect();
    assert_eq!(first, second);
    assert_eq!(first, vec![(0, 2), (0, 3), (1, 3), (1, 4), (2, 4)]);
}

#[test]
fn sentence_window_params_validated() {
    assert!(split_and_reconstitute(&[DOC0], &UnicodeSplitter, SentenceWindowParams::new(2, 1, 1)).is_err());
}

// ============================================================
// Fixed word windows
// ============================================================

#[test]
fn fixed_windows_twelve_words() {
    let text = "one two three four five six seven eight nine ten eleven twelve";
    let chunks = chunk_string_with_overlap(text, 5, 2).unwrap();
    assert_eq!(chunks.len(), 4);
    assert_eq!(chunks[0], "one two three four five");
    assert_eq!(chunks[3], "ten eleven twelve");
}

#[test]
fn fixed_windows_share_overlap_words() {
    let text = (0..30).map(|i| i.to_string()).collect::<Vec<_>>().join(" ");
    let chunks = chunk_string_with_overlap(&text, 7, 3).unwrap();
    for pair in chunks.windows(2) {
        let prev: Vec<&str> = pair[0].split(' ').collect();
        let next: Vec<&str> = pair[1].split(' ').collect();
        if prev.len() == 7 {
            assert_eq!(&prev[4..], &next[..3]);
        }
    }
}

#[test]
fn fixed_windows_reject_bad_parameters() {
    assert!(chunk_string_with_overlap("a b c", 0, 0).is_err());
    assert!(chunk_string_with_overlap("a b c", 2, 2).is_err());
}
