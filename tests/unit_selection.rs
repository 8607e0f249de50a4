// Unit tests for non-overlapping chunk selection.
//
// Candidates are built by hand so each test controls exactly which starts,
// ends and metrics the walk sees.

use chunkscope::chunking::select::{select_max_metric_chunks, GapPolicy};
use chunkscope::topics::similarity::RankedChunk;
use chunkscope::ChunkError;
use uuid::Uuid;

fn ranked(doc: &str, start: usize, end: usize, metric: f64) -> RankedChunk {
    RankedChunk {
        doc_id: doc.to_string(),
        chunk_id: Uuid::new_v4(),
        start,
        end,
        text: format!("{doc}[{start}..{end}]"),
        embedding: Vec::new(),
        max_metric: metric,
        max_topic: "t".to_string(),
    }
}

fn spans(chunks: &[RankedChunk]) -> Vec<(&str, usize, usize)> {
    chunks.iter().map(|c| (c.doc_id.as_str(), c.start, c.end)).collect()
}

// ============================================================
// Walk
// ============================================================

#[test]
fn walk_takes_best_at_each_start() {
    let candidates = vec![
        ranked("a", 0, 2, 0.4),
        ranked("a", 0, 3, 0.9),
        ranked("a", 1, 3, 0.5),
        ranked("a", 2, 4, 0.7),
        ranked("a", 2, 5, 0.2),
        ranked("a", 3, 5, 0.6),
    ];
    let report = select_max_metric_chunks(&candidates, GapPolicy::default()).unwrap();
    assert_eq!(spans(&report.chunks), vec![("a", 0, 3), ("a", 2, 4), ("a", 3, 5)]);
    assert!(report.is_complete());
}

#[test]
fn selected_chunks_share_one_position_seam() {
    let candidates = vec![
        ranked("a", 0, 3, 0.5),
        ranked("a", 2, 5, 0.5),
        ranked("a", 4, 6, 0.5),
    ];
    let report = select_max_metric_chunks(&candidates, GapPolicy::Truncate).unwrap();
    for pair in report.chunks.windows(2) {
        assert_eq!(pair[1].start, pair[0].end - 1);
    }
    assert_eq!(report.chunks.last().unwrap().end, 6);
}

#[test]
fn non_advancing_candidate_is_skipped() {
    // (1, 2) would restart the walk at 1 forever
    let candidates = vec![
        ranked("a", 0, 2, 0.5),
        ranked("a", 1, 2, 0.99),
        ranked("a", 1, 3, 0.1),
    ];
    let report = select_max_metric_chunks(&candidates, GapPolicy::Truncate).unwrap();
    assert_eq!(spans(&report.chunks), vec![("a", 0, 2), ("a", 1, 3)]);
}

#[test]
fn documents_keep_first_appearance_order() {
    let candidates = vec![
        ranked("z", 0, 1, 0.5),
        ranked("b", 0, 1, 0.5),
        ranked("z", 0, 1, 0.1),
    ];
    let report = select_max_metric_chunks(&candidates, GapPolicy::Truncate).unwrap();
    let docs: Vec<&str> = report.chunks.iter().map(|c| c.doc_id.as_str()).collect();
    assert_eq!(docs, vec!["z", "b"]);
}

#[test]
fn metric_ties_keep_input_order() {
    let first = ranked("a", 0, 2, 0.5);
    let second = ranked("a", 0, 2, 0.5);
    let expected = first.chunk_id;
    let report = select_max_metric_chunks(&[first, second], GapPolicy::Truncate).unwrap();
    assert_eq!(report.chunks[0].chunk_id, expected);
}

#[test]
fn empty_candidates_select_nothing() {
    let report = select_max_metric_chunks(&[], GapPolicy::Strict).unwrap();
    assert!(report.chunks.is_empty() && report.is_complete());
}

// ============================================================
// Coverage gaps
// ============================================================

#[test]
fn gap_truncates_document_and_is_reported() {
    let candidates = vec![
        ranked("a", 0, 3, 0.5),
        ranked("a", 5, 8, 0.5),
        ranked("b", 0, 2, 0.5),
    ];
    let report = select_max_metric_chunks(&candidates, GapPolicy::Truncate).unwrap();
    assert_eq!(spans(&report.chunks), vec![("a", 0, 3), ("b", 0, 2)]);
    assert_eq!(report.gaps.len(), 1);

    let gap = &report.gaps[0];
    assert_eq!(gap.doc_id, "a");
    assert_eq!(gap.expected_start, 2);
    assert_eq!(gap.covered_to, 3);
    assert_eq!(gap.max_end, 8);
}

#[test]
fn strict_policy_fails_on_gap() {
    let candidates = vec![ranked("a", 1, 3, 0.5)];
    let err = select_max_metric_chunks(&candidates, GapPolicy::Strict).unwrap_err();
    match err {
        ChunkError::CoverageGap {
            doc_id,
            expected_start,
            covered_to,
            ..
        } => {
            assert_eq!(doc_id, "a");
            assert_eq!(expected_start, 0);
            assert_eq!(covered_to, 0);
        }
        other => panic!("expected coverage gap, got {other:?}"),
    }
}
