// Non-overlapping chunk selection.
//
// Given many overlapping ranked candidates per document, walk each document
// from position 0: at every position take the highest-scoring candidate that
// starts there, then continue from that candidate's `end - 1` (chunks share a
// one-sentence seam). The walk ends once a chunk reaches the document's
// furthest `end`.
//
// When no candidate starts at the required position the document has a
// coverage gap. Gaps are always reported; `GapPolicy` decides whether the
// document is silently truncated there or the whole selection fails.

use std::collections::HashMap;

use tracing::{info, warn};

use crate::error::{ChunkError, Result};
use crate::topics::similarity::RankedChunk;

/// What to do when a document cannot be covered end to end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GapPolicy {
    /// Stop selecting for that document and keep what was selected so far
    #[default]
    Truncate,
    /// Fail the whole selection with `ChunkError::CoverageGap`
    Strict,
}

/// A document whose selected chunks stop short of its last sentence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverageGap {
    pub doc_id: String,
    /// The start position no candidate begins at
    pub expected_start: usize,
    /// The end of the last selected chunk (0 if none was selected)
    pub covered_to: usize,
    pub max_end: usize,
}

impl From<CoverageGap> for ChunkError {
    fn from(gap: CoverageGap) -> Self {
        ChunkError::CoverageGap {
            doc_id: gap.doc_id,
            expected_start: gap.expected_start,
            covered_to: gap.covered_to,
            max_end: gap.max_end,
        }
    }
}

/// Selected chunks for every document plus any coverage gaps found.
#[derive(Debug, Clone, Default)]
pub struct SelectionReport {
    pub chunks: Vec<RankedChunk>,
    pub gaps: Vec<CoverageGap>,
}

impl SelectionReport {
    pub fn is_complete(&self) -> bool {
        self.gaps.is_empty()
    }
}

/// Select one non-overlapping chunk sequence per document.
///
/// Documents are emitted in the order their first candidate appears in
/// `candidates`.
pub fn select_max_metric_chunks(
    candidates: &[RankedChunk],
    policy: GapPolicy,
) -> Result<SelectionReport> {
    let mut order: Vec<&str> = Vec::new();
    let mut groups: HashMap<&str, Vec<&RankedChunk>> = HashMap::new();
    for chunk in candidates {
        groups
            .entry(chunk.doc_id.as_str())
            .or_insert_with(|| {
                order.push(chunk.doc_id.as_str());
                Vec::new()
            })
            .push(chunk);
    }

    let mut report = SelectionReport::default();

    for doc_id in order {
        let mut group = groups.remove(doc_id).unwrap_or_default();
        // Stable sort: start ascending, then max_metric descending
        group.sort_by(|a, b| {
            a.start
                .cmp(&b.start)
                .then_with(|| b.max_metric.total_cmp(&a.max_metric))
        });

        match walk_document(doc_id, &group) {
            Ok(selected) => report.chunks.extend(selected),
            Err((selected, gap)) => {
                warn!(
                    doc_id = %gap.doc_id,
                    expected_start = gap.expected_start,
                    covered_to = gap.covered_to,
                    max_end = gap.max_end,
                    "No candidate chunk at required start, document truncated"
                );
                if policy == GapPolicy::Strict {
                    return Err(gap.into());
                }
                report.chunks.extend(selected);
                report.gaps.push(gap);
            }
        }
    }

    info!(
        selected = report.chunks.len(),
        candidates = candidates.len(),
        gaps = report.gaps.len(),
        "Selected non-overlapping chunks"
    );

    Ok(report)
}

type Walk = std::result::Result<Vec<RankedChunk>, (Vec<RankedChunk>, CoverageGap)>;

/// Walk one document's sorted candidates from position 0.
fn walk_document(doc_id: &str, group: &[&RankedChunk]) -> Walk {
    let max_end = group.iter().map(|c| c.end).max().unwrap_or(0);
    let mut selected = Vec::new();
    let mut current_start = 0;
    let mut covered_to = 0;

    while current_start < max_end {
        let first = group.partition_point(|c| c.start < current_start);
        // A candidate must move the walk forward unless it finishes the document
        let pick = group[first..]
            .iter()
            .take_while(|c| c.start == current_start)
            .find(|c| c.end >= max_end || c.end - 1 > current_start);

        let Some(chunk) = pick else {
            let gap = CoverageGap {
                doc_id: doc_id.to_string(),
                expected_start: current_start,
                covered_to,
                max_end,
            };
            return Err((selected, gap));
        };

        selected.push((*chunk).clone());
        covered_to = chunk.end;
        if chunk.end >= max_end {
            break;
        }
        current_start = chunk.end - 1;
    }

    Ok(selected)
}
