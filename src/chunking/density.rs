// Greedy topic-density chunker and its batch orchestration.
//
// For each anchor position the chunker scans window ends from
// `start + min_substring` to `start + max_substring` in steps of `increment`,
// keeps the first end reaching the strictly greatest L2 norm, emits that
// window, and re-anchors at `best_end - overlap`. The loop stops once fewer
// than `min_substring` tokens remain past the anchor.
//
// Window ends past the end of the token sequence are scored on the clipped
// (shorter) slice, but the requested end is what gets recorded.

use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{ChunkError, Result};
use crate::text::TextSplitter;
use crate::topics::density::{DensityScorer, TopicDensity};
use crate::topics::topic::TopicSet;

use super::table::DensityTable;

/// Window-size parameters for the greedy density chunker, in tokens.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DensityParams {
    pub min_substring: usize,
    pub max_substring: usize,
    pub overlap: usize,
    pub increment: usize,
}

impl Default for DensityParams {
    fn default() -> Self {
        Self {
            min_substring: 20,
            max_substring: 50,
            overlap: 10,
            increment: 5,
        }
    }
}

impl DensityParams {
    pub fn new(min_substring: usize, max_substring: usize, overlap: usize, increment: usize) -> Self {
        Self {
            min_substring,
            max_substring,
            overlap,
            increment,
        }
    }

    /// Reject parameter combinations that would divide by zero or stall.
    pub fn validate(&self) -> Result<()> {
        if self.min_substring < 1 {
            return Err(ChunkError::invalid("min_substring must be at least 1"));
        }
        if self.max_substring < self.min_substring {
            return Err(ChunkError::invalid(format!(
                "max_substring ({}) must be >= min_substring ({})",
                self.max_substring, self.min_substring
            )));
        }
        if self.overlap >= self.min_substring {
            return Err(ChunkError::invalid(format!(
                "overlap ({}) must be less than min_substring ({})",
                self.overlap, self.min_substring
            )));
        }
        if self.increment < 1 {
            return Err(ChunkError::invalid("increment must be at least 1"));
        }
        Ok(())
    }
}

/// One scored window proposed by the density chunker.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateChunk {
    pub doc_id: String,
    pub chunk_id: Uuid,
    pub substring_start: usize,
    pub substring_end: usize,
    pub l2_norm: f64,
    /// Per-topic densities, in topic-set order
    pub densities: Vec<f64>,
}

/// A window end together with its score, the unit the greedy scan compares.
struct ScoredEnd {
    end: usize,
    score: TopicDensity,
}

/// Greedy density chunker bound to one topic set and parameter set.
pub struct DensityChunker<'a> {
    scorer: DensityScorer<'a>,
    params: DensityParams,
}

impl<'a> DensityChunker<'a> {
    pub fn new(topics: &'a TopicSet, params: DensityParams) -> Result<Self> {
        params.validate()?;
        Ok(Self {
            scorer: DensityScorer::new(topics),
            params,
        })
    }

    /// Chunk one document's token sequence.
    pub fn chunk_tokens<S: AsRef<str>>(&self, doc_id: &str, tokens: &[S]) -> Result<Vec<CandidateChunk>> {
        let DensityParams {
            min_substring,
            max_substring,
            overlap,
            increment,
        } = self.params;
        let total = tokens.len();
        let mut chunks = Vec::new();
        let mut current_start = 0;

        while current_start + min_substring < total {
            let ends = (current_start + min_substring..=current_start + max_substring).step_by(increment);
            let Some(best) = self.best_window(tokens, current_start, ends)? else {
                break;
            };

            debug!(
                doc_id,
                start = current_start,
                end = best.end,
                l2_norm = best.score.l2_norm,
                "Selected densest window"
            );

            chunks.push(CandidateChunk {
                doc_id: doc_id.to_string(),
                chunk_id: Uuid::new_v4(),
                substring_start: current_start,
                substring_end: best.end,
                l2_norm: best.score.l2_norm,
                densities: best.score.densities,
            });

            current_start = best.end - overlap;
        }

        Ok(chunks)
    }

    /// Score every candidate end and keep the first one with the strictly
    /// greatest L2 norm.
    fn best_window<S: AsRef<str>>(
        &self,
        tokens: &[S],
        start: usize,
        ends: impl Iterator<Item = usize>,
    ) -> Result<Option<ScoredEnd>> {
        let mut best: Option<ScoredEnd> = None;
        for end in ends {
            let window = &tokens[start..end.min(tokens.len())];
            let score = self.scorer.score(window)?;
            let improves = match &best {
                Some(current) => score.l2_norm > current.score.l2_norm,
                None => true,
            };
            if improves {
                best = Some(ScoredEnd { end, score });
            }
        }
        Ok(best)
    }
}

/// Chunk a single raw document by topic density.
///
/// A fresh document id is generated when `doc_id` is None.
pub fn chunk_document(
    text: &str,
    topics: &TopicSet,
    params: DensityParams,
    splitter: &dyn TextSplitter,
    doc_id: Option<&str>,
) -> Result<Vec<CandidateChunk>> {
    let doc_id = doc_id
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    info!(doc_id = %doc_id, "Calculating topic densities for document");

    let tokens = splitter.words(text);
    DensityChunker::new(topics, params)?.chunk_tokens(&doc_id, &tokens)
}

/// A document to chunk. Immutable once created.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub doc_id: String,
    pub text: String,
}

impl Document {
    /// A document under a fresh v4 UUID.
    pub fn new(text: impl Into<String>) -> Self {
        Self::with_id(Uuid::new_v4().to_string(), text)
    }

    pub fn with_id(doc_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            doc_id: doc_id.into(),
            text: text.into(),
        }
    }
}

/// Chunk every document and flatten the candidates into one table.
///
/// Each document gets a fresh id. Rows appear in document order, then window
/// order within each document.
pub fn combined_densities<S: AsRef<str>>(
    docs: &[S],
    topics: &TopicSet,
    params: DensityParams,
    splitter: &dyn TextSplitter,
) -> Result<DensityTable> {
    let documents: Vec<Document> = docs.iter().map(|d| Document::new(d.as_ref())).collect();
    document_densities(&documents, topics, params, splitter)
}

/// Like [`combined_densities`] but keeps the caller's document ids.
pub fn document_densities(
    documents: &[Document],
    topics: &TopicSet,
    params: DensityParams,
    splitter: &dyn TextSplitter,
) -> Result<DensityTable> {
    info!(docs = documents.len(), "Calculating topic densities for documents");

    let chunker = DensityChunker::new(topics, params)?;
    let mut table = DensityTable::new(topics);

    let pb = ProgressBar::new(documents.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("  Processing docs [{bar:30}] {pos}/{len} ({eta})")
            .expect("valid template"),
    );

    for doc in documents {
        let tokens = splitter.words(&doc.text);
        table.extend(chunker.chunk_tokens(&doc.doc_id, &tokens)?);
        pb.inc(1);
    }
    pb.finish_and_clear();

    info!(rows = table.len(), "Combined topic densities into a table");
    Ok(table)
}
