// Answer-quality metrics.
//
// Each metric scores one evaluation record in [0, 1] (similarity may dip
// below 0 for opposed embeddings). Metrics may call external models and are
// allowed to fail; the harness records a failure as a missing score.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;

use super::EvalRecord;
use crate::embedding::traits::Embedder;
use crate::error::{ChunkError, Result};
use crate::topics::similarity::cosine_similarity;

#[async_trait]
pub trait AnswerMetric: Send + Sync {
    /// Column name in reports.
    fn name(&self) -> &str;

    async fn score(&self, record: &EvalRecord) -> Result<f64>;
}

/// Cosine similarity between the embeddings of the answer and the ground truth.
pub struct AnswerSimilarity {
    embedder: Arc<dyn Embedder>,
}

impl AnswerSimilarity {
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self { embedder }
    }
}

#[async_trait]
impl AnswerMetric for AnswerSimilarity {
    fn name(&self) -> &str {
        "answer_similarity"
    }

    async fn score(&self, record: &EvalRecord) -> Result<f64> {
        let texts = vec![record.answer.clone(), record.ground_truth.clone()];
        let vectors = self.embedder.embed(&texts).await?;
        match vectors.as_slice() {
            [answer, truth] => Ok(cosine_similarity(answer, truth)),
            _ => Err(ChunkError::invalid(format!(
                "expected 2 embeddings, got {}",
                vectors.len()
            ))),
        }
    }
}

/// Fraction of distinct ground-truth words that appear in the retrieved
/// contexts. Case-insensitive; punctuation is ignored.
pub struct ContextOverlap;

fn word_set(text: &str) -> HashSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect()
}

#[async_trait]
impl AnswerMetric for ContextOverlap {
    fn name(&self) -> &str {
        "context_overlap"
    }

    async fn score(&self, record: &EvalRecord) -> Result<f64> {
        let truth = word_set(&record.ground_truth);
        if truth.is_empty() {
            return Err(ChunkError::invalid("ground truth has no words"));
        }
        let context = word_set(&record.contexts.join(" "));
        let found = truth.iter().filter(|w| context.contains(*w)).count();
        Ok(found as f64 / truth.len() as f64)
    }
}
