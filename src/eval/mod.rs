// Evaluation harness for chunking strategies.
//
// An evaluation set pairs each question with its ground-truth answer, the
// RAG answer and the retrieved contexts. Every metric scores every record;
// a failing score is recorded as missing rather than aborting the run, and
// means are taken over the scores that exist.

pub mod metrics;

use std::path::Path;

use anyhow::Context;
use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::error::{ChunkError, Result};
use crate::llm::LanguageModel;
use crate::rag::qa::QaPair;
use crate::rag::retrieval::ask;
use crate::rag::VectorIndex;

pub use metrics::{AnswerMetric, AnswerSimilarity, ContextOverlap};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvalRecord {
    pub question: String,
    pub ground_truth: String,
    pub answer: String,
    pub contexts: Vec<String>,
}

const REQUIRED_FIELDS: [&str; 4] = ["question", "ground_truth", "answer", "contexts"];

impl EvalRecord {
    /// Parse one record, naming the first missing required field.
    pub fn from_value(value: Value) -> Result<Self> {
        let Value::Object(map) = &value else {
            return Err(ChunkError::invalid("evaluation record must be a JSON object"));
        };
        if let Some(missing) = REQUIRED_FIELDS.iter().find(|f| !map.contains_key(**f)) {
            return Err(ChunkError::invalid(format!(
                "the dataset must have a '{missing}' column"
            )));
        }
        serde_json::from_value(value)
            .map_err(|e| ChunkError::invalid(format!("malformed evaluation record: {e}")))
    }
}

/// Load an evaluation set from a JSON array of records.
pub fn load_records(path: &Path) -> anyhow::Result<Vec<EvalRecord>> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read evaluation set from {}", path.display()))?;
    let values: Vec<Value> = serde_json::from_str(&json)
        .with_context(|| format!("Failed to parse evaluation set in {}", path.display()))?;
    let records = values
        .into_iter()
        .map(EvalRecord::from_value)
        .collect::<Result<Vec<_>>>()?;
    Ok(records)
}

pub fn save_records(records: &[EvalRecord], path: &Path) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(records)?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write evaluation set to {}", path.display()))
}

/// Run the RAG pipeline for every QA pair to build evaluation records.
/// Questions whose answer could not be generated are skipped.
pub async fn build_records(
    pairs: &[QaPair],
    model: &dyn LanguageModel,
    index: &dyn VectorIndex,
    top_k: usize,
) -> Vec<EvalRecord> {
    let mut records = Vec::with_capacity(pairs.len());
    for pair in pairs {
        match ask(&pair.question, model, index, top_k).await {
            Ok(answer) => records.push(EvalRecord {
                question: pair.question.clone(),
                ground_truth: pair.answer.clone(),
                answer: answer.answer,
                contexts: answer.contexts,
            }),
            Err(e) => warn!(question = %pair.question, error = %e, "Skipping question, no answer"),
        }
    }
    info!(pairs = pairs.len(), records = records.len(), "Built evaluation records");
    records
}

/// Scores for one record, one entry per metric.
#[derive(Debug, Clone, Serialize)]
pub struct RecordScores {
    pub question: String,
    pub scores: Vec<Option<f64>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EvalReport {
    pub metrics: Vec<String>,
    pub records: Vec<RecordScores>,
    /// Per-metric mean over the scores that exist; None if all failed.
    pub means: Vec<Option<f64>>,
}

/// Score every record with every metric.
pub async fn evaluate(records: &[EvalRecord], metrics: &[Box<dyn AnswerMetric>]) -> EvalReport {
    let pb = ProgressBar::new(records.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("  Evaluating [{bar:30}] {pos}/{len} ({eta})")
            .expect("valid template"),
    );

    let mut rows = Vec::with_capacity(records.len());
    for record in records {
        let mut scores = Vec::with_capacity(metrics.len());
        for metric in metrics {
            let score = match metric.score(record).await {
                Ok(score) => Some(score),
                Err(e) => {
                    warn!(metric = metric.name(), question = %record.question, error = %e, "Metric failed");
                    None
                }
            };
            scores.push(score);
        }
        rows.push(RecordScores {
            question: record.question.clone(),
            scores,
        });
        pb.inc(1);
    }
    pb.finish_and_clear();

    let means = (0..metrics.len())
        .map(|m| {
            let present: Vec<f64> = rows.iter().filter_map(|r| r.scores[m]).collect();
            (!present.is_empty()).then(|| present.iter().sum::<f64>() / present.len() as f64)
        })
        .collect();

    let report = EvalReport {
        metrics: metrics.iter().map(|m| m.name().to_string()).collect(),
        records: rows,
        means,
    };

    info!(
        records = records.len(),
        metrics = metrics.len(),
        "Evaluation complete"
    );

    report
}
