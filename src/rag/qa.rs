// Synthetic question/answer generation.
//
// Every article is sent through the QA prompt; the completion should be a JSON
// array of `{question, answer}` objects. Articles whose completion fails or
// does not parse are skipped with a warning. Pairs from all articles are
// flattened in article order.

use std::path::Path;

use anyhow::Context;
use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::prompts::generate_qa_prompt;
use crate::error::ServiceError;
use crate::llm::traits::DEFAULT_TEMPERATURE;
use crate::llm::LanguageModel;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QaPair {
    pub question: String,
    pub answer: String,
}

/// Parse a completion into QA pairs, tolerating a surrounding code fence.
pub fn parse_qa_pairs(completion: &str) -> Result<Vec<QaPair>, ServiceError> {
    let body = strip_code_fence(completion.trim());
    serde_json::from_str(body).map_err(|e| ServiceError::Decode(format!("QA completion: {e}")))
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // Drop an optional language tag on the opening fence line
    let rest = rest.split_once('\n').map_or(rest, |(_, body)| body);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

/// Generate QA pairs for every article, `concurrency` requests at a time.
pub async fn generate_qa_pairs<S: AsRef<str> + Sync>(
    articles: &[S],
    model: &dyn LanguageModel,
    concurrency: usize,
) -> Vec<QaPair> {
    let pb = ProgressBar::new(articles.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("  Generating QA [{bar:30}] {pos}/{len} ({eta})")
            .expect("valid template"),
    );

    let per_article: Vec<Option<Vec<QaPair>>> = stream::iter(articles.iter().enumerate())
        .map(|(index, article)| {
            let pb = &pb;
            async move {
                let prompt = generate_qa_prompt(article.as_ref());
                let result = model
                    .complete(&prompt, DEFAULT_TEMPERATURE)
                    .await
                    .and_then(|completion| parse_qa_pairs(&completion));
                pb.inc(1);
                match result {
                    Ok(pairs) => Some(pairs),
                    Err(e) => {
                        warn!(article = index, error = %e, "Skipping article, no QA pairs");
                        None
                    }
                }
            }
        })
        .buffered(concurrency.max(1))
        .collect()
        .await;
    pb.finish_and_clear();

    let skipped = per_article.iter().filter(|r| r.is_none()).count();
    let pairs: Vec<QaPair> = per_article.into_iter().flatten().flatten().collect();

    info!(
        articles = articles.len(),
        skipped,
        pairs = pairs.len(),
        "QA generation complete"
    );

    pairs
}

pub fn save_qa_pairs(pairs: &[QaPair], path: &Path) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(pairs)?;
    std::fs::write(path, json).with_context(|| format!("Failed to write QA set to {}", path.display()))
}

pub fn load_qa_pairs(path: &Path) -> anyhow::Result<Vec<QaPair>> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read QA set from {}", path.display()))?;
    serde_json::from_str(&json).with_context(|| format!("Failed to parse QA set in {}", path.display()))
}
