// Retrieval-augmented answering: fetch context from the index, then ask the
// model to answer from that context only.

use tracing::debug;

use super::index::VectorIndex;
use super::prompts::construct_prompt;
use crate::error::Result;
use crate::llm::traits::DEFAULT_TEMPERATURE;
use crate::llm::LanguageModel;

/// Number of chunks retrieved per question unless the caller says otherwise.
pub const DEFAULT_TOP_K: usize = 5;

/// Retrieve the `top_k` nearest chunk texts for a question, best first.
pub async fn get_context(question: &str, index: &dyn VectorIndex, top_k: usize) -> Result<Vec<String>> {
    let mut results = index.query(&[question.to_string()], top_k).await?;
    let hits = results.pop().unwrap_or_default();
    Ok(hits.into_iter().map(|h| h.document).collect())
}

/// An answer together with the context it was generated from.
#[derive(Debug, Clone)]
pub struct RagAnswer {
    pub answer: String,
    pub contexts: Vec<String>,
}

/// Answer `question` from the `top_k` retrieved chunks.
pub async fn ask(
    question: &str,
    model: &dyn LanguageModel,
    index: &dyn VectorIndex,
    top_k: usize,
) -> Result<RagAnswer> {
    let contexts = get_context(question, index, top_k).await?;
    let prompt = construct_prompt(&contexts.join("\n"), question);
    let answer = model.complete(&prompt, DEFAULT_TEMPERATURE).await?;

    debug!(
        contexts = contexts.len(),
        answer_chars = answer.len(),
        "Answered question"
    );

    Ok(RagAnswer { answer, contexts })
}
