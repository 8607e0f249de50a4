// LanguageModel trait: the hosted text-completion collaborator.
//
// Topic labelling, QA generation and answer generation all go through this
// one method. Implementations return `ServiceError` for filtered or empty
// completions; callers decide the fallback.

use async_trait::async_trait;

use crate::error::ServiceError;

/// Sampling temperature used when a caller has no reason to pick another.
pub const DEFAULT_TEMPERATURE: f32 = 0.9;

#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Send `prompt` as a single system message and return the completion text.
    async fn complete(&self, prompt: &str, temperature: f32) -> Result<String, ServiceError>;

    /// Identifier shown in logs (deployment or model name).
    fn name(&self) -> &str;
}
