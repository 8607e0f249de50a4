// Azure OpenAI embeddings client (hosted alternative to the local model).
//
// One request per batch; the response `data` entries carry an `index` and
// are re-sorted by it so vectors line up with the input texts.

use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::traits::Embedder;
use crate::error::ServiceError;
use crate::llm::rate_limiter::RateLimiter;
use crate::llm::AzureEndpoint;

pub struct AzureEmbedder {
    client: Client,
    url: String,
    deployment: String,
    rate_limiter: RateLimiter,
}

impl AzureEmbedder {
    pub fn new(endpoint: &AzureEndpoint, deployment: &str) -> Result<Self> {
        Ok(Self {
            client: endpoint.http_client()?,
            url: endpoint.deployment_url(deployment, "embeddings"),
            deployment: deployment.to_string(),
            rate_limiter: RateLimiter::default(),
        })
    }
}

#[async_trait]
impl Embedder for AzureEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f64>>, ServiceError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        self.rate_limiter.acquire().await;

        let request = EmbeddingRequest { input: texts };
        let response = self.client.post(&self.url).json(&request).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ServiceError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| ServiceError::Decode(e.to_string()))?;

        let vectors = into_ordered_vectors(parsed, texts.len())?;

        debug!(
            deployment = %self.deployment,
            count = vectors.len(),
            "Azure embeddings received"
        );

        Ok(vectors)
    }
}

/// Sort response entries by `index` and check one vector came back per input.
fn into_ordered_vectors(
    mut response: EmbeddingResponse,
    expected: usize,
) -> Result<Vec<Vec<f64>>, ServiceError> {
    if response.data.len() != expected {
        return Err(ServiceError::Decode(format!(
            "embedding response has {} vectors for {} inputs",
            response.data.len(),
            expected
        )));
    }
    response.data.sort_by_key(|d| d.index);
    Ok(response.data.into_iter().map(|d| d.embedding).collect())
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    index: usize,
    embedding: Vec<f64>,
}
