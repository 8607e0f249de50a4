// Azure OpenAI chat-completions client.
//
// Requests go to `{endpoint}/openai/deployments/{deployment}/chat/completions`
// with the key in the `api-key` header. A completion stopped by the content
// filter, or one with no message content, is returned as a `ServiceError` so
// callers can apply their own fallback.
//
// API docs: https://learn.microsoft.com/azure/ai-services/openai/reference

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::rate_limiter::RateLimiter;
use super::traits::LanguageModel;
use crate::error::ServiceError;

/// Connection details shared by the chat and embedding clients.
#[derive(Debug, Clone)]
pub struct AzureEndpoint {
    /// Resource URL, e.g. `https://my-resource.openai.azure.com`
    pub endpoint: String,
    pub api_key: String,
    pub api_version: String,
}

impl AzureEndpoint {
    /// URL for an operation (`chat/completions`, `embeddings`) on a deployment.
    pub fn deployment_url(&self, deployment: &str, operation: &str) -> String {
        format!(
            "{}/openai/deployments/{}/{}?api-version={}",
            self.endpoint.trim_end_matches('/'),
            deployment,
            operation,
            self.api_version
        )
    }

    /// HTTP client that sends the `api-key` header on every request.
    pub fn http_client(&self) -> Result<Client> {
        let mut headers = HeaderMap::new();
        let mut key =
            HeaderValue::from_str(&self.api_key).context("AZURE_OPENAI_API_KEY is not a valid header value")?;
        key.set_sensitive(true);
        headers.insert("api-key", key);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        Client::builder()
            .default_headers(headers)
            .build()
            .context("Failed to build Azure OpenAI HTTP client")
    }
}

/// Chat-completions client for one Azure OpenAI deployment.
pub struct AzureChatModel {
    client: Client,
    url: String,
    deployment: String,
    rate_limiter: RateLimiter,
}

impl AzureChatModel {
    pub fn new(endpoint: &AzureEndpoint, deployment: &str) -> Result<Self> {
        Ok(Self {
            client: endpoint.http_client()?,
            url: endpoint.deployment_url(deployment, "chat/completions"),
            deployment: deployment.to_string(),
            rate_limiter: RateLimiter::default(),
        })
    }
}

#[async_trait]
impl LanguageModel for AzureChatModel {
    async fn complete(&self, prompt: &str, temperature: f32) -> Result<String, ServiceError> {
        self.rate_limiter.acquire().await;

        let request = ChatRequest {
            messages: vec![ChatMessage {
                role: "system",
                content: prompt,
            }],
            temperature,
        };

        let response = self.client.post(&self.url).json(&request).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ServiceError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| ServiceError::Decode(e.to_string()))?;

        let content = extract_content(parsed)?;

        debug!(
            deployment = %self.deployment,
            prompt_chars = prompt.len(),
            completion_chars = content.len(),
            "Chat completion received"
        );

        Ok(content)
    }

    fn name(&self) -> &str {
        &self.deployment
    }
}

/// Pull the first choice's message text out of a response.
fn extract_content(response: ChatResponse) -> Result<String, ServiceError> {
    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or(ServiceError::EmptyResponse)?;

    if choice.finish_reason.as_deref() == Some("content_filter") {
        return Err(ServiceError::ContentFiltered);
    }

    match choice.message.and_then(|m| m.content) {
        Some(content) if !content.trim().is_empty() => Ok(content),
        _ => Err(ServiceError::EmptyResponse),
    }
}

// --- Chat completions request/response types ---

#[derive(Serialize)]
struct ChatRequest<'a> {
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: Option<ResponseMessage>,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn endpoint() -> AzureEndpoint {
        AzureEndpoint {
            endpoint: "https://example.openai.azure.com/".to_string(),
            api_key: "key".to_string(),
            api_version: "2023-05-15".to_string(),
        }
    }

    fn parse(json: &str) -> ChatResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_deployment_url() {
        assert_eq!(
            endpoint().deployment_url("gpt-35", "chat/completions"),
            "https://example.openai.azure.com/openai/deployments/gpt-35/chat/completions?api-version=2023-05-15"
        );
    }

    #[test]
    fn test_extract_content() {
        let response = parse(
            r#"{"choices":[{"message":{"role":"assistant","content":"sports_news"},"finish_reason":"stop"}]}"#,
        );
        assert_eq!(extract_content(response).unwrap(), "sports_news");
    }

    #[test]
    fn test_content_filter_is_an_error() {
        let response = parse(r#"{"choices":[{"message":{"role":"assistant"},"finish_reason":"content_filter"}]}"#);
        assert!(matches!(
            extract_content(response),
            Err(ServiceError::ContentFiltered)
        ));
    }

    #[test]
    fn test_missing_content_is_empty_response() {
        let response = parse(r#"{"choices":[{"message":{"role":"assistant","content":null},"finish_reason":"stop"}]}"#);
        assert!(matches!(
            extract_content(response),
            Err(ServiceError::EmptyResponse)
        ));
        assert!(matches!(
            extract_content(parse(r#"{"choices":[]}"#)),
            Err(ServiceError::EmptyResponse)
        ));
    }

    #[test]
    fn test_invalid_api_key_header_fails() {
        let mut bad = endpoint();
        bad.api_key = "bad\nkey".to_string();
        assert!(bad.http_client().is_err());
    }
}
