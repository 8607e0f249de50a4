use std::env;
use std::path::PathBuf;

use anyhow::Result;

use crate::llm::AzureEndpoint;

/// Which embedding backend to use.
#[derive(Debug, Clone, PartialEq)]
pub enum EmbedderBackend {
    /// Local all-MiniLM-L6-v2 through ONNX Runtime (default). No API key needed.
    Onnx,
    /// Azure OpenAI embeddings deployment. Requires the Azure settings.
    Azure,
}

pub const DEFAULT_API_VERSION: &str = "2023-05-15";
pub const DEFAULT_EMBEDDING_DEPLOYMENT: &str = "text-embedding-ada-002";

/// Central configuration loaded from environment variables.
///
/// Secrets come from env vars only. The .env file is loaded at startup via
/// dotenvy. Algorithm parameters are CLI flags, not configuration.
pub struct Config {
    pub azure_endpoint: String,
    pub azure_api_key: String,
    pub api_version: String,
    /// Chat deployment used for topic labelling
    pub labelling_model: String,
    /// Chat deployment used for QA generation and answering
    pub gen_step_model: String,
    /// Azure embeddings deployment
    pub embedding_deployment: String,
    pub embedder_backend: EmbedderBackend,
    /// Directory holding the local embedding model
    pub model_dir: PathBuf,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Nothing is required at load time; each command checks what it needs
    /// with the `require_*` methods.
    pub fn load() -> Result<Self> {
        let embedder_backend = match env::var("CHUNKSCOPE_EMBEDDER").as_deref() {
            Ok("azure") => EmbedderBackend::Azure,
            Ok("onnx") | Err(_) => EmbedderBackend::Onnx,
            Ok(other) => anyhow::bail!(
                "Unknown CHUNKSCOPE_EMBEDDER value '{other}' (expected 'onnx' or 'azure')"
            ),
        };

        let model_dir = env::var("CHUNKSCOPE_MODEL_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| crate::embedding::download::default_model_dir());

        Ok(Self {
            azure_endpoint: env::var("AZURE_OPENAI_ENDPOINT").unwrap_or_default(),
            azure_api_key: env::var("AZURE_OPENAI_API_KEY").unwrap_or_default(),
            api_version: env::var("OPENAI_API_VERSION")
                .unwrap_or_else(|_| DEFAULT_API_VERSION.to_string()),
            labelling_model: env::var("LABELLING_MODEL").unwrap_or_default(),
            gen_step_model: env::var("GEN_STEP_MODEL").unwrap_or_default(),
            embedding_deployment: env::var("AZURE_OPENAI_EMBEDDING_MODEL")
                .unwrap_or_else(|_| DEFAULT_EMBEDDING_DEPLOYMENT.to_string()),
            embedder_backend,
            model_dir,
        })
    }

    /// Check that the Azure OpenAI endpoint and key are configured.
    pub fn require_azure(&self) -> Result<AzureEndpoint> {
        if self.azure_endpoint.is_empty() || self.azure_api_key.is_empty() {
            anyhow::bail!(
                "AZURE_OPENAI_ENDPOINT and AZURE_OPENAI_API_KEY must be set.\n\
                 Add them to your .env file. See .env.example for the required variables."
            );
        }
        Ok(AzureEndpoint {
            endpoint: self.azure_endpoint.clone(),
            api_key: self.azure_api_key.clone(),
            api_version: self.api_version.clone(),
        })
    }

    /// Check the labelling deployment is configured and return its name.
    pub fn require_labelling_model(&self) -> Result<&str> {
        if self.labelling_model.is_empty() {
            anyhow::bail!("LABELLING_MODEL not set. Add the chat deployment name to your .env file.");
        }
        Ok(&self.labelling_model)
    }

    /// Check the generation deployment is configured and return its name.
    pub fn require_gen_step_model(&self) -> Result<&str> {
        if self.gen_step_model.is_empty() {
            anyhow::bail!("GEN_STEP_MODEL not set. Add the chat deployment name to your .env file.");
        }
        Ok(&self.gen_step_model)
    }

    /// Validate that the chosen embedding backend has what it needs.
    pub fn require_embedder(&self) -> Result<()> {
        match self.embedder_backend {
            EmbedderBackend::Onnx => {
                if !crate::embedding::download::embedding_files_present(&self.model_dir) {
                    anyhow::bail!(
                        "Embedding model files not found in {}\n\
                         Run `chunkscope download-model` to download them.\n\
                         Or set CHUNKSCOPE_EMBEDDER=azure to use Azure OpenAI embeddings instead.",
                        self.model_dir.display()
                    );
                }
                Ok(())
            }
            EmbedderBackend::Azure => self.require_azure().map(|_| ()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Config {
        Config {
            azure_endpoint: String::new(),
            azure_api_key: String::new(),
            api_version: DEFAULT_API_VERSION.to_string(),
            labelling_model: String::new(),
            gen_step_model: "gpt-4".to_string(),
            embedding_deployment: DEFAULT_EMBEDDING_DEPLOYMENT.to_string(),
            embedder_backend: EmbedderBackend::Onnx,
            model_dir: std::env::temp_dir().join("chunkscope-config-test-none"),
        }
    }

    #[test]
    fn test_require_azure_needs_endpoint_and_key() {
        let mut cfg = config();
        assert!(cfg.require_azure().is_err());
        cfg.azure_endpoint = "https://r.openai.azure.com".to_string();
        cfg.azure_api_key = "k".to_string();
        let endpoint = cfg.require_azure().unwrap();
        assert_eq!(endpoint.api_version, "2023-05-15");
    }

    #[test]
    fn test_require_models() {
        let cfg = config();
        assert!(cfg.require_labelling_model().is_err());
        assert_eq!(cfg.require_gen_step_model().unwrap(), "gpt-4");
    }

    #[test]
    fn test_onnx_backend_requires_model_files() {
        let err = config().require_embedder().unwrap_err();
        assert!(err.to_string().contains("download-model"));
    }

    #[test]
    fn test_azure_backend_requires_credentials() {
        let mut cfg = config();
        cfg.embedder_backend = EmbedderBackend::Azure;
        assert!(cfg.require_embedder().is_err());
    }
}
