// Local sentence embeddings with all-MiniLM-L6-v2 through ONNX Runtime.
//
// Texts are tokenized (truncated to the model's 256-token window) and padded
// into one rectangular batch, run through the BERT encoder, mean-pooled over
// real tokens and L2-normalized, matching the sentence-transformers pipeline
// the model was published with.

use std::path::Path;
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Context};
use async_trait::async_trait;
use ort::session::Session;
use ort::value::Tensor;
use tokenizers::Tokenizer;
use tracing::debug;

use super::traits::Embedder;
use crate::error::ServiceError;

pub const EMBEDDING_DIM: usize = 384;

/// Longest token sequence the model accepts.
pub const MAX_SEQ_LEN: usize = 256;

/// Sentence embedder backed by a local ONNX model.
///
/// `Session::run` needs `&mut self` and inference happens on a blocking
/// thread, so the session sits behind `Arc<Mutex<_>>`.
pub struct OnnxEmbedder {
    session: Arc<Mutex<Session>>,
    tokenizer: Arc<Tokenizer>,
}

impl OnnxEmbedder {
    /// Load `model.onnx` and `tokenizer.json` from `model_dir`.
    pub fn load(model_dir: &Path) -> anyhow::Result<Self> {
        let model = model_dir.join("model.onnx");
        let tokenizer = model_dir.join("tokenizer.json");

        if let Some(missing) = [&model, &tokenizer].into_iter().find(|p| !p.exists()) {
            anyhow::bail!(
                "Embedding model file not found: {}\nRun `chunkscope download-model` to download it.",
                missing.display()
            );
        }

        let session = Session::builder()
            .context("Failed to create ONNX session builder")?
            .commit_from_file(&model)
            .with_context(|| format!("Failed to load ONNX model {}", model.display()))?;
        let tokenizer = Tokenizer::from_file(&tokenizer)
            .map_err(|e| anyhow!("Failed to load tokenizer {}: {e}", tokenizer.display()))?;

        debug!(dir = %model_dir.display(), "Loaded sentence embedding model");

        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            tokenizer: Arc::new(tokenizer),
        })
    }
}

#[async_trait]
impl Embedder for OnnxEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f64>>, ServiceError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let session = Arc::clone(&self.session);
        let tokenizer = Arc::clone(&self.tokenizer);
        let texts = texts.to_vec();

        tokio::task::spawn_blocking(move || {
            let batch = PaddedBatch::encode(&tokenizer, &texts)?;
            batch.run(&session)
        })
        .await
        .map_err(|e| ServiceError::Model(format!("embedding task panicked: {e}")))?
        .map_err(|e| ServiceError::Model(format!("{e:#}")))
    }
}

/// Token ids and attention mask for a batch, padded with zeros to the
/// longest sequence. Both are row-major `[rows, width]`.
struct PaddedBatch {
    rows: usize,
    width: usize,
    input_ids: Vec<i64>,
    attention_mask: Vec<i64>,
}

impl PaddedBatch {
    fn encode(tokenizer: &Tokenizer, texts: &[String]) -> anyhow::Result<Self> {
        let encodings = texts
            .iter()
            .map(|t| {
                tokenizer
                    .encode(t.as_str(), true)
                    .map_err(|e| anyhow!("Failed to tokenize text: {e}"))
            })
            .collect::<anyhow::Result<Vec<_>>>()?;

        let rows = encodings.len();
        let width = encodings
            .iter()
            .map(|e| e.get_ids().len().min(MAX_SEQ_LEN))
            .max()
            .unwrap_or(0);

        let mut input_ids = vec![0i64; rows * width];
        let mut attention_mask = vec![0i64; rows * width];
        for (row, enc) in encodings.iter().enumerate() {
            let offset = row * width;
            for (col, (&id, &mask)) in enc
                .get_ids()
                .iter()
                .zip(enc.get_attention_mask())
                .take(width)
                .enumerate()
            {
                input_ids[offset + col] = id as i64;
                attention_mask[offset + col] = mask as i64;
            }
        }

        Ok(Self {
            rows,
            width,
            input_ids,
            attention_mask,
        })
    }

    /// Run the encoder and pool each row into a unit-length sentence vector.
    fn run(self, session: &Mutex<Session>) -> anyhow::Result<Vec<Vec<f64>>> {
        if self.width == 0 {
            return Ok(vec![vec![0.0; EMBEDDING_DIM]; self.rows]);
        }

        let shape = [self.rows as i64, self.width as i64];
        let ids = Tensor::from_array((shape, self.input_ids))
            .context("Failed to build input_ids tensor")?;
        let mask = Tensor::from_array((shape, self.attention_mask.clone()))
            .context("Failed to build attention_mask tensor")?;
        let types = Tensor::from_array((shape, vec![0i64; self.rows * self.width]))
            .context("Failed to build token_type_ids tensor")?;

        // last_hidden_state: [rows, width, EMBEDDING_DIM]
        let hidden = {
            let mut session = session
                .lock()
                .map_err(|e| anyhow!("ONNX session lock poisoned: {e}"))?;
            let outputs = session
                .run(ort::inputs! {
                    "input_ids" => ids,
                    "attention_mask" => mask,
                    "token_type_ids" => types
                })
                .context("Embedding inference failed")?;
            let (_shape, data) = outputs[0]
                .try_extract_tensor::<f32>()
                .context("Failed to read last_hidden_state")?;
            data.to_vec()
        };

        let row_len = self.width * EMBEDDING_DIM;
        let vectors = hidden
            .chunks(row_len)
            .zip(self.attention_mask.chunks(self.width))
            .map(|(states, mask)| normalize(mean_pool(states, mask)))
            .collect();

        debug!(rows = self.rows, width = self.width, "Computed sentence embeddings");
        Ok(vectors)
    }
}

/// Average token vectors over positions where the attention mask is set.
fn mean_pool(states: &[f32], mask: &[i64]) -> Vec<f64> {
    let mut pooled = vec![0.0_f64; EMBEDDING_DIM];
    let mut tokens = 0usize;

    for (token, _) in states
        .chunks(EMBEDDING_DIM)
        .zip(mask)
        .filter(|(_, m)| **m > 0)
    {
        tokens += 1;
        for (acc, &v) in pooled.iter_mut().zip(token) {
            *acc += f64::from(v);
        }
    }

    if tokens > 0 {
        pooled.iter_mut().for_each(|v| *v /= tokens as f64);
    }
    pooled
}

/// Scale to unit length; zero vectors are returned unchanged.
fn normalize(mut v: Vec<f64>) -> Vec<f64> {
    let norm = v.iter().map(|x| x * x).sum::<f64>().sqrt();
    if norm > f64::EPSILON {
        v.iter_mut().for_each(|x| *x /= norm);
    }
    v
}
