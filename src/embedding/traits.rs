// Embedder trait: the embedding-model collaborator.
//
// Text in, one fixed-dimension vector out per text, same order. The default
// implementation runs all-MiniLM-L6-v2 locally through ONNX Runtime; the
// Azure OpenAI deployment is the hosted alternative.

use async_trait::async_trait;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::debug;

use crate::error::ServiceError;

#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a batch of texts, returning vectors in input order.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f64>>, ServiceError>;
}

/// Embed `texts` in consecutive batches of at most `batch_size`.
///
/// Batches run one after another so output order always matches input order.
pub async fn embed_in_batches(
    embedder: &dyn Embedder,
    texts: &[String],
    batch_size: usize,
) -> Result<Vec<Vec<f64>>, ServiceError> {
    if texts.is_empty() {
        return Ok(Vec::new());
    }

    let batch_size = batch_size.max(1);
    let pb = ProgressBar::new(texts.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("  Embedding [{bar:30}] {pos}/{len} ({eta})")
            .expect("valid template"),
    );

    let mut embeddings = Vec::with_capacity(texts.len());
    for batch in texts.chunks(batch_size) {
        let vectors = embedder.embed(batch).await?;
        if vectors.len() != batch.len() {
            return Err(ServiceError::Decode(format!(
                "embedder returned {} vectors for {} texts",
                vectors.len(),
                batch.len()
            )));
        }
        embeddings.extend(vectors);
        pb.inc(batch.len() as u64);
    }
    pb.finish_and_clear();

    debug!(
        texts = texts.len(),
        batch_size, "Embedded texts in batches"
    );

    Ok(embeddings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Embeds each text as [len, call_number].
    struct CountingEmbedder {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Embedder for CountingEmbedder {
        async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f64>>, ServiceError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) as f64;
            Ok(texts.iter().map(|t| vec![t.len() as f64, call]).collect())
        }
    }

    struct ShortEmbedder;

    #[async_trait]
    impl Embedder for ShortEmbedder {
        async fn embed(&self, _texts: &[String]) -> Result<Vec<Vec<f64>>, ServiceError> {
            Ok(vec![vec![1.0]])
        }
    }

    #[tokio::test]
    async fn test_batches_preserve_order() {
        let embedder = CountingEmbedder {
            calls: AtomicUsize::new(0),
        };
        let texts: Vec<String> = ["a", "bb", "ccc", "dddd", "eeeee"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        let vectors = embed_in_batches(&embedder, &texts, 2).await.unwrap();
        let lens: Vec<f64> = vectors.iter().map(|v| v[0]).collect();
        assert_eq!(lens, vec![1.0, 2.0, 3.0, 4.0, 5.0]);
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 3);
        assert_eq!(vectors[4][1], 2.0);
    }

    #[tokio::test]
    async fn test_empty_input_makes_no_calls() {
        let embedder = CountingEmbedder {
            calls: AtomicUsize::new(0),
        };
        let vectors = embed_in_batches(&embedder, &[], 10).await.unwrap();
        assert!(vectors.is_empty());
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_count_mismatch_is_an_error() {
        let texts = vec!["a".to_string(), "b".to_string()];
        let result = embed_in_batches(&ShortEmbedder, &texts, 5).await;
        assert!(matches!(result, Err(ServiceError::Decode(_))));
    }
}
