// Embedding similarity ranking: assign every chunk its best-matching topic.
//
// Chunk texts are embedded in batches, compared against each topic vector by
// cosine similarity, and reduced to the winning (max_metric, max_topic) pair.
// The per-topic similarities are not kept.

use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::chunking::sentences::SentenceChunk;
use crate::embedding::traits::{embed_in_batches, Embedder};
use crate::error::{ChunkError, Result};

use super::topic::TopicSet;

/// Default number of texts per embedding request.
pub const DEFAULT_EMBED_BATCH: usize = 250;

/// A sentence-window chunk with its embedding and best topic.
#[derive(Debug, Clone, Serialize)]
pub struct RankedChunk {
    pub doc_id: String,
    pub chunk_id: Uuid,
    pub start: usize,
    pub end: usize,
    pub text: String,
    #[serde(skip)]
    pub embedding: Vec<f64>,
    pub max_metric: f64,
    pub max_topic: String,
}

/// Cosine similarity in [-1, 1]. Mismatched, empty or zero vectors give 0.0.
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f64 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let mag_a: f64 = a.iter().map(|x| x * x).sum::<f64>().sqrt();
    let mag_b: f64 = b.iter().map(|x| x * x).sum::<f64>().sqrt();

    let denom = mag_a * mag_b;
    if denom < f64::EPSILON {
        0.0
    } else {
        dot / denom
    }
}

/// Best topic for one embedding: `(max similarity, topic index)`.
///
/// The first topic reaching the maximum wins ties. Returns None for an empty
/// topic list.
pub fn best_topic(embedding: &[f64], topic_vectors: &[&[f64]]) -> Option<(f64, usize)> {
    let mut best: Option<(f64, usize)> = None;
    for (idx, vector) in topic_vectors.iter().enumerate() {
        let sim = cosine_similarity(embedding, vector);
        match best {
            Some((score, _)) if sim <= score => {}
            _ => best = Some((sim, idx)),
        }
    }
    best
}

/// Rank already-embedded chunks against the topic set.
pub fn assign_topics(
    chunks: Vec<SentenceChunk>,
    embeddings: Vec<Vec<f64>>,
    topics: &TopicSet,
) -> Result<Vec<RankedChunk>> {
    if chunks.len() != embeddings.len() {
        return Err(ChunkError::invalid(format!(
            "got {} embeddings for {} chunks",
            embeddings.len(),
            chunks.len()
        )));
    }
    if topics.is_empty() {
        return Err(ChunkError::invalid("topic set is empty"));
    }

    let vectors = topics.vectors()?;
    let names: Vec<&str> = topics.names().collect();

    let ranked = chunks
        .into_iter()
        .zip(embeddings)
        .map(|(chunk, embedding)| {
            // Non-empty topic list, so a best topic always exists
            let (max_metric, idx) = best_topic(&embedding, &vectors).unwrap_or((0.0, 0));
            RankedChunk {
                doc_id: chunk.doc_id,
                chunk_id: chunk.chunk_id,
                start: chunk.start,
                end: chunk.end,
                text: chunk.text,
                embedding,
                max_metric,
                max_topic: names[idx].to_string(),
            }
        })
        .collect();

    Ok(ranked)
}

/// Embed every chunk's text and assign each chunk its best-matching topic.
pub async fn rank_chunks(
    chunks: Vec<SentenceChunk>,
    embedder: &dyn Embedder,
    topics: &TopicSet,
    batch_size: usize,
) -> Result<Vec<RankedChunk>> {
    // Fail on missing topic vectors before spending any embedding calls
    topics.vectors()?;

    info!(
        chunks = chunks.len(),
        topics = topics.len(),
        "Calculating chunk similarity to topic vectors"
    );

    let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
    let embeddings = embed_in_batches(embedder, &texts, batch_size).await?;

    assign_topics(chunks, embeddings, topics)
}
