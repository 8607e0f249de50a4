// Vector index collaborator and an in-memory cosine implementation.
//
// The index stores chunk texts with a `doc_id` metadata entry and an
// embedding per chunk. Embeddings are either supplied by the caller (e.g.
// reused from similarity ranking) or computed on load with the index's
// embedder.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::embedding::traits::{embed_in_batches, Embedder};
use crate::error::{ChunkError, Result};
use crate::topics::similarity::{cosine_similarity, DEFAULT_EMBED_BATCH};

/// Metadata stored alongside each indexed chunk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    pub doc_id: String,
}

/// One retrieved chunk. `distance` is cosine distance (`1 - similarity`).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexHit {
    pub id: String,
    pub document: String,
    pub metadata: ChunkMetadata,
    pub distance: f64,
}

/// A chunk as written by the chunking commands. Extra fields (spans,
/// metrics) are ignored when loading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkRecord {
    pub doc_id: String,
    pub chunk_id: String,
    pub text: String,
}

/// Load chunk records from a JSON array.
pub fn load_chunks(path: &Path) -> anyhow::Result<Vec<ChunkRecord>> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read chunks from {}", path.display()))?;
    serde_json::from_str(&json).with_context(|| format!("Failed to parse chunks in {}", path.display()))
}

#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Add chunks. `embeddings`, when given, must line up with `documents`.
    async fn add(
        &mut self,
        documents: Vec<String>,
        metadatas: Vec<ChunkMetadata>,
        ids: Vec<String>,
        embeddings: Option<Vec<Vec<f64>>>,
    ) -> Result<()>;

    /// For each query text, up to `n_results` hits, nearest first.
    async fn query(&self, query_texts: &[String], n_results: usize) -> Result<Vec<Vec<IndexHit>>>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

struct Entry {
    id: String,
    document: String,
    metadata: ChunkMetadata,
    embedding: Vec<f64>,
}

/// Brute-force cosine index held in memory.
pub struct InMemoryIndex {
    name: String,
    embedder: Arc<dyn Embedder>,
    entries: Vec<Entry>,
    ids: HashSet<String>,
}

impl InMemoryIndex {
    pub fn new(name: impl Into<String>, embedder: Arc<dyn Embedder>) -> Self {
        let name = name.into();
        info!(index = %name, "Created index");
        Self {
            name,
            embedder,
            entries: Vec::new(),
            ids: HashSet::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Build an index over `chunks`, embedding them on load.
    pub async fn from_chunks(
        name: impl Into<String>,
        embedder: Arc<dyn Embedder>,
        chunks: Vec<ChunkRecord>,
    ) -> Result<Self> {
        let mut index = Self::new(name, embedder);
        let mut documents = Vec::with_capacity(chunks.len());
        let mut metadatas = Vec::with_capacity(chunks.len());
        let mut ids = Vec::with_capacity(chunks.len());
        for chunk in chunks {
            documents.push(chunk.text);
            metadatas.push(ChunkMetadata {
                doc_id: chunk.doc_id,
            });
            ids.push(chunk.chunk_id);
        }
        index.add(documents, metadatas, ids, None).await?;
        Ok(index)
    }
}

#[async_trait]
impl VectorIndex for InMemoryIndex {
    async fn add(
        &mut self,
        documents: Vec<String>,
        metadatas: Vec<ChunkMetadata>,
        ids: Vec<String>,
        embeddings: Option<Vec<Vec<f64>>>,
    ) -> Result<()> {
        if metadatas.len() != documents.len() || ids.len() != documents.len() {
            return Err(ChunkError::invalid(format!(
                "index add: {} documents, {} metadatas, {} ids",
                documents.len(),
                metadatas.len(),
                ids.len()
            )));
        }

        let mut batch_ids = HashSet::new();
        for id in &ids {
            if self.ids.contains(id) || !batch_ids.insert(id.as_str()) {
                return Err(ChunkError::invalid(format!("duplicate index id: {id}")));
            }
        }

        let embeddings = match embeddings {
            Some(embeddings) => {
                if embeddings.len() != documents.len() {
                    return Err(ChunkError::invalid(format!(
                        "index add: {} embeddings for {} documents",
                        embeddings.len(),
                        documents.len()
                    )));
                }
                info!(index = %self.name, count = documents.len(), "Adding pre-generated embeddings");
                embeddings
            }
            None => {
                info!(index = %self.name, count = documents.len(), "Generating embeddings on load");
                embed_in_batches(self.embedder.as_ref(), &documents, DEFAULT_EMBED_BATCH).await?
            }
        };

        for (((id, document), metadata), embedding) in
            ids.into_iter().zip(documents).zip(metadatas).zip(embeddings)
        {
            self.ids.insert(id.clone());
            self.entries.push(Entry {
                id,
                document,
                metadata,
                embedding,
            });
        }

        Ok(())
    }

    async fn query(&self, query_texts: &[String], n_results: usize) -> Result<Vec<Vec<IndexHit>>> {
        let query_vectors = self.embedder.embed(query_texts).await?;

        let results = query_vectors
            .iter()
            .map(|query| {
                let mut scored: Vec<(f64, &Entry)> = self
                    .entries
                    .iter()
                    .map(|e| (1.0 - cosine_similarity(query, &e.embedding), e))
                    .collect();
                // Stable: equal distances keep insertion order
                scored.sort_by(|a, b| a.0.total_cmp(&b.0));

                scored
                    .into_iter()
                    .take(n_results)
                    .map(|(distance, e)| IndexHit {
                        id: e.id.clone(),
                        document: e.document.clone(),
                        metadata: e.metadata.clone(),
                        distance,
                    })
                    .collect()
            })
            .collect();

        debug!(
            index = %self.name,
            queries = query_texts.len(),
            n_results,
            "Queried index"
        );

        Ok(results)
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ServiceError;

    /// Maps a text to [count of "a", count of "b"].
    struct LetterEmbedder;

    #[async_trait]
    impl Embedder for LetterEmbedder {
        async fn embed(&self, texts: &[String]) -> std::result::Result<Vec<Vec<f64>>, ServiceError> {
            Ok(texts
                .iter()
                .map(|t| {
                    vec![
                        t.matches('a').count() as f64,
                        t.matches('b').count() as f64,
                    ]
                })
                .collect())
        }
    }

    fn meta(doc: &str) -> ChunkMetadata {
        ChunkMetadata {
            doc_id: doc.to_string(),
        }
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_query_ranks_nearest_first() {
        let mut index = InMemoryIndex::new("test", Arc::new(LetterEmbedder));
        index
            .add(
                strings(&["aaaa", "bbbb", "aabb"]),
                vec![meta("d1"), meta("d2"), meta("d3")],
                strings(&["c1", "c2", "c3"]),
                None,
            )
            .await
            .unwrap();

        let hits = index.query(&strings(&["a"]), 2).await.unwrap();
        assert_eq!(hits.len(), 1);
        let ids: Vec<&str> = hits[0].iter().map(|h| h.id.as_str()).collect();
        assert_eq!(ids, vec!["c1", "c3"]);
        assert!(hits[0][0].distance.abs() < 1e-12);
        assert_eq!(hits[0][0].metadata.doc_id, "d1");
    }

    #[tokio::test]
    async fn test_pre_generated_embeddings_are_used() {
        let mut index = InMemoryIndex::new("test", Arc::new(LetterEmbedder));
        index
            .add(
                strings(&["text without letters"]),
                vec![meta("d")],
                strings(&["x"]),
                Some(vec![vec![0.0, 1.0]]),
            )
            .await
            .unwrap();
        let hits = index.query(&strings(&["b"]), 5).await.unwrap();
        assert!(hits[0][0].distance.abs() < 1e-12);
    }

    #[tokio::test]
    async fn test_duplicate_ids_rejected() {
        let mut index = InMemoryIndex::new("test", Arc::new(LetterEmbedder));
        index
            .add(strings(&["a"]), vec![meta("d")], strings(&["x"]), None)
            .await
            .unwrap();
        let again = index
            .add(strings(&["b"]), vec![meta("d")], strings(&["x"]), None)
            .await;
        assert!(matches!(again, Err(ChunkError::InputValidation(_))));
        assert_eq!(index.len(), 1);
    }

    #[tokio::test]
    async fn test_from_chunks_and_load() {
        let json = r#"[
            {"doc_id": "d1", "chunk_id": "c1", "text": "aaa", "start": 0, "end": 2, "max_metric": 0.5},
            {"doc_id": "d2", "chunk_id": "c2", "text": "bbb"}
        ]"#;
        let path = std::env::temp_dir().join(format!("chunkscope-chunks-{}.json", std::process::id()));
        std::fs::write(&path, json).unwrap();
        let chunks = load_chunks(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        let index = InMemoryIndex::from_chunks("t", Arc::new(LetterEmbedder), chunks)
            .await
            .unwrap();
        assert_eq!(index.len(), 2);
        let hits = index.query(&strings(&["b"]), 1).await.unwrap();
        assert_eq!(hits[0][0].metadata.doc_id, "d2");
    }

    #[tokio::test]
    async fn test_mismatched_lengths_rejected() {
        let mut index = InMemoryIndex::new("test", Arc::new(LetterEmbedder));
        let result = index
            .add(strings(&["a", "b"]), vec![meta("d")], strings(&["x", "y"]), None)
            .await;
        assert!(result.is_err());
        assert!(index.is_empty());
    }
}
