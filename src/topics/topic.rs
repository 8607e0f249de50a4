// Topic and TopicSet: the explicit topic structure used by both scoring paths.
//
// Word-density scoring reads `terms`; embedding-similarity scoring reads
// `vector`. A TopicSet is built once per analysis run and only read afterwards.
// Its order is significant: it fixes the order of the per-topic columns in
// every table the crate produces.

use std::collections::HashSet;
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::error::{ChunkError, Result};

/// A named cluster of related terms, optionally with a representative embedding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Topic {
    pub name: String,
    pub terms: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vector: Option<Vec<f64>>,
}

impl Topic {
    pub fn new(name: impl Into<String>, terms: Vec<String>) -> Self {
        Self {
            name: name.into(),
            terms,
            vector: None,
        }
    }

    pub fn with_vector(mut self, vector: Vec<f64>) -> Self {
        self.vector = Some(vector);
        self
    }
}

/// Ordered, uniquely-named collection of topics.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TopicSet {
    topics: Vec<Topic>,
}

impl TopicSet {
    /// Build a topic set, rejecting empty or duplicate names.
    pub fn new(topics: Vec<Topic>) -> Result<Self> {
        let mut seen = HashSet::new();
        for topic in &topics {
            if topic.name.trim().is_empty() {
                return Err(ChunkError::invalid("topic name must not be empty"));
            }
            if !seen.insert(topic.name.as_str()) {
                return Err(ChunkError::invalid(format!(
                    "duplicate topic name: {}",
                    topic.name
                )));
            }
        }
        Ok(Self { topics })
    }

    /// Convenience constructor from `(name, terms)` pairs.
    pub fn from_terms<I, N, T>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (N, Vec<T>)>,
        N: Into<String>,
        T: Into<String>,
    {
        let topics = pairs
            .into_iter()
            .map(|(name, terms)| Topic::new(name, terms.into_iter().map(Into::into).collect()))
            .collect();
        Self::new(topics)
    }

    /// Load a topic set from a JSON array of `{name, terms, vector?}` objects.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read topic set from {}", path.display()))?;
        let topics: Vec<Topic> = serde_json::from_str(&json)
            .with_context(|| format!("Failed to parse topic set in {}", path.display()))?;
        Ok(Self::new(topics)?)
    }

    /// Write the topic set as pretty-printed JSON.
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(&self.topics)?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write topic set to {}", path.display()))
    }

    pub fn len(&self) -> usize {
        self.topics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Topic> {
        self.topics.iter()
    }

    pub fn into_topics(self) -> Vec<Topic> {
        self.topics
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.topics.iter().map(|t| t.name.as_str())
    }

    /// Topic vectors in set order. Fails if any topic has no vector.
    pub fn vectors(&self) -> Result<Vec<&[f64]>> {
        self.topics
            .iter()
            .map(|t| {
                t.vector.as_deref().ok_or_else(|| {
                    ChunkError::invalid(format!("topic {} has no topic vector", t.name))
                })
            })
            .collect()
    }

    pub fn has_vectors(&self) -> bool {
        !self.topics.is_empty() && self.topics.iter().all(|t| t.vector.is_some())
    }

    /// Attach one vector per topic, in set order.
    pub fn attach_vectors(&mut self, vectors: Vec<Vec<f64>>) -> Result<()> {
        if vectors.len() != self.topics.len() {
            return Err(ChunkError::invalid(format!(
                "got {} topic vectors for {} topics",
                vectors.len(),
                self.topics.len()
            )));
        }
        for (topic, vector) in self.topics.iter_mut().zip(vectors) {
            topic.vector = Some(vector);
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a TopicSet {
    type Item = &'a Topic;
    type IntoIter = std::slice::Iter<'a, Topic>;

    fn into_iter(self) -> Self::IntoIter {
        self.topics.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_terms_preserves_order() {
        let set = TopicSet::from_terms([
            ("zeta", vec!["a"]),
            ("alpha", vec!["b"]),
        ])
        .unwrap();
        let names: Vec<&str> = set.names().collect();
        assert_eq!(names, vec!["zeta", "alpha"]);
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let result = TopicSet::from_terms([("t", vec!["a"]), ("t", vec!["b"])]);
        assert!(matches!(result, Err(ChunkError::InputValidation(_))));
    }

    #[test]
    fn test_vectors_require_every_topic() {
        let mut set = TopicSet::from_terms([("a", vec!["x"]), ("b", vec!["y"])]).unwrap();
        assert!(set.vectors().is_err());
        assert!(!set.has_vectors());

        set.attach_vectors(vec![vec![1.0, 0.0], vec![0.0, 1.0]]).unwrap();
        assert!(set.has_vectors());
        assert_eq!(set.vectors().unwrap().len(), 2);
    }

    #[test]
    fn test_attach_vectors_length_mismatch() {
        let mut set = TopicSet::from_terms([("a", vec!["x"])]).unwrap();
        assert!(set.attach_vectors(vec![]).is_err());
    }

    #[test]
    fn test_json_roundtrip_keeps_order_and_omits_missing_vectors() {
        let set = TopicSet::from_terms([("b", vec!["x"]), ("a", vec!["y"])]).unwrap();
        let json = serde_json::to_string(&set).unwrap();
        assert!(!json.contains("vector"));
        let back: TopicSet = serde_json::from_str(&json).unwrap();
        assert_eq!(back, set);
    }
}
