// Topic extractor trait.
//
// Discovery is swappable: the default implementation clusters TF-IDF
// keywords, and anything else that yields named term lists (an offline topic
// model, a hand-written JSON file) plugs in the same way.

use anyhow::Result;

use super::topic::TopicSet;

/// Trait for discovering topics in a collection of documents.
pub trait TopicExtractor {
    /// Analyze `documents` and return topics with provisional names and terms.
    fn extract(&self, documents: &[String]) -> Result<TopicSet>;
}
