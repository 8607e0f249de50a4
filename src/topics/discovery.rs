// TF-IDF topic discovery.
//
// Uses the `keyword_extraction` crate to rank keywords across the corpus
// (each document is one IDF document), then groups co-occurring keywords into
// topics. Topic names are provisional (`topic_0`, `topic_1`, ...) until the
// labeller renames them.
//
// Topic vectors for similarity ranking are the embeddings of each topic's
// joined terms.

use anyhow::{Context, Result};
use keyword_extraction::tf_idf::{TfIdf, TfIdfParams};
use stop_words::{get, LANGUAGE};
use tracing::info;

use super::topic::{Topic, TopicSet};
use super::traits::TopicExtractor;
use crate::embedding::traits::Embedder;

/// TF-IDF based topic extractor.
pub struct TfIdfExtractor {
    /// How many top keywords to extract before clustering
    pub top_n_keywords: usize,
    /// Upper bound on the number of topics
    pub max_topics: usize,
    /// Most keywords pulled into one topic besides its seed
    pub max_terms_per_topic: usize,
}

impl Default for TfIdfExtractor {
    fn default() -> Self {
        Self {
            top_n_keywords: 60,
            max_topics: 10,
            max_terms_per_topic: 9,
        }
    }
}

impl TopicExtractor for TfIdfExtractor {
    fn extract(&self, documents: &[String]) -> Result<TopicSet> {
        if documents.is_empty() {
            anyhow::bail!("No documents to analyze, cannot discover topics");
        }

        let stop_words: Vec<String> = get(LANGUAGE::English);
        let params = TfIdfParams::UnprocessedDocuments(documents, &stop_words, None);
        let tfidf = TfIdf::new(params);

        let ranked: Vec<(String, f32)> = tfidf.get_ranked_word_scores(self.top_n_keywords);

        if ranked.is_empty() {
            anyhow::bail!(
                "TF-IDF produced no keywords from {} documents; they may be too short or uniform",
                documents.len()
            );
        }

        info!(
            keywords = ranked.len(),
            top_keyword = &ranked[0].0,
            top_score = ranked[0].1,
            "Extracted TF-IDF keywords"
        );

        let groups = cluster_keywords(
            &ranked,
            documents,
            self.max_topics,
            self.max_terms_per_topic,
        );

        let topics = groups
            .into_iter()
            .enumerate()
            .map(|(i, terms)| Topic::new(format!("topic_{i}"), terms))
            .collect();

        let topic_set = TopicSet::new(topics)?;
        info!(topics = topic_set.len(), "Discovered topics");
        Ok(topic_set)
    }
}

/// Group keywords by co-occurrence in documents.
///
/// Seeds are taken in rank order; each seed pulls in its most frequently
/// co-occurring unassigned keywords. Seeds with no partners still form a
/// single-term topic.
fn cluster_keywords(
    ranked: &[(String, f32)],
    documents: &[String],
    max_topics: usize,
    max_terms_per_topic: usize,
) -> Vec<Vec<String>> {
    let keywords: Vec<&str> = ranked.iter().map(|(w, _)| w.as_str()).collect();
    let n = keywords.len();

    // Which keywords appear in each document
    let doc_keywords: Vec<Vec<usize>> = documents
        .iter()
        .map(|doc| {
            let lower = doc.to_lowercase();
            keywords
                .iter()
                .enumerate()
                .filter(|(_, kw)| lower.contains(*kw))
                .map(|(i, _)| i)
                .collect()
        })
        .collect();

    let mut cooccurrence = vec![vec![0u32; n]; n];
    for dk in &doc_keywords {
        for &i in dk {
            for &j in dk {
                if i != j {
                    cooccurrence[i][j] += 1;
                }
            }
        }
    }

    let mut assigned = vec![false; n];
    let mut groups = Vec::new();

    for seed in 0..n {
        if groups.len() >= max_topics {
            break;
        }
        if assigned[seed] {
            continue;
        }
        assigned[seed] = true;

        let mut candidates: Vec<(usize, u32)> = (0..n)
            .filter(|&i| !assigned[i] && cooccurrence[seed][i] > 0)
            .map(|i| (i, cooccurrence[seed][i]))
            .collect();
        // Stable: ties keep TF-IDF rank order
        candidates.sort_by(|a, b| b.1.cmp(&a.1));

        let mut members = vec![seed];
        for (idx, _) in candidates.into_iter().take(max_terms_per_topic) {
            assigned[idx] = true;
            members.push(idx);
        }

        groups.push(members.iter().map(|&i| ranked[i].0.clone()).collect());
    }

    groups
}

/// Embed each topic's terms (joined by spaces) and attach the vectors.
pub async fn embed_topics(topics: &mut TopicSet, embedder: &dyn Embedder) -> Result<()> {
    let texts: Vec<String> = topics.iter().map(|t| t.terms.join(" ")).collect();
    let vectors = embedder
        .embed(&texts)
        .await
        .context("Failed to embed topic terms")?;
    topics.attach_vectors(vectors)?;
    info!(topics = topics.len(), "Attached topic vectors");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corpus() -> Vec<String> {
        vec![
            "Battery life on this laptop is excellent and the battery charges fast".to_string(),
            "The laptop screen is bright and the keyboard feels solid".to_string(),
            "Coffee beans were fresh and the roast had a chocolate flavor".to_string(),
            "This coffee tastes bitter; the roast is too dark for espresso".to_string(),
            "Espresso machine pulls a great shot with fresh coffee beans".to_string(),
            "Keyboard keys on the laptop started sticking after a month".to_string(),
        ]
    }

    #[test]
    fn test_extract_produces_named_topics() {
        let extractor = TfIdfExtractor {
            top_n_keywords: 20,
            max_topics: 4,
            max_terms_per_topic: 5,
        };
        let topics = extractor.extract(&corpus()).unwrap();

        assert!(!topics.is_empty());
        assert!(topics.len() <= 4);
        for (i, topic) in topics.iter().enumerate() {
            assert_eq!(topic.name, format!("topic_{i}"));
            assert!(!topic.terms.is_empty() && topic.terms.len() <= 6);
            assert!(topic.vector.is_none());
        }
    }

    #[test]
    fn test_keywords_are_not_shared_between_topics() {
        let topics = TfIdfExtractor::default().extract(&corpus()).unwrap();
        let mut all: Vec<&String> = topics.iter().flat_map(|t| t.terms.iter()).collect();
        let total = all.len();
        all.sort();
        all.dedup();
        assert_eq!(all.len(), total);
    }

    #[test]
    fn test_extract_empty_fails() {
        assert!(TfIdfExtractor::default().extract(&[]).is_err());
    }

    #[test]
    fn test_cluster_groups_cooccurring_keywords() {
        let ranked = vec![
            ("coffee".to_string(), 1.0),
            ("laptop".to_string(), 0.9),
            ("roast".to_string(), 0.8),
            ("battery".to_string(), 0.7),
        ];
        let docs = vec![
            "coffee roast".to_string(),
            "laptop battery".to_string(),
            "coffee roast again".to_string(),
        ];
        let groups = cluster_keywords(&ranked, &docs, 10, 5);
        assert_eq!(
            groups,
            vec![
                vec!["coffee".to_string(), "roast".to_string()],
                vec!["laptop".to_string(), "battery".to_string()],
            ]
        );
    }
}
