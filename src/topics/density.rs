// Topic density scoring for a window of tokens.
//
// For each topic, density is the fraction of tokens in the window that are one
// of the topic's terms (exact, case-sensitive match; repeats count each time).
// The L2 norm of the density vector is the single "topicality" score the
// greedy chunker maximizes.

use std::collections::HashSet;

use crate::error::{ChunkError, Result};

use super::topic::TopicSet;

/// Per-topic densities for one window, in topic-set order, plus their L2 norm.
#[derive(Debug, Clone, PartialEq)]
pub struct TopicDensity {
    pub densities: Vec<f64>,
    pub l2_norm: f64,
}

/// Scores token windows against a fixed topic set.
///
/// Term lookups are precomputed once per topic set, so scoring a window is
/// O(window length x topic count) with no allocation beyond the result.
pub struct DensityScorer<'a> {
    term_sets: Vec<HashSet<&'a str>>,
}

impl<'a> DensityScorer<'a> {
    pub fn new(topics: &'a TopicSet) -> Self {
        let term_sets = topics
            .iter()
            .map(|t| t.terms.iter().map(String::as_str).collect())
            .collect();
        Self { term_sets }
    }

    pub fn topic_count(&self) -> usize {
        self.term_sets.len()
    }

    /// Score one window. Empty windows are rejected.
    pub fn score<S: AsRef<str>>(&self, window: &[S]) -> Result<TopicDensity> {
        if window.is_empty() {
            return Err(ChunkError::invalid(
                "cannot compute topic density of an empty window",
            ));
        }

        let len = window.len() as f64;
        let densities: Vec<f64> = self
            .term_sets
            .iter()
            .map(|terms| {
                let hits = window
                    .iter()
                    .filter(|token| terms.contains(token.as_ref()))
                    .count();
                hits as f64 / len
            })
            .collect();

        Ok(TopicDensity {
            l2_norm: l2_norm(&densities),
            densities,
        })
    }
}

/// Euclidean norm of a density vector.
pub fn l2_norm(values: &[f64]) -> f64 {
    values.iter().map(|d| d * d).sum::<f64>().sqrt()
}

/// One-shot scoring without keeping a scorer around.
pub fn topic_densities<S: AsRef<str>>(window: &[S], topics: &TopicSet) -> Result<TopicDensity> {
    DensityScorer::new(topics).score(window)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn topics() -> TopicSet {
        TopicSet::from_terms([
            ("topic1", vec!["sample", "text"]),
            ("topic2", vec!["testing", "densities"]),
        ])
        .unwrap()
    }

    #[test]
    fn test_density_counts_matching_tokens() {
        let window = ["about", "sample", "text", ".", "This"];
        let result = topic_densities(&window, &topics()).unwrap();
        assert!((result.densities[0] - 0.4).abs() < 1e-12);
        assert!(result.densities[1].abs() < 1e-12);
        assert!((result.l2_norm - 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_l2_norm_combines_topics() {
        let window = ["sample", "testing", "x", "y"];
        let result = topic_densities(&window, &topics()).unwrap();
        // sqrt(0.25^2 + 0.25^2)
        assert!((result.l2_norm - (0.125_f64).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_repeated_tokens_count_each_time() {
        let window = ["text", "text", "text", "other"];
        let result = topic_densities(&window, &topics()).unwrap();
        assert!((result.densities[0] - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_match_is_case_sensitive() {
        let window = ["Sample", "TEXT"];
        let result = topic_densities(&window, &topics()).unwrap();
        assert_eq!(result.l2_norm, 0.0);
    }

    #[test]
    fn test_empty_window_is_rejected() {
        let window: [&str; 0] = [];
        assert!(matches!(
            topic_densities(&window, &topics()),
            Err(ChunkError::InputValidation(_))
        ));
    }

    #[test]
    fn test_scoring_is_idempotent() {
        let set = topics();
        let scorer = DensityScorer::new(&set);
        let window = ["a", "sample", "sentence", "about", "testing", "densities"];
        let first = scorer.score(&window).unwrap();
        let second = scorer.score(&window).unwrap();
        assert_eq!(first.l2_norm.to_bits(), second.l2_norm.to_bits());
        for (a, b) in first.densities.iter().zip(&second.densities) {
            assert_eq!(a.to_bits(), b.to_bits());
        }
    }

    #[test]
    fn test_no_topics_gives_zero_norm() {
        let empty = TopicSet::default();
        let result = topic_densities(&["a", "b"], &empty).unwrap();
        assert!(result.densities.is_empty());
        assert_eq!(result.l2_norm, 0.0);
    }
}
