// Topic labelling through a language model.
//
// Each topic's terms go into a short prompt asking for a two-word,
// underscore-separated label. A failed or empty completion falls back to the
// first two terms, so labelling never fails a run. Labels become topic names,
// which become density-table column prefixes, so they are made unique.

use std::collections::HashSet;

use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

use super::topic::{Topic, TopicSet};
use crate::error::Result;
use crate::llm::traits::DEFAULT_TEMPERATURE;
use crate::llm::LanguageModel;

/// Prompt asking for a label for one topic's terms.
pub fn label_prompt(terms: &[String]) -> String {
    format!(
        "The following words represent a topic: {}. \
         Please come up with a two-word label for the topic based on \
         the inputs, separated by an underscore.",
        terms.join(", ")
    )
}

/// Label used when the model gives nothing usable.
pub fn fallback_label(terms: &[String], index: usize) -> String {
    match terms {
        [first, second, ..] => format!("{first}_{second}"),
        [only] => only.clone(),
        [] => format!("topic_{index}"),
    }
}

/// Trim a completion and join its words with underscores.
fn normalize_label(raw: &str) -> Option<String> {
    let words: Vec<&str> = raw.split_whitespace().collect();
    if words.is_empty() {
        None
    } else {
        Some(words.join("_"))
    }
}

/// Append `_2`, `_3`, ... to repeated labels.
fn dedup_labels(labels: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    labels
        .into_iter()
        .map(|label| {
            if seen.insert(label.clone()) {
                return label;
            }
            let mut n = 2;
            loop {
                let candidate = format!("{label}_{n}");
                if seen.insert(candidate.clone()) {
                    return candidate;
                }
                n += 1;
            }
        })
        .collect()
}

/// Rename every topic with a model-generated label.
///
/// Up to `concurrency` prompts are in flight at once; labels are assigned in
/// topic order regardless of completion order. Terms and vectors are kept.
pub async fn label_topics(
    topics: TopicSet,
    model: &dyn LanguageModel,
    concurrency: usize,
) -> Result<TopicSet> {
    let topics = topics.into_topics();

    let pb = ProgressBar::new(topics.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("  Labelling topics [{bar:30}] {pos}/{len} ({eta})")
            .expect("valid template"),
    );

    let labels: Vec<String> = stream::iter(topics.iter().enumerate())
        .map(|(index, topic)| {
            let pb = &pb;
            async move {
                let prompt = label_prompt(&topic.terms);
                let label = match model.complete(&prompt, DEFAULT_TEMPERATURE).await {
                    Ok(raw) => normalize_label(&raw),
                    Err(e) => {
                        warn!(topic = %topic.name, error = %e, "Labelling failed, using fallback");
                        None
                    }
                };
                pb.inc(1);
                label.unwrap_or_else(|| fallback_label(&topic.terms, index))
            }
        })
        .buffered(concurrency.max(1))
        .collect()
        .await;
    pb.finish_and_clear();

    let labelled = topics
        .into_iter()
        .zip(dedup_labels(labels))
        .map(|(topic, label)| Topic { name: label, ..topic })
        .collect();

    let set = TopicSet::new(labelled)?;
    info!(model = model.name(), topics = set.len(), "Topic labelling complete");
    Ok(set)
}
