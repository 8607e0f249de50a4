// CSV corpus loading.
//
// The reviews loader reads the Amazon fine-food reviews layout, keeps a seeded
// random sample of data rows (in file order), drops incomplete rows, and
// builds the `combined` text that downstream chunking and QA generation use.

use std::path::Path;

use anyhow::Context;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::ChunkError;

/// One review with its combined title/content text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Review {
    pub time: i64,
    pub product_id: String,
    pub user_id: String,
    pub score: i64,
    pub summary: String,
    pub text: String,
    pub combined: String,
}

#[derive(Debug, Deserialize)]
struct RawReview {
    #[serde(rename = "Time", default, deserialize_with = "csv::invalid_option")]
    time: Option<i64>,
    #[serde(rename = "ProductId", default)]
    product_id: Option<String>,
    #[serde(rename = "UserId", default)]
    user_id: Option<String>,
    #[serde(rename = "Score", default, deserialize_with = "csv::invalid_option")]
    score: Option<i64>,
    #[serde(rename = "Summary", default)]
    summary: Option<String>,
    #[serde(rename = "Text", default)]
    text: Option<String>,
}

const REVIEW_COLUMNS: [&str; 6] = ["Time", "ProductId", "UserId", "Score", "Summary", "Text"];

impl RawReview {
    /// None when any required field is missing or blank.
    fn complete(self) -> Option<Review> {
        let non_blank = |s: Option<String>| s.filter(|v| !v.trim().is_empty());
        let summary = non_blank(self.summary)?;
        let text = non_blank(self.text)?;
        Some(Review {
            time: self.time?,
            product_id: non_blank(self.product_id)?,
            user_id: non_blank(self.user_id)?,
            score: self.score?,
            combined: format!("Title: {}; Content: {}", summary.trim(), text.trim()),
            summary,
            text,
        })
    }
}

/// Load a seeded random sample of `sample_size` reviews from `path`.
///
/// Sampling happens over data rows before incomplete rows are dropped, so the
/// result can hold fewer than `sample_size` reviews. The same seed always
/// selects the same rows.
pub fn load_and_sample(path: &Path, sample_size: usize, seed: u64) -> anyhow::Result<Vec<Review>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open corpus {}", path.display()))?;

    let headers = reader.headers()?.clone();
    for column in REVIEW_COLUMNS {
        if !headers.iter().any(|h| h == column) {
            return Err(ChunkError::invalid(format!(
                "{} has no '{}' column",
                path.display(),
                column
            ))
            .into());
        }
    }

    let rows: Vec<RawReview> = reader
        .deserialize()
        .collect::<std::result::Result<_, _>>()
        .with_context(|| format!("Failed to parse corpus {}", path.display()))?;
    let total = rows.len();

    let mut keep = sample_indices(total, sample_size, seed);
    keep.sort_unstable();

    let mut rows: Vec<Option<RawReview>> = rows.into_iter().map(Some).collect();
    let reviews: Vec<Review> = keep
        .into_iter()
        .filter_map(|i| rows[i].take().and_then(RawReview::complete))
        .collect();

    info!(
        path = %path.display(),
        rows = total,
        sampled = sample_size.min(total),
        kept = reviews.len(),
        seed,
        "Loaded review sample"
    );

    Ok(reviews)
}

/// `amount` distinct indices in `0..total` (all of them when `amount >= total`).
fn sample_indices(total: usize, amount: usize, seed: u64) -> Vec<usize> {
    if amount >= total {
        return (0..total).collect();
    }
    let mut rng = StdRng::seed_from_u64(seed);
    rand::seq::index::sample(&mut rng, total, amount).into_vec()
}

/// Read one text column from a CSV file. Blank cells are skipped.
pub fn load_text_column(path: &Path, column: &str) -> anyhow::Result<Vec<String>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;

    let position = reader
        .headers()?
        .iter()
        .position(|h| h == column)
        .ok_or_else(|| ChunkError::invalid(format!("{} has no '{}' column", path.display(), column)))?;

    let mut texts = Vec::new();
    for record in reader.records() {
        let record = record.with_context(|| format!("Failed to read {}", path.display()))?;
        if let Some(value) = record.get(position).filter(|v| !v.trim().is_empty()) {
            texts.push(value.to_string());
        }
    }

    info!(path = %path.display(), column, rows = texts.len(), "Loaded text column");
    Ok(texts)
}
