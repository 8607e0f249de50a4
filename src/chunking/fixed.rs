// Fixed-size word windows with overlap: the baseline chunking strategy.

use crate::error::{ChunkError, Result};

/// Chunk `input_text` into windows of `chunk_length` whitespace-separated
/// words, each sharing `overlap` words with the next.
///
/// Window starts are `0, step, 2*step, ...` (step = `chunk_length - overlap`)
/// while the start is below `word_count - overlap`, so the final window may be
/// shorter than `chunk_length`.
pub fn chunk_string_with_overlap(
    input_text: &str,
    chunk_length: usize,
    overlap: usize,
) -> Result<Vec<String>> {
    if chunk_length < 1 {
        return Err(ChunkError::invalid("chunk_length must be at least one"));
    }
    if overlap >= chunk_length {
        return Err(ChunkError::invalid(format!(
            "overlap ({overlap}) must be less than chunk_length ({chunk_length})"
        )));
    }

    let words: Vec<&str> = input_text.split_whitespace().collect();
    let step = chunk_length - overlap;
    let limit = words.len().saturating_sub(overlap);

    Ok((0..limit)
        .step_by(step)
        .map(|i| words[i..(i + chunk_length).min(words.len())].join(" "))
        .collect())
}
