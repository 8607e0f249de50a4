// Sentence-window reconstitution.
//
// Unlike the density chunker this does not pick a best window: it enumerates
// every window of `min..=max` whole sentences (stepping the end by
// `increment`) at each anchor, then moves the anchor forward by `increment`.
// The overlapping candidates are later ranked by embedding similarity and
// reduced to a non-overlapping cover by the selector.

use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use crate::error::{ChunkError, Result};
use crate::text::TextSplitter;

/// One window of whole sentences.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SentenceChunk {
    pub doc_id: String,
    pub chunk_id: Uuid,
    pub start: usize,
    pub end: usize,
    pub text: String,
}

impl SentenceChunk {
    pub fn new(doc_id: impl Into<String>, start: usize, end: usize, text: String) -> Self {
        Self {
            doc_id: doc_id.into(),
            chunk_id: Uuid::new_v4(),
            start,
            end,
            text,
        }
    }
}

/// Window sizes in sentences.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SentenceWindowParams {
    pub min_sentences: usize,
    pub max_sentences: usize,
    pub increment: usize,
}

impl SentenceWindowParams {
    pub fn new(min_sentences: usize, max_sentences: usize, increment: usize) -> Self {
        Self {
            min_sentences,
            max_sentences,
            increment,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.min_sentences < 1 {
            return Err(ChunkError::invalid("min_sentences must be at least 1"));
        }
        if self.max_sentences < self.min_sentences {
            return Err(ChunkError::invalid(format!(
                "max_sentences ({}) must be >= min_sentences ({})",
                self.max_sentences, self.min_sentences
            )));
        }
        if self.increment < 1 {
            return Err(ChunkError::invalid("increment must be at least 1"));
        }
        Ok(())
    }
}

/// Lazy iterator over all sentence windows of one document.
///
/// A clone continues from the same position. Use [`SentenceWindows::restart`]
/// to iterate again from the first window.
#[derive(Debug, Clone)]
pub struct SentenceWindows {
    doc_id: String,
    sentences: Arc<[String]>,
    params: SentenceWindowParams,
    start: usize,
    end: usize,
    done: bool,
}

impl SentenceWindows {
    pub fn new(
        doc_id: impl Into<String>,
        sentences: Vec<String>,
        params: SentenceWindowParams,
    ) -> Result<Self> {
        params.validate()?;
        let done = sentences.is_empty();
        Ok(Self {
            doc_id: doc_id.into(),
            sentences: sentences.into(),
            params,
            start: 0,
            end: params.min_sentences,
            done,
        })
    }

    /// Split `text` into sentences and window them under a fresh document id.
    pub fn from_text(
        text: &str,
        splitter: &dyn TextSplitter,
        params: SentenceWindowParams,
    ) -> Result<Self> {
        Self::new(Uuid::new_v4().to_string(), splitter.sentences(text), params)
    }

    pub fn doc_id(&self) -> &str {
        &self.doc_id
    }

    /// A fresh iterator over the same document, starting at the first window.
    pub fn restart(&self) -> Self {
        Self {
            doc_id: self.doc_id.clone(),
            sentences: Arc::clone(&self.sentences),
            params: self.params,
            start: 0,
            end: self.params.min_sentences,
            done: self.sentences.is_empty(),
        }
    }

    /// Move the anchor forward once the current anchor's windows are exhausted.
    /// Returns false when no further anchors remain.
    fn advance_anchor(&mut self) -> bool {
        let n = self.sentences.len();
        self.start += self.params.increment;

        // The last anchor already reached the end and the remainder is no
        // longer than one minimum-size window
        if self.end >= n && self.end.saturating_sub(self.start) <= self.params.min_sentences {
            return false;
        }
        if self.start >= n {
            return false;
        }

        self.end = self.start + self.params.min_sentences;
        true
    }
}

impl Iterator for SentenceWindows {
    type Item = SentenceChunk;

    fn next(&mut self) -> Option<SentenceChunk> {
        let n = self.sentences.len();
        while !self.done {
            if self.end <= n && self.end - self.start <= self.params.max_sentences {
                let chunk = SentenceChunk::new(
                    self.doc_id.clone(),
                    self.start,
                    self.end,
                    self.sentences[self.start..self.end].join(" "),
                );
                self.end += self.params.increment;
                return Some(chunk);
            }
            if !self.advance_anchor() {
                self.done = true;
            }
        }
        None
    }
}

/// Split each string into sentences and collect every window of every string.
pub fn split_and_reconstitute<S: AsRef<str>>(
    strings: &[S],
    splitter: &dyn TextSplitter,
    params: SentenceWindowParams,
) -> Result<Vec<SentenceChunk>> {
    params.validate()?;
    let mut chunks = Vec::new();
    for string in strings {
        chunks.extend(SentenceWindows::from_text(string.as_ref(), splitter, params)?);
    }
    Ok(chunks)
}
