// Text splitter trait: the tokenizer collaborator.
//
// Chunkers only need two operations: an ordered list of word tokens and an
// ordered list of sentences. The default implementation is rule-based and
// runs locally; a model-specific tokenizer can be dropped in behind the trait.

use super::tokenize::{sentence_split, word_tokenize};

/// Splits raw text into word tokens or sentences, preserving order.
pub trait TextSplitter: Send + Sync {
    fn words(&self, text: &str) -> Vec<String>;
    fn sentences(&self, text: &str) -> Vec<String>;
}

/// Rule-based splitter: punctuation-aware word tokens, Unicode sentence bounds.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnicodeSplitter;

impl TextSplitter for UnicodeSplitter {
    fn words(&self, text: &str) -> Vec<String> {
        word_tokenize(text)
    }

    fn sentences(&self, text: &str) -> Vec<String> {
        sentence_split(text)
    }
}

/// Whitespace-only splitter. Punctuation stays attached to words.
#[derive(Debug, Clone, Copy, Default)]
pub struct WhitespaceSplitter;

impl TextSplitter for WhitespaceSplitter {
    fn words(&self, text: &str) -> Vec<String> {
        text.split_whitespace().map(str::to_string).collect()
    }

    fn sentences(&self, text: &str) -> Vec<String> {
        sentence_split(text)
    }
}
