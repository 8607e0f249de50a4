// Text segmentation: word tokens for density scoring, sentences for
// sentence-window chunking.

pub mod traits;
pub mod tokenize;

pub use tokenize::{sentence_split, word_tokenize};
pub use traits::{TextSplitter, UnicodeSplitter};
