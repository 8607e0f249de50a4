// Corpus preparation: CSV loading, sampling and cleanup.

pub mod filter;
pub mod loader;

pub use filter::{remove_latex_packages, remove_over_percentile};
pub use loader::{load_and_sample, load_text_column, Review};
