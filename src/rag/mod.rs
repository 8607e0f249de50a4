// Retrieval-augmented generation: vector index, prompts, synthetic QA sets
// and grounded answering.

pub mod index;
pub mod prompts;
pub mod qa;
pub mod retrieval;

pub use index::{load_chunks, ChunkMetadata, ChunkRecord, InMemoryIndex, IndexHit, VectorIndex};
pub use qa::QaPair;
pub use retrieval::{ask, get_context, RagAnswer};
