// chunkscope: topic-density chunking and RAG chunking-strategy evaluation
//
// This is the library root. The core is the text -> topics -> chunking path;
// embedding, llm and rag wrap the external models, and corpus/eval prepare
// inputs and score results.

pub mod chunking;
pub mod config;
pub mod corpus;
pub mod embedding;
pub mod error;
pub mod eval;
pub mod llm;
pub mod output;
pub mod rag;
pub mod text;
pub mod topics;

pub use error::{ChunkError, Result, ServiceError};
