pub mod azure;
pub mod download;
pub mod onnx;
pub mod traits;

pub use azure::AzureEmbedder;
pub use onnx::OnnxEmbedder;
pub use traits::{embed_in_batches, Embedder};
