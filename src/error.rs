// Domain error types.
//
// Two families: ChunkError for anything the caller got wrong (bad parameters,
// missing columns, incomplete topic sets) and ServiceError for failures in the
// external collaborators (language model, embedding model). Glue code and the
// CLI wrap both in anyhow with context.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChunkError {
    #[error("invalid input: {0}")]
    InputValidation(String),

    #[error(
        "coverage gap in document {doc_id}: no chunk starts at {expected_start} \
         (covered up to {covered_to} of {max_end})"
    )]
    CoverageGap {
        doc_id: String,
        expected_start: usize,
        covered_to: usize,
        max_end: usize,
    },

    #[error(transparent)]
    Service(#[from] ServiceError),
}

impl ChunkError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        ChunkError::InputValidation(msg.into())
    }
}

/// Failure of a language-model or embedding call.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("content filter triggered for prompt")]
    ContentFiltered,

    #[error("no content was returned")]
    EmptyResponse,

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("failed to decode response: {0}")]
    Decode(String),

    #[error("model error: {0}")]
    Model(String),
}

pub type Result<T> = std::result::Result<T, ChunkError>;
