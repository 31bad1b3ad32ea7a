use thiserror::Error;

/// Unified failure type for the segmentation/chunking/sectioning pipeline.
///
/// Every collaborator failure (tokenizer, embedding service, source reader)
/// is surfaced through this enum rather than retried internally.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The caller's cancellation signal fired. Always distinguishable from
    /// every other variant so consumers can tell "stopped on purpose" apart
    /// from "something broke".
    #[error("operation cancelled")]
    Cancelled,

    /// Reading from the underlying character stream failed.
    #[error("failed to read from source stream")]
    SourceIo(#[source] std::io::Error),

    /// The embedding backend reported a failure.
    #[error("embedding backend failed: {message}")]
    EmbeddingFailed { message: String, retryable: bool },

    /// A vector operation was given operands of differing length.
    #[error("vector dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// A vector operation required an argument that was not supplied.
    #[error("required vector argument was absent")]
    NullArgument,

    /// A configuration value fell outside its documented, clamped range in a
    /// way that could not be silently coerced (reserved for future config
    /// fields; today all documented ranges clamp instead of rejecting).
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl PipelineError {
    pub fn embedding_failed(message: impl Into<String>, retryable: bool) -> Self {
        Self::EmbeddingFailed {
            message: message.into(),
            retryable,
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
