//! Error types for the websift pipeline.

use websift_search::SearchError;

/// Top-level error type for the retrieval pipeline.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Search fan-out could not start (configuration or client setup).
    #[error("search error: {0}")]
    Search(#[from] SearchError),

    /// Relevance scoring capability failed.
    #[error("scoring error: {0}")]
    Scoring(String),

    /// Embedding capability failed.
    #[error("embedding error: {0}")]
    Embedding(String),

    /// Text generation capability failed.
    #[error("generation error: {0}")]
    Generation(String),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_error_converts() {
        let err: PipelineError = SearchError::Config("bad".into()).into();
        assert_eq!(err.to_string(), "search error: config error: bad");
    }

    #[test]
    fn display_embedding() {
        let err = PipelineError::Embedding("dimension mismatch".into());
        assert_eq!(err.to_string(), "embedding error: dimension mismatch");
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<PipelineError>();
    }
}
