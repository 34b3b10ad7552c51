//! Error types for the summarization pipeline

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, Error>;

/// Pipeline errors
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// The uploaded file could not be read or is not a usable PDF
    #[error("Failed to ingest '{filename}': {message}")]
    Ingest { filename: String, message: String },

    /// Embedding model unavailable or inference failed
    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    /// Vector index build or query failure
    #[error("Vector index error: {0}")]
    Index(String),

    /// Hosted LLM call failed
    #[error("Generation failed: {0}")]
    Generation(String),

    /// Operation not allowed in the current session state
    #[error("Invalid session state: {0}")]
    InvalidState(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP request error
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create an ingest error
    pub fn ingest(filename: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Ingest {
            filename: filename.into(),
            message: message.into(),
        }
    }

    /// Create an embedding error
    pub fn embedding(message: impl Into<String>) -> Self {
        Self::Embedding(message.into())
    }

    /// Create an index error
    pub fn index(message: impl Into<String>) -> Self {
        Self::Index(message.into())
    }

    /// Create a generation error
    pub fn generation(message: impl Into<String>) -> Self {
        Self::Generation(message.into())
    }

    /// Create an invalid state error
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState(message.into())
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Short machine-readable error kind
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Config(_) => "config_error",
            Error::Ingest { .. } => "ingest_error",
            Error::Embedding(_) => "embedding_error",
            Error::Index(_) => "index_error",
            Error::Generation(_) => "generation_error",
            Error::InvalidState(_) => "invalid_state",
            Error::Io(_) => "io_error",
            Error::Json(_) => "json_error",
            Error::Http(_) => "http_error",
            Error::Internal(_) => "internal_error",
        }
    }

    /// HTTP status used when the error is returned from the API
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::Config(_) => StatusCode::BAD_REQUEST,
            Error::Ingest { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Error::InvalidState(_) => StatusCode::CONFLICT,
            Error::Generation(_) | Error::Http(_) => StatusCode::BAD_GATEWAY,
            Error::Json(_) => StatusCode::BAD_REQUEST,
            Error::Embedding(_) | Error::Index(_) | Error::Io(_) | Error::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": {
                "type": self.kind(),
                "message": self.to_string(),
            }
        }));

        (self.status_code(), body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ingest_error_message() {
        let err = Error::ingest("paper.pdf", "not a PDF");
        assert_eq!(err.to_string(), "Failed to ingest 'paper.pdf': not a PDF");
        assert_eq!(err.kind(), "ingest_error");
        assert_eq!(err.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(Error::generation("429").status_code(), StatusCode::BAD_GATEWAY);
        assert_eq!(Error::invalid_state("no index").status_code(), StatusCode::CONFLICT);
        assert_eq!(
            Error::embedding("model missing").status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
