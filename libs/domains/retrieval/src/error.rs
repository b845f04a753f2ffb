use axum::response::{IntoResponse, Response};
use axum_helpers::AppError;
use thiserror::Error;

use crate::models::DistanceMetric;

#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("Qdrant error: {0}")]
    Qdrant(String),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Embedding dimension mismatch: collection expects {expected}, model produces {actual}")]
    DimensionMismatch { expected: u64, actual: u64 },

    #[error("Distance metric mismatch: collection uses {expected:?}, service requires {actual:?}")]
    DistanceMismatch {
        expected: DistanceMetric,
        actual: DistanceMetric,
    },

    #[error("Service is still initializing")]
    NotReady,

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type RetrievalResult<T> = Result<T, RetrievalError>;

impl From<qdrant_client::QdrantError> for RetrievalError {
    fn from(err: qdrant_client::QdrantError) -> Self {
        RetrievalError::Qdrant(err.to_string())
    }
}

impl From<reqwest::Error> for RetrievalError {
    fn from(err: reqwest::Error) -> Self {
        RetrievalError::Embedding(err.to_string())
    }
}

impl From<serde_json::Error> for RetrievalError {
    fn from(err: serde_json::Error) -> Self {
        RetrievalError::Internal(format!("JSON error: {}", err))
    }
}

impl From<core_config::ConfigError> for RetrievalError {
    fn from(err: core_config::ConfigError) -> Self {
        RetrievalError::Config(err.to_string())
    }
}

/// Convert RetrievalError to AppError for standardized HTTP error responses
impl From<RetrievalError> for AppError {
    fn from(err: RetrievalError) -> Self {
        match err {
            RetrievalError::NotReady => {
                AppError::ServiceUnavailable("Service is still initializing".to_string())
            }
            RetrievalError::Qdrant(msg) => {
                AppError::InternalServerError(format!("Qdrant error: {}", msg))
            }
            RetrievalError::Embedding(msg) => {
                AppError::InternalServerError(format!("Embedding error: {}", msg))
            }
            RetrievalError::Config(msg) => {
                AppError::InternalServerError(format!("Config error: {}", msg))
            }
            err @ (RetrievalError::DimensionMismatch { .. }
            | RetrievalError::DistanceMismatch { .. }) => {
                AppError::InternalServerError(err.to_string())
            }
            RetrievalError::Internal(msg) => AppError::InternalServerError(msg),
        }
    }
}

impl IntoResponse for RetrievalError {
    fn into_response(self) -> Response {
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}
