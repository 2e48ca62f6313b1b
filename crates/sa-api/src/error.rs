//! Error types for the analytics service.

use sa_common::wire::ErrorBody;
use sa_common::DatasetError;
use sa_math::HypothesisError;
use thiserror::Error;

use crate::chart::ChartError;

/// Result type for handlers.
pub type Result<T> = std::result::Result<T, ApiError>;

/// Errors a handler can return, each mapped to one HTTP status.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Unsupported kind or wrong variables; the message is sent to the client.
    #[error("{0}")]
    BadRequest(String),

    /// Body could not be decoded.
    #[error("{0}")]
    Unprocessable(String),

    #[error("dataset error: {0}")]
    Dataset(#[from] DatasetError),

    #[error("statistics error: {0}")]
    Math(#[from] HypothesisError),

    #[error("chart error: {0}")]
    Chart(#[from] ChartError),
}

impl ApiError {
    pub fn status(&self) -> u16 {
        match self {
            ApiError::BadRequest(_) => 400,
            ApiError::Unprocessable(_) => 422,
            ApiError::Dataset(_) | ApiError::Math(_) | ApiError::Chart(_) => 500,
        }
    }

    /// `{"detail": ...}` for client errors; server errors carry no body
    /// object (see [`ApiError::is_internal`]).
    pub fn body(&self) -> Option<ErrorBody> {
        match self {
            ApiError::BadRequest(msg) | ApiError::Unprocessable(msg) => {
                Some(ErrorBody::new(msg.clone()))
            }
            _ => None,
        }
    }

    pub fn is_internal(&self) -> bool {
        self.status() >= 500
    }
}
