//! Error types for the presentation service.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for presentation operations.
pub type Result<T> = std::result::Result<T, WebError>;

/// A failed call to the analytics service.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// Connection refused, timeout, DNS and the like.
    #[error("{endpoint}: transport error: {reason}")]
    Transport { endpoint: String, reason: String },

    /// Upstream answered with a non-2xx status.
    #[error("{endpoint}: upstream returned status {status}")]
    Status { endpoint: String, status: u16 },

    /// Body was not the expected JSON.
    #[error("{endpoint}: invalid response body: {reason}")]
    Decode { endpoint: String, reason: String },
}

impl FetchError {
    pub fn endpoint(&self) -> &str {
        match self {
            FetchError::Transport { endpoint, .. }
            | FetchError::Status { endpoint, .. }
            | FetchError::Decode { endpoint, .. } => endpoint,
        }
    }
}

/// Errors raised by the presentation service itself.
#[derive(Error, Debug)]
pub enum WebError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("invalid base64 image: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Start(#[from] sa_common::StartError),
}
