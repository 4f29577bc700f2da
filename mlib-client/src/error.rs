//! Error types for API calls and store actions

use mlib_common::models::Failure;
use std::time::Duration;
use thiserror::Error;

/// Failure of a request to the media library API
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// Connection refused, DNS failure, broken body stream
    #[error("Network error: {0}")]
    Transport(String),

    /// No response within the configured timeout
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// Server answered 401; the token the request carried has been discarded
    #[error("Unauthorized: {0}")]
    Unauthorized(Failure),

    /// Any other non-2xx response, with the server-supplied error
    #[error("API error {status}: {failure}")]
    Status { status: u16, failure: Failure },

    /// Response body did not have the expected shape
    #[error("Decode error: {0}")]
    Decode(String),

    /// Local problem: client construction or durable storage
    #[error("Client error: {0}")]
    Client(String),
}

impl ApiError {
    /// Error shape recorded in a store module's error slot
    pub fn failure(&self) -> Failure {
        match self {
            ApiError::Unauthorized(failure) | ApiError::Status { failure, .. } => failure.clone(),
            other => Failure::new(other.to_string()),
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized(_))
    }

    /// HTTP status, when the server answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Unauthorized(_) => Some(401),
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<mlib_common::Error> for ApiError {
    fn from(err: mlib_common::Error) -> Self {
        ApiError::Client(err.to_string())
    }
}
