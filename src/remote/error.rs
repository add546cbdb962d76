//! Remote error types.

use thiserror::Error;

/// Longest slice of an error response body kept in the message.
const MAX_ERROR_BODY_CHARS: usize = 200;

pub type RemoteResult<T> = Result<T, RemoteError>;

/// Errors from the REST or Storage endpoints.
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("Failed to parse response: {0}")]
    Decode(String),
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl RemoteError {
    /// Build a status error, keeping only the head of the response body.
    pub fn status(status: u16, body: &str) -> Self {
        RemoteError::Status {
            status,
            body: body.chars().take(MAX_ERROR_BODY_CHARS).collect(),
        }
    }
}

impl From<serde_json::Error> for RemoteError {
    fn from(e: serde_json::Error) -> Self {
        RemoteError::Decode(e.to_string())
    }
}

impl From<url::ParseError> for RemoteError {
    fn from(e: url::ParseError) -> Self {
        RemoteError::InvalidUrl(e.to_string())
    }
}
