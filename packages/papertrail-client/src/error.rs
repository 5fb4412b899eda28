//! Error types for the Papertrail client.

use thiserror::Error;

/// Result type for Papertrail client operations.
pub type Result<T> = std::result::Result<T, ClientError>;

/// Papertrail client errors.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Configuration error (missing or empty API token, bad base URL)
    #[error("configuration error: {0}")]
    Config(String),

    /// The remote service answered 404 for the resource
    #[error("{resource} not found")]
    NotFound { resource: String },

    /// Any other non-200 response
    #[error("{action} {resource} failed with status code {status}")]
    Api {
        resource: String,
        action: String,
        status: u16,
    },

    /// Network error (connection failed, timeout, body read)
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Request or response body could not be (de)serialized
    #[error("parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

impl ClientError {
    /// Translate a non-200 status code into a typed error.
    pub fn from_status(status: u16, resource: &str, action: &str) -> Self {
        if status == 404 {
            Self::NotFound {
                resource: resource.to_string(),
            }
        } else {
            Self::Api {
                resource: resource.to_string(),
                action: action.to_string(),
                status,
            }
        }
    }

    /// Status code carried by the error, if it came from an HTTP response.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::NotFound { .. } => Some(404),
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}
