//! Error types for wsload core operations

use crate::retry::FailureReason;
use thiserror::Error;

/// Result type alias for wsload operations
pub type Result<T> = std::result::Result<T, WsloadError>;

/// Errors that can occur while driving load against the target backend
#[derive(Error, Debug)]
pub enum WsloadError {
    /// Bearer token missing from the environment; raised before any request
    #[error("auth token is not configured: set the {0} environment variable")]
    MissingAuthToken(&'static str),

    /// Every attempt permitted by the retry policy failed
    #[error("all {attempts} attempts failed for POST {url}: {last}")]
    ExhaustedRetries {
        url: String,
        attempts: u32,
        last: FailureReason,
    },

    /// A 200 response arrived without an expected field
    #[error("response is missing expected field at {pointer}")]
    InvalidResponse { pointer: String },

    /// The HTTP client could not be constructed
    #[error("http client error: {0}")]
    Client(String),
}

impl WsloadError {
    /// True for errors that must abort the run before any iteration starts
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::MissingAuthToken(_) | Self::Client(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exhausted_display_names_target() {
        let err = WsloadError::ExhaustedRetries {
            url: "https://backend.example/api/graphql".to_string(),
            attempts: 5,
            last: FailureReason::Status(503),
        };

        let msg = format!("{}", err);
        assert!(msg.contains("5 attempts"));
        assert!(msg.contains("https://backend.example/api/graphql"));
        assert!(msg.contains("503"));
    }

    #[test]
    fn test_configuration_errors() {
        assert!(WsloadError::MissingAuthToken("WSLOAD_AUTH_TOKEN").is_configuration());
        assert!(!WsloadError::InvalidResponse {
            pointer: "/data/createProject/id".to_string()
        }
        .is_configuration());
    }
}
