//! Error types for the Civo client

use thiserror::Error;

/// Result type alias using the client Error
pub type Result<T> = std::result::Result<T, Error>;

/// Civo client error types
#[derive(Error, Debug)]
pub enum Error {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("API error ({status}): {code}: {reason}")]
    Api {
        status: u16,
        code: String,
        reason: String,
    },

    #[error("Resource not found: {kind} with id {id}")]
    NotFound { kind: String, id: String },

    #[error("Search for {kind} {search:?} matched {count} resources")]
    MultipleMatches {
        kind: String,
        search: String,
        count: usize,
    },

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    pub fn not_found(kind: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind: kind.into(),
            id: id.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_display() {
        let err = Error::not_found("loadbalancer", "abc-123");
        assert!(err.is_not_found());
        assert_eq!(
            err.to_string(),
            "Resource not found: loadbalancer with id abc-123"
        );
    }

    #[test]
    fn test_api_error_is_not_not_found() {
        let err = Error::Api {
            status: 500,
            code: "internal_error".to_string(),
            reason: "boom".to_string(),
        };
        assert!(!err.is_not_found());
        assert_eq!(err.to_string(), "API error (500): internal_error: boom");
    }
}
