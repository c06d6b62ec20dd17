//! Error types for acceptance testing

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AccError {
    #[error("Not found in state: {0}")]
    NotInState(String),

    #[error("Remote lookup failed for {id}: {reason}")]
    RemoteLookup { id: String, reason: String },

    #[error("Bad {field}, expected {expected:?}, got {got:?}")]
    FieldMismatch {
        field: String,
        expected: String,
        got: String,
    },

    #[error("{kind} {id} still exists after destroy")]
    StillExists { kind: String, id: String },

    #[error("Pre-check failed: {0}")]
    PreCheck(String),

    #[error("terraform {command} failed ({status}): {stderr}")]
    Engine {
        command: String,
        status: String,
        stderr: String,
    },

    #[error("Step {index}: {source}")]
    Step {
        index: usize,
        #[source]
        source: Box<AccError>,
    },

    #[error("Check {index} ({name}): {source}")]
    Check {
        index: usize,
        name: String,
        #[source]
        source: Box<AccError>,
    },

    #[error("Client error: {0}")]
    Client(#[from] civo_client::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AccError {
    pub fn mismatch(
        field: impl Into<String>,
        expected: impl Into<String>,
        got: impl Into<String>,
    ) -> Self {
        Self::FieldMismatch {
            field: field.into(),
            expected: expected.into(),
            got: got.into(),
        }
    }

    /// Strip `Step` and `Check` wrappers down to the underlying failure.
    pub fn root(&self) -> &AccError {
        match self {
            AccError::Step { source, .. } | AccError::Check { source, .. } => source.root(),
            other => other,
        }
    }
}

pub type AccResult<T> = Result<T, AccError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mismatch_message() {
        let err = AccError::mismatch("hostname", "abc", "xyz");
        assert_eq!(err.to_string(), "Bad hostname, expected \"abc\", got \"xyz\"");
    }

    #[test]
    fn test_root_unwraps_nesting() {
        let err = AccError::Step {
            index: 1,
            source: Box::new(AccError::Check {
                index: 2,
                name: "attr".to_string(),
                source: Box::new(AccError::NotInState("civo_loadbalancer.foobar".to_string())),
            }),
        };
        assert!(matches!(err.root(), AccError::NotInState(_)));
        assert!(err.to_string().starts_with("Step 1: Check 2 (attr)"));
    }
}
