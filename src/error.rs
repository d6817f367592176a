//! Unified application error types
//!
//! Errors that reach the binary boundary. The timeline core never returns
//! these; they come from startup (target resolution, logging, terminal setup)
//! and from the non-interactive `dump` command.

use serde::Serialize;
use thiserror::Error;

use crate::timeline::{EngineFault, FaultKind};

/// Application-level error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Target path given on the command line does not exist
    #[error("target path cannot be resolved: {0}")]
    TargetNotFound(String),

    /// Repository could not be opened or walked
    #[error("{}", .0.message)]
    Repository(EngineFault),

    /// Terminal or file operation error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Snapshot serialization failed
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Machine-readable error, printed by `dump` on failure
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error code for scripted callers
    pub code: String,
    /// Human-readable error message
    pub message: String,
}

impl From<&AppError> for ErrorResponse {
    fn from(err: &AppError) -> Self {
        let code = match err {
            AppError::TargetNotFound(_) => "TARGET_NOT_FOUND",
            AppError::Repository(fault) => match fault.kind {
                FaultKind::RepoNotFound => "REPO_NOT_FOUND",
                FaultKind::RepoCorrupt => "REPO_CORRUPT",
            },
            AppError::Io(_) => "IO_ERROR",
            AppError::Serialize(_) => "SERIALIZE_ERROR",
        };
        Self {
            code: code.to_string(),
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AppError::TargetNotFound("../gravity-eater".into());
        assert_eq!(err.to_string(), "target path cannot be resolved: ../gravity-eater");

        let fault = EngineFault {
            kind: FaultKind::RepoCorrupt,
            message: "repository history is unreadable: bad object".into(),
        };
        assert_eq!(AppError::Repository(fault).to_string(), "repository history is unreadable: bad object");
    }

    #[test]
    fn test_error_response_codes() {
        let err = AppError::Repository(EngineFault {
            kind: FaultKind::RepoNotFound,
            message: "not a git repository: /x".into(),
        });
        let response = ErrorResponse::from(&err);
        assert_eq!(response.code, "REPO_NOT_FOUND");
        assert!(response.message.contains("/x"));

        let err = AppError::TargetNotFound("../missing".into());
        assert_eq!(ErrorResponse::from(&err).code, "TARGET_NOT_FOUND");
    }

    #[test]
    fn test_error_response_serialization() {
        let err = AppError::Io(std::io::Error::new(std::io::ErrorKind::Other, "tty gone"));
        let json = serde_json::to_string(&ErrorResponse::from(&err)).unwrap();
        assert!(json.contains("IO_ERROR"));
        assert!(json.contains("tty gone"));
    }
}
