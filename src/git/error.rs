//! Repository gateway error types
//!
//! Errors raised by the repository gateway. Only `NotARepository` and
//! `Corrupt` are meant to reach the timeline state machine; the rest are
//! turned into display placeholders by the content resolver.

use thiserror::Error;

/// Errors from repository access
#[derive(Error, Debug)]
pub enum GitError {
    /// Path is missing or is not a git repository
    #[error("not a git repository: {0}")]
    NotARepository(String),

    /// The repository opened but its history could not be walked
    #[error("repository history is unreadable: {0}")]
    Corrupt(String),

    /// Commit id does not resolve to a commit
    #[error("commit not found: {0}")]
    CommitNotFound(String),

    /// File is not present in the given commit
    #[error("file {path} not found in commit {commit}")]
    FileNotFound {
        /// Commit SHA
        commit: String,
        /// Repository-relative path
        path: String,
    },

    /// Blob content is not valid UTF-8
    #[error("file content is not valid UTF-8")]
    InvalidUtf8,

    /// Underlying libgit2 error
    #[error("git error: {0}")]
    RepositoryError(#[from] git2::Error),
}

impl GitError {
    /// Whether this error means the repository itself is unusable,
    /// as opposed to a single lookup failing.
    pub fn is_repository_fault(&self) -> bool {
        matches!(
            self,
            Self::NotARepository(_) | Self::Corrupt(_) | Self::RepositoryError(_)
        )
    }
}
