//! Content resolution
//!
//! Turns "bytes of path at commit" into a [`ContentResult`]. File absence
//! and undecodable content are ordinary outcomes here, never errors; the
//! caller only ever sees one of the two variants.

use serde::Serialize;
use tracing::{debug, warn};

use super::classify::{classify, detect_style, CodeStyle, Language};
use crate::git::{GitError, RepoGateway};

/// Why a generation has no displayable content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum AbsentReason {
    /// The file did not exist in that commit
    MissingInCommit,
    /// The blob exists but could not be read or decoded
    ReadError,
}

impl AbsentReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MissingInCommit => "missing-in-commit",
            Self::ReadError => "read-error",
        }
    }
}

/// Content of the tracked file at one generation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ContentResult {
    Present {
        text: String,
        language: Language,
        style: CodeStyle,
    },
    Absent {
        reason: AbsentReason,
    },
}

impl ContentResult {
    pub fn is_present(&self) -> bool {
        matches!(self, Self::Present { .. })
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Present { text, .. } => Some(text),
            Self::Absent { .. } => None,
        }
    }

    /// Style hint; `Other` when absent
    pub fn style(&self) -> CodeStyle {
        match self {
            Self::Present { style, .. } => *style,
            Self::Absent { .. } => CodeStyle::default(),
        }
    }

    /// Text shown in place of the file for an absent result
    pub fn placeholder(reason: AbsentReason, path: &str, generation: usize) -> String {
        match reason {
            AbsentReason::MissingInCommit => {
                format!("// File '{}' not found in Generation {}", path, generation)
            }
            AbsentReason::ReadError => {
                format!("// File '{}' could not be read in Generation {}", path, generation)
            }
        }
    }
}

/// Resolve `path` at `commit_id`
///
/// Reads straight through `gateway`; no result is cached here.
pub fn resolve(gateway: &RepoGateway, commit_id: &str, path: &str) -> ContentResult {
    match gateway.read_blob(commit_id, path) {
        Ok(bytes) => decode(bytes, path),
        Err(GitError::FileNotFound { .. }) => {
            debug!(commit = commit_id, path, "file not present in generation");
            ContentResult::Absent {
                reason: AbsentReason::MissingInCommit,
            }
        }
        Err(err) => {
            warn!(
                commit = commit_id,
                path,
                error = %err,
                repository_fault = err.is_repository_fault(),
                "failed to read file at commit"
            );
            ContentResult::Absent {
                reason: AbsentReason::ReadError,
            }
        }
    }
}

/// Decode blob bytes as UTF-8 text and classify them
pub fn decode(bytes: Vec<u8>, path: &str) -> ContentResult {
    match String::from_utf8(bytes) {
        Ok(text) => ContentResult::Present {
            language: classify(path),
            style: detect_style(&text),
            text,
        },
        Err(_) => {
            let err = GitError::InvalidUtf8;
            warn!(path, error = %err, "file content is not text");
            ContentResult::Absent {
                reason: AbsentReason::ReadError,
            }
        }
    }
}
