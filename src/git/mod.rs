//! Git access layer
//!
//! Read-only view of the repository whose history is being displayed.
//! No checkout, no ref updates, no writes of any kind.

pub mod error;
pub mod gateway;

pub use error::GitError;
pub use gateway::{CommitRecord, RepoGateway};

use std::path::{Path, PathBuf};

/// Find the nearest enclosing repository root
///
/// Searches upward from the given directory to find a .git entry.
/// Returns the repository root if found, None otherwise.
///
/// # Arguments
/// * `dir_path` - The directory path to start searching from
pub fn discover_repo_root(dir_path: &Path) -> Option<PathBuf> {
    let mut current = dir_path;
    loop {
        if current.join(".git").exists() {
            return Some(current.to_path_buf());
        }
        match current.parent() {
            Some(parent) => current = parent,
            None => return None,
        }
    }
}
