//! Repository gateway
//!
//! Read-only access to a git repository that another process keeps
//! committing to:
//! - lists commits oldest-first
//! - reads a blob by (commit, path) straight from the object database
//!
//! Never checks out, writes refs or touches the working directory. The handle
//! must be re-opened with [`RepoGateway::invalidate_cache`] before each walk,
//! otherwise refs and packs written by the other process stay invisible.

use std::fmt;
use std::path::{Path, PathBuf};

use git2::{ErrorCode, ObjectType, Oid, Repository, Sort};
use serde::Serialize;
use tracing::{debug, trace};

use super::error::GitError;

/// Commit metadata as returned by a walk (no file content)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommitRecord {
    /// Full commit SHA
    pub id: String,
    /// Full commit message
    pub message: String,
    /// Committer time, unix seconds
    pub timestamp: i64,
}

/// Handle on one repository root.
pub struct RepoGateway {
    root: PathBuf,
    repo: Repository,
}

impl fmt::Debug for RepoGateway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RepoGateway")
            .field("root", &self.root)
            .finish_non_exhaustive()
    }
}

impl RepoGateway {
    /// Open the repository rooted at `repo_path`
    ///
    /// # Errors
    /// `NotARepository` when the path does not exist or is not a git
    /// repository root.
    pub fn open(repo_path: &Path) -> Result<Self, GitError> {
        let repo = open_repository(repo_path)?;
        debug!(root = %repo_path.display(), "repository opened");
        Ok(Self {
            root: repo_path.to_path_buf(),
            repo,
        })
    }

    /// Drop the current libgit2 handle and open a fresh one on the same root.
    ///
    /// libgit2 keeps refs, packfile lists and decoded objects cached per
    /// handle. A fresh handle is the only way to be sure commits appended by
    /// another process since the last walk are seen.
    pub fn invalidate_cache(&mut self) -> Result<(), GitError> {
        self.repo = open_repository(&self.root)?;
        trace!(root = %self.root.display(), "repository handle re-opened");
        Ok(())
    }

    /// All commits reachable from HEAD, oldest first
    ///
    /// Parents always precede children; ties are broken by commit time.
    /// A repository without any commit yet (unborn HEAD) yields an empty list.
    ///
    /// # Errors
    /// `Corrupt` when the walk itself fails.
    pub fn list_commits(&self) -> Result<Vec<CommitRecord>, GitError> {
        // push_head reports an unborn branch as a generic reference error,
        // so HEAD is resolved on its own first.
        match self.repo.head() {
            Ok(_) => {}
            Err(e) if matches!(e.code(), ErrorCode::UnbornBranch | ErrorCode::NotFound) => {
                debug!(root = %self.root.display(), "HEAD is unborn, no commits yet");
                return Ok(Vec::new());
            }
            Err(e) => return Err(corrupt(e)),
        }

        let mut revwalk = self.repo.revwalk().map_err(corrupt)?;
        revwalk.push_head().map_err(corrupt)?;

        revwalk
            .set_sorting(Sort::TOPOLOGICAL | Sort::TIME | Sort::REVERSE)
            .map_err(corrupt)?;

        let mut commits = Vec::new();
        for oid_result in revwalk {
            let oid = oid_result.map_err(corrupt)?;
            let commit = self.repo.find_commit(oid).map_err(corrupt)?;

            commits.push(CommitRecord {
                id: oid.to_string(),
                message: String::from_utf8_lossy(commit.message_bytes()).into_owned(),
                timestamp: commit.time().seconds(),
            });
        }

        debug!(root = %self.root.display(), count = commits.len(), "commit walk finished");
        Ok(commits)
    }

    /// Raw bytes of `file_path` as of `commit_id`
    ///
    /// Reads the object database directly; no checkout happens.
    ///
    /// # Arguments
    /// * `commit_id` - full commit SHA
    /// * `file_path` - path relative to the repository root, `/` separated
    ///
    /// # Errors
    /// * `CommitNotFound` when the id does not resolve to a commit
    /// * `FileNotFound` when the path is missing from the tree or is a directory
    pub fn read_blob(&self, commit_id: &str, file_path: &str) -> Result<Vec<u8>, GitError> {
        let oid = Oid::from_str(commit_id)
            .map_err(|_| GitError::CommitNotFound(commit_id.to_string()))?;
        let commit = self
            .repo
            .find_commit(oid)
            .map_err(|_| GitError::CommitNotFound(commit_id.to_string()))?;
        let tree = commit.tree()?;

        let not_found = || GitError::FileNotFound {
            commit: commit_id.to_string(),
            path: file_path.to_string(),
        };

        let entry = tree.get_path(Path::new(file_path)).map_err(|_| not_found())?;
        if entry.kind() != Some(ObjectType::Blob) {
            return Err(not_found());
        }

        let blob = self.repo.find_blob(entry.id())?;
        Ok(blob.content().to_vec())
    }
}

fn open_repository(repo_path: &Path) -> Result<Repository, GitError> {
    if !repo_path.exists() {
        return Err(GitError::NotARepository(repo_path.display().to_string()));
    }

    Repository::open(repo_path).map_err(|e| {
        if e.code() == ErrorCode::NotFound {
            GitError::NotARepository(repo_path.display().to_string())
        } else {
            GitError::RepositoryError(e)
        }
    })
}

fn corrupt(e: git2::Error) -> GitError {
    GitError::Corrupt(e.message().to_string())
}
