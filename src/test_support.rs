//! Throwaway git repositories for tests
//!
//! Commits are written through a separate libgit2 handle, the same way an
//! outside process would append to the repository under observation.

use std::cell::Cell;
use std::fs;
use std::path::Path;

use git2::{Commit, Repository, Signature, Time};
use tempfile::TempDir;

/// 2020-01-01T00:00:00Z
const BASE_TIME: i64 = 1_577_836_800;

pub struct FixtureRepo {
    dir: TempDir,
    repo: Repository,
    clock: Cell<i64>,
}

impl FixtureRepo {
    /// Empty repository with an unborn HEAD
    pub fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let repo = Repository::init(dir.path()).expect("Failed to init git repo");
        Self {
            dir,
            repo,
            clock: Cell::new(BASE_TIME),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write `files` into the worktree, stage them and commit on HEAD.
    ///
    /// Each commit is one hour after the previous one.
    pub fn commit(&self, message: &str, files: &[(&str, &str)]) -> String {
        let mut index = self.repo.index().expect("Failed to open index");
        for (rel, content) in files {
            let full = self.path().join(rel);
            if let Some(parent) = full.parent() {
                fs::create_dir_all(parent).expect("Failed to create parent dir");
            }
            fs::write(&full, content).expect("Failed to write file");
            index.add_path(Path::new(rel)).expect("Failed to stage file");
        }
        index.write().expect("Failed to write index");

        let tree_id = index.write_tree().expect("Failed to write tree");
        let tree = self.repo.find_tree(tree_id).expect("Failed to find tree");

        let when = self.clock.get() + 3600;
        self.clock.set(when);
        let sig = Signature::new("Test User", "test@example.com", &Time::new(when, 0))
            .expect("Failed to build signature");

        let parent = self
            .repo
            .head()
            .ok()
            .and_then(|head| head.peel_to_commit().ok());
        let parents: Vec<&Commit> = parent.iter().collect();

        self.repo
            .commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
            .expect("Failed to commit")
            .to_string()
    }

    /// Delete the repository directory from disk
    pub fn remove_from_disk(&self) {
        fs::remove_dir_all(self.path()).expect("Failed to remove repo dir");
    }

    /// Re-create an empty repository at the same path after [`remove_from_disk`]
    ///
    /// [`remove_from_disk`]: FixtureRepo::remove_from_disk
    pub fn reinit(&mut self) {
        fs::create_dir_all(self.path()).expect("Failed to recreate repo dir");
        self.repo = Repository::init(self.path()).expect("Failed to re-init git repo");
    }
}

/// Three-line `src/lib.rs` with no iterative construct
pub const RECURSIVE_LIB: &str = "pub fn fib(n: u64) -> u64 {\n    if n < 2 { n } else { fib(n - 1) + fib(n - 2) }\n}\n";

/// Same function rewritten around a loop
pub const ITERATIVE_LIB: &str = "pub fn fib(n: u64) -> u64 {\n    let (mut a, mut b) = (0, 1);\n    for _ in 0..n {\n        (a, b) = (b, a + b);\n    }\n    a\n}\n";

/// C0: README only, C1: adds `src/lib.rs`, C2: rewrites it with a loop.
pub fn genesis_to_growth() -> (FixtureRepo, Vec<String>) {
    let fixture = FixtureRepo::new();
    let c0 = fixture.commit("Genesis", &[("README.md", "# slow-fibo\n")]);
    let c1 = fixture.commit("Add recursive fib", &[("src/lib.rs", RECURSIVE_LIB)]);
    let c2 = fixture.commit("Make fib iterative", &[("src/lib.rs", ITERATIVE_LIB)]);
    (fixture, vec![c0, c1, c2])
}
