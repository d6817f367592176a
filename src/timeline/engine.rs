//! Timeline engine
//!
//! Owns the generation list, the selection and the lazily resolved content
//! for one target repository, and keeps them coherent while another process
//! commits to that repository.
//!
//! State machine:
//! - `Uninitialized` until the first walk
//! - `Ready` after a successful walk (zero or more generations)
//! - `Error` when opening or walking failed; a later successful refresh
//!   goes back to `Ready`
//!
//! Every refresh re-opens the repository handle before walking. Content is
//! resolved on first access and re-fetched on refresh for commits that still
//! exist; entries for vanished commits are dropped.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info, warn};

use super::content::{self, ContentResult};
use super::generation::{self, Generation};
use crate::config::{self, TrackedFile, TrackedFileSet};
use crate::git::{CommitRecord, GitError, RepoGateway};

/// Kind of repository failure that put the engine in `Error`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FaultKind {
    /// Path missing or not a repository
    RepoNotFound,
    /// Repository present but unreadable
    RepoCorrupt,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EngineFault {
    pub kind: FaultKind,
    pub message: String,
}

impl From<&GitError> for EngineFault {
    fn from(err: &GitError) -> Self {
        let kind = match err {
            GitError::NotARepository(_) => FaultKind::RepoNotFound,
            _ => FaultKind::RepoCorrupt,
        };
        Self {
            kind,
            message: err.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum EngineStatus {
    Uninitialized,
    Ready,
    Error(EngineFault),
}

impl EngineStatus {
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready)
    }

    pub fn fault(&self) -> Option<&EngineFault> {
        match self {
            Self::Error(fault) => Some(fault),
            _ => None,
        }
    }
}

/// Self-consistent view handed to the renderer each draw
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimelineSnapshot {
    /// Oldest first; `generations[i].index == i`
    pub generations: Vec<Generation>,
    pub selected_index: Option<usize>,
    /// Resolved content of `tracked_file`, by generation index
    pub content_by_index: BTreeMap<usize, ContentResult>,
    /// Path whose content is being resolved
    pub tracked_file: String,
    pub status: EngineStatus,
    /// Config diagnostic, if the defaults were used
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_warning: Option<String>,
}

/// A generation and its resolved content, borrowed from a snapshot
#[derive(Debug, Clone, Copy)]
pub struct Pane<'a> {
    pub generation: &'a Generation,
    pub content: Option<&'a ContentResult>,
}

/// Oldest vs newest generation
#[derive(Debug, Clone, Copy)]
pub struct Comparison<'a> {
    pub ancestor: Pane<'a>,
    pub survivor: Pane<'a>,
    pub generation_count: usize,
}

impl TimelineSnapshot {
    fn empty(tracked_file: String) -> Self {
        Self {
            generations: Vec::new(),
            selected_index: None,
            content_by_index: BTreeMap::new(),
            tracked_file,
            status: EngineStatus::Uninitialized,
            config_warning: None,
        }
    }

    pub fn len(&self) -> usize {
        self.generations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.generations.is_empty()
    }

    pub fn oldest(&self) -> Option<&Generation> {
        self.generations.first()
    }

    pub fn newest(&self) -> Option<&Generation> {
        self.generations.last()
    }

    pub fn selected(&self) -> Option<&Generation> {
        self.selected_index.and_then(|i| self.generations.get(i))
    }

    pub fn content(&self, index: usize) -> Option<&ContentResult> {
        self.content_by_index.get(&index)
    }

    pub fn pane(&self, index: usize) -> Option<Pane<'_>> {
        self.generations.get(index).map(|generation| Pane {
            generation,
            content: self.content(index),
        })
    }

    /// Oldest and newest panes; both are the same generation when only one exists
    pub fn comparison(&self) -> Option<Comparison<'_>> {
        let last = self.len().checked_sub(1)?;
        Some(Comparison {
            ancestor: self.pane(0)?,
            survivor: self.pane(last)?,
            generation_count: self.len(),
        })
    }
}

/// Result of the repository part of a refresh
pub struct Walk {
    gateway: RepoGateway,
    commits: Vec<CommitRecord>,
}

/// Repository work of one refresh, detached from the engine so it can run on
/// another thread under a timeout
pub struct RefreshJob {
    root: PathBuf,
    gateway: Option<RepoGateway>,
}

impl RefreshJob {
    /// Invalidate (or open) the handle and walk the commits
    pub fn run(self) -> Result<Walk, GitError> {
        let gateway = match self.gateway {
            Some(mut gateway) => {
                gateway.invalidate_cache()?;
                gateway
            }
            None => RepoGateway::open(&self.root)?,
        };
        let commits = gateway.list_commits()?;
        Ok(Walk { gateway, commits })
    }
}

pub struct TimelineEngine {
    root: PathBuf,
    gateway: Option<RepoGateway>,
    tracked: TrackedFileSet,
    snapshot: TimelineSnapshot,
}

impl TimelineEngine {
    /// Engine for the repository at `root`, not yet opened
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let tracked = TrackedFileSet::default();
        let snapshot = TimelineSnapshot::empty(tracked.primary_path().to_string());
        Self {
            root: root.into(),
            gateway: None,
            tracked,
            snapshot,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn status(&self) -> &EngineStatus {
        &self.snapshot.status
    }

    pub fn snapshot(&self) -> &TimelineSnapshot {
        &self.snapshot
    }

    /// Path currently being displayed
    pub fn tracked_file(&self) -> &str {
        &self.snapshot.tracked_file
    }

    pub fn tracked_files(&self) -> Vec<TrackedFile> {
        self.tracked.tracked()
    }

    /// Open the repository with a fresh handle and walk it
    pub fn open(&mut self) -> &EngineStatus {
        self.gateway = None;
        self.refresh()
    }

    /// Re-synchronize with the repository on disk
    pub fn refresh(&mut self) -> &EngineStatus {
        let job = self.begin_refresh();
        let outcome = job.run();
        self.finish_refresh(outcome)
    }

    /// First half of a refresh: reload the config and detach the repository
    /// work. Must be followed by [`finish_refresh`] or [`abandon_refresh`].
    ///
    /// [`finish_refresh`]: TimelineEngine::finish_refresh
    /// [`abandon_refresh`]: TimelineEngine::abandon_refresh
    pub fn begin_refresh(&mut self) -> RefreshJob {
        self.reload_config();
        RefreshJob {
            root: self.root.clone(),
            gateway: self.gateway.take(),
        }
    }

    /// Second half of a refresh: apply the walk, or record the failure
    pub fn finish_refresh(&mut self, outcome: Result<Walk, GitError>) -> &EngineStatus {
        match outcome {
            Ok(walk) => {
                self.gateway = Some(walk.gateway);
                let recovered = !self.snapshot.status.is_ready();
                self.reconcile(walk.commits);
                self.snapshot.status = EngineStatus::Ready;
                if recovered {
                    info!(
                        root = %self.root.display(),
                        generations = self.snapshot.len(),
                        "repository ready"
                    );
                }
            }
            Err(err) => {
                warn!(root = %self.root.display(), error = %err, "refresh failed");
                self.gateway = None;
                self.snapshot.status = EngineStatus::Error(EngineFault::from(&err));
            }
        }
        &self.snapshot.status
    }

    /// The detached refresh will never report back (its task died). State
    /// is kept as is; the next refresh opens a new handle.
    pub fn abandon_refresh(&mut self) {
        warn!(root = %self.root.display(), "refresh abandoned, keeping current state");
        self.gateway = None;
    }

    /// Select generation `index`, clamped to the valid range
    pub fn select(&mut self, index: usize) -> Option<usize> {
        let last = self.snapshot.len().checked_sub(1)?;
        let clamped = index.min(last);
        self.snapshot.selected_index = Some(clamped);
        Some(clamped)
    }

    pub fn select_next(&mut self) -> Option<usize> {
        let next = self.snapshot.selected_index.map_or(0, |i| i.saturating_add(1));
        self.select(next)
    }

    pub fn select_previous(&mut self) -> Option<usize> {
        let previous = self.snapshot.selected_index.map_or(0, |i| i.saturating_sub(1));
        self.select(previous)
    }

    pub fn select_oldest(&mut self) -> Option<usize> {
        self.select(0)
    }

    pub fn select_newest(&mut self) -> Option<usize> {
        self.select(usize::MAX)
    }

    /// Content of generation `index`, resolved on first access
    ///
    /// `None` when the index is out of range, or when the content was never
    /// resolved and no repository handle is available (error state).
    pub fn content(&mut self, index: usize) -> Option<&ContentResult> {
        if index >= self.snapshot.len() {
            return None;
        }
        if !self.snapshot.content_by_index.contains_key(&index) {
            self.resolve_into(index);
        }
        self.snapshot.content_by_index.get(&index)
    }

    /// Resolve both ends of the timeline and return them
    pub fn prepare_comparison(&mut self) -> Option<Comparison<'_>> {
        let last = self.snapshot.len().checked_sub(1)?;
        self.content(0);
        self.content(last);
        self.snapshot.comparison()
    }

    /// Resolve the selected generation and return it
    pub fn prepare_selected(&mut self) -> Option<Pane<'_>> {
        let index = self.snapshot.selected_index?;
        self.content(index);
        self.snapshot.pane(index)
    }

    /// Switch the displayed file to the next tracked one
    pub fn cycle_tracked_file(&mut self) -> &str {
        let paths: Vec<String> = self.tracked.tracked().into_iter().map(|t| t.path).collect();
        let next = paths
            .iter()
            .position(|p| *p == self.snapshot.tracked_file)
            .map(|i| (i + 1) % paths.len())
            .and_then(|i| paths.get(i).cloned())
            .unwrap_or_else(|| self.tracked.primary_path().to_string());
        self.set_tracked_file(next);
        &self.snapshot.tracked_file
    }

    fn set_tracked_file(&mut self, path: String) {
        if path != self.snapshot.tracked_file {
            debug!(from = %self.snapshot.tracked_file, to = %path, "tracked file switched");
            self.snapshot.tracked_file = path;
            self.snapshot.content_by_index.clear();
        }
    }

    fn reload_config(&mut self) {
        let previous_primary = self.tracked.primary_path().to_string();
        self.tracked = config::load(&self.root);
        self.snapshot.config_warning = self.tracked.warning.clone();

        let current = &self.snapshot.tracked_file;
        let still_tracked = self.tracked.tracked().iter().any(|t| &t.path == current);
        if *current == previous_primary || !still_tracked {
            let primary = self.tracked.primary_path().to_string();
            self.set_tracked_file(primary);
        }
    }

    fn resolve_into(&mut self, index: usize) {
        let Some(gateway) = self.gateway.as_ref() else {
            return;
        };
        let Some(generation) = self.snapshot.generations.get(index) else {
            return;
        };
        let result = content::resolve(gateway, &generation.commit_id, &self.snapshot.tracked_file);
        self.snapshot.content_by_index.insert(index, result);
    }

    /// Replace the generation list with a fresh walk, carrying the selection
    /// and the set of resolved generations over by commit id.
    fn reconcile(&mut self, commits: Vec<CommitRecord>) {
        let id_at = |i: &usize| self.snapshot.generations.get(*i).map(|g| g.commit_id.clone());
        let selected_id = self.snapshot.selected_index.as_ref().and_then(id_at);
        let resolved_ids: Vec<String> = self.snapshot.content_by_index.keys().filter_map(id_at).collect();

        let generations = generation::assign(commits);
        let index_of: HashMap<&str, usize> = generations
            .iter()
            .map(|g| (g.commit_id.as_str(), g.index))
            .collect();

        let selected = match selected_id.as_deref().and_then(|id| index_of.get(id)) {
            Some(&index) => Some(index),
            None => generations.len().checked_sub(1),
        };
        let to_resolve: Vec<usize> = resolved_ids
            .iter()
            .filter_map(|id| index_of.get(id.as_str()).copied())
            .collect();
        drop(index_of);

        let previous_len = self.snapshot.len();
        self.snapshot.generations = generations;
        self.snapshot.selected_index = selected;
        self.snapshot.content_by_index.clear();
        for index in to_resolve {
            self.resolve_into(index);
        }

        if previous_len != self.snapshot.len() {
            info!(
                root = %self.root.display(),
                before = previous_len,
                after = self.snapshot.len(),
                "generation count changed"
            );
        }
    }
}
