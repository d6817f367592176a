//! Generations: commits numbered by chronological position

use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;

use crate::git::CommitRecord;

/// Display length of an abbreviated commit id
pub const SHORT_ID_LEN: usize = 7;

/// Where a generation sits in the timeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Position {
    /// Index 0 of several
    Oldest,
    Middle,
    /// Last of several
    Newest,
    /// The only generation: oldest and newest at once
    Only,
}

impl Position {
    fn of(index: usize, count: usize) -> Self {
        match (index == 0, index + 1 == count) {
            (true, true) => Self::Only,
            (true, false) => Self::Oldest,
            (false, true) => Self::Newest,
            (false, false) => Self::Middle,
        }
    }
}

/// One commit of the tracked repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Generation {
    /// 0 = oldest
    pub index: usize,
    pub commit_id: String,
    pub short_id: String,
    /// First line of the commit message
    pub message: String,
    /// Committer time, unix seconds
    pub timestamp: i64,
    pub position: Position,
}

impl Generation {
    pub fn committed_at(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(self.timestamp, 0)
            .single()
            .unwrap_or_else(Utc::now)
    }

    /// Commits whose message mentions "Genesis" start a lineage
    pub fn is_genesis(&self) -> bool {
        self.message.contains("Genesis")
    }

    /// List label: `Gen 3: first 30 chars of the message...`
    pub fn label(&self) -> String {
        const MAX_MESSAGE: usize = 30;
        let mut message: String = self.message.chars().take(MAX_MESSAGE).collect();
        if self.message.chars().count() > MAX_MESSAGE {
            message.push_str("...");
        }
        format!("Gen {}: {}", self.index, message)
    }
}

/// Number an oldest-first commit list
pub fn assign(commits: Vec<CommitRecord>) -> Vec<Generation> {
    let count = commits.len();
    commits
        .into_iter()
        .enumerate()
        .map(|(index, record)| Generation {
            index,
            short_id: record.id.chars().take(SHORT_ID_LEN).collect(),
            message: first_line(&record.message),
            timestamp: record.timestamp,
            position: Position::of(index, count),
            commit_id: record.id,
        })
        .collect()
}

fn first_line(message: &str) -> String {
    message.lines().next().unwrap_or("").trim().to_string()
}
