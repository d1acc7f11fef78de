//! Typed facts shared between steps of one run.
//!
//! Every piece of intermediate state a step can publish has its own variant, so
//! the contract between a producer step and a consumer step is checked by the
//! compiler instead of by string keys.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One `git status --porcelain` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangedFile {
    /// 2-letter XY code, or "??" for untracked.
    pub code: String,
    pub path: String,
}

impl ChangedFile {
    pub fn is_untracked(&self) -> bool {
        self.code == "??"
    }

    pub fn is_staged(&self) -> bool {
        let index = self.code.chars().next().unwrap_or(' ');
        index != ' ' && index != '?'
    }
}

/// Aggregate of a `--shortstat`-style diff.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffSummary {
    pub files_changed: u32,
    pub insertions: u32,
    pub deletions: u32,
}

impl DiffSummary {
    pub fn is_empty(&self) -> bool {
        self.files_changed == 0 && self.insertions == 0 && self.deletions == 0
    }

    pub fn merge(self, other: DiffSummary) -> DiffSummary {
        DiffSummary {
            files_changed: self.files_changed + other.files_changed,
            insertions: self.insertions + other.insertions,
            deletions: self.deletions + other.deletions,
        }
    }
}

/// Code-change statistics over a period of history.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeStats {
    pub commits: u32,
    pub files_changed: u32,
    pub insertions: u32,
    pub deletions: u32,
    /// Most touched files, by lines changed (descending).
    pub top_files: Vec<(String, u32)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FactKey {
    HasChanges,
    ChangedFiles,
    CurrentBranch,
    DiffSummary,
    FilesAdded,
    CommitMessage,
    Committed,
    Pushed,
    Branches,
    SelectedBranch,
    MergedBranch,
    CodeStats,
}

impl FactKey {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::HasChanges => "has_changes",
            Self::ChangedFiles => "changed_files",
            Self::CurrentBranch => "current_branch",
            Self::DiffSummary => "diff_summary",
            Self::FilesAdded => "files_added",
            Self::CommitMessage => "commit_message",
            Self::Committed => "committed",
            Self::Pushed => "pushed",
            Self::Branches => "branches",
            Self::SelectedBranch => "selected_branch",
            Self::MergedBranch => "merged_branch",
            Self::CodeStats => "code_stats",
        }
    }
}

impl fmt::Display for FactKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "key", content = "value", rename_all = "snake_case")]
pub enum Fact {
    HasChanges(bool),
    ChangedFiles(Vec<ChangedFile>),
    CurrentBranch(String),
    DiffSummary(DiffSummary),
    FilesAdded(bool),
    CommitMessage(String),
    Committed(bool),
    Pushed(bool),
    Branches(Vec<String>),
    SelectedBranch(String),
    MergedBranch(String),
    CodeStats(CodeStats),
}

impl Fact {
    pub fn key(&self) -> FactKey {
        match self {
            Self::HasChanges(_) => FactKey::HasChanges,
            Self::ChangedFiles(_) => FactKey::ChangedFiles,
            Self::CurrentBranch(_) => FactKey::CurrentBranch,
            Self::DiffSummary(_) => FactKey::DiffSummary,
            Self::FilesAdded(_) => FactKey::FilesAdded,
            Self::CommitMessage(_) => FactKey::CommitMessage,
            Self::Committed(_) => FactKey::Committed,
            Self::Pushed(_) => FactKey::Pushed,
            Self::Branches(_) => FactKey::Branches,
            Self::SelectedBranch(_) => FactKey::SelectedBranch,
            Self::MergedBranch(_) => FactKey::MergedBranch,
            Self::CodeStats(_) => FactKey::CodeStats,
        }
    }
}

/// A step tried to publish a fact it did not declare in `writes()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UndeclaredFactError {
    pub step_id: String,
    pub key: FactKey,
}

impl fmt::Display for UndeclaredFactError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "step '{}' wrote fact '{}' without declaring it",
            self.step_id, self.key
        )
    }
}

impl std::error::Error for UndeclaredFactError {}
