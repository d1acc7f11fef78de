//! Deterministic risk classification of git command text.
//!
//! High-risk patterns are checked first and win over any medium match. Within
//! a table the first matching pattern supplies the description.

use crate::core::types::{RiskAssessment, RiskLevel};

/// One substring rule of a risk table.
#[derive(Debug, Clone, Copy)]
pub struct RiskPattern {
    pub pattern: &'static str,
    pub description: &'static str,
    pub mitigation: &'static str,
}

const fn rule(
    pattern: &'static str,
    description: &'static str,
    mitigation: &'static str,
) -> RiskPattern {
    RiskPattern {
        pattern,
        description,
        mitigation,
    }
}

/// Forced history rewrite, forced deletion, forced push.
pub const HIGH_RISK_PATTERNS: &[RiskPattern] = &[
    rule(
        "reset --hard",
        "Discards uncommitted work and moves the branch pointer",
        "Stash or commit local changes first; `git reflog` can recover lost commits",
    ),
    rule(
        "push --force",
        "Overwrites remote history",
        "Prefer `--force-with-lease` and coordinate with collaborators",
    ),
    rule(
        "push -f",
        "Overwrites remote history",
        "Prefer `--force-with-lease` and coordinate with collaborators",
    ),
    rule(
        "branch -D",
        "Deletes a branch even if it is not merged",
        "Use `branch -d` to refuse deleting unmerged work",
    ),
    rule(
        "clean -f",
        "Permanently deletes untracked files",
        "Preview with `git clean -n` first",
    ),
    rule(
        "clean -d",
        "Permanently deletes untracked directories",
        "Preview with `git clean -n` first",
    ),
    rule(
        "checkout -f",
        "Discards local modifications while switching",
        "Stash local changes before switching",
    ),
    rule(
        "checkout -- .",
        "Discards every unstaged modification",
        "Stash local changes instead",
    ),
    rule(
        "restore .",
        "Discards every unstaged modification",
        "Stash local changes instead",
    ),
    rule(
        "filter-branch",
        "Rewrites the whole history of the repository",
        "Work on a fresh clone and keep a backup",
    ),
    rule(
        "rebase -i",
        "Rewrites commit history interactively",
        "Create a backup branch before rewriting",
    ),
    rule(
        "stash clear",
        "Drops every stash entry",
        "Inspect `git stash list` before clearing",
    ),
    rule(
        "stash drop",
        "Drops a stash entry",
        "Inspect the entry with `git stash show -p` first",
    ),
    rule(
        "reflog expire",
        "Removes the safety net used to recover lost commits",
        "Leave reflog expiry to git's own maintenance",
    ),
    rule(
        "update-ref -d",
        "Deletes a reference directly",
        "Double-check the reference name",
    ),
];

/// State-altering but recoverable operations.
pub const MEDIUM_RISK_PATTERNS: &[RiskPattern] = &[
    rule(
        "commit --amend",
        "Replaces the last commit",
        "Avoid amending commits that were already pushed",
    ),
    rule(
        "reset",
        "Moves the branch pointer or unstages changes",
        "`git reflog` can restore the previous position",
    ),
    rule(
        "rebase",
        "Replays commits on a new base",
        "Use `git rebase --abort` if conflicts get out of hand",
    ),
    rule(
        "merge",
        "Combines another branch into the current one",
        "Use `git merge --abort` to back out of conflicts",
    ),
    rule(
        "cherry-pick",
        "Copies commits onto the current branch",
        "Use `git cherry-pick --abort` to back out",
    ),
    rule(
        "revert",
        "Creates commits that undo earlier changes",
        "Revert commits can themselves be reverted",
    ),
    rule(
        "checkout",
        "Switches branches or rewrites working tree files",
        "Commit or stash local changes before switching",
    ),
    rule(
        "switch",
        "Switches branches",
        "Commit or stash local changes before switching",
    ),
    rule(
        "branch -d",
        "Deletes a merged branch",
        "The branch can be recreated from its last commit",
    ),
    rule(
        "branch -m",
        "Renames a branch",
        "Rename it back if something depends on the old name",
    ),
    rule(
        "stash",
        "Moves local changes onto the stash",
        "Restore them with `git stash pop`",
    ),
    rule(
        "pull",
        "Fetches and merges remote changes",
        "Make sure local work is committed first",
    ),
    rule(
        "push",
        "Publishes commits to the remote",
        "Check the target remote and branch",
    ),
    rule(
        "tag -d",
        "Deletes a tag",
        "Tags can be recreated on the same commit",
    ),
];

/// Collapse whitespace and drop a leading `git` program name.
pub fn normalize_command(command: &str) -> String {
    let mut parts = command.split_whitespace().peekable();
    if parts.peek() == Some(&"git") {
        parts.next();
    }
    parts.collect::<Vec<_>>().join(" ")
}

/// First pattern of `table` that matches `normalized`.
pub fn first_match<'t>(table: &'t [RiskPattern], normalized: &str) -> Option<&'t RiskPattern> {
    table.iter().find(|rule| normalized.contains(rule.pattern))
}

/// Classify a command with the fixed pattern tables. Pure and infallible.
pub fn classify_local(command: &str) -> RiskAssessment {
    let normalized = normalize_command(command);
    if let Some(rule) = first_match(HIGH_RISK_PATTERNS, &normalized) {
        return assessment(RiskLevel::High, rule);
    }
    if let Some(rule) = first_match(MEDIUM_RISK_PATTERNS, &normalized) {
        return assessment(RiskLevel::Medium, rule);
    }
    RiskAssessment {
        level: RiskLevel::Low,
        description: "Read-only or easily reversible operation".to_string(),
        mitigation: None,
    }
}

fn assessment(level: RiskLevel, rule: &RiskPattern) -> RiskAssessment {
    RiskAssessment {
        level,
        description: rule.description.to_string(),
        mitigation: Some(rule.mitigation.to_string()),
    }
}
