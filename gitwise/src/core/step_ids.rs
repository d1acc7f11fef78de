//! Identifiers of the built-in steps.

pub const STATUS: &str = "git-status";
pub const DIFF: &str = "git-diff";
pub const ADD: &str = "git-add";
pub const COMMIT: &str = "git-commit";
pub const PUSH: &str = "git-push";
pub const BRANCH_LIST: &str = "git-branch-list";
pub const BRANCH_SWITCH: &str = "git-branch-switch";
pub const MERGE: &str = "git-merge";
pub const CODE_STATS: &str = "code-stats";
