//! Parsing of diff statistics (`--shortstat`, `--numstat`).

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::core::facts::{CodeStats, DiffSummary};

static FILES_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+) files? changed").expect("files regex"));
static INSERTIONS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+) insertions?\(\+\)").expect("insertions regex"));
static DELETIONS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+) deletions?\(-\)").expect("deletions regex"));

/// Marker line printed before each commit by [`numstat_log_args`].
pub const COMMIT_MARKER: &str = "@@commit";

const TOP_FILES: usize = 5;

/// Parse a `git diff --shortstat` line. Empty output means no changes.
pub fn parse_shortstat(output: &str) -> DiffSummary {
    let capture = |re: &Regex| {
        re.captures(output)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse::<u32>().ok())
            .unwrap_or(0)
    };
    DiffSummary {
        files_changed: capture(&FILES_RE),
        insertions: capture(&INSERTIONS_RE),
        deletions: capture(&DELETIONS_RE),
    }
}

/// Arguments for a `git log` whose output [`parse_numstat_log`] understands.
pub fn numstat_log_args(since: &str) -> Vec<String> {
    vec![
        "log".to_string(),
        format!("--since={since}"),
        "--numstat".to_string(),
        format!("--format=tformat:{COMMIT_MARKER}"),
    ]
}

/// Aggregate `git log --numstat` output into [`CodeStats`].
///
/// Binary files (`-` counts) count as changed files with zero lines.
pub fn parse_numstat_log(output: &str) -> CodeStats {
    let mut commits = 0u32;
    let mut insertions = 0u32;
    let mut deletions = 0u32;
    let mut per_file: BTreeMap<String, u32> = BTreeMap::new();

    for line in output.lines() {
        let line = line.trim_end();
        if line == COMMIT_MARKER {
            commits += 1;
            continue;
        }
        let mut fields = line.splitn(3, '\t');
        let (Some(added), Some(removed), Some(path)) = (fields.next(), fields.next(), fields.next())
        else {
            continue;
        };
        let added = added.parse::<u32>().unwrap_or(0);
        let removed = removed.parse::<u32>().unwrap_or(0);
        insertions += added;
        deletions += removed;
        *per_file.entry(path.to_string()).or_default() += added + removed;
    }

    let files_changed = per_file.len() as u32;
    let mut top_files: Vec<(String, u32)> = per_file.into_iter().collect();
    top_files.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    top_files.truncate(TOP_FILES);

    CodeStats {
        commits,
        files_changed,
        insertions,
        deletions,
        top_files,
    }
}
