//! Parsing of `git status --porcelain=v1 -z` and `git branch` output.

use anyhow::{Result, anyhow};

use crate::core::facts::ChangedFile;

/// Parse NUL-separated porcelain v1 output.
///
/// With `-z` paths are never quoted, and a rename or copy entry is followed by
/// a separate record holding the source path, which is dropped.
pub fn parse_porcelain(output: &str) -> Result<Vec<ChangedFile>> {
    let mut entries = Vec::new();
    let mut records = output.split('\0').filter(|record| !record.trim().is_empty());
    while let Some(record) = records.next() {
        let entry = parse_status_record(record)?;
        if entry.code.contains(['R', 'C']) {
            records
                .next()
                .ok_or_else(|| anyhow!("rename entry without source path: '{record}'"))?;
        }
        entries.push(entry);
    }
    Ok(entries)
}

fn parse_status_record(record: &str) -> Result<ChangedFile> {
    let record = record.trim_start_matches('\n');
    match (record.get(..2), record.get(2..3), record.get(3..)) {
        (Some(code), Some(" "), Some(path)) if !path.is_empty() => Ok(ChangedFile {
            code: code.to_string(),
            path: path.to_string(),
        }),
        _ => Err(anyhow!("unexpected porcelain record: '{record}'")),
    }
}

/// Parse `git branch --format=%(refname:short)` output.
pub fn parse_branch_list(output: &str) -> Vec<String> {
    output
        .lines()
        .map(str::trim)
        .map(|line| line.trim_start_matches("* "))
        .filter(|line| !line.is_empty() && !line.starts_with('('))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_untracked_and_modified_records() {
        let entries = parse_porcelain(" M src/main.rs\0?? foo.txt\0").expect("parse");
        assert_eq!(
            entries,
            vec![
                ChangedFile {
                    code: " M".to_string(),
                    path: "src/main.rs".to_string()
                },
                ChangedFile {
                    code: "??".to_string(),
                    path: "foo.txt".to_string()
                },
            ]
        );
        assert!(entries[1].is_untracked());
    }

    #[test]
    fn paths_with_spaces_are_kept_verbatim() {
        let entries = parse_porcelain("?? a b.txt\0 M caf\u{e9}.md\0").expect("parse");
        assert_eq!(entries[0].path, "a b.txt");
        assert_eq!(entries[1].path, "caf\u{e9}.md");
    }

    #[test]
    fn rename_keeps_new_path_and_drops_source() {
        let entries = parse_porcelain("R  new.txt\0old.txt\0?? x\0").expect("parse");
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].path, "new.txt");
        assert_eq!(entries[1].path, "x");
    }

    #[test]
    fn empty_output_is_clean() {
        assert!(parse_porcelain("").expect("parse").is_empty());
    }

    #[test]
    fn short_record_is_rejected() {
        assert!(parse_porcelain("M\0").is_err());
        assert!(parse_porcelain("R  new.txt\0").is_err());
    }

    #[test]
    fn branch_list_strips_marker_and_detached_head() {
        let branches = parse_branch_list("* main\n  feature/x\n(HEAD detached at 1a2b)\n");
        assert_eq!(branches, vec!["main", "feature/x"]);
    }
}
