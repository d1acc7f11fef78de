//! CLI tests: spawn the binary and check exit codes and output.

use std::process::{Command, Output, Stdio};

use gitwise::exit_codes;
use gitwise::io::config::CONFIG_ENV;
use gitwise::test_support::TestRepo;

fn gitwise(args: &[&str], cwd: &std::path::Path) -> Output {
    Command::new(env!("CARGO_BIN_EXE_gitwise"))
        .args(args)
        .current_dir(cwd)
        .env_remove(CONFIG_ENV)
        .env_remove("RUST_LOG")
        .stdin(Stdio::null())
        .output()
        .expect("spawn gitwise")
}

#[test]
fn help_lists_steps_and_exits_ok() {
    let temp = tempfile::tempdir().expect("tempdir");
    let output = gitwise(&["help"], temp.path());

    assert_eq!(output.status.code(), Some(exit_codes::OK));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("git-status"));
    assert!(stdout.contains("code-stats"));
    assert!(stdout.contains("c, continue"));
}

#[test]
fn unrelated_request_exits_with_no_plan() {
    let repo = TestRepo::new().expect("repo");
    let output = gitwise(&["make", "me", "a", "sandwich"], repo.path());

    assert_eq!(output.status.code(), Some(exit_codes::NO_PLAN));
    assert!(String::from_utf8_lossy(&output.stdout).contains("No workflow matches"));
}

#[test]
fn status_request_completes_without_prompts() {
    let repo = TestRepo::new().expect("repo");
    let output = gitwise(&["show", "status"], repo.path());

    assert_eq!(output.status.code(), Some(exit_codes::OK));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("On branch main"));
    assert!(stdout.contains("Working tree clean"));
}

#[test]
fn end_of_input_at_confirmation_exits_cleanly() {
    let repo = TestRepo::new().expect("repo");
    repo.write("a.txt", "a\n").expect("write");
    let output = gitwise(&["commit", "my", "work"], repo.path());

    assert_eq!(output.status.code(), Some(exit_codes::OK));
    assert!(String::from_utf8_lossy(&output.stdout).contains("Stopped"));
    assert!(!repo.git(&["status", "--porcelain"]).expect("status").is_empty());
}

#[test]
fn request_outside_repository_is_invalid() {
    let temp = tempfile::tempdir().expect("tempdir");
    let output = gitwise(&["show", "status"], temp.path());

    assert_eq!(output.status.code(), Some(exit_codes::INVALID));
    assert!(String::from_utf8_lossy(&output.stderr).contains("not inside a git work tree"));
}

#[test]
fn unknown_flag_is_invalid() {
    let temp = tempfile::tempdir().expect("tempdir");
    let output = gitwise(&["--no-such-flag"], temp.path());
    assert_eq!(output.status.code(), Some(exit_codes::INVALID));
}

#[test]
fn config_init_then_show_round_trips() {
    let temp = tempfile::tempdir().expect("tempdir");
    let repo = temp.path().to_str().expect("utf8 path");

    let output = gitwise(&["config", "path", "--repo", repo], temp.path());
    let path = String::from_utf8_lossy(&output.stdout).trim().to_string();
    assert!(path.ends_with("config.toml"));

    let output = gitwise(&["config", "init", "--repo", repo], temp.path());
    assert_eq!(output.status.code(), Some(exit_codes::OK));
    assert!(std::path::Path::new(&path).exists());

    let output = gitwise(&["config", "init", "--repo", repo], temp.path());
    assert_eq!(output.status.code(), Some(exit_codes::INVALID));
    assert!(String::from_utf8_lossy(&output.stderr).contains("--force"));

    let output = gitwise(&["config", "show", "--repo", repo], temp.path());
    assert_eq!(output.status.code(), Some(exit_codes::OK));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("[git]"));
    assert!(stdout.contains("challenge_code_len = 6"));
}
