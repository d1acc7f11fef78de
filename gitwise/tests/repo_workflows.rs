//! Built-in steps against a real temporary git repository.

use gitwise::core::state::StepState;
use gitwise::core::types::{PreStepDecision, RunOutcome};
use gitwise::engine::{RunReport, WorkflowEngine};
use gitwise::gate::RiskGate;
use gitwise::io::config::{GitConfig, StepsConfig};
use gitwise::io::executor::GitExecutor;
use gitwise::planner::RulePlanResolver;
use gitwise::risk::LocalRiskClassifier;
use gitwise::step::StepEnv;
use gitwise::steps::builtin_registry;
use gitwise::steps::message::RuleCommitMessages;
use gitwise::test_support::{Answer, ScriptedPrompter, TestRepo};

fn run(repo: &TestRepo, request: &str, answers: Vec<Answer>) -> (RunReport, ScriptedPrompter) {
    let executor = GitExecutor::new(repo.path(), &GitConfig::default());
    let mut prompter = ScriptedPrompter::new(answers);
    let mut gate = RiskGate::with_seed(Box::new(LocalRiskClassifier), 6, 1);
    let settings = StepsConfig::default();
    let engine = WorkflowEngine::new(builtin_registry().expect("registry"), RulePlanResolver);
    let report = {
        let mut env = StepEnv {
            executor: &executor,
            prompter: &mut prompter,
            gate: &mut gate,
            messages: &RuleCommitMessages,
            settings: &settings,
        };
        engine.process_input(request, &mut env).expect("run")
    };
    (report, prompter)
}

#[test]
fn status_reports_untracked_file() {
    let repo = TestRepo::new().expect("repo");
    repo.write("notes.md", "todo\n").expect("write");

    let (report, _) = run(&repo, "what's the status", vec![]);

    assert_eq!(report.outcome, RunOutcome::Completed);
    let ctx = report.context.expect("context");
    assert_eq!(ctx.has_changes(), Some(true));
    assert_eq!(ctx.current_branch(), Some("main"));
    let files = ctx.changed_files().expect("files");
    assert_eq!(files.len(), 1);
    assert!(files[0].is_untracked());
    assert_eq!(files[0].path, "notes.md");
}

#[test]
fn commit_request_creates_commit() {
    let repo = TestRepo::new().expect("repo");
    repo.write("README.md", "hello\n").expect("write");
    repo.write("src/lib.rs", "pub fn f() {}\n").expect("write");

    let (report, _) = run(
        &repo,
        "commit my changes",
        vec![
            Answer::Step(PreStepDecision::Continue),
            Answer::Confirm(true),
            Answer::Step(PreStepDecision::Continue),
            Answer::Text("Add library stub".to_string()),
            Answer::Confirm(true),
        ],
    );

    assert_eq!(report.outcome, RunOutcome::Completed);
    let ctx = report.context.expect("context");
    assert_eq!(ctx.committed(), Some(true));
    assert_eq!(ctx.diff_summary().map(|d| d.files_changed), Some(1));
    assert_eq!(
        repo.git(&["log", "-1", "--format=%s"]).expect("log").trim(),
        "Add library stub"
    );
    assert!(repo.git(&["status", "--porcelain"]).expect("status").trim().is_empty());
}

#[test]
fn commit_request_on_clean_tree_skips_mutations() {
    let repo = TestRepo::new().expect("repo");

    let (report, _) = run(&repo, "commit everything", vec![]);

    assert_eq!(report.outcome, RunOutcome::Completed);
    assert_eq!(report.state_of("git-status"), Some(StepState::Completed));
    assert_eq!(report.state_of("git-diff"), Some(StepState::Skipped));
    assert_eq!(report.state_of("git-add"), Some(StepState::Skipped));
    assert_eq!(report.state_of("git-commit"), Some(StepState::Skipped));
}

#[test]
fn create_branch_switches_to_it() {
    let repo = TestRepo::new().expect("repo");

    let (report, prompter) = run(
        &repo,
        "create a new branch",
        vec![
            Answer::Step(PreStepDecision::Continue),
            Answer::Choice(Some(0)),
            Answer::Text("feature/x".to_string()),
            Answer::Confirm(true),
        ],
    );

    assert_eq!(report.outcome, RunOutcome::Completed);
    assert_eq!(
        repo.git(&["rev-parse", "--abbrev-ref", "HEAD"]).expect("head").trim(),
        "feature/x"
    );
    assert!(prompter.warnings()[0].starts_with("medium risk"));
}

#[test]
fn merge_request_merges_selected_branch() {
    let repo = TestRepo::new().expect("repo");
    repo.git(&["checkout", "--quiet", "-b", "dev"]).expect("branch");
    repo.write("dev.txt", "dev\n").expect("write");
    repo.git(&["add", "dev.txt"]).expect("add");
    repo.git(&["commit", "--quiet", "-m", "dev work"]).expect("commit");
    repo.git(&["checkout", "--quiet", "main"]).expect("checkout");

    let (report, _) = run(
        &repo,
        "merge dev please",
        vec![
            Answer::Step(PreStepDecision::Continue),
            Answer::Choice(Some(0)),
            Answer::Confirm(true),
        ],
    );

    assert_eq!(report.outcome, RunOutcome::Completed);
    let ctx = report.context.expect("context");
    assert_eq!(ctx.merged_branch(), Some("dev"));
    assert!(repo.path().join("dev.txt").exists());
}

#[test]
fn stats_count_recent_commits() {
    let repo = TestRepo::new().expect("repo");

    let (report, _) = run(&repo, "show me code statistics", vec![]);

    let ctx = report.context.expect("context");
    let stats = ctx.code_stats().expect("stats");
    assert_eq!(stats.commits, 1);
    assert_eq!(stats.insertions, 1);
}
