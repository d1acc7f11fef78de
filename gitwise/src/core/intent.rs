//! Keyword rules mapping a free-text request to built-in step ids.
//!
//! Rules are checked in order; the first match decides the whole plan. A
//! request that matches nothing yields an empty plan.

use std::sync::LazyLock;

use regex::Regex;

use crate::core::step_ids::{
    ADD, BRANCH_LIST, BRANCH_SWITCH, CODE_STATS, COMMIT, DIFF, MERGE, PUSH, STATUS,
};

/// One keyword rule.
#[derive(Debug)]
pub struct IntentRule {
    pub name: &'static str,
    pattern: Regex,
    pub steps: &'static [&'static str],
    pub summary: &'static str,
}

impl IntentRule {
    fn new(
        name: &'static str,
        pattern: &str,
        steps: &'static [&'static str],
        summary: &'static str,
    ) -> Self {
        Self {
            name,
            pattern: Regex::new(pattern).expect("intent rule pattern"),
            steps,
            summary,
        }
    }

    pub fn matches(&self, input: &str) -> bool {
        self.pattern.is_match(input)
    }
}

/// Ordered rule table. More specific intents come first.
pub static INTENT_RULES: LazyLock<Vec<IntentRule>> = LazyLock::new(|| {
    vec![
        IntentRule::new(
            "push",
            r"(?i)\b(push|publish|upload|sync)\b",
            &[STATUS, DIFF, ADD, COMMIT, PUSH],
            "Check the working tree, stage and commit the changes, then push them",
        ),
        IntentRule::new(
            "commit",
            r"(?i)\b(commit|save|check ?in)\b",
            &[STATUS, DIFF, ADD, COMMIT],
            "Check the working tree, then stage and commit the changes",
        ),
        IntentRule::new(
            "merge",
            r"(?i)\bmerge\b",
            &[BRANCH_LIST, MERGE],
            "List branches and merge one into the current branch",
        ),
        IntentRule::new(
            "switch",
            r"(?i)\b(switch|checkout|check out|new branch|create (a )?branch)\b",
            &[BRANCH_LIST, BRANCH_SWITCH],
            "List branches and switch to (or create) a branch",
        ),
        IntentRule::new(
            "branches",
            r"(?i)\bbranch(es)?\b",
            &[BRANCH_LIST],
            "List local branches",
        ),
        IntentRule::new(
            "stats",
            r"(?i)\b(stats|statistics|how much|lines of code|productivity)\b",
            &[CODE_STATS],
            "Summarize recent code-change statistics",
        ),
        IntentRule::new(
            "diff",
            r"(?i)\b(diff|review|what changed|changes)\b",
            &[STATUS, DIFF],
            "Check the working tree and analyze the diff",
        ),
        IntentRule::new(
            "status",
            r"(?i)\b(status|state|clean|dirty)\b",
            &[STATUS],
            "Check the working tree status",
        ),
    ]
});

/// First rule matching `input`, if any.
pub fn match_intent(input: &str) -> Option<&'static IntentRule> {
    INTENT_RULES.iter().find(|rule| rule.matches(input))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_request_plans_full_publish() {
        let rule = match_intent("commit and push my work").expect("rule");
        assert_eq!(rule.name, "push");
        assert_eq!(rule.steps.last(), Some(&PUSH));
    }

    #[test]
    fn commit_request_stops_before_push() {
        let rule = match_intent("please commit these changes").expect("rule");
        assert_eq!(rule.steps, &[STATUS, DIFF, ADD, COMMIT]);
    }

    #[test]
    fn branch_words_route_to_branch_steps() {
        assert_eq!(match_intent("merge feature into main").expect("rule").name, "merge");
        assert_eq!(
            match_intent("switch to the release branch").expect("rule").name,
            "switch"
        );
        assert_eq!(match_intent("show branches").expect("rule").name, "branches");
    }

    #[test]
    fn stats_and_status_are_distinct() {
        assert_eq!(match_intent("code stats for today").expect("rule").name, "stats");
        assert_eq!(match_intent("what's the status?").expect("rule").name, "status");
    }

    #[test]
    fn unrelated_request_matches_nothing() {
        assert!(match_intent("make me a sandwich").is_none());
    }
}
