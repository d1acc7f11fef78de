//! Shared deterministic types for the workflow core.
//!
//! These types define the contracts between the engine, the prompter and the
//! risk gate. They carry no I/O and must stay stable across runs.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Decision taken before a step that requires confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PreStepDecision {
    Continue,
    Skip,
    Exit,
}

impl PreStepDecision {
    /// Parse a typed answer. Empty input means `Continue`.
    pub fn parse(answer: &str) -> Option<Self> {
        match answer.trim().to_ascii_lowercase().as_str() {
            "" | "c" | "continue" | "y" | "yes" => Some(Self::Continue),
            "s" | "skip" => Some(Self::Skip),
            "e" | "exit" | "q" | "quit" => Some(Self::Exit),
            _ => None,
        }
    }
}

/// Decision taken after a step action failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorDecision {
    ContinueAfterError,
    #[default]
    ExitOnError,
}

impl ErrorDecision {
    /// Parse a typed answer. Empty input means `ExitOnError`.
    pub fn parse(answer: &str) -> Option<Self> {
        match answer.trim().to_ascii_lowercase().as_str() {
            "c" | "continue" => Some(Self::ContinueAfterError),
            "" | "e" | "exit" | "q" | "quit" => Some(Self::ExitOnError),
            _ => None,
        }
    }
}

/// Terminal outcome of one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    /// Every step was visited without an abort.
    Completed,
    /// No resolvable step ids; nothing ran.
    NoPlan,
    /// The user chose `Exit` before a step.
    UserAborted,
    /// The user chose `ExitOnError` after a failed step.
    Aborted,
}

impl RunOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::NoPlan => "no plan",
            Self::UserAborted => "stopped by user",
            Self::Aborted => "aborted",
        }
    }
}

impl fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Risk level of a candidate command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Advisory classification of one command. Never cached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub level: RiskLevel,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mitigation: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pre_step_empty_answer_continues() {
        assert_eq!(PreStepDecision::parse(""), Some(PreStepDecision::Continue));
        assert_eq!(PreStepDecision::parse(" Skip "), Some(PreStepDecision::Skip));
        assert_eq!(PreStepDecision::parse("q"), Some(PreStepDecision::Exit));
        assert_eq!(PreStepDecision::parse("maybe"), None);
    }

    #[test]
    fn error_decision_defaults_to_exit() {
        assert_eq!(ErrorDecision::parse(""), Some(ErrorDecision::ExitOnError));
        assert_eq!(ErrorDecision::default(), ErrorDecision::ExitOnError);
        assert_eq!(
            ErrorDecision::parse("continue"),
            Some(ErrorDecision::ContinueAfterError)
        );
        assert_eq!(ErrorDecision::parse("skip"), None);
    }

    #[test]
    fn risk_levels_order_by_severity() {
        assert!(RiskLevel::High > RiskLevel::Medium);
        assert!(RiskLevel::Medium > RiskLevel::Low);
    }
}
