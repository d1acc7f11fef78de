//! Risk-proportional confirmation before a mutating command runs.

use std::fmt;

use anyhow::Result;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{info, warn};

use crate::core::types::{RiskAssessment, RiskLevel};
use crate::io::terminal::Prompter;
use crate::risk::RiskClassifier;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateVerdict {
    Approved,
    Declined,
}

/// The retyped code did not match; the command was not executed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChallengeFailed {
    pub command: String,
}

impl fmt::Display for ChallengeFailed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "confirmation code mismatch, `git {}` was not executed",
            self.command
        )
    }
}

impl std::error::Error for ChallengeFailed {}

pub struct RiskGate {
    classifier: Box<dyn RiskClassifier>,
    code_len: usize,
    rng: StdRng,
}

impl RiskGate {
    pub fn new(classifier: Box<dyn RiskClassifier>, code_len: usize) -> Self {
        Self {
            classifier,
            code_len,
            rng: StdRng::from_entropy(),
        }
    }

    /// Deterministic challenge codes, for tests.
    pub fn with_seed(classifier: Box<dyn RiskClassifier>, code_len: usize, seed: u64) -> Self {
        Self {
            classifier,
            code_len,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn classify(&self, command: &str) -> Result<RiskAssessment> {
        self.classifier.classify(command)
    }

    /// Ask the user to approve `command` with a strength matching its risk.
    ///
    /// A declined confirmation is `Ok(Declined)`; a wrong challenge code is an
    /// error carrying [`ChallengeFailed`].
    pub fn review(&mut self, prompter: &mut dyn Prompter, command: &str) -> Result<GateVerdict> {
        let assessment = self.classify(command)?;
        info!(command, level = %assessment.level, "classified command");

        if assessment.level >= RiskLevel::Medium {
            prompter.warn(&format!(
                "{} risk: {}",
                assessment.level, assessment.description
            ))?;
            if let Some(mitigation) = &assessment.mitigation {
                prompter.show(&format!("  mitigation: {mitigation}"))?;
            }
        }

        if !prompter.confirm(&format!("Run `git {command}`?"))? {
            info!(command, "command declined");
            return Ok(GateVerdict::Declined);
        }

        if assessment.level == RiskLevel::High {
            let code = generate_code(&mut self.rng, self.code_len);
            let typed = prompter.ask(&format!("Type {code} to confirm"), None)?;
            if typed.trim() != code {
                warn!(command, "challenge code mismatch");
                return Err(ChallengeFailed {
                    command: command.to_string(),
                }
                .into());
            }
        }
        Ok(GateVerdict::Approved)
    }
}

/// Random decimal code of `len` digits.
pub fn generate_code(rng: &mut impl Rng, len: usize) -> String {
    (0..len)
        .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
        .collect()
}
