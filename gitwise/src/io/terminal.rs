//! Interactive prompts.
//!
//! Every point where the workflow waits for a human goes through
//! [`Prompter`], so tests can script the conversation.

use std::io::{BufRead, Write};

use anyhow::{Context, Result};

use crate::core::context::StepInfo;
use crate::core::types::{ErrorDecision, PreStepDecision};

/// Answers within a run are attempted this many times before giving up.
const MAX_ATTEMPTS: usize = 3;

pub trait Prompter {
    /// Print an informational line.
    fn show(&mut self, message: &str) -> Result<()>;
    /// Print a warning line.
    fn warn(&mut self, message: &str) -> Result<()>;
    /// Yes/no question. End of input counts as "no".
    fn confirm(&mut self, question: &str) -> Result<bool>;
    /// Free-text question; an empty answer yields `default` when given.
    fn ask(&mut self, question: &str, default: Option<&str>) -> Result<String>;
    /// Pick one of `options` by number; `None` when the user declines.
    fn choose(&mut self, question: &str, options: &[String]) -> Result<Option<usize>>;
    /// Continue / Skip / Exit before a confirmed step.
    fn confirm_step(&mut self, step: &StepInfo) -> Result<PreStepDecision>;
    /// ContinueAfterError / ExitOnError after a failed step.
    fn on_step_error(&mut self, step: &StepInfo, error: &str) -> Result<ErrorDecision>;
}

/// Prompter over any line reader and writer (stdin/stdout in the CLI).
pub struct TerminalPrompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> TerminalPrompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn into_output(self) -> W {
        self.output
    }

    /// Print `prompt` and read one line. `None` on end of input.
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>> {
        write!(self.output, "{prompt}").context("write prompt")?;
        self.output.flush().context("flush prompt")?;
        let mut line = String::new();
        let n = self.input.read_line(&mut line).context("read answer")?;
        if n == 0 {
            writeln!(self.output).context("write newline")?;
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }

    /// Ask until `parse` accepts the answer; `on_eof` on end of input or
    /// after too many invalid answers.
    fn ask_parsed<T>(
        &mut self,
        prompt: &str,
        hint: &str,
        on_eof: T,
        parse: impl Fn(&str) -> Option<T>,
    ) -> Result<T> {
        for _ in 0..MAX_ATTEMPTS {
            let Some(answer) = self.read_line(prompt)? else {
                return Ok(on_eof);
            };
            if let Some(value) = parse(&answer) {
                return Ok(value);
            }
            writeln!(self.output, "  {hint}").context("write hint")?;
        }
        Ok(on_eof)
    }
}

impl<R: BufRead, W: Write> Prompter for TerminalPrompter<R, W> {
    fn show(&mut self, message: &str) -> Result<()> {
        writeln!(self.output, "{message}").context("write message")
    }

    fn warn(&mut self, message: &str) -> Result<()> {
        writeln!(self.output, "warning: {message}").context("write warning")
    }

    fn confirm(&mut self, question: &str) -> Result<bool> {
        self.ask_parsed(
            &format!("{question} [y/N] "),
            "answer y or n",
            false,
            |answer| match answer.trim().to_ascii_lowercase().as_str() {
                "y" | "yes" => Some(true),
                "" | "n" | "no" => Some(false),
                _ => None,
            },
        )
    }

    fn ask(&mut self, question: &str, default: Option<&str>) -> Result<String> {
        let prompt = match default {
            Some(default) => format!("{question} [{default}]: "),
            None => format!("{question}: "),
        };
        let answer = self.read_line(&prompt)?.unwrap_or_default();
        let answer = answer.trim();
        if answer.is_empty() {
            return Ok(default.unwrap_or_default().to_string());
        }
        Ok(answer.to_string())
    }

    fn choose(&mut self, question: &str, options: &[String]) -> Result<Option<usize>> {
        if options.is_empty() {
            return Ok(None);
        }
        writeln!(self.output, "{question}").context("write question")?;
        for (index, option) in options.iter().enumerate() {
            writeln!(self.output, "  {}) {option}", index + 1).context("write option")?;
        }
        let count = options.len();
        self.ask_parsed(
            &format!("choice [1-{count}, empty to cancel]: "),
            "enter a number from the list",
            None,
            |answer| {
                let answer = answer.trim();
                if answer.is_empty() {
                    return Some(None);
                }
                match answer.parse::<usize>() {
                    Ok(n) if (1..=count).contains(&n) => Some(Some(n - 1)),
                    _ => None,
                }
            },
        )
    }

    fn confirm_step(&mut self, step: &StepInfo) -> Result<PreStepDecision> {
        writeln!(self.output, "\n> {}: {}", step.name, step.description)
            .context("write step")?;
        self.ask_parsed(
            "  [c]ontinue / [s]kip / [e]xit (default continue): ",
            "answer c, s or e",
            PreStepDecision::Exit,
            PreStepDecision::parse,
        )
    }

    fn on_step_error(&mut self, step: &StepInfo, error: &str) -> Result<ErrorDecision> {
        writeln!(self.output, "\nx {} failed: {error}", step.name).context("write error")?;
        self.ask_parsed(
            "  [c]ontinue with the next step / [e]xit (default exit): ",
            "answer c or e",
            ErrorDecision::ExitOnError,
            ErrorDecision::parse,
        )
    }
}
