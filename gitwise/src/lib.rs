//! Natural-language git workflows.
//!
//! A free-text request is turned into an ordered list of registered steps,
//! which the engine runs one by one with confirmation, skip and
//! error-recovery prompts. State-changing git commands pass a risk gate whose
//! confirmation strength grows with the command's risk.
//!
//! - **[`core`]**: Pure, deterministic logic (facts, state machine, risk
//!   tables, output parsers). No I/O.
//! - **[`io`]**: Side effects (git and model processes, config, terminal).
//!
//! Orchestration modules ([`engine`], [`planner`], [`gate`], [`steps`],
//! [`session`]) combine the two.

pub mod core;
pub mod engine;
pub mod exit_codes;
pub mod fallback;
pub mod gate;
pub mod io;
pub mod logging;
pub mod plan;
pub mod planner;
pub mod registry;
pub mod risk;
pub mod session;
pub mod step;
pub mod steps;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
