//! Side-effecting adapters: config files, child processes, git, the model
//! command and the terminal.

pub mod config;
pub mod executor;
pub mod git;
pub mod model;
pub mod process;
pub mod prompt;
pub mod terminal;
