//! Deterministic, pure logic shared by the workflow engine and the steps.
//!
//! Core modules must be free of I/O side effects. They operate on in-memory
//! data structures and return deterministic outputs suitable for tests.

pub mod context;
pub mod facts;
pub mod intent;
pub mod risk;
pub mod state;
pub mod stats;
pub mod status;
pub mod step_ids;
pub mod types;
