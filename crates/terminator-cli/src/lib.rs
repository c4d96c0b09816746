//! # Terminator CLI
//!
//! Argument parsing and the driver behind the `terminator` binary, kept in a
//! library so the integration tests can run it in-process.

pub mod cli;
pub mod diff;
pub mod run;

pub use cli::{build_cli, Options};
pub use diff::unified_diff;
pub use run::{list_rules, run, RunSummary};
