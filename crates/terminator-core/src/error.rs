//! Error types for the translation pipeline.
//!
//! Recoverable problems (unsupported constructs, failing rules, rewriting
//! that does not settle) are reported as [`Diagnostic`](crate::Diagnostic)s
//! instead; the errors here abort a single file or, for configuration and
//! rule selection, the whole run before any file is touched.

use std::path::PathBuf;

use thiserror::Error;

/// The frontend rejected the input.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{line}:{column}: {message}")]
pub struct ParseError {
    pub message: String,
    /// 1-based, 0 when the failure has no location
    pub line: usize,
    pub column: usize,
}

/// An internal tree node was built with a child that does not fit its slot.
///
/// This is always a bug in the converter or in a rule, never a property of
/// the input program.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid {node} node: {slot} {problem}")]
pub struct StructuralError {
    pub node: &'static str,
    pub slot: &'static str,
    pub problem: String,
}

/// Fatal outcomes of the rewrite phase.
#[derive(Error, Debug)]
pub enum RewriteError {
    #[error(transparent)]
    Structural(#[from] StructuralError),

    /// Only raised in strict mode; otherwise a rule failure is a diagnostic.
    #[error("rule {rule} failed at {location}: {message}")]
    RuleFailed {
        rule: String,
        location: String,
        message: String,
    },

    /// Only raised in strict mode.
    #[error("rewriting did not reach a fixed point within {passes} passes")]
    NonConvergence { passes: usize },
}

/// Anything that stops a single file from translating.
#[derive(Error, Debug)]
pub enum TranslateError {
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("could not initialise the C++ parser: {0}")]
    Frontend(String),

    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Structural(#[from] StructuralError),

    #[error(transparent)]
    Rewrite(#[from] RewriteError),
}

/// A rule allow-list named a rule that is not registered.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown rule '{name}' (available: {available})")]
pub struct UnknownRule {
    pub name: String,
    pub available: String,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file {path}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),

    #[error(transparent)]
    UnknownRule(#[from] UnknownRule),
}
