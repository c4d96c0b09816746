//! # Terminator Core
//!
//! Tree-rewriting translation of C++ into Python:
//! - Internal tree model with validated, immutable nodes
//! - tree-sitter frontend and the converter into the internal tree
//! - Rule engine, rule registry and the shipped translation rules
//! - Python code generator
//! - Per-file translator and parallel batch runner
//!
//! The command-line driver lives in `terminator-cli`; everything it does is
//! available here as a library.

#![warn(clippy::all)]

pub mod batch;
pub mod codegen;
pub mod config;
pub mod convert;
pub mod diagnostics;
pub mod error;
pub mod frontend;
pub mod rewrite;
pub mod translate;
pub mod tree;

// Re-export commonly used types
pub use batch::{BatchReport, BatchRunner, FileOutcome};
pub use codegen::{GeneratorOptions, PythonGenerator, ToPython};
pub use config::TranslatorConfig;
pub use diagnostics::{Diagnostic, DiagnosticKind};
pub use error::{ConfigError, ParseError, RewriteError, StructuralError, TranslateError, UnknownRule};
pub use rewrite::{FnRule, RewriteContext, Rewriter, Rule, RuleSet, RuleStats};
pub use translate::{convert, Translation, Translator};
pub use tree::{Node, NodeKind, Span, TypeName};

/// Terminator version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Install the stderr log subscriber. `RUST_LOG` wins when set; otherwise
/// the translator crates log at info, or everything at debug when verbose.
pub fn init_tracing(verbose: bool) {
    let default = if verbose {
        "debug"
    } else {
        "terminator_core=info,terminator_cli=info"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));
    // a second call (tests, embedding) keeps the first subscriber
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
