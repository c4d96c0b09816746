//! Non-fatal findings collected while translating one file.

use std::fmt;

use serde::Serialize;

use crate::tree::Span;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind")]
pub enum DiagnosticKind {
    /// A construct outside the supported subset was kept as an opaque node.
    Unsupported,
    /// A rule errored or panicked; the node it was looking at is unchanged.
    RuleFailure { rule: String },
    /// Fixed-point rewriting was still changing the tree after the last pass.
    NonConvergence { passes: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub span: Option<Span>,
    pub message: String,
}

impl Diagnostic {
    pub fn unsupported(span: Option<Span>, message: impl Into<String>) -> Self {
        Self {
            kind: DiagnosticKind::Unsupported,
            span,
            message: message.into(),
        }
    }

    pub fn rule_failure(rule: &str, span: Option<Span>, message: impl Into<String>) -> Self {
        Self {
            kind: DiagnosticKind::RuleFailure {
                rule: rule.to_string(),
            },
            span,
            message: message.into(),
        }
    }

    pub fn non_convergence(passes: usize) -> Self {
        Self {
            kind: DiagnosticKind::NonConvergence { passes },
            span: None,
            message: format!("tree was still changing after {passes} passes"),
        }
    }

    pub fn is_unsupported(&self) -> bool {
        self.kind == DiagnosticKind::Unsupported
    }

    /// `line:column`, or `-` when there is no location.
    pub fn location(&self) -> String {
        match self.span {
            Some(span) => span.to_string(),
            None => "-".to_string(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            DiagnosticKind::Unsupported => {
                write!(f, "{}: unsupported: {}", self.location(), self.message)
            }
            DiagnosticKind::RuleFailure { rule } => {
                write!(f, "{}: rule {} failed: {}", self.location(), rule, self.message)
            }
            DiagnosticKind::NonConvergence { .. } => {
                write!(f, "{}: no fixed point: {}", self.location(), self.message)
            }
        }
    }
}
