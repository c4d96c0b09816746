/*!
# Rewrite Engine

Rule-driven rewriting of the internal tree.

## Architecture

- `Rule`: trait for a named node-to-node transformation
- `FnRule`: a rule assembled from two closures
- `RuleSet`: the ordered rules active for a run, drawn from the static registry
- `Rewriter`: post-order traversal, per-node rule application, fixed-point
  passes and failure isolation
- `rules`: the translation idioms shipped with the engine

## Example Usage

```rust,ignore
use std::sync::Arc;
use terminator_core::rewrite::{Rewriter, RuleSet};

let rules = Arc::new(RuleSet::select(&["ForLoopToRange", "CoutToPrint"])?);
let outcome = Rewriter::new(rules).fixed_point(true).rewrite(module, Some("main.cpp"))?;
println!("{} passes", outcome.passes);
```
*/

pub mod engine;
pub mod registry;
pub mod rule;
pub mod rules;

use crate::tree::Node;

pub use engine::{RewriteOutcome, Rewriter};
pub use registry::{registered, RuleInfo, RuleSet};
pub use rule::{FnRule, Rule, RuleStats};

/// Result type returned by rule transforms.
pub type RewriteResult<T> = anyhow::Result<T>;

/// What a rule may know about where it is running.
#[derive(Debug, Clone, Default)]
pub struct RewriteContext {
    pub file: Option<String>,
    /// 1-based pass number
    pub pass: usize,
}

impl RewriteContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }

    pub fn with_pass(mut self, pass: usize) -> Self {
        self.pass = pass;
        self
    }

    /// `file:line:column (pass n)` for log lines.
    pub fn locate(&self, node: &Node) -> String {
        let span = node
            .span()
            .map(|span| span.to_string())
            .unwrap_or_else(|| "-".to_string());
        match &self.file {
            Some(file) => format!("{}:{} (pass {})", file, span, self.pass),
            None => format!("{} (pass {})", span, self.pass),
        }
    }
}
