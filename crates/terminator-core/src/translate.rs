/*!
# Translator

The per-file pipeline: parse, convert, rewrite, generate. A `Translator` is
built once per run and shared by every worker; each call creates its own
parser and tree, so files never share mutable state.

```rust,ignore
use terminator_core::{Translator, TranslatorConfig};

let translator = Translator::from_config(&TranslatorConfig::default())?;
let translation = translator.convert("int main() { return 0; }")?;
print!("{}", translation.output);
```
*/

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info};

use crate::codegen::{GeneratorOptions, PythonGenerator};
use crate::config::TranslatorConfig;
use crate::convert::convert as lower;
use crate::diagnostics::Diagnostic;
use crate::error::{TranslateError, UnknownRule};
use crate::frontend::CppFrontend;
use crate::rewrite::{Rewriter, RuleSet, RuleStats};
use crate::tree::Node;

/// Everything one file's translation produced.
#[derive(Debug)]
pub struct Translation {
    /// Generated Python source
    pub output: String,
    /// Converter findings followed by rewrite findings
    pub diagnostics: Vec<Diagnostic>,
    pub stats: BTreeMap<String, RuleStats>,
    pub passes: usize,
    /// The rewritten tree the output was generated from
    pub tree: Node,
}

impl Translation {
    pub fn rewrites(&self) -> u64 {
        self.stats.values().map(|s| s.rewrites).sum()
    }

    pub fn unsupported(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| d.is_unsupported())
    }
}

pub struct Translator {
    rewriter: Rewriter,
    generator: PythonGenerator,
}

impl Translator {
    /// Single-pass rewriting with the given rules and default output options.
    pub fn new(rules: Arc<RuleSet>) -> Self {
        Self {
            rewriter: Rewriter::new(rules),
            generator: PythonGenerator::default(),
        }
    }

    /// Rules, rewrite policy and output options taken from a config.
    pub fn from_config(config: &TranslatorConfig) -> Result<Self, UnknownRule> {
        let rules = Arc::new(RuleSet::from_allow_list(config.rules.as_deref())?);
        Ok(Self {
            rewriter: Rewriter::from_config(rules, &config.rewrite),
            generator: PythonGenerator::new(GeneratorOptions::from(&config.codegen)),
        })
    }

    pub fn rules(&self) -> &RuleSet {
        self.rewriter.rules()
    }

    /// Translate source text that did not come from a file.
    pub fn convert(&self, source: &str) -> Result<Translation, TranslateError> {
        self.translate(source, None)
    }

    /// Read and translate one file.
    pub fn convert_file(&self, path: &Path) -> Result<Translation, TranslateError> {
        let source = std::fs::read_to_string(path).map_err(|source| TranslateError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        self.translate(&source, Some(&path.display().to_string()))
    }

    /// Run the whole pipeline. `file` only labels logs and rule contexts.
    pub fn translate(&self, source: &str, file: Option<&str>) -> Result<Translation, TranslateError> {
        let label = file.unwrap_or("<input>");

        let mut frontend = CppFrontend::new()?;
        let parsed = frontend.parse(source)?;
        let conversion = lower(&parsed)?;
        debug!(
            "{}: converted into {} nodes with {} diagnostics",
            label,
            conversion.module.size(),
            conversion.diagnostics.len()
        );

        let outcome = self.rewriter.rewrite(conversion.module, file)?;
        let output = self.generator.generate(&outcome.tree);

        let mut diagnostics = conversion.diagnostics;
        diagnostics.extend(outcome.diagnostics);

        let translation = Translation {
            output,
            diagnostics,
            stats: outcome.stats,
            passes: outcome.passes,
            tree: outcome.tree,
        };
        info!(
            "Translated {}: {} rewrites in {} passes, {} diagnostics",
            label,
            translation.rewrites(),
            translation.passes,
            translation.diagnostics.len()
        );
        Ok(translation)
    }
}

impl Default for Translator {
    fn default() -> Self {
        Self::new(Arc::new(RuleSet::all()))
    }
}

/// Translate with every registered rule, one pass and type hints on.
pub fn convert(source: &str) -> Result<Translation, TranslateError> {
    Translator::default().convert(source)
}
