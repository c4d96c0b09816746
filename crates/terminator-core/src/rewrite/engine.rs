/*!
# Rewriter - Tree Rewriting Engine

Walks the tree depth-first, post-order: every child subtree is fully
rewritten before its parent is offered to the rules. At each node the rules
are tried in order and the first one that produces a different node wins;
the replacement is not traversed again in the same pass.

One pass is the default. In fixed-point mode passes repeat until one makes
no change, bounded by `max_passes`.
*/

use std::any::Any;
use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use tracing::{debug, warn};

use super::registry::RuleSet;
use super::rule::RuleStats;
use super::RewriteContext;
use crate::config::{RewriteConfig, DEFAULT_MAX_PASSES};
use crate::diagnostics::Diagnostic;
use crate::error::{RewriteError, StructuralError};
use crate::tree::Node;

pub struct Rewriter {
    rules: Arc<RuleSet>,
    fixed_point: bool,
    max_passes: usize,
    strict: bool,
}

/// The rewritten tree and what happened on the way.
#[derive(Debug)]
pub struct RewriteOutcome {
    pub tree: Node,
    pub diagnostics: Vec<Diagnostic>,
    /// Per-rule counters, one entry for every active rule
    pub stats: BTreeMap<String, RuleStats>,
    pub passes: usize,
}

impl Rewriter {
    pub fn new(rules: Arc<RuleSet>) -> Self {
        Self {
            rules,
            fixed_point: false,
            max_passes: DEFAULT_MAX_PASSES,
            strict: false,
        }
    }

    pub fn from_config(rules: Arc<RuleSet>, config: &RewriteConfig) -> Self {
        Self::new(rules)
            .fixed_point(config.fixed_point)
            .max_passes(config.max_passes)
            .strict(config.strict)
    }

    /// Repeat passes until nothing changes
    pub fn fixed_point(mut self, enabled: bool) -> Self {
        self.fixed_point = enabled;
        self
    }

    /// Upper bound on passes in fixed-point mode
    pub fn max_passes(mut self, max: usize) -> Self {
        self.max_passes = max.max(1);
        self
    }

    /// Turn rule failures and non-convergence into errors
    pub fn strict(mut self, enabled: bool) -> Self {
        self.strict = enabled;
        self
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Rewrite a whole tree.
    pub fn rewrite(&self, tree: Node, file: Option<&str>) -> Result<RewriteOutcome, RewriteError> {
        let mut stats: BTreeMap<String, RuleStats> = self
            .rules
            .iter()
            .map(|rule| (rule.name().to_string(), RuleStats::default()))
            .collect();
        let mut diagnostics = Vec::new();
        let limit = if self.fixed_point { self.max_passes } else { 1 };

        let mut tree = tree;
        let mut passes = 0;
        let mut settled = false;
        while passes < limit {
            passes += 1;
            let mut context = RewriteContext::new().with_pass(passes);
            if let Some(file) = file {
                context = context.with_file(file);
            }
            let mut pass = Pass {
                rules: &self.rules,
                context,
                strict: self.strict,
                stats: &mut stats,
                diagnostics: &mut diagnostics,
                changes: 0,
            };
            tree = pass.rewrite_node(tree)?;
            let changes = pass.changes;
            debug!("Pass {} made {} rewrites", passes, changes);
            if changes == 0 {
                settled = true;
                break;
            }
        }

        if self.fixed_point && !settled {
            if self.strict {
                return Err(RewriteError::NonConvergence { passes });
            }
            warn!(
                "{}: no fixed point after {} passes, keeping the last tree",
                file.unwrap_or("<input>"),
                passes
            );
            diagnostics.push(Diagnostic::non_convergence(passes));
        }

        Ok(RewriteOutcome {
            tree,
            diagnostics,
            stats,
            passes,
        })
    }
}

/// State of one traversal.
struct Pass<'a> {
    rules: &'a RuleSet,
    context: RewriteContext,
    strict: bool,
    stats: &'a mut BTreeMap<String, RuleStats>,
    diagnostics: &'a mut Vec<Diagnostic>,
    changes: usize,
}

impl Pass<'_> {
    fn rewrite_node(&mut self, node: Node) -> Result<Node, RewriteError> {
        let node = node.try_map_children(|child| self.rewrite_node(child))?;
        self.apply_rules(node)
    }

    fn apply_rules(&mut self, node: Node) -> Result<Node, RewriteError> {
        let rules = self.rules;
        for rule in rules.iter() {
            let name = rule.name();
            let context = &self.context;
            let matched = panic::catch_unwind(AssertUnwindSafe(|| rule.matches(&node, context)));
            match matched {
                Ok(true) => {}
                Ok(false) => continue,
                Err(payload) => {
                    self.fail(name, &node, panic_message(payload))?;
                    continue;
                }
            }
            self.stats_for(name).applications += 1;

            let context = &self.context;
            let result = panic::catch_unwind(AssertUnwindSafe(|| rule.transform(&node, context)));
            match result {
                Ok(Ok(replacement)) => {
                    if replacement != node {
                        debug!("{} rewrote {} at {}", name, node.name(), self.context.locate(&node));
                        self.stats_for(name).rewrites += 1;
                        self.changes += 1;
                        return Ok(replacement);
                    }
                }
                Ok(Err(err)) => match err.downcast::<StructuralError>() {
                    Ok(structural) => return Err(structural.into()),
                    Err(err) => self.fail(name, &node, format!("{err:#}"))?,
                },
                Err(payload) => self.fail(name, &node, panic_message(payload))?,
            }
        }
        Ok(node)
    }

    fn stats_for(&mut self, rule: &str) -> &mut RuleStats {
        self.stats.entry(rule.to_string()).or_default()
    }

    fn fail(&mut self, rule: &str, node: &Node, message: String) -> Result<(), RewriteError> {
        self.stats_for(rule).failures += 1;
        if self.strict {
            return Err(RewriteError::RuleFailed {
                rule: rule.to_string(),
                location: location(node),
                message,
            });
        }
        warn!("Rule {} failed at {}: {}", rule, self.context.locate(node), message);
        let diagnostic = Diagnostic::rule_failure(rule, node.span(), message);
        // the same failure recurs on every fixed-point pass
        if !self.diagnostics.contains(&diagnostic) {
            self.diagnostics.push(diagnostic);
        }
        Ok(())
    }
}

fn location(node: &Node) -> String {
    node.span()
        .map(|span| span.to_string())
        .unwrap_or_else(|| "-".to_string())
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("panicked: {message}")
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("panicked: {message}")
    } else {
        "panicked".to_string()
    }
}
