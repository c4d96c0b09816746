/*!
# Rewrite Rules

Core trait and utilities for defining rewrite rules.
*/

use serde::Serialize;

use super::{RewriteContext, RewriteResult};
use crate::tree::Node;

/// A named, pure transformation of one node.
///
/// The engine calls `matches` first and `transform` only on a match. A
/// transform that has nothing to do returns a node equal to its input.
/// Errors are recorded against the rule and leave the node unchanged, except
/// a [`StructuralError`](crate::error::StructuralError), which aborts the file.
pub trait Rule: Send + Sync {
    /// Registry name, e.g. `ForLoopToRange`
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    /// Cheap check of whether this rule applies to the node.
    fn matches(&self, node: &Node, context: &RewriteContext) -> bool;

    /// Build the replacement for a matching node.
    fn transform(&self, node: &Node, context: &RewriteContext) -> RewriteResult<Node>;
}

/// A rule defined by a matcher and a transformer closure.
///
/// ```rust
/// use terminator_core::rewrite::{FnRule, RewriteContext};
/// use terminator_core::tree::Node;
///
/// let rename = FnRule::new(
///     "RenameFoo",
///     "Renames foo to bar",
///     |node: &Node| node.as_identifier() == Some("foo"),
///     |_node: &Node, _ctx: &RewriteContext| Ok(Node::identifier("bar")),
/// );
/// ```
pub struct FnRule<M, T>
where
    M: Fn(&Node) -> bool + Send + Sync,
    T: Fn(&Node, &RewriteContext) -> RewriteResult<Node> + Send + Sync,
{
    name: &'static str,
    description: &'static str,
    matcher: M,
    transformer: T,
}

impl<M, T> FnRule<M, T>
where
    M: Fn(&Node) -> bool + Send + Sync,
    T: Fn(&Node, &RewriteContext) -> RewriteResult<Node> + Send + Sync,
{
    pub fn new(name: &'static str, description: &'static str, matcher: M, transformer: T) -> Self {
        Self {
            name,
            description,
            matcher,
            transformer,
        }
    }
}

impl<M, T> Rule for FnRule<M, T>
where
    M: Fn(&Node) -> bool + Send + Sync,
    T: Fn(&Node, &RewriteContext) -> RewriteResult<Node> + Send + Sync,
{
    fn name(&self) -> &'static str {
        self.name
    }

    fn description(&self) -> &'static str {
        self.description
    }

    fn matches(&self, node: &Node, _context: &RewriteContext) -> bool {
        (self.matcher)(node)
    }

    fn transform(&self, node: &Node, context: &RewriteContext) -> RewriteResult<Node> {
        (self.transformer)(node, context)
    }
}

/// Rule execution statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RuleStats {
    /// Nodes the rule matched
    pub applications: u64,
    /// Matches that produced a different node
    pub rewrites: u64,
    pub failures: u64,
}

impl RuleStats {
    pub fn merge(&mut self, other: &RuleStats) {
        self.applications += other.applications;
        self.rewrites += other.rewrites;
        self.failures += other.failures;
    }

    pub fn success_rate(&self) -> f64 {
        if self.applications == 0 {
            0.0
        } else {
            (self.rewrites as f64) / (self.applications as f64)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fn_rule_delegates() -> anyhow::Result<()> {
        let rule = FnRule::new(
            "RenameFoo",
            "Renames foo to bar",
            |node: &Node| node.as_identifier() == Some("foo"),
            |_node: &Node, _ctx: &RewriteContext| Ok(Node::identifier("bar")),
        );
        let context = RewriteContext::new();
        assert_eq!(rule.name(), "RenameFoo");
        assert!(rule.matches(&Node::identifier("foo"), &context));
        assert!(!rule.matches(&Node::identifier("baz"), &context));
        let renamed = rule.transform(&Node::identifier("foo"), &context)?;
        assert_eq!(renamed.as_identifier(), Some("bar"));
        Ok(())
    }

    #[test]
    fn test_stats_merge() {
        let mut total = RuleStats {
            applications: 2,
            rewrites: 1,
            failures: 0,
        };
        total.merge(&RuleStats {
            applications: 2,
            rewrites: 2,
            failures: 1,
        });
        assert_eq!(total.applications, 4);
        assert_eq!(total.failures, 1);
        assert!((total.success_rate() - 0.75).abs() < f64::EPSILON);
        assert_eq!(RuleStats::default().success_rate(), 0.0);
    }
}
