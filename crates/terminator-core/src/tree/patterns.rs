/*!
# Tree Pattern Matching

Small pattern language over internal tree nodes, plus a walker for deep
searches. Rules use these to ask questions such as "does this loop body ever
assign `i`?".
*/

use super::{Node, NodeKind};

/// Something that can accept or reject a node.
pub trait NodePattern {
    fn matches(&self, node: &Node) -> bool;
}

impl<F> NodePattern for F
where
    F: Fn(&Node) -> bool,
{
    fn matches(&self, node: &Node) -> bool {
        self(node)
    }
}

/// Pattern constructors
pub struct PatternMatcher;

impl PatternMatcher {
    /// Identifiers with a specific name
    pub fn identifier(name: &str) -> IdentifierMatcher {
        IdentifierMatcher {
            name: name.to_string(),
        }
    }

    /// Calls whose callee is the identifier `name`
    pub fn call_to(name: &str) -> CallMatcher {
        CallMatcher {
            name: name.to_string(),
        }
    }

    /// Anything that writes to the variable `name`: plain or compound
    /// assignment, or an increment/decrement.
    pub fn assignment_to(name: &str) -> AssignmentMatcher {
        AssignmentMatcher {
            name: name.to_string(),
        }
    }
}

pub struct IdentifierMatcher {
    name: String,
}

impl NodePattern for IdentifierMatcher {
    fn matches(&self, node: &Node) -> bool {
        node.as_identifier() == Some(self.name.as_str())
    }
}

pub struct CallMatcher {
    name: String,
}

impl NodePattern for CallMatcher {
    fn matches(&self, node: &Node) -> bool {
        matches!(node.kind(), NodeKind::Call { callee, .. } if callee.as_identifier() == Some(self.name.as_str()))
    }
}

pub struct AssignmentMatcher {
    name: String,
}

impl NodePattern for AssignmentMatcher {
    fn matches(&self, node: &Node) -> bool {
        match node.kind() {
            NodeKind::Assign { target, .. } => target.as_identifier() == Some(self.name.as_str()),
            NodeKind::UnaryOp { op, operand } => {
                op.is_update() && operand.as_identifier() == Some(self.name.as_str())
            }
            // a nested declaration shadows rather than assigns, but either
            // way the loop variable is no longer ours to track
            NodeKind::VarDecl { name, .. } => name == &self.name,
            _ => false,
        }
    }
}

/// Deep traversal helpers, pre-order.
pub struct NodeWalker;

impl NodeWalker {
    /// All nodes in the subtree matching `pattern`, root included.
    pub fn find_all<'a, P: NodePattern>(root: &'a Node, pattern: &P) -> Vec<&'a Node> {
        let mut found = Vec::new();
        Self::find_all_recursive(root, pattern, &mut found);
        found
    }

    pub fn find_first<'a, P: NodePattern>(root: &'a Node, pattern: &P) -> Option<&'a Node> {
        if pattern.matches(root) {
            return Some(root);
        }
        root.children()
            .into_iter()
            .find_map(|child| Self::find_first(child, pattern))
    }

    pub fn contains<P: NodePattern>(root: &Node, pattern: &P) -> bool {
        Self::find_first(root, pattern).is_some()
    }

    fn find_all_recursive<'a, P: NodePattern>(node: &'a Node, pattern: &P, found: &mut Vec<&'a Node>) {
        if pattern.matches(node) {
            found.push(node);
        }
        for child in node.children() {
            Self::find_all_recursive(child, pattern, found);
        }
    }
}
