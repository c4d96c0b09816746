//! A module with a free `main` gets `if __name__ == "__main__": main()`.

use crate::rewrite::rule::Rule;
use crate::rewrite::{RewriteContext, RewriteResult};
use crate::tree::{FnKind, Node, NodeKind};

const ENTRY: &str = "main";

#[derive(Debug, Default)]
pub struct MainEntryGuard;

impl MainEntryGuard {
    pub const NAME: &'static str = "MainEntryGuard";
    pub const DESCRIPTION: &'static str = "Adds an `if __name__ == \"__main__\"` guard calling a free main()";
}

fn defines_main(body: &[Node]) -> bool {
    body.iter().any(|item| {
        matches!(
            item.kind(),
            NodeKind::FunctionDef { name, kind: FnKind::Free, .. } if name == ENTRY
        )
    })
}

fn has_guard(body: &[Node]) -> bool {
    body.iter()
        .any(|item| matches!(item.kind(), NodeKind::EntryGuard { .. }))
}

impl Rule for MainEntryGuard {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn description(&self) -> &'static str {
        Self::DESCRIPTION
    }

    fn matches(&self, node: &Node, _context: &RewriteContext) -> bool {
        match node.kind() {
            NodeKind::Module { body } => defines_main(body) && !has_guard(body),
            _ => false,
        }
    }

    fn transform(&self, node: &Node, _context: &RewriteContext) -> RewriteResult<Node> {
        let NodeKind::Module { body } = node.kind() else {
            return Ok(node.clone());
        };
        let mut body = body.clone();
        body.push(Node::new(NodeKind::EntryGuard {
            entry: ENTRY.to_string(),
        })?);
        Ok(Node::module(body)?.with_span(node.span()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rewrite::rules::test_support::lower;

    #[test]
    fn test_guard_appended_once() -> anyhow::Result<()> {
        let module = lower("int main() { return 0; }")?;
        let context = RewriteContext::new();
        assert!(MainEntryGuard.matches(&module, &context));
        let guarded = MainEntryGuard.transform(&module, &context)?;
        match guarded.kind() {
            NodeKind::Module { body } => match body.last().map(|n| n.kind()) {
                Some(NodeKind::EntryGuard { entry }) => assert_eq!(entry, "main"),
                other => panic!("Expected EntryGuard, got {:?}", other),
            },
            other => panic!("Expected Module, got {:?}", other),
        }
        assert!(!MainEntryGuard.matches(&guarded, &context));
        Ok(())
    }

    #[test]
    fn test_no_main_no_guard() -> anyhow::Result<()> {
        let module = lower("int helper() { return 1; }")?;
        assert!(!MainEntryGuard.matches(&module, &RewriteContext::new()));
        Ok(())
    }

    #[test]
    fn test_main_method_is_not_an_entry_point() -> anyhow::Result<()> {
        let module = lower("class App { public: void main() {} };")?;
        assert!(!MainEntryGuard.matches(&module, &RewriteContext::new()));
        Ok(())
    }
}
