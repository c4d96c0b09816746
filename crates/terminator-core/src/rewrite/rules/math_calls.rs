/*!
# Math Calls

`<cmath>` functions become their `math` module counterparts:

- `sqrt(x)`, `std::floor(x)`, ... become `math.sqrt(x)`, `math.floor(x)`
- `pow(a, b)` becomes `a ** b`
- `std::abs`, `std::min`, `std::max` become the builtins

The generator adds the `import math` the rewritten calls need.
*/

use crate::rewrite::rule::Rule;
use crate::rewrite::rules::{callee_name, unqualified};
use crate::rewrite::{RewriteContext, RewriteResult};
use crate::tree::{BinOp, Node, NodeKind};

const MATH_FUNCTIONS: &[&str] = &[
    "sqrt", "floor", "ceil", "sin", "cos", "tan", "asin", "acos", "atan", "atan2", "sinh", "cosh",
    "tanh", "exp", "log", "log10", "log2", "fabs", "fmod", "hypot", "trunc",
];

const BUILTINS: &[&str] = &["std::abs", "std::min", "std::max"];

#[derive(Debug, Default)]
pub struct MathCalls;

impl MathCalls {
    pub const NAME: &'static str = "MathCalls";
    pub const DESCRIPTION: &'static str =
        "Rewrites <cmath> calls as math.* calls, pow() as `**` and std::abs/min/max as builtins";
}

enum Rewrite<'a> {
    Math(&'a str),
    Power,
    Builtin(&'a str),
}

fn plan(node: &Node) -> Option<Rewrite<'_>> {
    let name = callee_name(node)?;
    let NodeKind::Call { args, .. } = node.kind() else {
        return None;
    };
    let bare = unqualified(name);
    if bare == "pow" && args.len() == 2 {
        return Some(Rewrite::Power);
    }
    if MATH_FUNCTIONS.contains(&bare) {
        return Some(Rewrite::Math(bare));
    }
    if BUILTINS.contains(&name) {
        return Some(Rewrite::Builtin(bare));
    }
    None
}

impl Rule for MathCalls {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn description(&self) -> &'static str {
        Self::DESCRIPTION
    }

    fn matches(&self, node: &Node, _context: &RewriteContext) -> bool {
        plan(node).is_some()
    }

    fn transform(&self, node: &Node, _context: &RewriteContext) -> RewriteResult<Node> {
        let (Some(rewrite), NodeKind::Call { callee, args }) = (plan(node), node.kind()) else {
            return Ok(node.clone());
        };
        let rewritten = match rewrite {
            Rewrite::Power => match args.as_slice() {
                [base, exponent] => Node::binary(BinOp::Pow, base.clone(), exponent.clone())?,
                _ => return Ok(node.clone()),
            },
            Rewrite::Math(function) => {
                let math = Node::identifier("math").with_span(callee.span());
                Node::call(Node::member(math, function)?, args.clone())?
            }
            Rewrite::Builtin(function) => Node::call_named(function, args.clone())?,
        };
        Ok(rewritten.with_span(node.span()).with_type_opt(node.ty().cloned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::TypeName;

    fn call(name: &str, args: Vec<Node>) -> Node {
        Node::call_named(name, args).unwrap().with_type(TypeName::new("double"))
    }

    fn rewrite(node: &Node) -> anyhow::Result<Node> {
        let context = RewriteContext::new();
        assert!(MathCalls.matches(node, &context));
        MathCalls.transform(node, &context)
    }

    #[test]
    fn test_math_module_calls() -> anyhow::Result<()> {
        for name in ["sqrt", "std::sqrt"] {
            let result = rewrite(&call(name, vec![Node::identifier("x")]))?;
            match result.kind() {
                NodeKind::Call { callee, args } => {
                    match callee.kind() {
                        NodeKind::Member { object, field } => {
                            assert_eq!(object.as_identifier(), Some("math"));
                            assert_eq!(field, "sqrt");
                        }
                        other => panic!("Expected Member, got {:?}", other),
                    }
                    assert_eq!(args.len(), 1);
                }
                other => panic!("Expected Call, got {:?}", other),
            }
            assert_eq!(result.ty(), Some(&TypeName::new("double")));
        }
        Ok(())
    }

    #[test]
    fn test_pow_becomes_power_operator() -> anyhow::Result<()> {
        let result = rewrite(&call("std::pow", vec![Node::identifier("a"), Node::int(2)]))?;
        match result.kind() {
            NodeKind::BinaryOp { op, left, right } => {
                assert_eq!(*op, BinOp::Pow);
                assert_eq!(left.as_identifier(), Some("a"));
                assert_eq!(right.as_int(), Some(2));
            }
            other => panic!("Expected BinaryOp, got {:?}", other),
        }
        Ok(())
    }

    #[test]
    fn test_std_builtins() -> anyhow::Result<()> {
        let result = rewrite(&call("std::max", vec![Node::identifier("a"), Node::identifier("b")]))?;
        match result.kind() {
            NodeKind::Call { callee, .. } => assert_eq!(callee.as_identifier(), Some("max")),
            other => panic!("Expected Call, got {:?}", other),
        }
        Ok(())
    }

    #[test]
    fn test_unrelated_calls_untouched() {
        let context = RewriteContext::new();
        assert!(!MathCalls.matches(&call("max", vec![Node::int(1), Node::int(2)]), &context));
        assert!(!MathCalls.matches(&call("compute", vec![]), &context));
        assert!(!MathCalls.matches(&call("pow", vec![Node::int(2)]), &context));
    }
}
