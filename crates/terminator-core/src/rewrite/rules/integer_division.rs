//! `/` and `%` between integral operands, keeping C++ truncation.
//!
//! C++ rounds quotients toward zero and gives remainders the sign of the
//! dividend; Python's `//` and `%` floor. The two agree only when neither
//! operand is negative, so:
//!
//! - `a / b` becomes `a // b` when both sides are provably non-negative and
//!   `int(a / b)` otherwise
//! - `a % b` stays when both sides are provably non-negative and becomes
//!   `int(math.fmod(a, b))` otherwise
//! - `a /= b` and `a %= b` follow the same split, spelled out as
//!   `a = int(a / b)` when `a` can be evaluated twice
//!
//! Non-negative means an integer literal of at least zero, an unsigned type
//! or a `len()` call. The truncating forms go through a float and lose
//! precision past 2**53.

use crate::rewrite::rule::Rule;
use crate::rewrite::{RewriteContext, RewriteResult};
use crate::tree::{
    AssignOp, BinOp, Literal, Node, NodeKind, NodePattern, NodeWalker, PatternMatcher, TypeName,
};

#[derive(Debug, Default)]
pub struct IntegerDivision;

impl IntegerDivision {
    pub const NAME: &'static str = "IntegerDivision";
    pub const DESCRIPTION: &'static str =
        "Rewrites integral `/` and `%` so they truncate toward zero as in C++";
}

fn integral(node: &Node) -> bool {
    node.ty().map(|t| t.is_integral()).unwrap_or(false)
}

fn non_negative(node: &Node) -> bool {
    if let NodeKind::Literal {
        value: Literal::BigInt(_),
    } = node.kind()
    {
        return true;
    }
    if let Some(value) = node.as_int() {
        return value >= 0;
    }
    node.ty().map(|t| t.is_unsigned()).unwrap_or(false) || PatternMatcher::call_to("len").matches(node)
}

/// Evaluating twice is harmless: no calls and no writes.
fn repeatable(node: &Node) -> bool {
    !NodeWalker::contains(node, &|n: &Node| match n.kind() {
        NodeKind::Call { .. } | NodeKind::Assign { .. } => true,
        NodeKind::UnaryOp { op, .. } => op.is_update(),
        _ => false,
    })
}

fn int_type() -> TypeName {
    TypeName::new("int")
}

/// `int(left / right)`
fn truncated_quotient(left: &Node, right: &Node) -> RewriteResult<Node> {
    let quotient = Node::binary(BinOp::TrueDiv, left.clone(), right.clone())?.with_type(TypeName::new("double"));
    Ok(Node::call_named("int", vec![quotient])?.with_type(int_type()))
}

/// `int(math.fmod(left, right))`
fn truncated_remainder(left: &Node, right: &Node) -> RewriteResult<Node> {
    let fmod = Node::member(Node::identifier("math"), "fmod")?;
    let remainder = Node::call(fmod, vec![left.clone(), right.clone()])?.with_type(TypeName::new("double"));
    Ok(Node::call_named("int", vec![remainder])?.with_type(int_type()))
}

impl Rule for IntegerDivision {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn description(&self) -> &'static str {
        Self::DESCRIPTION
    }

    fn matches(&self, node: &Node, _context: &RewriteContext) -> bool {
        match node.kind() {
            NodeKind::BinaryOp {
                op: BinOp::Div,
                left,
                right,
            } => integral(left) && integral(right),
            NodeKind::BinaryOp {
                op: BinOp::Mod,
                left,
                right,
            } => integral(left) && integral(right) && !(non_negative(left) && non_negative(right)),
            NodeKind::Assign {
                op: AssignOp::Div,
                target,
                value,
            } => integral(target) && integral(value),
            NodeKind::Assign {
                op: AssignOp::Mod,
                target,
                value,
            } => {
                integral(target)
                    && integral(value)
                    && !(non_negative(target) && non_negative(value))
                    && repeatable(target)
            }
            _ => false,
        }
    }

    fn transform(&self, node: &Node, _context: &RewriteContext) -> RewriteResult<Node> {
        let rewritten = match node.kind() {
            NodeKind::BinaryOp {
                op: BinOp::Div,
                left,
                right,
            } => {
                if non_negative(left) && non_negative(right) {
                    Node::binary(BinOp::FloorDiv, left.as_ref().clone(), right.as_ref().clone())?
                        .with_type_opt(node.ty().cloned())
                } else {
                    truncated_quotient(left, right)?
                }
            }
            NodeKind::BinaryOp {
                op: BinOp::Mod,
                left,
                right,
            } => truncated_remainder(left, right)?,
            NodeKind::Assign {
                op: op @ (AssignOp::Div | AssignOp::Mod),
                target,
                value,
            } => {
                let (op, value) = match op {
                    AssignOp::Div if (non_negative(target) && non_negative(value)) || !repeatable(target) => {
                        (AssignOp::FloorDiv, value.as_ref().clone())
                    }
                    AssignOp::Div => (AssignOp::Assign, truncated_quotient(target, value)?),
                    _ => (AssignOp::Assign, truncated_remainder(target, value)?),
                };
                Node::new(NodeKind::Assign {
                    target: target.clone(),
                    op,
                    value: Box::new(value),
                })?
                .with_type_opt(node.ty().cloned())
            }
            _ => return Ok(node.clone()),
        };
        Ok(rewritten.with_span(node.span()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rewrite::rules::test_support::{expression_of, first_function_body, lower};

    fn last_expression(source: &str) -> anyhow::Result<Node> {
        let module = lower(source)?;
        let body = first_function_body(&module);
        let last = body.last().ok_or_else(|| anyhow::anyhow!("empty body"))?;
        Ok(expression_of(last))
    }

    fn rewrite(source: &str) -> anyhow::Result<Node> {
        let node = last_expression(source)?;
        let context = RewriteContext::new();
        assert!(IntegerDivision.matches(&node, &context), "no match for {source}");
        Ok(IntegerDivision.transform(&node, &context)?)
    }

    fn truncating_call(node: &Node) -> &Node {
        match node.kind() {
            NodeKind::Call { callee, args } if callee.as_identifier() == Some("int") && args.len() == 1 => {
                &args[0]
            }
            other => panic!("Expected int(...) call, got {:?}", other),
        }
    }

    #[test]
    fn test_signed_division_truncates() -> anyhow::Result<()> {
        let node = rewrite("void f(int a, long b) { int q = a / b; }")?;
        match truncating_call(&node).kind() {
            NodeKind::BinaryOp { op, .. } => assert_eq!(*op, BinOp::TrueDiv),
            other => panic!("Expected BinaryOp, got {:?}", other),
        }
        assert_eq!(node.ty(), Some(&TypeName::new("int")));
        Ok(())
    }

    #[test]
    fn test_negative_operands_truncate() -> anyhow::Result<()> {
        let quotient = rewrite("void f() { int a = -7; int b = 2; int q = a / b; }")?;
        truncating_call(&quotient);
        let literal = rewrite("void f(int n) { int q = 10 / n; }")?;
        truncating_call(&literal);
        let remainder = rewrite("void f() { int a = -7; int b = 2; int r = a % b; }")?;
        match truncating_call(&remainder).kind() {
            NodeKind::Call { callee, args } => {
                match callee.kind() {
                    NodeKind::Member { object, field } => {
                        assert_eq!(object.as_identifier(), Some("math"));
                        assert_eq!(field, "fmod");
                    }
                    other => panic!("Expected Member, got {:?}", other),
                }
                assert_eq!(args.len(), 2);
            }
            other => panic!("Expected Call, got {:?}", other),
        }
        Ok(())
    }

    #[test]
    fn test_non_negative_operands_floor() -> anyhow::Result<()> {
        for source in [
            "void f(unsigned a) { unsigned q = a / 2; }",
            "void f(std::size_t a, std::size_t b) { std::size_t q = a / b; }",
            "void f() { int q = 7 / 2; }",
        ] {
            match rewrite(source)?.kind() {
                NodeKind::BinaryOp { op, .. } => assert_eq!(*op, BinOp::FloorDiv),
                other => panic!("Expected BinaryOp, got {:?}", other),
            }
        }
        Ok(())
    }

    #[test]
    fn test_non_negative_remainder_kept() -> anyhow::Result<()> {
        let node = last_expression("void f(unsigned a) { unsigned r = a % 3; }")?;
        assert!(!IntegerDivision.matches(&node, &RewriteContext::new()));
        Ok(())
    }

    #[test]
    fn test_compound_division() -> anyhow::Result<()> {
        let node = rewrite("void f(int n) { n /= 2; }")?;
        match node.kind() {
            NodeKind::Assign { target, op, value } => {
                assert_eq!(*op, AssignOp::Assign);
                assert_eq!(target.as_identifier(), Some("n"));
                truncating_call(value);
            }
            other => panic!("Expected Assign, got {:?}", other),
        }

        let node = rewrite("void f(unsigned n) { n /= 2; }")?;
        match node.kind() {
            NodeKind::Assign { op, value, .. } => {
                assert_eq!(*op, AssignOp::FloorDiv);
                assert_eq!(value.as_int(), Some(2));
            }
            other => panic!("Expected Assign, got {:?}", other),
        }
        Ok(())
    }

    #[test]
    fn test_compound_remainder() -> anyhow::Result<()> {
        let node = rewrite("void f(int n) { n %= 3; }")?;
        match node.kind() {
            NodeKind::Assign { op, value, .. } => {
                assert_eq!(*op, AssignOp::Assign);
                truncating_call(value);
            }
            other => panic!("Expected Assign, got {:?}", other),
        }
        Ok(())
    }

    #[test]
    fn test_rewritten_forms_do_not_match_again() -> anyhow::Result<()> {
        let context = RewriteContext::new();
        for source in [
            "void f(int a, int b) { int q = a / b; }",
            "void f(int a, int b) { int r = a % b; }",
            "void f(int n) { n /= 2; }",
        ] {
            let rewritten = rewrite(source)?;
            assert!(!NodeWalker::contains(&rewritten, &|n: &Node| IntegerDivision.matches(n, &context)));
        }
        Ok(())
    }

    #[test]
    fn test_floating_division_kept() -> anyhow::Result<()> {
        let context = RewriteContext::new();
        let node = last_expression("void f(int a, double b) { double q = a / b; }")?;
        assert!(!IntegerDivision.matches(&node, &context));
        let node = last_expression("void f(int a) { double q = a / 2.0; }")?;
        assert!(!IntegerDivision.matches(&node, &context));
        Ok(())
    }

    #[test]
    fn test_untyped_operand_kept() -> anyhow::Result<()> {
        let node = last_expression("void f(int a) { auto q = a / unknown; }")?;
        assert!(!IntegerDivision.matches(&node, &RewriteContext::new()));
        Ok(())
    }
}
