/*!
# For Loop To Range

Canonical counting loops become `for v in range(start, stop, step)`.

A loop qualifies when:

- the initializer declares or assigns the loop variable
- the condition compares the variable against a bound with `<`, `<=`, `>`,
  `>=` or `!=`
- the variable, its start and the bound are integers as far as the types
  tell (`range()` rejects floats and characters)
- the step moves the variable by a non-zero integer literal whose direction
  agrees with the comparison (`!=` only with a step of one)
- the body never writes the variable or anything the bound is built from

Everything else is left as a `For` for the generator's while-loop lowering.
*/

use tracing::debug;

use crate::rewrite::rule::Rule;
use crate::rewrite::{RewriteContext, RewriteResult};
use crate::tree::{AssignOp, BinOp, Literal, Node, NodeKind, NodeWalker, PatternMatcher, TypeName};

#[derive(Debug, Default)]
pub struct ForLoopToRange;

impl ForLoopToRange {
    pub const NAME: &'static str = "ForLoopToRange";
    pub const DESCRIPTION: &'static str = "Rewrites canonical counting for-loops as `for v in range(...)`";
}

/// A loop header the rule knows how to express as a range.
struct CountingLoop<'a> {
    var: &'a str,
    start: &'a Node,
    op: BinOp,
    bound: &'a Node,
    step: i64,
    body: &'a Node,
}

fn loop_variable(init: &Node) -> Option<(&str, &Node)> {
    match init.kind() {
        NodeKind::VarDecl {
            name,
            init: Some(start),
        } => {
            if !integer_type(init.ty()) {
                return None;
            }
            Some((name.as_str(), start.as_ref()))
        }
        NodeKind::Assign {
            target,
            op: AssignOp::Assign,
            value,
        } => {
            if !integer_type(target.ty()) {
                return None;
            }
            Some((target.as_identifier()?, value.as_ref()))
        }
        _ => None,
    }
}

/// Unknown types pass; known floating, character, string and bool types do not.
fn integer_type(ty: Option<&TypeName>) -> bool {
    !ty.map(|t| t.is_floating() || t.is_textual() || t.is_bool())
        .unwrap_or(false)
}

fn integer_valued(node: &Node) -> bool {
    match node.kind() {
        NodeKind::Literal { value } => matches!(value, Literal::Int(_) | Literal::BigInt(_)),
        _ => integer_type(node.ty()),
    }
}

/// How far one step moves `var`.
fn step_amount(step: &Node, var: &str) -> Option<i64> {
    match step.kind() {
        NodeKind::UnaryOp { op, operand } if op.is_update() => {
            (operand.as_identifier() == Some(var)).then(|| op.delta())
        }
        NodeKind::Assign { target, op, value } => {
            if target.as_identifier() != Some(var) {
                return None;
            }
            match op {
                AssignOp::Add => value.as_int(),
                AssignOp::Sub => value.as_int().and_then(i64::checked_neg),
                AssignOp::Assign => match value.kind() {
                    NodeKind::BinaryOp {
                        op: BinOp::Add,
                        left,
                        right,
                    } if left.as_identifier() == Some(var) => right.as_int(),
                    NodeKind::BinaryOp {
                        op: BinOp::Sub,
                        left,
                        right,
                    } if left.as_identifier() == Some(var) => right.as_int().and_then(i64::checked_neg),
                    _ => None,
                },
                _ => None,
            }
        }
        _ => None,
    }
}

fn direction_agrees(op: BinOp, step: i64) -> bool {
    match op {
        BinOp::Lt | BinOp::Le => step > 0,
        BinOp::Gt | BinOp::Ge => step < 0,
        BinOp::Ne => step.abs() == 1,
        _ => false,
    }
}

/// The variable a write lands on: `x`, `x.f`, `x[i]` all write through `x`.
fn root_name(node: &Node) -> Option<&str> {
    match node.kind() {
        NodeKind::Identifier { name } => Some(name),
        NodeKind::Member { object, .. } | NodeKind::Subscript { object, .. } => root_name(object),
        _ => None,
    }
}

/// Python evaluates `range()` once, so the bound has to be stable: built
/// from names, literals, operators and size queries only.
fn bound_is_stable(bound: &Node) -> bool {
    let unstable = |node: &Node| match node.kind() {
        NodeKind::Call { callee, .. } => match callee.kind() {
            NodeKind::Identifier { name } => name != "len",
            NodeKind::Member { field, .. } => !matches!(field.as_str(), "size" | "length"),
            _ => true,
        },
        NodeKind::Assign { .. } | NodeKind::Opaque { .. } => true,
        NodeKind::UnaryOp { op, .. } => op.is_update(),
        _ => false,
    };
    !NodeWalker::contains(bound, &unstable)
}

fn bound_names(bound: &Node) -> Vec<&str> {
    let mut names: Vec<&str> = NodeWalker::find_all(bound, &|node: &Node| node.as_identifier().is_some())
        .into_iter()
        .filter_map(|node| node.as_identifier())
        .collect();
    names.sort_unstable();
    names.dedup();
    names
}

/// Whether the body may change `name`: direct assignment, a write through
/// it, or a method call on it.
fn body_writes(body: &Node, name: &str) -> bool {
    if NodeWalker::contains(body, &PatternMatcher::assignment_to(name)) {
        return true;
    }
    let touches = |node: &Node| match node.kind() {
        NodeKind::Assign { target, .. } => root_name(target) == Some(name),
        NodeKind::UnaryOp { op, operand } => op.is_update() && root_name(operand) == Some(name),
        NodeKind::Call { callee, .. } => match callee.kind() {
            NodeKind::Member { object, .. } => root_name(object) == Some(name),
            _ => false,
        },
        _ => false,
    };
    NodeWalker::contains(body, &touches)
}

fn counting_loop(node: &Node) -> Option<CountingLoop<'_>> {
    let NodeKind::For {
        init: Some(init),
        cond: Some(cond),
        step: Some(step),
        body,
    } = node.kind()
    else {
        return None;
    };

    let (var, start) = loop_variable(init)?;
    let NodeKind::BinaryOp { op, left, right } = cond.kind() else {
        return None;
    };
    if left.as_identifier() != Some(var) {
        return None;
    }
    if !integer_valued(start) || !integer_valued(right) {
        return None;
    }
    let step = step_amount(step, var)?;
    if step == 0 || !direction_agrees(*op, step) {
        return None;
    }
    if !bound_is_stable(right) {
        return None;
    }
    if body_writes(body, var) || bound_names(right).into_iter().any(|name| body_writes(body, name)) {
        return None;
    }

    Some(CountingLoop {
        var,
        start,
        op: *op,
        bound: right,
        step,
        body,
    })
}

/// `bound + delta`, folded when the bound is a literal.
fn shifted(bound: &Node, delta: i64) -> RewriteResult<Node> {
    if let Some(value) = bound.as_int().and_then(|n| n.checked_add(delta)) {
        return Ok(Node::int(value).with_type_opt(bound.ty().cloned()));
    }
    let (op, amount) = if delta < 0 {
        (BinOp::Sub, -delta)
    } else {
        (BinOp::Add, delta)
    };
    Ok(Node::binary(op, bound.clone(), Node::int(amount))?.with_type_opt(bound.ty().cloned()))
}

impl Rule for ForLoopToRange {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn description(&self) -> &'static str {
        Self::DESCRIPTION
    }

    fn matches(&self, node: &Node, _context: &RewriteContext) -> bool {
        counting_loop(node).is_some()
    }

    fn transform(&self, node: &Node, _context: &RewriteContext) -> RewriteResult<Node> {
        let Some(header) = counting_loop(node) else {
            return Ok(node.clone());
        };
        let stop = match header.op {
            BinOp::Le => shifted(header.bound, 1)?,
            BinOp::Ge => shifted(header.bound, -1)?,
            _ => header.bound.clone(),
        };
        debug!("Counting loop over {} with step {}", header.var, header.step);

        let ranged = Node::new(NodeKind::ForRange {
            var: header.var.to_string(),
            start: Box::new(header.start.clone()),
            stop: Box::new(stop),
            step: Box::new(Node::int(header.step)),
            body: Box::new(header.body.clone()),
        })?;
        Ok(ranged.with_span(node.span()))
    }
}
