/*!
# Cout To Print

`std::cout << a << b << std::endl;` statements become `print(a, b, sep="")`.
A statement that does not finish the line with `std::endl`, `"\n"` or a
string ending in `\n` gets `end=""`. A `std::endl` in the middle of the
chain becomes a `"\n"` argument.
*/

use crate::rewrite::rule::Rule;
use crate::rewrite::{RewriteContext, RewriteResult};
use crate::tree::{BinOp, Literal, Node, NodeKind};

const STREAMS: &[&str] = &["std::cout", "cout"];
const ENDL: &[&str] = &["std::endl", "endl"];

#[derive(Debug, Default)]
pub struct CoutToPrint;

impl CoutToPrint {
    pub const NAME: &'static str = "CoutToPrint";
    pub const DESCRIPTION: &'static str = "Rewrites `std::cout << ...` statements as print() calls";
}

/// The operands of `cout << a << b`, left to right.
fn stream_items(expr: &Node) -> Option<Vec<&Node>> {
    let mut items = Vec::new();
    let mut current = expr;
    loop {
        match current.kind() {
            NodeKind::BinaryOp {
                op: BinOp::Shl,
                left,
                right,
            } => {
                items.push(right.as_ref());
                current = left;
            }
            NodeKind::Identifier { name } if STREAMS.contains(&name.as_str()) => break,
            _ => return None,
        }
    }
    items.reverse();
    Some(items)
}

fn is_endl(node: &Node) -> bool {
    node.as_identifier().map(|name| ENDL.contains(&name)).unwrap_or(false)
}

fn is_newline(node: &Node) -> bool {
    matches!(
        node.kind(),
        NodeKind::Literal {
            value: Literal::Str(text) | Literal::Char(text)
        } if text == "\\n"
    )
}

/// Strip an escaped newline from the end of a raw string literal.
fn strip_trailing_newline(raw: &str) -> Option<&str> {
    let rest = raw.strip_suffix('n')?;
    let backslashes = rest.chars().rev().take_while(|c| *c == '\\').count();
    if backslashes % 2 == 1 {
        rest.strip_suffix('\\')
    } else {
        None
    }
}

impl Rule for CoutToPrint {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn description(&self) -> &'static str {
        Self::DESCRIPTION
    }

    fn matches(&self, node: &Node, _context: &RewriteContext) -> bool {
        match node.kind() {
            NodeKind::ExprStmt { expr } => stream_items(expr).map(|items| !items.is_empty()).unwrap_or(false),
            _ => false,
        }
    }

    fn transform(&self, node: &Node, _context: &RewriteContext) -> RewriteResult<Node> {
        let NodeKind::ExprStmt { expr } = node.kind() else {
            return Ok(node.clone());
        };
        let Some(items) = stream_items(expr) else {
            return Ok(node.clone());
        };

        let mut args: Vec<Node> = Vec::with_capacity(items.len() + 2);
        let mut newline = false;
        let last = items.len().saturating_sub(1);
        for (idx, item) in items.into_iter().enumerate() {
            let is_last = idx == last;
            if is_last && (is_endl(item) || is_newline(item)) {
                newline = true;
                continue;
            }
            if is_endl(item) {
                args.push(Node::str("\\n").with_span(item.span()));
                continue;
            }
            if is_last {
                if let NodeKind::Literal {
                    value: Literal::Str(raw),
                } = item.kind()
                {
                    if let Some(stripped) = strip_trailing_newline(raw) {
                        newline = true;
                        if !stripped.is_empty() {
                            args.push(
                                Node::str(stripped)
                                    .with_span(item.span())
                                    .with_type_opt(item.ty().cloned()),
                            );
                        }
                        continue;
                    }
                }
            }
            args.push(item.clone());
        }

        if args.len() > 1 {
            args.push(Node::keyword("sep", Node::str(""))?);
        }
        if !newline {
            args.push(Node::keyword("end", Node::str(""))?);
        }
        let print = Node::call_named("print", args)?.with_span(expr.span());
        Ok(Node::expr_stmt(print)?.with_span(node.span()))
    }
}
