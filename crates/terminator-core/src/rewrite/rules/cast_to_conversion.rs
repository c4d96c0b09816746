//! Casts to built-in types become Python conversion calls.

use crate::rewrite::rule::Rule;
use crate::rewrite::{RewriteContext, RewriteResult};
use crate::tree::{Node, NodeKind, TypeName};

#[derive(Debug, Default)]
pub struct CastToConversion;

impl CastToConversion {
    pub const NAME: &'static str = "CastToConversion";
    pub const DESCRIPTION: &'static str =
        "Rewrites casts to numeric, bool, char and string types as int()/float()/bool()/chr()/str() calls";
}

fn is_char(ty: &TypeName) -> bool {
    ty.is_textual() && !ty.as_str().contains("string")
}

/// The conversion function for a cast of `operand` to `target`. `None` means
/// the value needs no conversion at all.
fn conversion(target: &TypeName, operand: Option<&TypeName>) -> Option<Option<&'static str>> {
    let operand_is_char = operand.map(is_char).unwrap_or(false);
    if target.is_integral() {
        return Some(Some(if operand_is_char { "ord" } else { "int" }));
    }
    if target.is_floating() {
        return Some(Some("float"));
    }
    if target.is_bool() {
        return Some(Some("bool"));
    }
    if is_char(target) {
        return Some(if operand_is_char { None } else { Some("chr") });
    }
    if target.is_textual() {
        return Some(Some("str"));
    }
    None
}

impl Rule for CastToConversion {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn description(&self) -> &'static str {
        Self::DESCRIPTION
    }

    fn matches(&self, node: &Node, _context: &RewriteContext) -> bool {
        match node.kind() {
            NodeKind::Cast { target, expr } => conversion(target, expr.ty()).is_some(),
            _ => false,
        }
    }

    fn transform(&self, node: &Node, _context: &RewriteContext) -> RewriteResult<Node> {
        let NodeKind::Cast { target, expr } = node.kind() else {
            return Ok(node.clone());
        };
        let converted = match conversion(target, expr.ty()) {
            None => return Ok(node.clone()),
            Some(None) => expr.as_ref().clone(),
            Some(Some(function)) => Node::call_named(function, vec![expr.as_ref().clone()])?,
        };
        Ok(converted.with_type(target.clone()).with_span(node.span()))
    }
}
