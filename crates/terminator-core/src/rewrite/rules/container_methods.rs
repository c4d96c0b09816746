//! Standard container and string methods mapped onto Python builtins and
//! list methods. Calls on user-defined classes keep their own methods.

use crate::rewrite::rule::Rule;
use crate::rewrite::{RewriteContext, RewriteResult};
use crate::tree::{BinOp, Node, NodeKind, TypeName};

#[derive(Debug, Default)]
pub struct ContainerMethods;

impl ContainerMethods {
    pub const NAME: &'static str = "ContainerMethods";
    pub const DESCRIPTION: &'static str =
        "Rewrites size()/length()/empty() with len() and push_back/emplace_back/pop_back as list methods";
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Method {
    Len,
    Empty,
    Rename(&'static str),
}

fn method(field: &str, arity: usize) -> Option<Method> {
    match (field, arity) {
        ("size" | "length", 0) => Some(Method::Len),
        ("empty", 0) => Some(Method::Empty),
        ("push_back" | "emplace_back", 1) => Some(Method::Rename("append")),
        ("pop_back", 0) => Some(Method::Rename("pop")),
        _ => None,
    }
}

/// The receiver and the method to apply, for calls the rule handles.
fn plan(node: &Node) -> Option<(&Node, Method)> {
    let NodeKind::Call { callee, args } = node.kind() else {
        return None;
    };
    let NodeKind::Member { object, field } = callee.kind() else {
        return None;
    };
    if object.as_identifier() == Some("self") {
        return None;
    }
    if object.ty().map(|t| t.is_user_type()).unwrap_or(false) {
        return None;
    }
    Some((object.as_ref(), method(field, args.len())?))
}

impl Rule for ContainerMethods {
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
        let (Some((object, method)), NodeKind::Call { args, .. }) = (plan(node), node.kind()) else {
            return Ok(node.clone());
        };
        let len = || -> RewriteResult<Node> {
            Ok(Node::call_named("len", vec![object.clone()])?.with_type(TypeName::new("std::size_t")))
        };
        let rewritten = match method {
            Method::Len => len()?,
            Method::Empty => Node::binary(BinOp::Eq, len()?, Node::int(0))?.with_type(TypeName::new("bool")),
            Method::Rename(name) => {
                Node::call(Node::member(object.clone(), name)?, args.clone())?.with_type_opt(node.ty().cloned())
            }
        };
        Ok(rewritten.with_span(node.span()))
    }
}
