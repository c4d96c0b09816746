/*!
# Internal Tree

The translator's own node representation. Nodes are immutable values with a
closed set of kinds; every constructor that accepts child nodes checks that
each child fits the slot it is placed in.
*/

use std::fmt;

use serde::Serialize;

use crate::error::StructuralError;

pub mod ops;
pub mod patterns;
pub mod types;

pub use ops::{AssignOp, BinOp, FnKind, Literal, UnOp};
pub use patterns::{NodePattern, NodeWalker, PatternMatcher};
pub use types::TypeName;

/// Location of a construct in the original source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Span {
    pub start_byte: usize,
    pub end_byte: usize,
    /// 1-based
    pub line: usize,
    /// 1-based
    pub column: usize,
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Coarse grouping of node kinds used for slot validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Category {
    Module,
    Definition,
    Param,
    Block,
    Statement,
    Expression,
    /// Keyword arguments only appear in call argument lists
    Argument,
    Opaque,
}

impl Category {
    pub fn is_statement_like(&self) -> bool {
        matches!(self, Category::Definition | Category::Statement | Category::Opaque)
    }

    pub fn is_expression_like(&self) -> bool {
        matches!(self, Category::Expression | Category::Opaque)
    }
}

/// The closed set of node kinds.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "node")]
pub enum NodeKind {
    Module {
        body: Vec<Node>,
    },
    FunctionDef {
        name: String,
        kind: FnKind,
        params: Vec<Node>,
        returns: Option<TypeName>,
        body: Box<Node>,
    },
    Param {
        name: String,
        default: Option<Box<Node>>,
    },
    ClassDef {
        name: String,
        bases: Vec<String>,
        body: Vec<Node>,
    },
    EntryGuard {
        entry: String,
    },
    Block {
        stmts: Vec<Node>,
    },
    VarDecl {
        name: String,
        init: Option<Box<Node>>,
    },
    For {
        init: Option<Box<Node>>,
        cond: Option<Box<Node>>,
        step: Option<Box<Node>>,
        body: Box<Node>,
    },
    ForRange {
        var: String,
        start: Box<Node>,
        stop: Box<Node>,
        step: Box<Node>,
        body: Box<Node>,
    },
    ForEach {
        var: String,
        iter: Box<Node>,
        body: Box<Node>,
    },
    While {
        cond: Box<Node>,
        body: Box<Node>,
    },
    DoWhile {
        body: Box<Node>,
        cond: Box<Node>,
    },
    If {
        cond: Box<Node>,
        then: Box<Node>,
        orelse: Option<Box<Node>>,
    },
    Return {
        value: Option<Box<Node>>,
    },
    Break,
    Continue,
    ExprStmt {
        expr: Box<Node>,
    },
    Import {
        module: String,
    },
    Include {
        path: String,
        system: bool,
    },
    Using {
        text: String,
    },
    /// A directive with no Python counterpart. The source text is kept for
    /// tree dumps; nothing is rendered.
    Elided {
        text: String,
    },
    Comment {
        text: String,
    },
    Call {
        callee: Box<Node>,
        args: Vec<Node>,
    },
    Keyword {
        name: String,
        value: Box<Node>,
    },
    Identifier {
        name: String,
    },
    Literal {
        value: Literal,
    },
    List {
        items: Vec<Node>,
    },
    BinaryOp {
        op: BinOp,
        left: Box<Node>,
        right: Box<Node>,
    },
    UnaryOp {
        op: UnOp,
        operand: Box<Node>,
    },
    Ternary {
        cond: Box<Node>,
        then: Box<Node>,
        orelse: Box<Node>,
    },
    Assign {
        target: Box<Node>,
        op: AssignOp,
        value: Box<Node>,
    },
    Member {
        object: Box<Node>,
        field: String,
    },
    Subscript {
        object: Box<Node>,
        index: Box<Node>,
    },
    Cast {
        target: TypeName,
        expr: Box<Node>,
    },
    Opaque {
        text: String,
        reason: String,
    },
}

impl NodeKind {
    /// Variant name, used in diagnostics and errors.
    pub fn name(&self) -> &'static str {
        match self {
            NodeKind::Module { .. } => "Module",
            NodeKind::FunctionDef { .. } => "FunctionDef",
            NodeKind::Param { .. } => "Param",
            NodeKind::ClassDef { .. } => "ClassDef",
            NodeKind::EntryGuard { .. } => "EntryGuard",
            NodeKind::Block { .. } => "Block",
            NodeKind::VarDecl { .. } => "VarDecl",
            NodeKind::For { .. } => "For",
            NodeKind::ForRange { .. } => "ForRange",
            NodeKind::ForEach { .. } => "ForEach",
            NodeKind::While { .. } => "While",
            NodeKind::DoWhile { .. } => "DoWhile",
            NodeKind::If { .. } => "If",
            NodeKind::Return { .. } => "Return",
            NodeKind::Break => "Break",
            NodeKind::Continue => "Continue",
            NodeKind::ExprStmt { .. } => "ExprStmt",
            NodeKind::Import { .. } => "Import",
            NodeKind::Include { .. } => "Include",
            NodeKind::Using { .. } => "Using",
            NodeKind::Elided { .. } => "Elided",
            NodeKind::Comment { .. } => "Comment",
            NodeKind::Call { .. } => "Call",
            NodeKind::Keyword { .. } => "Keyword",
            NodeKind::Identifier { .. } => "Identifier",
            NodeKind::Literal { .. } => "Literal",
            NodeKind::List { .. } => "List",
            NodeKind::BinaryOp { .. } => "BinaryOp",
            NodeKind::UnaryOp { .. } => "UnaryOp",
            NodeKind::Ternary { .. } => "Ternary",
            NodeKind::Assign { .. } => "Assign",
            NodeKind::Member { .. } => "Member",
            NodeKind::Subscript { .. } => "Subscript",
            NodeKind::Cast { .. } => "Cast",
            NodeKind::Opaque { .. } => "Opaque",
        }
    }

    pub fn category(&self) -> Category {
        match self {
            NodeKind::Module { .. } => Category::Module,
            NodeKind::FunctionDef { .. } | NodeKind::ClassDef { .. } | NodeKind::EntryGuard { .. } => {
                Category::Definition
            }
            NodeKind::Param { .. } => Category::Param,
            NodeKind::Block { .. } => Category::Block,
            NodeKind::VarDecl { .. }
            | NodeKind::For { .. }
            | NodeKind::ForRange { .. }
            | NodeKind::ForEach { .. }
            | NodeKind::While { .. }
            | NodeKind::DoWhile { .. }
            | NodeKind::If { .. }
            | NodeKind::Return { .. }
            | NodeKind::Break
            | NodeKind::Continue
            | NodeKind::ExprStmt { .. }
            | NodeKind::Import { .. }
            | NodeKind::Include { .. }
            | NodeKind::Using { .. }
            | NodeKind::Elided { .. }
            | NodeKind::Comment { .. } => Category::Statement,
            NodeKind::Keyword { .. } => Category::Argument,
            NodeKind::Call { .. }
            | NodeKind::Identifier { .. }
            | NodeKind::Literal { .. }
            | NodeKind::List { .. }
            | NodeKind::BinaryOp { .. }
            | NodeKind::UnaryOp { .. }
            | NodeKind::Ternary { .. }
            | NodeKind::Assign { .. }
            | NodeKind::Member { .. }
            | NodeKind::Subscript { .. }
            | NodeKind::Cast { .. } => Category::Expression,
            NodeKind::Opaque { .. } => Category::Opaque,
        }
    }
}

/// A node of the internal tree.
///
/// Fields are private: a node is only obtained through a validating
/// constructor, and rewriting a node means building a new one.
#[derive(Debug, Clone, Serialize)]
pub struct Node {
    #[serde(flatten)]
    kind: NodeKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    span: Option<Span>,
    #[serde(skip_serializing_if = "Option::is_none")]
    ty: Option<TypeName>,
}

/// Spans are diagnostics-only and do not take part in equality.
impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.ty == other.ty
    }
}

impl Node {
    /// Build a node, checking every child slot.
    pub fn new(kind: NodeKind) -> Result<Node, StructuralError> {
        validate(&kind)?;
        Ok(Node::unchecked(kind))
    }

    fn unchecked(kind: NodeKind) -> Node {
        Node {
            kind,
            span: None,
            ty: None,
        }
    }

    pub fn identifier(name: impl Into<String>) -> Node {
        Node::unchecked(NodeKind::Identifier { name: name.into() })
    }

    pub fn literal(value: Literal) -> Node {
        Node::unchecked(NodeKind::Literal { value })
    }

    pub fn int(value: i64) -> Node {
        Node::literal(Literal::Int(value))
    }

    pub fn str(value: &str) -> Node {
        Node::literal(Literal::Str(value.to_string()))
    }

    pub fn list_empty() -> Node {
        Node::unchecked(NodeKind::List { items: Vec::new() })
    }

    pub fn comment(text: impl Into<String>) -> Node {
        Node::unchecked(NodeKind::Comment { text: text.into() })
    }

    pub fn opaque(text: impl Into<String>, reason: impl Into<String>) -> Node {
        Node::unchecked(NodeKind::Opaque {
            text: text.into(),
            reason: reason.into(),
        })
    }

    /// `name()`
    pub fn nullary_call(name: &str) -> Node {
        Node::unchecked(NodeKind::Call {
            callee: Box::new(Node::identifier(name)),
            args: Vec::new(),
        })
    }

    pub fn call(callee: Node, args: Vec<Node>) -> Result<Node, StructuralError> {
        Node::new(NodeKind::Call {
            callee: Box::new(callee),
            args,
        })
    }

    pub fn call_named(name: &str, args: Vec<Node>) -> Result<Node, StructuralError> {
        Node::call(Node::identifier(name), args)
    }

    pub fn keyword(name: &str, value: Node) -> Result<Node, StructuralError> {
        Node::new(NodeKind::Keyword {
            name: name.to_string(),
            value: Box::new(value),
        })
    }

    pub fn member(object: Node, field: &str) -> Result<Node, StructuralError> {
        Node::new(NodeKind::Member {
            object: Box::new(object),
            field: field.to_string(),
        })
    }

    pub fn binary(op: BinOp, left: Node, right: Node) -> Result<Node, StructuralError> {
        Node::new(NodeKind::BinaryOp {
            op,
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    pub fn expr_stmt(expr: Node) -> Result<Node, StructuralError> {
        Node::new(NodeKind::ExprStmt {
            expr: Box::new(expr),
        })
    }

    /// `import <module>`
    pub fn import(module: &str) -> Result<Node, StructuralError> {
        Node::new(NodeKind::Import {
            module: module.to_string(),
        })
    }

    pub fn block(stmts: Vec<Node>) -> Result<Node, StructuralError> {
        Node::new(NodeKind::Block { stmts })
    }

    pub fn module(body: Vec<Node>) -> Result<Node, StructuralError> {
        Node::new(NodeKind::Module { body })
    }

    pub fn with_span(mut self, span: Option<Span>) -> Node {
        self.span = span;
        self
    }

    pub fn with_type(mut self, ty: TypeName) -> Node {
        self.ty = Some(ty);
        self
    }

    pub fn with_type_opt(mut self, ty: Option<TypeName>) -> Node {
        self.ty = ty;
        self
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn span(&self) -> Option<Span> {
        self.span
    }

    pub fn ty(&self) -> Option<&TypeName> {
        self.ty.as_ref()
    }

    pub fn category(&self) -> Category {
        self.kind.category()
    }

    /// Take the node apart; `Node::new` plus the builders put it back together.
    pub fn into_parts(self) -> (NodeKind, Option<Span>, Option<TypeName>) {
        (self.kind, self.span, self.ty)
    }

    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    /// The name of an `Identifier` node.
    pub fn as_identifier(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Identifier { name } => Some(name),
            _ => None,
        }
    }

    /// The value of an integer literal, looking through unary minus.
    pub fn as_int(&self) -> Option<i64> {
        match &self.kind {
            NodeKind::Literal { value } => value.as_int(),
            NodeKind::UnaryOp {
                op: UnOp::Neg,
                operand,
            } => operand.as_int().and_then(i64::checked_neg),
            _ => None,
        }
    }

    /// Child nodes in slot order.
    pub fn children(&self) -> Vec<&Node> {
        let mut out = Vec::new();
        match &self.kind {
            NodeKind::Module { body } | NodeKind::ClassDef { body, .. } => out.extend(body),
            NodeKind::Block { stmts } => out.extend(stmts),
            NodeKind::FunctionDef { params, body, .. } => {
                out.extend(params);
                out.push(body.as_ref());
            }
            NodeKind::Param { default, .. } => out.extend(default.as_deref()),
            NodeKind::VarDecl { init, .. } => out.extend(init.as_deref()),
            NodeKind::For {
                init,
                cond,
                step,
                body,
            } => {
                out.extend(init.as_deref());
                out.extend(cond.as_deref());
                out.extend(step.as_deref());
                out.push(body.as_ref());
            }
            NodeKind::ForRange {
                start,
                stop,
                step,
                body,
                ..
            } => {
                out.push(start.as_ref());
                out.push(stop.as_ref());
                out.push(step.as_ref());
                out.push(body.as_ref());
            }
            NodeKind::ForEach { iter, body, .. } => {
                out.push(iter.as_ref());
                out.push(body.as_ref());
            }
            NodeKind::While { cond, body } => {
                out.push(cond.as_ref());
                out.push(body.as_ref());
            }
            NodeKind::DoWhile { body, cond } => {
                out.push(body.as_ref());
                out.push(cond.as_ref());
            }
            NodeKind::If { cond, then, orelse } => {
                out.push(cond.as_ref());
                out.push(then.as_ref());
                out.extend(orelse.as_deref());
            }
            NodeKind::Return { value } => out.extend(value.as_deref()),
            NodeKind::ExprStmt { expr } => out.push(expr.as_ref()),
            NodeKind::Call { callee, args } => {
                out.push(callee.as_ref());
                out.extend(args);
            }
            NodeKind::Keyword { value, .. } => out.push(value.as_ref()),
            NodeKind::List { items } => out.extend(items),
            NodeKind::BinaryOp { left, right, .. } => {
                out.push(left.as_ref());
                out.push(right.as_ref());
            }
            NodeKind::UnaryOp { operand, .. } => out.push(operand.as_ref()),
            NodeKind::Ternary { cond, then, orelse } => {
                out.push(cond.as_ref());
                out.push(then.as_ref());
                out.push(orelse.as_ref());
            }
            NodeKind::Assign { target, value, .. } => {
                out.push(target.as_ref());
                out.push(value.as_ref());
            }
            NodeKind::Member { object, .. } => out.push(object.as_ref()),
            NodeKind::Subscript { object, index } => {
                out.push(object.as_ref());
                out.push(index.as_ref());
            }
            NodeKind::Cast { expr, .. } => out.push(expr.as_ref()),
            NodeKind::EntryGuard { .. }
            | NodeKind::Break
            | NodeKind::Continue
            | NodeKind::Import { .. }
            | NodeKind::Include { .. }
            | NodeKind::Using { .. }
            | NodeKind::Elided { .. }
            | NodeKind::Comment { .. }
            | NodeKind::Identifier { .. }
            | NodeKind::Literal { .. }
            | NodeKind::Opaque { .. } => {}
        }
        out
    }

    /// Rebuild this node from its children mapped through `f`, in slot order.
    ///
    /// The rebuilt node is validated again, so a mapping that puts a child of
    /// the wrong category into a slot fails with a `StructuralError`. Span and
    /// type annotation are carried over.
    pub fn try_map_children<E, F>(self, mut f: F) -> Result<Node, E>
    where
        E: From<StructuralError>,
        F: FnMut(Node) -> Result<Node, E>,
    {
        let (kind, span, ty) = self.into_parts();
        let f = &mut f;
        let kind = match kind {
            NodeKind::Module { body } => NodeKind::Module {
                body: map_vec(f, body)?,
            },
            NodeKind::FunctionDef {
                name,
                kind,
                params,
                returns,
                body,
            } => NodeKind::FunctionDef {
                name,
                kind,
                params: map_vec(f, params)?,
                returns,
                body: map_box(f, body)?,
            },
            NodeKind::Param { name, default } => NodeKind::Param {
                name,
                default: map_opt(f, default)?,
            },
            NodeKind::ClassDef { name, bases, body } => NodeKind::ClassDef {
                name,
                bases,
                body: map_vec(f, body)?,
            },
            NodeKind::Block { stmts } => NodeKind::Block {
                stmts: map_vec(f, stmts)?,
            },
            NodeKind::VarDecl { name, init } => NodeKind::VarDecl {
                name,
                init: map_opt(f, init)?,
            },
            NodeKind::For {
                init,
                cond,
                step,
                body,
            } => NodeKind::For {
                init: map_opt(f, init)?,
                cond: map_opt(f, cond)?,
                step: map_opt(f, step)?,
                body: map_box(f, body)?,
            },
            NodeKind::ForRange {
                var,
                start,
                stop,
                step,
                body,
            } => NodeKind::ForRange {
                var,
                start: map_box(f, start)?,
                stop: map_box(f, stop)?,
                step: map_box(f, step)?,
                body: map_box(f, body)?,
            },
            NodeKind::ForEach { var, iter, body } => NodeKind::ForEach {
                var,
                iter: map_box(f, iter)?,
                body: map_box(f, body)?,
            },
            NodeKind::While { cond, body } => NodeKind::While {
                cond: map_box(f, cond)?,
                body: map_box(f, body)?,
            },
            NodeKind::DoWhile { body, cond } => NodeKind::DoWhile {
                body: map_box(f, body)?,
                cond: map_box(f, cond)?,
            },
            NodeKind::If { cond, then, orelse } => NodeKind::If {
                cond: map_box(f, cond)?,
                then: map_box(f, then)?,
                orelse: map_opt(f, orelse)?,
            },
            NodeKind::Return { value } => NodeKind::Return {
                value: map_opt(f, value)?,
            },
            NodeKind::ExprStmt { expr } => NodeKind::ExprStmt {
                expr: map_box(f, expr)?,
            },
            NodeKind::Call { callee, args } => NodeKind::Call {
                callee: map_box(f, callee)?,
                args: map_vec(f, args)?,
            },
            NodeKind::Keyword { name, value } => NodeKind::Keyword {
                name,
                value: map_box(f, value)?,
            },
            NodeKind::List { items } => NodeKind::List {
                items: map_vec(f, items)?,
            },
            NodeKind::BinaryOp { op, left, right } => NodeKind::BinaryOp {
                op,
                left: map_box(f, left)?,
                right: map_box(f, right)?,
            },
            NodeKind::UnaryOp { op, operand } => NodeKind::UnaryOp {
                op,
                operand: map_box(f, operand)?,
            },
            NodeKind::Ternary { cond, then, orelse } => NodeKind::Ternary {
                cond: map_box(f, cond)?,
                then: map_box(f, then)?,
                orelse: map_box(f, orelse)?,
            },
            NodeKind::Assign { target, op, value } => NodeKind::Assign {
                target: map_box(f, target)?,
                op,
                value: map_box(f, value)?,
            },
            NodeKind::Member { object, field } => NodeKind::Member {
                object: map_box(f, object)?,
                field,
            },
            NodeKind::Subscript { object, index } => NodeKind::Subscript {
                object: map_box(f, object)?,
                index: map_box(f, index)?,
            },
            NodeKind::Cast { target, expr } => NodeKind::Cast {
                target,
                expr: map_box(f, expr)?,
            },
            leaf @ (NodeKind::EntryGuard { .. }
            | NodeKind::Break
            | NodeKind::Continue
            | NodeKind::Import { .. }
            | NodeKind::Include { .. }
            | NodeKind::Using { .. }
            | NodeKind::Elided { .. }
            | NodeKind::Comment { .. }
            | NodeKind::Identifier { .. }
            | NodeKind::Literal { .. }
            | NodeKind::Opaque { .. }) => leaf,
        };
        Ok(Node::new(kind)?.with_span(span).with_type_opt(ty))
    }

    /// Number of nodes in this subtree, including this one.
    pub fn size(&self) -> usize {
        1 + self.children().iter().map(|c| c.size()).sum::<usize>()
    }
}

fn map_box<E, F>(f: &mut F, node: Box<Node>) -> Result<Box<Node>, E>
where
    F: FnMut(Node) -> Result<Node, E>,
{
    f(*node).map(Box::new)
}

fn map_opt<E, F>(f: &mut F, node: Option<Box<Node>>) -> Result<Option<Box<Node>>, E>
where
    F: FnMut(Node) -> Result<Node, E>,
{
    node.map(|n| map_box(f, n)).transpose()
}

fn map_vec<E, F>(f: &mut F, nodes: Vec<Node>) -> Result<Vec<Node>, E>
where
    F: FnMut(Node) -> Result<Node, E>,
{
    nodes.into_iter().map(|n| f(n)).collect()
}

// Slot validation

struct Check {
    node: &'static str,
}

impl Check {
    fn fail(&self, slot: &'static str, problem: impl Into<String>) -> StructuralError {
        StructuralError {
            node: self.node,
            slot,
            problem: problem.into(),
        }
    }

    fn name(&self, slot: &'static str, value: &str) -> Result<(), StructuralError> {
        if value.is_empty() {
            return Err(self.fail(slot, "must not be empty"));
        }
        Ok(())
    }

    fn expect(
        &self,
        slot: &'static str,
        child: &Node,
        ok: impl Fn(&Node) -> bool,
        wanted: &str,
    ) -> Result<(), StructuralError> {
        if ok(child) {
            Ok(())
        } else {
            Err(self.fail(slot, format!("expected {wanted}, found {}", child.name())))
        }
    }

    fn expr(&self, slot: &'static str, child: &Node) -> Result<(), StructuralError> {
        self.expect(slot, child, |c| c.category().is_expression_like(), "an expression")
    }

    fn opt_expr(&self, slot: &'static str, child: &Option<Box<Node>>) -> Result<(), StructuralError> {
        match child {
            Some(c) => self.expr(slot, c),
            None => Ok(()),
        }
    }

    fn block(&self, slot: &'static str, child: &Node) -> Result<(), StructuralError> {
        self.expect(slot, child, |c| c.category() == Category::Block, "a Block")
    }

    fn statements(&self, slot: &'static str, children: &[Node]) -> Result<(), StructuralError> {
        for child in children {
            self.expect(slot, child, |c| c.category().is_statement_like(), "a statement")?;
        }
        Ok(())
    }
}

fn validate(kind: &NodeKind) -> Result<(), StructuralError> {
    let check = Check { node: kind.name() };
    match kind {
        NodeKind::Module { body } => check.statements("body", body),
        NodeKind::FunctionDef {
            name, params, body, ..
        } => {
            check.name("name", name)?;
            for param in params {
                check.expect("params", param, |c| c.category() == Category::Param, "a Param")?;
            }
            check.block("body", body)
        }
        NodeKind::Param { name, default } => {
            check.name("name", name)?;
            check.opt_expr("default", default)
        }
        NodeKind::ClassDef { name, bases, body } => {
            check.name("name", name)?;
            for base in bases {
                check.name("bases", base)?;
            }
            check.statements("body", body)
        }
        NodeKind::EntryGuard { entry } => check.name("entry", entry),
        NodeKind::Block { stmts } => check.statements("stmts", stmts),
        NodeKind::VarDecl { name, init } => {
            check.name("name", name)?;
            check.opt_expr("init", init)
        }
        NodeKind::For {
            init,
            cond,
            step,
            body,
        } => {
            if let Some(init) = init {
                check.expect(
                    "init",
                    init,
                    |c| matches!(c.kind(), NodeKind::VarDecl { .. }) || c.category().is_expression_like(),
                    "a VarDecl or an expression",
                )?;
            }
            check.opt_expr("cond", cond)?;
            check.opt_expr("step", step)?;
            check.block("body", body)
        }
        NodeKind::ForRange {
            var,
            start,
            stop,
            step,
            body,
        } => {
            check.name("var", var)?;
            check.expr("start", start)?;
            check.expr("stop", stop)?;
            check.expr("step", step)?;
            check.block("body", body)
        }
        NodeKind::ForEach { var, iter, body } => {
            check.name("var", var)?;
            check.expr("iter", iter)?;
            check.block("body", body)
        }
        NodeKind::While { cond, body } | NodeKind::DoWhile { body, cond } => {
            check.expr("cond", cond)?;
            check.block("body", body)
        }
        NodeKind::If { cond, then, orelse } => {
            check.expr("cond", cond)?;
            check.block("then", then)?;
            if let Some(orelse) = orelse {
                check.expect(
                    "orelse",
                    orelse,
                    |c| matches!(c.kind(), NodeKind::Block { .. } | NodeKind::If { .. }),
                    "a Block or an If",
                )?;
            }
            Ok(())
        }
        NodeKind::Return { value } => check.opt_expr("value", value),
        NodeKind::ExprStmt { expr } => check.expr("expr", expr),
        NodeKind::Import { module } => check.name("module", module),
        NodeKind::Include { path, .. } => check.name("path", path),
        NodeKind::Call { callee, args } => {
            check.expr("callee", callee)?;
            for arg in args {
                check.expect(
                    "args",
                    arg,
                    |c| c.category().is_expression_like() || c.category() == Category::Argument,
                    "an argument",
                )?;
            }
            Ok(())
        }
        NodeKind::Keyword { name, value } => {
            check.name("name", name)?;
            check.expr("value", value)
        }
        NodeKind::Identifier { name } => check.name("name", name),
        NodeKind::List { items } => {
            for item in items {
                check.expr("items", item)?;
            }
            Ok(())
        }
        NodeKind::BinaryOp { left, right, .. } => {
            check.expr("left", left)?;
            check.expr("right", right)
        }
        NodeKind::UnaryOp { operand, .. } => check.expr("operand", operand),
        NodeKind::Ternary { cond, then, orelse } => {
            check.expr("cond", cond)?;
            check.expr("then", then)?;
            check.expr("orelse", orelse)
        }
        NodeKind::Assign { target, value, .. } => {
            check.expect(
                "target",
                target,
                |c| {
                    matches!(
                        c.kind(),
                        NodeKind::Identifier { .. }
                            | NodeKind::Member { .. }
                            | NodeKind::Subscript { .. }
                            | NodeKind::Opaque { .. }
                    )
                },
                "an assignable expression",
            )?;
            check.expr("value", value)
        }
        NodeKind::Member { object, field } => {
            check.expr("object", object)?;
            check.name("field", field)
        }
        NodeKind::Subscript { object, index } => {
            check.expr("object", object)?;
            check.expr("index", index)
        }
        NodeKind::Cast { expr, .. } => check.expr("expr", expr),
        NodeKind::Break
        | NodeKind::Continue
        | NodeKind::Using { .. }
        | NodeKind::Elided { .. }
        | NodeKind::Comment { .. }
        | NodeKind::Literal { .. }
        | NodeKind::Opaque { .. } => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counter_loop_body() -> Node {
        let step = Node::new(NodeKind::Assign {
            target: Box::new(Node::identifier("total")),
            op: AssignOp::Add,
            value: Box::new(Node::identifier("i")),
        })
        .unwrap();
        Node::block(vec![Node::expr_stmt(step).unwrap()]).unwrap()
    }

    #[test]
    fn test_block_rejects_expression() {
        let result = Node::block(vec![Node::int(1)]);
        match result {
            Err(StructuralError { node, slot, .. }) => {
                assert_eq!(node, "Block");
                assert_eq!(slot, "stmts");
            }
            other => panic!("Expected StructuralError, got {:?}", other),
        }
    }

    #[test]
    fn test_for_body_must_be_block() {
        let result = Node::new(NodeKind::While {
            cond: Box::new(Node::literal(Literal::Bool(true))),
            body: Box::new(Node::new(NodeKind::Break).unwrap()),
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_empty_names_rejected() {
        assert!(Node::new(NodeKind::Identifier { name: String::new() }).is_err());
        assert!(Node::new(NodeKind::VarDecl {
            name: String::new(),
            init: None
        })
        .is_err());
    }

    #[test]
    fn test_opaque_fits_statement_and_expression_slots() {
        let opaque = Node::opaque("goto end;", "goto");
        assert!(Node::block(vec![opaque.clone()]).is_ok());
        assert!(Node::expr_stmt(opaque).is_ok());
    }

    #[test]
    fn test_equality_ignores_span() {
        let span = Span {
            start_byte: 0,
            end_byte: 1,
            line: 1,
            column: 1,
        };
        let a = Node::identifier("x").with_span(Some(span));
        let b = Node::identifier("x");
        assert_eq!(a, b);
        assert_ne!(b.clone(), b.with_type(TypeName::new("int")));
    }

    #[test]
    fn test_children_slot_order() {
        let call = Node::call_named("f", vec![Node::int(1), Node::int(2)]).unwrap();
        let names: Vec<&str> = call.children().iter().map(|c| c.name()).collect();
        assert_eq!(names, vec!["Identifier", "Literal", "Literal"]);
        assert_eq!(call.size(), 4);
    }

    #[test]
    fn test_try_map_children_revalidates() {
        let body = counter_loop_body();
        let result: Result<Node, StructuralError> =
            body.try_map_children(|_| Ok(Node::int(0)));
        assert!(result.is_err());
    }

    #[test]
    fn test_try_map_children_keeps_annotations() -> anyhow::Result<()> {
        let span = Span {
            start_byte: 3,
            end_byte: 9,
            line: 2,
            column: 4,
        };
        let sum = Node::binary(BinOp::Add, Node::identifier("a"), Node::int(1))?
            .with_span(Some(span))
            .with_type(TypeName::new("int"));
        let mapped: Node = sum.try_map_children::<StructuralError, _>(|child| {
            Ok(match child.as_identifier() {
                Some(_) => Node::identifier("b"),
                None => child,
            })
        })?;
        assert_eq!(mapped.span(), Some(span));
        assert_eq!(mapped.ty(), Some(&TypeName::new("int")));
        match mapped.kind() {
            NodeKind::BinaryOp { left, .. } => assert_eq!(left.as_identifier(), Some("b")),
            other => panic!("Expected BinaryOp, got {:?}", other),
        }
        Ok(())
    }

    #[test]
    fn test_as_int_looks_through_negation() {
        let neg = Node::new(NodeKind::UnaryOp {
            op: UnOp::Neg,
            operand: Box::new(Node::int(3)),
        })
        .unwrap();
        assert_eq!(neg.as_int(), Some(-3));
        assert_eq!(Node::identifier("n").as_int(), None);
    }
}
