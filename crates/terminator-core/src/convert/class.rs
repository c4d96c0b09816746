//! Class lowering.
//!
//! Instance fields become attributes assigned in a single `__init__`, built
//! from the base initializer, the field defaults and initializer list, and
//! the constructor body, in that order. Static fields stay class attributes.

use std::collections::HashMap;

use tracing::debug;
use tree_sitter::Node as TsNode;

use super::scope::ClassInfo;
use super::{
    code_children, comment_text, field_children, has_child_kind, is_static, named_children, Converter,
    FunctionParts,
};
use crate::error::StructuralError;
use crate::frontend::node_span;
use crate::tree::{AssignOp, FnKind, Literal, Node, NodeKind, TypeName};

/// One member of a class body, classified before anything is lowered.
enum Member<'t> {
    Comment(TsNode<'t>),
    Field(FieldPlan<'t>),
    Ctor(TsNode<'t>),
    Method(TsNode<'t>),
    Unsupported(TsNode<'t>, String),
}

struct FieldPlan<'t> {
    node: TsNode<'t>,
    name: String,
    ty: Option<TypeName>,
    default: Option<TsNode<'t>>,
    is_static: bool,
}

impl Converter<'_> {
    /// Lower a class or struct specifier. `whole` is the construct quoted
    /// when the class is unsupported. Forward declarations yield `None`.
    pub(crate) fn convert_class(
        &mut self,
        spec: TsNode<'_>,
        whole: TsNode<'_>,
    ) -> Result<Option<Node>, StructuralError> {
        let Some(body) = spec.child_by_field_name("body") else {
            debug!("Dropping forward declaration {}", self.text(spec).trim());
            return Ok(None);
        };
        let name = match spec.child_by_field_name("name") {
            Some(name) if name.kind() == "type_identifier" => self.text(name).to_string(),
            Some(_) => return Ok(Some(self.unsupported(whole, "class template specialisation"))),
            None => return Ok(Some(self.unsupported(whole, "anonymous class"))),
        };
        let bases = match self.base_classes(spec) {
            Ok(bases) => bases,
            Err(reason) => return Ok(Some(self.unsupported(whole, reason))),
        };

        let members = self.plan_members(body, &name);
        let info = self.class_info(&name, &members);
        self.classes.insert(name.clone(), info.clone());

        let outer = self.class.replace(info);
        let lowered = self.lower_members(bases.first().map(String::as_str), &members);
        self.class = outer;

        Ok(Some(
            Node::new(NodeKind::ClassDef {
                name,
                bases,
                body: lowered?,
            })?
            .with_span(Some(node_span(whole))),
        ))
    }

    fn base_classes(&self, spec: TsNode<'_>) -> Result<Vec<String>, String> {
        let Some(clause) = named_children(spec)
            .into_iter()
            .find(|child| child.kind() == "base_class_clause")
        else {
            return Ok(Vec::new());
        };
        let bases: Vec<TsNode<'_>> = code_children(clause)
            .into_iter()
            .filter(|child| !matches!(child.kind(), "access_specifier" | "virtual"))
            .collect();
        if bases.len() > 1 {
            return Err("multiple inheritance".into());
        }
        let is_virtual = self
            .text(clause)
            .split(|c: char| !(c.is_alphanumeric() || c == '_'))
            .any(|word| word == "virtual");
        if is_virtual {
            return Err("virtual inheritance".into());
        }
        match bases.first() {
            None => Ok(Vec::new()),
            Some(base) if base.kind() == "template_type" => Err("template base class".into()),
            Some(base) => Ok(vec![self.text(*base).to_string()]),
        }
    }

    fn plan_members<'t>(&self, body: TsNode<'t>, class_name: &str) -> Vec<Member<'t>> {
        let mut members = Vec::new();
        for node in named_children(body) {
            let reason = match node.kind() {
                "access_specifier" => continue,
                "comment" => {
                    members.push(Member::Comment(node));
                    continue;
                }
                "field_declaration" => {
                    self.plan_fields(node, &mut members);
                    continue;
                }
                "function_definition" if has_child_kind(node, "delete_method_clause") => {
                    debug!("Dropping deleted member {}", self.text(node).trim());
                    continue;
                }
                "function_definition" => {
                    if self.is_constructor(node, class_name) {
                        members.push(Member::Ctor(node));
                    } else {
                        members.push(Member::Method(node));
                    }
                    continue;
                }
                "declaration" => "member declared without a body".to_string(),
                "friend_declaration" => "friend declaration".to_string(),
                "template_declaration" => "member template".to_string(),
                "using_declaration" | "alias_declaration" | "type_definition" => "member type alias".to_string(),
                "static_assert_declaration" => "static_assert".to_string(),
                kind if kind.starts_with("preproc") => "preprocessor directive in class".to_string(),
                other => format!("`{other}` member"),
            };
            members.push(Member::Unsupported(node, reason));
        }
        members
    }

    fn plan_fields<'t>(&self, node: TsNode<'t>, members: &mut Vec<Member<'t>>) {
        let type_node = node.child_by_field_name("type");
        if let Some(spec) = type_node {
            let nested = matches!(
                spec.kind(),
                "class_specifier" | "struct_specifier" | "enum_specifier" | "union_specifier"
            );
            if nested && spec.child_by_field_name("body").is_some() {
                members.push(Member::Unsupported(node, "nested type".into()));
                return;
            }
        }

        let declarators = field_children(node, "declarator");
        if declarators.iter().any(|d| d.kind() == "function_declarator") {
            members.push(Member::Unsupported(node, "member declared without a body".into()));
            return;
        }
        let defaults = field_children(node, "default_value");
        if declarators.len() > 1 && !defaults.is_empty() {
            members.push(Member::Unsupported(node, "several initialised fields in one declaration".into()));
            return;
        }

        let ty = type_node.map(|t| TypeName::new(self.text(t)));
        let is_static = is_static(node, self.source);
        let mut planned = Vec::with_capacity(declarators.len());
        for declarator in declarators {
            match self.declared_name(declarator) {
                Ok(name) => planned.push(Member::Field(FieldPlan {
                    node,
                    name,
                    ty: ty.clone(),
                    default: defaults.first().copied(),
                    is_static,
                })),
                Err(reason) => {
                    members.push(Member::Unsupported(node, reason));
                    return;
                }
            }
        }
        members.extend(planned);
    }

    fn is_constructor(&self, node: TsNode<'_>, class_name: &str) -> bool {
        node.child_by_field_name("type").is_none()
            && node
                .child_by_field_name("declarator")
                .filter(|d| d.kind() == "function_declarator")
                .and_then(|d| d.child_by_field_name("declarator"))
                .map(|name| name.kind() == "identifier" && self.text(name) == class_name)
                .unwrap_or(false)
    }

    fn class_info(&self, name: &str, members: &[Member<'_>]) -> ClassInfo {
        let mut info = ClassInfo::new(name);
        for member in members {
            match member {
                Member::Field(field) if field.is_static => {
                    info.statics.insert(field.name.clone(), field.ty.clone());
                }
                Member::Field(field) => {
                    info.fields.insert(field.name.clone(), field.ty.clone());
                }
                Member::Method(node) => {
                    if let Ok(parts) = self.function_parts(*node) {
                        if parts.is_static {
                            info.static_methods.insert(parts.name, parts.returns);
                        } else {
                            info.methods.insert(parts.name, parts.returns);
                        }
                    }
                }
                _ => {}
            }
        }
        info
    }

    fn lower_members(&mut self, base: Option<&str>, members: &[Member<'_>]) -> Result<Vec<Node>, StructuralError> {
        let fields: Vec<&FieldPlan<'_>> = members
            .iter()
            .filter_map(|member| match member {
                Member::Field(field) if !field.is_static => Some(field),
                _ => None,
            })
            .collect();
        let first_ctor = members.iter().find_map(|member| match member {
            Member::Ctor(node) => Some(*node),
            _ => None,
        });

        let mut body = Vec::new();
        let mut init_done = false;
        for member in members {
            match member {
                Member::Comment(node) => {
                    body.push(Node::comment(comment_text(self.text(*node))).with_span(Some(node_span(*node))));
                }
                Member::Field(field) if field.is_static => body.push(self.class_attribute(field)?),
                Member::Field(_) | Member::Ctor(_) if !init_done => {
                    init_done = true;
                    self.lower_init(base, first_ctor, &fields, &mut body)?;
                }
                Member::Field(_) => {}
                Member::Ctor(node) => {
                    if Some(*node) != first_ctor {
                        body.push(self.unsupported(*node, "constructor overload"));
                    }
                }
                Member::Method(node) => body.push(self.convert_function(*node, true)?),
                Member::Unsupported(node, reason) => body.push(self.unsupported(*node, reason.clone())),
            }
        }
        Ok(body)
    }

    fn class_attribute(&mut self, field: &FieldPlan<'_>) -> Result<Node, StructuralError> {
        let init = self.field_value(field, None)?;
        Ok(Node::new(NodeKind::VarDecl {
            name: field.name.clone(),
            init: Some(Box::new(init)),
        })?
        .with_type_opt(field.ty.clone())
        .with_span(Some(node_span(field.node))))
    }

    /// Initial value of a field: the constructor's initializer if present,
    /// then the in-class default, then the zero value of its type.
    fn field_value(&mut self, field: &FieldPlan<'_>, init: Option<TsNode<'_>>) -> Result<Node, StructuralError> {
        match init.or(field.default) {
            Some(value) => self.initializer(field.node, value, field.ty.as_ref()),
            None => Ok(field
                .ty
                .as_ref()
                .map(TypeName::default_value)
                .unwrap_or_else(|| Node::literal(Literal::Null))),
        }
    }

    fn lower_init(
        &mut self,
        base: Option<&str>,
        ctor: Option<TsNode<'_>>,
        fields: &[&FieldPlan<'_>],
        out: &mut Vec<Node>,
    ) -> Result<(), StructuralError> {
        let mut parts = None;
        if let Some(ctor) = ctor {
            match self.function_parts(ctor) {
                Ok(found) => parts = Some((ctor, found)),
                Err(reason) => out.push(self.unsupported(ctor, reason)),
            }
        }

        let was_static = std::mem::replace(&mut self.in_static, false);
        let saved = self.scopes.enter_function();
        let lowered = self.lower_init_body(base, parts.as_ref(), fields);
        self.scopes.exit_function(saved);
        self.in_static = was_static;
        let (params, stmts) = lowered?;

        let body_span = parts.as_ref().and_then(|(_, p)| p.body).map(node_span);
        let span = parts.as_ref().map(|(ctor, _)| node_span(*ctor));
        out.push(
            Node::new(NodeKind::FunctionDef {
                name: "__init__".to_string(),
                kind: FnKind::Method,
                params,
                returns: None,
                body: Box::new(Node::block(stmts)?.with_span(body_span)),
            })?
            .with_span(span),
        );
        Ok(())
    }

    fn lower_init_body(
        &mut self,
        base: Option<&str>,
        ctor: Option<&(TsNode<'_>, FunctionParts<'_>)>,
        fields: &[&FieldPlan<'_>],
    ) -> Result<(Vec<Node>, Vec<Node>), StructuralError> {
        let params = match ctor {
            Some((_, parts)) => self.lower_params(&parts.params)?,
            None => Vec::new(),
        };

        let mut inits: HashMap<&str, TsNode<'_>> = HashMap::new();
        let mut base_args = None;
        let mut stray = Vec::new();
        let list = ctor.and_then(|(node, _)| {
            named_children(*node)
                .into_iter()
                .find(|child| child.kind() == "field_initializer_list")
        });
        for init in list.map(code_children).unwrap_or_default() {
            let children = code_children(init);
            let (Some(target), Some(value), 2) = (children.first(), children.last(), children.len()) else {
                stray.push(self.unsupported(init, "malformed member initializer"));
                continue;
            };
            let target = self.text(*target);
            if Some(target) == base {
                base_args = Some(*value);
            } else if let Some(field) = fields.iter().find(|f| f.name == target) {
                inits.insert(field.name.as_str(), *value);
            } else {
                stray.push(self.unsupported(init, "initializer for an unknown member"));
            }
        }

        let mut stmts = Vec::new();
        if base.is_some() {
            let mut args = Vec::new();
            for arg in base_args.map(code_children).unwrap_or_default() {
                args.push(self.convert_expr(arg)?);
            }
            let super_init = Node::member(Node::nullary_call("super"), "__init__")?;
            stmts.push(Node::expr_stmt(Node::call(super_init, args)?)?);
        }
        for field in fields {
            let value = self.field_value(field, inits.get(field.name.as_str()).copied())?;
            let target = Node::member(Node::identifier("self"), &field.name)?.with_type_opt(field.ty.clone());
            let assign = Node::new(NodeKind::Assign {
                target: Box::new(target),
                op: AssignOp::Assign,
                value: Box::new(value),
            })?
            .with_type_opt(field.ty.clone());
            stmts.push(Node::expr_stmt(assign)?.with_span(Some(node_span(field.node))));
        }
        stmts.extend(stray);
        if let Some(body) = ctor.and_then(|(_, parts)| parts.body) {
            stmts.extend(self.convert_statements(body)?);
        }
        Ok((params, stmts))
    }
}
