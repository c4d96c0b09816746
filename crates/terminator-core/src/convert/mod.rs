/*!
# Tree Converter

Lowers the tree-sitter concrete syntax tree into the internal tree, one
native construct at a time. Constructs outside the supported subset become
`Opaque` nodes carrying their verbatim text, with one `Unsupported`
diagnostic each; the rest of the file still converts.

Light type inference happens here: declared types of variables, parameters,
fields and function results are attached to the nodes that refer to them so
rules can make type-directed decisions (integer division, casts).
*/

use std::collections::HashMap;

use tracing::debug;
use tree_sitter::Node as TsNode;

use crate::diagnostics::Diagnostic;
use crate::error::StructuralError;
use crate::frontend::{node_span, node_text, ParsedSource};
use crate::tree::{FnKind, Node, NodeKind, TypeName};

mod class;
mod expr;
mod scope;

use scope::{ClassInfo, Scopes};

/// Result of lowering one translation unit.
#[derive(Debug)]
pub struct Conversion {
    pub module: Node,
    pub diagnostics: Vec<Diagnostic>,
}

/// Lower a parsed file into a `Module` node.
pub fn convert(parsed: &ParsedSource<'_>) -> Result<Conversion, StructuralError> {
    let mut converter = Converter::new(parsed.source());
    let module = converter.convert_unit(parsed.root())?;
    Ok(Conversion {
        module,
        diagnostics: converter.diagnostics,
    })
}

pub(crate) struct Converter<'s> {
    source: &'s str,
    diagnostics: Vec<Diagnostic>,
    scopes: Scopes,
    /// Result types of free functions, from definitions and prototypes
    functions: HashMap<String, Option<TypeName>>,
    /// Every class converted so far, by name
    classes: HashMap<String, ClassInfo>,
    /// The class whose members are being converted
    class: Option<ClassInfo>,
    in_static: bool,
}

/// A parameter as declared, before its default value is lowered.
pub(crate) struct ParamSpec<'t> {
    name: String,
    ty: Option<TypeName>,
    default: Option<TsNode<'t>>,
    node: TsNode<'t>,
}

/// The pieces of a `function_definition`.
pub(crate) struct FunctionParts<'t> {
    name: String,
    returns: Option<TypeName>,
    params: Vec<ParamSpec<'t>>,
    body: Option<TsNode<'t>>,
    is_static: bool,
}

impl<'s> Converter<'s> {
    fn new(source: &'s str) -> Self {
        Self {
            source,
            diagnostics: Vec::new(),
            scopes: Scopes::new(),
            functions: HashMap::new(),
            classes: HashMap::new(),
            class: None,
            in_static: false,
        }
    }

    fn text(&self, node: TsNode<'_>) -> &'s str {
        node_text(node, self.source)
    }

    /// Record an unsupported construct and return its opaque stand-in.
    fn unsupported(&mut self, node: TsNode<'_>, reason: impl Into<String>) -> Node {
        let reason = reason.into();
        let span = node_span(node);
        debug!("Unsupported {} at {}: {}", node.kind(), span, reason);
        self.diagnostics.push(Diagnostic::unsupported(Some(span), reason.clone()));
        Node::opaque(self.text(node).trim_end(), reason).with_span(Some(span))
    }

    fn convert_unit(&mut self, root: TsNode<'_>) -> Result<Node, StructuralError> {
        self.prescan(root);
        let mut body = Vec::new();
        for child in named_children(root) {
            self.convert_top_level(child, &mut body)?;
        }
        Ok(Node::module(body)?.with_span(Some(node_span(root))))
    }

    /// Collect free function result types so calls to functions defined
    /// further down the file are typed too.
    fn prescan(&mut self, node: TsNode<'_>) {
        for child in named_children(node) {
            match child.kind() {
                "function_definition" => {
                    if let Ok(parts) = self.function_parts(child) {
                        self.functions.insert(parts.name, parts.returns);
                    }
                }
                "declaration" => {
                    let returns = child
                        .child_by_field_name("type")
                        .map(|t| TypeName::new(self.text(t)));
                    for declarator in field_children(child, "declarator") {
                        if declarator.kind() != "function_declarator" {
                            continue;
                        }
                        if let Some(name) = declarator.child_by_field_name("declarator") {
                            if name.kind() == "identifier" {
                                self.functions.insert(self.text(name).to_string(), returns.clone());
                            }
                        }
                    }
                }
                "preproc_ifdef" if self.is_include_guard(child) => self.prescan(child),
                _ => {}
            }
        }
    }

    fn convert_top_level(&mut self, node: TsNode<'_>, out: &mut Vec<Node>) -> Result<(), StructuralError> {
        match node.kind() {
            "preproc_include" => out.push(self.convert_include(node)?),
            "function_definition" => out.push(self.convert_function(node, false)?),
            "class_specifier" | "struct_specifier" => {
                if let Some(class) = self.convert_class(node, node)? {
                    out.push(class);
                }
            }
            "preproc_ifdef" if self.is_include_guard(node) => {
                let mut children = named_children(node).into_iter();
                // skip the guard name and its #define
                children.next();
                children.next();
                for child in children {
                    self.convert_top_level(child, out)?;
                }
            }
            "preproc_call" if self.text(node).trim_start().starts_with("#pragma") => {
                debug!("Dropping {}", self.text(node).trim());
            }
            "namespace_definition" => out.push(self.unsupported(node, "namespace")),
            "template_declaration" => out.push(self.unsupported(node, "template")),
            "linkage_specification" => out.push(self.unsupported(node, "linkage specification")),
            "preproc_def" | "preproc_function_def" => out.push(self.unsupported(node, "preprocessor macro")),
            "preproc_if" | "preproc_ifdef" => out.push(self.unsupported(node, "conditional compilation")),
            _ => self.convert_statement(node, out)?,
        }
        Ok(())
    }

    /// `#ifndef X` immediately followed by `#define X`.
    fn is_include_guard(&self, node: TsNode<'_>) -> bool {
        if !self.text(node).trim_start().starts_with("#ifndef") {
            return false;
        }
        let children = named_children(node);
        match (children.first(), children.get(1)) {
            (Some(name), Some(define)) => {
                define.kind() == "preproc_def"
                    && define.child_by_field_name("value").is_none()
                    && define
                        .child_by_field_name("name")
                        .map(|n| self.text(n) == self.text(*name))
                        .unwrap_or(false)
            }
            _ => false,
        }
    }

    fn convert_include(&mut self, node: TsNode<'_>) -> Result<Node, StructuralError> {
        let Some(path_node) = node.child_by_field_name("path") else {
            return Ok(self.unsupported(node, "computed include"));
        };
        let raw = self.text(path_node);
        let system = path_node.kind() == "system_lib_string";
        let path = raw.trim_matches(|c| c == '<' || c == '>' || c == '"');
        Ok(Node::new(NodeKind::Include {
            path: path.to_string(),
            system,
        })?
        .with_span(Some(node_span(node))))
    }

    // Functions

    /// Inspect a function definition. Errors carry the reason the function
    /// is outside the supported subset.
    pub(crate) fn function_parts<'t>(&self, node: TsNode<'t>) -> Result<FunctionParts<'t>, String> {
        let mut declarator = node
            .child_by_field_name("declarator")
            .ok_or_else(|| "function without declarator".to_string())?;
        loop {
            match declarator.kind() {
                "function_declarator" => break,
                "reference_declarator" => {
                    declarator = first_named(declarator).ok_or_else(|| "malformed declarator".to_string())?;
                }
                "pointer_declarator" => return Err("pointer return type".into()),
                other => return Err(format!("`{other}` declarator")),
            }
        }

        let name_node = declarator
            .child_by_field_name("declarator")
            .ok_or_else(|| "function without name".to_string())?;
        let name = match name_node.kind() {
            "identifier" | "field_identifier" => self.text(name_node).to_string(),
            "qualified_identifier" => return Err("out-of-class member definition".into()),
            "destructor_name" => return Err("destructor".into()),
            "operator_name" => return Err("operator overload".into()),
            "template_function" => return Err("template specialisation".into()),
            other => return Err(format!("`{other}` function name")),
        };

        let params = match declarator.child_by_field_name("parameters") {
            Some(list) => self.param_specs(list)?,
            None => Vec::new(),
        };

        let body = match node.child_by_field_name("body") {
            Some(body) if body.kind() == "compound_statement" => Some(body),
            Some(_) => return Err("function try block".into()),
            None => None,
        };

        let returns = node
            .child_by_field_name("type")
            .map(|t| TypeName::new(self.text(t)));
        if returns.as_ref().map(|t| t.as_str() == "auto").unwrap_or(false) {
            return Err("deduced return type".into());
        }

        Ok(FunctionParts {
            name,
            returns,
            params,
            body,
            is_static: is_static(node, self.source),
        })
    }

    fn param_specs<'t>(&self, list: TsNode<'t>) -> Result<Vec<ParamSpec<'t>>, String> {
        let mut specs = Vec::new();
        for (index, param) in code_children(list).into_iter().enumerate() {
            match param.kind() {
                "parameter_declaration" | "optional_parameter_declaration" => {}
                "variadic_parameter_declaration" | "variadic_parameter" => {
                    return Err("variadic parameters".into())
                }
                other => return Err(format!("`{other}` parameter")),
            }
            let ty = param
                .child_by_field_name("type")
                .map(|t| TypeName::new(self.text(t)));
            let name = match param.child_by_field_name("declarator") {
                Some(declarator) => self.declared_name(declarator)?,
                None if ty.as_ref().map(|t| t.is_void()).unwrap_or(false) => continue,
                None => format!("_arg{index}"),
            };
            specs.push(ParamSpec {
                name,
                ty,
                default: param.child_by_field_name("default_value"),
                node: param,
            });
        }
        Ok(specs)
    }

    /// The variable name a declarator introduces.
    fn declared_name(&self, declarator: TsNode<'_>) -> Result<String, String> {
        match declarator.kind() {
            "identifier" | "field_identifier" => Ok(self.text(declarator).to_string()),
            "reference_declarator" => match first_named(declarator) {
                Some(inner) => self.declared_name(inner),
                None => Ok(format!("_ref{}", declarator.start_byte())),
            },
            "abstract_reference_declarator" => Ok(format!("_ref{}", declarator.start_byte())),
            "pointer_declarator" | "abstract_pointer_declarator" => Err("pointer".into()),
            "array_declarator" => Err("C array".into()),
            "function_declarator" => Err("function pointer".into()),
            "structured_binding_declarator" => Err("structured binding".into()),
            other => Err(format!("`{other}` declarator")),
        }
    }

    fn lower_params(&mut self, specs: &[ParamSpec<'_>]) -> Result<Vec<Node>, StructuralError> {
        let mut params = Vec::with_capacity(specs.len());
        for spec in specs {
            let default = match spec.default {
                Some(value) => Some(Box::new(self.convert_expr(value)?)),
                None => None,
            };
            self.scopes.declare(&spec.name, spec.ty.clone());
            let param = Node::new(NodeKind::Param {
                name: spec.name.clone(),
                default,
            })?
            .with_type_opt(spec.ty.clone())
            .with_span(Some(node_span(spec.node)));
            params.push(param);
        }
        Ok(params)
    }

    /// Lower a function definition, free or member.
    pub(crate) fn convert_function(&mut self, node: TsNode<'_>, in_class: bool) -> Result<Node, StructuralError> {
        let parts = match self.function_parts(node) {
            Ok(parts) => parts,
            Err(reason) => return Ok(self.unsupported(node, reason)),
        };
        let kind = match (in_class, parts.is_static) {
            (false, _) => FnKind::Free,
            (true, true) => FnKind::StaticMethod,
            (true, false) => FnKind::Method,
        };

        let was_static = std::mem::replace(&mut self.in_static, kind == FnKind::StaticMethod);
        let saved = self.scopes.enter_function();
        let params = self.lower_params(&parts.params)?;
        let stmts = match parts.body {
            Some(body) => self.convert_statements(body)?,
            None => Vec::new(),
        };
        self.scopes.exit_function(saved);
        self.in_static = was_static;

        Ok(Node::new(NodeKind::FunctionDef {
            name: parts.name,
            kind,
            params,
            returns: parts.returns,
            body: Box::new(Node::block(stmts)?.with_span(parts.body.map(node_span))),
        })?
        .with_span(Some(node_span(node))))
    }

    // Statements

    /// Statements of a compound statement, nested blocks inlined.
    fn convert_statements(&mut self, compound: TsNode<'_>) -> Result<Vec<Node>, StructuralError> {
        let mut out = Vec::new();
        for child in named_children(compound) {
            self.convert_statement(child, &mut out)?;
        }
        Ok(out)
    }

    /// A statement in a body position, wrapped in a fresh scope and block.
    fn body_block(&mut self, stmt: Option<TsNode<'_>>) -> Result<Node, StructuralError> {
        let mut out = Vec::new();
        if let Some(stmt) = stmt {
            self.scopes.push();
            let converted = self.convert_statement(stmt, &mut out);
            self.scopes.pop();
            converted?;
        }
        Ok(Node::block(out)?.with_span(stmt.map(node_span)))
    }

    fn convert_statement(&mut self, node: TsNode<'_>, out: &mut Vec<Node>) -> Result<(), StructuralError> {
        let span = Some(node_span(node));
        match node.kind() {
            "comment" => out.push(Node::comment(comment_text(self.text(node))).with_span(span)),
            "compound_statement" => {
                self.scopes.push();
                let converted = self.convert_statements(node);
                self.scopes.pop();
                out.extend(converted?);
            }
            "declaration" => self.convert_declaration(node, out)?,
            "expression_statement" => self.convert_expression_statement(node, out)?,
            "if_statement" => out.push(self.convert_if(node)?),
            "while_statement" => {
                let cond = match node.child_by_field_name("condition") {
                    Some(cond) => self.condition(cond)?,
                    None => {
                        out.push(self.unsupported(node, "malformed while loop"));
                        return Ok(());
                    }
                };
                let body = self.body_block(node.child_by_field_name("body"))?;
                out.push(
                    Node::new(NodeKind::While {
                        cond: Box::new(cond),
                        body: Box::new(body),
                    })?
                    .with_span(span),
                );
            }
            "do_statement" => {
                let body = self.body_block(node.child_by_field_name("body"))?;
                let cond = match node.child_by_field_name("condition") {
                    Some(cond) => self.condition(cond)?,
                    None => {
                        out.push(self.unsupported(node, "malformed do loop"));
                        return Ok(());
                    }
                };
                out.push(
                    Node::new(NodeKind::DoWhile {
                        body: Box::new(body),
                        cond: Box::new(cond),
                    })?
                    .with_span(span),
                );
            }
            "for_statement" => out.push(self.convert_for(node)?),
            "for_range_loop" => out.push(self.convert_for_each(node)?),
            "return_statement" => {
                let value = match code_children(node).into_iter().next() {
                    Some(value) => Some(Box::new(self.convert_expr(value)?)),
                    None => None,
                };
                out.push(Node::new(NodeKind::Return { value })?.with_span(span));
            }
            "break_statement" => out.push(Node::new(NodeKind::Break)?.with_span(span)),
            "continue_statement" => out.push(Node::new(NodeKind::Continue)?.with_span(span)),
            "class_specifier" | "struct_specifier" => out.push(self.unsupported(node, "local class")),
            "function_definition" => out.push(self.unsupported(node, "nested function")),
            "switch_statement" => out.push(self.unsupported(node, "switch statement")),
            "goto_statement" | "labeled_statement" => out.push(self.unsupported(node, "goto")),
            "try_statement" | "throw_statement" => out.push(self.unsupported(node, "exception handling")),
            "type_definition" | "alias_declaration" => out.push(self.unsupported(node, "type alias")),
            "enum_specifier" => out.push(self.unsupported(node, "enum")),
            "union_specifier" => out.push(self.unsupported(node, "union")),
            "static_assert_declaration" => out.push(self.unsupported(node, "static_assert")),
            "using_declaration" => {
                let text = self.text(node).trim_end_matches(';').trim();
                out.push(Node::new(NodeKind::Using { text: text.to_string() })?.with_span(span));
            }
            other => out.push(self.unsupported(node, format!("`{other}`"))),
        }
        Ok(())
    }

    fn convert_expression_statement(
        &mut self,
        node: TsNode<'_>,
        out: &mut Vec<Node>,
    ) -> Result<(), StructuralError> {
        let Some(expr) = code_children(node).into_iter().next() else {
            return Ok(());
        };
        // `a++, b++;` is two statements
        let mut pending = vec![expr];
        let mut parts = Vec::new();
        while let Some(next) = pending.pop() {
            if next.kind() == "comma_expression" {
                if let (Some(left), Some(right)) =
                    (next.child_by_field_name("left"), next.child_by_field_name("right"))
                {
                    pending.push(right);
                    pending.push(left);
                    continue;
                }
            }
            parts.push(next);
        }
        for part in parts {
            let converted = self.convert_expr(part)?;
            out.push(Node::expr_stmt(converted)?.with_span(Some(node_span(part))));
        }
        Ok(())
    }

    /// Condition of an `if`/`while`/`do`.
    fn condition(&mut self, node: TsNode<'_>) -> Result<Node, StructuralError> {
        if node.kind() != "condition_clause" {
            return self.convert_expr(node);
        }
        if node.child_by_field_name("initializer").is_some() {
            return Ok(self.unsupported(node, "condition with initializer"));
        }
        match node.child_by_field_name("value") {
            Some(value) if value.kind() == "declaration" => Ok(self.unsupported(node, "declaration in condition")),
            Some(value) => self.convert_expr(value),
            None => Ok(self.unsupported(node, "malformed condition")),
        }
    }

    fn convert_if(&mut self, node: TsNode<'_>) -> Result<Node, StructuralError> {
        let cond = match node.child_by_field_name("condition") {
            Some(cond) => self.condition(cond)?,
            None => return Ok(self.unsupported(node, "malformed if statement")),
        };
        let then = self.body_block(node.child_by_field_name("consequence"))?;
        let orelse = match node.child_by_field_name("alternative") {
            None => None,
            Some(alt) => {
                let stmt = if alt.kind() == "else_clause" {
                    code_children(alt).into_iter().next()
                } else {
                    Some(alt)
                };
                match stmt {
                    Some(stmt) if stmt.kind() == "if_statement" => Some(self.convert_if(stmt)?),
                    other => Some(self.body_block(other)?),
                }
            }
        };
        Ok(Node::new(NodeKind::If {
            cond: Box::new(cond),
            then: Box::new(then),
            orelse: orelse.map(Box::new),
        })?
        .with_span(Some(node_span(node))))
    }

    fn convert_for(&mut self, node: TsNode<'_>) -> Result<Node, StructuralError> {
        let init = node.child_by_field_name("initializer");
        let cond = node.child_by_field_name("condition");
        let update = node.child_by_field_name("update");

        let header = [init, cond, update];
        if header.iter().flatten().any(|n| n.kind() == "comma_expression") {
            return Ok(self.unsupported(node, "comma expression in for loop header"));
        }
        if let Some(init) = init {
            if init.kind() == "declaration" && field_children(init, "declarator").len() > 1 {
                return Ok(self.unsupported(node, "several loop variables"));
            }
        }

        self.scopes.push();
        let lowered = self.lower_for(node, init, cond, update);
        self.scopes.pop();
        lowered
    }

    fn lower_for(
        &mut self,
        node: TsNode<'_>,
        init: Option<TsNode<'_>>,
        cond: Option<TsNode<'_>>,
        update: Option<TsNode<'_>>,
    ) -> Result<Node, StructuralError> {
        let init = match init {
            None => None,
            Some(init) if init.kind() == "declaration" => {
                let mut decls = Vec::new();
                self.convert_declaration(init, &mut decls)?;
                decls.pop().map(Box::new)
            }
            Some(init) => Some(Box::new(self.convert_expr(init)?)),
        };
        let cond = match cond {
            Some(cond) => Some(Box::new(self.convert_expr(cond)?)),
            None => None,
        };
        let step = match update {
            Some(update) => Some(Box::new(self.convert_expr(update)?)),
            None => None,
        };
        let body = self.body_block(node.child_by_field_name("body"))?;
        Ok(Node::new(NodeKind::For {
            init,
            cond,
            step,
            body: Box::new(body),
        })?
        .with_span(Some(node_span(node))))
    }

    fn convert_for_each(&mut self, node: TsNode<'_>) -> Result<Node, StructuralError> {
        if node.child_by_field_name("initializer").is_some() {
            return Ok(self.unsupported(node, "range-for with initializer"));
        }
        let var = match node.child_by_field_name("declarator").map(|d| self.declared_name(d)) {
            Some(Ok(var)) => var,
            Some(Err(reason)) => return Ok(self.unsupported(node, reason)),
            None => return Ok(self.unsupported(node, "malformed range-for")),
        };
        let Some(right) = node.child_by_field_name("right") else {
            return Ok(self.unsupported(node, "malformed range-for"));
        };
        let iter = self.convert_expr(right)?;

        let declared = node
            .child_by_field_name("type")
            .map(|t| TypeName::new(self.text(t)))
            .filter(|t| t.as_str() != "auto");
        let element = declared.or_else(|| iter.ty().and_then(element_type));

        self.scopes.push();
        self.scopes.declare(&var, element);
        let body = self.body_block(node.child_by_field_name("body"));
        self.scopes.pop();

        Ok(Node::new(NodeKind::ForEach {
            var,
            iter: Box::new(iter),
            body: Box::new(body?),
        })?
        .with_span(Some(node_span(node))))
    }

    // Declarations

    /// Variable declarations, prototypes (dropped) and class definitions.
    fn convert_declaration(&mut self, node: TsNode<'_>, out: &mut Vec<Node>) -> Result<(), StructuralError> {
        let type_node = node.child_by_field_name("type");
        if let Some(spec) = type_node {
            match spec.kind() {
                "class_specifier" | "struct_specifier" if spec.child_by_field_name("body").is_some() => {
                    if self.scopes.in_function() {
                        out.push(self.unsupported(node, "local class"));
                        return Ok(());
                    }
                    if let Some(class) = self.convert_class(spec, node)? {
                        out.push(class);
                    }
                }
                "enum_specifier" => {
                    out.push(self.unsupported(node, "enum"));
                    return Ok(());
                }
                "union_specifier" => {
                    out.push(self.unsupported(node, "union"));
                    return Ok(());
                }
                _ => {}
            }
        }

        let ty = type_node
            .map(|t| match t.kind() {
                "class_specifier" | "struct_specifier" => t
                    .child_by_field_name("name")
                    .map(|n| self.text(n))
                    .unwrap_or(""),
                _ => self.text(t),
            })
            .map(TypeName::new)
            .filter(|t| t.as_str() != "auto" && !t.as_str().is_empty());

        // Plan first so a declaration is either lowered whole or kept opaque
        let mut planned = Vec::new();
        for declarator in field_children(node, "declarator") {
            let (name_node, value) = match declarator.kind() {
                "function_declarator" => {
                    debug!("Dropping prototype {}", self.text(declarator));
                    continue;
                }
                "init_declarator" => (declarator.child_by_field_name("declarator"), declarator.child_by_field_name("value")),
                _ => (Some(declarator), None),
            };
            let name = match name_node.map(|n| self.declared_name(n)) {
                Some(Ok(name)) => name,
                Some(Err(reason)) => {
                    out.push(self.unsupported(node, reason));
                    return Ok(());
                }
                None => {
                    out.push(self.unsupported(node, "malformed declaration"));
                    return Ok(());
                }
            };
            if ty.as_ref().map(|t| t.is_pointer()).unwrap_or(false) {
                out.push(self.unsupported(node, "pointer"));
                return Ok(());
            }
            planned.push((name, value));
        }

        for (name, value) in planned {
            let init = match value {
                Some(value) => Some(self.initializer(node, value, ty.as_ref())?),
                None => ty.as_ref().map(|t| t.default_value()),
            };
            let var_ty = ty.clone().or_else(|| init.as_ref().and_then(|i| i.ty().cloned()));
            self.scopes.declare(&name, var_ty.clone());
            out.push(
                Node::new(NodeKind::VarDecl {
                    name,
                    init: init.map(Box::new),
                })?
                .with_type_opt(var_ty)
                .with_span(Some(node_span(node))),
            );
        }
        Ok(())
    }

    /// The value a declarator is initialised with: `= expr`, `{...}` or `(...)`.
    fn initializer(
        &mut self,
        decl: TsNode<'_>,
        value: TsNode<'_>,
        ty: Option<&TypeName>,
    ) -> Result<Node, StructuralError> {
        let braced = value.kind() == "initializer_list";
        if !braced && value.kind() != "argument_list" {
            return self.convert_expr(value);
        }

        let mut items = Vec::new();
        for item in code_children(value) {
            items.push(self.convert_expr(item)?);
        }
        let Some(ty) = ty else {
            return match braced {
                true => Ok(Node::new(NodeKind::List { items })?),
                false => Ok(self.unsupported(decl, "constructor-style initialisation")),
            };
        };

        if ty.is_numeric() || ty.is_bool() || ty.is_textual() {
            return match items.len() {
                0 => Ok(ty.default_value()),
                1 => Ok(items.remove(0)),
                _ => Ok(self.unsupported(decl, "constructor-style initialisation")),
            };
        }
        if ty.is_user_type() {
            return Ok(Node::call_named(ty.as_str(), items)?.with_type(ty.clone()));
        }
        match ty.template_parts() {
            Some((head, _)) if braced && matches!(head, "vector" | "list" | "deque" | "array") => {
                Ok(Node::new(NodeKind::List { items })?.with_type(ty.clone()))
            }
            Some((head, _)) if !braced && items.is_empty() && head != "array" => Ok(ty.default_value()),
            _ => Ok(self.unsupported(decl, "container initialisation")),
        }
    }
}

/// Element type of an iterable container type.
pub(crate) fn element_type(ty: &TypeName) -> Option<TypeName> {
    if ty.is_textual() {
        return Some(TypeName::new("char"));
    }
    let (head, mut args) = ty.template_parts()?;
    match head {
        "vector" | "list" | "deque" | "array" | "set" | "unordered_set" | "multiset" => {
            if args.is_empty() {
                None
            } else {
                Some(args.remove(0))
            }
        }
        _ => None,
    }
}

pub(crate) fn named_children(node: TsNode<'_>) -> Vec<TsNode<'_>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor).collect()
}

/// Named children that are not comments.
pub(crate) fn code_children(node: TsNode<'_>) -> Vec<TsNode<'_>> {
    named_children(node)
        .into_iter()
        .filter(|child| child.kind() != "comment")
        .collect()
}

pub(crate) fn first_named(node: TsNode<'_>) -> Option<TsNode<'_>> {
    code_children(node).into_iter().next()
}

pub(crate) fn field_children<'t>(node: TsNode<'t>, field: &str) -> Vec<TsNode<'t>> {
    let mut cursor = node.walk();
    node.children_by_field_name(field, &mut cursor).collect()
}

/// Any direct child, named or not, of the given kind.
pub(crate) fn has_child_kind(node: TsNode<'_>, kind: &str) -> bool {
    let mut cursor = node.walk();
    let found = node.children(&mut cursor).any(|child| child.kind() == kind);
    found
}

fn is_static(node: TsNode<'_>, source: &str) -> bool {
    named_children(node)
        .into_iter()
        .any(|child| child.kind() == "storage_class_specifier" && node_text(child, source) == "static")
}

/// Comment body without the `//` or `/* */` markers.
fn comment_text(raw: &str) -> String {
    if let Some(line) = raw.strip_prefix("//") {
        return line.trim().to_string();
    }
    let inner = raw
        .strip_prefix("/*")
        .and_then(|s| s.strip_suffix("*/"))
        .unwrap_or(raw);
    let lines: Vec<&str> = inner
        .lines()
        .map(|line| {
            let line = line.trim();
            line.strip_prefix('*').map(str::trim_start).unwrap_or(line)
        })
        .collect();
    let start = lines.iter().position(|l| !l.is_empty()).unwrap_or(lines.len());
    let end = lines.iter().rposition(|l| !l.is_empty()).map(|i| i + 1).unwrap_or(start);
    lines[start..end.max(start)].join("\n")
}
