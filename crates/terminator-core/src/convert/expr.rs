//! Expression lowering and the light type inference that goes with it.

use tree_sitter::Node as TsNode;

use super::{code_children, element_type, has_child_kind, Converter};
use crate::error::StructuralError;
use crate::frontend::node_span;
use crate::tree::{AssignOp, BinOp, Literal, Node, NodeKind, TypeName, UnOp};

/// `<cmath>` functions whose C++ result is floating point.
const FLOATING_RESULTS: &[&str] = &[
    "sqrt", "pow", "sin", "cos", "tan", "asin", "acos", "atan", "atan2", "exp", "log", "log10",
    "log2", "floor", "ceil", "fabs", "fmod", "round", "trunc", "hypot", "cbrt",
];

const CASTS: &[&str] = &["static_cast", "const_cast"];

impl Converter<'_> {
    pub(crate) fn convert_expr(&mut self, node: TsNode<'_>) -> Result<Node, StructuralError> {
        let converted = match node.kind() {
            "identifier" | "field_identifier" => {
                let name = self.text(node);
                self.resolve_name(name)?
            }
            "qualified_identifier" => {
                let name = self.text(node).trim_start_matches("::");
                if name.contains('<') {
                    return Ok(self.unsupported(node, "template arguments"));
                }
                Node::identifier(name.split_whitespace().collect::<String>())
            }
            "this" => Node::identifier("self"),
            "number_literal" => match parse_number(self.text(node)) {
                Some((value, ty)) => Node::literal(value).with_type(TypeName::new(ty)),
                None => return Ok(self.unsupported(node, "numeric literal out of range")),
            },
            "string_literal" => {
                Node::literal(Literal::Str(quoted(self.text(node), '"').to_string()))
                    .with_type(TypeName::new("std::string"))
            }
            "char_literal" => {
                Node::literal(Literal::Char(quoted(self.text(node), '\'').to_string()))
                    .with_type(TypeName::new("char"))
            }
            "concatenated_string" => {
                let parts = code_children(node);
                if parts.iter().any(|p| p.kind() != "string_literal") {
                    return Ok(self.unsupported(node, "macro in string concatenation"));
                }
                let joined: String = parts.iter().map(|p| quoted(self.text(*p), '"')).collect();
                Node::literal(Literal::Str(joined)).with_type(TypeName::new("std::string"))
            }
            "raw_string_literal" => return Ok(self.unsupported(node, "raw string literal")),
            "true" => Node::literal(Literal::Bool(true)).with_type(TypeName::new("bool")),
            "false" => Node::literal(Literal::Bool(false)).with_type(TypeName::new("bool")),
            "null" | "nullptr" => Node::literal(Literal::Null),
            "parenthesized_expression" => match code_children(node).into_iter().next() {
                Some(inner) => return self.convert_expr(inner),
                None => return Ok(self.unsupported(node, "empty parentheses")),
            },
            "binary_expression" => self.binary(node)?,
            "unary_expression" => self.unary(node)?,
            "update_expression" => self.update(node)?,
            "assignment_expression" => self.assignment(node)?,
            "call_expression" => self.call(node)?,
            "field_expression" => self.field(node)?,
            "subscript_expression" => self.subscript(node)?,
            "conditional_expression" => {
                let (Some(cond), Some(then), Some(orelse)) = (
                    node.child_by_field_name("condition"),
                    node.child_by_field_name("consequence"),
                    node.child_by_field_name("alternative"),
                ) else {
                    return Ok(self.unsupported(node, "malformed conditional expression"));
                };
                let cond = self.convert_expr(cond)?;
                let then = self.convert_expr(then)?;
                let orelse = self.convert_expr(orelse)?;
                let ty = then.ty().or(orelse.ty()).cloned();
                Node::new(NodeKind::Ternary {
                    cond: Box::new(cond),
                    then: Box::new(then),
                    orelse: Box::new(orelse),
                })?
                .with_type_opt(ty)
            }
            "cast_expression" => {
                let (Some(target), Some(value)) =
                    (node.child_by_field_name("type"), node.child_by_field_name("value"))
                else {
                    return Ok(self.unsupported(node, "malformed cast"));
                };
                let target = TypeName::new(self.text(target));
                self.cast(node, target, value)?
            }
            "initializer_list" => {
                let mut items = Vec::new();
                for item in code_children(node) {
                    items.push(self.convert_expr(item)?);
                }
                Node::new(NodeKind::List { items })?
            }
            "comma_expression" => return Ok(self.unsupported(node, "comma operator")),
            "pointer_expression" => return Ok(self.unsupported(node, "pointer")),
            "lambda_expression" => return Ok(self.unsupported(node, "lambda")),
            "new_expression" | "delete_expression" => {
                return Ok(self.unsupported(node, "dynamic allocation"))
            }
            "sizeof_expression" | "alignof_expression" => return Ok(self.unsupported(node, "sizeof")),
            "template_function" => return Ok(self.unsupported(node, "template function")),
            "user_defined_literal" => return Ok(self.unsupported(node, "user-defined literal")),
            other => return Ok(self.unsupported(node, format!("`{other}` expression"))),
        };
        Ok(converted.with_span(Some(node_span(node))))
    }

    /// Resolve an unqualified name: local, then member of the enclosing
    /// class (as `self.name` or `Class.name`), then global.
    fn resolve_name(&self, name: &str) -> Result<Node, StructuralError> {
        if self.scopes.is_local(name) {
            let ty = self.scopes.lookup(name).flatten().cloned();
            return Ok(Node::identifier(name).with_type_opt(ty));
        }
        if let Some(class) = &self.class {
            let is_instance = class.fields.contains_key(name) || class.methods.contains_key(name);
            if is_instance && !self.in_static {
                let ty = class.member_type(name).cloned();
                return Ok(Node::member(Node::identifier("self"), name)?.with_type_opt(ty));
            }
            if class.statics.contains_key(name) || class.static_methods.contains_key(name) {
                let ty = class.static_member_type(name).cloned();
                return Ok(Node::member(Node::identifier(class.name.as_str()), name)?.with_type_opt(ty));
            }
        }
        let ty = self.scopes.lookup(name).flatten().cloned();
        Ok(Node::identifier(name).with_type_opt(ty))
    }

    fn binary(&mut self, node: TsNode<'_>) -> Result<Node, StructuralError> {
        let (Some(left), Some(op), Some(right)) = (
            node.child_by_field_name("left"),
            node.child_by_field_name("operator"),
            node.child_by_field_name("right"),
        ) else {
            return Ok(self.unsupported(node, "malformed binary expression"));
        };
        let Some(op) = BinOp::from_cpp(op.kind()) else {
            return Ok(self.unsupported(node, format!("`{}` operator", op.kind())));
        };
        let left = self.convert_expr(left)?;
        let right = self.convert_expr(right)?;
        let ty = binary_type(op, left.ty(), right.ty());
        Ok(Node::binary(op, left, right)?.with_type_opt(ty))
    }

    fn unary(&mut self, node: TsNode<'_>) -> Result<Node, StructuralError> {
        let (Some(op), Some(argument)) =
            (node.child_by_field_name("operator"), node.child_by_field_name("argument"))
        else {
            return Ok(self.unsupported(node, "malformed unary expression"));
        };
        let Some(op) = UnOp::from_cpp(op.kind()) else {
            return Ok(self.unsupported(node, format!("`{}` operator", op.kind())));
        };
        let operand = self.convert_expr(argument)?;
        let ty = match op {
            UnOp::Not => Some(TypeName::new("bool")),
            _ => operand.ty().cloned(),
        };
        Ok(Node::new(NodeKind::UnaryOp {
            op,
            operand: Box::new(operand),
        })?
        .with_type_opt(ty))
    }

    fn update(&mut self, node: TsNode<'_>) -> Result<Node, StructuralError> {
        let (Some(op), Some(argument)) =
            (node.child_by_field_name("operator"), node.child_by_field_name("argument"))
        else {
            return Ok(self.unsupported(node, "malformed increment"));
        };
        let prefix = op.start_byte() < argument.start_byte();
        let Some(op) = UnOp::update(op.kind(), prefix) else {
            return Ok(self.unsupported(node, "malformed increment"));
        };
        let operand = self.convert_expr(argument)?;
        if !is_assignable(&operand) {
            return Ok(self.unsupported(node, "increment of a non-variable"));
        }
        let ty = operand.ty().cloned();
        Ok(Node::new(NodeKind::UnaryOp {
            op,
            operand: Box::new(operand),
        })?
        .with_type_opt(ty))
    }

    fn assignment(&mut self, node: TsNode<'_>) -> Result<Node, StructuralError> {
        let (Some(left), Some(op), Some(right)) = (
            node.child_by_field_name("left"),
            node.child_by_field_name("operator"),
            node.child_by_field_name("right"),
        ) else {
            return Ok(self.unsupported(node, "malformed assignment"));
        };
        let Some(op) = AssignOp::from_cpp(op.kind()) else {
            return Ok(self.unsupported(node, format!("`{}` assignment", op.kind())));
        };
        let target = self.convert_expr(left)?;
        if !is_assignable(&target) && !matches!(target.kind(), NodeKind::Opaque { .. }) {
            return Ok(self.unsupported(node, "assignment target"));
        }
        let value = self.convert_expr(right)?;
        let ty = target.ty().cloned();
        Ok(Node::new(NodeKind::Assign {
            target: Box::new(target),
            op,
            value: Box::new(value),
        })?
        .with_type_opt(ty))
    }

    fn call(&mut self, node: TsNode<'_>) -> Result<Node, StructuralError> {
        let Some(function) = node.child_by_field_name("function") else {
            return Ok(self.unsupported(node, "malformed call"));
        };
        let arg_nodes = node
            .child_by_field_name("arguments")
            .map(code_children)
            .unwrap_or_default();

        if function.kind() == "template_function" {
            let name = function
                .child_by_field_name("name")
                .map(|n| self.text(n))
                .unwrap_or("");
            let target = function
                .child_by_field_name("arguments")
                .and_then(|args| code_children(args).into_iter().next());
            return match (CASTS.contains(&name), target, arg_nodes.as_slice()) {
                (true, Some(target), [value]) => {
                    let target = TypeName::new(self.text(target));
                    self.cast(node, target, *value)
                }
                (true, _, _) => Ok(self.unsupported(node, "malformed cast")),
                (false, _, _) => Ok(self.unsupported(node, "template function call")),
            };
        }
        if function.kind() == "qualified_identifier" && self.text(function).contains('<') {
            return Ok(self.unsupported(node, "template function call"));
        }

        let callee = self.convert_expr(function)?;
        let mut args = Vec::with_capacity(arg_nodes.len());
        for arg in arg_nodes {
            args.push(self.convert_expr(arg)?);
        }
        let ty = self.call_type(&callee);
        Ok(Node::call(callee, args)?.with_type_opt(ty))
    }

    /// Result type of a call, when the callee is known.
    fn call_type(&self, callee: &Node) -> Option<TypeName> {
        match callee.kind() {
            NodeKind::Identifier { name } => {
                if let Some(ty) = self.functions.get(name) {
                    return ty.clone();
                }
                if self.classes.contains_key(name) {
                    return Some(TypeName::new(name));
                }
                let bare = name.strip_prefix("std::").unwrap_or(name);
                FLOATING_RESULTS
                    .contains(&bare)
                    .then(|| TypeName::new("double"))
            }
            NodeKind::Member { object, field } => self.member_type(object, field),
            _ => None,
        }
    }

    /// Type of `object.field`, for fields and method results alike.
    fn member_type(&self, object: &Node, field: &str) -> Option<TypeName> {
        if object.as_identifier() == Some("self") {
            return self.class.as_ref().and_then(|c| c.member_type(field)).cloned();
        }
        if let Some(class) = object.as_identifier().and_then(|name| self.classes.get(name)) {
            return class.static_member_type(field).cloned();
        }
        let object_ty = object.ty()?;
        if let Some(class) = self.classes.get(object_ty.as_str()) {
            return class.member_type(field).cloned();
        }
        match field {
            "size" | "length" | "find" | "count" => Some(TypeName::new("std::size_t")),
            "empty" => Some(TypeName::new("bool")),
            "front" | "back" | "at" => element_type(object_ty),
            "substr" => Some(object_ty.clone()),
            _ => None,
        }
    }

    fn field(&mut self, node: TsNode<'_>) -> Result<Node, StructuralError> {
        let (Some(argument), Some(field)) =
            (node.child_by_field_name("argument"), node.child_by_field_name("field"))
        else {
            return Ok(self.unsupported(node, "malformed member access"));
        };
        if has_child_kind(node, "->") && argument.kind() != "this" {
            return Ok(self.unsupported(node, "pointer member access"));
        }
        if field.kind() != "field_identifier" {
            return Ok(self.unsupported(node, "qualified member access"));
        }
        let object = self.convert_expr(argument)?;
        let name = self.text(field);
        let ty = self.member_type(&object, name);
        Ok(Node::member(object, name)?.with_type_opt(ty))
    }

    fn subscript(&mut self, node: TsNode<'_>) -> Result<Node, StructuralError> {
        let index = node.child_by_field_name("index").or_else(|| {
            node.child_by_field_name("indices")
                .and_then(|list| code_children(list).into_iter().next())
        });
        let (Some(argument), Some(index)) = (node.child_by_field_name("argument"), index) else {
            return Ok(self.unsupported(node, "malformed subscript"));
        };
        let object = self.convert_expr(argument)?;
        let index = self.convert_expr(index)?;
        let ty = object.ty().and_then(|ty| match ty.template_parts() {
            Some((head, args)) if head.ends_with("map") => args.get(1).cloned(),
            _ => element_type(ty),
        });
        Ok(Node::new(NodeKind::Subscript {
            object: Box::new(object),
            index: Box::new(index),
        })?
        .with_type_opt(ty))
    }

    fn cast(&mut self, node: TsNode<'_>, target: TypeName, value: TsNode<'_>) -> Result<Node, StructuralError> {
        if target.is_pointer() {
            return Ok(self.unsupported(node, "pointer cast"));
        }
        let expr = self.convert_expr(value)?;
        Ok(Node::new(NodeKind::Cast {
            target: target.clone(),
            expr: Box::new(expr),
        })?
        .with_type(target)
        .with_span(Some(node_span(node))))
    }
}

fn is_assignable(node: &Node) -> bool {
    matches!(
        node.kind(),
        NodeKind::Identifier { .. } | NodeKind::Member { .. } | NodeKind::Subscript { .. }
    )
}

/// Result type of a binary operation over operands of known type.
fn binary_type(op: BinOp, left: Option<&TypeName>, right: Option<&TypeName>) -> Option<TypeName> {
    if op.is_comparison() || op.is_logical() {
        return Some(TypeName::new("bool"));
    }
    let (left, right) = (left?, right?);
    let is_string = |ty: &TypeName| ty.is_textual() && ty.as_str().contains("string");
    if op == BinOp::Add && (is_string(left) || is_string(right)) {
        return Some(TypeName::new("std::string"));
    }
    if left.is_integral() && right.is_integral() {
        return Some(left.clone());
    }
    if op.is_arithmetic() && left.is_numeric() && right.is_numeric() {
        return Some(TypeName::new("double"));
    }
    None
}

/// Text between the first and last `quote` (drops encoding prefixes).
fn quoted(raw: &str, quote: char) -> &str {
    let start = raw.find(quote).map(|i| i + quote.len_utf8()).unwrap_or(0);
    let end = raw.rfind(quote).unwrap_or(raw.len());
    raw.get(start..end).unwrap_or("")
}

/// Parse a C++ numeric literal, returning the value and its C++ type.
fn parse_number(raw: &str) -> Option<(Literal, &'static str)> {
    let cleaned = raw.replace('\'', "").to_ascii_lowercase();
    let int_suffix = |c: char| c == 'u' || c == 'l' || c == 'z';

    if let Some(hex) = cleaned.strip_prefix("0x") {
        return parse_integer(hex.trim_end_matches(int_suffix), 16);
    }
    if let Some(bin) = cleaned.strip_prefix("0b") {
        return parse_integer(bin.trim_end_matches(int_suffix), 2);
    }
    if cleaned.contains('.') || cleaned.contains('e') {
        let ty = if cleaned.ends_with('f') { "float" } else { "double" };
        let digits = cleaned.trim_end_matches(|c| c == 'f' || c == 'l');
        return digits.parse::<f64>().ok().map(|v| (Literal::Float(v), ty));
    }
    let digits = cleaned.trim_end_matches(int_suffix);
    match digits.strip_prefix('0') {
        Some(rest) if !rest.is_empty() => parse_integer(rest, 8),
        _ => parse_integer(digits, 10),
    }
}

/// Integers past `i64` keep their decimal digits; Python ints are unbounded.
fn parse_integer(digits: &str, radix: u32) -> Option<(Literal, &'static str)> {
    let value = u128::from_str_radix(digits, radix).ok()?;
    Some(match i64::try_from(value) {
        Ok(small) => (Literal::Int(small), "int"),
        Err(_) => (Literal::BigInt(value.to_string()), "unsigned long long"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_number_forms() {
        assert_eq!(parse_number("42"), Some((Literal::Int(42), "int")));
        assert_eq!(parse_number("0x1F"), Some((Literal::Int(31), "int")));
        assert_eq!(parse_number("017"), Some((Literal::Int(15), "int")));
        assert_eq!(parse_number("0b101"), Some((Literal::Int(5), "int")));
        assert_eq!(parse_number("1'000'000ULL"), Some((Literal::Int(1_000_000), "int")));
        assert_eq!(parse_number("0"), Some((Literal::Int(0), "int")));
        assert_eq!(parse_number("2.5f"), Some((Literal::Float(2.5), "float")));
        assert_eq!(parse_number("1e3"), Some((Literal::Float(1000.0), "double")));
        assert_eq!(
            parse_number("0xFFFFFFFFFFFFFFFFull"),
            Some((Literal::BigInt("18446744073709551615".to_string()), "unsigned long long"))
        );
        assert_eq!(
            parse_number("99999999999999999999"),
            Some((Literal::BigInt("99999999999999999999".to_string()), "unsigned long long"))
        );
    }

    #[test]
    fn test_quoted_strips_prefix() {
        assert_eq!(quoted("\"hi\"", '"'), "hi");
        assert_eq!(quoted("u8\"x\\n\"", '"'), "x\\n");
        assert_eq!(quoted("'a'", '\''), "a");
    }

    #[test]
    fn test_binary_type() {
        let int = TypeName::new("int");
        let double = TypeName::new("double");
        let string = TypeName::new("std::string");
        assert_eq!(binary_type(BinOp::Div, Some(&int), Some(&int)), Some(int.clone()));
        assert_eq!(binary_type(BinOp::Div, Some(&int), Some(&double)), Some(double.clone()));
        assert_eq!(binary_type(BinOp::Add, Some(&string), Some(&string)), Some(string.clone()));
        assert_eq!(binary_type(BinOp::Lt, None, None), Some(TypeName::new("bool")));
        assert_eq!(binary_type(BinOp::Mul, Some(&int), None), None);
    }
}
