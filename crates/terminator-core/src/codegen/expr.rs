// Expression rendering with Python operator precedence
//
// Parentheses come from the tree shape, never from the C++ source: an operand
// is wrapped exactly when its own precedence is lower than its slot needs.

use super::{py_name, Hoisted, Writer};
use crate::tree::{BinOp, Literal, Node, NodeKind, UnOp};

pub(super) const TERNARY: u8 = 1;
pub(super) const OR: u8 = 2;
pub(super) const AND: u8 = 3;
pub(super) const NOT: u8 = 4;
pub(super) const COMPARISON: u8 = 5;
pub(super) const BIT_OR: u8 = 6;
pub(super) const BIT_XOR: u8 = 7;
pub(super) const BIT_AND: u8 = 8;
pub(super) const SHIFT: u8 = 9;
pub(super) const ADDITIVE: u8 = 10;
pub(super) const MULTIPLICATIVE: u8 = 11;
pub(super) const UNARY: u8 = 12;
pub(super) const POWER: u8 = 13;
pub(super) const PRIMARY: u8 = 14;
pub(super) const ATOM: u8 = 15;

pub(super) fn precedence(op: BinOp) -> u8 {
    match op {
        BinOp::Or => OR,
        BinOp::And => AND,
        BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge | BinOp::Eq | BinOp::Ne => COMPARISON,
        BinOp::BitOr => BIT_OR,
        BinOp::BitXor => BIT_XOR,
        BinOp::BitAnd => BIT_AND,
        BinOp::Shl | BinOp::Shr => SHIFT,
        BinOp::Add | BinOp::Sub => ADDITIVE,
        BinOp::Mul | BinOp::Div | BinOp::FloorDiv | BinOp::TrueDiv | BinOp::Mod => MULTIPLICATIVE,
        BinOp::Pow => POWER,
    }
}

impl<'a> Writer<'_, 'a> {
    /// Render `node`, parenthesised when it binds looser than `min`.
    pub(super) fn expr(&mut self, node: &'a Node, min: u8) -> String {
        let (text, prec) = self.render(node);
        if prec < min {
            format!("({text})")
        } else {
            text
        }
    }

    fn render(&mut self, node: &'a Node) -> (String, u8) {
        match node.kind() {
            NodeKind::Identifier { name } => (py_name(name), ATOM),
            NodeKind::Literal { value } => literal(value),
            NodeKind::List { items } => {
                let items: Vec<String> = items.iter().map(|item| self.expr(item, TERNARY)).collect();
                (format!("[{}]", items.join(", ")), ATOM)
            }
            NodeKind::Call { callee, args } => {
                let callee = self.expr(callee, PRIMARY);
                let args: Vec<String> = args.iter().map(|arg| self.expr(arg, TERNARY)).collect();
                (format!("{callee}({})", args.join(", ")), PRIMARY)
            }
            NodeKind::Keyword { name, value } => {
                let value = self.expr(value, TERNARY);
                (format!("{}={value}", py_name(name)), ATOM)
            }
            NodeKind::Member { object, field } => {
                // `1.real` would lex as a float
                let numeric = matches!(
                    object.kind(),
                    NodeKind::Literal {
                        value: Literal::Int(_) | Literal::BigInt(_) | Literal::Float(_)
                    }
                );
                let object = if numeric {
                    format!("({})", self.expr(object, 0))
                } else {
                    self.expr(object, PRIMARY)
                };
                (format!("{object}.{}", py_name(field)), PRIMARY)
            }
            NodeKind::Subscript { object, index } => {
                let object = self.expr(object, PRIMARY);
                let index = self.expr(index, TERNARY);
                (format!("{object}[{index}]"), PRIMARY)
            }
            NodeKind::BinaryOp { op, left, right } => self.binary(*op, left, right),
            NodeKind::UnaryOp { op, operand } => self.unary(*op, operand),
            NodeKind::Ternary { cond, then, orelse } => {
                let then = self.expr(then, OR);
                let cond = self.expr(cond, OR);
                let orelse = self.expr(orelse, TERNARY);
                (format!("{then} if {cond} else {orelse}"), TERNARY)
            }
            NodeKind::Assign { target, op, value } => match target.as_identifier() {
                Some(name) => {
                    let value = match op.binary() {
                        None => self.expr(value, 0),
                        Some(binop) => self.binary(binop, target, value).0,
                    };
                    (format!("({} := {value})", py_name(name)), ATOM)
                }
                None => self.hoist_write(node),
            },
            // Casts no rule claimed keep only their operand
            NodeKind::Cast { expr, .. } => self.render(expr),
            NodeKind::Opaque { text, reason } => {
                self.pending.push(Hoisted {
                    reason: reason.clone(),
                    text: text.clone(),
                });
                ("None".to_string(), ATOM)
            }
            // statements never reach expression slots of a validated tree
            _ => ("None".to_string(), ATOM),
        }
    }

    pub(super) fn binary(&mut self, op: BinOp, left: &'a Node, right: &'a Node) -> (String, u8) {
        let prec = precedence(op);
        let (left_min, right_min) = match op {
            BinOp::Pow => (PRIMARY, UNARY),
            // Python would chain `a < b < c`
            _ if op.is_comparison() => (prec + 1, prec + 1),
            _ => (prec, prec + 1),
        };
        let left = self.expr(left, left_min);
        let right = self.expr(right, right_min);
        (format!("{left} {} {right}", op.python()), prec)
    }

    fn unary(&mut self, op: UnOp, operand: &'a Node) -> (String, u8) {
        match op {
            UnOp::Neg => (format!("-{}", self.expr(operand, UNARY)), UNARY),
            UnOp::Plus => (format!("+{}", self.expr(operand, UNARY)), UNARY),
            UnOp::BitNot => (format!("~{}", self.expr(operand, UNARY)), UNARY),
            UnOp::Not => (format!("not {}", self.expr(operand, NOT)), NOT),
            UnOp::PreInc | UnOp::PreDec | UnOp::PostInc | UnOp::PostDec => {
                let Some(name) = operand.as_identifier() else {
                    let (text, _) = self.render(operand);
                    let update = if op.delta() > 0 { "+=" } else { "-=" };
                    return self.hoist_text("increment inside an expression", &format!("{text} {update} 1"));
                };
                let name = py_name(name);
                let (sign, undo) = if op.delta() > 0 { ("+", "-") } else { ("-", "+") };
                match op {
                    UnOp::PreInc | UnOp::PreDec => (format!("({name} := {name} {sign} 1)"), ATOM),
                    _ => (format!("({name} := {name} {sign} 1) {undo} 1"), ADDITIVE),
                }
            }
        }
    }

    /// Writes to attributes or elements have no expression form in Python.
    fn hoist_write(&mut self, node: &'a Node) -> (String, u8) {
        let NodeKind::Assign { target, op, value } = node.kind() else {
            return ("None".to_string(), ATOM);
        };
        let target = self.expr(target, 0);
        let value = self.expr(value, 0);
        self.hoist_text("assignment inside an expression", &format!("{target} {} {value}", op.python()))
    }

    fn hoist_text(&mut self, reason: &str, text: &str) -> (String, u8) {
        self.pending.push(Hoisted {
            reason: reason.to_string(),
            text: text.to_string(),
        });
        ("None".to_string(), ATOM)
    }
}

fn literal(value: &Literal) -> (String, u8) {
    match value {
        Literal::Int(n) => (n.to_string(), if *n < 0 { UNARY } else { ATOM }),
        Literal::BigInt(digits) => (digits.clone(), ATOM),
        Literal::Float(f) if f.is_nan() => ("float(\"nan\")".to_string(), PRIMARY),
        Literal::Float(f) if f.is_infinite() => {
            let sign = if *f < 0.0 { "-" } else { "" };
            (format!("float(\"{sign}inf\")"), PRIMARY)
        }
        Literal::Float(f) => (format!("{f:?}"), if *f < 0.0 { UNARY } else { ATOM }),
        Literal::Str(raw) => (format!("\"{raw}\""), ATOM),
        Literal::Char(raw) => (format!("'{raw}'"), ATOM),
        Literal::Bool(true) => ("True".to_string(), ATOM),
        Literal::Bool(false) => ("False".to_string(), ATOM),
        Literal::Null => ("None".to_string(), ATOM),
    }
}

#[cfg(test)]
mod tests {
    use super::super::ToPython;
    use super::*;
    use crate::tree::AssignOp;

    fn bin(op: BinOp, left: Node, right: Node) -> Node {
        Node::binary(op, left, right).unwrap()
    }

    fn id(name: &str) -> Node {
        Node::identifier(name)
    }

    fn render(node: &Node) -> String {
        node.to_python().trim_end().to_string()
    }

    #[test]
    fn test_precedence_drives_parentheses() {
        let sum = bin(BinOp::Add, id("a"), id("b"));
        assert_eq!(render(&bin(BinOp::Mul, sum.clone(), id("c"))), "(a + b) * c");
        assert_eq!(render(&bin(BinOp::Add, id("c"), sum.clone())), "c + (a + b)");
        assert_eq!(render(&bin(BinOp::Add, sum, id("c"))), "a + b + c");
    }

    #[test]
    fn test_comparisons_never_chain() {
        let less = bin(BinOp::Lt, id("a"), id("b"));
        assert_eq!(render(&bin(BinOp::Lt, less, id("c"))), "(a < b) < c");
    }

    #[test]
    fn test_logical_operators() {
        let not_b = Node::new(NodeKind::UnaryOp {
            op: UnOp::Not,
            operand: Box::new(id("b")),
        })
        .unwrap();
        let or = bin(BinOp::Or, id("a"), not_b);
        assert_eq!(render(&bin(BinOp::And, or, id("c"))), "(a or not b) and c");
    }

    #[test]
    fn test_power_operands() {
        let neg = Node::new(NodeKind::UnaryOp {
            op: UnOp::Neg,
            operand: Box::new(id("x")),
        })
        .unwrap();
        assert_eq!(render(&bin(BinOp::Pow, neg.clone(), Node::int(2))), "(-x) ** 2");
        assert_eq!(render(&bin(BinOp::Pow, Node::int(2), neg)), "2 ** -x");
    }

    #[test]
    fn test_literals() {
        assert_eq!(render(&Node::literal(Literal::Bool(true))), "True");
        assert_eq!(render(&Node::literal(Literal::Null)), "None");
        assert_eq!(
            render(&Node::literal(Literal::BigInt("18446744073709551615".to_string()))),
            "18446744073709551615"
        );
        assert_eq!(render(&Node::literal(Literal::Float(2.0))), "2.0");
        assert_eq!(render(&Node::literal(Literal::Float(0.25))), "0.25");
        assert_eq!(render(&Node::str("a\\tb")), "\"a\\tb\"");
        assert_eq!(render(&Node::literal(Literal::Char("x".into()))), "'x'");
    }

    #[test]
    fn test_names_are_pythonised() {
        assert_eq!(render(&id("Counter::count")), "Counter.count");
        assert_eq!(render(&id("lambda")), "lambda_");
        let member = Node::member(id("self"), "from").unwrap();
        assert_eq!(render(&member), "self.from_");
    }

    #[test]
    fn test_assignment_in_expression_uses_walrus() {
        let assign = Node::new(NodeKind::Assign {
            target: Box::new(id("x")),
            op: AssignOp::Add,
            value: Box::new(Node::int(2)),
        })
        .unwrap();
        let call = Node::call_named("f", vec![assign]).unwrap();
        assert_eq!(render(&call), "f((x := x + 2))");
    }

    #[test]
    fn test_postfix_increment_in_expression() {
        let post = Node::new(NodeKind::UnaryOp {
            op: UnOp::PostInc,
            operand: Box::new(id("i")),
        })
        .unwrap();
        let index = Node::new(NodeKind::Subscript {
            object: Box::new(id("a")),
            index: Box::new(post),
        })
        .unwrap();
        assert_eq!(render(&index), "a[(i := i + 1) - 1]");
    }

    #[test]
    fn test_opaque_expression_hoisted() {
        let call = Node::call_named("f", vec![Node::opaque("[](int x) { return x; }", "lambda")]).unwrap();
        let text = Node::expr_stmt(call).unwrap().to_python();
        assert_eq!(
            text,
            "# untranslated C++ (lambda):\n# [](int x) { return x; }\nf(None)\n"
        );
    }

    #[test]
    fn test_ternary() {
        let ternary = Node::new(NodeKind::Ternary {
            cond: Box::new(bin(BinOp::Gt, id("a"), id("b"))),
            then: Box::new(id("a")),
            orelse: Box::new(id("b")),
        })
        .unwrap();
        assert_eq!(render(&ternary), "a if a > b else b");
    }
}
