// Operators, literals and function flavours carried by tree nodes

use serde::Serialize;

/// Binary operators.
///
/// The set covers the C++ operators the converter understands plus the
/// Python-only operators that rules introduce (`FloorDiv`, `TrueDiv`, `Pow`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    FloorDiv,
    /// `/` that is known to produce a float, whatever the operand types
    TrueDiv,
    Mod,
    Pow,
    Shl,
    Shr,
    BitAnd,
    BitOr,
    BitXor,
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
    And,
    Or,
}

impl BinOp {
    /// Map a C++ operator token to a binary operator.
    pub fn from_cpp(token: &str) -> Option<BinOp> {
        let op = match token {
            "+" => BinOp::Add,
            "-" => BinOp::Sub,
            "*" => BinOp::Mul,
            "/" => BinOp::Div,
            "%" => BinOp::Mod,
            "<<" => BinOp::Shl,
            ">>" => BinOp::Shr,
            "&" | "bitand" => BinOp::BitAnd,
            "|" | "bitor" => BinOp::BitOr,
            "^" | "xor" => BinOp::BitXor,
            "<" => BinOp::Lt,
            "<=" => BinOp::Le,
            ">" => BinOp::Gt,
            ">=" => BinOp::Ge,
            "==" => BinOp::Eq,
            "!=" | "not_eq" => BinOp::Ne,
            "&&" | "and" => BinOp::And,
            "||" | "or" => BinOp::Or,
            _ => return None,
        };
        Some(op)
    }

    /// Python spelling of the operator.
    pub fn python(&self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::FloorDiv => "//",
            BinOp::TrueDiv => "/",
            BinOp::Mod => "%",
            BinOp::Pow => "**",
            BinOp::Shl => "<<",
            BinOp::Shr => ">>",
            BinOp::BitAnd => "&",
            BinOp::BitOr => "|",
            BinOp::BitXor => "^",
            BinOp::Lt => "<",
            BinOp::Le => "<=",
            BinOp::Gt => ">",
            BinOp::Ge => ">=",
            BinOp::Eq => "==",
            BinOp::Ne => "!=",
            BinOp::And => "and",
            BinOp::Or => "or",
        }
    }

    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge | BinOp::Eq | BinOp::Ne
        )
    }

    pub fn is_logical(&self) -> bool {
        matches!(self, BinOp::And | BinOp::Or)
    }

    pub fn is_arithmetic(&self) -> bool {
        matches!(
            self,
            BinOp::Add
                | BinOp::Sub
                | BinOp::Mul
                | BinOp::Div
                | BinOp::FloorDiv
                | BinOp::TrueDiv
                | BinOp::Mod
                | BinOp::Pow
        )
    }
}

/// Unary operators, including the four increment/decrement forms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum UnOp {
    Neg,
    Plus,
    Not,
    BitNot,
    PreInc,
    PreDec,
    PostInc,
    PostDec,
}

impl UnOp {
    pub fn from_cpp(token: &str) -> Option<UnOp> {
        let op = match token {
            "-" => UnOp::Neg,
            "+" => UnOp::Plus,
            "!" | "not" => UnOp::Not,
            "~" | "compl" => UnOp::BitNot,
            _ => return None,
        };
        Some(op)
    }

    /// Build an increment/decrement operator from its token and position.
    pub fn update(token: &str, prefix: bool) -> Option<UnOp> {
        match (token, prefix) {
            ("++", true) => Some(UnOp::PreInc),
            ("++", false) => Some(UnOp::PostInc),
            ("--", true) => Some(UnOp::PreDec),
            ("--", false) => Some(UnOp::PostDec),
            _ => None,
        }
    }

    pub fn is_update(&self) -> bool {
        matches!(self, UnOp::PreInc | UnOp::PreDec | UnOp::PostInc | UnOp::PostDec)
    }

    /// +1 for increments, -1 for decrements, 0 otherwise.
    pub fn delta(&self) -> i64 {
        match self {
            UnOp::PreInc | UnOp::PostInc => 1,
            UnOp::PreDec | UnOp::PostDec => -1,
            _ => 0,
        }
    }
}

/// Assignment operators (`=` and the compound forms).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum AssignOp {
    Assign,
    Add,
    Sub,
    Mul,
    Div,
    /// Python-only `//=`
    FloorDiv,
    Mod,
    Shl,
    Shr,
    BitAnd,
    BitOr,
    BitXor,
}

impl AssignOp {
    pub fn from_cpp(token: &str) -> Option<AssignOp> {
        let op = match token {
            "=" => AssignOp::Assign,
            "+=" => AssignOp::Add,
            "-=" => AssignOp::Sub,
            "*=" => AssignOp::Mul,
            "/=" => AssignOp::Div,
            "%=" => AssignOp::Mod,
            "<<=" => AssignOp::Shl,
            ">>=" => AssignOp::Shr,
            "&=" | "and_eq" => AssignOp::BitAnd,
            "|=" | "or_eq" => AssignOp::BitOr,
            "^=" | "xor_eq" => AssignOp::BitXor,
            _ => return None,
        };
        Some(op)
    }

    pub fn python(&self) -> &'static str {
        match self {
            AssignOp::Assign => "=",
            AssignOp::Add => "+=",
            AssignOp::Sub => "-=",
            AssignOp::Mul => "*=",
            AssignOp::Div => "/=",
            AssignOp::FloorDiv => "//=",
            AssignOp::Mod => "%=",
            AssignOp::Shl => "<<=",
            AssignOp::Shr => ">>=",
            AssignOp::BitAnd => "&=",
            AssignOp::BitOr => "|=",
            AssignOp::BitXor => "^=",
        }
    }

    /// The binary operator a compound assignment applies.
    pub fn binary(&self) -> Option<BinOp> {
        match self {
            AssignOp::Assign => None,
            AssignOp::Add => Some(BinOp::Add),
            AssignOp::Sub => Some(BinOp::Sub),
            AssignOp::Mul => Some(BinOp::Mul),
            AssignOp::Div => Some(BinOp::Div),
            AssignOp::FloorDiv => Some(BinOp::FloorDiv),
            AssignOp::Mod => Some(BinOp::Mod),
            AssignOp::Shl => Some(BinOp::Shl),
            AssignOp::Shr => Some(BinOp::Shr),
            AssignOp::BitAnd => Some(BinOp::BitAnd),
            AssignOp::BitOr => Some(BinOp::BitOr),
            AssignOp::BitXor => Some(BinOp::BitXor),
        }
    }
}

/// Literal values.
///
/// String and character literals keep the raw escape text found between the
/// quotes; C++ and Python share the common escape sequences.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Literal {
    Int(i64),
    /// Integer too large for `i64`, as decimal digits
    BigInt(String),
    Float(f64),
    Str(String),
    Char(String),
    Bool(bool),
    Null,
}

impl Literal {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Literal::Int(n) => Some(*n),
            _ => None,
        }
    }
}

/// How a function definition binds to its surroundings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum FnKind {
    Free,
    Method,
    StaticMethod,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binop_from_cpp() {
        assert_eq!(BinOp::from_cpp("&&"), Some(BinOp::And));
        assert_eq!(BinOp::from_cpp("<<"), Some(BinOp::Shl));
        assert_eq!(BinOp::from_cpp("<=>"), None);
        assert_eq!(BinOp::And.python(), "and");
    }

    #[test]
    fn test_update_ops() {
        assert_eq!(UnOp::update("++", false), Some(UnOp::PostInc));
        assert_eq!(UnOp::update("--", true), Some(UnOp::PreDec));
        assert_eq!(UnOp::PostDec.delta(), -1);
        assert_eq!(UnOp::Neg.delta(), 0);
    }

    #[test]
    fn test_compound_assignment_binary() {
        assert_eq!(AssignOp::from_cpp("+="), Some(AssignOp::Add));
        assert_eq!(AssignOp::Add.binary(), Some(BinOp::Add));
        assert_eq!(AssignOp::Assign.binary(), None);
    }
}
