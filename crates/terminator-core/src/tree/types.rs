// C++ type names as seen by the converter, and their Python counterparts

use std::fmt;

use serde::Serialize;

use super::{Literal, Node};

/// Words dropped when normalising a type spelling.
const QUALIFIERS: &[&str] = &[
    "const",
    "volatile",
    "static",
    "inline",
    "constexpr",
    "mutable",
    "extern",
    "struct",
    "class",
    "typename",
    "virtual",
];

const INTEGRAL: &[&str] = &[
    "size_t", "ssize_t", "ptrdiff_t", "intptr_t", "uintptr_t", "int8_t", "int16_t", "int32_t",
    "int64_t", "uint8_t", "uint16_t", "uint32_t", "uint64_t",
];

const INTEGRAL_WORDS: &[&str] = &["int", "long", "short", "unsigned", "signed"];

const SEQUENCES: &[&str] = &["vector", "list", "deque", "array"];
const MAPPINGS: &[&str] = &["map", "unordered_map", "multimap"];
const SETS: &[&str] = &["set", "unordered_set", "multiset"];

/// A normalised C++ type spelling (`int`, `std::string`, `std::vector<int>`).
///
/// Cv-qualifiers and references are dropped; pointers are kept as a
/// trailing `*` so they can be recognised and left untranslated.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct TypeName(String);

impl TypeName {
    pub fn new(spelling: impl AsRef<str>) -> Self {
        let mut spaced = String::new();
        for ch in spelling.as_ref().chars() {
            match ch {
                '<' | '>' | ',' | '*' => {
                    spaced.push(' ');
                    spaced.push(ch);
                    spaced.push(' ');
                }
                '&' => spaced.push(' '),
                _ => spaced.push(ch),
            }
        }

        let mut joined = spaced
            .split_whitespace()
            .filter(|word| !QUALIFIERS.contains(word))
            .collect::<Vec<_>>()
            .join(" ");
        for punct in ['<', '>', ',', '*'] {
            joined = joined
                .replace(&format!(" {punct}"), &punct.to_string())
                .replace(&format!("{punct} "), &punct.to_string());
        }
        TypeName(joined)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_pointer(&self) -> bool {
        self.0.ends_with('*')
    }

    /// The spelling without a leading `std::`.
    fn unqualified(&self) -> &str {
        self.0.strip_prefix("std::").unwrap_or(&self.0)
    }

    pub fn is_integral(&self) -> bool {
        let name = self.unqualified();
        if INTEGRAL.contains(&name) {
            return true;
        }
        !name.is_empty() && name.split(' ').all(|word| INTEGRAL_WORDS.contains(&word))
    }

    /// Integral types that cannot hold a negative value.
    pub fn is_unsigned(&self) -> bool {
        let name = self.unqualified();
        name == "size_t"
            || (name.starts_with("uint") && name.ends_with("_t"))
            || name.split(' ').any(|word| word == "unsigned")
    }

    pub fn is_floating(&self) -> bool {
        matches!(self.0.as_str(), "float" | "double" | "long double")
    }

    pub fn is_bool(&self) -> bool {
        self.0 == "bool"
    }

    pub fn is_numeric(&self) -> bool {
        self.is_integral() || self.is_floating()
    }

    /// `char` family and string classes all become Python `str`.
    pub fn is_textual(&self) -> bool {
        let name = self.unqualified();
        matches!(name, "string" | "wstring" | "string_view")
            || name.split(' ').any(|word| word.starts_with("char") || word == "wchar_t")
    }

    pub fn is_void(&self) -> bool {
        self.0 == "void"
    }

    /// Split `std::vector<int>` into (`vector`, [`int`]).
    pub fn template_parts(&self) -> Option<(&str, Vec<TypeName>)> {
        let open = self.0.find('<')?;
        let inner = self.0[open + 1..].strip_suffix('>')?;
        let head = &self.0[..open];
        let head = head.strip_prefix("std::").unwrap_or(head);

        let mut args = Vec::new();
        let mut depth = 0usize;
        let mut start = 0usize;
        for (idx, ch) in inner.char_indices() {
            match ch {
                '<' => depth += 1,
                '>' => depth = depth.saturating_sub(1),
                ',' if depth == 0 => {
                    args.push(TypeName::new(&inner[start..idx]));
                    start = idx + 1;
                }
                _ => {}
            }
        }
        args.push(TypeName::new(&inner[start..]));
        Some((head, args))
    }

    /// A plain user-defined type name such as `Point`.
    pub fn is_user_type(&self) -> bool {
        let mut chars = self.0.chars();
        let starts_ok = chars
            .next()
            .map(|c| c.is_ascii_alphabetic() || c == '_')
            .unwrap_or(false);
        starts_ok
            && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
            && !self.is_integral()
            && !self.is_floating()
            && !self.is_bool()
            && !self.is_textual()
            && !self.is_void()
            && self.0 != "auto"
    }

    /// Python type hint for this type, when one exists.
    pub fn python_hint(&self) -> Option<String> {
        if self.is_pointer() {
            return None;
        }
        if self.is_void() {
            return Some("None".to_string());
        }
        if self.is_bool() {
            return Some("bool".to_string());
        }
        if self.is_floating() {
            return Some("float".to_string());
        }
        if self.is_integral() {
            return Some("int".to_string());
        }
        if self.is_textual() {
            return Some("str".to_string());
        }
        if let Some((head, args)) = self.template_parts() {
            if SEQUENCES.contains(&head) {
                // std::array<int, 3> carries a size argument that has no hint
                return Some(match args.first().and_then(|a| a.python_hint()) {
                    Some(element) => format!("list[{element}]"),
                    None => "list".to_string(),
                });
            }
            let container = if MAPPINGS.contains(&head) {
                "dict"
            } else if SETS.contains(&head) {
                "set"
            } else if head == "pair" || head == "tuple" {
                "tuple"
            } else {
                return None;
            };
            let hints: Option<Vec<String>> = args.iter().map(|a| a.python_hint()).collect();
            return Some(match hints {
                Some(h) if !h.is_empty() => format!("{container}[{}]", h.join(", ")),
                _ => container.to_string(),
            });
        }
        if self.is_user_type() {
            return Some(self.0.clone());
        }
        None
    }

    /// The value a declaration without an initializer starts with.
    pub fn default_value(&self) -> Node {
        if self.is_pointer() {
            return Node::literal(Literal::Null);
        }
        if self.is_bool() {
            return Node::literal(Literal::Bool(false)).with_type(self.clone());
        }
        if self.is_floating() {
            return Node::literal(Literal::Float(0.0)).with_type(self.clone());
        }
        if self.is_integral() {
            return Node::int(0).with_type(self.clone());
        }
        if self.is_textual() {
            return Node::str("").with_type(self.clone());
        }
        if let Some((head, _)) = self.template_parts() {
            if SEQUENCES.contains(&head) {
                return Node::list_empty().with_type(self.clone());
            }
            if MAPPINGS.contains(&head) {
                return Node::nullary_call("dict").with_type(self.clone());
            }
            if SETS.contains(&head) {
                return Node::nullary_call("set").with_type(self.clone());
            }
        }
        if self.is_user_type() {
            return Node::nullary_call(&self.0).with_type(self.clone());
        }
        Node::literal(Literal::Null)
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for TypeName {
    fn from(spelling: &str) -> Self {
        TypeName::new(spelling)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalisation() {
        assert_eq!(TypeName::new("const std::string&").as_str(), "std::string");
        assert_eq!(TypeName::new("std::vector< int >").as_str(), "std::vector<int>");
        assert_eq!(TypeName::new("unsigned   int").as_str(), "unsigned int");
        assert_eq!(TypeName::new("const char *").as_str(), "char*");
    }

    #[test]
    fn test_classification() {
        assert!(TypeName::new("unsigned long").is_integral());
        assert!(TypeName::new("std::size_t").is_integral());
        assert!(TypeName::new("double").is_floating());
        assert!(!TypeName::new("double").is_integral());
        assert!(TypeName::new("std::string").is_textual());
        assert!(TypeName::new("Point").is_user_type());
        assert!(!TypeName::new("auto").is_user_type());
        assert!(TypeName::new("std::size_t").is_unsigned());
        assert!(TypeName::new("uint32_t").is_unsigned());
        assert!(TypeName::new("unsigned long long").is_unsigned());
        assert!(!TypeName::new("long").is_unsigned());
        assert!(!TypeName::new("int64_t").is_unsigned());
    }

    #[test]
    fn test_python_hints() {
        assert_eq!(TypeName::new("int").python_hint().as_deref(), Some("int"));
        assert_eq!(TypeName::new("void").python_hint().as_deref(), Some("None"));
        assert_eq!(
            TypeName::new("std::vector<std::string>").python_hint().as_deref(),
            Some("list[str]")
        );
        assert_eq!(
            TypeName::new("std::map<std::string, int>").python_hint().as_deref(),
            Some("dict[str, int]")
        );
        assert_eq!(TypeName::new("std::array<int, 3>").python_hint().as_deref(), Some("list[int]"));
        assert_eq!(TypeName::new("int*").python_hint(), None);
        assert_eq!(TypeName::new("auto").python_hint(), None);
    }

    #[test]
    fn test_default_values() {
        assert_eq!(TypeName::new("int").default_value(), Node::int(0).with_type(TypeName::new("int")));
        assert!(matches!(
            TypeName::new("Point").default_value().kind(),
            crate::tree::NodeKind::Call { .. }
        ));
    }
}
