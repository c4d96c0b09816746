/*!
# C++ Frontend

Thin adapter over tree-sitter and the `tree-sitter-cpp` grammar. Produces a
read-only concrete syntax tree, or a located [`ParseError`] when the grammar
had to recover from malformed input.
*/

use tracing::debug;
use tree_sitter::{Node as TsNode, Parser, Tree};

use crate::error::{ParseError, TranslateError};
use crate::tree::Span;

/// Longest excerpt of offending source quoted in a parse error.
const EXCERPT_LEN: usize = 40;

pub struct CppFrontend {
    parser: Parser,
}

/// A parsed file: the native tree plus the text it was parsed from.
pub struct ParsedSource<'s> {
    tree: Tree,
    source: &'s str,
}

impl CppFrontend {
    pub fn new() -> Result<Self, TranslateError> {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_cpp::LANGUAGE.into())
            .map_err(|e| TranslateError::Frontend(e.to_string()))?;
        Ok(Self { parser })
    }

    pub fn parse<'s>(&mut self, source: &'s str) -> Result<ParsedSource<'s>, ParseError> {
        let tree = self.parser.parse(source, None).ok_or_else(|| ParseError {
            message: "parser produced no tree".to_string(),
            line: 0,
            column: 0,
        })?;

        let root = tree.root_node();
        if root.has_error() {
            if let Some(bad) = first_error(root) {
                return Err(describe_error(bad, source));
            }
        }

        debug!("Parsed {} bytes into {} top-level nodes", source.len(), root.named_child_count());
        Ok(ParsedSource { tree, source })
    }
}

impl<'s> ParsedSource<'s> {
    pub fn root(&self) -> TsNode<'_> {
        self.tree.root_node()
    }

    pub fn source(&self) -> &'s str {
        self.source
    }
}

/// Source text covered by a native node.
pub fn node_text<'s>(node: TsNode<'_>, source: &'s str) -> &'s str {
    source.get(node.byte_range()).unwrap_or("")
}

pub fn node_span(node: TsNode<'_>) -> Span {
    let start = node.start_position();
    Span {
        start_byte: node.start_byte(),
        end_byte: node.end_byte(),
        line: start.row + 1,
        column: start.column + 1,
    }
}

/// First ERROR or MISSING node in document order.
fn first_error(node: TsNode<'_>) -> Option<TsNode<'_>> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    if !node.has_error() {
        return None;
    }
    let mut cursor = node.walk();
    let children: Vec<TsNode<'_>> = node.children(&mut cursor).collect();
    children.into_iter().find_map(first_error)
}

fn describe_error(node: TsNode<'_>, source: &str) -> ParseError {
    let span = node_span(node);
    let message = if node.is_missing() {
        format!("missing `{}`", node.kind())
    } else {
        let text = node_text(node, source);
        let first_line = text.lines().next().unwrap_or("").trim();
        let excerpt: String = first_line.chars().take(EXCERPT_LEN).collect();
        if excerpt.is_empty() {
            "syntax error".to_string()
        } else {
            format!("syntax error near `{excerpt}`")
        }
    };
    ParseError {
        message,
        line: span.line,
        column: span.column,
    }
}
