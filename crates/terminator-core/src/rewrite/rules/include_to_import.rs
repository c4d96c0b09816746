/*!
# Include To Import

`#include <cmath>` and `#include <math.h>` become `import math`; every other
include and every `using namespace` directive is elided. The rule works on
the directives themselves, so it never competes with module-level rules.
Repeated imports are collapsed by the generator, which also adds
`import math` to a module that calls into `math` without including it.
*/

use tracing::debug;

use crate::rewrite::rule::Rule;
use crate::rewrite::{RewriteContext, RewriteResult};
use crate::tree::{Node, NodeKind};

const MATH_HEADERS: &[&str] = &["cmath", "math.h"];

#[derive(Debug, Default)]
pub struct IncludeToImport;

impl IncludeToImport {
    pub const NAME: &'static str = "IncludeToImport";
    pub const DESCRIPTION: &'static str =
        "Turns math includes into `import math` and drops other includes and using directives";
}

fn is_using_namespace(node: &Node) -> bool {
    match node.kind() {
        NodeKind::Using { text } => text.split_whitespace().nth(1) == Some("namespace"),
        _ => false,
    }
}

impl Rule for IncludeToImport {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn description(&self) -> &'static str {
        Self::DESCRIPTION
    }

    fn matches(&self, node: &Node, _context: &RewriteContext) -> bool {
        matches!(node.kind(), NodeKind::Include { .. }) || is_using_namespace(node)
    }

    fn transform(&self, node: &Node, _context: &RewriteContext) -> RewriteResult<Node> {
        let text = match node.kind() {
            NodeKind::Include { path, .. } if MATH_HEADERS.contains(&path.as_str()) => {
                return Ok(Node::import("math")?.with_span(node.span()));
            }
            NodeKind::Include { path, system: true } => format!("#include <{path}>"),
            NodeKind::Include { path, system: false } => format!("#include \"{path}\""),
            NodeKind::Using { text } => text.clone(),
            _ => return Ok(node.clone()),
        };
        debug!("Dropping {}", text);
        Ok(Node::new(NodeKind::Elided { text })?.with_span(node.span()))
    }
}
