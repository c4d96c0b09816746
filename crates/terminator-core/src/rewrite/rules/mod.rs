/*!
# Translation Rules

The idioms the engine knows how to translate. Each rule looks at one node
(and its already rewritten descendants) and returns a replacement.
*/

pub mod cast_to_conversion;
pub mod container_methods;
pub mod cout_to_print;
pub mod for_loop_to_range;
pub mod include_to_import;
pub mod integer_division;
pub mod main_entry_guard;
pub mod math_calls;

pub use cast_to_conversion::CastToConversion;
pub use container_methods::ContainerMethods;
pub use cout_to_print::CoutToPrint;
pub use for_loop_to_range::ForLoopToRange;
pub use include_to_import::IncludeToImport;
pub use integer_division::IntegerDivision;
pub use main_entry_guard::MainEntryGuard;
pub use math_calls::MathCalls;

use crate::tree::{Node, NodeKind};

/// Name of the function a call invokes directly, e.g. `std::sqrt`.
pub(crate) fn callee_name(node: &Node) -> Option<&str> {
    match node.kind() {
        NodeKind::Call { callee, .. } => callee.as_identifier(),
        _ => None,
    }
}

/// Drop a leading `std::`.
pub(crate) fn unqualified(name: &str) -> &str {
    name.strip_prefix("std::").unwrap_or(name)
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::convert::convert;
    use crate::frontend::CppFrontend;
    use crate::tree::{Node, NodeKind};

    /// Convert C++ source into an unrewritten module.
    pub fn lower(source: &str) -> anyhow::Result<Node> {
        let mut frontend = CppFrontend::new()?;
        let parsed = frontend.parse(source)?;
        Ok(convert(&parsed)?.module)
    }

    /// Statements of the first function in a module.
    pub fn first_function_body(module: &Node) -> Vec<Node> {
        let NodeKind::Module { body } = module.kind() else {
            panic!("Expected Module, got {:?}", module);
        };
        for item in body {
            if let NodeKind::FunctionDef { body, .. } = item.kind() {
                if let NodeKind::Block { stmts } = body.kind() {
                    return stmts.clone();
                }
            }
        }
        panic!("No function in {:?}", module);
    }

    /// The expression of an `ExprStmt`, or the initializer of a `VarDecl`.
    pub fn expression_of(stmt: &Node) -> Node {
        match stmt.kind() {
            NodeKind::ExprStmt { expr } => (**expr).clone(),
            NodeKind::VarDecl { init: Some(init), .. } => (**init).clone(),
            other => panic!("Expected ExprStmt or VarDecl, got {:?}", other),
        }
    }
}
