/*!
# Python Code Generator

Renders a rewritten tree as Python source. Output is a pure function of the
tree and the [`GeneratorOptions`]:

- 4 spaces per nesting level
- two blank lines around top-level definitions, one between class members
  that are definitions, none between simple statements
- a single trailing newline; an empty module renders as an empty string

Constructs the rules left alone are still rendered as valid Python: a plain
`For` becomes its initializer plus a `while` loop, `DoWhile` becomes
`while True:` with a trailing conditional `break`, and `Opaque` nodes become
marked comment blocks.
*/

use crate::config::CodegenConfig;
use crate::tree::{FnKind, Node, NodeKind, NodeWalker, TypeName, UnOp};

mod expr;
#[cfg(test)]
mod tests;

const INDENT: &str = "    ";

/// Comment line that opens the block for an untranslated construct.
pub const UNTRANSLATED_MARKER: &str = "# untranslated C++";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorOptions {
    /// Annotate parameters, returns and declarations with Python type hints
    pub type_hints: bool,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self { type_hints: true }
    }
}

impl From<&CodegenConfig> for GeneratorOptions {
    fn from(config: &CodegenConfig) -> Self {
        Self {
            type_hints: config.type_hints,
        }
    }
}

/// Types that can render themselves as Python source.
pub trait ToPython {
    fn to_python(&self) -> String;
}

impl ToPython for Node {
    /// Expressions render inline; anything else renders as statements with
    /// default options.
    fn to_python(&self) -> String {
        let options = GeneratorOptions::default();
        let mut writer = Writer::new(&options);
        if self.category().is_expression_like() && !matches!(self.kind(), NodeKind::Opaque { .. }) {
            let text = writer.expr(self, 0);
            writer.line(text);
        } else {
            writer.stmt(self);
        }
        writer.finish()
    }
}

#[derive(Debug, Clone, Default)]
pub struct PythonGenerator {
    options: GeneratorOptions,
}

impl PythonGenerator {
    pub fn new(options: GeneratorOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &GeneratorOptions {
        &self.options
    }

    /// Render a `Module`. Any other node renders as a single statement.
    ///
    /// A module that calls into `math` without importing it gets the import
    /// as its first line.
    pub fn generate(&self, module: &Node) -> String {
        let implicit = match module.kind() {
            NodeKind::Module { .. } if needs_import(module, "math") => Node::import("math").ok(),
            _ => None,
        };
        let mut writer = Writer::new(&self.options);
        match module.kind() {
            NodeKind::Module { body } => {
                let items: Vec<&Node> = implicit.iter().chain(body.iter()).collect();
                writer.members(&items, 2, |node| {
                    matches!(
                        node.kind(),
                        NodeKind::FunctionDef { .. }
                            | NodeKind::ClassDef { .. }
                            | NodeKind::EntryGuard { .. }
                            | NodeKind::Opaque { .. }
                    )
                })
            }
            _ => writer.stmt(module),
        }
        writer.finish()
    }
}

/// What a `continue` inside the innermost loop has to run first.
#[derive(Clone, Copy)]
enum LoopTail<'a> {
    Plain,
    /// Step of a lowered `for`
    Step(&'a Node),
    /// Condition of a lowered `do ... while`
    Test(&'a Node),
}

/// A commented-out construct waiting for the next emitted statement.
struct Hoisted {
    reason: String,
    text: String,
}

pub(crate) struct Writer<'o, 'a> {
    options: &'o GeneratorOptions,
    lines: Vec<String>,
    depth: usize,
    pending: Vec<Hoisted>,
    loops: Vec<LoopTail<'a>>,
    /// Modules already imported; repeated imports are skipped
    imported: Vec<&'a str>,
}

impl<'o, 'a> Writer<'o, 'a> {
    fn new(options: &'o GeneratorOptions) -> Self {
        Self {
            options,
            lines: Vec::new(),
            depth: 0,
            pending: Vec::new(),
            loops: Vec::new(),
            imported: Vec::new(),
        }
    }

    fn finish(mut self) -> String {
        self.flush_pending();
        while self.lines.last().map(|l| l.is_empty()).unwrap_or(false) {
            self.lines.pop();
        }
        if self.lines.is_empty() {
            return String::new();
        }
        let mut out = self.lines.join("\n");
        out.push('\n');
        out
    }

    /// Emit one line at the current depth, preceded by any hoisted blocks.
    fn line(&mut self, text: impl AsRef<str>) {
        self.flush_pending();
        self.raw_line(text.as_ref());
    }

    fn raw_line(&mut self, text: &str) {
        let mut line = INDENT.repeat(self.depth);
        line.push_str(text);
        self.lines.push(line);
    }

    fn blank_lines(&mut self, count: usize) {
        for _ in 0..count {
            self.lines.push(String::new());
        }
    }

    fn flush_pending(&mut self) {
        for hoisted in std::mem::take(&mut self.pending) {
            self.comment_block(&hoisted.reason, &hoisted.text);
        }
    }

    fn comment_block(&mut self, reason: &str, text: &str) {
        self.raw_line(&format!("{UNTRANSLATED_MARKER} ({reason}):"));
        for source_line in text.lines() {
            if source_line.trim().is_empty() {
                self.raw_line("#");
            } else {
                self.raw_line(&format!("# {source_line}"));
            }
        }
    }

    fn hint(&self, ty: Option<&TypeName>) -> Option<String> {
        if !self.options.type_hints {
            return None;
        }
        ty.and_then(|t| t.python_hint()).map(quote_forward_refs)
    }

    /// Top-level items or class members, with `gap` blank lines around
    /// definitions. Comments directly above a definition stay attached.
    fn members(&mut self, items: &[&'a Node], gap: usize, is_definition: impl Fn(&Node) -> bool) {
        let items: Vec<&'a Node> = items.iter().copied().filter(|node| !is_elided(node)).collect();
        let is_comment = |node: &Node| matches!(node.kind(), NodeKind::Comment { .. });
        // attached[i]: item i is a comment in a run that leads into a definition
        let mut attached = vec![false; items.len()];
        let mut leads_to_def = false;
        for (idx, item) in items.iter().enumerate().rev() {
            if is_definition(item) {
                leads_to_def = true;
            } else if is_comment(item) {
                attached[idx] = leads_to_def;
            } else {
                leads_to_def = false;
            }
        }

        for (idx, item) in items.iter().enumerate() {
            if idx > 0 {
                let previous = items[idx - 1];
                let opens = (is_definition(item) || attached[idx]) && !attached[idx - 1];
                if opens || is_definition(previous) {
                    self.flush_pending();
                    self.blank_lines(gap);
                }
            }
            self.stmt(item);
        }
    }

    /// Statements of a suite, one level deeper. `pass` is added when nothing
    /// in it would execute.
    fn suite(&mut self, stmts: &'a [Node], tail: Option<LoopTail<'a>>) {
        self.depth += 1;
        for stmt in stmts {
            self.stmt(stmt);
        }
        let falls_through = !stmts
            .iter()
            .rev()
            .find(|stmt| !is_elided(stmt))
            .map(is_jump)
            .unwrap_or(false);
        let tail_runs = match tail {
            Some(LoopTail::Step(step)) if falls_through => {
                self.step(step);
                true
            }
            Some(LoopTail::Test(cond)) if falls_through => {
                self.loop_test(cond);
                true
            }
            _ => false,
        };
        if !tail_runs && !stmts.iter().any(is_executable) {
            self.line("pass");
        }
        self.flush_pending();
        self.depth -= 1;
    }

    fn block(&mut self, block: &'a Node, tail: Option<LoopTail<'a>>) {
        match block.kind() {
            NodeKind::Block { stmts } => self.suite(stmts, tail),
            _ => self.suite(std::slice::from_ref(block), tail),
        }
    }

    fn loop_body(&mut self, body: &'a Node, tail: LoopTail<'a>) {
        self.loops.push(tail);
        self.block(body, Some(tail));
        self.loops.pop();
    }

    fn step(&mut self, step: &'a Node) {
        if let Some(text) = self.simple_statement(step) {
            self.line(text);
        }
    }

    fn loop_test(&mut self, cond: &'a Node) {
        let negated = self.negated(cond);
        self.line(format!("if {negated}:"));
        self.depth += 1;
        self.line("break");
        self.depth -= 1;
    }

    pub(crate) fn stmt(&mut self, node: &'a Node) {
        match node.kind() {
            NodeKind::Module { body } => {
                for item in body {
                    self.stmt(item);
                }
            }
            NodeKind::FunctionDef {
                name,
                kind,
                params,
                returns,
                body,
            } => self.function(name, *kind, params, returns.as_ref(), body),
            NodeKind::ClassDef { name, bases, body } => {
                let name = py_name(name);
                if bases.is_empty() {
                    self.line(format!("class {name}:"));
                } else {
                    let bases: Vec<String> = bases.iter().map(|b| py_name(b)).collect();
                    self.line(format!("class {name}({}):", bases.join(", ")));
                }
                self.depth += 1;
                let members: Vec<&Node> = body.iter().collect();
                self.members(&members, 1, |node| matches!(node.kind(), NodeKind::FunctionDef { .. }));
                if !body.iter().any(is_executable) {
                    self.line("pass");
                }
                self.flush_pending();
                self.depth -= 1;
            }
            NodeKind::EntryGuard { entry } => {
                self.line("if __name__ == \"__main__\":");
                self.depth += 1;
                self.line(format!("{}()", py_name(entry)));
                self.depth -= 1;
            }
            NodeKind::Param { .. } => {
                let text = self.param(node);
                self.line(text);
            }
            NodeKind::Block { stmts } => {
                for stmt in stmts {
                    self.stmt(stmt);
                }
            }
            NodeKind::VarDecl { name, init } => {
                let value = match init {
                    Some(init) => self.expr(init, 0),
                    None => "None".to_string(),
                };
                match self.hint(node.ty()) {
                    Some(hint) => self.line(format!("{}: {hint} = {value}", py_name(name))),
                    None => self.line(format!("{} = {value}", py_name(name))),
                }
            }
            NodeKind::For {
                init,
                cond,
                step,
                body,
            } => {
                if let Some(init) = init {
                    match init.kind() {
                        NodeKind::VarDecl { .. } => self.stmt(init),
                        _ => self.step(init),
                    }
                }
                let cond = match cond {
                    Some(cond) => self.expr(cond, 0),
                    None => "True".to_string(),
                };
                self.line(format!("while {cond}:"));
                let tail = match step {
                    Some(step) => LoopTail::Step(step),
                    None => LoopTail::Plain,
                };
                self.loop_body(body, tail);
            }
            NodeKind::ForRange {
                var,
                start,
                stop,
                step,
                body,
            } => {
                let stop_text = self.expr(stop, 0);
                let range = match (start.as_int(), step.as_int()) {
                    (Some(0), Some(1)) => format!("range({stop_text})"),
                    (_, Some(1)) => format!("range({}, {stop_text})", self.expr(start, 0)),
                    _ => format!(
                        "range({}, {stop_text}, {})",
                        self.expr(start, 0),
                        self.expr(step, 0)
                    ),
                };
                self.line(format!("for {} in {range}:", py_name(var)));
                self.loop_body(body, LoopTail::Plain);
            }
            NodeKind::ForEach { var, iter, body } => {
                let iter = self.expr(iter, 0);
                self.line(format!("for {} in {iter}:", py_name(var)));
                self.loop_body(body, LoopTail::Plain);
            }
            NodeKind::While { cond, body } => {
                let cond = self.expr(cond, 0);
                self.line(format!("while {cond}:"));
                self.loop_body(body, LoopTail::Plain);
            }
            NodeKind::DoWhile { body, cond } => {
                self.line("while True:");
                self.loop_body(body, LoopTail::Test(cond));
            }
            NodeKind::If { .. } => self.if_chain(node, "if"),
            NodeKind::Return { value } => match value {
                Some(value) => {
                    let value = self.expr(value, 0);
                    self.line(format!("return {value}"));
                }
                None => self.line("return"),
            },
            NodeKind::Break => self.line("break"),
            NodeKind::Continue => {
                match self.loops.last().copied() {
                    Some(LoopTail::Step(step)) => self.step(step),
                    Some(LoopTail::Test(cond)) => self.loop_test(cond),
                    _ => {}
                }
                self.line("continue");
            }
            NodeKind::ExprStmt { expr } => {
                if let Some(text) = self.simple_statement(expr) {
                    self.line(text);
                }
            }
            NodeKind::Import { module } => {
                if !self.imported.contains(&module.as_str()) {
                    self.imported.push(module);
                    self.line(format!("import {module}"));
                }
            }
            NodeKind::Elided { .. } => {}
            NodeKind::Include { path, system } => {
                if *system {
                    self.line(format!("# #include <{path}>"));
                } else {
                    self.line(format!("# #include \"{path}\""));
                }
            }
            NodeKind::Using { text } => self.line(format!("# {text};")),
            NodeKind::Comment { text } => {
                self.flush_pending();
                for comment_line in text.lines() {
                    let comment_line = comment_line.trim_end();
                    if comment_line.is_empty() {
                        self.raw_line("#");
                    } else {
                        self.raw_line(&format!("# {comment_line}"));
                    }
                }
                if text.lines().next().is_none() {
                    self.raw_line("#");
                }
            }
            NodeKind::Opaque { text, reason } => {
                self.flush_pending();
                self.comment_block(reason, text);
            }
            // expressions in statement position
            _ => {
                if let Some(text) = self.simple_statement(node) {
                    self.line(text);
                }
            }
        }
    }

    fn function(
        &mut self,
        name: &str,
        kind: FnKind,
        params: &'a [Node],
        returns: Option<&TypeName>,
        body: &'a Node,
    ) {
        let mut rendered = Vec::with_capacity(params.len() + 1);
        if kind == FnKind::Method {
            rendered.push("self".to_string());
        }
        for param in params {
            rendered.push(self.param(param));
        }
        let returns = match self.hint(returns) {
            Some(hint) => format!(" -> {hint}"),
            None => String::new(),
        };
        if kind == FnKind::StaticMethod {
            self.line("@staticmethod");
        }
        self.line(format!("def {}({}){returns}:", py_name(name), rendered.join(", ")));

        // a function body is its own loop context
        let outer = std::mem::take(&mut self.loops);
        self.block(body, None);
        self.loops = outer;
    }

    fn param(&mut self, param: &'a Node) -> String {
        let NodeKind::Param { name, default } = param.kind() else {
            return self.expr(param, 0);
        };
        let name = py_name(name);
        let hint = self.hint(param.ty());
        let default = default.as_ref().map(|d| self.expr(d, 0));
        match (hint, default) {
            (Some(hint), Some(default)) => format!("{name}: {hint} = {default}"),
            (Some(hint), None) => format!("{name}: {hint}"),
            (None, Some(default)) => format!("{name}={default}"),
            (None, None) => name,
        }
    }

    fn if_chain(&mut self, node: &'a Node, keyword: &str) {
        let NodeKind::If { cond, then, orelse } = node.kind() else {
            return;
        };
        let cond = self.expr(cond, 0);
        self.line(format!("{keyword} {cond}:"));
        self.block(then, None);
        match orelse.as_deref() {
            None => {}
            Some(next) if matches!(next.kind(), NodeKind::If { .. }) => self.if_chain(next, "elif"),
            Some(otherwise) => {
                self.line("else:");
                self.block(otherwise, None);
            }
        }
    }

    /// Text of an expression used as a statement. Writes go out as plain or
    /// augmented assignments. `None` when the statement was written as an
    /// untranslated block instead.
    fn simple_statement(&mut self, expr: &'a Node) -> Option<String> {
        match expr.kind() {
            NodeKind::Assign { target, op, value } => {
                if let NodeKind::Opaque { text, reason } = target.kind() {
                    self.flush_pending();
                    self.comment_block(reason, text);
                    return None;
                }
                let target = self.expr(target, 0);
                let value = self.expr(value, 0);
                Some(format!("{target} {} {value}", op.python()))
            }
            NodeKind::UnaryOp { op, operand } if op.is_update() => {
                let target = self.expr(operand, 0);
                let op = if op.delta() > 0 { "+=" } else { "-=" };
                Some(format!("{target} {op} 1"))
            }
            NodeKind::Opaque { text, reason } => {
                self.flush_pending();
                self.comment_block(reason, text);
                None
            }
            _ => Some(self.expr(expr, 0)),
        }
    }

    /// `not <cond>`, simplified when the condition already is a negation.
    fn negated(&mut self, cond: &'a Node) -> String {
        match cond.kind() {
            NodeKind::UnaryOp {
                op: UnOp::Not,
                operand,
            } => self.expr(operand, 0),
            _ => format!("not {}", self.expr(cond, expr::NOT)),
        }
    }
}

fn is_elided(node: &Node) -> bool {
    matches!(node.kind(), NodeKind::Elided { .. })
}

/// Whether the tree refers to `module.<name>` without importing `module`.
fn needs_import(tree: &Node, module: &str) -> bool {
    let refers = |node: &Node| match node.kind() {
        NodeKind::Member { object, .. } => object.as_identifier() == Some(module),
        _ => false,
    };
    let imports = |node: &Node| matches!(node.kind(), NodeKind::Import { module: m } if m == module);
    NodeWalker::contains(tree, &refers) && !NodeWalker::contains(tree, &imports)
}

fn is_jump(node: &Node) -> bool {
    matches!(
        node.kind(),
        NodeKind::Return { .. } | NodeKind::Break | NodeKind::Continue
    )
}

/// Whether a statement renders as anything other than comments.
fn is_executable(node: &Node) -> bool {
    match node.kind() {
        NodeKind::Comment { .. }
        | NodeKind::Opaque { .. }
        | NodeKind::Include { .. }
        | NodeKind::Using { .. }
        | NodeKind::Elided { .. } => false,
        NodeKind::ExprStmt { expr } => match expr.kind() {
            NodeKind::Opaque { .. } => false,
            NodeKind::Assign { target, .. } => !matches!(target.kind(), NodeKind::Opaque { .. }),
            _ => true,
        },
        _ => true,
    }
}

const PYTHON_KEYWORDS: &[&str] = &[
    "False", "None", "True", "and", "as", "assert", "async", "await", "break", "class", "continue",
    "def", "del", "elif", "else", "except", "finally", "for", "from", "global", "if", "import", "in",
    "is", "lambda", "nonlocal", "not", "or", "pass", "raise", "return", "try", "while", "with",
    "yield",
];

const BUILTIN_HINTS: &[&str] = &["int", "float", "str", "bool", "None", "list", "dict", "set", "tuple"];

/// A C++ name as a Python name: `::` becomes `.` and keywords get a
/// trailing underscore.
pub(crate) fn py_name(name: &str) -> String {
    name.split("::")
        .map(|part| {
            if PYTHON_KEYWORDS.contains(&part) {
                format!("{part}_")
            } else {
                part.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(".")
}

/// Hints naming user classes are quoted so they can refer to classes
/// defined later in the module (or to the class being defined).
fn quote_forward_refs(hint: String) -> String {
    let user_named = hint
        .split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|word| !word.is_empty())
        .any(|word| !BUILTIN_HINTS.contains(&word));
    if user_named {
        format!("\"{hint}\"")
    } else {
        hint
    }
}
