use pretty_assertions::assert_eq;

use super::*;
use crate::rewrite::rules::test_support::lower;
use crate::tree::{BinOp, Literal};

fn render(source: &str) -> anyhow::Result<String> {
    Ok(PythonGenerator::default().generate(&lower(source)?))
}

fn name(text: &str) -> Node {
    Node::identifier(text)
}

fn assign(target: &str, value: Node) -> anyhow::Result<Node> {
    Ok(Node::new(NodeKind::Assign {
        target: Box::new(name(target)),
        op: crate::tree::AssignOp::Assign,
        value: Box::new(value),
    })?)
}

fn post_inc(target: &str) -> anyhow::Result<Node> {
    Ok(Node::new(NodeKind::UnaryOp {
        op: UnOp::PostInc,
        operand: Box::new(name(target)),
    })?)
}

fn function(name: &str, body: Vec<Node>) -> anyhow::Result<Node> {
    Ok(Node::new(NodeKind::FunctionDef {
        name: name.to_string(),
        kind: FnKind::Free,
        params: Vec::new(),
        returns: None,
        body: Box::new(Node::block(body)?),
    })?)
}

#[test]
fn test_empty_module_renders_nothing() -> anyhow::Result<()> {
    assert_eq!(render("")?, "");
    assert_eq!(PythonGenerator::default().generate(&Node::module(Vec::new())?), "");
    Ok(())
}

#[test]
fn test_function_with_hints() -> anyhow::Result<()> {
    let output = render("int add(int a, int b) { return a + b; }\nvoid noop() {}\n")?;
    assert_eq!(
        output,
        "def add(a: int, b: int) -> int:\n    return a + b\n\n\ndef noop() -> None:\n    pass\n"
    );
    Ok(())
}

#[test]
fn test_hints_can_be_switched_off() -> anyhow::Result<()> {
    let generator = PythonGenerator::new(GeneratorOptions { type_hints: false });
    let output = generator.generate(&lower("double half(double x) { double h = x / 2; return h; }")?);
    assert_eq!(output, "def half(x):\n    h = x / 2\n    return h\n");
    Ok(())
}

#[test]
fn test_plain_for_becomes_while_with_step_before_continue() -> anyhow::Result<()> {
    let init = Node::new(NodeKind::VarDecl {
        name: "i".to_string(),
        init: Some(Box::new(Node::int(0))),
    })?
    .with_type(TypeName::new("int"));
    let skip = Node::new(NodeKind::If {
        cond: Box::new(Node::binary(BinOp::Eq, name("i"), Node::int(1))?),
        then: Box::new(Node::block(vec![Node::new(NodeKind::Continue)?])?),
        orelse: None,
    })?;
    let work = Node::expr_stmt(Node::call_named("g", vec![name("i")])?)?;
    let for_loop = Node::new(NodeKind::For {
        init: Some(Box::new(init)),
        cond: Some(Box::new(Node::binary(BinOp::Lt, name("i"), Node::int(3))?)),
        step: Some(Box::new(post_inc("i")?)),
        body: Box::new(Node::block(vec![skip, work])?),
    })?;
    let module = Node::module(vec![function("f", vec![for_loop])?])?;

    let expected = "\
def f():
    i: int = 0
    while i < 3:
        if i == 1:
            i += 1
            continue
        g(i)
        i += 1
";
    assert_eq!(PythonGenerator::default().generate(&module), expected);
    Ok(())
}

#[test]
fn test_for_without_header_parts() -> anyhow::Result<()> {
    let for_loop = Node::new(NodeKind::For {
        init: None,
        cond: None,
        step: None,
        body: Box::new(Node::block(vec![Node::new(NodeKind::Break)?])?),
    })?;
    assert_eq!(for_loop.to_python(), "while True:\n    break\n");
    Ok(())
}

#[test]
fn test_do_while_tests_at_the_end() -> anyhow::Result<()> {
    let cond = Node::binary(BinOp::Gt, name("n"), Node::int(0))?;
    let step = Node::expr_stmt(assign("n", Node::binary(BinOp::Sub, name("n"), Node::int(1))?)?)?;
    let do_while = Node::new(NodeKind::DoWhile {
        body: Box::new(Node::block(vec![step])?),
        cond: Box::new(cond),
    })?;
    assert_eq!(
        do_while.to_python(),
        "while True:\n    n = n - 1\n    if not n > 0:\n        break\n"
    );
    Ok(())
}

#[test]
fn test_do_while_negated_condition_is_simplified() -> anyhow::Result<()> {
    let cond = Node::new(NodeKind::UnaryOp {
        op: UnOp::Not,
        operand: Box::new(name("done")),
    })?;
    let do_while = Node::new(NodeKind::DoWhile {
        body: Box::new(Node::block(vec![Node::new(NodeKind::Continue)?])?),
        cond: Box::new(cond),
    })?;
    assert_eq!(
        do_while.to_python(),
        "while True:\n    if done:\n        break\n    continue\n"
    );
    Ok(())
}

#[test]
fn test_class_layout() -> anyhow::Result<()> {
    let source = r#"
class Point {
public:
    Point(int x, int y) : x_(x), y_(y) {}
    int sum() const { return x_ + y_; }
private:
    int x_;
    int y_;
};

int main() { return 0; }
"#;
    let expected = "\
class Point:
    def __init__(self, x: int, y: int):
        self.x_ = x
        self.y_ = y

    def sum(self) -> int:
        return self.x_ + self.y_


def main() -> int:
    return 0
";
    assert_eq!(render(source)?, expected);
    Ok(())
}

#[test]
fn test_static_members() -> anyhow::Result<()> {
    let source = "class Counter {\npublic:\n    static int count;\n    static void bump() { count++; }\n};\n";
    let expected = "\
class Counter:
    count: int = 0

    @staticmethod
    def bump() -> None:
        Counter.count += 1
";
    assert_eq!(render(source)?, expected);
    Ok(())
}

#[test]
fn test_empty_class_gets_pass() -> anyhow::Result<()> {
    assert_eq!(render("class Tag {};")?, "class Tag:\n    pass\n");
    Ok(())
}

#[test]
fn test_if_elif_else_chain() -> anyhow::Result<()> {
    let source = r#"
int sign(int x) {
    if (x > 0) {
        return 1;
    } else if (x < 0) {
        return -1;
    } else {
        return 0;
    }
}
"#;
    let expected = "\
def sign(x: int) -> int:
    if x > 0:
        return 1
    elif x < 0:
        return -1
    else:
        return 0
";
    assert_eq!(render(source)?, expected);
    Ok(())
}

#[test]
fn test_range_forms() -> anyhow::Result<()> {
    let body = || Node::block(vec![Node::new(NodeKind::Break)?]);
    let range = |start: i64, stop: Node, step: i64| -> anyhow::Result<Node> {
        Ok(Node::new(NodeKind::ForRange {
            var: "i".to_string(),
            start: Box::new(Node::int(start)),
            stop: Box::new(stop),
            step: Box::new(Node::int(step)),
            body: Box::new(body()?),
        })?)
    };
    assert_eq!(range(0, name("n"), 1)?.to_python(), "for i in range(n):\n    break\n");
    assert_eq!(range(2, Node::int(5), 1)?.to_python(), "for i in range(2, 5):\n    break\n");
    assert_eq!(
        range(10, Node::int(0), -2)?.to_python(),
        "for i in range(10, 0, -2):\n    break\n"
    );
    Ok(())
}

#[test]
fn test_opaque_statement_is_a_marked_block() -> anyhow::Result<()> {
    let opaque = Node::opaque("switch (x) {\n\ncase 1: break;\n}", "switch statement");
    let module = Node::module(vec![function("f", vec![opaque])?])?;
    let expected = "\
def f():
    # untranslated C++ (switch statement):
    # switch (x) {
    #
    # case 1: break;
    # }
    pass
";
    assert_eq!(PythonGenerator::default().generate(&module), expected);
    Ok(())
}

#[test]
fn test_top_level_opaque_is_spaced_like_a_definition() -> anyhow::Result<()> {
    let module = Node::module(vec![
        Node::opaque("namespace util {}", "namespace"),
        function("main", vec![Node::new(NodeKind::Return { value: None })?])?,
    ])?;
    let expected = "\
# untranslated C++ (namespace):
# namespace util {}


def main():
    return
";
    assert_eq!(PythonGenerator::default().generate(&module), expected);
    Ok(())
}

#[test]
fn test_entry_guard_and_imports() -> anyhow::Result<()> {
    let module = Node::module(vec![
        Node::new(NodeKind::Import {
            module: "math".to_string(),
        })?,
        function("main", vec![Node::expr_stmt(Node::call_named("print", vec![Node::str("hi")])?)?])?,
        Node::new(NodeKind::EntryGuard {
            entry: "main".to_string(),
        })?,
    ])?;
    let expected = "\
import math


def main():
    print(\"hi\")


if __name__ == \"__main__\":
    main()
";
    assert_eq!(PythonGenerator::default().generate(&module), expected);
    Ok(())
}

#[test]
fn test_elided_directives_render_nothing() -> anyhow::Result<()> {
    let elided = |text: &str| {
        Node::new(NodeKind::Elided {
            text: text.to_string(),
        })
    };
    let module = Node::module(vec![
        elided("#include <iostream>")?,
        elided("using namespace std")?,
        function("main", vec![Node::new(NodeKind::Return { value: None })?])?,
    ])?;
    assert_eq!(PythonGenerator::default().generate(&module), "def main():\n    return\n");
    Ok(())
}

#[test]
fn test_repeated_imports_render_once() -> anyhow::Result<()> {
    let module = Node::module(vec![
        Node::import("math")?,
        Node::import("math")?,
        Node::expr_stmt(Node::call(
            Node::member(name("math"), "sqrt")?,
            vec![Node::literal(Literal::Float(2.0))],
        )?)?,
    ])?;
    assert_eq!(
        PythonGenerator::default().generate(&module),
        "import math\nmath.sqrt(2.0)\n"
    );
    Ok(())
}

#[test]
fn test_math_use_without_import_gets_one() -> anyhow::Result<()> {
    let root = Node::call(Node::member(name("math"), "sqrt")?, vec![name("x")])?;
    let module = Node::module(vec![function(
        "root",
        vec![Node::new(NodeKind::Return {
            value: Some(Box::new(root)),
        })?],
    )?])?;
    assert_eq!(
        PythonGenerator::default().generate(&module),
        "import math\n\n\ndef root():\n    return math.sqrt(x)\n"
    );
    Ok(())
}

#[test]
fn test_surviving_includes_render_as_comments() -> anyhow::Result<()> {
    let module = Node::module(vec![
        Node::new(NodeKind::Include {
            path: "vector".to_string(),
            system: true,
        })?,
        Node::new(NodeKind::Include {
            path: "util.h".to_string(),
            system: false,
        })?,
        Node::new(NodeKind::Using {
            text: "using namespace std".to_string(),
        })?,
    ])?;
    assert_eq!(
        PythonGenerator::default().generate(&module),
        "# #include <vector>\n# #include \"util.h\"\n# using namespace std;\n"
    );
    Ok(())
}

#[test]
fn test_comments_stay_attached_to_definitions() -> anyhow::Result<()> {
    let module = Node::module(vec![
        Node::new(NodeKind::VarDecl {
            name: "limit".to_string(),
            init: Some(Box::new(Node::int(3))),
        })?,
        Node::comment("Entry point"),
        function("main", vec![Node::new(NodeKind::Return { value: None })?])?,
    ])?;
    assert_eq!(
        PythonGenerator::default().generate(&module),
        "limit = 3\n\n\n# Entry point\ndef main():\n    return\n"
    );
    Ok(())
}

#[test]
fn test_declaration_without_value_and_keyword_names() -> anyhow::Result<()> {
    let decl = Node::new(NodeKind::VarDecl {
        name: "lambda".to_string(),
        init: None,
    })?;
    assert_eq!(decl.to_python(), "lambda_ = None\n");

    let flag = Node::new(NodeKind::VarDecl {
        name: "ok".to_string(),
        init: Some(Box::new(Node::literal(Literal::Bool(true)))),
    })?
    .with_type(TypeName::new("bool"));
    assert_eq!(flag.to_python(), "ok: bool = True\n");
    Ok(())
}

#[test]
fn test_user_type_hints_are_quoted() -> anyhow::Result<()> {
    let output = render("class Node {};\nint depth(Node n) { return 0; }\n")?;
    assert_eq!(
        output,
        "class Node:\n    pass\n\n\ndef depth(n: \"Node\") -> int:\n    return 0\n"
    );
    Ok(())
}
