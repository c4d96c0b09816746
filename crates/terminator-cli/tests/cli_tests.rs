//! Driver behaviour: listing, previewing, diffing and writing translations.

use std::fs;
use std::path::Path;

use pretty_assertions::assert_eq;
use terminator_cli::{run, Options};

const TWICE: &str = "int twice(int x) { return 2 * x; }\n";

fn options(args: &[&str]) -> anyhow::Result<Options> {
    let mut argv = vec!["terminator"];
    argv.extend_from_slice(args);
    Options::parse_from(argv)
}

fn arg(path: &Path) -> String {
    path.display().to_string()
}

fn run_to_string(options: &Options) -> anyhow::Result<(String, terminator_cli::RunSummary)> {
    let mut out = Vec::new();
    let summary = run(options, &mut out)?;
    Ok((String::from_utf8(out)?, summary))
}

#[test]
fn test_list_rules() -> anyhow::Result<()> {
    let (text, summary) = run_to_string(&options(&["--list-rules"])?)?;
    for name in [
        "IncludeToImport",
        "ForLoopToRange",
        "CoutToPrint",
        "CastToConversion",
        "IntegerDivision",
        "MathCalls",
        "ContainerMethods",
        "MainEntryGuard",
    ] {
        assert!(text.contains(name), "missing {} in {}", name, text);
    }
    assert_eq!(summary.files, 0);
    Ok(())
}

#[test]
fn test_preview_prints_translation() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let source = dir.path().join("twice.cpp");
    fs::write(&source, TWICE)?;

    let (text, summary) = run_to_string(&options(&[&arg(&source)])?)?;
    assert_eq!(text, "def twice(x: int) -> int:\n    return 2 * x\n");
    assert!(summary.is_success());
    assert!(summary.written.is_empty());
    assert!(!dir.path().join("twice.py").exists());
    Ok(())
}

#[test]
fn test_dry_run_writes_nothing() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let source = dir.path().join("twice.cpp");
    let target = dir.path().join("twice.py");
    fs::write(&source, TWICE)?;

    let (text, summary) = run_to_string(&options(&[&arg(&source), "-o", &arg(&target), "--dry-run"])?)?;
    assert!(text.contains("def twice"));
    assert!(summary.written.is_empty());
    assert!(!target.exists());
    Ok(())
}

#[test]
fn test_show_diff_headers() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let source = dir.path().join("twice.cpp");
    fs::write(&source, TWICE)?;

    let (text, _) = run_to_string(&options(&[&arg(&source), "--show-diff"])?)?;
    assert!(text.starts_with("--- a/twice.cpp\n+++ b/twice.py\n"), "{}", text);
    assert!(text.contains("-int twice(int x) { return 2 * x; }\n"));
    assert!(text.contains("+def twice(x: int) -> int:\n"));
    Ok(())
}

#[test]
fn test_single_file_output_path() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let source = dir.path().join("twice.cpp");
    let target = dir.path().join("renamed.py");
    fs::write(&source, TWICE)?;

    let (text, summary) = run_to_string(&options(&[&arg(&source), "-o", &arg(&target)])?)?;
    assert_eq!(text, "");
    assert_eq!(summary.written, vec![target.clone()]);
    assert_eq!(fs::read_to_string(&target)?, "def twice(x: int) -> int:\n    return 2 * x\n");
    Ok(())
}

#[test]
fn test_directory_with_broken_file() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let src = dir.path().join("src");
    let out = dir.path().join("out");
    fs::create_dir_all(src.join("util"))?;
    fs::write(src.join("twice.cpp"), TWICE)?;
    fs::write(src.join("util").join("half.hpp"), "int half(int x) { return x / 2; }\n")?;
    fs::write(src.join("broken.cpp"), "int oops( { return ; \n")?;

    let (_, summary) = run_to_string(&options(&[&arg(&src), "-o", &arg(&out), "--jobs", "2"])?)?;
    assert_eq!(summary.files, 3);
    assert!(!summary.is_success());
    assert_eq!(summary.failures.len(), 1);
    assert_eq!(summary.failures[0].0, src.join("broken.cpp"));

    assert!(out.join("twice.py").exists());
    assert_eq!(
        fs::read_to_string(out.join("util").join("half.py"))?,
        "def half(x: int) -> int:\n    return int(x / 2)\n"
    );
    assert!(!out.join("broken.py").exists());
    assert_eq!(summary.rule_stats["IntegerDivision"].rewrites, 1);
    Ok(())
}

#[test]
fn test_unwritable_target_does_not_stop_the_run() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let src = dir.path().join("src");
    let out = dir.path().join("out");
    fs::create_dir_all(&src)?;
    fs::write(src.join("a.cpp"), TWICE)?;
    fs::write(src.join("b.cpp"), TWICE)?;
    // a directory sits where a.py would be written
    fs::create_dir_all(out.join("a.py"))?;

    let (_, summary) = run_to_string(&options(&[&arg(&src), "-o", &arg(&out)])?)?;
    assert_eq!(summary.files, 2);
    assert!(!summary.is_success());
    assert_eq!(summary.failures.len(), 1);
    assert_eq!(summary.failures[0].0, src.join("a.cpp"));
    assert!(summary.failures[0].1.contains("Failed to write"), "{}", summary.failures[0].1);
    assert_eq!(summary.written, vec![out.join("b.py")]);
    assert_eq!(
        fs::read_to_string(out.join("b.py"))?,
        "def twice(x: int) -> int:\n    return 2 * x\n"
    );
    Ok(())
}

#[test]
fn test_unknown_rule_is_an_error() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let source = dir.path().join("twice.cpp");
    fs::write(&source, TWICE)?;

    let result = run_to_string(&options(&[&arg(&source), "--rules", "NoSuchRule"])?);
    assert!(result.is_err());
    Ok(())
}

#[test]
fn test_missing_input_is_an_error() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let result = run_to_string(&options(&[&arg(&dir.path().join("absent.cpp"))])?);
    assert!(result.is_err());
    Ok(())
}

#[test]
fn test_config_file_with_flag_override() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let source = dir.path().join("half.cpp");
    let config = dir.path().join("terminator.toml");
    fs::write(&source, "int half(int x) { return x / 2; }\n")?;
    fs::write(&config, "rules = [\"CoutToPrint\"]\n\n[codegen]\ntype_hints = false\n")?;

    let (text, _) = run_to_string(&options(&[&arg(&source), "--config", &arg(&config)])?)?;
    assert_eq!(text, "def half(x):\n    return x / 2\n");

    let (text, _) = run_to_string(&options(&[
        &arg(&source),
        "--config",
        &arg(&config),
        "--rules",
        "IntegerDivision",
    ])?)?;
    assert_eq!(text, "def half(x):\n    return int(x / 2)\n");
    Ok(())
}

#[test]
fn test_emit_tree_is_json() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let source = dir.path().join("twice.cpp");
    fs::write(&source, TWICE)?;

    let (text, _) = run_to_string(&options(&[&arg(&source), "--emit-tree"])?)?;
    let value: serde_json::Value = serde_json::from_str(&text)?;
    assert!(value.is_object());
    assert!(text.contains("twice"));
    Ok(())
}
