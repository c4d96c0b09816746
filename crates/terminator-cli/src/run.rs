/*!
# Driver

Runs one invocation of the translator: picks the sources, translates them
through the batch runner, then writes, previews or diffs each result. A file
that fails is reported in the summary and never stops the others.
*/

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use terminator_core::rewrite::registered;
use terminator_core::{BatchRunner, RuleStats, Translation, Translator};
use tracing::{debug, info, warn};

use crate::cli::Options;
use crate::diff::unified_diff;

/// What happened across all inputs.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub files: usize,
    pub written: Vec<PathBuf>,
    pub failures: Vec<(PathBuf, String)>,
    pub diagnostics: usize,
    /// Rule counters over every translated file
    pub rule_stats: BTreeMap<String, RuleStats>,
}

impl RunSummary {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Print the rule table.
pub fn list_rules(out: &mut dyn Write) -> Result<()> {
    for info in registered() {
        writeln!(out, "{:<18} {}", info.name, info.description)?;
    }
    Ok(())
}

pub fn run(options: &Options, out: &mut dyn Write) -> Result<RunSummary> {
    if options.list_rules {
        list_rules(out)?;
        return Ok(RunSummary::default());
    }

    let input = options.input.as_deref().context("No input given")?;
    if !input.exists() {
        bail!("Input not found: {}", input.display());
    }

    let config = options.translator_config()?;
    let translator = Translator::from_config(&config)?;
    let runner = BatchRunner::new(&translator, &config.batch);

    let files = runner
        .discover(input)
        .with_context(|| format!("Failed to scan {}", input.display()))?;
    if files.is_empty() {
        warn!("No C++ sources found under {}", input.display());
    }
    debug!("Translating {} files with rules {:?}", files.len(), translator.rules().names());

    let report = runner.run(&files);
    let mut summary = RunSummary {
        files: files.len(),
        rule_stats: report.rule_stats(),
        ..RunSummary::default()
    };
    let multiple = files.len() > 1;

    for outcome in &report.files {
        let path = outcome.path.as_path();
        let translation = match &outcome.result {
            Ok(translation) => translation,
            Err(e) => {
                summary.failures.push((path.to_path_buf(), e.to_string()));
                continue;
            }
        };
        summary.diagnostics += translation.diagnostics.len();
        for diagnostic in &translation.diagnostics {
            warn!("{}: {}", path.display(), diagnostic);
        }

        if options.emit_tree {
            writeln!(out, "{}", serde_json::to_string_pretty(&translation.tree)?)?;
        } else if options.show_diff {
            if let Err(e) = show_diff(path, input, translation, out) {
                summary.failures.push((path.to_path_buf(), format!("{e:#}")));
            }
        } else if options.is_preview() {
            if multiple {
                writeln!(out, "# ==> {} <==", path.display())?;
            }
            out.write_all(translation.output.as_bytes())?;
        } else if let Some(output) = &options.output {
            let target = target_path(&runner, path, input, output);
            match write_output(&target, translation) {
                Ok(()) => summary.written.push(target),
                Err(e) => summary.failures.push((path.to_path_buf(), format!("{e:#}"))),
            }
        }
    }

    for (rule, stats) in &summary.rule_stats {
        debug!(
            "{}: {} matches, {} rewrites ({:.0}%), {} failures",
            rule,
            stats.applications,
            stats.rewrites,
            stats.success_rate() * 100.0,
            stats.failures
        );
    }
    info!(
        "{} files, {} failed ({:.0}% translated), {} diagnostics",
        summary.files,
        summary.failures.len(),
        report.success_rate() * 100.0,
        summary.diagnostics
    );
    Ok(summary)
}

/// Destination for one translated file. A single input with `-o` writes
/// exactly there unless `-o` names an existing directory.
fn target_path(runner: &BatchRunner<'_>, path: &Path, input: &Path, output: &Path) -> PathBuf {
    if input.is_file() && !output.is_dir() {
        output.to_path_buf()
    } else {
        runner.output_path(path, input, output)
    }
}

fn write_output(target: &Path, translation: &Translation) -> Result<()> {
    if let Some(parent) = target.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
    }
    fs::write(target, &translation.output)
        .with_context(|| format!("Failed to write {}", target.display()))?;
    info!("Wrote {}", target.display());
    Ok(())
}

fn show_diff(path: &Path, input: &Path, translation: &Translation, out: &mut dyn Write) -> Result<()> {
    let original = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let name = display_name(path, input);
    let from = format!("a/{}", name.display());
    let to = format!("b/{}", name.with_extension("py").display());
    out.write_all(unified_diff(&original, &translation.output, &from, &to).as_bytes())?;
    Ok(())
}

/// Path shown in diff headers: relative to a directory input, else the file name.
fn display_name(path: &Path, input: &Path) -> PathBuf {
    path.strip_prefix(input)
        .ok()
        .filter(|r| !r.as_os_str().is_empty())
        .or_else(|| path.file_name().map(Path::new))
        .unwrap_or(path)
        .to_path_buf()
}
