/*!
# Batch Runner

Translates many files at once. Sources are discovered recursively by
extension and sorted, translated on a rayon pool, and reported back in that
sorted order whatever order the workers finish in. A file that fails to
read, parse or convert is recorded and the rest carry on.
*/

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use tracing::{info, warn};

use crate::config::BatchConfig;
use crate::error::TranslateError;
use crate::rewrite::RuleStats;
use crate::translate::{Translation, Translator};

/// One input file and what became of it.
#[derive(Debug)]
pub struct FileOutcome {
    pub path: PathBuf,
    pub result: Result<Translation, TranslateError>,
}

impl FileOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Results of a batch, in sorted path order.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub files: Vec<FileOutcome>,
}

impl BatchReport {
    pub fn succeeded(&self) -> impl Iterator<Item = (&Path, &Translation)> {
        self.files
            .iter()
            .filter_map(|f| f.result.as_ref().ok().map(|t| (f.path.as_path(), t)))
    }

    pub fn failures(&self) -> impl Iterator<Item = (&Path, &TranslateError)> {
        self.files
            .iter()
            .filter_map(|f| f.result.as_ref().err().map(|e| (f.path.as_path(), e)))
    }

    pub fn failure_count(&self) -> usize {
        self.failures().count()
    }

    pub fn is_success(&self) -> bool {
        self.failure_count() == 0
    }

    pub fn diagnostic_count(&self) -> usize {
        self.succeeded().map(|(_, t)| t.diagnostics.len()).sum()
    }

    /// Per-rule counters summed over every successful file.
    pub fn rule_stats(&self) -> BTreeMap<String, RuleStats> {
        let mut totals: BTreeMap<String, RuleStats> = BTreeMap::new();
        for (_, translation) in self.succeeded() {
            for (rule, stats) in &translation.stats {
                totals.entry(rule.clone()).or_default().merge(stats);
            }
        }
        totals
    }

    pub fn success_rate(&self) -> f64 {
        if self.files.is_empty() {
            0.0
        } else {
            (self.files.len() - self.failure_count()) as f64 / self.files.len() as f64
        }
    }
}

pub struct BatchRunner<'t> {
    translator: &'t Translator,
    source_extensions: Vec<String>,
    output_extension: String,
    jobs: Option<usize>,
}

impl<'t> BatchRunner<'t> {
    pub fn new(translator: &'t Translator, config: &BatchConfig) -> Self {
        Self {
            translator,
            source_extensions: config.source_extensions.clone(),
            output_extension: config.output_extension.clone(),
            jobs: config.jobs,
        }
    }

    /// Whether a path has one of the source extensions (case-insensitive).
    pub fn is_source(&self, path: &Path) -> bool {
        match path.extension() {
            Some(ext) => {
                let ext = ext.to_string_lossy().to_lowercase();
                self.source_extensions.iter().any(|e| e.to_lowercase() == ext)
            }
            None => false,
        }
    }

    /// Every source file under `root`, sorted. A file root is returned as is.
    pub fn discover(&self, root: &Path) -> io::Result<Vec<PathBuf>> {
        if root.is_file() {
            return Ok(vec![root.to_path_buf()]);
        }
        let mut found = Vec::new();
        self.discover_into(root, &mut found)?;
        found.sort();
        Ok(found)
    }

    fn discover_into(&self, dir: &Path, found: &mut Vec<PathBuf>) -> io::Result<()> {
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.is_dir() {
                self.discover_into(&path, found)?;
            } else if self.is_source(&path) {
                found.push(path);
            }
        }
        Ok(())
    }

    /// Where the output for `source` goes: its path relative to
    /// `source_root`, under `output_root`, with the output extension.
    pub fn output_path(&self, source: &Path, source_root: &Path, output_root: &Path) -> PathBuf {
        let relative = source
            .strip_prefix(source_root)
            .ok()
            .filter(|r| !r.as_os_str().is_empty())
            .or_else(|| source.file_name().map(Path::new))
            .unwrap_or(source);
        output_root.join(relative).with_extension(&self.output_extension)
    }

    /// Translate every file, in parallel when there is more than one.
    pub fn run(&self, files: &[PathBuf]) -> BatchReport {
        let translate = |path: &PathBuf| FileOutcome {
            path: path.clone(),
            result: self.translator.convert_file(path),
        };

        let outcomes: Vec<FileOutcome> = if files.len() <= 1 || self.jobs == Some(1) {
            files.iter().map(translate).collect()
        } else {
            rayon::ThreadPoolBuilder::new()
                .num_threads(self.jobs.unwrap_or(0))
                .build_scoped(rayon::ThreadBuilder::run, |pool| {
                    pool.install(|| files.par_iter().map(translate).collect::<Vec<_>>())
                })
                .unwrap_or_else(|e| {
                    warn!("Failed to create thread pool ({}), translating sequentially", e);
                    files.iter().map(translate).collect()
                })
        };

        let report = BatchReport { files: outcomes };
        for (path, err) in report.failures() {
            warn!("Skipping {}: {}", path.display(), err);
        }
        info!(
            "Translated {} of {} files, {} diagnostics",
            report.files.len() - report.failure_count(),
            report.files.len(),
            report.diagnostic_count()
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn runner(translator: &Translator) -> BatchRunner<'_> {
        BatchRunner::new(translator, &BatchConfig::default())
    }

    #[test]
    fn test_discover_sorted_and_filtered() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        fs::create_dir_all(dir.path().join("sub"))?;
        fs::write(dir.path().join("b.cpp"), "")?;
        fs::write(dir.path().join("a.HPP"), "")?;
        fs::write(dir.path().join("notes.txt"), "")?;
        fs::write(dir.path().join("sub").join("c.cc"), "")?;

        let translator = Translator::default();
        let found = runner(&translator).discover(dir.path())?;
        let names: Vec<_> = found
            .iter()
            .map(|p| p.strip_prefix(dir.path()).map(|r| r.to_path_buf()))
            .collect::<Result<_, _>>()?;
        assert_eq!(
            names,
            vec![PathBuf::from("a.HPP"), PathBuf::from("b.cpp"), Path::new("sub").join("c.cc")]
        );
        Ok(())
    }

    #[test]
    fn test_output_path_mirrors_tree() {
        let translator = Translator::default();
        let runner = runner(&translator);
        assert_eq!(
            runner.output_path(Path::new("src/geo/point.cpp"), Path::new("src"), Path::new("out")),
            Path::new("out").join("geo").join("point.py")
        );
        // a single file input maps onto its own name
        assert_eq!(
            runner.output_path(Path::new("src/main.cpp"), Path::new("src/main.cpp"), Path::new("out")),
            Path::new("out").join("main.py")
        );
    }

    #[test]
    fn test_failures_do_not_stop_the_batch() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        fs::write(dir.path().join("a.cpp"), "int one() { return 1; }")?;
        fs::write(dir.path().join("b.cpp"), "int broken( {")?;
        fs::write(dir.path().join("c.cpp"), "int three() { return 3; }")?;

        let translator = Translator::default();
        let config = BatchConfig {
            jobs: Some(2),
            ..BatchConfig::default()
        };
        let runner = BatchRunner::new(&translator, &config);
        let files = runner.discover(dir.path())?;
        let report = runner.run(&files);

        assert_eq!(report.files.len(), 3);
        assert_eq!(report.failure_count(), 1);
        let failed: Vec<_> = report.failures().map(|(p, _)| p.to_path_buf()).collect();
        assert_eq!(failed, vec![dir.path().join("b.cpp")]);
        let ok: Vec<_> = report.succeeded().map(|(p, _)| p.to_path_buf()).collect();
        assert_eq!(ok, vec![dir.path().join("a.cpp"), dir.path().join("c.cpp")]);
        assert!(!report.is_success());
        Ok(())
    }

    #[test]
    fn test_empty_report() {
        let report = BatchReport::default();
        assert!(report.is_success());
        assert_eq!(report.success_rate(), 0.0);
        assert!(report.rule_stats().is_empty());
    }
}
