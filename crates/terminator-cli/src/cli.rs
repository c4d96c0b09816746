//! Command-line arguments.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Arg, ArgAction, ArgMatches, Command};
use terminator_core::TranslatorConfig;

/// Everything the driver was asked to do.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Options {
    pub input: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub dry_run: bool,
    pub show_diff: bool,
    pub rules: Option<Vec<String>>,
    pub list_rules: bool,
    pub fixed_point: bool,
    pub max_passes: Option<usize>,
    pub strict: bool,
    pub no_type_hints: bool,
    pub jobs: Option<usize>,
    pub config: Option<PathBuf>,
    pub emit_tree: bool,
    pub verbose: bool,
}

pub fn build_cli() -> Command {
    Command::new("terminator")
        .version(terminator_core::VERSION)
        .about("Translate C++ source into Python by rewriting syntax trees")
        .arg(
            Arg::new("input")
                .value_name("INPUT")
                .help("C++ file or directory to translate")
                .value_parser(clap::value_parser!(PathBuf))
                .required_unless_present("list-rules")
                .index(1),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("PATH")
                .help("Output file, or output directory for a directory input; prints to stdout when omitted")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("dry-run")
                .long("dry-run")
                .help("Print the translation instead of writing files")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("show-diff")
                .long("show-diff")
                .help("Print a unified diff between source and translation (implies --dry-run)")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("rules")
                .long("rules")
                .value_name("RULE")
                .help("Apply only these rules (comma separated or repeated)")
                .value_delimiter(',')
                .num_args(1..)
                .action(ArgAction::Append),
        )
        .arg(
            Arg::new("list-rules")
                .long("list-rules")
                .help("List the available rules and exit")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("fixed-point")
                .long("fixed-point")
                .help("Repeat rewriting passes until nothing changes")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("max-passes")
                .long("max-passes")
                .value_name("N")
                .help("Upper bound on fixed-point passes")
                .value_parser(clap::value_parser!(usize)),
        )
        .arg(
            Arg::new("strict")
                .long("strict")
                .help("Fail a file on rule failures or non-convergence")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("no-type-hints")
                .long("no-type-hints")
                .help("Omit Python type hints")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("jobs")
                .short('j')
                .long("jobs")
                .value_name("N")
                .help("Number of files translated in parallel")
                .value_parser(clap::value_parser!(usize)),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .value_name("FILE")
                .help("TOML configuration file; command-line flags take precedence")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("emit-tree")
                .long("emit-tree")
                .help("Print the rewritten tree as JSON instead of Python")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Debug logging")
                .action(ArgAction::SetTrue),
        )
}

impl Options {
    pub fn from_matches(matches: &ArgMatches) -> Self {
        Self {
            input: matches.get_one::<PathBuf>("input").cloned(),
            output: matches.get_one::<PathBuf>("output").cloned(),
            dry_run: matches.get_flag("dry-run"),
            show_diff: matches.get_flag("show-diff"),
            rules: matches
                .get_many::<String>("rules")
                .map(|names| names.map(|n| n.trim().to_string()).filter(|n| !n.is_empty()).collect()),
            list_rules: matches.get_flag("list-rules"),
            fixed_point: matches.get_flag("fixed-point"),
            max_passes: matches.get_one::<usize>("max-passes").copied(),
            strict: matches.get_flag("strict"),
            no_type_hints: matches.get_flag("no-type-hints"),
            jobs: matches.get_one::<usize>("jobs").copied(),
            config: matches.get_one::<PathBuf>("config").cloned(),
            emit_tree: matches.get_flag("emit-tree"),
            verbose: matches.get_flag("verbose"),
        }
    }

    /// Parse an argument list, program name first.
    pub fn parse_from<I, T>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let matches = build_cli().try_get_matches_from(args)?;
        Ok(Self::from_matches(&matches))
    }

    /// Nothing is written to disk.
    pub fn is_preview(&self) -> bool {
        self.dry_run || self.show_diff || self.emit_tree || self.output.is_none()
    }

    /// The config file (or defaults) with command-line overrides applied.
    pub fn translator_config(&self) -> Result<TranslatorConfig> {
        let mut config = match &self.config {
            Some(path) => TranslatorConfig::load(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => TranslatorConfig::default(),
        };
        if let Some(rules) = &self.rules {
            config.rules = Some(rules.clone());
        }
        if self.fixed_point {
            config.rewrite.fixed_point = true;
        }
        if let Some(max) = self.max_passes {
            config.rewrite.max_passes = max;
        }
        if self.strict {
            config.rewrite.strict = true;
        }
        if self.no_type_hints {
            config.codegen.type_hints = false;
        }
        if self.jobs.is_some() {
            config.batch.jobs = self.jobs;
        }
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() -> anyhow::Result<()> {
        let options = Options::parse_from(["terminator", "main.cpp"])?;
        assert_eq!(options.input, Some(PathBuf::from("main.cpp")));
        assert!(options.is_preview());
        assert_eq!(options.translator_config()?, TranslatorConfig::default());
        Ok(())
    }

    #[test]
    fn test_rules_comma_separated_and_repeated() -> anyhow::Result<()> {
        let options = Options::parse_from([
            "terminator",
            "src",
            "--rules",
            "CoutToPrint,MathCalls",
            "--rules",
            "ForLoopToRange",
        ])?;
        assert_eq!(
            options.rules,
            Some(vec![
                "CoutToPrint".to_string(),
                "MathCalls".to_string(),
                "ForLoopToRange".to_string()
            ])
        );
        Ok(())
    }

    #[test]
    fn test_flags_override_config() -> anyhow::Result<()> {
        let options = Options::parse_from([
            "terminator",
            "src",
            "-o",
            "out",
            "--fixed-point",
            "--max-passes",
            "3",
            "--no-type-hints",
            "-j",
            "2",
        ])?;
        assert!(!options.is_preview());
        let config = options.translator_config()?;
        assert!(config.rewrite.fixed_point);
        assert_eq!(config.rewrite.max_passes, 3);
        assert!(!config.codegen.type_hints);
        assert_eq!(config.batch.jobs, Some(2));
        Ok(())
    }

    #[test]
    fn test_input_required_unless_listing() -> anyhow::Result<()> {
        assert!(Options::parse_from(["terminator"]).is_err());
        let options = Options::parse_from(["terminator", "--list-rules"])?;
        assert!(options.list_rules);
        assert_eq!(options.input, None);
        Ok(())
    }

    #[test]
    fn test_zero_passes_rejected() -> anyhow::Result<()> {
        let options = Options::parse_from(["terminator", "a.cpp", "--max-passes", "0"])?;
        assert!(options.translator_config().is_err());
        Ok(())
    }
}
