/*!
# Translator Configuration

Every field has a default, so an empty TOML file (or none at all) yields the
stock behaviour: all rules, one rewrite pass, type hints on.

```toml
rules = ["ForLoopToRange", "CoutToPrint"]

[rewrite]
fixed_point = true
max_passes = 8
strict = false

[codegen]
type_hints = true

[batch]
source_extensions = ["cpp", "h"]
output_extension = "py"
jobs = 4
```
*/

use std::path::Path;

use serde::Deserialize;

use crate::error::ConfigError;

/// Default bound on fixed-point rewriting passes.
pub const DEFAULT_MAX_PASSES: usize = 8;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TranslatorConfig {
    /// Rule allow-list; `None` means every registered rule.
    pub rules: Option<Vec<String>>,
    pub rewrite: RewriteConfig,
    pub codegen: CodegenConfig,
    pub batch: BatchConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RewriteConfig {
    /// Repeat passes until nothing changes (bounded by `max_passes`).
    pub fixed_point: bool,
    pub max_passes: usize,
    /// Turn rule failures and non-convergence into errors.
    pub strict: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CodegenConfig {
    pub type_hints: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BatchConfig {
    pub source_extensions: Vec<String>,
    pub output_extension: String,
    /// Worker threads; `None` lets rayon decide.
    pub jobs: Option<usize>,
}

impl Default for RewriteConfig {
    fn default() -> Self {
        Self {
            fixed_point: false,
            max_passes: DEFAULT_MAX_PASSES,
            strict: false,
        }
    }
}

impl Default for CodegenConfig {
    fn default() -> Self {
        Self { type_hints: true }
    }
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            source_extensions: ["cpp", "cc", "cxx", "h", "hpp"]
                .iter()
                .map(|ext| ext.to_string())
                .collect(),
            output_extension: "py".to_string(),
            jobs: None,
        }
    }
}

impl TranslatorConfig {
    /// Load and validate a TOML config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: TranslatorConfig = toml::from_str(&text).map_err(|source| ConfigError::Toml {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rewrite.max_passes == 0 {
            return Err(ConfigError::Invalid("rewrite.max_passes must be at least 1".into()));
        }
        if self.batch.jobs == Some(0) {
            return Err(ConfigError::Invalid("batch.jobs must be at least 1".into()));
        }
        if self.batch.output_extension.is_empty() {
            return Err(ConfigError::Invalid("batch.output_extension must not be empty".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_empty_file_gives_defaults() -> anyhow::Result<()> {
        let config: TranslatorConfig = toml::from_str("")?;
        assert_eq!(config, TranslatorConfig::default());
        assert_eq!(config.rewrite.max_passes, DEFAULT_MAX_PASSES);
        assert!(config.codegen.type_hints);
        assert!(config.batch.source_extensions.contains(&"hpp".to_string()));
        Ok(())
    }

    #[test]
    fn test_partial_sections() -> anyhow::Result<()> {
        let config: TranslatorConfig = toml::from_str(
            r#"
rules = ["CoutToPrint"]

[rewrite]
fixed_point = true
"#,
        )?;
        assert_eq!(config.rules, Some(vec!["CoutToPrint".to_string()]));
        assert!(config.rewrite.fixed_point);
        assert_eq!(config.rewrite.max_passes, DEFAULT_MAX_PASSES);
        assert_eq!(config.batch.output_extension, "py");
        Ok(())
    }

    #[test]
    fn test_load_rejects_zero_passes() -> anyhow::Result<()> {
        let mut file = tempfile::NamedTempFile::new()?;
        writeln!(file, "[rewrite]\nmax_passes = 0")?;
        match TranslatorConfig::load(file.path()) {
            Err(ConfigError::Invalid(msg)) => assert!(msg.contains("max_passes")),
            other => panic!("Expected Invalid, got {:?}", other),
        }
        Ok(())
    }

    #[test]
    fn test_load_reports_bad_toml() -> anyhow::Result<()> {
        let mut file = tempfile::NamedTempFile::new()?;
        writeln!(file, "[rewrite\nstrict = yes")?;
        assert!(matches!(
            TranslatorConfig::load(file.path()),
            Err(ConfigError::Toml { .. })
        ));
        Ok(())
    }

    #[test]
    fn test_unknown_keys_rejected() {
        let result: Result<TranslatorConfig, _> = toml::from_str("[codegen]\ncolour = true");
        assert!(result.is_err());
    }
}
