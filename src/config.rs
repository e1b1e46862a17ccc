//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.divipola.toml` files.

use crate::cli::OutputFormat;
use crate::report::DEFAULT_EXPORT_PATH;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Name of the configuration file looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = ".divipola.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,

    /// Text export settings.
    #[serde(default)]
    pub export: ExportConfig,

    /// Name cleaning settings.
    #[serde(default)]
    pub cleaning: CleaningConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Census source file.
    #[serde(default = "default_input")]
    pub input: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            input: default_input(),
        }
    }
}

fn default_input() -> String {
    "datosDivipola.csv".to_string()
}

/// Report rendering settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Output format used when `--format` is not given.
    #[serde(default)]
    pub format: OutputFormat,

    /// Indent JSON output.
    #[serde(default = "default_true")]
    pub pretty_json: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::default(),
            pretty_json: true,
        }
    }
}

fn default_true() -> bool {
    true
}

/// Flat text export settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Always write the text export, even without `--export`.
    #[serde(default)]
    pub enabled: bool,

    /// Export file path.
    #[serde(default = "default_export_path")]
    pub path: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            path: default_export_path(),
        }
    }
}

fn default_export_path() -> String {
    DEFAULT_EXPORT_PATH.to_string()
}

/// Extra name repairs, applied after the built-in table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CleaningConfig {
    /// Ordered `[from, to]` pairs.
    #[serde(default)]
    pub replacements: Vec<(String, String)>,
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE_NAME);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings.
    /// This method only overrides config when CLI provides explicit values.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref input) = args.input {
            self.general.input = input.display().to_string();
        }

        if let Some(format) = args.format {
            self.report.format = format;
        }

        if args.compact {
            self.report.pretty_json = false;
        }

        // `--export` alone enables the default path, `--export FILE` also sets it
        if let Some(ref export) = args.export {
            self.export.enabled = true;
            if let Some(path) = export {
                self.export.path = path.display().to_string();
            }
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Args;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.general.input, "datosDivipola.csv");
        assert_eq!(config.report.format, OutputFormat::Json);
        assert!(config.report.pretty_json);
        assert_eq!(config.export.path, "reporte_departamentos.txt");
        assert!(config.cleaning.replacements.is_empty());
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[general]
input = "data/divipola.csv"

[report]
format = "markdown"
pretty_json = false

[export]
enabled = true
path = "out.txt"

[cleaning]
replacements = [["Ã©", "é"], ["Ã³", "ó"]]
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(config.general.input, "data/divipola.csv");
        assert_eq!(config.report.format, OutputFormat::Markdown);
        assert!(!config.report.pretty_json);
        assert!(config.export.enabled);
        assert_eq!(config.export.path, "out.txt");
        assert_eq!(
            config.cleaning.replacements,
            vec![
                ("Ã©".to_string(), "é".to_string()),
                ("Ã³".to_string(), "ó".to_string())
            ]
        );
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: Config = toml::from_str("[export]\nenabled = true\n").unwrap();
        assert_eq!(config.export.path, "reporte_departamentos.txt");
        assert_eq!(config.general.input, "datosDivipola.csv");
    }

    #[test]
    fn test_default_toml_generation() {
        let toml_str = Config::default_toml();
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[report]"));
        assert!(toml_str.contains("[export]"));

        let reparsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(reparsed.general.input, "datosDivipola.csv");
    }

    #[test]
    fn test_load_invalid_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "[general\ninput = ").unwrap();

        assert!(Config::load(&path).is_err());
    }

    #[test]
    fn test_merge_with_args() {
        let args = Args {
            input: Some(PathBuf::from("otro.csv")),
            format: Some(OutputFormat::Markdown),
            compact: true,
            export: Some(Some(PathBuf::from("densidades.txt"))),
            ..Args::default()
        };

        let mut config = Config::default();
        config.merge_with_args(&args);

        assert_eq!(config.general.input, "otro.csv");
        assert_eq!(config.report.format, OutputFormat::Markdown);
        assert!(!config.report.pretty_json);
        assert!(config.export.enabled);
        assert_eq!(config.export.path, "densidades.txt");
    }

    #[test]
    fn test_merge_export_flag_without_path() {
        let args = Args {
            export: Some(None),
            ..Args::default()
        };

        let mut config = Config::default();
        config.export.path = "from_config.txt".to_string();
        config.merge_with_args(&args);

        assert!(config.export.enabled);
        assert_eq!(config.export.path, "from_config.txt");
    }

    #[test]
    fn test_merge_keeps_config_when_args_absent() {
        let mut config: Config = toml::from_str("[report]\nformat = \"markdown\"\n").unwrap();
        config.merge_with_args(&Args::default());

        assert_eq!(config.report.format, OutputFormat::Markdown);
        assert!(config.report.pretty_json);
        assert!(!config.export.enabled);
    }
}
