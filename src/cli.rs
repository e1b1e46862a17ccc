//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// divipola-stats - Department statistics from DIVIPOLA census files
///
/// Reads a semicolon-delimited municipality file and reports population
/// density, urban/rural split and area extremes per department.
///
/// Examples:
///   divipola-stats --input datosDivipola.csv
///   divipola-stats --input datosDivipola.csv --department Meta
///   divipola-stats --format markdown --output reporte.md
///   divipola-stats --export
///   divipola-stats --init-config
#[derive(Parser, Debug, Clone, Default)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Census file to read
    ///
    /// Semicolon-delimited, header on the first line. Defaults to the
    /// config file value or datosDivipola.csv.
    #[arg(short, long, value_name = "FILE", env = "DIVIPOLA_INPUT")]
    pub input: Option<PathBuf>,

    /// Report a single department, matched by name (case-insensitive)
    #[arg(short, long, value_name = "NAME")]
    pub department: Option<String>,

    /// Output file path for the report
    ///
    /// If not specified, the report is written to stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output format (json, markdown)
    #[arg(long, value_name = "FORMAT")]
    pub format: Option<OutputFormat>,

    /// Emit single-line JSON
    #[arg(long)]
    pub compact: bool,

    /// Also write the plain-text density export
    ///
    /// Without a value the file goes to the configured path
    /// (reporte_departamentos.txt by default).
    #[arg(long, value_name = "FILE", num_args = 0..=1)]
    pub export: Option<Option<PathBuf>>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .divipola.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (errors only)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .divipola.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the report.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// JSON format (default)
    #[default]
    Json,
    /// Markdown format
    Markdown,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        if self.init_config {
            return Ok(());
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(ref department) = self.department {
            if department.trim().is_empty() {
                return Err("Department name must not be empty".to_string());
            }
        }

        if let Some(ref input) = self.input {
            if input.is_dir() {
                return Err(format!("Input path is a directory: {}", input.display()));
            }
        }

        if self.compact && self.format == Some(OutputFormat::Markdown) {
            return Err("--compact only applies to JSON output".to_string());
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn make_args() -> Args {
        Args {
            input: Some(PathBuf::from("datosDivipola.csv")),
            department: None,
            output: None,
            format: None,
            compact: false,
            export: None,
            config: None,
            verbose: false,
            quiet: false,
            init_config: false,
        }
    }

    #[test]
    fn test_validation_ok() {
        assert!(make_args().validate().is_ok());
    }

    #[test]
    fn test_validation_conflicting_options() {
        let mut args = make_args();
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_empty_department() {
        let mut args = make_args();
        args.department = Some("   ".to_string());
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_input_directory() {
        let temp_dir = TempDir::new().unwrap();
        let mut args = make_args();
        args.input = Some(temp_dir.path().to_path_buf());
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_compact_markdown() {
        let mut args = make_args();
        args.compact = true;
        args.format = Some(OutputFormat::Markdown);
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_init_config_skips_validation() {
        let mut args = make_args();
        args.verbose = true;
        args.quiet = true;
        args.init_config = true;
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_log_level() {
        let mut args = make_args();
        assert_eq!(args.log_level(), tracing::Level::INFO);

        args.verbose = true;
        assert_eq!(args.log_level(), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(), tracing::Level::ERROR);
    }

    #[test]
    fn test_parse_from_command_line() {
        let args = Args::try_parse_from([
            "divipola-stats",
            "--input",
            "datos.csv",
            "--department",
            "Meta",
            "--format",
            "markdown",
            "--export",
        ])
        .unwrap();

        assert_eq!(args.input, Some(PathBuf::from("datos.csv")));
        assert_eq!(args.department.as_deref(), Some("Meta"));
        assert_eq!(args.format, Some(OutputFormat::Markdown));
        assert_eq!(args.export, Some(None));
    }

    #[test]
    fn test_parse_export_with_path() {
        let args = Args::try_parse_from(["divipola-stats", "--export", "densidades.txt"]).unwrap();
        assert_eq!(args.export, Some(Some(PathBuf::from("densidades.txt"))));
    }
}
