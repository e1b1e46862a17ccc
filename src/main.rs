//! divipola-stats - Department statistics from DIVIPOLA census files
//!
//! A CLI tool that reads a semicolon-delimited municipality file and
//! reports population density, urban/rural split and area extremes for
//! every department.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (missing file, malformed line, bad config, etc.)
//!   2 - The department given with --department was not found

mod analysis;
mod cli;
mod config;
mod loader;
mod models;
mod report;

use anyhow::{Context, Result};
use chrono::Utc;
use cli::{Args, OutputFormat};
use config::{Config, CONFIG_FILE_NAME};
use loader::TextCleaner;
use models::{Municipality, ReportMetadata};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

/// Exit code when a department lookup finds nothing.
const EXIT_NOT_FOUND: i32 = 2;

fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    init_logging(&args);

    info!("divipola-stats v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    match run(args) {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("Report failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .divipola.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE_NAME);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            CONFIG_FILE_NAME
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", CONFIG_FILE_NAME))?;

    eprintln!("✅ Created {} with default settings.", CONFIG_FILE_NAME);
    Ok(())
}

/// Initialize logging based on verbosity settings.
///
/// Logs go to stderr so stdout carries only the report.
fn init_logging(args: &Args) {
    let level = args.log_level();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

/// Load, aggregate and render. Returns the process exit code.
fn run(args: Args) -> Result<i32> {
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);

    let cleaner = TextCleaner::with_extra(&config.cleaning.replacements);
    debug!("Name cleaning uses {} substitution rules", cleaner.len());

    let input = PathBuf::from(&config.general.input);
    let municipalities = loader::load(&input, &cleaner)
        .with_context(|| format!("Failed to load census data from {}", input.display()))?;

    if municipalities.is_empty() {
        warn!("{} contains no municipality records", input.display());
    }

    if config.export.enabled {
        let export_path = PathBuf::from(&config.export.path);
        let full_report = analysis::build_report(&municipalities);
        report::write_text_export(&full_report, &export_path)?;
    }

    let format = config.report.format;
    let pretty = config.report.pretty_json;

    let (output, exit_code) = match args.department.as_deref() {
        Some(department) => render_department(&municipalities, department, &input, format, pretty)?,
        None => (render_full(&municipalities, &input, format, pretty)?, 0),
    };

    write_output(args.output.as_deref(), &output)?;

    Ok(exit_code)
}

/// Render the report of every department.
fn render_full(
    municipalities: &[Municipality],
    input: &Path,
    format: OutputFormat,
    pretty: bool,
) -> Result<String> {
    let full_report = analysis::build_report(municipalities);
    info!("Report covers {} departments", full_report.len());

    match format {
        OutputFormat::Json => report::generate_json_report(&full_report, pretty),
        OutputFormat::Markdown => {
            let metadata = build_metadata(input, municipalities.len(), full_report.len());
            Ok(report::generate_markdown_report(&full_report, &metadata))
        }
    }
}

/// Render the report of one department. Returns the output and exit code.
fn render_department(
    municipalities: &[Municipality],
    department: &str,
    input: &Path,
    format: OutputFormat,
    pretty: bool,
) -> Result<(String, i32)> {
    let lookup = analysis::build_report_for(municipalities, department);

    let exit_code = match lookup.statistics() {
        Some(stats) => {
            info!(
                "Found department '{}' ({:.2} inhabitants/km²)",
                stats.department_name, stats.total_density
            );
            0
        }
        None => {
            warn!("Department '{}' not found", department);
            EXIT_NOT_FOUND
        }
    };

    let output = match format {
        OutputFormat::Json => report::generate_json_lookup(&lookup, pretty)?,
        OutputFormat::Markdown => {
            let departments = usize::from(lookup.is_found());
            let metadata = build_metadata(input, municipalities.len(), departments);
            report::generate_markdown_lookup(&lookup, department, &metadata)
        }
    };

    Ok((output, exit_code))
}

fn build_metadata(input: &Path, records_loaded: usize, departments: usize) -> ReportMetadata {
    ReportMetadata {
        source: input.display().to_string(),
        generated_at: Utc::now(),
        records_loaded,
        departments,
    }
}

/// Write the rendered report to a file, or to stdout when no path is given.
fn write_output(path: Option<&Path>, content: &str) -> Result<()> {
    match path {
        Some(path) => {
            std::fs::write(path, content)
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            info!("Report saved to {}", path.display());
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{}", content.trim_end()).context("Failed to write report to stdout")?;
            stdout.flush()?;
        }
    }
    Ok(())
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from {}", CONFIG_FILE_NAME);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {:#}", e);
            Ok(Config::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn fixture_path() -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/datos_muestra.csv")
    }

    fn fixture_records() -> Vec<Municipality> {
        loader::load(&fixture_path(), &TextCleaner::default()).unwrap()
    }

    #[test]
    fn test_render_full_json_from_fixture() {
        let records = fixture_records();
        let json = render_full(&records, &fixture_path(), OutputFormat::Json, true).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        let obj = value.as_object().unwrap();
        assert_eq!(obj.len(), 4);
        assert_eq!(value["5"]["nombreDepartamento"], "Antioquia");
        assert_eq!(value["5"]["municipioMasGrande"], "Abejorral");
        assert_eq!(value["5"]["mayorDensidad"], "Medellín");
        assert_eq!(value["13"]["nombreDepartamento"], "Bolívar");
        assert_eq!(value["13"]["municipioMasPequeño"], "Cartagena de Indias");
        assert_eq!(value["52"]["menorDensidad"], "Alén");
    }

    #[test]
    fn test_render_department_found() {
        let records = fixture_records();
        let (json, code) =
            render_department(&records, "NARIÑO", &fixture_path(), OutputFormat::Json, false).unwrap();

        assert_eq!(code, 0);
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["nombreDepartamento"], "Nariño");
        assert_eq!(value["municipioMasGrande"], "Pasto");
    }

    #[test]
    fn test_render_department_not_found() {
        let records = fixture_records();
        let (json, code) =
            render_department(&records, "Amazonas", &fixture_path(), OutputFormat::Json, false).unwrap();

        assert_eq!(code, EXIT_NOT_FOUND);
        assert_eq!(json, r#"{"error":"Departamento no encontrado"}"#);
    }

    #[test]
    fn test_render_full_markdown() {
        let records = fixture_records();
        let markdown = render_full(&records, &fixture_path(), OutputFormat::Markdown, true).unwrap();

        assert!(markdown.contains("datos_muestra.csv"));
        assert!(markdown.contains("- **Municipios:** 8"));
        assert!(markdown.contains("- **Departamentos:** 4"));
    }

    #[test]
    fn test_write_output_to_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("reporte.json");

        write_output(Some(&path), "{}").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{}");
    }

    #[test]
    fn test_load_config_explicit_path() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("custom.toml");
        std::fs::write(&path, "[general]\ninput = \"x.csv\"\n").unwrap();

        let args = Args {
            config: Some(path),
            ..Args::default()
        };
        let config = load_config(&args).unwrap();
        assert_eq!(config.general.input, "x.csv");
    }
}
