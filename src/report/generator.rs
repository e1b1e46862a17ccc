//! Report generation.
//!
//! This module renders department statistics as JSON, as a Markdown
//! document, or as the flat text export.

use crate::models::{DepartmentLookup, DepartmentStatistics, Report, ReportMetadata, DEPARTMENT_NOT_FOUND};
use anyhow::{Context, Result};
use serde::Serialize;
use std::io::Write;
use std::path::Path;
use tracing::info;

/// Default file name of the text export.
pub const DEFAULT_EXPORT_PATH: &str = "reporte_departamentos.txt";

/// Generate the full report as JSON.
pub fn generate_json_report(report: &Report, pretty: bool) -> Result<String> {
    to_json(report, pretty)
}

/// Generate a single-department lookup as JSON.
pub fn generate_json_lookup(lookup: &DepartmentLookup, pretty: bool) -> Result<String> {
    to_json(lookup, pretty)
}

fn to_json<T: Serialize + ?Sized>(value: &T, pretty: bool) -> Result<String> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    Ok(json)
}

/// Generate a complete Markdown report.
pub fn generate_markdown_report(report: &Report, metadata: &ReportMetadata) -> String {
    let mut output = String::new();

    output.push_str("# Reporte de Departamentos\n\n");
    output.push_str(&generate_metadata_section(metadata));
    output.push_str(&generate_summary_section(report));

    output.push_str("## Departamentos\n\n");
    if report.is_empty() {
        output.push_str("No se encontraron municipios en el archivo de origen.\n\n");
    }
    for (code, stats) in report {
        output.push_str(&generate_department_section(Some(*code), stats));
    }

    output
}

/// Generate a Markdown document for a single-department lookup.
pub fn generate_markdown_lookup(
    lookup: &DepartmentLookup,
    query: &str,
    metadata: &ReportMetadata,
) -> String {
    let mut output = String::new();

    output.push_str(&format!("# Reporte de Departamento: {}\n\n", code_span(query)));
    output.push_str(&generate_metadata_section(metadata));

    match lookup {
        DepartmentLookup::Found(stats) => {
            output.push_str(&generate_department_section(None, stats));
        }
        DepartmentLookup::NotFound => {
            output.push_str(&format!("> **Error:** {}\n", DEPARTMENT_NOT_FOUND));
        }
    }

    output
}

/// Generate the metadata section.
fn generate_metadata_section(metadata: &ReportMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Metadatos\n\n");
    section.push_str(&format!("- **Archivo de origen:** `{}`\n", metadata.source));
    section.push_str(&format!(
        "- **Generado:** {}\n",
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!("- **Municipios:** {}\n", metadata.records_loaded));
    section.push_str(&format!("- **Departamentos:** {}\n", metadata.departments));
    section.push('\n');

    section
}

/// Generate the summary table, one row per department.
fn generate_summary_section(report: &Report) -> String {
    if report.is_empty() {
        return String::new();
    }

    let mut section = String::new();

    section.push_str("## Resumen\n\n");
    section.push_str("| Código | Departamento | Densidad Total | Densidad Urbana | Densidad Rural | % Urbana | % Rural |\n");
    section.push_str("|:---:|:---|---:|---:|---:|---:|---:|\n");

    for (code, stats) in report {
        section.push_str(&format!(
            "| {} | {} | {} | {} | {} | {} | {} |\n",
            code,
            stats.department_name,
            format_number(stats.total_density),
            format_number(stats.urban_density),
            format_number(stats.rural_density),
            format_percentage(stats.urban_percentage),
            format_percentage(stats.rural_percentage),
        ));
    }
    section.push('\n');

    section
}

/// Generate the detail block of one department.
fn generate_department_section(code: Option<u32>, stats: &DepartmentStatistics) -> String {
    let mut section = String::new();

    match code {
        Some(code) => section.push_str(&format!("### {} ({})\n\n", stats.department_name, code)),
        None => section.push_str(&format!("## {}\n\n", stats.department_name)),
    }

    section.push_str("| Indicador | Valor |\n");
    section.push_str("|:---|---:|\n");
    section.push_str(&format!("| Densidad total (hab/km²) | {} |\n", format_number(stats.total_density)));
    section.push_str(&format!("| Densidad urbana (hab/km²) | {} |\n", format_number(stats.urban_density)));
    section.push_str(&format!("| Densidad rural (hab/km²) | {} |\n", format_number(stats.rural_density)));
    section.push_str(&format!("| Población urbana | {} |\n", format_percentage(stats.urban_percentage)));
    section.push_str(&format!("| Población rural | {} |\n", format_percentage(stats.rural_percentage)));
    section.push_str(&format!("| Área promedio (km²) | {} |\n", format_number(stats.average_area)));
    section.push_str(&format!("| Municipio más grande | {} |\n", stats.largest_municipality));
    section.push_str(&format!("| Municipio más pequeño | {} |\n", stats.smallest_municipality));
    section.push_str(&format!("| Mayor densidad | {} |\n", stats.highest_density_municipality));
    section.push_str(&format!("| Menor densidad | {} |\n", stats.lowest_density_municipality));
    section.push('\n');

    section
}

/// Render untrusted text as a single-line inline code span.
fn code_span(text: &str) -> String {
    let flat: String = text
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect();

    // fence must be longer than any backtick run inside the text
    let longest_run = flat
        .split(|c| c != '`')
        .map(str::len)
        .max()
        .unwrap_or(0);
    let fence = "`".repeat(longest_run + 1);

    format!("{fence} {flat} {fence}")
}

fn format_number(value: f64) -> String {
    format!("{:.2}", value)
}

fn format_percentage(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.2}%", v),
        None => "N/A".to_string(),
    }
}

/// Generate the flat text export, one line per department.
pub fn generate_text_export(report: &Report) -> String {
    report
        .values()
        .map(|stats| {
            format!(
                "Departamento: {}, Densidad Total: {:.2}, Urbana: {:.2}\n",
                stats.department_name, stats.total_density, stats.urban_density
            )
        })
        .collect()
}

/// Write the text export to `path`, replacing any existing file.
pub fn write_text_export(report: &Report, path: &Path) -> Result<()> {
    let content = generate_text_export(report);

    let mut file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create export file {}", path.display()))?;
    file.write_all(content.as_bytes())
        .with_context(|| format!("Failed to write export file {}", path.display()))?;

    info!("Wrote {} departments to {}", report.len(), path.display());
    Ok(())
}
