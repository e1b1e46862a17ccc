//! Data models for the census statistics.
//!
//! This module contains the core data structures used throughout
//! the application: the municipality records read from the source file
//! and the per-department statistics derived from them.

use chrono::{DateTime, Utc};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;

/// Placeholder rendered when a department has no extremum to report.
pub const NOT_AVAILABLE: &str = "N/A";

/// Message returned when a department lookup matches nothing.
pub const DEPARTMENT_NOT_FOUND: &str = "Departamento no encontrado";

/// A single municipality, one per line of the source file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Municipality {
    /// Code of the department the municipality belongs to.
    pub department_code: u32,
    /// Department display name (cleaned).
    pub department_name: String,
    /// Municipality code.
    pub municipality_code: u32,
    /// Municipality display name (cleaned).
    pub municipality_name: String,
    /// Surface area in km². Always finite and greater than zero.
    pub area: f64,
    /// Urban population.
    pub urban_population: u32,
    /// Rural population.
    pub rural_population: u32,
}

impl Municipality {
    /// Returns the urban plus rural population.
    pub fn total_population(&self) -> u64 {
        u64::from(self.urban_population) + u64::from(self.rural_population)
    }

    /// Returns inhabitants per km².
    pub fn density(&self) -> f64 {
        self.total_population() as f64 / self.area
    }
}

/// Statistics computed for one department.
///
/// Field names on the wire are the Spanish keys consumed by existing
/// report clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepartmentStatistics {
    #[serde(rename = "nombreDepartamento")]
    pub department_name: String,

    #[serde(rename = "densidadTotal")]
    pub total_density: f64,

    #[serde(rename = "densidadUrbana")]
    pub urban_density: f64,

    #[serde(rename = "densidadRural")]
    pub rural_density: f64,

    /// `None` when the department has no inhabitants.
    #[serde(rename = "porcentajeUrbana")]
    pub urban_percentage: Option<f64>,

    /// `None` when the department has no inhabitants.
    #[serde(rename = "porcentajeRural")]
    pub rural_percentage: Option<f64>,

    #[serde(rename = "areaPromedio")]
    pub average_area: f64,

    #[serde(rename = "municipioMasGrande")]
    pub largest_municipality: String,

    #[serde(rename = "municipioMasPequeño")]
    pub smallest_municipality: String,

    #[serde(rename = "mayorDensidad")]
    pub highest_density_municipality: String,

    #[serde(rename = "menorDensidad")]
    pub lowest_density_municipality: String,
}

/// Full report: department code to its statistics, ordered by code.
pub type Report = BTreeMap<u32, DepartmentStatistics>;

/// Outcome of a single-department lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum DepartmentLookup {
    /// The department exists and these are its statistics.
    Found(DepartmentStatistics),
    /// No record carries the requested department name.
    NotFound,
}

impl DepartmentLookup {
    /// Returns the statistics if the department was found.
    pub fn statistics(&self) -> Option<&DepartmentStatistics> {
        match self {
            DepartmentLookup::Found(stats) => Some(stats),
            DepartmentLookup::NotFound => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, DepartmentLookup::Found(_))
    }
}

impl Serialize for DepartmentLookup {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            DepartmentLookup::Found(stats) => stats.serialize(serializer),
            DepartmentLookup::NotFound => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("error", DEPARTMENT_NOT_FOUND)?;
                map.end()
            }
        }
    }
}

/// Metadata shown in the header of rendered documents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// Path of the source file.
    pub source: String,
    /// When the report was generated.
    pub generated_at: DateTime<Utc>,
    /// Number of municipality records loaded.
    pub records_loaded: usize,
    /// Number of departments in the report.
    pub departments: usize,
}
