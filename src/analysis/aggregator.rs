//! Department aggregation and statistics.
//!
//! This module groups municipality records by department and reduces
//! each group to its [`DepartmentStatistics`].

use crate::models::{DepartmentLookup, DepartmentStatistics, Municipality, Report, NOT_AVAILABLE};
use std::collections::BTreeMap;
use tracing::debug;

/// Group municipalities by department code.
///
/// Every record lands in exactly one group and keeps its input order
/// inside the group.
pub fn group_by_department(municipalities: &[Municipality]) -> BTreeMap<u32, Vec<&Municipality>> {
    let mut grouped: BTreeMap<u32, Vec<&Municipality>> = BTreeMap::new();

    for municipality in municipalities {
        grouped
            .entry(municipality.department_code)
            .or_default()
            .push(municipality);
    }

    grouped
}

/// Build the statistics of every department present in `municipalities`.
pub fn build_report(municipalities: &[Municipality]) -> Report {
    let report: Report = group_by_department(municipalities)
        .into_iter()
        .filter_map(|(code, group)| department_statistics(&group).map(|stats| (code, stats)))
        .collect();

    debug!(
        "Aggregated {} municipalities into {} departments",
        municipalities.len(),
        report.len()
    );

    report
}

/// Build the statistics of a single department, matched by name.
///
/// Matching is case-insensitive and exact. The name is only ever compared,
/// never interpreted.
pub fn build_report_for(municipalities: &[Municipality], department_name: &str) -> DepartmentLookup {
    let wanted = department_name.to_lowercase();

    let matching: Vec<Municipality> = municipalities
        .iter()
        .filter(|m| m.department_name.to_lowercase() == wanted)
        .cloned()
        .collect();

    let Some(first) = matching.first() else {
        debug!("No municipalities for department '{}'", department_name);
        return DepartmentLookup::NotFound;
    };

    let code = first.department_code;
    match build_report(&matching).remove(&code) {
        Some(stats) => DepartmentLookup::Found(stats),
        None => DepartmentLookup::NotFound,
    }
}

/// Reduce one department's municipalities to its statistics.
///
/// Returns `None` for an empty group.
pub fn department_statistics(group: &[&Municipality]) -> Option<DepartmentStatistics> {
    let first = group.first()?;

    let urban: u64 = group.iter().map(|m| u64::from(m.urban_population)).sum();
    let rural: u64 = group.iter().map(|m| u64::from(m.rural_population)).sum();
    let total = urban + rural;
    let area: f64 = group.iter().map(|m| m.area).sum();

    let (urban_percentage, rural_percentage) = if total > 0 {
        (
            Some(urban as f64 / total as f64 * 100.0),
            Some(rural as f64 / total as f64 * 100.0),
        )
    } else {
        (None, None)
    };

    Some(DepartmentStatistics {
        department_name: first.department_name.clone(),
        total_density: total as f64 / area,
        urban_density: urban as f64 / area,
        rural_density: rural as f64 / area,
        urban_percentage,
        rural_percentage,
        average_area: area / group.len() as f64,
        largest_municipality: name_of(max_by(group, |m| m.area)),
        smallest_municipality: name_of(min_by(group, |m| m.area)),
        highest_density_municipality: name_of(max_by(group, Municipality::density)),
        lowest_density_municipality: name_of(min_by(group, Municipality::density)),
    })
}

/// First record with the largest key.
fn max_by<'a>(group: &[&'a Municipality], key: impl Fn(&Municipality) -> f64) -> Option<&'a Municipality> {
    extremum(group, key, |candidate, best| candidate > best)
}

/// First record with the smallest key.
fn min_by<'a>(group: &[&'a Municipality], key: impl Fn(&Municipality) -> f64) -> Option<&'a Municipality> {
    extremum(group, key, |candidate, best| candidate < best)
}

/// Linear scan keeping the current best; a later record replaces it only
/// when strictly better, so ties go to the earliest record.
fn extremum<'a>(
    group: &[&'a Municipality],
    key: impl Fn(&Municipality) -> f64,
    better: impl Fn(f64, f64) -> bool,
) -> Option<&'a Municipality> {
    let mut best: Option<(&'a Municipality, f64)> = None;

    for &municipality in group {
        let value = key(municipality);
        match best {
            Some((_, best_value)) if !better(value, best_value) => {}
            _ => best = Some((municipality, value)),
        }
    }

    best.map(|(municipality, _)| municipality)
}

fn name_of(municipality: Option<&Municipality>) -> String {
    municipality
        .map(|m| m.municipality_name.clone())
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}
