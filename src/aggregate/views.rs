//! Chart-specific tables derived from the aggregations.
//!
//! These are the last step before a table is handed to a chart. The zero
//! substitution for map colouring is kept as its own function so aggregated
//! data is never altered in place.

use crate::aggregate::per_capita;
use crate::domain::{BarRow, EnergyType, MapCell, ReferenceTable, RegionTotals, TreemapRow, canton_name};

/// Stand-in for a true zero on the map colour scale, so "no production"
/// renders differently from "no data".
pub const MAP_ZERO_EPSILON: f64 = 1e-10;

/// One map cell per canton for the selected energy type.
pub fn map_values(totals: &[RegionTotals], kind: EnergyType) -> Vec<MapCell> {
    totals
        .iter()
        .map(|t| MapCell {
            canton: t.canton.clone(),
            name: canton_name(&t.canton),
            value: t.production.get(kind),
        })
        .collect()
}

/// Replace exact zeros with `epsilon`.
pub fn substitute_zero(cells: &mut [MapCell], epsilon: f64) {
    for cell in cells.iter_mut().filter(|c| c.value == 0.0) {
        cell.value = epsilon;
    }
}

/// Cantons with positive production for `kind`, smallest first.
pub fn bar_ranking(totals: &[RegionTotals], kind: EnergyType) -> Vec<BarRow> {
    let mut rows: Vec<BarRow> = totals
        .iter()
        .map(|t| BarRow {
            canton: t.canton.clone(),
            value: t.production.get(kind),
        })
        .filter(|r| r.value > 0.0)
        .collect();
    rows.sort_by(|a, b| a.value.total_cmp(&b.value));
    rows
}

/// One row per (canton, source) with a positive value.
///
/// With `per_capita` set, values are MWh per inhabitant; cantons without a
/// known population have no per-capita value and are left out.
pub fn treemap_rows(table: &ReferenceTable, sources: &[EnergyType], per_capita_values: bool) -> Vec<TreemapRow> {
    let mut out = Vec::new();
    for row in &table.rows {
        for &source in sources {
            let raw = row.production.get(source);
            let value = if per_capita_values {
                per_capita(raw, row.population)
            } else {
                Some(raw)
            };
            if let Some(value) = value.filter(|v| *v > 0.0) {
                out.push(TreemapRow {
                    canton: row.canton.clone(),
                    source,
                    value,
                });
            }
        }
    }
    out
}
