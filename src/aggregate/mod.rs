//! Pure reductions over in-memory tables.
//!
//! Nothing here mutates its input or knows about rendering; chart-specific
//! adjustments live in `views`.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};

use crate::domain::{
    CategoryTotal, EnergyType, Heatmap, MunicipalityRecord, PerCapitaRow, ReferenceTable, RegionTotals,
    SourceProduction, TimeSeriesPoint,
};

pub mod views;

pub use views::*;

/// Sum production per canton, sorted by canton code.
pub fn sum_by_region(records: &[MunicipalityRecord]) -> Vec<RegionTotals> {
    let mut by_canton: BTreeMap<&str, SourceProduction> = BTreeMap::new();
    for r in records {
        by_canton.entry(r.canton.as_str()).or_default().add(&r.production);
    }
    by_canton
        .into_iter()
        .map(|(canton, production)| RegionTotals {
            canton: canton.to_string(),
            production,
        })
        .collect()
}

/// Collapse the time dimension: total value per category, sorted by category.
pub fn sum_by_category(points: &[TimeSeriesPoint]) -> Vec<CategoryTotal> {
    let mut totals: BTreeMap<&str, f64> = BTreeMap::new();
    for p in points {
        *totals.entry(p.category.as_str()).or_insert(0.0) += p.value;
    }
    totals
        .into_iter()
        .map(|(category, total)| CategoryTotal {
            category: category.to_string(),
            total,
        })
        .collect()
}

/// Build a category x time matrix.
///
/// Rows are categories and columns are the distinct timestamps of the input,
/// both sorted. Repeated (category, time) samples are summed; pairs with no
/// sample stay `None`.
pub fn pivot_time_by_category(points: &[TimeSeriesPoint]) -> Heatmap {
    let times: Vec<DateTime<Utc>> = points
        .iter()
        .map(|p| p.timestamp)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let mut by_category: BTreeMap<&str, BTreeMap<DateTime<Utc>, f64>> = BTreeMap::new();
    for p in points {
        *by_category
            .entry(p.category.as_str())
            .or_default()
            .entry(p.timestamp)
            .or_insert(0.0) += p.value;
    }

    let mut categories = Vec::with_capacity(by_category.len());
    let mut cells = Vec::with_capacity(by_category.len());
    for (category, values) in by_category {
        categories.push(category.to_string());
        cells.push(times.iter().map(|t| values.get(t).copied()).collect());
    }

    Heatmap {
        categories,
        times,
        cells,
    }
}

/// `value / population`, rounded to two decimals.
///
/// Unknown (or zero) population yields `None`, never 0.
pub fn per_capita(value: f64, population: Option<u64>) -> Option<f64> {
    let population = population.filter(|p| *p > 0)?;
    Some(round2(value / population as f64))
}

/// Per-capita production for every canton and every energy type.
pub fn per_capita_table(table: &ReferenceTable) -> Vec<PerCapitaRow> {
    table
        .rows
        .iter()
        .flat_map(|row| {
            EnergyType::ALL.into_iter().map(move |kind| PerCapitaRow {
                canton: row.canton.clone(),
                energy_type: kind,
                value: per_capita(row.production.get(kind), row.population),
            })
        })
        .collect()
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone};
    use pretty_assertions::assert_eq;

    use crate::domain::CantonProduction;

    fn point(minute: u32, category: &str, value: f64) -> TimeSeriesPoint {
        TimeSeriesPoint {
            timestamp: Utc.with_ymd_and_hms(2023, 1, 1, 0, minute, 0).unwrap(),
            category: category.to_string(),
            value,
        }
    }

    fn record(canton: &str, kind: EnergyType, value: f64) -> MunicipalityRecord {
        let mut production = SourceProduction::default();
        production.set(kind, value);
        MunicipalityRecord {
            canton: canton.to_string(),
            date_from: NaiveDate::from_ymd_opt(2022, 1, 1).unwrap(),
            production,
        }
    }

    fn sample() -> Vec<TimeSeriesPoint> {
        vec![
            point(0, "Solar", 10.0),
            point(15, "Solar", 20.0),
            point(0, "Nuclear", 2900.0),
            point(30, "Nuclear", 2950.0),
            point(30, "Nuclear", 50.0),
        ]
    }

    #[test]
    fn sums_by_region() {
        let records = vec![
            record("ZH", EnergyType::Solar, 1.0),
            record("BE", EnergyType::Water, 4.0),
            record("ZH", EnergyType::Solar, 2.5),
        ];
        let totals = sum_by_region(&records);
        assert_eq!(totals.len(), 2);
        assert_eq!(totals[0].canton, "BE");
        assert_eq!(totals[1].canton, "ZH");
        assert_eq!(totals[1].production.get(EnergyType::Solar), 3.5);
    }

    #[test]
    fn sums_by_category() {
        let totals = sum_by_category(&sample());
        assert_eq!(
            totals,
            vec![
                CategoryTotal {
                    category: "Nuclear".to_string(),
                    total: 5900.0
                },
                CategoryTotal {
                    category: "Solar".to_string(),
                    total: 30.0
                },
            ]
        );
    }

    #[test]
    fn pivot_shape_and_gaps() {
        let heatmap = pivot_time_by_category(&sample());
        assert_eq!(heatmap.categories, vec!["Nuclear", "Solar"]);
        assert_eq!(heatmap.times.len(), 3);
        assert_eq!(heatmap.row("Nuclear").unwrap(), &[Some(2900.0), None, Some(3000.0)]);
        assert_eq!(heatmap.row("Solar").unwrap(), &[Some(10.0), Some(20.0), None]);
    }

    #[test]
    fn pivot_rows_sum_to_category_totals() {
        let points = sample();
        let heatmap = pivot_time_by_category(&points);
        let totals = sum_by_category(&points);

        assert_eq!(heatmap.categories.len(), totals.len());
        for total in &totals {
            let row_sum: f64 = heatmap.row(&total.category).unwrap().iter().flatten().sum();
            assert!((row_sum - total.total).abs() < 1e-9, "{}: {row_sum} vs {}", total.category, total.total);
        }
    }

    #[test]
    fn pivot_of_empty_table_is_empty() {
        assert_eq!(pivot_time_by_category(&[]), Heatmap::default());
    }

    #[test]
    fn per_capita_rounds_and_flags_unknown() {
        assert_eq!(per_capita(1000.0, Some(3)), Some(333.33));
        assert_eq!(per_capita(2.0, Some(3)), Some(0.67));
        assert_eq!(per_capita(1000.0, None), None);
        assert_eq!(per_capita(1000.0, Some(0)), None);
    }

    #[test]
    fn per_capita_table_covers_every_type() {
        let mut production = SourceProduction::default();
        production.set(EnergyType::Solar, 50.0);
        let table = ReferenceTable {
            year: 2022,
            rows: vec![
                CantonProduction {
                    canton: "UR".to_string(),
                    production,
                    population: Some(40),
                },
                CantonProduction {
                    canton: "XX".to_string(),
                    production,
                    population: None,
                },
            ],
        };
        let rows = per_capita_table(&table);
        assert_eq!(rows.len(), 2 * EnergyType::ALL.len());
        let ur_solar = rows
            .iter()
            .find(|r| r.canton == "UR" && r.energy_type == EnergyType::Solar)
            .unwrap();
        assert_eq!(ur_solar.value, Some(1.25));
        assert!(rows.iter().filter(|r| r.canton == "XX").all(|r| r.value.is_none()));
    }
}
