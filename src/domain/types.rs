//! Shared domain types.
//!
//! Everything the feed, the reference loader and the aggregations exchange
//! lives here, so the individual modules only need to agree on these shapes.

use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::FeedError;

/// One observation from the production feed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeSeriesPoint {
    pub timestamp: DateTime<Utc>,
    pub category: String,
    /// Power in MW.
    pub value: f64,
}

/// Rows returned by a single feed query, ordered by category then time.
///
/// An empty table means the feed had no data for the query.
pub type ProductionTable = Vec<TimeSeriesPoint>;

/// Parameters that identify one feed query.
///
/// Used both to build the HTTP request and as the cache key. The category list
/// is sorted and de-duplicated on construction so `[Solar, Nuclear]` and
/// `[Nuclear, Solar]` are the same query.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QuerySignature {
    start: DateTime<FixedOffset>,
    end: DateTime<FixedOffset>,
    categories: Vec<String>,
}

impl QuerySignature {
    pub fn new<I, S>(start: DateTime<FixedOffset>, end: DateTime<FixedOffset>, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut categories: Vec<String> = categories.into_iter().map(Into::into).collect();
        categories.sort();
        categories.dedup();
        Self {
            start,
            end,
            categories,
        }
    }

    pub fn start(&self) -> DateTime<FixedOffset> {
        self.start
    }

    pub fn end(&self) -> DateTime<FixedOffset> {
        self.end
    }

    /// Requested categories. Empty means "every category the feed reports".
    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn validate(&self) -> Result<(), FeedError> {
        if self.end < self.start {
            return Err(FeedError::Validation(format!(
                "end {} precedes start {}",
                self.end.to_rfc3339(),
                self.start.to_rfc3339()
            )));
        }
        Ok(())
    }

    /// Half-open window check: `start <= ts < end`.
    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        ts >= self.start.with_timezone(&Utc) && ts < self.end.with_timezone(&Utc)
    }

    pub fn wants(&self, category: &str) -> bool {
        self.categories.is_empty() || self.categories.iter().any(|c| c == category)
    }
}

/// Renewable production columns of the municipality dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum EnergyType {
    Total,
    Water,
    Solar,
    Wind,
    Biomass,
    Waste,
}

impl EnergyType {
    pub const ALL: [EnergyType; 6] = [
        EnergyType::Total,
        EnergyType::Water,
        EnergyType::Solar,
        EnergyType::Wind,
        EnergyType::Biomass,
        EnergyType::Waste,
    ];

    /// Individual sources (everything except the total).
    pub const SOURCES: [EnergyType; 5] = [
        EnergyType::Water,
        EnergyType::Solar,
        EnergyType::Wind,
        EnergyType::Biomass,
        EnergyType::Waste,
    ];

    fn index(self) -> usize {
        self as usize
    }

    /// CSV column holding this type's yearly production.
    pub fn column(self) -> &'static str {
        match self {
            EnergyType::Total => "renelec_production_mwh_per_year",
            EnergyType::Water => "renelec_production_water_mwh_per_year",
            EnergyType::Solar => "renelec_production_solar_mwh_per_year",
            EnergyType::Wind => "renelec_production_wind_mwh_per_year",
            EnergyType::Biomass => "renelec_production_biomass_mwh_per_year",
            EnergyType::Waste => "renelec_production_waste_mwh_per_year",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            EnergyType::Total => "Total Renewable Energy",
            EnergyType::Water => "Water Production",
            EnergyType::Solar => "Solar Production",
            EnergyType::Wind => "Wind Production",
            EnergyType::Biomass => "Biomass Production",
            EnergyType::Waste => "Waste Production",
        }
    }

    pub fn slug(self) -> &'static str {
        match self {
            EnergyType::Total => "total",
            EnergyType::Water => "water",
            EnergyType::Solar => "solar",
            EnergyType::Wind => "wind",
            EnergyType::Biomass => "biomass",
            EnergyType::Waste => "waste",
        }
    }
}

const ENERGY_TYPE_COUNT: usize = EnergyType::ALL.len();

/// Yearly production (MWh) per energy type.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SourceProduction {
    values: [f64; ENERGY_TYPE_COUNT],
}

impl SourceProduction {
    pub fn get(&self, kind: EnergyType) -> f64 {
        self.values[kind.index()]
    }

    pub fn set(&mut self, kind: EnergyType, value: f64) {
        self.values[kind.index()] = value;
    }

    pub fn add(&mut self, other: &SourceProduction) {
        for (acc, v) in self.values.iter_mut().zip(other.values.iter()) {
            *acc += v;
        }
    }
}

/// One row of the municipality production CSV.
#[derive(Debug, Clone, PartialEq)]
pub struct MunicipalityRecord {
    pub canton: String,
    pub date_from: NaiveDate,
    pub production: SourceProduction,
}

/// Production summed over all municipalities of a canton.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionTotals {
    pub canton: String,
    pub production: SourceProduction,
}

/// Canton code -> population.
pub type PopulationTable = BTreeMap<String, u64>;

/// Per-canton production for one year, left-joined with population.
#[derive(Debug, Clone, PartialEq)]
pub struct CantonProduction {
    pub canton: String,
    pub production: SourceProduction,
    /// `None` when the canton is missing from the population file.
    pub population: Option<u64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceTable {
    pub year: i32,
    pub rows: Vec<CantonProduction>,
}

/// Total per feed category (pie view).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryTotal {
    pub category: String,
    pub total: f64,
}

/// Category x time matrix (heatmap view).
///
/// `cells[i][j]` is the summed value of `categories[i]` at `times[j]`, or
/// `None` when the feed had no sample for that pair.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Heatmap {
    pub categories: Vec<String>,
    pub times: Vec<DateTime<Utc>>,
    pub cells: Vec<Vec<Option<f64>>>,
}

impl Heatmap {
    pub fn row(&self, category: &str) -> Option<&[Option<f64>]> {
        let idx = self.categories.iter().position(|c| c == category)?;
        self.cells.get(idx).map(Vec::as_slice)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerCapitaRow {
    pub canton: String,
    pub energy_type: EnergyType,
    /// MWh per inhabitant; `None` when the population is unknown.
    pub value: Option<f64>,
}

/// Value for one map region.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapCell {
    pub canton: String,
    pub name: Option<&'static str>,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarRow {
    pub canton: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TreemapRow {
    pub canton: String,
    pub source: EnergyType,
    pub value: f64,
}

/// Which production chart to compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ProductionView {
    /// Raw rows, used for the bar and line charts.
    Series,
    /// Total per category, used for the pie chart.
    Share,
    /// Category x time matrix.
    Heatmap,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32) -> DateTime<FixedOffset> {
        FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2023, 1, 1, h, 0, 0)
            .unwrap()
    }

    #[test]
    fn signature_ignores_category_order_and_duplicates() {
        let a = QuerySignature::new(at(0), at(1), ["Solar", "Nuclear"]);
        let b = QuerySignature::new(at(0), at(1), ["Nuclear", "Solar", "Solar"]);
        assert_eq!(a, b);
        assert_eq!(a.categories(), ["Nuclear".to_string(), "Solar".to_string()]);
    }

    #[test]
    fn signature_window_is_half_open() {
        let sig = QuerySignature::new(at(0), at(1), Vec::<String>::new());
        assert!(sig.contains(at(0).with_timezone(&Utc)));
        assert!(!sig.contains(at(1).with_timezone(&Utc)));
        assert!(sig.wants("Anything"));
    }

    #[test]
    fn signature_rejects_end_before_start() {
        let sig = QuerySignature::new(at(2), at(1), ["Solar"]);
        assert!(matches!(sig.validate(), Err(FeedError::Validation(_))));
        assert!(QuerySignature::new(at(1), at(1), ["Solar"]).validate().is_ok());
    }

    #[test]
    fn source_production_accumulates() {
        let mut a = SourceProduction::default();
        a.set(EnergyType::Solar, 1.5);
        let mut b = SourceProduction::default();
        b.set(EnergyType::Solar, 2.0);
        b.set(EnergyType::Wind, 3.0);
        a.add(&b);
        assert_eq!(a.get(EnergyType::Solar), 3.5);
        assert_eq!(a.get(EnergyType::Wind), 3.0);
        assert_eq!(a.get(EnergyType::Water), 0.0);
    }
}
