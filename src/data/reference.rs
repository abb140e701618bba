//! Static reference data: municipality production CSV + canton population JSON.
//!
//! Ingest follows the same rules as any other tabular input here:
//! - strict schema for required columns (clear error, exit code 2)
//! - row-level validation: bad rows are skipped and reported
//! - missing numeric production fields count as 0.0 so sums stay defined

use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::Read;

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use csv::StringRecord;
use tracing::{info, warn};

use crate::aggregate::sum_by_region;
use crate::config::ReferenceConfig;
use crate::domain::{
    CantonProduction, EnergyType, MunicipalityRecord, PopulationTable, ReferenceTable, SourceProduction,
};
use crate::error::{AppError, EXIT_INPUT};

const CANTON_COLUMN: &str = "canton";
const DATE_COLUMN: &str = "renelec_production_date_from";

/// A row-level error encountered during ingest.
#[derive(Debug, Clone)]
pub struct RowError {
    pub line: usize,
    pub message: String,
}

/// Loaded reference data. Immutable once built.
#[derive(Debug, Clone)]
pub struct ReferenceStore {
    records: Vec<MunicipalityRecord>,
    population: PopulationTable,
    row_errors: Vec<RowError>,
    default_year: i32,
}

impl ReferenceStore {
    pub fn load(config: &ReferenceConfig) -> Result<Self, AppError> {
        let csv_file = File::open(&config.production_csv).map_err(|e| {
            AppError::new(
                EXIT_INPUT,
                format!("Failed to open CSV '{}': {e}", config.production_csv.display()),
            )
        })?;
        let json_file = File::open(&config.population_json).map_err(|e| {
            AppError::new(
                EXIT_INPUT,
                format!("Failed to open population JSON '{}': {e}", config.population_json.display()),
            )
        })?;

        let store = Self::from_readers(csv_file, json_file, config.year)?;
        info!(
            records = store.records.len(),
            skipped = store.row_errors.len(),
            cantons_with_population = store.population.len(),
            "loaded reference data"
        );
        Ok(store)
    }

    pub fn from_readers(production_csv: impl Read, population_json: impl Read, default_year: i32) -> Result<Self, AppError> {
        let (records, row_errors) = read_municipality_records(production_csv)?;
        for err in &row_errors {
            warn!(line = err.line, "skipped reference row: {}", err.message);
        }
        let population = read_population(population_json)?;
        Ok(Self {
            records,
            population,
            row_errors,
            default_year,
        })
    }

    pub fn records(&self) -> &[MunicipalityRecord] {
        &self.records
    }

    pub fn population(&self) -> &PopulationTable {
        &self.population
    }

    pub fn row_errors(&self) -> &[RowError] {
        &self.row_errors
    }

    pub fn default_year(&self) -> i32 {
        self.default_year
    }

    /// The table for the year the store was loaded for.
    pub fn default_table(&self) -> ReferenceTable {
        self.table_for_year(self.default_year)
    }

    /// Per-canton sums for `year`, left-joined with population.
    pub fn table_for_year(&self, year: i32) -> ReferenceTable {
        let in_year: Vec<MunicipalityRecord> = self
            .records
            .iter()
            .filter(|r| r.date_from.year() == year)
            .cloned()
            .collect();

        let rows = sum_by_region(&in_year)
            .into_iter()
            .map(|totals| CantonProduction {
                population: self.population.get(&totals.canton).copied(),
                canton: totals.canton,
                production: totals.production,
            })
            .collect();

        ReferenceTable { year, rows }
    }
}

/// Load both reference files and build the table for the configured year.
pub fn load_reference_table(config: &ReferenceConfig) -> Result<ReferenceTable, AppError> {
    Ok(ReferenceStore::load(config)?.default_table())
}

fn read_municipality_records(reader: impl Read) -> Result<(Vec<MunicipalityRecord>, Vec<RowError>), AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader
        .headers()
        .map_err(|e| AppError::new(EXIT_INPUT, format!("Failed to read CSV headers: {e}")))?
        .clone();
    let header_map = build_header_map(&headers);

    for required in [CANTON_COLUMN, DATE_COLUMN] {
        if !header_map.contains_key(required) {
            return Err(AppError::new(
                EXIT_INPUT,
                format!("Missing required column: `{required}`"),
            ));
        }
    }

    let mut records = Vec::new();
    let mut row_errors = Vec::new();

    for (idx, result) in reader.records().enumerate() {
        // Header is line 1.
        let line = idx + 2;
        let record = match result {
            Ok(r) => r,
            Err(e) => {
                row_errors.push(RowError {
                    line,
                    message: format!("CSV parse error: {e}"),
                });
                continue;
            }
        };

        match parse_row(&record, &header_map) {
            Ok(row) => records.push(row),
            Err(message) => row_errors.push(RowError { line, message }),
        }
    }

    Ok((records, row_errors))
}

fn read_population(reader: impl Read) -> Result<PopulationTable, AppError> {
    let raw: BTreeMap<String, u64> = serde_json::from_reader(reader)
        .map_err(|e| AppError::new(EXIT_INPUT, format!("Invalid population JSON: {e}")))?;
    Ok(raw
        .into_iter()
        .map(|(code, pop)| (code.trim().to_ascii_uppercase(), pop))
        .collect())
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    // Strip a UTF-8 BOM left on the first header by spreadsheet exports.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase()
}

fn parse_row(record: &StringRecord, header_map: &HashMap<String, usize>) -> Result<MunicipalityRecord, String> {
    let canton = get_optional(record, header_map, CANTON_COLUMN)
        .ok_or_else(|| "Missing `canton` value.".to_string())?
        .to_ascii_uppercase();
    let date_raw = get_optional(record, header_map, DATE_COLUMN)
        .ok_or_else(|| format!("Missing `{DATE_COLUMN}` value."))?;
    let date_from = parse_date(date_raw)?;

    let mut production = SourceProduction::default();
    for kind in EnergyType::ALL {
        let value = match get_optional(record, header_map, kind.column()) {
            None => 0.0,
            Some(raw) => parse_f64(raw).ok_or_else(|| format!("Invalid `{}` value '{raw}'.", kind.column()))?,
        };
        production.set(kind, value);
    }

    Ok(MunicipalityRecord {
        canton,
        date_from,
        production,
    })
}

fn get_optional<'a>(record: &'a StringRecord, header_map: &HashMap<String, usize>, name: &str) -> Option<&'a str> {
    let idx = header_map.get(name)?;
    record.get(*idx).map(str::trim).filter(|s| !s.is_empty())
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(d);
    }
    const DATETIME_FMTS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];
    for fmt in DATETIME_FMTS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(dt.date());
        }
    }
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(s) {
        return Ok(dt.date_naive());
    }
    Err(format!("Invalid date '{s}'. Expected YYYY-MM-DD or an ISO 8601 timestamp."))
}

/// Pandas-style exports write missing values as `nan`; those count as 0.0 like empty cells.
fn parse_f64(s: &str) -> Option<f64> {
    if s.eq_ignore_ascii_case("nan") {
        return Some(0.0);
    }
    let v = s.parse::<f64>().ok()?;
    if v.is_finite() { Some(v) } else { None }
}
