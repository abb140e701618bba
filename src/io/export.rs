//! Export chart tables to CSV.
//!
//! The export is meant to be easy to consume in spreadsheets or to feed a
//! charting tool directly.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use serde::Serialize;

use crate::domain::Heatmap;
use crate::error::{AppError, EXIT_INPUT};

/// Write any serializable row type as CSV, one record per row.
pub fn write_rows_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<(), AppError> {
    let file = create(path)?;
    write_rows(file, rows)
}

/// Write a heatmap in wide form: `time,<category>...`, empty cells for gaps.
pub fn write_heatmap_csv(path: &Path, heatmap: &Heatmap) -> Result<(), AppError> {
    let file = create(path)?;
    write_heatmap(file, heatmap)
}

fn create(path: &Path) -> Result<File, AppError> {
    File::create(path)
        .map_err(|e| AppError::new(EXIT_INPUT, format!("Failed to create export CSV '{}': {e}", path.display())))
}

fn write_rows<W: Write, T: Serialize>(out: W, rows: &[T]) -> Result<(), AppError> {
    let mut writer = csv::Writer::from_writer(out);
    for row in rows {
        writer
            .serialize(row)
            .map_err(|e| AppError::new(EXIT_INPUT, format!("Failed to write export CSV row: {e}")))?;
    }
    writer
        .flush()
        .map_err(|e| AppError::new(EXIT_INPUT, format!("Failed to flush export CSV: {e}")))
}

fn write_heatmap<W: Write>(out: W, heatmap: &Heatmap) -> Result<(), AppError> {
    let mut writer = csv::Writer::from_writer(out);

    let mut header = vec!["time".to_string()];
    header.extend(heatmap.categories.iter().cloned());
    writer
        .write_record(&header)
        .map_err(|e| AppError::new(EXIT_INPUT, format!("Failed to write export CSV header: {e}")))?;

    for (j, t) in heatmap.times.iter().enumerate() {
        let mut record = vec![t.to_rfc3339()];
        for row in &heatmap.cells {
            record.push(row.get(j).copied().flatten().map(|v| v.to_string()).unwrap_or_default());
        }
        writer
            .write_record(&record)
            .map_err(|e| AppError::new(EXIT_INPUT, format!("Failed to write export CSV row: {e}")))?;
    }

    writer
        .flush()
        .map_err(|e| AppError::new(EXIT_INPUT, format!("Failed to flush export CSV: {e}")))
}
