//! Domain types used throughout the crate.
//!
//! This module defines:
//!
//! - feed rows and query keys (`TimeSeriesPoint`, `QuerySignature`)
//! - reference data shapes (`MunicipalityRecord`, `ReferenceTable`)
//! - the tables handed to each chart (`Heatmap`, `MapCell`, `TreemapRow`, ...)

pub mod canton;
pub mod types;

pub use canton::*;
pub use types::*;
