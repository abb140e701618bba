//! Reporting utilities: formatted terminal tables for each chart.

pub mod format;

pub use format::*;
