//! Input/output helpers.
//!
//! - CSV exports of chart tables (`export`)

pub mod export;

pub use export::*;
