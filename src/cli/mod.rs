//! Command-line parsing for the energy dashboards.
//!
//! The goal of this module is to keep **argument parsing** separate from
//! fetching and aggregation; `app` turns these structs into queries.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::DEFAULT_REFERENCE_YEAR;
use crate::domain::{EnergyType, ProductionView};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "energy", version, about = "Swiss electricity production dashboards")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Public power production over a date range (bar/line, pie or heatmap data).
    Power(PowerArgs),
    /// Renewable production per canton: map values and bar ranking.
    Map(MapArgs),
    /// Renewable production by canton and source for one year.
    Treemap(TreemapArgs),
}

#[derive(Debug, Args, Clone)]
pub struct PowerArgs {
    /// Start of the range (`YYYY-MM-DD` or RFC 3339). Defaults to today.
    #[arg(long)]
    pub start: Option<String>,

    /// End of the range, exclusive. Defaults to one day after the start.
    #[arg(long)]
    pub end: Option<String>,

    /// UTC offset applied to plain dates and used for displayed timestamps.
    #[arg(long, default_value = "+01:00", allow_hyphen_values = true)]
    pub offset: String,

    /// Production types to include (comma separated). Defaults to the main Swiss sources.
    #[arg(long, value_delimiter = ',')]
    pub types: Vec<String>,

    /// Include every production type the feed reports.
    #[arg(long, conflicts_with = "types")]
    pub all_types: bool,

    /// Which chart data to compute.
    #[arg(long, value_enum, default_value_t = ProductionView::Series)]
    pub view: ProductionView,

    /// Export the table to CSV.
    #[arg(long)]
    pub export: Option<PathBuf>,
}

/// Reference file locations; unset flags fall back to the environment, then defaults.
#[derive(Debug, Args, Clone)]
pub struct ReferenceArgs {
    /// Municipality production CSV.
    #[arg(long, value_name = "CSV")]
    pub data: Option<PathBuf>,

    /// Canton population JSON.
    #[arg(long, value_name = "JSON")]
    pub population: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct MapArgs {
    #[arg(short = 'e', long, value_enum, default_value_t = EnergyType::Total)]
    pub energy_type: EnergyType,

    /// Only rank the N largest producing cantons.
    #[arg(long, value_name = "N")]
    pub top: Option<usize>,

    #[command(flatten)]
    pub reference: ReferenceArgs,

    /// Export map values to CSV.
    #[arg(long)]
    pub export: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct TreemapArgs {
    /// Sources to include (comma separated). Defaults to all individual sources.
    #[arg(long, value_enum, value_delimiter = ',')]
    pub sources: Vec<EnergyType>,

    /// Report MWh per inhabitant instead of total MWh.
    #[arg(long)]
    pub per_capita: bool,

    #[arg(long, default_value_t = DEFAULT_REFERENCE_YEAR)]
    pub year: i32,

    #[command(flatten)]
    pub reference: ReferenceArgs,

    /// Export treemap rows to CSV.
    #[arg(long)]
    pub export: Option<PathBuf>,
}
