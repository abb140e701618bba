//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - sets up logging
//! - parses CLI arguments
//! - builds the service objects from configuration
//! - prints the requested chart table and writes optional exports

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::app::pipeline::{ProductionService, canton_map, treemap};
use crate::cli::{Command, MapArgs, PowerArgs, ReferenceArgs, TreemapArgs};
use crate::config::{FeedConfig, ReferenceConfig};
use crate::data::{DEFAULT_CATEGORIES, ReferenceStore};
use crate::domain::{EnergyType, ProductionView, QuerySignature};
use crate::error::{AppError, EXIT_INPUT, EXIT_NO_DATA};

pub mod pipeline;

const DEFAULT_LOG_FILTER: &str = "swiss_energy=info";

/// Entry point for the `energy` binary.
pub fn run() -> Result<(), AppError> {
    init_tracing();

    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    match cli.command {
        Command::Power(args) => handle_power(args),
        Command::Map(args) => handle_map(args),
        Command::Treemap(args) => handle_treemap(args),
    }
}

fn init_tracing() {
    // Logs go to stderr so stdout only carries tables.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()))
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn handle_power(args: PowerArgs) -> Result<(), AppError> {
    let offset = parse_offset(&args.offset)?;
    let query = power_query_from_args(&args, offset, Utc::now())?;

    let config = FeedConfig::from_env()?;
    let service = ProductionService::from_config(&config)?;
    info!(view = ?args.view, "computing production chart");

    let table = service.series(&query)?;
    if table.is_empty() {
        return Err(AppError::new(
            EXIT_NO_DATA,
            "No production data for the requested range and types.",
        ));
    }

    println!("{}", crate::report::format_query_header(&query));
    match args.view {
        ProductionView::Series => {
            println!("{}", crate::report::format_series(&table, offset));
            if let Some(path) = &args.export {
                crate::io::write_rows_csv(path, table.as_slice())?;
            }
        }
        ProductionView::Share => {
            let totals = service.share(&query)?;
            println!("{}", crate::report::format_share(&totals));
            if let Some(path) = &args.export {
                crate::io::write_rows_csv(path, &totals)?;
            }
        }
        ProductionView::Heatmap => {
            let heatmap = service.heatmap(&query)?;
            println!("{}", crate::report::format_heatmap(&heatmap, offset));
            if let Some(path) = &args.export {
                crate::io::write_heatmap_csv(path, &heatmap)?;
            }
        }
    }

    Ok(())
}

fn handle_map(args: MapArgs) -> Result<(), AppError> {
    let config = reference_config_from_args(&args.reference, None);
    let store = ReferenceStore::load(&config)?;

    let mut map = canton_map(&store, args.energy_type);
    if let Some(n) = args.top {
        map.keep_top(n);
    }
    println!("{}", crate::report::format_canton_map(&map));

    if let Some(path) = &args.export {
        crate::io::write_rows_csv(path, &map.cells)?;
    }
    Ok(())
}

fn handle_treemap(args: TreemapArgs) -> Result<(), AppError> {
    let config = reference_config_from_args(&args.reference, Some(args.year));
    let store = ReferenceStore::load(&config)?;

    let sources: Vec<EnergyType> = if args.sources.is_empty() {
        EnergyType::SOURCES.to_vec()
    } else {
        args.sources.clone()
    };
    let year = store.default_year();
    let rows = treemap(&store, year, &sources, args.per_capita);
    println!("{}", crate::report::format_treemap(&rows, year, args.per_capita));

    if let Some(path) = &args.export {
        crate::io::write_rows_csv(path, &rows)?;
    }
    Ok(())
}

/// Build the feed query for `energy power`.
///
/// `now` anchors the default range (today, in `offset`).
pub fn power_query_from_args(
    args: &PowerArgs,
    offset: FixedOffset,
    now: DateTime<Utc>,
) -> Result<QuerySignature, AppError> {
    let start = match &args.start {
        Some(raw) => parse_instant(raw, offset)?,
        None => local_midnight(now.with_timezone(&offset).date_naive(), offset)?,
    };
    let end = match &args.end {
        Some(raw) => parse_instant(raw, offset)?,
        None => start + chrono::Duration::days(1),
    };

    let categories: Vec<String> = if args.all_types {
        Vec::new()
    } else if args.types.is_empty() {
        DEFAULT_CATEGORIES.iter().map(|c| c.to_string()).collect()
    } else {
        args.types
            .iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect()
    };

    let query = QuerySignature::new(start, end, categories);
    query.validate()?;
    Ok(query)
}

pub fn reference_config_from_args(args: &ReferenceArgs, year: Option<i32>) -> ReferenceConfig {
    let mut config = ReferenceConfig::from_env();
    if let Some(path) = &args.data {
        config.production_csv = path.clone();
    }
    if let Some(path) = &args.population {
        config.population_json = path.clone();
    }
    if let Some(year) = year {
        config.year = year;
    }
    config
}

fn parse_offset(raw: &str) -> Result<FixedOffset, AppError> {
    raw.trim()
        .parse::<FixedOffset>()
        .map_err(|e| AppError::new(EXIT_INPUT, format!("Invalid UTC offset '{raw}': {e}")))
}

/// Accepts RFC 3339, `YYYY-MM-DDTHH:MM` or a plain date (midnight in `offset`).
fn parse_instant(raw: &str, offset: FixedOffset) -> Result<DateTime<FixedOffset>, AppError> {
    let s = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt);
    }
    if let Ok(ndt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M") {
        return offset
            .from_local_datetime(&ndt)
            .single()
            .ok_or_else(|| AppError::new(EXIT_INPUT, format!("Ambiguous time '{raw}'.")));
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return local_midnight(date, offset);
    }
    Err(AppError::new(
        EXIT_INPUT,
        format!("Invalid date '{raw}'. Expected YYYY-MM-DD, YYYY-MM-DDTHH:MM or RFC 3339."),
    ))
}

fn local_midnight(date: NaiveDate, offset: FixedOffset) -> Result<DateTime<FixedOffset>, AppError> {
    offset
        .from_local_datetime(&date.and_time(NaiveTime::MIN))
        .single()
        .ok_or_else(|| AppError::new(EXIT_INPUT, format!("Invalid date '{date}'.")))
}

/// Rewrite argv so `energy` defaults to `energy power`.
///
/// Rules:
/// - `energy`                         -> `energy power`
/// - `energy --start 2024-01-01 ...`  -> `energy power --start 2024-01-01 ...`
/// - `energy --help/--version/-h`     -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("power".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(
        arg1.as_str(),
        "-h" | "--help" | "-V" | "--version" | "help"
    );
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(arg1.as_str(), "power" | "map" | "treemap");
    if is_subcommand {
        return argv;
    }

    // If the first token is a flag, treat it as "power flags".
    if arg1.starts_with('-') {
        argv.insert(1, "power".to_string());
        return argv;
    }

    argv
}
