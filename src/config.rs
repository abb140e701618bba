//! Runtime configuration.
//!
//! Values come from the environment (a `.env` file is honoured via `dotenvy`).
//! CLI flags override the reference file paths and the target year.

use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{AppError, EXIT_INPUT};

pub const DEFAULT_BASE_URL: &str = "https://api.energy-charts.info/";
pub const DEFAULT_COUNTRY: &str = "ch";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CACHE_CAPACITY: usize = 64;
pub const DEFAULT_PRODUCTION_CSV: &str = "./data/energyreporter_municipality_historized.csv";
pub const DEFAULT_POPULATION_JSON: &str = "./data/canton_population_2022.json";
pub const DEFAULT_REFERENCE_YEAR: i32 = 2022;

/// Upstream feed and cache settings.
#[derive(Debug, Clone)]
pub struct FeedConfig {
    /// Base URL, with trailing slash; the endpoint name is appended.
    pub base_url: String,
    pub country: String,
    pub timeout: Duration,
    pub cache_capacity: NonZeroUsize,
    /// Entries older than this are refetched. `None` keeps them until evicted.
    pub cache_ttl: Option<Duration>,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            country: DEFAULT_COUNTRY.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            cache_capacity: NonZeroUsize::new(DEFAULT_CACHE_CAPACITY).unwrap_or(NonZeroUsize::MIN),
            cache_ttl: None,
        }
    }
}

impl FeedConfig {
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let mut config = Self::default();

        if let Some(url) = lookup("ENERGY_CHARTS_BASE_URL") {
            config.base_url = if url.ends_with('/') { url } else { format!("{url}/") };
        }
        if let Some(country) = lookup("ENERGY_CHARTS_COUNTRY") {
            config.country = country.trim().to_ascii_lowercase();
        }
        if let Some(secs) = parse_env::<u64>(&lookup, "ENERGY_CHARTS_TIMEOUT_SECS")? {
            config.timeout = Duration::from_secs(secs);
        }
        if let Some(cap) = parse_env::<usize>(&lookup, "ENERGY_CACHE_CAPACITY")? {
            config.cache_capacity = NonZeroUsize::new(cap)
                .ok_or_else(|| AppError::new(EXIT_INPUT, "ENERGY_CACHE_CAPACITY must be > 0."))?;
        }
        if let Some(secs) = parse_env::<u64>(&lookup, "ENERGY_CACHE_TTL_SECS")? {
            config.cache_ttl = Some(Duration::from_secs(secs));
        }

        Ok(config)
    }
}

/// Locations of the static reference files.
#[derive(Debug, Clone)]
pub struct ReferenceConfig {
    pub production_csv: PathBuf,
    pub population_json: PathBuf,
    pub year: i32,
}

impl Default for ReferenceConfig {
    fn default() -> Self {
        Self {
            production_csv: PathBuf::from(DEFAULT_PRODUCTION_CSV),
            population_json: PathBuf::from(DEFAULT_POPULATION_JSON),
            year: DEFAULT_REFERENCE_YEAR,
        }
    }
}

impl ReferenceConfig {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        let mut config = Self::default();
        if let Ok(path) = std::env::var("ENERGY_PRODUCTION_CSV") {
            config.production_csv = PathBuf::from(path);
        }
        if let Ok(path) = std::env::var("ENERGY_POPULATION_JSON") {
            config.population_json = PathBuf::from(path);
        }
        config
    }
}

fn parse_env<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let Some(raw) = lookup(key) else {
        return Ok(None);
    };
    raw.trim()
        .parse::<T>()
        .map(Some)
        .map_err(|e| AppError::new(EXIT_INPUT, format!("Invalid {key}='{raw}': {e}")))
}
