//! Service objects shared by every front-end.
//!
//! `ProductionService` owns the feed and its cache; `ReferenceStore` owns the
//! static files. Both are built once at start-up and passed to whatever needs
//! them, so tests can run several independent instances side by side.
//!
//! Each function here answers one chart and returns a table, never a chart.

use std::sync::Arc;

use crate::aggregate::{
    MAP_ZERO_EPSILON, bar_ranking, map_values, pivot_time_by_category, substitute_zero, sum_by_category,
    sum_by_region, treemap_rows,
};
use crate::config::FeedConfig;
use crate::data::{FeedClient, FeedSource, QueryCache, ReferenceStore};
use crate::domain::{
    BarRow, CategoryTotal, EnergyType, Heatmap, MapCell, ProductionTable, QuerySignature, TreemapRow,
};
use crate::error::FeedError;

pub struct ProductionService<S> {
    cache: QueryCache<S>,
}

impl ProductionService<FeedClient> {
    pub fn from_config(config: &FeedConfig) -> Result<Self, FeedError> {
        let client = FeedClient::new(config)?;
        Ok(Self::new(QueryCache::from_config(client, config)))
    }
}

impl<S: FeedSource> ProductionService<S> {
    pub fn new(cache: QueryCache<S>) -> Self {
        Self { cache }
    }

    pub fn cache(&self) -> &QueryCache<S> {
        &self.cache
    }

    /// Raw rows for the bar and line charts.
    pub fn series(&self, query: &QuerySignature) -> Result<Arc<ProductionTable>, FeedError> {
        self.cache.get_or_fetch(query)
    }

    /// Total per category for the pie chart.
    pub fn share(&self, query: &QuerySignature) -> Result<Vec<CategoryTotal>, FeedError> {
        let table = self.cache.get_or_fetch(query)?;
        Ok(sum_by_category(&table))
    }

    pub fn heatmap(&self, query: &QuerySignature) -> Result<Heatmap, FeedError> {
        let table = self.cache.get_or_fetch(query)?;
        Ok(pivot_time_by_category(&table))
    }
}

/// Map colouring plus the matching bar ranking for one energy type.
#[derive(Debug, Clone)]
pub struct CantonMap {
    pub energy_type: EnergyType,
    pub cells: Vec<MapCell>,
    pub ranking: Vec<BarRow>,
}

impl CantonMap {
    /// Keep only the `n` largest producers in the ranking (still ascending).
    pub fn keep_top(&mut self, n: usize) {
        let skip = self.ranking.len().saturating_sub(n);
        self.ranking.drain(..skip);
    }
}

/// Canton map over every year in the production file.
pub fn canton_map(store: &ReferenceStore, energy_type: EnergyType) -> CantonMap {
    let totals = sum_by_region(store.records());
    let mut cells = map_values(&totals, energy_type);
    substitute_zero(&mut cells, MAP_ZERO_EPSILON);
    CantonMap {
        energy_type,
        cells,
        ranking: bar_ranking(&totals, energy_type),
    }
}

/// Treemap rows (canton -> source) for one year.
pub fn treemap(store: &ReferenceStore, year: i32, sources: &[EnergyType], per_capita: bool) -> Vec<TreemapRow> {
    let table = store.table_for_year(year);
    treemap_rows(&table, sources, per_capita)
}
