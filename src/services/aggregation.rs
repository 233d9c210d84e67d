use crate::domain::{StockRecord, StrategyRegistry, StrategyTable};
use crate::error::{Result, StockError};
use crate::services::scraping::StrategySource;
use rustc_hash::{FxHashMap, FxHashSet};
use std::sync::Arc;
use tracing::{info, warn};

/// Strategy tables already scraped during one refresh cycle.
#[derive(Debug, Default)]
pub struct TableMemo {
    tables: FxHashMap<String, StrategyTable>,
}

impl TableMemo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }
}

pub struct Aggregator {
    registry: Arc<StrategyRegistry>,
    source: Arc<dyn StrategySource>,
}

impl Aggregator {
    pub fn new(registry: Arc<StrategyRegistry>, source: Arc<dyn StrategySource>) -> Self {
        info!("Created new Aggregator");
        Self { registry, source }
    }

    pub fn registry(&self) -> &StrategyRegistry {
        &self.registry
    }

    async fn table(&self, strategy_id: &str, memo: &mut TableMemo) -> StrategyTable {
        if let Some(table) = memo.tables.get(strategy_id) {
            info!("Using cached data for {}", strategy_id);
            return table.clone();
        }

        let table = self.source.strategy_table(strategy_id).await;
        memo.tables.insert(strategy_id.to_string(), table.clone());
        table
    }

    /// Tables of `ids` that produced data, in the given order.
    async fn tables_with_data(&self, ids: &[String], memo: &mut TableMemo) -> Vec<StrategyTable> {
        let mut tables = Vec::with_capacity(ids.len());
        for id in ids {
            let table = self.table(id, memo).await;
            if table.is_empty() {
                warn!("Strategy {} returned no data", id);
            } else {
                tables.push(table);
            }
        }
        tables
    }

    /// Stocks present in every selected strategy, sorted by name. A single
    /// selection returns that strategy's whole table. Repeated ids are scraped
    /// once, so a selection naming one strategy twice has fewer than two
    /// tables and yields nothing.
    pub async fn intersect_strategies(&self, selected: &[String]) -> Vec<StockRecord> {
        let mut ids: Vec<String> = Vec::with_capacity(selected.len());
        for id in selected {
            if !ids.contains(id) {
                ids.push(id.clone());
            }
        }

        let mut memo = TableMemo::new();

        match selected {
            [] => Vec::new(),
            [single] => {
                info!("Getting all stocks from {}", single);
                let table = self.table(single, &mut memo).await;
                let records = single_strategy_records(&table, &self.registry);
                info!("Found {} stocks in {}", records.len(), single);
                records
            }
            _ => {
                info!("Finding common stocks in strategies: {:?}", ids);
                let tables = self.tables_with_data(&ids, &mut memo).await;
                if tables.len() < selected.len() {
                    warn!("Some strategies returned no data");
                }
                let records = intersect_tables(&tables, &self.registry);
                info!("Found {} common stocks", records.len());
                records
            }
        }
    }

    pub async fn threshold_stocks(&self, min_strategies: usize) -> Result<Vec<StockRecord>> {
        let mut memo = TableMemo::new();
        self.threshold_stocks_with(min_strategies, &mut memo).await
    }

    /// Stocks found in at least `min_strategies` registered strategies,
    /// reusing (and filling) `memo` for the strategy tables.
    pub async fn threshold_stocks_with(
        &self,
        min_strategies: usize,
        memo: &mut TableMemo,
    ) -> Result<Vec<StockRecord>> {
        if min_strategies < 2 {
            return Err(StockError::InvalidArgument(
                "Minimum strategies must be at least 2".to_string(),
            ));
        }

        info!(
            "Finding stocks that appear in at least {} strategies",
            min_strategies
        );

        let tables = self.tables_with_data(&self.registry.ids(), memo).await;
        info!("Successfully fetched data for {} strategies", tables.len());

        if tables.len() < min_strategies {
            warn!(
                "Only {} strategies available, need at least {}",
                tables.len(),
                min_strategies
            );
            return Ok(Vec::new());
        }

        let records = threshold_records(&tables, min_strategies, &self.registry);
        info!(
            "Found {} stocks in {}+ strategies",
            records.len(),
            min_strategies
        );
        Ok(records)
    }
}

fn single_strategy_records(table: &StrategyTable, registry: &StrategyRegistry) -> Vec<StockRecord> {
    let label = registry.short_label(&table.strategy_id);
    let mut seen = FxHashSet::default();

    table
        .rows
        .iter()
        .filter(|row| seen.insert(row.name.trim()))
        .map(|row| {
            StockRecord::new(
                row.name.trim().to_string(),
                row.price.clone(),
                vec![label.clone()],
            )
        })
        .collect()
}

/// Names common to every table; the price comes from the first table.
pub fn intersect_tables(tables: &[StrategyTable], registry: &StrategyRegistry) -> Vec<StockRecord> {
    let Some((first, rest)) = tables.split_first() else {
        return Vec::new();
    };
    if rest.is_empty() {
        return Vec::new();
    }

    let others: Vec<FxHashSet<&str>> = rest
        .iter()
        .map(|table| table.trimmed_names().collect())
        .collect();
    let labels: Vec<String> = tables
        .iter()
        .map(|table| registry.short_label(&table.strategy_id))
        .collect();

    let mut seen = FxHashSet::default();
    let mut records: Vec<StockRecord> = first
        .rows
        .iter()
        .filter(|row| {
            let name = row.name.trim();
            others.iter().all(|names| names.contains(name)) && seen.insert(name)
        })
        .map(|row| StockRecord::new(row.name.trim().to_string(), row.price.clone(), labels.clone()))
        .collect();

    records.sort_by(|a, b| a.name.cmp(&b.name));
    records
}

/// Names present in at least `min_strategies` tables, most shared first.
pub fn threshold_records(
    tables: &[StrategyTable],
    min_strategies: usize,
    registry: &StrategyRegistry,
) -> Vec<StockRecord> {
    // name -> indices of the tables containing it, in table order
    let mut order: Vec<&str> = Vec::new();
    let mut membership: FxHashMap<&str, Vec<usize>> = FxHashMap::default();

    for (idx, table) in tables.iter().enumerate() {
        for name in table.trimmed_names() {
            let members = membership.entry(name).or_insert_with(|| {
                order.push(name);
                Vec::new()
            });
            if members.last() != Some(&idx) {
                members.push(idx);
            }
        }
    }

    let mut records: Vec<StockRecord> = order
        .into_iter()
        .filter_map(|name| {
            let members = &membership[name];
            if members.len() < min_strategies {
                return None;
            }
            let row = members.iter().find_map(|&idx| tables[idx].find(name))?;
            let labels = members
                .iter()
                .map(|&idx| registry.short_label(&tables[idx].strategy_id))
                .collect();
            Some(StockRecord::new(name.to_string(), row.price.clone(), labels))
        })
        .collect();

    records.sort_by(|a, b| {
        b.strategy_count
            .cmp(&a.strategy_count)
            .then_with(|| a.name.cmp(&b.name))
    });
    records
}
