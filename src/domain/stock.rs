use chrono::{DateTime, Local};
use serde::{Serialize, Serializer};

/// Price shown when a table carries no price column.
pub const MISSING_PRICE: &str = "-";

/// One `(name, price)` row as scraped from a strategy page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapedStock {
    pub name: String,
    pub price: String,
}

impl ScrapedStock {
    pub fn new(name: impl Into<String>, price: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            price: price.into(),
        }
    }
}

/// Every row scraped for one strategy, across all of its pages.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StrategyTable {
    pub strategy_id: String,
    pub rows: Vec<ScrapedStock>,
}

impl StrategyTable {
    pub fn new(strategy_id: impl Into<String>, rows: Vec<ScrapedStock>) -> Self {
        Self {
            strategy_id: strategy_id.into(),
            rows,
        }
    }

    pub fn empty(strategy_id: impl Into<String>) -> Self {
        Self::new(strategy_id, Vec::new())
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// First row whose trimmed name equals `name`.
    pub fn find(&self, name: &str) -> Option<&ScrapedStock> {
        self.rows.iter().find(|row| row.name.trim() == name)
    }

    pub fn trimmed_names(&self) -> impl Iterator<Item = &str> {
        self.rows.iter().map(|row| row.name.trim())
    }
}

/// A stock together with the strategies it was found in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StockRecord {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "CMPRs.")]
    pub price: String,
    #[serde(rename = "Strategies_Count")]
    pub strategy_count: usize,
    #[serde(rename = "Strategies", serialize_with = "join_labels")]
    pub strategies: Vec<String>,
}

impl StockRecord {
    pub fn new(name: String, price: String, strategies: Vec<String>) -> Self {
        Self {
            name,
            price,
            strategy_count: strategies.len(),
            strategies,
        }
    }
}

fn join_labels<S: Serializer>(labels: &[String], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&labels.join(", "))
}

#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub records: Vec<StockRecord>,
    pub updated_at: DateTime<Local>,
}

impl CacheEntry {
    pub fn new(records: Vec<StockRecord>) -> Self {
        Self {
            records,
            updated_at: Local::now(),
        }
    }
}
