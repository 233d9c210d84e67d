mod stock;
mod strategy;

pub use stock::{CacheEntry, ScrapedStock, StockRecord, StrategyTable, MISSING_PRICE};
pub use strategy::{StrategyDescriptor, StrategyRegistry};
