pub(crate) mod aggregation;
pub(crate) mod cache;
pub(crate) mod scheduler;
pub(crate) mod scraping;

pub use aggregation::Aggregator;
pub use cache::{CacheStatus, CachedResult, ResultCache};
pub use scheduler::{RefreshHandle, RefreshScheduler};
pub use scraping::{ScrapingService, StrategySource};
