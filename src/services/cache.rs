use crate::domain::{CacheEntry, StockRecord};
use crate::error::{Result, StockError};
use crate::services::aggregation::{Aggregator, TableMemo};
use chrono::{DateTime, Local};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;
use tracing::{debug, error, info};

#[derive(Debug, Clone)]
pub struct CachedResult {
    pub records: Vec<StockRecord>,
    pub from_cache: bool,
}

#[derive(Debug, Clone)]
pub struct CacheStatus {
    pub is_loading: bool,
    pub cached_thresholds: Vec<usize>,
    pub last_updated: Option<DateTime<Local>>,
    pub cache_size: usize,
}

/// Clears the loading flag when a refresh ends, however it ends.
struct LoadingGuard<'a>(&'a AtomicBool);

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Threshold results kept in process memory.
pub struct ResultCache {
    aggregator: Aggregator,
    prefetch: Vec<usize>,
    entries: RwLock<BTreeMap<usize, CacheEntry>>,
    last_updated: RwLock<Option<DateTime<Local>>>,
    is_loading: AtomicBool,
}

impl ResultCache {
    pub fn new(aggregator: Aggregator, prefetch: Vec<usize>) -> Self {
        Self {
            aggregator,
            prefetch,
            entries: RwLock::new(BTreeMap::new()),
            last_updated: RwLock::new(None),
            is_loading: AtomicBool::new(false),
        }
    }

    pub fn aggregator(&self) -> &Aggregator {
        &self.aggregator
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading.load(Ordering::SeqCst)
    }

    /// Recomputes every prefetch threshold, scraping each strategy once.
    /// Returns `false` without doing anything if a refresh is already running.
    pub async fn refresh_all(&self) -> bool {
        if self
            .is_loading
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            info!("Cache refresh already in progress, skipping");
            return false;
        }
        let _guard = LoadingGuard(&self.is_loading);

        info!("Starting background data fetch...");
        let mut memo = TableMemo::new();

        for &threshold in &self.prefetch {
            info!("Fetching stocks for {}+ strategies...", threshold);
            match self
                .aggregator
                .threshold_stocks_with(threshold, &mut memo)
                .await
            {
                Ok(records) if !records.is_empty() => {
                    info!(
                        "Cached {} stocks for {}+ strategies",
                        records.len(),
                        threshold
                    );
                    self.entries
                        .write()
                        .await
                        .insert(threshold, CacheEntry::new(records));
                }
                Ok(_) => info!("No stocks found in {}+ strategies", threshold),
                Err(e) => error!(
                    "Background fetch error for {}+ strategies: {}",
                    threshold, e
                ),
            }
        }

        *self.last_updated.write().await = Some(Local::now());
        info!("Background fetch completed ({} strategies scraped)", memo.len());
        true
    }

    /// Cached records for `threshold`, computing and storing them on a miss.
    pub async fn get(&self, threshold: usize) -> Result<CachedResult> {
        if threshold < 2 {
            return Err(StockError::InvalidArgument(
                "Minimum strategies must be at least 2".to_string(),
            ));
        }

        if let Some(entry) = self.entries.read().await.get(&threshold) {
            debug!(
                "Serving {}+ strategies from cache (updated {})",
                threshold,
                entry.updated_at.format("%Y-%m-%d %H:%M:%S")
            );
            return Ok(CachedResult {
                records: entry.records.clone(),
                from_cache: true,
            });
        }

        info!("Fetching fresh data for {}+ strategies...", threshold);
        let records = self.aggregator.threshold_stocks(threshold).await?;
        if !records.is_empty() {
            self.entries
                .write()
                .await
                .insert(threshold, CacheEntry::new(records.clone()));
        }

        Ok(CachedResult {
            records,
            from_cache: false,
        })
    }

    pub async fn status(&self) -> CacheStatus {
        let entries = self.entries.read().await;
        CacheStatus {
            is_loading: self.is_loading(),
            cached_thresholds: entries.keys().copied().collect(),
            last_updated: *self.last_updated.read().await,
            cache_size: entries.len(),
        }
    }
}
