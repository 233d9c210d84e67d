use crate::services::cache::ResultCache;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Cloneable handle that asks the background worker for a refresh.
#[derive(Clone)]
pub struct RefreshHandle {
    sender: mpsc::Sender<()>,
    cache: Arc<ResultCache>,
}

impl RefreshHandle {
    pub fn new(sender: mpsc::Sender<()>, cache: Arc<ResultCache>) -> Self {
        Self { sender, cache }
    }

    /// Queues a refresh. Returns `false` when one is already running or queued.
    pub fn trigger(&self) -> bool {
        if self.cache.is_loading() {
            return false;
        }
        self.sender.try_send(()).is_ok()
    }
}

/// Runs refreshes on a single background worker, fed by a periodic ticker and
/// by manual triggers. Both tasks stop on [`RefreshScheduler::shutdown`].
pub struct RefreshScheduler {
    handle: RefreshHandle,
    cancel: CancellationToken,
}

impl RefreshScheduler {
    /// Spawns the worker and the ticker and queues the initial refresh.
    pub fn start(cache: Arc<ResultCache>, every: Duration) -> Self {
        let (sender, receiver) = mpsc::channel(1);
        let cancel = CancellationToken::new();

        let handle = RefreshHandle::new(sender, cache.clone());

        tokio::spawn(run_worker(cache, receiver, cancel.clone()));
        tokio::spawn(run_ticker(handle.clone(), every, cancel.clone()));
        info!("Started periodic cache refresh (every {:?})", every);

        if !handle.trigger() {
            warn!("Initial cache refresh could not be queued");
        }

        Self { handle, cancel }
    }

    pub fn handle(&self) -> RefreshHandle {
        self.handle.clone()
    }

    pub fn shutdown(&self) {
        info!("Stopping cache refresh scheduler");
        self.cancel.cancel();
    }
}

async fn run_worker(
    cache: Arc<ResultCache>,
    mut receiver: mpsc::Receiver<()>,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            request = receiver.recv() => match request {
                Some(()) => {
                    cache.refresh_all().await;
                }
                None => break,
            },
        }
    }
    info!("Cache refresh worker stopped");
}

async fn run_ticker(handle: RefreshHandle, every: Duration, cancel: CancellationToken) {
    let mut ticker = interval_at(Instant::now() + every, every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {
                info!("Periodic cache refresh triggered");
                if !handle.trigger() {
                    warn!("Cache refresh already running or queued, skipping this tick");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ScrapedStock, StrategyDescriptor, StrategyRegistry, StrategyTable};
    use crate::services::aggregation::Aggregator;
    use crate::services::scraping::StrategySource;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingSource(AtomicUsize);

    #[async_trait]
    impl StrategySource for CountingSource {
        async fn strategy_table(&self, strategy_id: &str) -> StrategyTable {
            self.0.fetch_add(1, Ordering::SeqCst);
            StrategyTable::new(strategy_id, vec![ScrapedStock::new("TCS", "3900")])
        }
    }

    /// Takes `delay` of virtual time per strategy scrape.
    struct SlowSource {
        calls: AtomicUsize,
        delay: Duration,
    }

    #[async_trait]
    impl StrategySource for SlowSource {
        async fn strategy_table(&self, strategy_id: &str) -> StrategyTable {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            StrategyTable::new(strategy_id, vec![ScrapedStock::new("TCS", "3900")])
        }
    }

    fn cache(source: Arc<dyn StrategySource>) -> Arc<ResultCache> {
        let registry = StrategyRegistry::from_descriptors(vec![
            StrategyDescriptor::new("A", "https://screens.test/a/", "A", "SA"),
            StrategyDescriptor::new("B", "https://screens.test/b/", "B", "SB"),
        ]);
        Arc::new(ResultCache::new(
            Aggregator::new(Arc::new(registry), source),
            vec![2],
        ))
    }

    async fn wait_for_calls(source: &CountingSource, expected: usize) {
        while source.0.load(Ordering::SeqCst) < expected {
            tokio::time::sleep(Duration::from_secs(60)).await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn initial_and_periodic_refresh() {
        let source = Arc::new(CountingSource(AtomicUsize::new(0)));
        let cache = cache(source.clone());

        let scheduler = RefreshScheduler::start(cache.clone(), crate::config::REFRESH_INTERVAL);

        while cache.status().await.cached_thresholds.is_empty() {
            tokio::time::sleep(Duration::from_secs(60)).await;
        }
        assert_eq!(source.0.load(Ordering::SeqCst), 2);

        // the paused clock auto-advances to the three-hour tick
        wait_for_calls(&source, 4).await;

        scheduler.shutdown();
    }

    #[tokio::test(start_paused = true)]
    async fn tick_during_a_running_refresh_is_skipped() {
        let source = Arc::new(SlowSource {
            calls: AtomicUsize::new(0),
            delay: Duration::from_secs(20),
        });
        let cache = cache(source.clone());

        // the initial refresh runs from 0s to 40s, across the 30s tick
        let scheduler = RefreshScheduler::start(cache.clone(), Duration::from_secs(30));

        tokio::time::sleep(Duration::from_secs(55)).await;
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
        assert!(!cache.is_loading());

        // the 60s tick finds the cache idle and refreshes again
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(source.calls.load(Ordering::SeqCst), 3);
        assert!(cache.is_loading());

        scheduler.shutdown();
    }

    #[tokio::test]
    async fn trigger_is_refused_while_a_refresh_is_queued() {
        let source = Arc::new(CountingSource(AtomicUsize::new(0)));
        let cache = cache(source);
        let (sender, _receiver) = mpsc::channel(1);
        let handle = RefreshHandle::new(sender, cache);

        assert!(handle.trigger());
        assert!(!handle.trigger());
    }
}
