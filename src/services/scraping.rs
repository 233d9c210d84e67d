use crate::domain::{ScrapedStock, StrategyRegistry, StrategyTable};
use crate::error::{Result, StockError};
use crate::infrastructure::{
    has_next_page, page_url, PageSource, ScreenerTableScraper, TableScraper,
};
use async_trait::async_trait;
use scraper::Html;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use url::Url;
use tracing::{error, info, warn};

/// Supplies the scraped table of one strategy. Failures surface as an empty
/// table so that aggregation can carry on with the strategies that worked.
#[async_trait]
pub trait StrategySource: Send + Sync {
    async fn strategy_table(&self, strategy_id: &str) -> StrategyTable;
}

struct ParsedPage {
    rows: Result<Vec<ScrapedStock>>,
    has_next: bool,
}

pub struct ScrapingService {
    registry: Arc<StrategyRegistry>,
    pages: Arc<dyn PageSource>,
    table_scraper: Box<dyn TableScraper>,
    page_delay: Duration,
}

impl ScrapingService {
    pub fn new(
        registry: Arc<StrategyRegistry>,
        pages: Arc<dyn PageSource>,
        page_delay: Duration,
    ) -> Self {
        info!("Created new Scraping service");
        Self {
            registry,
            pages,
            table_scraper: Box::new(ScreenerTableScraper),
            page_delay,
        }
    }

    // `Html` is not `Send`, so parsing stays out of the async state machine.
    fn parse_page(&self, body: &str) -> ParsedPage {
        let document = Html::parse_document(body);
        ParsedPage {
            rows: self.table_scraper.extract_rows(&document),
            has_next: has_next_page(&document),
        }
    }

    /// Walks `?page=1, 2, ...` of a screen until a page has no rows or no
    /// "next" link, returning every page's rows in order.
    pub async fn scrape(&self, base_url: &str) -> Vec<ScrapedStock> {
        info!("Starting to scrape: {}", base_url);

        let base = match Url::parse(base_url) {
            Ok(base) => base,
            Err(e) => {
                error!("{}", StockError::from(e));
                return Vec::new();
            }
        };

        let mut all_rows = Vec::new();
        let mut page = 1;

        loop {
            let url = page_url(&base, page);

            let body = match self.pages.fetch(url.as_str()).await {
                Ok(body) => body,
                Err(e) => {
                    error!("{}", e);
                    break;
                }
            };

            let parsed = self.parse_page(&body);
            let rows = match parsed.rows {
                Ok(rows) => rows,
                Err(e) => {
                    info!("No data found on page {} ({})", page, e);
                    break;
                }
            };

            info!("Scraped page {}: {} records", page, rows.len());
            all_rows.extend(rows);

            if !parsed.has_next {
                info!("No more pages found. Stopping at page {}", page);
                break;
            }

            page += 1;
            sleep(self.page_delay).await;
        }

        if all_rows.is_empty() {
            warn!("No data scraped from {}", base_url);
        } else {
            info!(
                "Successfully scraped {} total records from {}",
                all_rows.len(),
                base_url
            );
        }

        all_rows
    }
}

#[async_trait]
impl StrategySource for ScrapingService {
    async fn strategy_table(&self, strategy_id: &str) -> StrategyTable {
        let strategy = match self.registry.lookup(strategy_id) {
            Ok(strategy) => strategy,
            Err(e) => {
                error!("{}", e);
                return StrategyTable::empty(strategy_id);
            }
        };

        let table = StrategyTable::new(strategy_id, self.scrape(&strategy.source_url).await);
        info!("{} yielded {} rows", strategy.display_name, table.len());
        table
    }
}
