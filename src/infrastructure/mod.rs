mod clients;
mod scrapers;

pub use clients::page_fetcher::{PageFetcher, PageSource};
pub use scrapers::{
    pagination::{has_next_page, page_url},
    screener_table::ScreenerTableScraper,
    TableScraper,
};
