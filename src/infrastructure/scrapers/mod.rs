use crate::domain::ScrapedStock;
use crate::error::Result;
use scraper::{ElementRef, Html};

pub(crate) mod pagination;
pub(crate) mod screener_table;

pub trait TableScraper: Send + Sync {
    /// Extracts the `(name, price)` rows of one page. A page without usable
    /// rows is reported as [`crate::error::StockError::Parse`].
    fn extract_rows(&self, document: &Html) -> Result<Vec<ScrapedStock>>;
}

/// Text of an element with every text node trimmed and empty nodes dropped,
/// so `CMP <span>Rs.</span>` reads as `CMPRs.`.
pub fn stripped_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect()
}
