use super::{stripped_text, TableScraper};
use crate::domain::{ScrapedStock, MISSING_PRICE};
use crate::error::{Result, StockError};
use once_cell::sync::Lazy;
use rustc_hash::FxHashSet;
use scraper::{ElementRef, Html, Selector};

static TABLE: Lazy<Selector> = Lazy::new(|| Selector::parse("table").unwrap());
static THEAD: Lazy<Selector> = Lazy::new(|| Selector::parse("thead").unwrap());
static ROW: Lazy<Selector> = Lazy::new(|| Selector::parse("tr").unwrap());
static BODY_ROW: Lazy<Selector> = Lazy::new(|| Selector::parse("tbody tr").unwrap());
static CELL: Lazy<Selector> = Lazy::new(|| Selector::parse("th, td").unwrap());

pub const NAME_COLUMN: &str = "Name";
pub const PRICE_COLUMN: &str = "CMPRs.";
const SERIAL_COLUMN: &str = "S.No.";

/// First-cell values of header rows repeated inside the table body.
const HEADER_LITERALS: [&str; 2] = [NAME_COLUMN, SERIAL_COLUMN];
/// Second-cell values of header or filler rows.
const PRICE_PLACEHOLDERS: [&str; 3] = ["......", "CMPRs.", "CMP Rs."];

/// Extracts the result table of a screener page.
pub struct ScreenerTableScraper;

impl ScreenerTableScraper {
    fn headers(table: ElementRef<'_>) -> Vec<String> {
        let header_row = table
            .select(&THEAD)
            .next()
            .or_else(|| table.select(&ROW).next());

        header_row
            .map(|row| {
                row.select(&CELL)
                    .map(stripped_text)
                    .filter(|text| !text.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }

    // The HTML parser always synthesizes a <tbody>, so the header section
    // decides the layout: with a <thead> every body row is data, without one
    // the first row held the headers and is skipped.
    fn data_rows(table: ElementRef<'_>) -> Vec<ElementRef<'_>> {
        if table.select(&THEAD).next().is_some() {
            table.select(&BODY_ROW).collect()
        } else {
            table.select(&ROW).skip(1).collect()
        }
    }

    fn is_data_row(cells: &[String], header_count: usize) -> bool {
        if cells.len() != header_count {
            return false;
        }
        let Some(first) = cells.first() else {
            return false;
        };
        if first.is_empty() || HEADER_LITERALS.contains(&first.as_str()) {
            return false;
        }
        match cells.get(1) {
            Some(second) => !PRICE_PLACEHOLDERS.contains(&second.as_str()),
            None => true,
        }
    }
}

impl TableScraper for ScreenerTableScraper {
    fn extract_rows(&self, document: &Html) -> Result<Vec<ScrapedStock>> {
        let table = document
            .select(&TABLE)
            .next()
            .ok_or_else(|| StockError::Parse("no table on page".to_string()))?;

        let headers = Self::headers(table);
        if headers.is_empty() {
            return Err(StockError::Parse("table has no headers".to_string()));
        }

        let rows: Vec<Vec<String>> = Self::data_rows(table)
            .into_iter()
            .map(|tr| tr.select(&CELL).map(stripped_text).collect::<Vec<_>>())
            .filter(|cells| Self::is_data_row(cells, headers.len()))
            .collect();

        // Only the name and price columns survive, which also drops S.No.
        let name_idx = headers
            .iter()
            .position(|h| h == NAME_COLUMN)
            .ok_or_else(|| StockError::Parse(format!("no {} column", NAME_COLUMN)))?;
        let price_idx = headers.iter().position(|h| h == PRICE_COLUMN);

        let mut seen = FxHashSet::default();
        let mut stocks = Vec::new();

        for cells in rows {
            let name = cells[name_idx].trim();
            if name.is_empty() || HEADER_LITERALS.contains(&name) {
                continue;
            }
            if !seen.insert(name.to_string()) {
                continue;
            }

            let price = price_idx
                .map(|idx| cells[idx].clone())
                .unwrap_or_else(|| MISSING_PRICE.to_string());
            stocks.push(ScrapedStock::new(name, price));
        }

        if stocks.is_empty() {
            return Err(StockError::Parse("table has no data rows".to_string()));
        }

        Ok(stocks)
    }
}
