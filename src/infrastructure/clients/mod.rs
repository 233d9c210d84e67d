pub(crate) mod page_fetcher;
