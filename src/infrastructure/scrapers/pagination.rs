use super::stripped_text;
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use url::Url;

static PAGINATION: Lazy<Selector> = Lazy::new(|| Selector::parse("div.pagination").unwrap());
static LINK: Lazy<Selector> = Lazy::new(|| Selector::parse("a").unwrap());

/// URL of page `page` of a screen, keeping any query pairs already present.
pub fn page_url(base: &Url, page: u32) -> Url {
    let mut url = base.clone();
    url.query_pairs_mut().append_pair("page", &page.to_string());
    url
}

/// True when the first pagination container holds a link labelled "next".
pub fn has_next_page(document: &Html) -> bool {
    let Some(pagination) = document.select(&PAGINATION).next() else {
        return false;
    };

    pagination
        .select(&LINK)
        .any(|link| stripped_text(link).to_lowercase().starts_with("next"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page_of(base: &str, page: u32) -> String {
        page_url(&Url::parse(base).unwrap(), page).to_string()
    }

    #[test]
    fn page_url_appends_the_page_pair() {
        assert_eq!(
            page_of("https://www.screener.in/screens/1/s/", 2),
            "https://www.screener.in/screens/1/s/?page=2"
        );
        assert_eq!(
            page_of("https://www.screener.in/screens/1/s/?sort=name", 3),
            "https://www.screener.in/screens/1/s/?sort=name&page=3"
        );
    }

    #[test]
    fn detects_next_link() {
        let html = Html::parse_document(
            r#"<div class="pagination"><a href="?page=1">1</a><a href="?page=2"> Next <span>&raquo;</span></a></div>"#,
        );
        assert!(has_next_page(&html));
    }

    #[test]
    fn next_match_is_case_insensitive() {
        let html = Html::parse_document(
            r#"<div class="pagination"><a href="?page=4">NEXT</a></div>"#,
        );
        assert!(has_next_page(&html));
    }

    #[test]
    fn ignores_next_links_outside_pagination() {
        let html = Html::parse_document(
            r#"<a href="?page=2">Next</a><div class="pagination"><a href="?page=1">Previous</a></div>"#,
        );
        assert!(!has_next_page(&html));
    }

    #[test]
    fn no_pagination_means_last_page() {
        let html = Html::parse_document("<table><tr><td>x</td></tr></table>");
        assert!(!has_next_page(&html));
    }
}
