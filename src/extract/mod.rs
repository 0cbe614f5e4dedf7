//! Selector-chain extraction of search results
//!
//! Extraction is pure over the HTML snapshot: the navigator hands over
//! rendered HTML and everything here is synchronous `scraper` work, so
//! each probe is testable in isolation. The first container selector
//! yielding at least one match is used for the page; per-field chains
//! win independently. Field-level failures degrade to empty strings and
//! never abort a page. When no container matches anything, the generic
//! link fallback takes over.

pub mod fallback;
pub mod selectors;

use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// One extracted search result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultItem {
    pub title: String,
    pub url: String,
    pub description: String,
    /// 1-based result page this item came from
    pub page: usize,
}

/// Everything the pagination engine needs from one rendered page
#[derive(Debug)]
pub struct PageScan {
    pub items: Vec<ResultItem>,
    pub stats_text: Option<String>,
    pub has_next: bool,
}

/// Parse and scan a rendered result page
///
/// `seen` is the URL set accumulated over prior pages of the same
/// attempt; duplicates are dropped silently. At most `limit` items are
/// returned for the page.
#[must_use]
pub fn scan_page(
    html: &str,
    page_number: usize,
    limit: usize,
    seen: &HashSet<String>,
) -> PageScan {
    let doc = Html::parse_document(html);
    PageScan {
        items: extract_results(&doc, page_number, limit, seen),
        stats_text: stats_text(&doc),
        has_next: next_page_available(&doc),
    }
}

/// Element text with whitespace collapsed
#[must_use]
pub(crate) fn normalized_text(element: ElementRef<'_>) -> String {
    let text: String = element.text().collect();
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// First selector in the chain yielding an element; its normalized text
fn first_text(container: ElementRef<'_>, chain: &[Selector]) -> Option<String> {
    chain
        .iter()
        .find_map(|sel| container.select(sel).next())
        .map(normalized_text)
}

/// First selector in the chain yielding an element carrying `attr`
fn first_attr(container: ElementRef<'_>, chain: &[Selector], attr: &str) -> Option<String> {
    chain.iter().find_map(|sel| {
        container
            .select(sel)
            .find_map(|el| el.value().attr(attr))
            .map(str::to_string)
    })
}

/// Extract results from a parsed page
///
/// Container selectors are tried in priority order; the first one with
/// at least one match is used exclusively for this page. When none
/// match, the generic link fallback is invoked instead.
#[must_use]
pub fn extract_results(
    doc: &Html,
    page_number: usize,
    limit: usize,
    seen: &HashSet<String>,
) -> Vec<ResultItem> {
    let containers: Vec<ElementRef> = selectors::RESULT_CONTAINERS
        .iter()
        .map(|sel| doc.select(sel).collect::<Vec<_>>())
        .find(|matches| !matches.is_empty())
        .unwrap_or_default();

    if containers.is_empty() {
        log::debug!("No container selector matched, using generic link fallback");
        return fallback::extract_from_links(doc, page_number, limit, seen);
    }
    log::debug!("Container chain matched {} results", containers.len());

    let mut results: Vec<ResultItem> = Vec::new();
    for container in containers {
        if results.len() >= limit {
            break;
        }

        // A result without a URL is not addressable; skip it. Missing
        // title or description degrade to empty strings instead.
        let Some(url) = first_attr(container, &selectors::LINKS, "href") else {
            continue;
        };
        if seen.contains(&url) || results.iter().any(|r| r.url == url) {
            continue;
        }

        let title = first_text(container, &selectors::TITLES).unwrap_or_default();
        let description = first_text(container, &selectors::DESCRIPTIONS).unwrap_or_default();

        results.push(ResultItem {
            title,
            url,
            description,
            page: page_number,
        });
    }

    results
}

/// Engine-reported statistics line from the first result page
#[must_use]
pub fn stats_text(doc: &Html) -> Option<String> {
    selectors::STATS
        .iter()
        .flat_map(|sel| doc.select(sel))
        .map(normalized_text)
        .find(|text| !text.is_empty())
}

/// Whether the page offers a next-page affordance
#[must_use]
pub fn next_page_available(doc: &Html) -> bool {
    selectors::NEXT_PAGE
        .iter()
        .any(|sel| doc.select(sel).next().is_some())
}

#[cfg(test)]
mod tests {
    use super::*;

    const RESULT_PAGE: &str = r#"
        <html><body>
            <div id="result-stats">About 1,000 results (0.42 seconds)</div>
            <div class="g">
                <div class="yuRUbf"><a href="http://example.com/one"><h3>One</h3></a></div>
                <div class="VwiC3b">First description</div>
            </div>
            <div class="g">
                <a href="http://example.com/two"><h3>Two</h3></a>
            </div>
            <div class="g">
                <span>No link in this container</span>
            </div>
            <a id="pnnext" href="/search?q=x&start=10"><span>Next</span></a>
        </body></html>
    "#;

    #[test]
    fn test_container_chain_extraction() {
        let doc = Html::parse_document(RESULT_PAGE);
        let results = extract_results(&doc, 1, 10, &HashSet::new());
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].title, "One");
        assert_eq!(results[0].url, "http://example.com/one");
        assert_eq!(results[0].description, "First description");
        assert_eq!(results[0].page, 1);
    }

    #[test]
    fn test_missing_description_degrades_to_empty() {
        let doc = Html::parse_document(RESULT_PAGE);
        let results = extract_results(&doc, 1, 10, &HashSet::new());
        assert_eq!(results[1].title, "Two");
        assert_eq!(results[1].description, "");
    }

    #[test]
    fn test_linkless_container_skipped() {
        let doc = Html::parse_document(RESULT_PAGE);
        let results = extract_results(&doc, 1, 10, &HashSet::new());
        assert!(results.iter().all(|r| !r.url.is_empty()));
    }

    #[test]
    fn test_per_page_limit() {
        let doc = Html::parse_document(RESULT_PAGE);
        let results = extract_results(&doc, 1, 1, &HashSet::new());
        assert_eq!(results.len(), 1);
    }

    #[test]
    fn test_seen_urls_dropped() {
        let doc = Html::parse_document(RESULT_PAGE);
        let seen: HashSet<String> = ["http://example.com/one".to_string()].into();
        let results = extract_results(&doc, 2, 10, &seen);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].url, "http://example.com/two");
    }

    #[test]
    fn test_scan_page_stats_and_next() {
        let scan = scan_page(RESULT_PAGE, 1, 10, &HashSet::new());
        assert!(scan.has_next);
        assert_eq!(
            scan.stats_text.as_deref(),
            Some("About 1,000 results (0.42 seconds)")
        );
    }

    #[test]
    fn test_no_next_affordance() {
        let html = r#"<div class="g"><a href="http://e.com/a"><h3>A</h3></a></div>"#;
        let scan = scan_page(html, 1, 10, &HashSet::new());
        assert!(!scan.has_next);
        assert!(scan.stats_text.is_none());
    }

    #[test]
    fn test_fallback_invoked_when_no_container_matches() {
        let html = r#"
            <html><body>
                <p><a href="http://example.com/plain">Plain result</a></p>
            </body></html>
        "#;
        let doc = Html::parse_document(html);
        let results = extract_results(&doc, 1, 10, &HashSet::new());
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].title, "Plain result");
    }

    #[test]
    fn test_duplicate_within_page_dropped() {
        let html = r#"
            <div class="g"><a href="http://example.com/dup"><h3>A</h3></a></div>
            <div class="g"><a href="http://example.com/dup"><h3>B</h3></a></div>
        "#;
        let doc = Html::parse_document(html);
        let results = extract_results(&doc, 1, 10, &HashSet::new());
        assert_eq!(results.len(), 1);
    }
}
