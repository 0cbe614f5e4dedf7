//! Pagination engine tests against a scripted fake driver
//!
//! These exercise the multi-page state machine without a browser: page
//! HTML is served from a script and classified the same way the real
//! driver classifies it.

use std::time::Duration;

use serpcrawl::errors::SearchResult;
use serpcrawl::navigator::{NavigationResult, PageView, SerpDriver, WaitPolicy, detect_block};
use serpcrawl::pagination::run_attempt;
use serpcrawl::search::SearchParams;
use serpcrawl::utils::constants::BLOCK_SENTINEL;

/// Serves scripted pages in order, counting fetches and screenshots
struct FakeDriver {
    pages: Vec<String>,
    fetches: usize,
    screenshots: usize,
}

impl FakeDriver {
    fn new(pages: Vec<String>) -> Self {
        Self {
            pages,
            fetches: 0,
            screenshots: 0,
        }
    }
}

impl SerpDriver for FakeDriver {
    async fn fetch(&mut self, url: &str, _wait: WaitPolicy) -> SearchResult<PageView> {
        let html = self.pages.get(self.fetches).cloned().unwrap_or_default();
        self.fetches += 1;
        if detect_block(&html).is_some() {
            return Ok(PageView::Blocked {
                html,
                screenshot: Some(vec![0xDE, 0xAD]),
            });
        }
        Ok(PageView::Loaded(NavigationResult {
            final_url: url.to_string(),
            status: Some(200),
            html,
        }))
    }

    async fn screenshot(&mut self) -> SearchResult<Vec<u8>> {
        self.screenshots += 1;
        Ok(vec![0xFF])
    }
}

/// A result page with `count` unique results for `page_no`
fn result_page(page_no: usize, count: usize, with_next: bool) -> String {
    let mut html = String::from("<html><body>");
    if page_no == 1 {
        html.push_str(r#"<div id="result-stats">About 120 results</div>"#);
    }
    for i in 0..count {
        html.push_str(&format!(
            r#"<div class="g"><a href="http://example.com/p{page_no}/r{i}"><h3>Result {page_no}-{i}</h3></a><div class="VwiC3b">Description {i}</div></div>"#
        ));
    }
    if with_next {
        html.push_str(r##"<a id="pnnext" href="#">Next</a>"##);
    }
    html.push_str("</body></html>");
    html
}

fn blocked_page() -> String {
    "<html><body>Our systems have detected unusual traffic from your computer network. \
     Please try again later.</body></html>"
        .to_string()
}

fn fast_params(results_per_page: usize, max_pages: usize) -> SearchParams {
    let mut params = SearchParams::new("test query");
    params.results_per_page = results_per_page;
    params.max_pages = max_pages;
    params.sleep_interval = Duration::ZERO;
    params.include_screenshot = true;
    params
}

#[tokio::test]
async fn two_full_pages_accumulate_ten_results() {
    let mut driver = FakeDriver::new(vec![
        result_page(1, 5, true),
        result_page(2, 5, true),
    ]);
    let attempt = run_attempt(&mut driver, &fast_params(5, 2), 0)
        .await
        .expect("attempt succeeds");

    assert_eq!(attempt.pages_fetched, 2);
    assert_eq!(attempt.results.len(), 10);
    assert!(!attempt.blocked);
    assert_eq!(attempt.stats_text, "About 120 results");
    assert_eq!(driver.fetches, 2);
    // First page only
    assert_eq!(driver.screenshots, 1);
    assert!(attempt.screenshot.is_some());
}

#[tokio::test]
async fn duplicate_urls_across_pages_are_dropped() {
    // Second page repeats the first page's URLs verbatim
    let mut driver = FakeDriver::new(vec![
        result_page(1, 5, true),
        result_page(1, 5, true),
    ]);
    let attempt = run_attempt(&mut driver, &fast_params(5, 2), 0)
        .await
        .expect("attempt succeeds");

    assert_eq!(attempt.pages_fetched, 2);
    assert_eq!(attempt.results.len(), 5);
    let mut urls: Vec<&str> = attempt.results.iter().map(|r| r.url.as_str()).collect();
    urls.sort_unstable();
    urls.dedup();
    assert_eq!(urls.len(), attempt.results.len());
}

#[tokio::test]
async fn block_on_first_page_short_circuits() {
    let mut driver = FakeDriver::new(vec![blocked_page(), result_page(2, 5, true)]);
    let attempt = run_attempt(&mut driver, &fast_params(5, 3), 0)
        .await
        .expect("blocked outcome is not an error");

    assert!(attempt.blocked);
    assert_eq!(attempt.stats_text, BLOCK_SENTINEL);
    assert_eq!(attempt.pages_fetched, 0);
    assert!(attempt.results.is_empty());
    assert!(attempt.screenshot.is_some());
    assert!(attempt.html_snippet.is_some());
    // No further page fetch was attempted after the block
    assert_eq!(driver.fetches, 1);
}

#[tokio::test]
async fn block_on_second_page_keeps_first_page_results() {
    let mut driver = FakeDriver::new(vec![result_page(1, 5, true), blocked_page()]);
    let attempt = run_attempt(&mut driver, &fast_params(5, 3), 0)
        .await
        .expect("blocked outcome is not an error");

    assert!(attempt.blocked);
    assert_eq!(attempt.pages_fetched, 1);
    assert_eq!(attempt.results.len(), 5);
    assert_eq!(driver.fetches, 2);
}

#[tokio::test]
async fn page_budget_bounds_a_site_that_always_offers_next() {
    let pages: Vec<String> = (1..=10).map(|n| result_page(n, 2, true)).collect();
    let mut driver = FakeDriver::new(pages);
    let attempt = run_attempt(&mut driver, &fast_params(5, 3), 0)
        .await
        .expect("attempt succeeds");

    assert_eq!(attempt.pages_fetched, 3);
    assert_eq!(driver.fetches, 3);
    assert_eq!(attempt.results.len(), 6);
}

#[tokio::test]
async fn missing_next_affordance_stops_early() {
    let mut driver = FakeDriver::new(vec![result_page(1, 5, false), result_page(2, 5, true)]);
    let attempt = run_attempt(&mut driver, &fast_params(5, 3), 0)
        .await
        .expect("attempt succeeds");

    assert_eq!(attempt.pages_fetched, 1);
    assert_eq!(driver.fetches, 1);
    assert_eq!(attempt.results.len(), 5);
}

#[tokio::test]
async fn accumulated_count_cutoff_stops_between_pages() {
    // Ten results on page one with a per-page cap of five and a single
    // page target: the cutoff fires between pages, never mid-page
    let mut driver = FakeDriver::new(vec![result_page(1, 10, true), result_page(2, 5, true)]);
    let attempt = run_attempt(&mut driver, &fast_params(5, 1), 0)
        .await
        .expect("attempt succeeds");

    assert_eq!(attempt.pages_fetched, 1);
    assert_eq!(attempt.results.len(), 5);
    assert_eq!(driver.fetches, 1);
}

#[tokio::test]
async fn empty_result_set_carries_html_snippet() {
    let html = "<html><body><p>Nothing that looks like a result</p></body></html>".to_string();
    let mut driver = FakeDriver::new(vec![html]);
    let attempt = run_attempt(&mut driver, &fast_params(5, 1), 0)
        .await
        .expect("attempt succeeds");

    assert!(attempt.results.is_empty());
    let snippet = attempt.html_snippet.expect("snippet kept for diagnostics");
    assert!(snippet.contains("Nothing that looks like"));
    assert!(snippet.chars().count() <= 500);
}

#[tokio::test]
async fn screenshot_skipped_when_not_requested() {
    let mut driver = FakeDriver::new(vec![result_page(1, 3, false)]);
    let mut params = fast_params(5, 1);
    params.include_screenshot = false;
    let attempt = run_attempt(&mut driver, &params, 0)
        .await
        .expect("attempt succeeds");

    assert_eq!(driver.screenshots, 0);
    assert!(attempt.screenshot.is_none());
}
