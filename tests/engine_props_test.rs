//! Property tests for the pagination invariants
//!
//! Whatever pages a site serves: no two accumulated results ever share
//! a URL, and the engine never fetches more than the page budget even
//! when every page dangles a next link.

use proptest::prelude::*;
use std::collections::HashSet;
use std::time::Duration;

use serpcrawl::errors::SearchResult;
use serpcrawl::navigator::{NavigationResult, PageView, SerpDriver, WaitPolicy};
use serpcrawl::pagination::run_attempt;
use serpcrawl::search::SearchParams;

struct FeedDriver {
    pages: Vec<String>,
    fetches: usize,
}

impl SerpDriver for FeedDriver {
    async fn fetch(&mut self, url: &str, _wait: WaitPolicy) -> SearchResult<PageView> {
        let html = self.pages.get(self.fetches).cloned().unwrap_or_default();
        self.fetches += 1;
        Ok(PageView::Loaded(NavigationResult {
            final_url: url.to_string(),
            status: Some(200),
            html,
        }))
    }

    async fn screenshot(&mut self) -> SearchResult<Vec<u8>> {
        Ok(Vec::new())
    }
}

/// Render a page whose results are the given URL ids, always offering
/// a next link
fn page_from_ids(ids: &[usize]) -> String {
    let mut html = String::from("<html><body>");
    for id in ids {
        html.push_str(&format!(
            r#"<div class="g"><a href="http://example.com/r{id}"><h3>Result {id}</h3></a></div>"#
        ));
    }
    html.push_str(r##"<a id="pnnext" href="#">Next</a></body></html>"##);
    html
}

fn params(results_per_page: usize, max_pages: usize) -> SearchParams {
    let mut params = SearchParams::new("prop query");
    params.results_per_page = results_per_page;
    params.max_pages = max_pages;
    params.sleep_interval = Duration::ZERO;
    params
}

proptest! {
    #[test]
    fn urls_are_unique_across_pages(
        feed in proptest::collection::vec(proptest::collection::vec(0usize..30, 0..8), 1..6),
        per_page in 1usize..8,
        max_pages in 1usize..6,
    ) {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .expect("runtime");
        rt.block_on(async {
            let pages = feed.iter().map(|ids| page_from_ids(ids)).collect();
            let mut driver = FeedDriver { pages, fetches: 0 };
            let attempt = run_attempt(&mut driver, &params(per_page, max_pages), 0)
                .await
                .expect("attempt succeeds");

            let unique: HashSet<&str> =
                attempt.results.iter().map(|r| r.url.as_str()).collect();
            prop_assert_eq!(unique.len(), attempt.results.len());
            prop_assert!(attempt.results.len() <= per_page * max_pages);
            Ok(())
        })?;
    }

    #[test]
    fn page_budget_always_bounds_fetches(
        ids in proptest::collection::vec(0usize..50, 1..10),
        max_pages in 1usize..6,
    ) {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .expect("runtime");
        rt.block_on(async {
            // A site that never stops offering a next page
            let pages: Vec<String> = (0..20).map(|_| page_from_ids(&ids)).collect();
            let mut driver = FeedDriver { pages, fetches: 0 };
            let attempt = run_attempt(&mut driver, &params(5, max_pages), 0)
                .await
                .expect("attempt succeeds");

            prop_assert!(attempt.pages_fetched <= max_pages);
            prop_assert!(driver.fetches <= max_pages);
            Ok(())
        })?;
    }
}
