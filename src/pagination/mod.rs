//! Multi-page search state machine
//!
//! Drives one attempt page by page: fetch, classify, extract, then
//! decide continuation in fixed order - block detected, no next-page
//! affordance, accumulated-count target reached, page budget spent.
//! The accumulated-count check runs between pages only; a fetched page
//! is always extracted up to its per-page cap first.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;
use tracing::{error, info, warn};

use crate::errors::SearchResult;
use crate::extract::{self, ResultItem};
use crate::navigator::{PageView, SerpDriver, WaitPolicy};
use crate::search::{SearchParams, build_search_url};
use crate::utils::constants::{BLOCK_HTML_SNIPPET_LEN, BLOCK_SENTINEL, EMPTY_HTML_SNIPPET_LEN, PAGE_STRIDE};
use crate::utils::truncate_chars;

/// One full multi-page search run, accumulated page by page
///
/// Serializes directly as the outbound result bundle. A block is not an
/// error: `blocked` is set and `stats_text` carries [`BLOCK_SENTINEL`]
/// so the caller layer can classify the response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchAttempt {
    pub query: String,
    pub results: Vec<ResultItem>,
    #[serde(rename = "stats")]
    pub stats_text: String,
    pub pages_fetched: usize,
    /// First-page (or block) screenshot, base64-encoded JPEG
    #[serde(skip_serializing_if = "Option::is_none")]
    pub screenshot: Option<String>,
    /// Truncated raw HTML, kept for diagnostics when zero results were
    /// found or a block was detected
    #[serde(skip_serializing_if = "Option::is_none")]
    pub html_snippet: Option<String>,
    #[serde(skip)]
    pub blocked: bool,
    #[serde(skip)]
    seen_urls: HashSet<String>,
}

impl SearchAttempt {
    /// Start an empty attempt for a query
    #[must_use]
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            results: Vec::new(),
            stats_text: String::new(),
            pages_fetched: 0,
            screenshot: None,
            html_snippet: None,
            blocked: false,
            seen_urls: HashSet::new(),
        }
    }

    /// URLs accumulated so far, for cross-page deduplication
    #[must_use]
    pub fn seen_urls(&self) -> &HashSet<String> {
        &self.seen_urls
    }

    /// Append a result unless its URL was already accumulated
    ///
    /// Returns whether the item was kept. This is the dedup invariant's
    /// final gate: no two results of one attempt share a URL.
    pub fn push_unique(&mut self, item: ResultItem) -> bool {
        if !self.seen_urls.insert(item.url.clone()) {
            return false;
        }
        self.results.push(item);
        true
    }
}

/// Pause between consecutive page fetches
///
/// Scales with the retry attempt index so later attempts burst less.
#[must_use]
pub fn inter_page_delay(base: Duration, attempt: u32) -> Duration {
    base.mul_f64(f64::from(attempt) + 1.0)
}

/// Run one multi-page search attempt to completion
///
/// Returns the accumulated attempt on every terminal condition,
/// including a detected block. Only driver failures (navigation errors,
/// timeouts) propagate, and those are the retry coordinator's business.
pub async fn run_attempt<D: SerpDriver>(
    driver: &mut D,
    params: &SearchParams,
    attempt: u32,
) -> SearchResult<SearchAttempt> {
    let mut state = SearchAttempt::new(&params.query);
    let mut last_html: Option<String> = None;
    let mut current_page = 0usize;

    loop {
        let url = build_search_url(&params.query, &params.lang, current_page * PAGE_STRIDE);
        info!(
            "Fetching result page {} of {}: {}",
            current_page + 1,
            params.max_pages,
            url
        );

        match driver.fetch(&url, WaitPolicy::Minimal).await? {
            PageView::Blocked { html, screenshot } => {
                error!(
                    "Anti-scraping block detected on page {}; stopping attempt",
                    current_page + 1
                );
                state.stats_text = BLOCK_SENTINEL.to_string();
                state.screenshot = screenshot.map(|bytes| BASE64.encode(bytes));
                state.html_snippet = Some(truncate_chars(&html, BLOCK_HTML_SNIPPET_LEN));
                state.blocked = true;
                state.pages_fetched = current_page;
                return Ok(state);
            }
            PageView::Loaded(nav) => {
                let scan = extract::scan_page(
                    &nav.html,
                    current_page + 1,
                    params.results_per_page,
                    state.seen_urls(),
                );

                let mut added = 0usize;
                for item in scan.items {
                    if state.push_unique(item) {
                        added += 1;
                    }
                }
                info!(
                    "Found {} new results on page {} for '{}'",
                    added,
                    current_page + 1,
                    params.query
                );
                state.pages_fetched = current_page + 1;
                last_html = Some(nav.html);

                if current_page == 0 {
                    if let Some(stats) = scan.stats_text {
                        state.stats_text = stats;
                    }
                    if params.include_screenshot {
                        match driver.screenshot().await {
                            Ok(bytes) => state.screenshot = Some(BASE64.encode(bytes)),
                            Err(e) => warn!("Failed to capture first-page screenshot: {e}"),
                        }
                    }
                }

                // Continuation checks, in fixed order
                if !scan.has_next {
                    info!("No next-page affordance after page {}", current_page + 1);
                    break;
                }
                if state.results.len() >= params.results_per_page * params.max_pages {
                    info!(
                        "Accumulated result target reached after page {}",
                        current_page + 1
                    );
                    break;
                }
                if current_page + 1 >= params.max_pages {
                    info!("Maximum page count ({}) reached", params.max_pages);
                    break;
                }

                tokio::time::sleep(inter_page_delay(params.sleep_interval, attempt)).await;
                current_page += 1;
            }
        }
    }

    if state.results.is_empty() {
        state.html_snippet = last_html
            .as_deref()
            .map(|html| truncate_chars(html, EMPTY_HTML_SNIPPET_LEN));
    }

    Ok(state)
}
