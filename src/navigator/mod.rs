//! Page navigation and fetch classification
//!
//! The [`SerpDriver`] trait is the seam between the pagination engine
//! and the real browser: one call fetches a result page and classifies
//! it as loaded or blocked. [`BrowserDriver`] is the chromiumoxide
//! implementation with explicit navigation timeouts, an optional
//! post-load pause, and human-behavior simulation.

pub mod block;
pub mod human;

pub use block::detect_block;

use chromiumoxide::Page;
use chromiumoxide::cdp::browser_protocol::network::{EventResponseReceived, ResourceType};
use chromiumoxide::cdp::browser_protocol::page::{
    CaptureScreenshotFormat, CaptureScreenshotParams,
};
use futures_util::StreamExt;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

use crate::errors::{SearchError, SearchResult};
use crate::utils::constants::SCREENSHOT_QUALITY;

/// How long to wait for a navigation to be considered complete
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitPolicy {
    /// Wait for the initial response only (`page.goto`)
    Minimal,
    /// Additionally wait for network activity to settle
    Full,
}

/// Outcome of a successful (non-blocked) navigation
#[derive(Debug, Clone)]
pub struct NavigationResult {
    /// URL after redirects
    pub final_url: String,
    /// HTTP status of the document response, when observed in time
    pub status: Option<i64>,
    /// Full HTML snapshot of the rendered page
    pub html: String,
}

/// A fetched result page, classified
#[derive(Debug)]
pub enum PageView {
    /// Page rendered normally
    Loaded(NavigationResult),
    /// A block marker matched; extraction must not proceed
    Blocked {
        html: String,
        /// Full-page screenshot for diagnostics, when capture succeeded
        screenshot: Option<Vec<u8>>,
    },
}

/// Driver abstraction over "fetch one result page"
///
/// The pagination engine only talks to this trait, so multi-page
/// behavior is tested against fakes without a browser.
pub trait SerpDriver: Send {
    /// Navigate to `url` and classify the rendered page
    fn fetch(
        &mut self,
        url: &str,
        wait: WaitPolicy,
    ) -> impl Future<Output = SearchResult<PageView>> + Send;

    /// Capture a viewport screenshot of the current page
    fn screenshot(&mut self) -> impl Future<Output = SearchResult<Vec<u8>>> + Send;
}

/// Tuning for [`BrowserDriver`]
#[derive(Debug, Clone)]
pub struct DriverSettings {
    /// Budget for one navigation including the settle wait
    pub navigation_timeout: Duration,
    /// Pause after load simulating a human reading delay
    pub post_load_pause: Duration,
    /// Perform pointer/scroll simulation after load
    pub humanize: bool,
}

impl Default for DriverSettings {
    fn default() -> Self {
        Self {
            navigation_timeout: Duration::from_secs(30),
            post_load_pause: Duration::from_secs(1),
            humanize: true,
        }
    }
}

/// [`SerpDriver`] implementation over a live chromiumoxide page
pub struct BrowserDriver {
    page: Page,
    settings: DriverSettings,
}

impl BrowserDriver {
    #[must_use]
    pub fn new(page: Page, settings: DriverSettings) -> Self {
        Self { page, settings }
    }

    /// Access the underlying page
    #[must_use]
    pub fn page(&self) -> &Page {
        &self.page
    }

    async fn capture(&self, full_page: bool) -> SearchResult<Vec<u8>> {
        let params = CaptureScreenshotParams {
            format: Some(CaptureScreenshotFormat::Jpeg),
            quality: Some(SCREENSHOT_QUALITY),
            capture_beyond_viewport: if full_page { Some(true) } else { None },
            ..Default::default()
        };
        self.page
            .screenshot(params)
            .await
            .map_err(|e| SearchError::Navigation(format!("Failed to capture screenshot: {e}")))
    }
}

impl SerpDriver for BrowserDriver {
    async fn fetch(&mut self, url: &str, wait: WaitPolicy) -> SearchResult<PageView> {
        // Subscribe before navigating so the document response is not
        // missed; best-effort, the page is useful without a status
        let mut responses = self
            .page
            .event_listener::<EventResponseReceived>()
            .await
            .ok();

        debug!("Navigating: {url}");
        let navigation = async {
            self.page
                .goto(url)
                .await
                .map_err(|e| SearchError::Navigation(e.to_string()))?;
            if wait == WaitPolicy::Full {
                self.page
                    .wait_for_navigation()
                    .await
                    .map_err(|e| SearchError::Navigation(e.to_string()))?;
            }
            Ok::<(), SearchError>(())
        };
        match tokio::time::timeout(self.settings.navigation_timeout, navigation).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(e),
            Err(_) => {
                return Err(SearchError::NavigationTimeout(
                    self.settings.navigation_timeout,
                ));
            }
        }

        if !self.settings.post_load_pause.is_zero() {
            tokio::time::sleep(self.settings.post_load_pause).await;
        }

        if self.settings.humanize {
            if let Err(e) = human::simulate_pointer(&self.page).await {
                debug!("Pointer simulation failed: {e}");
            }
            if let Err(e) = human::random_scrolling(&self.page).await {
                debug!("Scroll simulation failed: {e}");
            }
        }

        let html = self
            .page
            .content()
            .await
            .map_err(|e| SearchError::Navigation(format!("Failed to read page content: {e}")))?;
        debug!("Fetched {} characters of HTML", html.len());

        if let Some(marker) = detect_block(&html) {
            warn!("Block marker matched: {marker:?}");
            let screenshot = match self.capture(true).await {
                Ok(bytes) => Some(bytes),
                Err(e) => {
                    warn!("Failed to capture block screenshot: {e}");
                    None
                }
            };
            return Ok(PageView::Blocked { html, screenshot });
        }

        let final_url = self
            .page
            .url()
            .await
            .ok()
            .flatten()
            .unwrap_or_else(|| url.to_string());
        let status = match responses.as_mut() {
            Some(stream) => document_status(stream).await,
            None => None,
        };

        Ok(PageView::Loaded(NavigationResult {
            final_url,
            status,
            html,
        }))
    }

    async fn screenshot(&mut self) -> SearchResult<Vec<u8>> {
        self.capture(false).await
    }
}

/// Pull the document response status from the buffered event stream
///
/// The listener was subscribed before navigation, so by the time this
/// runs the event is normally already buffered; the short deadline only
/// guards against pages whose document response never surfaced.
async fn document_status<S>(stream: &mut S) -> Option<i64>
where
    S: futures_util::Stream<Item = std::sync::Arc<EventResponseReceived>> + Unpin,
{
    let deadline = Duration::from_millis(250);
    loop {
        match tokio::time::timeout(deadline, stream.next()).await {
            Ok(Some(event)) if event.r#type == ResourceType::Document => {
                return Some(event.response.status);
            }
            Ok(Some(_)) => continue,
            Ok(None) | Err(_) => return None,
        }
    }
}
