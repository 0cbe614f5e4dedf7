//! Stealth browsing contexts
//!
//! A [`StealthContext`] is an isolated browser profile created from the
//! shared session via CDP: its own cookie jar and storage, a randomized
//! [`Fingerprint`], an optional proxy drawn from the pool, and pages
//! that are prepared with anti-detection overrides before their first
//! navigation. The context is owned by exactly one search attempt and
//! must be disposed on every exit path - a leaked context is a real
//! OS-level browser tab.

pub mod fingerprint;
pub mod proxy;
pub mod stealth;

pub use fingerprint::{ColorScheme, Fingerprint};
pub use proxy::{ProxyPool, ProxyRecord};

use chromiumoxide::Page;
use chromiumoxide::browser::Browser;
use chromiumoxide::cdp::browser_protocol::browser::BrowserContextId;
use chromiumoxide::cdp::browser_protocol::target::{
    CreateBrowserContextParams, CreateTargetParams, DisposeBrowserContextParams,
};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::errors::{SearchError, SearchResult};
use crate::navigator::{BrowserDriver, DriverSettings};
use crate::search::retry::SearchContext;
use crate::utils::constants::{DEFAULT_LANG, DEFAULT_TIMEZONE};

/// Options for creating a browsing context
#[derive(Debug, Clone)]
pub struct ContextOptions {
    /// BCP 47 locale, e.g. "it-IT"
    pub locale: String,
    /// IANA timezone, e.g. "Europe/Rome"
    pub timezone: String,
    /// Draw a proxy from the pool for this context
    pub use_proxy: bool,
    /// Inject the anti-detection startup script and humanize pages
    pub stealth: bool,
}

impl Default for ContextOptions {
    fn default() -> Self {
        Self {
            locale: format!("{DEFAULT_LANG}-{}", DEFAULT_LANG.to_uppercase()),
            timezone: DEFAULT_TIMEZONE.to_string(),
            use_proxy: false,
            stealth: true,
        }
    }
}

/// An isolated, fingerprint-randomized browsing context
pub struct StealthContext {
    browser: Arc<Browser>,
    context_id: BrowserContextId,
    fingerprint: Fingerprint,
    proxy: Option<ProxyRecord>,
    options: ContextOptions,
    driver_settings: DriverSettings,
    /// Auth-responder tasks for pages created in this context; aborted
    /// on disposal
    aux_tasks: Vec<JoinHandle<()>>,
}

impl StealthContext {
    /// Create a fresh context on the shared session
    ///
    /// Draws a new fingerprint per call and, when requested, the next
    /// proxy in round-robin order (an empty pool silently disables
    /// proxying). On failure nothing was created, so the caller must
    /// not attempt disposal.
    pub async fn create(
        browser: Arc<Browser>,
        options: ContextOptions,
        pool: Arc<ProxyPool>,
        driver_settings: DriverSettings,
    ) -> SearchResult<Self> {
        let fingerprint = Fingerprint::randomize();
        let proxy = if options.use_proxy {
            pool.next_round_robin()
        } else {
            None
        };

        let params = CreateBrowserContextParams {
            dispose_on_detach: Some(true),
            proxy_server: proxy.as_ref().map(|p| p.server.clone()),
            proxy_bypass_list: None,
            origins_with_universal_network_access: None,
        };
        let response = browser
            .execute(params)
            .await
            .map_err(|e| SearchError::ContextCreation(e.to_string()))?;
        let context_id = response.browser_context_id.clone();

        debug!(
            "Created browsing context {:?} ({}x{}, proxy: {})",
            context_id,
            fingerprint.viewport.0,
            fingerprint.viewport.1,
            proxy.as_ref().map_or("none", |p| p.server.as_str()),
        );

        Ok(Self {
            browser,
            context_id,
            fingerprint,
            proxy,
            options,
            driver_settings,
            aux_tasks: Vec::new(),
        })
    }

    /// Fingerprint drawn for this context
    #[must_use]
    pub fn fingerprint(&self) -> &Fingerprint {
        &self.fingerprint
    }

    /// Proxy attached to this context, if any
    #[must_use]
    pub fn proxy(&self) -> Option<&ProxyRecord> {
        self.proxy.as_ref()
    }

    /// Create and prepare a page inside this context
    pub async fn new_page(&mut self) -> SearchResult<Page> {
        let target = CreateTargetParams::builder()
            .url("about:blank")
            .browser_context_id(self.context_id.clone())
            .build()
            .map_err(SearchError::ContextCreation)?;
        let page = self
            .browser
            .new_page(target)
            .await
            .map_err(|e| SearchError::ContextCreation(e.to_string()))?;

        stealth::prepare_page(
            &page,
            &self.fingerprint,
            &self.options.locale,
            &self.options.timezone,
            self.options.stealth,
        )
        .await
        .map_err(|e| SearchError::ContextCreation(format!("{e:#}")))?;

        if let Some(proxy) = self.proxy.as_ref().filter(|p| p.has_credentials()) {
            let responder = stealth::spawn_proxy_auth_responder(&page, proxy)
                .await
                .map_err(|e| SearchError::ContextCreation(format!("{e:#}")))?;
            self.aux_tasks.push(responder);
        }

        Ok(page)
    }

    /// Dispose the context, closing all of its pages
    pub async fn close(mut self) {
        for task in self.aux_tasks.drain(..) {
            task.abort();
        }
        let params = DisposeBrowserContextParams {
            browser_context_id: self.context_id.clone(),
        };
        if let Err(e) = self.browser.execute(params).await {
            warn!("Failed to dispose browsing context: {e}");
        }
    }
}

impl SearchContext for StealthContext {
    type Driver = BrowserDriver;

    async fn new_driver(&mut self) -> SearchResult<BrowserDriver> {
        let page = self.new_page().await?;
        Ok(BrowserDriver::new(page, self.driver_settings.clone()))
    }

    async fn dispose(self) {
        self.close().await;
    }
}
