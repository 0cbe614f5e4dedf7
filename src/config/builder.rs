//! Fluent builder for `SearchConfig`
//!
//! Request-facing limits are clamped against the crate-wide hard caps at
//! build time so a misconfigured deployment cannot exceed them.

use anyhow::{Result, bail};

use super::types::SearchConfig;
use crate::context::proxy::ProxyRecord;
use crate::utils::constants::{MAX_PAGES, MAX_RESULTS_PER_PAGE};

/// Builder for [`SearchConfig`]
#[derive(Debug, Default)]
pub struct SearchConfigBuilder {
    config: SearchConfig,
}

impl SearchConfigBuilder {
    /// Default result language (e.g. "it", "en", "fr")
    #[must_use]
    pub fn default_lang(mut self, lang: impl Into<String>) -> Self {
        self.config.default_lang = lang.into();
        self
    }

    /// Upper bound on per-page results a request may ask for
    #[must_use]
    pub fn max_results_per_page(mut self, n: usize) -> Self {
        self.config.max_results_per_page = n;
        self
    }

    /// Upper bound on pages a request may ask for
    #[must_use]
    pub fn max_pages(mut self, n: usize) -> Self {
        self.config.max_pages = n;
        self
    }

    /// Base pause between page fetches, in seconds
    #[must_use]
    pub fn sleep_interval_secs(mut self, secs: f64) -> Self {
        self.config.sleep_interval_secs = secs;
        self
    }

    /// Timeout for a single navigation, in seconds
    #[must_use]
    pub fn navigation_timeout_secs(mut self, secs: u64) -> Self {
        self.config.navigation_timeout_secs = secs;
        self
    }

    /// Per-page budget for a whole search, in seconds
    #[must_use]
    pub fn search_timeout_secs(mut self, secs: u64) -> Self {
        self.config.search_timeout_secs = secs;
        self
    }

    /// Searches admitted per client per minute
    #[must_use]
    pub fn rate_limit(mut self, n: usize) -> Self {
        self.config.rate_limit = n;
        self
    }

    /// Cooldown after the rate limit is exceeded, in seconds
    #[must_use]
    pub fn cooldown_secs(mut self, secs: u64) -> Self {
        self.config.cooldown_secs = secs;
        self
    }

    /// Apply fingerprint randomization and humanization by default
    #[must_use]
    pub fn stealth_mode(mut self, enabled: bool) -> Self {
        self.config.stealth_mode = enabled;
        self
    }

    /// Route contexts through the proxy pool by default
    #[must_use]
    pub fn use_proxies(mut self, enabled: bool) -> Self {
        self.config.use_proxies = enabled;
        self
    }

    /// Proxy records available to the context factory
    #[must_use]
    pub fn proxies(mut self, proxies: Vec<ProxyRecord>) -> Self {
        self.config.proxies = proxies;
        self
    }

    /// Run the browser headless
    #[must_use]
    pub fn headless(mut self, enabled: bool) -> Self {
        self.config.headless = enabled;
        self
    }

    /// Validate and build the final configuration
    ///
    /// # Errors
    /// Returns an error on non-sensical values (zero pages, negative
    /// sleep interval, zero navigation timeout).
    pub fn build(mut self) -> Result<SearchConfig> {
        if self.config.max_pages == 0 {
            bail!("max_pages must be at least 1");
        }
        if self.config.max_results_per_page == 0 {
            bail!("max_results_per_page must be at least 1");
        }
        if self.config.sleep_interval_secs < 0.0 {
            bail!(
                "sleep_interval_secs must be non-negative, got {}",
                self.config.sleep_interval_secs
            );
        }
        if self.config.navigation_timeout_secs == 0 {
            bail!("navigation_timeout_secs must be at least 1");
        }

        // Clamp request-facing limits to the crate-wide hard caps
        self.config.max_results_per_page = self.config.max_results_per_page.min(MAX_RESULTS_PER_PAGE);
        self.config.max_pages = self.config.max_pages.min(MAX_PAGES);

        Ok(self.config)
    }
}
