//! Core configuration types for the search engine
//!
//! This module contains the main `SearchConfig` struct that defines the
//! deployment-level tuning for search operations. Per-request knobs live
//! in [`SearchParams`](crate::search::SearchParams); this struct holds
//! the limits and defaults those requests are clamped against.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::context::proxy::ProxyRecord;
use crate::utils::constants::{
    DEFAULT_COOLDOWN_SECS, DEFAULT_LANG, DEFAULT_NAV_TIMEOUT_SECS, DEFAULT_RATE_LIMIT,
    DEFAULT_SEARCH_TIMEOUT_SECS, DEFAULT_SLEEP_INTERVAL_SECS, MAX_PAGES, MAX_RESULTS_PER_PAGE,
};

/// Main configuration struct for search operations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Default result language when a request does not specify one
    pub(crate) default_lang: String,
    /// Upper bound on per-page results a request may ask for
    pub(crate) max_results_per_page: usize,
    /// Upper bound on pages a request may ask for
    pub(crate) max_pages: usize,
    /// Base pause between page fetches, in seconds
    pub(crate) sleep_interval_secs: f64,
    /// Timeout for a single `page.goto()`, in seconds
    pub(crate) navigation_timeout_secs: u64,
    /// Per-page budget for a whole search, in seconds
    ///
    /// The overall deadline is `search_timeout_secs * max_pages` for the
    /// request, so paginated searches get proportionally more time.
    pub(crate) search_timeout_secs: u64,
    /// Searches admitted per client per minute
    pub(crate) rate_limit: usize,
    /// Cooldown after the rate limit is exceeded, in seconds
    pub(crate) cooldown_secs: u64,
    /// Apply fingerprint randomization and humanization by default
    pub(crate) stealth_mode: bool,
    /// Route contexts through the proxy pool by default
    pub(crate) use_proxies: bool,
    /// Proxy records available to the context factory; empty means
    /// "no proxy", never an error
    pub(crate) proxies: Vec<ProxyRecord>,
    /// Run the browser headless
    pub(crate) headless: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_lang: DEFAULT_LANG.to_string(),
            max_results_per_page: MAX_RESULTS_PER_PAGE,
            max_pages: MAX_PAGES,
            sleep_interval_secs: DEFAULT_SLEEP_INTERVAL_SECS,
            navigation_timeout_secs: DEFAULT_NAV_TIMEOUT_SECS,
            search_timeout_secs: DEFAULT_SEARCH_TIMEOUT_SECS,
            rate_limit: DEFAULT_RATE_LIMIT,
            cooldown_secs: DEFAULT_COOLDOWN_SECS,
            stealth_mode: true,
            use_proxies: false,
            proxies: Vec::new(),
            headless: true,
        }
    }
}

impl SearchConfig {
    /// Start building a config fluently
    #[must_use]
    pub fn builder() -> super::builder::SearchConfigBuilder {
        super::builder::SearchConfigBuilder::default()
    }

    /// Load configuration from environment variables
    ///
    /// Unset or unparsable variables fall back to the defaults, so a
    /// bare environment yields `SearchConfig::default()`.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            default_lang: env_string("SEARCH_DEFAULT_LANG", defaults.default_lang),
            max_results_per_page: env_parse("SEARCH_MAX_RESULTS", defaults.max_results_per_page)
                .min(MAX_RESULTS_PER_PAGE),
            max_pages: env_parse("SEARCH_MAX_PAGES", defaults.max_pages).min(MAX_PAGES),
            sleep_interval_secs: env_parse("SEARCH_SLEEP_INTERVAL", defaults.sleep_interval_secs),
            navigation_timeout_secs: env_parse(
                "SEARCH_NAV_TIMEOUT",
                defaults.navigation_timeout_secs,
            ),
            search_timeout_secs: env_parse("SEARCH_TIMEOUT", defaults.search_timeout_secs),
            rate_limit: env_parse("SEARCH_RATE_LIMIT", defaults.rate_limit),
            cooldown_secs: env_parse("SEARCH_COOLDOWN", defaults.cooldown_secs),
            stealth_mode: env_bool("BROWSER_STEALTH_MODE", defaults.stealth_mode),
            use_proxies: env_bool("USE_PROXIES", defaults.use_proxies),
            proxies: defaults.proxies,
            headless: env_bool("BROWSER_HEADLESS", defaults.headless),
        }
    }

    /// Default result language
    #[must_use]
    pub fn default_lang(&self) -> &str {
        &self.default_lang
    }

    /// Upper bound on per-page results
    #[must_use]
    pub fn max_results_per_page(&self) -> usize {
        self.max_results_per_page
    }

    /// Upper bound on pages per search
    #[must_use]
    pub fn max_pages(&self) -> usize {
        self.max_pages
    }

    /// Base pause between page fetches
    #[must_use]
    pub fn sleep_interval(&self) -> Duration {
        Duration::from_secs_f64(self.sleep_interval_secs.max(0.0))
    }

    /// Timeout for a single navigation
    #[must_use]
    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_secs(self.navigation_timeout_secs)
    }

    /// Overall deadline for a search spanning `pages` pages
    #[must_use]
    pub fn search_deadline(&self, pages: usize) -> Duration {
        Duration::from_secs(self.search_timeout_secs.saturating_mul(pages.max(1) as u64))
    }

    /// Searches admitted per client per minute
    #[must_use]
    pub fn rate_limit(&self) -> usize {
        self.rate_limit
    }

    /// Cooldown applied after the rate limit is exceeded
    #[must_use]
    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.cooldown_secs)
    }

    /// Whether stealth measures are applied by default
    #[must_use]
    pub fn stealth_mode(&self) -> bool {
        self.stealth_mode
    }

    /// Whether contexts draw from the proxy pool by default
    #[must_use]
    pub fn use_proxies(&self) -> bool {
        self.use_proxies
    }

    /// Configured proxy records
    #[must_use]
    pub fn proxies(&self) -> &[ProxyRecord] {
        &self.proxies
    }

    /// Whether the browser runs headless
    #[must_use]
    pub fn headless(&self) -> bool {
        self.headless
    }
}

fn env_string(key: &str, default: String) -> String {
    std::env::var(key).unwrap_or(default)
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_bool(key: &str, default: bool) -> bool {
    match std::env::var(key) {
        Ok(v) => matches!(v.to_lowercase().as_str(), "true" | "1" | "yes"),
        Err(_) => default,
    }
}
