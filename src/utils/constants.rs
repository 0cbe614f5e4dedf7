//! Shared configuration constants for serpcrawl
//!
//! This module contains default values and configuration constants used
//! throughout the codebase to ensure consistency and avoid magic numbers.

/// Base URL for search navigation
pub const SEARCH_URL: &str = "https://www.google.com/search";

/// Domain of the search engine itself
///
/// Links pointing back here are never search results; the generic
/// extraction fallback excludes them.
pub const ENGINE_DOMAIN: &str = "google.com";

/// Host prefixes excluded by the generic link fallback
///
/// These are engine service pages (login, help, maps) that show up as
/// outbound links on result pages but are never organic results.
pub const EXCLUDED_LINK_PREFIXES: &[&str] = &[
    "https://accounts.",
    "https://support.",
    "https://maps.",
];

/// Result offset between consecutive result pages
///
/// The engine paginates with a `start` query parameter that advances by
/// ten entries per page regardless of how many results we keep.
pub const PAGE_STRIDE: usize = 10;

/// Rotating list of realistic desktop user agents
///
/// Refreshed periodically to track current stable browser releases.
/// One is drawn at random per browsing context.
pub const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/122.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/122.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/122.0.0.0 Safari/537.36 Edg/122.0.0.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.2 Safari/605.1.15",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/122.0.0.0 Safari/537.36",
];

/// Discrete viewport dimensions drawn per browsing context
///
/// Common desktop resolutions; odd sizes are a fingerprinting signal.
pub const VIEWPORTS: &[(u32, u32)] = &[(1366, 768), (1920, 1080), (1440, 900), (1536, 864)];

/// Maximum accepted query length in characters
pub const MAX_QUERY_LENGTH: usize = 400;

/// Hard cap on results returned per page
pub const MAX_RESULTS_PER_PAGE: usize = 20;

/// Hard cap on pages fetched per search
pub const MAX_PAGES: usize = 10;

/// Sentinel prefix planted in `stats_text` when a block was detected
///
/// The API layer matches on this marker to classify the response as a
/// block rather than a normal empty result. Must stay stable.
pub const BLOCK_SENTINEL: &str = "ERROR: search engine blocked the request";

/// Default language for search results
pub const DEFAULT_LANG: &str = "it";

/// Default timezone reported by browsing contexts
pub const DEFAULT_TIMEZONE: &str = "Europe/Rome";

/// Default pause between page fetches, in seconds
pub const DEFAULT_SLEEP_INTERVAL_SECS: f64 = 2.0;

/// Default timeout for a single page navigation, in seconds
pub const DEFAULT_NAV_TIMEOUT_SECS: u64 = 30;

/// Default per-page budget for a whole search, in seconds
///
/// The overall deadline is this value multiplied by the number of pages
/// requested, so multi-page searches get proportionally more time.
pub const DEFAULT_SEARCH_TIMEOUT_SECS: u64 = 90;

/// Default searches admitted per client per minute
pub const DEFAULT_RATE_LIMIT: usize = 10;

/// Default cooldown after the rate limit is exceeded, in seconds
pub const DEFAULT_COOLDOWN_SECS: u64 = 60;

/// Screenshot quality: 80% JPEG compression
///
/// Balances diagnostic value (~50-100KB per capture) against response
/// payload size; these screenshots travel base64-encoded in JSON.
pub const SCREENSHOT_QUALITY: i64 = 80;

/// Characters of raw HTML kept for diagnostics on a blocked page
pub const BLOCK_HTML_SNIPPET_LEN: usize = 1000;

/// Characters of raw HTML kept when a search found zero results
pub const EMPTY_HTML_SNIPPET_LEN: usize = 500;
