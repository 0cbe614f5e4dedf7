//! Top-level search entry point
//!
//! Validates and clamps the request, acquires the shared browser
//! session, and runs the retry coordinator under an overall deadline
//! scaled by the number of pages requested.

pub mod retry;

pub use retry::{ContextGuard, SearchContext, search_with_retry};

use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use url::Url;

use crate::config::SearchConfig;
use crate::context::{ContextOptions, StealthContext, proxy::ProxyPool};
use crate::errors::{SearchError, SearchResult};
use crate::navigator::DriverSettings;
use crate::pagination::SearchAttempt;
use crate::session::SessionManager;
use crate::utils::constants::{
    DEFAULT_LANG, DEFAULT_SLEEP_INTERVAL_SECS, DEFAULT_TIMEZONE, MAX_QUERY_LENGTH, SEARCH_URL,
};

/// Parameters of one search request
#[derive(Debug, Clone)]
pub struct SearchParams {
    pub query: String,
    /// Result language, e.g. "it", "en", "fr"
    pub lang: String,
    /// Results kept per page (clamped against the config cap)
    pub results_per_page: usize,
    /// Pages fetched at most (clamped against the config cap)
    pub max_pages: usize,
    /// Base pause between page fetches
    pub sleep_interval: Duration,
    /// Extra attempts after the first failure
    pub retry_count: u32,
    /// Retain the first-page diagnostic screenshot in the result bundle
    pub include_screenshot: bool,
    /// Apply fingerprint randomization and humanization
    pub use_stealth: bool,
    /// Route the browsing context through the proxy pool
    pub use_proxy: bool,
}

impl SearchParams {
    /// Request with service defaults for everything but the query
    #[must_use]
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            lang: DEFAULT_LANG.to_string(),
            results_per_page: 5,
            max_pages: 1,
            sleep_interval: Duration::from_secs_f64(DEFAULT_SLEEP_INTERVAL_SECS),
            retry_count: 2,
            include_screenshot: false,
            use_stealth: true,
            use_proxy: false,
        }
    }
}

/// Build the search URL for one result page
///
/// `start` is the absolute result offset; it is omitted on the first
/// page. `pws=0` disables personalization so results are reproducible
/// across contexts.
#[must_use]
pub fn build_search_url(query: &str, lang: &str, start: usize) -> String {
    let mut url = Url::parse(SEARCH_URL).expect("BUG: hardcoded search URL is invalid");
    let country_code = lang.split('-').next().unwrap_or(lang);
    {
        let mut pairs = url.query_pairs_mut();
        pairs
            .append_pair("q", query)
            .append_pair("hl", lang)
            .append_pair("pws", "0")
            .append_pair("gl", country_code);
        if start > 0 {
            pairs.append_pair("start", &start.to_string());
        }
    }
    url.into()
}

/// Validate a request and clamp it against the configured caps
fn validate_and_clamp(
    mut params: SearchParams,
    config: &SearchConfig,
) -> SearchResult<SearchParams> {
    let trimmed = params.query.trim();
    if trimmed.is_empty() {
        return Err(SearchError::InvalidQuery(
            "query cannot be empty or whitespace-only".to_string(),
        ));
    }
    let length = trimmed.chars().count();
    if length > MAX_QUERY_LENGTH {
        return Err(SearchError::InvalidQuery(format!(
            "query is too long ({length} characters, maximum {MAX_QUERY_LENGTH})"
        )));
    }
    params.query = trimmed.to_string();

    if params.lang.trim().is_empty() {
        params.lang = config.default_lang().to_string();
    }
    params.results_per_page = params.results_per_page.clamp(1, config.max_results_per_page());
    params.max_pages = params.max_pages.clamp(1, config.max_pages());

    Ok(params)
}

/// BCP 47 locale for a bare language code
fn locale_for(lang: &str) -> String {
    if lang.contains('-') {
        return lang.to_string();
    }
    match lang {
        "it" => "it-IT".to_string(),
        "en" => "en-US".to_string(),
        "fr" => "fr-FR".to_string(),
        "de" => "de-DE".to_string(),
        "es" => "es-ES".to_string(),
        "pt" => "pt-PT".to_string(),
        other => format!("{}-{}", other, other.to_uppercase()),
    }
}

/// Run one paginated search end to end
///
/// Acquires the shared session, then runs the retry coordinator under a
/// deadline of `config.search_timeout × max_pages`. When the deadline
/// fires mid-attempt the in-flight context is disposed in the
/// background by its guard.
pub async fn search(
    manager: &SessionManager,
    config: &SearchConfig,
    params: SearchParams,
) -> SearchResult<SearchAttempt> {
    let params = validate_and_clamp(params, config)?;
    info!(
        "Starting search for '{}' ({} results/page, up to {} pages)",
        params.query, params.results_per_page, params.max_pages
    );

    let browser = manager.acquire().await?;
    let pool = Arc::new(ProxyPool::new(config.proxies().to_vec()));
    let options = ContextOptions {
        locale: locale_for(&params.lang),
        timezone: DEFAULT_TIMEZONE.to_string(),
        use_proxy: params.use_proxy,
        stealth: params.use_stealth,
    };
    let settings = DriverSettings {
        navigation_timeout: config.navigation_timeout(),
        post_load_pause: params.sleep_interval / 2,
        humanize: params.use_stealth,
    };

    let deadline = config.search_deadline(params.max_pages);
    let factory = {
        let browser = Arc::clone(&browser);
        let pool = Arc::clone(&pool);
        let options = options.clone();
        let settings = settings.clone();
        move || {
            StealthContext::create(
                Arc::clone(&browser),
                options.clone(),
                Arc::clone(&pool),
                settings.clone(),
            )
        }
    };

    match tokio::time::timeout(deadline, search_with_retry(factory, &params)).await {
        Ok(outcome) => outcome,
        Err(_) => {
            error!(
                "Search for '{}' exceeded the {}s deadline",
                params.query,
                deadline.as_secs()
            );
            Err(SearchError::Timeout(deadline))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_search_url_first_page() {
        let url = build_search_url("rust async", "it", 0);
        assert!(url.starts_with("https://www.google.com/search?"));
        assert!(url.contains("q=rust+async"));
        assert!(url.contains("hl=it"));
        assert!(url.contains("gl=it"));
        assert!(url.contains("pws=0"));
        assert!(!url.contains("start="));
    }

    #[test]
    fn test_build_search_url_later_page_has_offset() {
        let url = build_search_url("rust", "en-GB", 20);
        assert!(url.contains("start=20"));
        assert!(url.contains("hl=en-GB"));
        assert!(url.contains("gl=en"));
    }

    #[test]
    fn test_validate_rejects_empty_query() {
        let config = SearchConfig::default();
        let params = SearchParams::new("   ");
        assert!(matches!(
            validate_and_clamp(params, &config),
            Err(SearchError::InvalidQuery(_))
        ));
    }

    #[test]
    fn test_validate_rejects_oversized_query() {
        let config = SearchConfig::default();
        let params = SearchParams::new("x".repeat(MAX_QUERY_LENGTH + 1));
        assert!(matches!(
            validate_and_clamp(params, &config),
            Err(SearchError::InvalidQuery(_))
        ));
    }

    #[test]
    fn test_validate_clamps_limits() {
        let config = SearchConfig::default();
        let mut params = SearchParams::new("rust");
        params.results_per_page = 100;
        params.max_pages = 50;
        let clamped = validate_and_clamp(params, &config).expect("valid");
        assert_eq!(clamped.results_per_page, config.max_results_per_page());
        assert_eq!(clamped.max_pages, config.max_pages());
    }

    #[test]
    fn test_validate_defaults_blank_lang() {
        let config = SearchConfig::default();
        let mut params = SearchParams::new("rust");
        params.lang = String::new();
        let validated = validate_and_clamp(params, &config).expect("valid");
        assert_eq!(validated.lang, config.default_lang());
    }

    #[test]
    fn test_locale_mapping() {
        assert_eq!(locale_for("it"), "it-IT");
        assert_eq!(locale_for("en"), "en-US");
        assert_eq!(locale_for("pt-BR"), "pt-BR");
        assert_eq!(locale_for("nl"), "nl-NL");
    }
}
