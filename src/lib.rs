//! serpcrawl - paginated, anti-detection browser search engine
//!
//! Drives a shared headless Chrome session through multi-page search
//! result sets: randomized stealth browsing contexts, selector-chain
//! extraction with a generic fallback, block/CAPTCHA detection, and a
//! retry coordinator that guarantees context release on every exit
//! path.
//!
//! # Example
//! ```no_run
//! use serpcrawl::{SearchConfig, SearchParams, SessionManager};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let manager = SessionManager::new();
//!     let config = SearchConfig::default();
//!
//!     let mut params = SearchParams::new("rust async runtime");
//!     params.max_pages = 2;
//!     let outcome = serpcrawl::search(&manager, &config, params).await?;
//!
//!     println!("{} results from {} pages", outcome.results.len(), outcome.pages_fetched);
//!     manager.shutdown().await?;
//!     Ok(())
//! }
//! ```

pub mod admission;
pub mod config;
pub mod context;
pub mod errors;
pub mod extract;
pub mod navigator;
pub mod pagination;
pub mod search;
pub mod session;
pub mod utils;

pub use admission::{AdmissionDecision, SearchRateLimiter};
pub use config::{SearchConfig, SearchConfigBuilder};
pub use context::{ContextOptions, Fingerprint, ProxyPool, ProxyRecord, StealthContext};
pub use errors::{SearchError, SearchResult};
pub use extract::ResultItem;
pub use navigator::{BrowserDriver, NavigationResult, PageView, SerpDriver, WaitPolicy};
pub use pagination::{SearchAttempt, run_attempt};
pub use search::{SearchContext, SearchParams, search, search_with_retry};
pub use session::SessionManager;
