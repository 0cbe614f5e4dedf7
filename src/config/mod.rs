//! Configuration for search operations
//!
//! `SearchConfig` holds deployment-level tuning: limits requests are
//! clamped against, timeouts, the admission-gate settings, and the proxy
//! pool. Built fluently via [`SearchConfig::builder`] or loaded from the
//! environment via [`SearchConfig::from_env`].

pub mod builder;
pub mod types;

pub use builder::SearchConfigBuilder;
pub use types::SearchConfig;
