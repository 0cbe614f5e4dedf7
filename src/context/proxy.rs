//! Proxy pool for distributing search traffic
//!
//! Holds the externally supplied proxy records and hands them out
//! round-robin (or at random) to new browsing contexts. An empty pool
//! means "no proxy" and is never an error.

use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::debug;

/// One configured proxy endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxyRecord {
    /// Proxy server URL, e.g. `http://proxy.example.com:8080`
    pub server: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl ProxyRecord {
    /// Whether this proxy requires an authentication handshake
    #[must_use]
    pub fn has_credentials(&self) -> bool {
        self.username.is_some() && self.password.is_some()
    }
}

/// Pool of proxy records shared by the context factory
#[derive(Debug, Default)]
pub struct ProxyPool {
    records: Vec<ProxyRecord>,
    cursor: AtomicUsize,
}

impl ProxyPool {
    /// Create a pool over the configured records
    #[must_use]
    pub fn new(records: Vec<ProxyRecord>) -> Self {
        debug!("Proxy pool initialized with {} records", records.len());
        Self {
            records,
            cursor: AtomicUsize::new(0),
        }
    }

    /// Whether any proxies are configured
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of configured proxies
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Next proxy in round-robin order, or `None` with an empty pool
    #[must_use]
    pub fn next_round_robin(&self) -> Option<ProxyRecord> {
        if self.records.is_empty() {
            return None;
        }
        let index = self.cursor.fetch_add(1, Ordering::Relaxed) % self.records.len();
        let proxy = self.records[index].clone();
        debug!("Using proxy: {}", proxy.server);
        Some(proxy)
    }

    /// A uniformly random proxy, or `None` with an empty pool
    #[must_use]
    pub fn random(&self) -> Option<ProxyRecord> {
        let proxy = self.records.choose(&mut rand::rng()).cloned();
        if let Some(ref p) = proxy {
            debug!("Using random proxy: {}", p.server);
        }
        proxy
    }
}
